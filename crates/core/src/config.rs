use std::{fmt, fs::File, io::BufReader, path::Path, str::FromStr};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_CHECK_NAME: &str = "Autograding";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub github: GitHubConfig,
    pub run: RunContext,
    #[serde(default)]
    pub check: CheckConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubConfig {
    pub token: String,
    #[serde(default = "default_api_url")]
    pub api_url: Url,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckConfig {
    /// Name of the check run created by the upstream grading job.
    #[serde(default = "default_check_name")]
    pub name: String,
}

impl Default for CheckConfig {
    fn default() -> Self { Self { name: default_check_name() } }
}

/// The workflow run being reported on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RunContext {
    pub repository: RepoName,
    pub run_id: u64,
}

/// A repository in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoName {
    pub owner: String,
    pub name: String,
}

impl RepoName {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self { owner: owner.into(), name: name.into() }
    }
}

impl FromStr for RepoName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(owner, name))
            }
            _ => Err(anyhow!("Invalid repository '{s}', expected owner/name")),
        }
    }
}

impl TryFrom<String> for RepoName {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> { value.parse() }
}

impl From<RepoName> for String {
    fn from(value: RepoName) -> Self { value.to_string() }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default API URL is valid")
}

fn default_check_name() -> String { DEFAULT_CHECK_NAME.to_string() }

impl Config {
    /// Load from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading config from {}", path.display());
        let file = BufReader::new(
            File::open(path)
                .with_context(|| format!("Failed to open config file {}", path.display()))?,
        );
        serde_yaml::from_reader(file)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load from the GitHub Actions environment.
    pub fn from_env() -> Result<Self> { Self::from_env_with(|key| std::env::var(key).ok()) }

    pub fn from_env_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let token = var("GITHUB_TOKEN").context("GITHUB_TOKEN is not set")?;
        let api_url = match var("GITHUB_API_URL") {
            Some(url) => Url::parse(&url).with_context(|| format!("Invalid GITHUB_API_URL '{url}'"))?,
            None => default_api_url(),
        };
        let repository = var("GITHUB_REPOSITORY")
            .context("GITHUB_REPOSITORY is not set")?
            .parse::<RepoName>()?;
        let run_id = var("GITHUB_RUN_ID").context("GITHUB_RUN_ID is not set")?;
        let Ok(run_id) = run_id.trim().parse::<u64>() else {
            bail!("Invalid GITHUB_RUN_ID '{run_id}'");
        };
        Ok(Self {
            github: GitHubConfig { token, api_url },
            run: RunContext { repository, run_id },
            check: CheckConfig::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_repo_name() {
        let cases: &[(&str, Option<(&str, &str)>)] = &[
            ("foo/bar", Some(("foo", "bar"))),
            ("foo/bar/baz", None),
            ("foo", None),
            ("/bar", None),
            ("foo/", None),
        ];
        for &(input, expected) in cases {
            let parsed = input.parse::<RepoName>().ok();
            assert_eq!(
                parsed.as_ref().map(|r| (r.owner.as_str(), r.name.as_str())),
                expected,
                "{input}"
            );
        }
    }

    #[test]
    fn test_from_env() {
        let config = Config::from_env_with(env(&[
            ("GITHUB_TOKEN", "secret"),
            ("GITHUB_REPOSITORY", "sigproc/sf2-team-7"),
            ("GITHUB_RUN_ID", "123456"),
        ]))
        .unwrap();
        assert_eq!(config.github.token, "secret");
        assert_eq!(config.github.api_url.as_str(), "https://api.github.com/");
        assert_eq!(config.run.repository, RepoName::new("sigproc", "sf2-team-7"));
        assert_eq!(config.run.run_id, 123456);
        assert_eq!(config.check.name, "Autograding");
    }

    #[test]
    fn test_from_env_enterprise() {
        let config = Config::from_env_with(env(&[
            ("GITHUB_TOKEN", "secret"),
            ("GITHUB_REPOSITORY", "a/b"),
            ("GITHUB_RUN_ID", "1"),
            ("GITHUB_API_URL", "https://git.example.com/api/v3"),
        ]))
        .unwrap();
        assert_eq!(config.github.api_url.as_str(), "https://git.example.com/api/v3");
    }

    #[test]
    fn test_from_env_invalid() {
        assert!(Config::from_env_with(env(&[])).is_err());
        assert!(
            Config::from_env_with(env(&[
                ("GITHUB_TOKEN", "secret"),
                ("GITHUB_REPOSITORY", "no-slash"),
                ("GITHUB_RUN_ID", "1"),
            ]))
            .is_err()
        );
        assert!(
            Config::from_env_with(env(&[
                ("GITHUB_TOKEN", "secret"),
                ("GITHUB_REPOSITORY", "a/b"),
                ("GITHUB_RUN_ID", "latest"),
            ]))
            .is_err()
        );
    }

    #[test]
    fn test_from_yaml() {
        let config: Config = serde_yaml::from_str(
            "github:\n  token: abc\nrun:\n  repository: foo/bar\n  run_id: 42\ncheck:\n  name: Grading\n",
        )
        .unwrap();
        assert_eq!(config.github.api_url.as_str(), "https://api.github.com/");
        assert_eq!(config.run.repository.to_string(), "foo/bar");
        assert_eq!(config.run.run_id, 42);
        assert_eq!(config.check.name, "Grading");
    }
}
