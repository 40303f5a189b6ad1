pub mod checks;
pub mod report;

use anyhow::{Context, Result, anyhow};
use http::StatusCode;
use octocrab::{GitHubError, Octocrab};
use sf2_compete_core::config::{GitHubConfig, RepoName};

use crate::checks::{
    Annotation, CheckRun, CheckRunId, CheckRunList, CheckRunOutput, CheckSuiteId, RunId,
    UpdateCheckRun, WorkflowRun,
};

const ANNOTATIONS_PER_PAGE: u8 = 100;
/// GitHub rejects check run updates carrying more annotations than this.
pub const MAX_ANNOTATIONS_PER_REQUEST: usize = 50;

/// A page shorter than the page size is the last one.
fn is_last_page(len: usize) -> bool { len < ANNOTATIONS_PER_PAGE as usize }

/// The check run operations used by the reporter.
#[allow(async_fn_in_trait)]
pub trait ChecksApi {
    /// Fetch a workflow run, or `None` if it does not exist.
    async fn get_run(&self, repo: &RepoName, run_id: RunId) -> Result<Option<WorkflowRun>>;

    /// List the check runs in a suite with the given name.
    async fn list_checks_for_suite(
        &self,
        repo: &RepoName,
        suite_id: CheckSuiteId,
        check_name: &str,
    ) -> Result<CheckRunList>;

    /// List every annotation on a check run, in order.
    async fn list_annotations(
        &self,
        repo: &RepoName,
        check_run_id: CheckRunId,
    ) -> Result<Vec<Annotation>>;

    async fn update_check(
        &self,
        repo: &RepoName,
        check_run_id: CheckRunId,
        output: &CheckRunOutput,
    ) -> Result<CheckRun>;
}

#[derive(Clone)]
pub struct GitHub {
    pub client: Octocrab,
}

#[derive(serde::Serialize)]
struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    per_page: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
}

#[derive(serde::Serialize)]
struct CheckRunParams<'a> {
    check_name: &'a str,
    per_page: u8,
}

impl GitHub {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(config.token.clone())
            .base_uri(config.api_url.as_str())
            .with_context(|| format!("Invalid GitHub API URL {}", config.api_url))?
            .build()
            .context("Failed to create GitHub client")?;
        Ok(Self { client })
    }
}

impl ChecksApi for GitHub {
    async fn get_run(&self, repo: &RepoName, run_id: RunId) -> Result<Option<WorkflowRun>> {
        let route = format!("/repos/{}/{}/actions/runs/{run_id}", repo.owner, repo.name);
        match self.client.get::<WorkflowRun, _, _>(route, None::<&()>).await {
            Ok(run) => Ok(Some(run)),
            Err(octocrab::Error::GitHub { source, .. })
                if matches!(*source, GitHubError { status_code: StatusCode::NOT_FOUND, .. }) =>
            {
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to fetch workflow run {run_id}")),
        }
    }

    async fn list_checks_for_suite(
        &self,
        repo: &RepoName,
        suite_id: CheckSuiteId,
        check_name: &str,
    ) -> Result<CheckRunList> {
        let route =
            format!("/repos/{}/{}/check-suites/{suite_id}/check-runs", repo.owner, repo.name);
        self.client
            .get(route, Some(&CheckRunParams { check_name, per_page: 100 }))
            .await
            .with_context(|| format!("Failed to list check runs for suite {suite_id}"))
    }

    async fn list_annotations(
        &self,
        repo: &RepoName,
        check_run_id: CheckRunId,
    ) -> Result<Vec<Annotation>> {
        let route =
            format!("/repos/{}/{}/check-runs/{check_run_id}/annotations", repo.owner, repo.name);
        let mut annotations = Vec::new();
        let mut page = 1u32;
        loop {
            let items: Vec<Annotation> = self
                .client
                .get(
                    &route,
                    Some(&PageParams { per_page: Some(ANNOTATIONS_PER_PAGE), page: Some(page) }),
                )
                .await
                .with_context(|| format!("Failed to fetch annotations page {page}"))?;
            let last_page = is_last_page(items.len());
            annotations.extend(items);
            if last_page {
                break;
            }
            page += 1;
        }
        tracing::debug!("Check run {} has {} annotations", check_run_id, annotations.len());
        Ok(annotations)
    }

    async fn update_check(
        &self,
        repo: &RepoName,
        check_run_id: CheckRunId,
        output: &CheckRunOutput,
    ) -> Result<CheckRun> {
        let route = format!("/repos/{}/{}/check-runs/{check_run_id}", repo.owner, repo.name);
        let count = output.annotations.len();
        match self.client.patch(route, Some(&UpdateCheckRun { output })).await {
            Ok(check_run) => Ok(check_run),
            Err(octocrab::Error::GitHub { source, .. })
                if source.status_code == StatusCode::UNPROCESSABLE_ENTITY
                    && count > MAX_ANNOTATIONS_PER_REQUEST =>
            {
                Err(anyhow!(
                    "GitHub rejected {count} annotations on check run {check_run_id}, at most {} \
                     are accepted per request: {}",
                    MAX_ANNOTATIONS_PER_REQUEST,
                    source.message
                ))
            }
            Err(e) => Err(e).with_context(|| format!("Failed to update check run {check_run_id}")),
        }
    }
}
