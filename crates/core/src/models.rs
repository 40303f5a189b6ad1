use std::{collections::BTreeMap, fmt, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A score to post on the check run, rendered as `Points {score}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score(String);

impl Score {
    /// Returns `None` for a missing (blank) score.
    pub fn new(text: &str) -> Option<Self> {
        let text = text.trim();
        (!text.is_empty()).then(|| Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Points {}", self.0) }
}

/// The `summary.json` written by the grading tool.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Summary {
    #[serde(default)]
    pub required: BTreeMap<String, ImageResult>,
    #[serde(default)]
    pub extra: BTreeMap<String, ImageResult>,
    #[serde(default)]
    pub failed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ImageResult {
    pub rms: f64,
    #[serde(default)]
    pub fail: bool,
    /// Absent when the encoded stream did not pass the VLC check.
    #[serde(default)]
    pub total_bits: Option<u64>,
}

impl Summary {
    pub fn parse(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).context("Failed to parse summary")
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read summary {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("Invalid summary {}", path.display()))
    }

    /// RMS error of each required image.
    pub fn rms(&self) -> BTreeMap<&str, f64> {
        self.required.iter().map(|(name, result)| (name.as_str(), result.rms)).collect()
    }

    /// Score text for the required images, or `None` if there is nothing to score.
    pub fn score_text(&self) -> Option<String> {
        if self.required.is_empty() {
            return None;
        }
        let mut out = String::new();
        for (name, result) in &self.required {
            if !out.is_empty() {
                out.push_str("; ");
            }
            match result.total_bits {
                Some(bits) => out.push_str(&format!("{name}: rms {:.3}, {bits} bits", result.rms)),
                None => out.push_str(&format!("{name}: rms {:.3}, invalid", result.rms)),
            }
        }
        if self.failed {
            out.push_str(" (failed)");
        }
        Some(out)
    }

    pub fn score(&self) -> Option<Score> { self.score_text().as_deref().and_then(Score::new) }
}
