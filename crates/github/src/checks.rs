//! Wire models for the workflow run and check run endpoints.

use serde::{Deserialize, Serialize};

pub type RunId = u64;
pub type CheckSuiteId = u64;
pub type CheckRunId = u64;

/// The subset of a workflow run needed to find its check suite.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowRun {
    pub id: RunId,
    #[serde(default)]
    pub check_suite_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckRun {
    pub id: CheckRunId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckRunList {
    pub check_runs: Vec<CheckRun>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationLevel {
    #[default]
    Notice,
    Warning,
    Failure,
}

/// A check run annotation, as listed and as written back.
///
/// Fields GitHub only returns (such as `blob_href`) are dropped on read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Annotation {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
    pub annotation_level: AnnotationLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRunOutput {
    pub title: String,
    pub summary: String,
    pub text: String,
    pub annotations: Vec<Annotation>,
}

/// Request body for `PATCH /repos/{owner}/{repo}/check-runs/{id}`.
#[derive(Debug, Serialize)]
pub(crate) struct UpdateCheckRun<'a> {
    pub output: &'a CheckRunOutput,
}
