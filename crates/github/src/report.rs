use std::sync::OnceLock;

use regex::Regex;
use sf2_compete_core::{
    config::{DEFAULT_CHECK_NAME, RunContext},
    models::Score,
};

use crate::{
    ChecksApi, MAX_ANNOTATIONS_PER_REQUEST,
    checks::{Annotation, AnnotationLevel, CheckRunId, CheckRunOutput, CheckSuiteId, RunId},
};

pub const OUTPUT_TITLE: &str = "Autograding";
pub const ANNOTATION_PATH: &str = ".github";
pub const ANNOTATION_TITLE: &str = "Autograding complete";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Workflow run {0} not found")]
    RunNotFound(RunId),
    #[error("Failed to parse check suite ID from {0:?}")]
    SuiteId(String),
    #[error("No check run named '{name}' in check suite {suite_id}")]
    NoCheckRun { name: String, suite_id: CheckSuiteId },
    #[error("Found {count} check runs named '{name}' in check suite {suite_id}")]
    AmbiguousCheckRun { name: String, suite_id: CheckSuiteId, count: usize },
    #[error("Failed to {operation}: {error:#}")]
    Api { operation: &'static str, error: anyhow::Error },
}

fn api_error(operation: &'static str) -> impl FnOnce(anyhow::Error) -> ReportError {
    move |error| ReportError::Api { operation, error }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    pub check_run_id: CheckRunId,
    /// Annotations on the check run after the update.
    pub annotations: usize,
}

/// Posts scores onto the check run of a workflow run.
pub struct Reporter<A> {
    api: A,
    run: RunContext,
    check_name: String,
}

impl<A: ChecksApi> Reporter<A> {
    pub fn new(api: A, run: RunContext) -> Self {
        Self { api, run, check_name: DEFAULT_CHECK_NAME.to_string() }
    }

    pub fn with_check_name(mut self, check_name: impl Into<String>) -> Self {
        self.check_name = check_name.into();
        self
    }

    pub fn api(&self) -> &A { &self.api }

    /// Prepend a score annotation to the check run and replace its output.
    ///
    /// Nothing is written unless the workflow run resolves to exactly one check run.
    pub async fn report(&self, score: &Score) -> Result<ReportOutcome, ReportError> {
        let repo = &self.run.repository;
        let run = self
            .api
            .get_run(repo, self.run.run_id)
            .await
            .map_err(api_error("fetch workflow run"))?
            .ok_or(ReportError::RunNotFound(self.run.run_id))?;
        let suite_url = run.check_suite_url.unwrap_or_default();
        let suite_id =
            parse_suite_id(&suite_url).ok_or_else(|| ReportError::SuiteId(suite_url.clone()))?;
        tracing::debug!("Workflow run {} belongs to check suite {}", run.id, suite_id);

        let list = self
            .api
            .list_checks_for_suite(repo, suite_id, &self.check_name)
            .await
            .map_err(api_error("list check runs"))?;
        let mut matches = list.check_runs.into_iter().filter(|c| c.name == self.check_name);
        let check_run = match (matches.next(), matches.count()) {
            (Some(check_run), 0) => check_run,
            (None, _) => {
                return Err(ReportError::NoCheckRun { name: self.check_name.clone(), suite_id });
            }
            (Some(_), rest) => {
                return Err(ReportError::AmbiguousCheckRun {
                    name: self.check_name.clone(),
                    suite_id,
                    count: rest + 1,
                });
            }
        };

        let existing = self
            .api
            .list_annotations(repo, check_run.id)
            .await
            .map_err(api_error("list annotations"))?;
        let annotations = merge_annotations(score_annotation(score), existing);
        let count = annotations.len();
        if count > MAX_ANNOTATIONS_PER_REQUEST {
            tracing::warn!(
                "Check run {} would carry {} annotations, GitHub accepts at most {} per update",
                check_run.id,
                count,
                MAX_ANNOTATIONS_PER_REQUEST
            );
        }
        let text = score.to_string();
        let output = CheckRunOutput {
            title: OUTPUT_TITLE.to_string(),
            summary: text.clone(),
            text,
            annotations,
        };
        self.api
            .update_check(repo, check_run.id, &output)
            .await
            .map_err(api_error("update check run"))?;
        tracing::info!(
            "Reported '{}' on check run {} ({} annotations)",
            score,
            check_run.id,
            count
        );
        Ok(ReportOutcome { check_run_id: check_run.id, annotations: count })
    }
}

/// Parse the trailing integer of a check suite URL.
pub fn parse_suite_id(url: &str) -> Option<CheckSuiteId> {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = REGEX.get_or_init(|| Regex::new(r"(?P<id>[0-9]+)$").unwrap());
    regex.captures(url)?.name("id")?.as_str().parse().ok()
}

pub fn score_annotation(score: &Score) -> Annotation {
    Annotation {
        path: ANNOTATION_PATH.to_string(),
        start_line: 1,
        end_line: 1,
        start_column: None,
        end_column: None,
        annotation_level: AnnotationLevel::Notice,
        message: score.to_string(),
        title: Some(ANNOTATION_TITLE.to_string()),
        raw_details: None,
    }
}

/// Insert `annotation` ahead of the existing ones, keeping their order.
pub fn merge_annotations(annotation: Annotation, existing: Vec<Annotation>) -> Vec<Annotation> {
    let mut out = Vec::with_capacity(existing.len() + 1);
    out.push(annotation);
    out.extend(existing);
    out
}
