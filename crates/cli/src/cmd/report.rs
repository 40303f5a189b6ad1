use anyhow::{Context, Result, bail};
use argp::FromArgs;
use sf2_compete_core::{
    commands::{self, Command, Level},
    config::Config,
    models::{Score, Summary},
};
use sf2_compete_github::{
    GitHub,
    report::{ANNOTATION_TITLE, Reporter},
};
use typed_path::Utf8NativePathBuf;

use crate::util::native_path;

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// Post a score annotation on the autograding check run.
#[argp(subcommand, name = "report")]
pub struct Args {
    #[argp(positional)]
    /// score to report, e.g. "8/10"
    score: Option<String>,
    #[argp(option, short = 's', from_str_fn(native_path))]
    /// read the score from the grading tool's summary.json
    summary: Option<Utf8NativePathBuf>,
    #[argp(option)]
    /// name of the check run to annotate (default "Autograding")
    check_name: Option<String>,
    #[argp(switch)]
    /// exit with an error if the score could not be reported
    strict: bool,
}

pub async fn run(args: Args, config_path: Option<&Utf8NativePathBuf>) -> Result<()> {
    let score = match resolve_score(&args) {
        Ok(score) => score,
        Err(e) => {
            tracing::warn!("Skipping score report: {:#}", e);
            commands::warning(&format!("Skipping score report: {e:#}"));
            return Ok(());
        }
    };
    if let Err(e) = report(&args, config_path, &score).await {
        tracing::error!("Failed to report score: {:?}", e);
        commands::error(&format!("Failed to report score: {e:#}"));
        if args.strict {
            bail!("Score was not reported");
        }
    }
    Ok(())
}

fn resolve_score(args: &Args) -> Result<Score> {
    if let Some(text) = &args.score {
        return Score::new(text).context("Score is empty");
    }
    let Some(path) = &args.summary else {
        bail!("No score or summary given");
    };
    let summary = Summary::read(path.with_platform_encoding())?;
    summary.score().with_context(|| format!("No required images in {}", path))
}

async fn report(
    args: &Args,
    config_path: Option<&Utf8NativePathBuf>,
    score: &Score,
) -> Result<()> {
    let config = match config_path {
        Some(path) => Config::from_file(path.with_platform_encoding())?,
        None => Config::from_env()?,
    };
    let check_name = args.check_name.clone().unwrap_or(config.check.name);
    let github = GitHub::new(&config.github)?;
    tracing::info!(
        "Reporting on {} run {} (check '{}')",
        config.run.repository,
        config.run.run_id,
        check_name
    );
    let reporter = Reporter::new(github, config.run).with_check_name(check_name);
    reporter.report(score).await?;
    score_notice(&score.to_string()).issue();
    Ok(())
}

/// Echo the reported score in the job log.
fn score_notice(message: &str) -> Command<'_> {
    Command::new(Level::Notice, message).title(ANNOTATION_TITLE)
}
