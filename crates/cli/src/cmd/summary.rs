use std::path::Path;

use anyhow::{Context, Result, bail};
use argp::FromArgs;
use sf2_compete_core::{commands, models::Summary};
use typed_path::Utf8NativePathBuf;

use crate::util::native_path;

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// Print the score from a grading summary and publish it as step outputs.
#[argp(subcommand, name = "summary")]
pub struct Args {
    #[argp(positional, from_str_fn(native_path))]
    /// summary.json written by the grading tool
    path: Utf8NativePathBuf,
    #[argp(switch)]
    /// write `score` and `rms` outputs to $GITHUB_OUTPUT
    github_output: bool,
}

pub fn run(args: Args) -> Result<()> {
    let summary = Summary::read(args.path.with_platform_encoding())?;
    let score = summary.score_text().unwrap_or_default();
    if score.is_empty() {
        tracing::warn!("No required images in {}", args.path);
    } else {
        println!("{}", score);
    }
    if args.github_output {
        let Some(output_path) = std::env::var_os("GITHUB_OUTPUT") else {
            bail!("GITHUB_OUTPUT is not set");
        };
        let rms = serde_json::to_string(&summary.rms()).context("Failed to serialize RMS")?;
        commands::set_outputs(Path::new(&output_path), &[
            ("score", score.as_str()),
            ("rms", rms.as_str()),
        ])?;
    }
    if summary.failed {
        bail!("Some images failed the tests");
    }
    Ok(())
}
