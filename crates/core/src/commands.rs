//! GitHub Actions workflow commands.
//!
//! Escaping matches `@actions/core` (`packages/core/src/command.ts`).

use std::{
    fmt::{self, Write as _},
    fs::OpenOptions,
    io::Write,
    path::Path,
};

use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Notice,
    Warning,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A single `::level key=value,...::message` line.
#[derive(Debug, Clone)]
pub struct Command<'a> {
    pub level: Level,
    pub properties: Vec<(&'static str, String)>,
    pub message: &'a str,
}

impl<'a> Command<'a> {
    pub fn new(level: Level, message: &'a str) -> Self {
        Self { level, properties: Vec::new(), message }
    }

    pub fn title(self, title: impl Into<String>) -> Self { self.property("title", title) }

    fn property(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.properties.push((key, value.into()));
        self
    }

    /// Print to stdout, where the runner picks up workflow commands.
    pub fn issue(&self) { println!("{self}"); }
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "::{}", self.level.as_str())?;
        for (i, (key, value)) in self.properties.iter().enumerate() {
            f.write_char(if i == 0 { ' ' } else { ',' })?;
            write!(f, "{key}={}", escape_property(value))?;
        }
        write!(f, "::{}", escape_data(self.message))
    }
}

pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

pub fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

pub fn warning(message: &str) { Command::new(Level::Warning, message).issue() }

pub fn error(message: &str) { Command::new(Level::Error, message).issue() }

/// Format a step output for the `$GITHUB_OUTPUT` file.
pub fn format_output(name: &str, value: &str) -> String {
    if value.contains('\n') || value.contains('\r') {
        let mut delimiter = String::from("ghadelimiter");
        while value.contains(&delimiter) {
            delimiter.push('_');
        }
        format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
    } else {
        format!("{name}={value}\n")
    }
}

/// Append step outputs to the `$GITHUB_OUTPUT` file.
pub fn set_outputs(path: &Path, outputs: &[(&str, &str)]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open output file {}", path.display()))?;
    for (name, value) in outputs {
        file.write_all(format_output(name, value).as_bytes())
            .with_context(|| format!("Failed to write output {name}"))?;
    }
    Ok(())
}
