//! Hosting-environment plumbing for GitHub Actions runners.
//!
//! Reads step inputs, makes the provisioned directory visible to later
//! steps through the `GITHUB_PATH` file, and reports failures as workflow
//! annotations.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const VERSION_INPUT: &str = "cli-version";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionsContext {
    pub in_actions: bool,
    pub path_file: Option<PathBuf>,
    inputs: Vec<(String, String)>,
}

impl ActionsContext {
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut ctx = ActionsContext::default();
        for (key, value) in vars {
            let (key, value) = (key.into(), value.into());
            match key.as_str() {
                "GITHUB_ACTIONS" => ctx.in_actions = value == "true",
                "GITHUB_PATH" if !value.is_empty() => ctx.path_file = Some(PathBuf::from(value)),
                k if k.starts_with("INPUT_") => ctx.inputs.push((key, value)),
                _ => {}
            }
        }
        ctx
    }

    /// Value of a step input, `None` when unset or blank. Input names map
    /// to `INPUT_<NAME>` with spaces replaced by underscores.
    pub fn input(&self, name: &str) -> Option<String> {
        let key = format!("INPUT_{}", name.replace(' ', "_").to_uppercase());
        self.inputs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Make `dir` searchable by subsequent steps.
    pub fn add_path(&self, dir: &Path) -> Result<()> {
        if let Some(path_file) = &self.path_file {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path_file)
                .with_context(|| format!("Could not open {}", path_file.display()))?;
            writeln!(file, "{}", dir.display())
                .with_context(|| format!("Could not write to {}", path_file.display()))?;
            tracing::debug!("Appended {} to {}", dir.display(), path_file.display());
        } else {
            tracing::debug!("GITHUB_PATH not set, only printing {}", dir.display());
        }
        Ok(())
    }

    /// Report a failed step. Under Actions the message becomes an error
    /// annotation on stdout.
    pub fn set_failed(&self, message: &str) {
        if self.in_actions {
            println!("::error::{}", escape_data(message));
        } else {
            tracing::error!("{}", message);
        }
    }
}

fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
