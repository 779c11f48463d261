//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::debug;

use review_data::HttpReviewSource;

use crate::config::CliConfig;
use crate::output::Output;

/// Config file names searched for, in order.
pub const CONFIG_NAMES: [&str; 3] = ["reviews.toml", ".reviews.toml", "reviews.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Where the configuration came from, if not defaults.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            match Self::find_config(&cwd) {
                Some(path) => {
                    let config = CliConfig::load(&path.to_string_lossy())?;
                    (config, Some(path))
                }
                None => (CliConfig::default(), None),
            }
        };

        match &config_path {
            Some(path) => {
                debug!(path = %path.display(), base_url = %config.api.base_url, "loaded config");
                output.debug(&format!("Using config {}", path.display()));
            }
            None => debug!(base_url = %config.api.base_url, "no config file found, using defaults"),
        }

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let candidate = current.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// HTTP review source built from the configuration.
    pub fn source(&self) -> Result<HttpReviewSource> {
        HttpReviewSource::new(self.config.source_config())
            .context("Failed to create review service client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_config_walks_parents() {
        let root = std::env::temp_dir().join(format!("reviews-ctx-{}", std::process::id()));
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join(".reviews.toml"), "[api]\nbase_url = \"http://svc\"\n").unwrap();

        let found = Context::find_config(&nested).unwrap();
        assert_eq!(found, root.join(".reviews.toml"));

        std::fs::remove_dir_all(&root).unwrap();
    }
}
