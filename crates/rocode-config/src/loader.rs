use crate::schema::PrAgentConfig;
use anyhow::{Context, Result};
use jsonc_parser::{parse_to_serde_value, ParseOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

static ENV_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{env:([^}]+)\}").expect("env reference regex"));

/// Project-local config locations, checked in order.
const PROJECT_CONFIG_FILES: &[&str] = &[".rocode/pr-agent.jsonc", ".rocode/pr-agent.json"];

pub struct ConfigLoader {
    config: PrAgentConfig,
    config_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config: PrAgentConfig::default(),
            config_paths: Vec::new(),
        }
    }

    pub fn load_from_str(&mut self, content: &str) -> Result<()> {
        let content = substitute_env_vars(content);
        let config = parse_jsonc(&content).with_context(|| "Failed to parse config content")?;
        self.config.merge(config);
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let content = substitute_env_vars(&content);
        let config = parse_jsonc(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        tracing::debug!(path = %path.display(), "loaded pr-agent config");
        self.config.merge(config);
        self.config_paths.push(path.to_path_buf());
        Ok(())
    }

    pub fn load_project<P: AsRef<Path>>(&mut self, project_dir: P) -> Result<()> {
        let dir = project_dir.as_ref();
        if let Some(path) = PROJECT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
        {
            self.load_from_file(path)?;
        }
        Ok(())
    }

    pub fn load_from_env(&mut self) -> Result<()> {
        if let Ok(config_path) = env::var("ROCODE_PR_CONFIG") {
            if !config_path.trim().is_empty() {
                self.load_from_file(config_path.trim())?;
            }
        }
        Ok(())
    }

    /// Apply a final overlay (typically assembled from CLI flags).
    pub fn overlay(&mut self, config: PrAgentConfig) {
        self.config.merge(config);
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    pub fn build(self) -> PrAgentConfig {
        self.config
    }
}

/// Load the layered config: explicit `--config` file if given, otherwise
/// `ROCODE_PR_CONFIG`, otherwise the project-local file in `cwd`.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<ConfigLoader> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        loader.load_from_file(path)?;
    } else if env::var("ROCODE_PR_CONFIG").is_ok() {
        loader.load_from_env()?;
    } else {
        loader.load_project(cwd)?;
    }
    Ok(loader)
}

/// Replace `{env:VAR}` references with the variable's value (empty when unset).
fn substitute_env_vars(text: &str) -> String {
    ENV_REFERENCE
        .replace_all(text, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_default()
        })
        .to_string()
}

fn parse_jsonc(content: &str) -> Result<PrAgentConfig> {
    let parse_options = ParseOptions {
        allow_trailing_commas: true,
        ..Default::default()
    };
    let parsed = parse_to_serde_value(content, &parse_options)
        .with_context(|| "Failed to parse JSONC")?
        .context("Config content is empty")?;
    serde_json::from_value(parsed).with_context(|| "Failed to parse config JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RunMode;

    #[test]
    fn test_parse_jsonc_with_comments_and_trailing_commas() {
        let content = r#"{
            // trigger words
            "keywords": { "command": ["/fix",], },
            "mode": "review",
            "pullRequestId": 12,
        }"#;
        let config = parse_jsonc(content).unwrap();
        assert_eq!(config.mode, Some(RunMode::Review));
        assert_eq!(config.pull_request_id, Some(12));
        assert_eq!(
            config.keywords.unwrap().command,
            Some(vec!["/fix".to_string()])
        );
    }

    #[test]
    fn test_substitute_env_vars() {
        env::set_var("ROCODE_PR_TEST_PROJECT", "Platform");
        let out = substitute_env_vars(r#"{"project": "{env:ROCODE_PR_TEST_PROJECT}"}"#);
        assert_eq!(out, r#"{"project": "Platform"}"#);
        env::remove_var("ROCODE_PR_TEST_PROJECT");
    }

    #[test]
    fn test_load_project_file_then_overlay() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".rocode")).unwrap();
        fs::write(
            dir.path().join(".rocode/pr-agent.jsonc"),
            r#"{ "project": "FromFile", "model": "openai/gpt-4.1" }"#,
        )
        .unwrap();

        let mut loader = ConfigLoader::new();
        loader.load_project(dir.path()).unwrap();
        loader.overlay(PrAgentConfig {
            model: Some("anthropic/claude-sonnet-4-20250514".to_string()),
            ..Default::default()
        });
        assert_eq!(loader.config_paths().len(), 1);

        let config = loader.build();
        assert_eq!(config.project.as_deref(), Some("FromFile"));
        assert_eq!(
            config.model.as_deref(),
            Some("anthropic/claude-sonnet-4-20250514")
        );
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.jsonc");
        assert!(load_config(Some(&missing), dir.path()).is_err());
    }
}
