//! Server Configuration
//!
//! Everything is read from the environment (and `.env` via `dotenvy`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

/// Process-level settings
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub model: String,
    pub system_prompt_path: PathBuf,
    pub max_tool_round_trips: usize,
    pub tool_timeout: Duration,
    pub inference_timeout: Duration,

    /// File-backed conversations when set, in-memory otherwise
    pub store_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            model: "gpt-4o".into(),
            system_prompt_path: PathBuf::from("system_prompt.txt"),
            max_tool_round_trips: 10,
            tool_timeout: Duration::from_secs(30),
            inference_timeout: Duration::from_secs(120),
            store_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(v) => Ok(Duration::from_secs(
                    v.parse().with_context(|| format!("{} must be a number of seconds", key))?,
                )),
                None => Ok(default),
            }
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            model: lookup("OPENAI_MODEL").unwrap_or(defaults.model),
            system_prompt_path: lookup("SYSTEM_PROMPT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.system_prompt_path),
            max_tool_round_trips: match lookup("MAX_TOOL_ROUND_TRIPS") {
                Some(v) => v.parse().context("MAX_TOOL_ROUND_TRIPS must be an integer")?,
                None => defaults.max_tool_round_trips,
            },
            tool_timeout: secs("TOOL_TIMEOUT_SECS", defaults.tool_timeout)?,
            inference_timeout: secs("INFERENCE_TIMEOUT_SECS", defaults.inference_timeout)?,
            store_dir: lookup("STORE_DIR").filter(|d| !d.is_empty()).map(PathBuf::from),
        })
    }

    /// Read the system prompt; a missing file is fatal
    pub fn load_system_prompt(&self) -> Result<String> {
        read_prompt(&self.system_prompt_path)
    }
}

fn read_prompt(path: &Path) -> Result<String> {
    let prompt = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read system prompt from {}", path.display()))?;
    Ok(prompt.trim_end().to_string())
}
