//! llbdump configuration loading from `.llbdump.toml`.
//!
//! Configuration is optional; llbdump uses built-in defaults when no config
//! file exists. Command-line flags and pipeline environment variables take
//! precedence over anything set here.
//!
//! # Example Configuration
//!
//! ```toml
//! [output]
//! format = "graph"
//! color = "auto"
//!
//! [pipeline]
//! runner_image = "docker.0k.io/compose:latest"
//! ```

use serde::Deserialize;
use std::path::Path;

use llbdump_core::ColorMode;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".llbdump.toml";

/// Root configuration structure loaded from `.llbdump.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct LlbdumpConfig {
    /// Output preferences.
    #[serde(default)]
    pub output: OutputSettings,

    /// Defaults for the built-in compose pipeline.
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

/// Output preferences.
///
/// `llbdump dump --format`/`--color` override these settings.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Default dump format.
    ///
    /// Valid values: `raw`, `records-json`, `records-yaml`, `graph` and the
    /// aliases `llb`, `json`, `yaml`, `dot`. Default: `raw`.
    #[serde(default)]
    pub format: Option<String>,

    /// Whether to highlight YAML output: `on`, `off` or `auto`.
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PipelineSettings {
    /// Runner image, used when `COMPOSE_DOCKER_IMAGE` is not set.
    #[serde(default)]
    pub runner_image: Option<String>,
}

impl LlbdumpConfig {
    /// Load configuration from `.llbdump.toml` in the given directory.
    ///
    /// If the config file doesn't exist or can't be parsed, returns defaults.
    /// Parse errors are logged as warnings but don't cause failures.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", CONFIG_FILE, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", CONFIG_FILE, e);
                }
            }
        }
        Self::default()
    }

    /// Get the default dump format, if configured.
    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    /// Get the configured color mode.
    ///
    /// Unknown values are logged and ignored.
    pub fn color(&self) -> Option<ColorMode> {
        let value = self.output.color.as_deref()?;
        match value.parse() {
            Ok(mode) => Some(mode),
            Err(e) => {
                tracing::warn!("Ignoring [output] color in {}: {}", CONFIG_FILE, e);
                None
            }
        }
    }

    /// Get the configured runner image, if any.
    pub fn runner_image(&self) -> Option<&str> {
        self.pipeline.runner_image.as_deref()
    }
}
