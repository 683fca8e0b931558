// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Engine configuration, loadable from JSON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tandem_infra::RenderSystemConfig;

/// An error raised while loading or validating an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read configuration file {path}: {source}")]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration is not valid JSON for [`EngineConfig`].
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which renderer plugin to load and which of its renderers to activate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Logical module name of the plugin.
    pub module: String,
    /// Name the renderer registers under.
    pub name: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            module: "tandem_forward_renderer".to_string(),
            name: "ForwardRenderer".to_string(),
        }
    }
}

/// The primary render window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title.
    pub title: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Tandem".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Main-loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Block on the housekeeping submission so input sampled at the end of a
    /// tick includes everything the render thread pumped.
    pub blocking_event_pump: bool,
    /// Stop after this many frames.
    pub max_frames: Option<u64>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            blocking_event_pump: true,
            max_frames: None,
        }
    }
}

/// Render thread settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderThreadConfig {
    /// OS name of the render thread.
    pub thread_name: String,
    /// Turn panics inside commands into isolated failures.
    pub catch_panics: bool,
    /// Undelivered diagnostics and platform events kept per bus.
    pub event_capacity: usize,
}

impl Default for RenderThreadConfig {
    fn default() -> Self {
        let defaults = RenderSystemConfig::default();
        Self {
            thread_name: defaults.thread_name,
            catch_panics: defaults.catch_panics,
            event_capacity: defaults.event_capacity,
        }
    }
}

impl From<RenderThreadConfig> for RenderSystemConfig {
    fn from(config: RenderThreadConfig) -> Self {
        Self {
            thread_name: config.thread_name,
            catch_panics: config.catch_panics,
            event_capacity: config.event_capacity,
        }
    }
}

/// Resource streaming settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Upper bound on loads settled by one `UpdateResources` command.
    pub max_loads_per_update: usize,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            max_loads_per_update: 8,
        }
    }
}

/// Everything the engine needs to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name of the render system backend.
    pub render_system: String,
    /// The renderer plugin.
    pub renderer: RendererConfig,
    /// Additional plugin modules, loaded after the importer.
    pub plugins: Vec<String>,
    /// The primary window. Startup fails without one.
    pub window: Option<WindowConfig>,
    /// Directory relative load paths are resolved against.
    pub resources_root: PathBuf,
    /// Main-loop settings.
    pub frame: FrameConfig,
    /// Render thread settings.
    pub render_thread: RenderThreadConfig,
    /// Resource streaming settings.
    pub resources: ResourcesConfig,
    /// `env_logger` filter used when the `RUST_LOG` variable is not set.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            render_system: "software".to_string(),
            renderer: RendererConfig::default(),
            plugins: vec!["tandem_raw_importer".to_string()],
            window: Some(WindowConfig::default()),
            resources_root: PathBuf::from("."),
            frame: FrameConfig::default(),
            render_thread: RenderThreadConfig::default(),
            resources: ResourcesConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration. Missing fields take their
    /// default values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded engine configuration from {}", path.display());
        Self::from_json_str(&json)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks values that deserialization alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render_system.trim().is_empty() {
            return Err(ConfigError::Invalid("render_system is empty".to_string()));
        }
        if self.renderer.module.trim().is_empty() || self.renderer.name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "renderer needs both a module and a name".to_string(),
            ));
        }
        if let Some(window) = &self.window {
            if window.width == 0 || window.height == 0 {
                return Err(ConfigError::Invalid(format!(
                    "window size {}x{} is empty",
                    window.width, window.height
                )));
            }
        }
        if self.resources.max_loads_per_update == 0 {
            return Err(ConfigError::Invalid(
                "resources.max_loads_per_update must be at least 1".to_string(),
            ));
        }
        if self.render_thread.thread_name.is_empty() {
            return Err(ConfigError::Invalid("render_thread.thread_name is empty".to_string()));
        }
        if self.render_thread.event_capacity == 0 {
            return Err(ConfigError::Invalid(
                "render_thread.event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
