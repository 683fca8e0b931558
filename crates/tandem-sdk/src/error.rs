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

//! Engine errors and the subsystems they are reported against.

use crate::config::ConfigError;
use std::fmt;
use tandem_core::plugin::PluginError;
use tandem_core::renderer::RenderError;
use tandem_core::ContextError;

/// The engine's subsystems, named in [`STARTUP_ORDER`](crate::STARTUP_ORDER).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// Frame timing.
    Time,
    /// Input state.
    Input,
    /// Plugin loader and registry.
    PluginManager,
    /// GPU program cache.
    GpuProgramManager,
    /// The render thread and its device.
    RenderSystem,
    /// The active renderer.
    Renderer,
    /// The simulation thread's deferred context.
    PrimaryContext,
    /// The application's scene.
    SceneManager,
    /// Resource streaming.
    Resources,
    /// The importer registry.
    Importer,
    /// Additional plugins, typically importers.
    ImporterPlugins,
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An error that stops the engine from starting or running.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No render system backend has the configured name.
    #[error("no render system named '{name}' is available (known: {known})")]
    MissingRenderSystem {
        /// The configured name.
        name: String,
        /// The names that exist.
        known: String,
    },
    /// The renderer plugin did not provide the configured renderer.
    #[error("renderer '{name}' is not provided by module '{module}'")]
    MissingRenderer {
        /// The configured plugin module.
        module: String,
        /// The configured renderer name.
        name: String,
    },
    /// The configuration has no primary window.
    #[error("no render window is configured")]
    MissingRenderWindow,
    /// A plugin could not be loaded.
    #[error(transparent)]
    Plugin(#[from] PluginError),
    /// The render system failed.
    #[error("render system error: {0}")]
    Render(#[from] RenderError),
    /// The primary context could not reach the render thread.
    #[error(transparent)]
    Context(#[from] ContextError),
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The scene failed to start or update.
    #[error("scene error: {0:#}")]
    Scene(#[source] anyhow::Error),
    /// A collaborator other than the scene failed.
    #[error("{subsystem} failed: {source:#}")]
    Collaborator {
        /// The failing subsystem.
        subsystem: Subsystem,
        /// What went wrong.
        #[source]
        source: anyhow::Error,
    },
}
