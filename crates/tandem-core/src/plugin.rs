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

//! Plugin contracts.
//!
//! A plugin is found by a logical module name, and its entry point is a typed
//! [`PluginRegistration`] rather than a raw symbol. Registrations are
//! collected at link time with `inventory`; the loader in `tandem-infra`
//! decides where modules come from.

use crate::asset::AssetImporter;
use crate::renderer::frontend::Renderer;
use std::sync::Arc;

/// Name of the entry point every plugin module exports.
pub const PLUGIN_ENTRY_POINT: &str = "load_plugin";

/// Builds a fresh renderer instance.
pub type RendererFactory = Box<dyn Fn() -> Box<dyn Renderer> + Send + Sync>;

/// Errors raised while loading or registering a plugin.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// The module was found but does not export the entry point.
    #[error("plugin module `{module}` has no entry point `{symbol}`")]
    MissingEntryPoint {
        /// Resolved module file name.
        module: String,
        /// The entry point that was looked up.
        symbol: String,
    },
    /// The plugin's registration callback failed.
    #[error("plugin `{plugin}` failed to register: {reason}")]
    Registration {
        /// Plugin name.
        plugin: String,
        /// What went wrong.
        reason: String,
    },
}

/// What a plugin can extend.
pub trait PluginHost {
    /// Makes a renderer available under `name`.
    fn register_renderer(&mut self, name: &str, factory: RendererFactory);

    /// Makes an importer available for its extensions.
    fn register_importer(&mut self, importer: Arc<dyn AssetImporter>);
}

/// A loaded plugin.
pub trait Plugin: Send + Sync {
    /// The plugin's name.
    fn name(&self) -> &str;

    /// Registers everything the plugin provides.
    fn register(&self, host: &mut dyn PluginHost) -> Result<(), PluginError>;
}

/// A module's exported entry point.
#[derive(Debug, Clone, Copy)]
pub struct PluginRegistration {
    /// Logical module name, e.g. `"tandem_forward_renderer"`.
    pub module: &'static str,
    /// Entry point name, normally [`PLUGIN_ENTRY_POINT`].
    pub symbol: &'static str,
    /// Creates the plugin.
    pub entry: fn() -> Box<dyn Plugin>,
}

inventory::collect!(PluginRegistration);

/// Every registration linked into the current binary.
pub fn linked_registrations() -> impl Iterator<Item = &'static PluginRegistration> {
    inventory::iter::<PluginRegistration>.into_iter()
}
