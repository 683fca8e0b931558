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

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tandem_core::asset::AssetImporter;
use tandem_core::plugin::{PluginHost, RendererFactory};
use tandem_core::renderer::Renderer;

/// Collects what plugins register.
#[derive(Default)]
pub struct PluginRegistry {
    renderers: HashMap<String, RendererFactory>,
    importers: Vec<Arc<dyn AssetImporter>>,
}

impl PluginRegistry {
    /// Instantiates the renderer registered under `name`.
    pub fn create_renderer(&self, name: &str) -> Option<Box<dyn Renderer>> {
        self.renderers.get(name).map(|factory| factory())
    }

    /// Names of the registered renderers, sorted.
    pub fn renderer_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.renderers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Importers registered so far, in registration order.
    pub fn importers(&self) -> &[Arc<dyn AssetImporter>] {
        &self.importers
    }

    /// Takes the registered importers out of the registry.
    pub fn take_importers(&mut self) -> Vec<Arc<dyn AssetImporter>> {
        std::mem::take(&mut self.importers)
    }
}

impl PluginHost for PluginRegistry {
    fn register_renderer(&mut self, name: &str, factory: RendererFactory) {
        if self.renderers.insert(name.to_string(), factory).is_some() {
            log::warn!("Renderer '{name}' registered twice; keeping the latest.");
        } else {
            log::debug!("Registered renderer '{name}'.");
        }
    }

    fn register_importer(&mut self, importer: Arc<dyn AssetImporter>) {
        log::debug!(
            "Registered importer '{}' for {:?}.",
            importer.name(),
            importer.extensions()
        );
        self.importers.push(importer);
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("renderers", &self.renderer_names())
            .field("importers", &self.importers.len())
            .finish()
    }
}
