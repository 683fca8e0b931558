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
use std::env::consts::DLL_SUFFIX;
use tandem_core::plugin::{linked_registrations, Plugin, PluginError, PluginHost, PluginRegistration};

/// The entry points a module exports, by symbol name.
#[derive(Debug, Clone, Default)]
pub struct ModuleExports {
    entries: HashMap<&'static str, fn() -> Box<dyn Plugin>>,
}

impl ModuleExports {
    /// Looks up an entry point.
    pub fn symbol(&self, name: &str) -> Option<fn() -> Box<dyn Plugin>> {
        self.entries.get(name).copied()
    }
}

/// Finds modules by resolved file name.
///
/// This is the only place that knows where plugin code comes from.
pub trait ModuleSource: Send + Sync {
    /// Opens the module stored under `file_name`, or `None` if there is none.
    fn open(&self, file_name: &str) -> Option<ModuleExports>;
}

/// Resolves modules from [`PluginRegistration`]s linked into the binary.
#[derive(Debug, Default)]
pub struct StaticModuleSource {
    modules: HashMap<String, ModuleExports>,
}

impl StaticModuleSource {
    /// A source holding every registration collected at link time.
    pub fn linked() -> Self {
        let mut source = Self::default();
        for registration in linked_registrations() {
            source.add(*registration);
        }
        source
    }

    /// Adds a registration.
    pub fn add(&mut self, registration: PluginRegistration) {
        self.modules
            .entry(resolve_module_file(registration.module))
            .or_default()
            .entries
            .insert(registration.symbol, registration.entry);
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, registration: PluginRegistration) -> Self {
        self.add(registration);
        self
    }
}

impl ModuleSource for StaticModuleSource {
    fn open(&self, file_name: &str) -> Option<ModuleExports> {
        self.modules.get(file_name).cloned()
    }
}

/// Appends the platform's native library suffix unless it is already there.
pub fn resolve_module_file(module: &str) -> String {
    if module.ends_with(DLL_SUFFIX) {
        module.to_string()
    } else {
        format!("{module}{DLL_SUFFIX}")
    }
}

struct LoadedPlugin {
    file_name: String,
    plugin: Box<dyn Plugin>,
}

/// Loads plugins by logical module name.
///
/// A missing module is not an error at this level: [`load`](Self::load)
/// returns `Ok(None)` and the caller decides. A module that exists but does
/// not export the entry point is a configuration error.
pub struct PluginLoader {
    source: Box<dyn ModuleSource>,
    entry_point: String,
    loaded: Vec<LoadedPlugin>,
}

impl PluginLoader {
    /// Creates a loader over `source`, looking up `entry_point` in each module.
    pub fn new(source: impl ModuleSource + 'static, entry_point: impl Into<String>) -> Self {
        Self {
            source: Box::new(source),
            entry_point: entry_point.into(),
            loaded: Vec::new(),
        }
    }

    /// Loads a module and invokes its entry point.
    pub fn load(&mut self, module: &str) -> Result<Option<&dyn Plugin>, PluginError> {
        let file_name = resolve_module_file(module);
        if let Some(index) = self.loaded.iter().position(|p| p.file_name == file_name) {
            log::debug!("Plugin module '{file_name}' is already loaded.");
            return Ok(Some(self.loaded[index].plugin.as_ref()));
        }

        let Some(exports) = self.source.open(&file_name) else {
            log::warn!("Plugin module '{file_name}' not found.");
            return Ok(None);
        };
        let entry = exports
            .symbol(&self.entry_point)
            .ok_or_else(|| PluginError::MissingEntryPoint {
                module: file_name.clone(),
                symbol: self.entry_point.clone(),
            })?;

        let plugin = entry();
        log::info!("Loaded plugin '{}' from '{file_name}'.", plugin.name());
        self.loaded.push(LoadedPlugin { file_name, plugin });
        Ok(self.loaded.last().map(|p| p.plugin.as_ref()))
    }

    /// Loads a module and lets it register with `host`.
    ///
    /// A module that is already loaded has registered before and is not
    /// registered again. Returns `false` if the module was not found.
    pub fn load_into(
        &mut self,
        module: &str,
        host: &mut dyn PluginHost,
    ) -> Result<bool, PluginError> {
        let file_name = resolve_module_file(module);
        if self.loaded.iter().any(|p| p.file_name == file_name) {
            log::debug!("Plugin module '{file_name}' already registered; skipping.");
            return Ok(true);
        }
        match self.load(module)? {
            Some(plugin) => {
                plugin.register(host)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Names of the loaded plugins, in load order.
    pub fn loaded(&self) -> Vec<&str> {
        self.loaded.iter().map(|p| p.plugin.name()).collect()
    }

    /// Unloads every plugin, last loaded first.
    pub fn unload_all(&mut self) {
        while let Some(loaded) = self.loaded.pop() {
            log::debug!("Unloading plugin '{}'.", loaded.plugin.name());
        }
    }
}

impl Drop for PluginLoader {
    fn drop(&mut self) {
        self.unload_all();
    }
}
