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

//! The importer registry: maps file extensions to asset importers.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tandem_core::asset::AssetImporter;

type ImporterMap = HashMap<String, Arc<dyn AssetImporter>>;

/// Shared extension-to-importer table.
///
/// Cloning yields another handle to the same table, so importers registered
/// on the simulation thread are visible to the resource streamer on the
/// render thread.
#[derive(Clone, Default)]
pub struct ImporterRegistry {
    importers: Arc<RwLock<ImporterMap>>,
}

impl ImporterRegistry {
    fn read(&self) -> RwLockReadGuard<'_, ImporterMap> {
        self.importers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ImporterMap> {
        self.importers.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers `importer` for each of its extensions. A later registration
    /// for the same extension replaces the earlier one.
    pub fn register(&self, importer: Arc<dyn AssetImporter>) {
        let mut importers = self.write();
        for extension in importer.extensions() {
            let extension = extension.to_ascii_lowercase();
            if let Some(previous) = importers.insert(extension.clone(), importer.clone()) {
                log::warn!(
                    "Importer '{}' replaces '{}' for '.{extension}' files.",
                    importer.name(),
                    previous.name()
                );
            }
        }
        log::debug!(
            "Registered importer '{}' for {:?}.",
            importer.name(),
            importer.extensions()
        );
    }

    /// The importer for an extension, case-insensitively.
    pub fn for_extension(&self, extension: &str) -> Option<Arc<dyn AssetImporter>> {
        self.read().get(&extension.to_ascii_lowercase()).cloned()
    }

    /// The importer for a file, chosen by its extension.
    pub fn for_path(&self, path: &Path) -> Option<Arc<dyn AssetImporter>> {
        self.for_extension(path.extension()?.to_str()?)
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.read().keys().cloned().collect();
        extensions.sort();
        extensions
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Forgets every importer.
    pub fn clear(&self) {
        self.write().clear();
    }
}

impl fmt::Debug for ImporterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImporterRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}
