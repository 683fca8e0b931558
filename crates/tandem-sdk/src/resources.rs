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

//! Resource streaming on the render thread.

use crate::importer::ImporterRegistry;
use anyhow::Context as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tandem_core::asset::{ImportedAsset, LoadRequest, LoadedResource, ResourceStreamer};
use tandem_core::renderer::{IdAllocator, RenderDevice};
use tandem_core::WaitError;

/// Settles [`LoadRequest`]s: reads the file, imports it through the registry
/// and creates the device object.
///
/// Attached to the render system and driven by `UpdateResources` commands,
/// so every device call happens on the render thread.
pub struct ResourceManager {
    requests: crossbeam_channel::Receiver<LoadRequest>,
    importers: ImporterRegistry,
    root: PathBuf,
    ids: Arc<IdAllocator>,
    max_loads_per_update: usize,
    loaded: u64,
    failed: u64,
}

impl ResourceManager {
    /// Creates a manager consuming `requests`.
    pub fn new(
        requests: crossbeam_channel::Receiver<LoadRequest>,
        importers: ImporterRegistry,
        root: impl Into<PathBuf>,
        ids: Arc<IdAllocator>,
        max_loads_per_update: usize,
    ) -> Self {
        Self {
            requests,
            importers,
            root: root.into(),
            ids,
            max_loads_per_update: max_loads_per_update.max(1),
            loaded: 0,
            failed: 0,
        }
    }

    /// Loads that completed successfully.
    pub fn loaded(&self) -> u64 {
        self.loaded
    }

    /// Loads that failed.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn load(&self, device: &mut dyn RenderDevice, path: &Path) -> anyhow::Result<LoadedResource> {
        let path = self.resolve(path);
        let importer = self
            .importers
            .for_path(&path)
            .with_context(|| format!("no importer handles {}", path.display()))?;
        let bytes =
            std::fs::read(&path).with_context(|| format!("cannot read {}", path.display()))?;

        let resource = match importer.import(&path, &bytes)? {
            ImportedAsset::Buffer {
                descriptor,
                contents,
            } => {
                let id = self.ids.buffer();
                device.create_buffer(id, &descriptor, Some(&contents))?;
                LoadedResource::Buffer {
                    id,
                    size: descriptor.size,
                }
            }
            ImportedAsset::Texture { descriptor, texels } => {
                let id = self.ids.texture();
                device.create_texture(id, &descriptor, Some(&texels))?;
                LoadedResource::Texture {
                    id,
                    width: descriptor.width,
                    height: descriptor.height,
                }
            }
            ImportedAsset::Program(descriptor) => {
                let id = self.ids.program();
                LoadedResource::Program(device.create_program(id, &descriptor)?)
            }
        };
        log::debug!("Loaded {} with '{}'.", path.display(), importer.name());
        Ok(resource)
    }
}

impl ResourceStreamer for ResourceManager {
    fn update(&mut self, device: &mut dyn RenderDevice) -> anyhow::Result<usize> {
        let mut settled = 0;
        let batch: Vec<LoadRequest> = self
            .requests
            .try_iter()
            .take(self.max_loads_per_update)
            .collect();

        for LoadRequest { path, ready } in batch {
            match self.load(device, &path) {
                Ok(resource) => {
                    self.loaded += 1;
                    ready.complete(resource);
                }
                Err(err) => {
                    self.failed += 1;
                    let reason = format!("{err:#}");
                    log::warn!("Loading {} failed: {reason}", path.display());
                    ready.fail(WaitError::CommandFailed {
                        command: "UpdateResources",
                        reason,
                    });
                }
            }
            settled += 1;
        }
        Ok(settled)
    }
}
