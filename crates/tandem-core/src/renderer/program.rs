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

//! Producer-side cache of GPU programs.

use super::context::{DeferredRenderContext, GpuProgramHandle};
use super::error::ShaderError;
use super::types::{DeviceCapabilities, GpuProgramDescriptor};
use std::collections::HashMap;

/// Requests GPU programs through a deferred context and caches them by name.
///
/// Language support is checked here, on the producer side, so that an
/// unsupported program never reaches the render thread.
#[derive(Debug, Default)]
pub struct GpuProgramManager {
    languages: Vec<String>,
    programs: HashMap<String, GpuProgramHandle>,
}

impl GpuProgramManager {
    /// Creates a manager for a device with the given capabilities.
    pub fn new(capabilities: &DeviceCapabilities) -> Self {
        Self {
            languages: capabilities.program_languages.clone(),
            programs: HashMap::new(),
        }
    }

    /// Adopts the language support of a device that started after the manager.
    ///
    /// An unbound manager rejects every language.
    pub fn bind_device(&mut self, capabilities: &DeviceCapabilities) {
        self.languages = capabilities.program_languages.clone();
    }

    /// Returns `true` if programs in `language` can be requested.
    pub fn supports_language(&self, language: &str) -> bool {
        self.languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language))
    }

    /// Requests a program, or returns the cached handle if one with the same
    /// name was already requested.
    pub fn create(
        &mut self,
        ctx: &mut DeferredRenderContext,
        descriptor: GpuProgramDescriptor,
    ) -> Result<GpuProgramHandle, ShaderError> {
        if let Some(existing) = self.programs.get(&descriptor.name) {
            return Ok(existing.clone());
        }
        if !self.supports_language(&descriptor.language) {
            return Err(ShaderError::UnsupportedLanguage {
                label: descriptor.name,
                language: descriptor.language,
            });
        }

        let name = descriptor.name.clone();
        let handle = ctx.create_gpu_program(descriptor);
        log::debug!("Requested GPU program '{name}' as {:?}", handle.id);
        self.programs.insert(name, handle.clone());
        Ok(handle)
    }

    /// Looks up a program by name.
    pub fn get(&self, name: &str) -> Option<&GpuProgramHandle> {
        self.programs.get(name)
    }

    /// Records the destruction of a program and forgets it.
    pub fn destroy(&mut self, ctx: &mut DeferredRenderContext, name: &str) -> bool {
        match self.programs.remove(name) {
            Some(handle) => {
                ctx.destroy_gpu_program(handle.id);
                true
            }
            None => false,
        }
    }

    /// Records the destruction of every cached program.
    pub fn clear(&mut self, ctx: &mut DeferredRenderContext) {
        for (_, handle) in self.programs.drain() {
            ctx.destroy_gpu_program(handle.id);
        }
    }

    /// Number of cached programs.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Returns `true` if no program is cached.
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
