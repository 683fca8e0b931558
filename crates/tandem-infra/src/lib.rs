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

//! # Tandem Infra
//!
//! Concrete implementations of the contracts defined in `tandem-core`: the
//! threaded render system and its batch executor, the software device, the
//! headless platform event pump, the plugin loader, and the built-in
//! renderer and importer plugins.

#![warn(missing_docs)]

pub mod device;
pub mod importer;
pub mod platform;
pub mod plugin;
pub mod render;
pub mod renderer;

pub use device::software::{DeviceProbe, SoftwareDevice};
pub use platform::headless::{EventInjector, HeadlessEventPump};
pub use plugin::{ModuleSource, PluginLoader, PluginRegistry, StaticModuleSource};
pub use render::{select_backend, BackendSelection, RenderBackend, RenderSystemConfig, ThreadedRenderSystem};
pub use importer::raw::RawImporter;
pub use renderer::builtin::BuiltinMaterialFactory;
pub use renderer::forward::ForwardRenderer;
