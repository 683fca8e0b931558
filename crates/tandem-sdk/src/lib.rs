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

//! # Tandem SDK
//!
//! The engine applications build on: load an [`EngineConfig`], implement a
//! [`SceneManager`](tandem_core::scene::SceneManager), and hand both to
//! [`Engine::new`]. The engine starts its subsystems in [`STARTUP_ORDER`],
//! runs the frame loop on the calling thread while the render thread
//! executes the recorded commands, and stops everything in reverse order.

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod importer;
pub mod logging;
pub mod resources;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, STARTUP_ORDER};
pub use error::{EngineError, Subsystem};
pub use frame::{FrameDriver, FrameOutcome, FramePhase};
pub use importer::ImporterRegistry;
pub use resources::ResourceManager;

/// The types most applications need.
pub mod prelude {
    pub use crate::config::{EngineConfig, FrameConfig, WindowConfig};
    pub use crate::{Engine, EngineError, FrameOutcome};
    pub use tandem_core::asset::{LoadedResource, ResourceRequests};
    pub use tandem_core::platform::{InputState, PlatformEvent, Time};
    pub use tandem_core::renderer::{
        BufferDescriptor, BufferId, BufferUsage, DeferredRenderContext, GpuProgramDescriptor,
        Material, ParamValue, PassDescriptor, ProgramKind, TextureDescriptor, TextureFormat,
        TextureId, ViewInfo,
    };
    pub use tandem_core::scene::{Renderable, SceneFrame, SceneManager};
    pub use tandem_core::{EngineContext, ReadinessToken, WaitError, WaitOptions};
    pub use tandem_infra::BuiltinMaterialFactory;
}
