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

//! Provides the public, backend-agnostic rendering contracts.
//!
//! This module defines what the producer threads and the render thread agree
//! on: the descriptors carried inside commands, the [`RenderDevice`] trait the
//! render thread drives, the [`RenderSystem`] trait that owns the thread, and
//! the [`DeferredRenderContext`] producers record into.
//!
//! The concrete render thread and devices live in the `tandem-infra` crate.

pub mod context;
pub mod device;
pub mod error;
pub mod frontend;
pub mod material;
pub mod program;
pub mod request;
pub mod stats;
pub mod system;
pub mod types;

pub use self::context::{
    BufferHandle, ContextError, ContextId, DeferredRenderContext, GpuProgramHandle,
    ResourceHandle, SubmissionFence, TextureHandle,
};
pub use self::device::RenderDevice;
pub use self::error::{RenderError, ResourceError, ShaderError};
pub use self::frontend::{Renderer, ViewInfo};
pub use self::material::{Material, MaterialBuilder};
pub use self::program::GpuProgramManager;
pub use self::request::{RenderEvent, RenderRequest};
pub use self::stats::RenderStats;
pub use self::system::{DispatchState, RenderSystem};
pub use self::types::*;
