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

use super::context::DeferredRenderContext;
use super::error::RenderError;
use super::request::RenderEvent;
use super::stats::RenderStats;
use super::types::{DeviceCapabilities, IdAllocator};
use crate::asset::ResourceStreamer;
use crate::platform::PlatformEvent;
use std::sync::Arc;

/// Where the render thread's dispatch loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DispatchState {
    /// Waiting for the next request.
    Idle = 0,
    /// Swapping out a context's batch.
    Draining = 1,
    /// Running the commands of a batch.
    Executing = 2,
    /// The loop has exited.
    Stopped = 3,
}

impl DispatchState {
    /// Decodes a state stored in an atomic.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => DispatchState::Idle,
            1 => DispatchState::Draining,
            2 => DispatchState::Executing,
            _ => DispatchState::Stopped,
        }
    }
}

/// Owner of the render thread and the only writer of device state.
///
/// A render system outlives every [`DeferredRenderContext`] it creates.
/// Submissions are processed in arrival order and one context's batch is
/// never interleaved with another's.
pub trait RenderSystem: Send + Sync {
    /// Name of the backend, e.g. `"software"`.
    fn name(&self) -> &str;

    /// Creates and registers a new deferred context.
    fn create_deferred_context(&self, label: &str) -> Result<DeferredRenderContext, RenderError>;

    /// The capabilities the device reported at startup.
    fn capabilities(&self) -> &DeviceCapabilities;

    /// The id allocator shared by every context of this system.
    fn ids(&self) -> Arc<IdAllocator>;

    /// A snapshot of the render thread's counters.
    fn stats(&self) -> RenderStats;

    /// The dispatch loop's current state.
    fn dispatch_state(&self) -> DispatchState;

    /// Installs the collaborator that `UpdateResources` commands advance.
    fn attach_streamer(&self, streamer: Box<dyn ResourceStreamer>) -> Result<(), RenderError>;

    /// Receives the platform events pumped on the render thread.
    ///
    /// Backlogs are bounded: events pumped while the queue is full are dropped.
    fn platform_events(&self) -> flume::Receiver<PlatformEvent>;

    /// Receives non-fatal diagnostics from the render thread.
    ///
    /// Diagnostics nobody drains stop accumulating once the queue is full.
    fn diagnostics(&self) -> flume::Receiver<RenderEvent>;

    /// Stops the render thread and waits for it to exit.
    ///
    /// Pending fences and readiness tokens are released as abandoned.
    fn shutdown(&mut self);
}
