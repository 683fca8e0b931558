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

//! The render thread.
//!
//! [`ThreadedRenderSystem`] owns one named thread that is the only writer of
//! device state. Producers talk to it through a request channel: contexts
//! register, submit batches, and release themselves. The thread drains one
//! context's queue per submission and runs the batch through the
//! [`BatchExecutor`](executor::BatchExecutor).

pub mod executor;
mod system;

pub use self::system::ThreadedRenderSystem;

use crate::device::software::SoftwareDevice;
use crate::platform::headless::{EventInjector, HeadlessEventPump};
use tandem_core::platform::EventPump;
use tandem_core::renderer::RenderDevice;

/// Name of the software backend.
pub const SOFTWARE_BACKEND: &str = "software";

/// Backends [`select_backend`] knows about.
pub const AVAILABLE_BACKENDS: &[&str] = &[SOFTWARE_BACKEND];

/// Configuration for the render thread.
#[derive(Debug, Clone)]
pub struct RenderSystemConfig {
    /// Name given to the OS thread.
    pub thread_name: String,
    /// Catch panics raised by individual commands and report them as
    /// command failures instead of losing the render thread.
    pub catch_panics: bool,
    /// How many undelivered diagnostics and platform events each bus keeps.
    /// Newer events are dropped once a bus is full.
    pub event_capacity: usize,
}

impl Default for RenderSystemConfig {
    fn default() -> Self {
        Self {
            thread_name: "tandem-render".to_string(),
            catch_panics: true,
            event_capacity: 1024,
        }
    }
}

/// What the render thread takes ownership of when it starts.
pub struct RenderBackend {
    /// The device commands execute against.
    pub device: Box<dyn RenderDevice>,
    /// The platform event pump run by `PumpPlatformEvents`.
    pub event_pump: Option<Box<dyn EventPump>>,
}

impl RenderBackend {
    /// A backend with a device and no event pump.
    pub fn new(device: impl RenderDevice + 'static) -> Self {
        Self {
            device: Box::new(device),
            event_pump: None,
        }
    }

    /// Adds an event pump.
    pub fn with_event_pump(mut self, pump: impl EventPump + 'static) -> Self {
        self.event_pump = Some(Box::new(pump));
        self
    }
}

/// A backend chosen by name, plus the handle used to feed it platform events
/// when it has no real window.
pub struct BackendSelection {
    /// The backend to start the render system with.
    pub backend: RenderBackend,
    /// Injector for the headless event pump, if the backend uses one.
    pub injector: Option<EventInjector>,
}

/// Builds the backend registered under `name`, or `None` if no backend has
/// that name.
pub fn select_backend(name: &str, surface_size: (u32, u32)) -> Option<BackendSelection> {
    match name {
        SOFTWARE_BACKEND => {
            let (pump, injector) = HeadlessEventPump::new();
            Some(BackendSelection {
                backend: RenderBackend::new(SoftwareDevice::new(surface_size)).with_event_pump(pump),
                injector: Some(injector),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn software_backend_is_selectable() {
        let selection = select_backend("software", (32, 16)).unwrap();
        assert_eq!(selection.backend.device.capabilities().surface_size, (32, 16));
        assert!(selection.backend.event_pump.is_some());
        assert!(selection.injector.is_some());
    }

    #[test]
    fn unknown_backend_is_not_selectable() {
        assert!(select_backend("Direct3D9", (32, 16)).is_none());
    }
}
