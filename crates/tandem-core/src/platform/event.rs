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

/// A window or input event forwarded by the platform layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// The user asked to close the application window.
    CloseRequested,
    /// The window surface changed size.
    Resized {
        /// New width in pixels.
        width: u32,
        /// New height in pixels.
        height: u32,
    },
    /// A key went down.
    KeyPressed(String),
    /// A key went up.
    KeyReleased(String),
    /// The cursor moved.
    CursorMoved {
        /// Horizontal position in pixels.
        x: f32,
        /// Vertical position in pixels.
        y: f32,
    },
    /// The window gained or lost focus.
    Focused(bool),
}

/// Collects platform events. Runs on the render thread when a
/// `PumpPlatformEvents` command executes.
pub trait EventPump: Send {
    /// Forwards every pending event to `sink` and returns how many were sent.
    fn pump(&mut self, sink: &flume::Sender<PlatformEvent>) -> anyhow::Result<usize>;
}
