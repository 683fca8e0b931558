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

use super::event::PlatformEvent;
use std::collections::HashSet;

/// Input state sampled once per tick from the pumped platform events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pressed: HashSet<String>,
    cursor: (f32, f32),
    surface_size: Option<(u32, u32)>,
    focused: bool,
    close_requested: bool,
    events_last_sample: usize,
}

impl InputState {
    /// Creates an empty input state.
    pub fn new() -> Self {
        Self {
            focused: true,
            ..Self::default()
        }
    }

    /// Applies every event waiting in `events` and returns how many there were.
    pub fn sample(&mut self, events: &flume::Receiver<PlatformEvent>) -> usize {
        let mut count = 0;
        for event in events.try_iter() {
            self.apply(&event);
            count += 1;
        }
        self.events_last_sample = count;
        count
    }

    /// Applies a single event.
    pub fn apply(&mut self, event: &PlatformEvent) {
        match event {
            PlatformEvent::CloseRequested => self.close_requested = true,
            PlatformEvent::Resized { width, height } => self.surface_size = Some((*width, *height)),
            PlatformEvent::KeyPressed(key) => {
                self.pressed.insert(key.clone());
            }
            PlatformEvent::KeyReleased(key) => {
                self.pressed.remove(key);
            }
            PlatformEvent::CursorMoved { x, y } => self.cursor = (*x, *y),
            PlatformEvent::Focused(focused) => {
                self.focused = *focused;
                if !focused {
                    self.pressed.clear();
                }
            }
        }
    }

    /// Returns `true` while `key` is held.
    pub fn is_pressed(&self, key: &str) -> bool {
        self.pressed.contains(key)
    }

    /// Last known cursor position.
    pub fn cursor(&self) -> (f32, f32) {
        self.cursor
    }

    /// Last reported surface size, if any resize was seen.
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface_size
    }

    /// Returns `true` while the window has focus.
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Returns `true` once a close request was sampled.
    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Number of events applied by the most recent [`sample`](Self::sample).
    pub fn events_last_sample(&self) -> usize {
        self.events_last_sample
    }
}
