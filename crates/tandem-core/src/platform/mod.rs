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

//! Platform-facing state: events, input sampling and frame time.
//!
//! Window and input event pumping is an external collaborator. The engine
//! only sees it through the [`EventPump`] trait, which runs on the render
//! thread, and through the [`PlatformEvent`]s it forwards.

pub mod event;
pub mod input;
pub mod time;

pub use self::event::{EventPump, PlatformEvent};
pub use self::input::InputState;
pub use self::time::Time;
