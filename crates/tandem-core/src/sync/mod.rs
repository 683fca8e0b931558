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

//! Cross-thread readiness primitives.
//!
//! A [`ReadinessToken`] is the producer-side view of a result that only the
//! render thread can produce. The render thread holds the matching
//! [`Completer`] and settles it exactly once. Waiting on a token is the only
//! sanctioned way for a producer to cross from "requested" to "usable".
//!
//! Waits are unbounded by default. [`WaitOptions`] adds an optional timeout
//! and a [`CancellationToken`] so that call sites which could deadlock stay
//! testable.

mod cancel;
mod token;
mod wait;

pub use self::cancel::CancellationToken;
pub use self::token::{Completer, Readiness, ReadinessToken, TokenState};
pub use self::wait::{WaitError, WaitOptions, CANCEL_POLL_INTERVAL};
