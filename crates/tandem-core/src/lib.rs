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

//! # Tandem Core
//!
//! Foundational crate containing the deferred command queue, the producer-side
//! render contexts, readiness tokens, and the interface contracts that the
//! render thread and its collaborators implement.

#![warn(missing_docs)]

pub mod asset;
pub mod command;
pub mod context;
pub mod event;
pub mod platform;
pub mod plugin;
pub mod renderer;
pub mod scene;
pub mod sync;
pub mod utils;

pub use command::{BatchReport, Command, CommandBatch, CommandQueue};
pub use context::EngineContext;
pub use renderer::context::{ContextError, ContextId, DeferredRenderContext, SubmissionFence};
pub use sync::{CancellationToken, Completer, ReadinessToken, WaitError, WaitOptions};
pub use utils::timer::Stopwatch;
