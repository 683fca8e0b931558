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

//! Messages exchanged between producers and the render thread.

use super::context::ContextId;
use crate::asset::ResourceStreamer;
use crate::command::{BatchReport, CommandQueue};
use crate::sync::Completer;
use std::fmt;
use std::sync::Arc;

/// A request sent to the render thread over its request channel.
///
/// The channel is FIFO, so requests from one producer are processed in the
/// order they were sent. A context's `Release` is therefore handled after its
/// last `Submit`.
pub enum RenderRequest {
    /// Adds a context to the render thread's registry.
    Register {
        /// The new context.
        id: ContextId,
        /// Debug label.
        label: String,
        /// The queue the context records into.
        queue: Arc<CommandQueue>,
    },
    /// Drains and executes the context's current batch.
    Submit {
        /// The submitting context.
        context: ContextId,
        /// Per-context submission number.
        sequence: u64,
        /// Settled with the batch report once every command has run.
        fence: Completer<BatchReport>,
    },
    /// Removes a context from the registry.
    Release {
        /// The context being dropped.
        context: ContextId,
    },
    /// Installs the resource-streaming collaborator run by `UpdateResources`.
    AttachStreamer(Box<dyn ResourceStreamer>),
    /// Stops the dispatch loop.
    Shutdown,
}

impl fmt::Debug for RenderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderRequest::Register { id, label, .. } => f
                .debug_struct("Register")
                .field("id", id)
                .field("label", label)
                .finish(),
            RenderRequest::Submit {
                context, sequence, ..
            } => f
                .debug_struct("Submit")
                .field("context", context)
                .field("sequence", sequence)
                .finish(),
            RenderRequest::Release { context } => {
                f.debug_struct("Release").field("context", context).finish()
            }
            RenderRequest::AttachStreamer(_) => f.write_str("AttachStreamer"),
            RenderRequest::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Non-fatal diagnostics published by the render thread.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// A batch finished executing.
    BatchExecuted {
        /// The submitting context.
        context: ContextId,
        /// Per-context submission number.
        sequence: u64,
        /// Commands that succeeded.
        executed: usize,
        /// Commands that failed.
        failed: usize,
    },
    /// One command failed; the rest of its batch still ran.
    CommandFailed {
        /// The submitting context.
        context: ContextId,
        /// Per-context submission number.
        sequence: u64,
        /// Position of the command in its batch.
        index: usize,
        /// Label of the failed command.
        command: &'static str,
        /// What went wrong.
        reason: String,
    },
    /// A submission named a context that is not registered.
    UnknownContext {
        /// The unknown context.
        context: ContextId,
    },
}
