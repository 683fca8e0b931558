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

use super::Command;
use crate::renderer::context::ContextId;
use std::time::Duration;

/// The commands drained from one context for one submission.
#[derive(Debug)]
pub struct CommandBatch {
    /// The context the commands were recorded on.
    pub context: ContextId,
    /// Per-context submission number, starting at 1.
    pub sequence: u64,
    /// Commands in recording order.
    pub commands: Vec<Command>,
}

impl CommandBatch {
    /// Number of commands in the batch.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if nothing was recorded since the previous drain.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// One isolated failure inside an executed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    /// Position of the command in its batch.
    pub index: usize,
    /// Label of the failed command.
    pub command: &'static str,
    /// What went wrong.
    pub reason: String,
}

/// The outcome of executing one batch on the render thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// The context the batch came from.
    pub context: ContextId,
    /// Per-context submission number.
    pub sequence: u64,
    /// Number of commands that ran to completion without error.
    pub executed: usize,
    /// Failures, in execution order.
    pub failures: Vec<CommandFailure>,
    /// Wall-clock time spent executing the batch.
    pub elapsed: Duration,
}

impl BatchReport {
    /// Total number of commands the batch contained.
    pub fn total(&self) -> usize {
        self.executed + self.failures.len()
    }

    /// Returns `true` if every command succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
