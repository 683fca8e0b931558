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

use super::CancellationToken;
use std::time::Duration;

/// How often a cancellable wait re-checks its [`CancellationToken`].
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Bounds applied to a blocking wait.
///
/// The default is an unbounded, non-cancellable wait.
#[derive(Debug, Clone, Default)]
pub struct WaitOptions {
    /// Give up after this long with [`WaitError::TimedOut`].
    pub timeout: Option<Duration>,
    /// Give up as soon as this token is cancelled.
    pub cancel: Option<CancellationToken>,
}

impl WaitOptions {
    /// An unbounded wait with no cancellation.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Returns a copy of these options with a timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns a copy of these options observing `token`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Returns `true` if neither a timeout nor a cancellation token is set.
    pub fn is_unbounded(&self) -> bool {
        self.timeout.is_none() && self.cancel.is_none()
    }
}

/// Why a wait on a readiness token or a submission fence did not yield a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    /// The command that was meant to produce the value failed on the render thread.
    #[error("command `{command}` failed on the render thread: {reason}")]
    CommandFailed {
        /// Label of the failed command.
        command: &'static str,
        /// The error reported by the device or collaborator.
        reason: String,
    },
    /// The render thread dropped the operation without settling it
    /// (panic during execution, unknown context, or shutdown).
    #[error("the render thread released the operation without completing it")]
    Abandoned,
    /// The wait's timeout elapsed first.
    #[error("wait timed out after {0:?}")]
    TimedOut(Duration),
    /// The wait's cancellation token was raised.
    #[error("wait was cancelled")]
    Cancelled,
}
