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

use super::{WaitError, WaitOptions, CANCEL_POLL_INTERVAL};
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Instant;

/// The state of a readiness token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState<T> {
    /// The producing command has not executed yet.
    Pending,
    /// The producing command executed and produced a value.
    Ready(T),
    /// The producing command failed or was abandoned.
    Failed(WaitError),
}

struct Shared<T> {
    state: Mutex<TokenState<T>>,
    settled: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, TokenState<T>> {
        self.state.lock().unwrap_or_else(|e| {
            log::warn!("Readiness token mutex poisoned; continuing");
            e.into_inner()
        })
    }
}

/// Producer-side handle to a value created on the render thread.
///
/// The token moves from Pending to Ready (or Failed) exactly once. Clones
/// observe the same transition.
pub struct ReadinessToken<T> {
    shared: Arc<Shared<T>>,
}

/// Render-side half of a [`ReadinessToken`].
///
/// Settling consumes the completer. Dropping it unsettled fails the token
/// with [`WaitError::Abandoned`], so a waiter never hangs on a command that
/// was discarded.
pub struct Completer<T> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T> ReadinessToken<T> {
    /// Creates a pending token and the completer that will settle it.
    pub fn pending() -> (Self, Completer<T>) {
        let shared = Arc::new(Shared {
            state: Mutex::new(TokenState::Pending),
            settled: Condvar::new(),
        });
        (
            Self {
                shared: shared.clone(),
            },
            Completer {
                shared: Some(shared),
            },
        )
    }

    /// Creates a token that is already ready.
    pub fn ready(value: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(TokenState::Ready(value)),
                settled: Condvar::new(),
            }),
        }
    }

    /// Returns `true` if the value is available.
    pub fn is_ready(&self) -> bool {
        matches!(*self.shared.lock(), TokenState::Ready(_))
    }

    /// Returns `true` once the token is either ready or failed.
    pub fn is_settled(&self) -> bool {
        !matches!(*self.shared.lock(), TokenState::Pending)
    }
}

impl<T: Clone> ReadinessToken<T> {
    /// Returns a snapshot of the current state without blocking.
    pub fn state(&self) -> TokenState<T> {
        self.shared.lock().clone()
    }

    /// Returns the outcome if the token has settled, `None` while pending.
    pub fn try_get(&self) -> Option<Result<T, WaitError>> {
        match &*self.shared.lock() {
            TokenState::Pending => None,
            TokenState::Ready(value) => Some(Ok(value.clone())),
            TokenState::Failed(err) => Some(Err(err.clone())),
        }
    }

    /// Reads the value of a token that is known to be ready.
    ///
    /// # Panics
    ///
    /// Panics if the token is still pending or has failed. Reading a resource
    /// before it is ready is a programming error; use
    /// [`wait`](Self::wait) or
    /// [`DeferredRenderContext::wait_until_ready`](crate::DeferredRenderContext::wait_until_ready)
    /// to cross the boundary.
    pub fn expect_ready(&self) -> T {
        match &*self.shared.lock() {
            TokenState::Ready(value) => value.clone(),
            TokenState::Pending => {
                panic!("resource read before its readiness token became ready")
            }
            TokenState::Failed(err) => panic!("resource read after its creation failed: {err}"),
        }
    }

    /// Blocks until the token settles, with no timeout.
    pub fn wait(&self) -> Result<T, WaitError> {
        self.wait_with(&WaitOptions::unbounded())
    }

    /// Blocks until the token settles or `options` gives up.
    pub fn wait_with(&self, options: &WaitOptions) -> Result<T, WaitError> {
        let deadline = options.timeout.map(|limit| (Instant::now() + limit, limit));
        let mut guard = self.shared.lock();
        loop {
            match &*guard {
                TokenState::Ready(value) => return Ok(value.clone()),
                TokenState::Failed(err) => return Err(err.clone()),
                TokenState::Pending => {}
            }

            if options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                return Err(WaitError::Cancelled);
            }

            let slice = match deadline {
                Some((at, limit)) => {
                    let now = Instant::now();
                    if now >= at {
                        return Err(WaitError::TimedOut(limit));
                    }
                    let remaining = at - now;
                    Some(if options.cancel.is_some() {
                        remaining.min(CANCEL_POLL_INTERVAL)
                    } else {
                        remaining
                    })
                }
                None if options.cancel.is_some() => Some(CANCEL_POLL_INTERVAL),
                None => None,
            };

            guard = match slice {
                Some(duration) => self
                    .shared
                    .settled
                    .wait_timeout(guard, duration)
                    .map(|(g, _)| g)
                    .unwrap_or_else(|e| e.into_inner().0),
                None => self
                    .shared
                    .settled
                    .wait(guard)
                    .unwrap_or_else(|e| e.into_inner()),
            };
        }
    }
}

impl<T> Clone for ReadinessToken<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> fmt::Debug for ReadinessToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.shared.lock() {
            TokenState::Pending => "Pending",
            TokenState::Ready(_) => "Ready",
            TokenState::Failed(_) => "Failed",
        };
        f.debug_struct("ReadinessToken")
            .field("state", &state)
            .finish()
    }
}

impl<T> Completer<T> {
    /// Settles the token with a value and wakes every waiter.
    pub fn complete(mut self, value: T) {
        self.settle(TokenState::Ready(value));
    }

    /// Settles the token with an error and wakes every waiter.
    pub fn fail(mut self, error: WaitError) {
        self.settle(TokenState::Failed(error));
    }

    /// Returns `true` if no token clone is alive any more.
    pub fn is_orphaned(&self) -> bool {
        self.shared
            .as_ref()
            .map(|shared| Arc::strong_count(shared) == 1)
            .unwrap_or(true)
    }

    fn settle(&mut self, outcome: TokenState<T>) {
        if let Some(shared) = self.shared.take() {
            let mut guard = shared.lock();
            if matches!(*guard, TokenState::Pending) {
                *guard = outcome;
                shared.settled.notify_all();
            }
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        self.settle(TokenState::Failed(WaitError::Abandoned));
    }
}

impl<T> fmt::Debug for Completer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("settled", &self.shared.is_none())
            .finish()
    }
}

/// Type-erased view of a token, used to track heterogeneous pending results.
pub trait Readiness: Send + Sync {
    /// Returns `true` once the underlying token has settled.
    fn is_settled(&self) -> bool;

    /// Blocks until the underlying token settles, discarding its value.
    fn wait_settled(&self, options: &WaitOptions) -> Result<(), WaitError>;
}

impl<T: Clone + Send> Readiness for ReadinessToken<T> {
    fn is_settled(&self) -> bool {
        ReadinessToken::is_settled(self)
    }

    fn wait_settled(&self, options: &WaitOptions) -> Result<(), WaitError> {
        self.wait_with(options).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::CancellationToken;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn complete_wakes_waiter_on_other_thread() {
        let (token, completer) = ReadinessToken::<u32>::pending();
        let waiter = {
            let token = token.clone();
            thread::spawn(move || token.wait())
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!token.is_settled());
        completer.complete(7);

        assert_eq!(waiter.join().unwrap(), Ok(7));
        assert!(token.is_ready());
        assert_eq!(token.expect_ready(), 7);
    }

    #[test]
    fn fail_propagates_to_waiter() {
        let (token, completer) = ReadinessToken::<u32>::pending();
        completer.fail(WaitError::CommandFailed {
            command: "CreateBuffer",
            reason: "out of memory".to_string(),
        });
        assert!(matches!(
            token.wait(),
            Err(WaitError::CommandFailed { command: "CreateBuffer", .. })
        ));
    }

    #[test]
    fn dropped_completer_abandons_token() {
        let (token, completer) = ReadinessToken::<u32>::pending();
        drop(completer);
        assert_eq!(token.try_get(), Some(Err(WaitError::Abandoned)));
    }

    #[test]
    fn token_settles_only_once() {
        let (token, completer) = ReadinessToken::<u32>::pending();
        completer.complete(1);
        assert_eq!(token.state(), TokenState::Ready(1));
    }

    #[test]
    fn timeout_elapses_while_pending() {
        let (token, _completer) = ReadinessToken::<u32>::pending();
        let limit = Duration::from_millis(15);
        let result = token.wait_with(&WaitOptions::unbounded().with_timeout(limit));
        assert_eq!(result, Err(WaitError::TimedOut(limit)));
    }

    #[test]
    fn cancellation_releases_waiter() {
        let (token, _completer) = ReadinessToken::<u32>::pending();
        let cancel = CancellationToken::new();
        let waiter = {
            let token = token.clone();
            let options = WaitOptions::unbounded().with_cancellation(cancel.clone());
            thread::spawn(move || token.wait_with(&options))
        };

        thread::sleep(Duration::from_millis(20));
        cancel.cancel();
        assert_eq!(waiter.join().unwrap(), Err(WaitError::Cancelled));
    }

    #[test]
    fn orphaned_completer_is_detected() {
        let (token, completer) = ReadinessToken::<u32>::pending();
        assert!(!completer.is_orphaned());
        drop(token);
        assert!(completer.is_orphaned());
    }

    #[test]
    #[should_panic(expected = "before its readiness token became ready")]
    fn reading_pending_token_is_a_contract_violation() {
        let (token, _completer) = ReadinessToken::<u32>::pending();
        let _ = token.expect_ready();
    }

    #[test]
    fn erased_readiness_waits_for_settlement() {
        let (token, completer) = ReadinessToken::<String>::pending();
        let erased: Box<dyn Readiness> = Box::new(token);
        assert!(!erased.is_settled());
        completer.complete("done".to_string());
        assert!(erased.is_settled());
        assert_eq!(erased.wait_settled(&WaitOptions::unbounded()), Ok(()));
    }
}
