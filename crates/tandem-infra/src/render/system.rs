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

use super::executor::BatchExecutor;
use super::{RenderBackend, RenderSystemConfig};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tandem_core::asset::ResourceStreamer;
use tandem_core::command::{BatchReport, CommandBatch, CommandQueue};
use tandem_core::event::EventBus;
use tandem_core::platform::PlatformEvent;
use tandem_core::renderer::{
    ContextId, DeferredRenderContext, DeviceCapabilities, DispatchState, IdAllocator,
    RenderError, RenderEvent, RenderRequest, RenderStats, RenderSystem,
};
use tandem_core::sync::Completer;

/// A [`RenderSystem`] that executes every command on one dedicated thread.
pub struct ThreadedRenderSystem {
    name: String,
    thread_name: String,
    requests: flume::Sender<RenderRequest>,
    handle: Option<thread::JoinHandle<()>>,
    capabilities: DeviceCapabilities,
    ids: Arc<IdAllocator>,
    next_context: AtomicU64,
    state: Arc<AtomicU8>,
    stats: Arc<Mutex<RenderStats>>,
    platform_events: EventBus<PlatformEvent>,
    diagnostics: EventBus<RenderEvent>,
}

impl ThreadedRenderSystem {
    /// Spawns the render thread, which takes ownership of `backend`.
    pub fn start(
        name: impl Into<String>,
        config: RenderSystemConfig,
        backend: RenderBackend,
    ) -> Result<Self, RenderError> {
        let name = name.into();
        let capabilities = backend.device.capabilities();
        let (requests, inbox) = flume::unbounded();
        let state = Arc::new(AtomicU8::new(DispatchState::Idle as u8));
        let stats = Arc::new(Mutex::new(RenderStats::default()));
        let platform_events = EventBus::bounded(config.event_capacity);
        let diagnostics = EventBus::bounded(config.event_capacity);

        let dispatcher = Dispatcher {
            inbox,
            contexts: HashMap::new(),
            executor: BatchExecutor::new(
                backend.device,
                backend.event_pump,
                platform_events.sender(),
                diagnostics.sender(),
                config.catch_panics,
            ),
            state: state.clone(),
            stats: stats.clone(),
            diagnostics: diagnostics.sender(),
        };

        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || dispatcher.run())
            .map_err(|e| {
                RenderError::InitializationFailed(format!("could not spawn render thread: {e}"))
            })?;

        log::info!(
            "Render system '{name}' started on thread '{}' ({}).",
            config.thread_name,
            capabilities.name
        );
        Ok(Self {
            name,
            thread_name: config.thread_name,
            requests,
            handle: Some(handle),
            capabilities,
            ids: IdAllocator::shared(),
            next_context: AtomicU64::new(1),
            state,
            stats,
            platform_events,
            diagnostics,
        })
    }

    /// Returns `true` while the render thread is alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl RenderSystem for ThreadedRenderSystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_deferred_context(&self, label: &str) -> Result<DeferredRenderContext, RenderError> {
        let id = ContextId(self.next_context.fetch_add(1, Ordering::Relaxed));
        DeferredRenderContext::new(id, label, self.requests.clone(), self.ids.clone())
            .map_err(|e| RenderError::Internal(format!("cannot create context '{label}': {e}")))
    }

    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn ids(&self) -> Arc<IdAllocator> {
        self.ids.clone()
    }

    fn stats(&self) -> RenderStats {
        self.stats.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn dispatch_state(&self) -> DispatchState {
        DispatchState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn attach_streamer(&self, streamer: Box<dyn ResourceStreamer>) -> Result<(), RenderError> {
        self.requests
            .send(RenderRequest::AttachStreamer(streamer))
            .map_err(|_| RenderError::NotInitialized)
    }

    fn platform_events(&self) -> flume::Receiver<PlatformEvent> {
        self.platform_events.subscribe()
    }

    fn diagnostics(&self) -> flume::Receiver<RenderEvent> {
        self.diagnostics.subscribe()
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        log::info!("Stopping render thread '{}'.", self.thread_name);
        // The thread may already have exited after a panic.
        let _ = self.requests.send(RenderRequest::Shutdown);
        if handle.join().is_err() {
            log::error!("Render thread '{}' panicked.", self.thread_name);
            self.state
                .store(DispatchState::Stopped as u8, Ordering::Release);
        }
    }
}

impl fmt::Debug for ThreadedRenderSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadedRenderSystem")
            .field("name", &self.name)
            .field("thread_name", &self.thread_name)
            .field("running", &self.is_running())
            .field("dispatch_state", &self.dispatch_state())
            .finish()
    }
}

impl Drop for ThreadedRenderSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct RegisteredContext {
    label: String,
    queue: Arc<CommandQueue>,
}

/// State owned by the render thread.
struct Dispatcher {
    inbox: flume::Receiver<RenderRequest>,
    contexts: HashMap<ContextId, RegisteredContext>,
    executor: BatchExecutor,
    state: Arc<AtomicU8>,
    stats: Arc<Mutex<RenderStats>>,
    diagnostics: flume::Sender<RenderEvent>,
}

impl Dispatcher {
    fn run(mut self) {
        log::info!("Render thread running.");
        while let Ok(request) = self.inbox.recv() {
            match request {
                RenderRequest::Register { id, label, queue } => {
                    log::debug!("Registered context {id} ('{label}').");
                    self.contexts.insert(id, RegisteredContext { label, queue });
                }
                RenderRequest::Submit {
                    context,
                    sequence,
                    fence,
                } => self.submit(context, sequence, fence),
                RenderRequest::Release { context } => {
                    if let Some(released) = self.contexts.remove(&context) {
                        let discarded = released.queue.drain_for_execution().len();
                        log::debug!(
                            "Released context {context} ('{}'), discarding {discarded} unsubmitted commands.",
                            released.label
                        );
                    }
                }
                RenderRequest::AttachStreamer(streamer) => {
                    self.executor.attach_streamer(streamer);
                }
                RenderRequest::Shutdown => break,
            }
        }
        self.stop();
    }

    fn set_state(&self, state: DispatchState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn submit(&mut self, context: ContextId, sequence: u64, fence: Completer<BatchReport>) {
        let Some(registered) = self.contexts.get(&context) else {
            log::error!("Submission {sequence} names unknown context {context}.");
            let _ = self
                .diagnostics
                .try_send(RenderEvent::UnknownContext { context });
            // Dropping the fence releases the waiter as abandoned.
            drop(fence);
            return;
        };

        self.set_state(DispatchState::Draining);
        let commands = registered.queue.drain_for_execution();

        self.set_state(DispatchState::Executing);
        let report = self.executor.execute(CommandBatch {
            context,
            sequence,
            commands,
        });

        *self.stats.lock().unwrap_or_else(|e| e.into_inner()) = self.executor.stats().clone();
        let _ = self.diagnostics.try_send(RenderEvent::BatchExecuted {
            context,
            sequence,
            executed: report.executed,
            failed: report.failures.len(),
        });
        self.set_state(DispatchState::Idle);
        fence.complete(report);
    }

    /// Releases everything still waiting on the render thread.
    fn stop(&mut self) {
        self.set_state(DispatchState::Stopped);
        let abandoned_requests = self.inbox.drain().count();
        let mut abandoned_commands = 0;
        for (_, registered) in self.contexts.drain() {
            abandoned_commands += registered.queue.drain_for_execution().len();
        }
        log::info!(
            "Render thread stopped ({abandoned_requests} requests and {abandoned_commands} commands abandoned)."
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::software::SoftwareDevice;
    use tandem_core::sync::{ReadinessToken, WaitError};

    fn start() -> ThreadedRenderSystem {
        ThreadedRenderSystem::start(
            "unit",
            RenderSystemConfig::default(),
            RenderBackend::new(SoftwareDevice::new((8, 8))),
        )
        .unwrap()
    }

    #[test]
    fn contexts_get_distinct_ids() {
        let system = start();
        let a = system.create_deferred_context("a").unwrap();
        let b = system.create_deferred_context("b").unwrap();
        assert_eq!(a.id(), ContextId(1));
        assert_eq!(b.id(), ContextId(2));
    }

    #[test]
    fn submissions_for_unknown_contexts_are_abandoned() {
        let system = start();
        let diagnostics = system.diagnostics();

        let (fence, completer) = ReadinessToken::pending();
        system
            .requests
            .send(RenderRequest::Submit {
                context: ContextId(99),
                sequence: 1,
                fence: completer,
            })
            .unwrap();

        assert_eq!(fence.wait(), Err(WaitError::Abandoned));
        assert!(matches!(
            diagnostics.recv().unwrap(),
            RenderEvent::UnknownContext {
                context: ContextId(99)
            }
        ));
    }

    #[test]
    fn undrained_diagnostics_stay_bounded() {
        let system = ThreadedRenderSystem::start(
            "unit",
            RenderSystemConfig {
                event_capacity: 16,
                ..RenderSystemConfig::default()
            },
            RenderBackend::new(SoftwareDevice::new((8, 8))),
        )
        .unwrap();
        let mut ctx = system.create_deferred_context("main").unwrap();

        for n in 0..1000 {
            ctx.debug_marker(n.to_string());
            // A failing command adds a CommandFailed on top of BatchExecuted.
            ctx.end_pass();
            ctx.submit().unwrap();
        }
        ctx.submit_and_wait().unwrap();

        assert_eq!(system.diagnostics().len(), 16);
        assert_eq!(system.stats().batches_executed, 1001);
    }

    #[test]
    fn state_returns_to_idle_and_stops_on_shutdown() {
        let mut system = start();
        let mut ctx = system.create_deferred_context("main").unwrap();
        ctx.debug_marker("one");
        ctx.submit_and_wait().unwrap();
        assert_eq!(system.dispatch_state(), DispatchState::Idle);

        drop(ctx);
        system.shutdown();
        assert_eq!(system.dispatch_state(), DispatchState::Stopped);
        assert!(!system.is_running());
    }
}
