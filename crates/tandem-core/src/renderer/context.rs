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

//! The producer-side recording façade.

use super::request::RenderRequest;
use super::types::{
    BufferDescriptor, BufferId, DrawCall, GpuProgram, GpuProgramDescriptor, IdAllocator,
    ParamValue, PassDescriptor, PipelineState, ProgramId, TextureDescriptor, TextureId,
};
use crate::command::{BatchReport, Command, CommandQueue};
use crate::sync::{Readiness, ReadinessToken, WaitError, WaitOptions};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Identifies a deferred context within its render system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Settled with the [`BatchReport`] once a submitted batch has fully executed.
pub type SubmissionFence = ReadinessToken<BatchReport>;

/// A resource id that can be recorded immediately, and the token that
/// becomes ready once the render thread has created the resource.
#[derive(Debug, Clone)]
pub struct ResourceHandle<I, T = I> {
    /// Id usable in commands recorded after the creation.
    pub id: I,
    /// Readiness of the creation command.
    pub ready: ReadinessToken<T>,
}

/// Handle returned by [`DeferredRenderContext::create_gpu_program`].
pub type GpuProgramHandle = ResourceHandle<ProgramId, GpuProgram>;
/// Handle returned by [`DeferredRenderContext::create_buffer`].
pub type BufferHandle = ResourceHandle<BufferId>;
/// Handle returned by [`DeferredRenderContext::create_texture`].
pub type TextureHandle = ResourceHandle<TextureId>;

/// Errors surfaced to the producer by a deferred context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The render thread has stopped and no longer accepts requests.
    #[error("the render thread is no longer accepting requests")]
    RenderThreadGone,
    /// A blocking wait did not produce a value.
    #[error(transparent)]
    Wait(#[from] WaitError),
}

/// Records rendering intents on a producer thread.
///
/// Every recording call appends exactly one [`Command`] to the context's
/// queue. Recording never touches the device and never blocks. The context is
/// `Send` but not `Sync`: it may move to another producer thread, but two
/// threads can never record into it at the same time.
///
/// Dropping the context releases it from the render thread's registry.
/// Commands recorded but never submitted are discarded, and the tokens they
/// would have settled fail with [`WaitError::Abandoned`].
pub struct DeferredRenderContext {
    id: ContextId,
    label: String,
    queue: Arc<CommandQueue>,
    requests: flume::Sender<RenderRequest>,
    ids: Arc<IdAllocator>,
    pending: Vec<Box<dyn Readiness>>,
    next_sequence: u64,
    _not_sync: PhantomData<Cell<()>>,
}

impl DeferredRenderContext {
    /// Registers a new context with the render thread behind `requests`.
    ///
    /// Render systems call this from their `create_deferred_context`; `id`
    /// must be unique within the render system.
    pub fn new(
        id: ContextId,
        label: impl Into<String>,
        requests: flume::Sender<RenderRequest>,
        ids: Arc<IdAllocator>,
    ) -> Result<Self, ContextError> {
        let label = label.into();
        let queue = Arc::new(CommandQueue::new());
        requests
            .send(RenderRequest::Register {
                id,
                label: label.clone(),
                queue: queue.clone(),
            })
            .map_err(|_| ContextError::RenderThreadGone)?;

        log::debug!("Deferred context {id} ('{label}') registered.");
        Ok(Self {
            id,
            label,
            queue,
            requests,
            ids,
            pending: Vec::new(),
            next_sequence: 0,
            _not_sync: PhantomData,
        })
    }

    /// The context's id.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The context's debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of commands recorded since the last submission.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Number of tracked creations that have not settled yet.
    pub fn pending_count(&self) -> usize {
        self.pending.iter().filter(|p| !p.is_settled()).count()
    }

    /// The id allocator shared with the render system.
    pub fn ids(&self) -> &Arc<IdAllocator> {
        &self.ids
    }

    /// Appends a raw command.
    pub fn record(&mut self, command: Command) {
        if !self.pending.is_empty() {
            self.pending.retain(|p| !p.is_settled());
        }
        log::trace!("{} records {}", self.id, command.label());
        self.queue.enqueue(command);
    }

    fn track<T: Clone + Send + 'static>(&mut self, token: &ReadinessToken<T>) {
        self.pending.push(Box::new(token.clone()));
    }

    // --- Resource creation ---

    /// Requests compilation of a GPU program.
    pub fn create_gpu_program(&mut self, descriptor: GpuProgramDescriptor) -> GpuProgramHandle {
        let id = self.ids.program();
        let (ready, completer) = ReadinessToken::pending();
        self.record(Command::CreateGpuProgram {
            id,
            descriptor,
            ready: completer,
        });
        self.track(&ready);
        ResourceHandle { id, ready }
    }

    /// Requests creation of a buffer, optionally with initial contents.
    pub fn create_buffer(
        &mut self,
        descriptor: BufferDescriptor,
        contents: Option<Vec<u8>>,
    ) -> BufferHandle {
        let id = self.ids.buffer();
        let (ready, completer) = ReadinessToken::pending();
        self.record(Command::CreateBuffer {
            id,
            descriptor,
            contents,
            ready: completer,
        });
        self.track(&ready);
        ResourceHandle { id, ready }
    }

    /// Requests creation of a texture, optionally with initial texels.
    pub fn create_texture(
        &mut self,
        descriptor: TextureDescriptor,
        texels: Option<Vec<u8>>,
    ) -> TextureHandle {
        let id = self.ids.texture();
        let (ready, completer) = ReadinessToken::pending();
        self.record(Command::CreateTexture {
            id,
            descriptor,
            texels,
            ready: completer,
        });
        self.track(&ready);
        ResourceHandle { id, ready }
    }

    /// Records a token that becomes ready once every command recorded before
    /// it has executed.
    pub fn signal(&mut self) -> ReadinessToken<()> {
        let (ready, completer) = ReadinessToken::pending();
        self.record(Command::Signal(completer));
        ready
    }

    // --- Recording ---

    /// Overwrites part of a buffer.
    pub fn write_buffer(&mut self, id: BufferId, offset: u64, data: Vec<u8>) {
        self.record(Command::WriteBuffer { id, offset, data });
    }

    /// Overwrites part of a buffer with plain-old-data values.
    pub fn write_buffer_pod<T: bytemuck::Pod>(&mut self, id: BufferId, offset: u64, data: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.write_buffer(id, offset, bytes.to_vec());
    }

    /// Releases a GPU program.
    pub fn destroy_gpu_program(&mut self, id: ProgramId) {
        self.record(Command::DestroyGpuProgram(id));
    }

    /// Releases a buffer.
    pub fn destroy_buffer(&mut self, id: BufferId) {
        self.record(Command::DestroyBuffer(id));
    }

    /// Releases a texture.
    pub fn destroy_texture(&mut self, id: TextureId) {
        self.record(Command::DestroyTexture(id));
    }

    /// Begins a render pass.
    pub fn begin_pass(&mut self, descriptor: PassDescriptor) {
        self.record(Command::BeginPass(descriptor));
    }

    /// Ends the current render pass.
    pub fn end_pass(&mut self) {
        self.record(Command::EndPass);
    }

    /// Sets fixed-function pipeline state.
    pub fn set_pipeline_state(&mut self, state: PipelineState) {
        self.record(Command::SetPipelineState(state));
    }

    /// Binds a program.
    pub fn bind_program(&mut self, id: ProgramId) {
        self.record(Command::BindProgram(id));
    }

    /// Assigns a parameter of the bound programs.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: ParamValue) {
        self.record(Command::SetParameter {
            name: name.into(),
            value,
        });
    }

    /// Binds a texture to a sampler slot.
    pub fn bind_texture(&mut self, slot: u32, texture: TextureId) {
        self.record(Command::BindTexture { slot, texture });
    }

    /// Issues a draw call.
    pub fn draw(&mut self, call: DrawCall) {
        self.record(Command::Draw(call));
    }

    /// Presents the frame.
    pub fn present(&mut self) {
        self.record(Command::Present);
    }

    /// Inserts a debug marker.
    pub fn debug_marker(&mut self, label: impl Into<String>) {
        self.record(Command::DebugMarker(label.into()));
    }

    /// Pumps platform events on the render thread.
    pub fn pump_platform_events(&mut self) {
        self.record(Command::PumpPlatformEvents);
    }

    /// Advances resource streaming on the render thread.
    pub fn update_resources(&mut self) {
        self.record(Command::UpdateResources);
    }

    // --- Submission ---

    /// Hands the current batch to the render thread without blocking.
    ///
    /// Recording can continue immediately; new commands go to the next batch.
    pub fn submit(&mut self) -> Result<SubmissionFence, ContextError> {
        self.next_sequence += 1;
        let (fence, completer) = ReadinessToken::pending();
        self.requests
            .send(RenderRequest::Submit {
                context: self.id,
                sequence: self.next_sequence,
                fence: completer,
            })
            .map_err(|_| ContextError::RenderThreadGone)?;
        Ok(fence)
    }

    /// Hands the current batch to the render thread and blocks until every
    /// command in it has executed.
    pub fn submit_and_wait(&mut self) -> Result<BatchReport, ContextError> {
        self.submit_and_wait_with(&WaitOptions::unbounded())
    }

    /// Like [`submit_and_wait`](Self::submit_and_wait), bounded by `options`.
    pub fn submit_and_wait_with(
        &mut self,
        options: &WaitOptions,
    ) -> Result<BatchReport, ContextError> {
        let fence = self.submit()?;
        Ok(fence.wait_with(options)?)
    }

    /// Submits the current batch, blocking until it has executed if `blocking`.
    ///
    /// Returns the batch report for a blocking submission and `None` otherwise.
    pub fn submit_to_gpu(&mut self, blocking: bool) -> Result<Option<BatchReport>, ContextError> {
        if blocking {
            self.submit_and_wait().map(Some)
        } else {
            self.submit().map(|_| None)
        }
    }

    // --- Waiting ---

    /// Blocks until the command behind `token` has executed.
    ///
    /// Commands still sitting in this context's queue are submitted first, so
    /// a token created on this context can always be satisfied.
    pub fn wait_until_ready<T: Clone>(
        &mut self,
        token: &ReadinessToken<T>,
    ) -> Result<T, ContextError> {
        self.wait_until_ready_with(token, &WaitOptions::unbounded())
    }

    /// Like [`wait_until_ready`](Self::wait_until_ready), bounded by `options`.
    pub fn wait_until_ready_with<T: Clone>(
        &mut self,
        token: &ReadinessToken<T>,
        options: &WaitOptions,
    ) -> Result<T, ContextError> {
        if !token.is_settled() && !self.queue.is_empty() {
            self.submit()?;
        }
        Ok(token.wait_with(options)?)
    }

    /// Blocks until every creation requested on this context has settled.
    ///
    /// Returns the first error encountered. Failed creations count as settled.
    pub fn wait_for_pending(&mut self, options: &WaitOptions) -> Result<(), ContextError> {
        if self.pending.iter().any(|p| !p.is_settled()) && !self.queue.is_empty() {
            self.submit()?;
        }
        for pending in &self.pending {
            match pending.wait_settled(options) {
                Ok(()) | Err(WaitError::CommandFailed { .. }) => {}
                Err(err) => return Err(err.into()),
            }
        }
        self.pending.clear();
        Ok(())
    }
}

impl fmt::Debug for DeferredRenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredRenderContext")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("queued", &self.queue.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl Drop for DeferredRenderContext {
    fn drop(&mut self) {
        let unsubmitted = self.queue.len();
        if unsubmitted > 0 {
            log::debug!(
                "Deferred context {} dropped with {unsubmitted} unsubmitted commands.",
                self.id
            );
        }
        // The render thread may already be gone during shutdown.
        let _ = self.requests.send(RenderRequest::Release { context: self.id });
    }
}
