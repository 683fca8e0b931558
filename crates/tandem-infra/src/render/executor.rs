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

//! Runs drained batches against the device.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tandem_core::asset::ResourceStreamer;
use tandem_core::command::{BatchReport, Command, CommandBatch, CommandFailure};
use tandem_core::platform::{EventPump, PlatformEvent};
use tandem_core::renderer::{RenderDevice, RenderError, RenderEvent, RenderStats};
use tandem_core::sync::{Completer, WaitError};

/// Executes batches in FIFO order with per-command failure isolation.
///
/// A command that returns an error or panics is logged, reported as a
/// [`RenderEvent::CommandFailed`] and recorded in the [`BatchReport`]; the
/// rest of the batch still runs. A failed creation command fails its token
/// with [`WaitError::CommandFailed`], whether the device returned an error
/// or panicked.
pub struct BatchExecutor {
    device: Box<dyn RenderDevice>,
    event_pump: Option<Box<dyn EventPump>>,
    streamer: Option<Box<dyn ResourceStreamer>>,
    platform_events: flume::Sender<PlatformEvent>,
    diagnostics: flume::Sender<RenderEvent>,
    stats: RenderStats,
    catch_panics: bool,
}

impl BatchExecutor {
    /// Creates an executor that owns `device`.
    pub fn new(
        device: Box<dyn RenderDevice>,
        event_pump: Option<Box<dyn EventPump>>,
        platform_events: flume::Sender<PlatformEvent>,
        diagnostics: flume::Sender<RenderEvent>,
        catch_panics: bool,
    ) -> Self {
        Self {
            device,
            event_pump,
            streamer: None,
            platform_events,
            diagnostics,
            stats: RenderStats::default(),
            catch_panics,
        }
    }

    /// Installs the resource-streaming collaborator, replacing any previous one.
    pub fn attach_streamer(&mut self, streamer: Box<dyn ResourceStreamer>) {
        if self.streamer.replace(streamer).is_some() {
            log::warn!("Replacing the attached resource streamer.");
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Runs every command of `batch` in order and returns the report.
    pub fn execute(&mut self, batch: CommandBatch) -> BatchReport {
        let CommandBatch {
            context,
            sequence,
            commands,
        } = batch;
        let started = Instant::now();
        let mut executed = 0;
        let mut failures = Vec::new();

        for (index, command) in commands.into_iter().enumerate() {
            let label = command.label();
            match self.run_isolated(command) {
                Ok(()) => executed += 1,
                Err(reason) => {
                    log::warn!(
                        "Command {label} (#{index} of batch {sequence} from {context}) failed: {reason}"
                    );
                    let _ = self.diagnostics.try_send(RenderEvent::CommandFailed {
                        context,
                        sequence,
                        index,
                        command: label,
                        reason: reason.clone(),
                    });
                    failures.push(CommandFailure {
                        index,
                        command: label,
                        reason,
                    });
                }
            }
        }

        let report = BatchReport {
            context,
            sequence,
            executed,
            failures,
            elapsed: started.elapsed(),
        };
        self.stats.record_batch(&report);
        log::trace!(
            "Batch {sequence} from {context}: {} ok, {} failed in {:?}",
            report.executed,
            report.failures.len(),
            report.elapsed
        );
        report
    }

    fn run_isolated(&mut self, command: Command) -> Result<(), String> {
        if !self.catch_panics {
            return self.run(command);
        }
        match panic::catch_unwind(AssertUnwindSafe(|| self.run(command))) {
            Ok(result) => result,
            Err(payload) => Err(panicked(payload.as_ref())),
        }
    }

    /// Runs a creation call with its completer kept outside the unwind
    /// boundary, so a panic still fails the token.
    fn guarded<T>(
        &mut self,
        call: impl FnOnce(&mut dyn RenderDevice) -> Result<T, RenderError>,
    ) -> Result<T, String> {
        let catch_panics = self.catch_panics;
        let device = self.device.as_mut();
        if !catch_panics {
            return call(device).map_err(|e| e.to_string());
        }
        match panic::catch_unwind(AssertUnwindSafe(|| call(device))) {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(payload) => Err(panicked(payload.as_ref())),
        }
    }

    fn run(&mut self, command: Command) -> Result<(), String> {
        match command {
            Command::CreateGpuProgram {
                id,
                descriptor,
                ready,
            } => settle(
                ready,
                "CreateGpuProgram",
                self.guarded(|device| device.create_program(id, &descriptor)),
            ),
            Command::DestroyGpuProgram(id) => describe(self.device.destroy_program(id)),
            Command::CreateBuffer {
                id,
                descriptor,
                contents,
                ready,
            } => settle(
                ready,
                "CreateBuffer",
                self.guarded(|device| {
                    device
                        .create_buffer(id, &descriptor, contents.as_deref())
                        .map(|()| id)
                }),
            ),
            Command::WriteBuffer { id, offset, data } => {
                describe(self.device.write_buffer(id, offset, &data))
            }
            Command::DestroyBuffer(id) => describe(self.device.destroy_buffer(id)),
            Command::CreateTexture {
                id,
                descriptor,
                texels,
                ready,
            } => settle(
                ready,
                "CreateTexture",
                self.guarded(|device| {
                    device
                        .create_texture(id, &descriptor, texels.as_deref())
                        .map(|()| id)
                }),
            ),
            Command::DestroyTexture(id) => describe(self.device.destroy_texture(id)),
            Command::BeginPass(descriptor) => describe(self.device.begin_pass(&descriptor)),
            Command::EndPass => describe(self.device.end_pass()),
            Command::SetPipelineState(state) => describe(self.device.set_pipeline_state(&state)),
            Command::BindProgram(id) => describe(self.device.bind_program(id)),
            Command::SetParameter { name, value } => {
                describe(self.device.set_parameter(&name, &value))
            }
            Command::BindTexture { slot, texture } => {
                describe(self.device.bind_texture(slot, texture))
            }
            Command::Draw(call) => {
                describe(self.device.draw(&call))?;
                self.stats.record_draw(&call);
                Ok(())
            }
            Command::Present => {
                describe(self.device.present())?;
                self.stats.record_present();
                Ok(())
            }
            Command::DebugMarker(label) => {
                self.device.insert_debug_marker(&label);
                Ok(())
            }
            Command::PumpPlatformEvents => match self.event_pump.as_mut() {
                Some(pump) => pump
                    .pump(&self.platform_events)
                    .map(|count| log::trace!("Pumped {count} platform events"))
                    .map_err(|e| format!("{e:#}")),
                None => Ok(()),
            },
            Command::UpdateResources => match self.streamer.as_mut() {
                Some(streamer) => streamer
                    .update(self.device.as_mut())
                    .map(|count| {
                        if count > 0 {
                            log::debug!("Resource streaming settled {count} loads");
                        }
                    })
                    .map_err(|e| format!("{e:#}")),
                None => Ok(()),
            },
            Command::Signal(ready) => {
                ready.complete(());
                Ok(())
            }
        }
    }
}

fn describe(result: Result<(), RenderError>) -> Result<(), String> {
    result.map_err(|e| e.to_string())
}

/// Settles a creation token with the device's result.
fn settle<T>(
    ready: Completer<T>,
    command: &'static str,
    result: Result<T, String>,
) -> Result<(), String> {
    match result {
        Ok(value) => {
            ready.complete(value);
            Ok(())
        }
        Err(reason) => {
            ready.fail(WaitError::CommandFailed {
                command,
                reason: reason.clone(),
            });
            Err(reason)
        }
    }
}

fn panicked(payload: &(dyn Any + Send)) -> String {
    format!("panicked: {}", panic_message(payload))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::software::SoftwareDevice;
    use tandem_core::renderer::{
        BufferDescriptor, BufferId, BufferUsage, ContextId, DrawCall, PassDescriptor,
    };
    use tandem_core::sync::ReadinessToken;

    fn executor() -> (BatchExecutor, flume::Receiver<RenderEvent>) {
        let (platform_tx, _platform_rx) = flume::unbounded();
        let (diag_tx, diag_rx) = flume::unbounded();
        (
            BatchExecutor::new(
                Box::new(SoftwareDevice::new((8, 8))),
                None,
                platform_tx,
                diag_tx,
                true,
            ),
            diag_rx,
        )
    }

    fn batch(commands: Vec<Command>) -> CommandBatch {
        CommandBatch {
            context: ContextId(1),
            sequence: 1,
            commands,
        }
    }

    #[test]
    fn failing_command_does_not_abort_the_batch() {
        let (mut executor, diagnostics) = executor();

        let report = executor.execute(batch(vec![
            Command::EndPass,
            Command::DebugMarker("b".to_string()),
            Command::DebugMarker("c".to_string()),
        ]));

        assert_eq!(report.executed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 0);
        assert_eq!(report.failures[0].command, "EndPass");
        assert!(matches!(
            diagnostics.try_recv(),
            Ok(RenderEvent::CommandFailed { index: 0, .. })
        ));
        assert_eq!(executor.stats().commands_failed, 1);
    }

    #[test]
    fn failed_creation_fails_its_token() {
        let (mut executor, _diagnostics) = executor();
        let (token, ready) = ReadinessToken::pending();

        executor.execute(batch(vec![Command::CreateBuffer {
            id: BufferId(1),
            descriptor: BufferDescriptor {
                label: None,
                size: 0,
                usage: BufferUsage::VERTEX,
            },
            contents: None,
            ready,
        }]));

        assert!(matches!(
            token.try_get(),
            Some(Err(WaitError::CommandFailed {
                command: "CreateBuffer",
                ..
            }))
        ));
    }

    #[test]
    fn only_successful_draws_and_presents_are_counted() {
        let (mut executor, _diagnostics) = executor();
        let (buffer, ready) = ReadinessToken::pending();

        let report = executor.execute(batch(vec![
            Command::CreateBuffer {
                id: BufferId(1),
                descriptor: BufferDescriptor {
                    label: None,
                    size: 36,
                    usage: BufferUsage::VERTEX,
                },
                contents: None,
                ready,
            },
            Command::BeginPass(PassDescriptor::loading("main")),
            // No programs bound: the draw fails but the present still runs.
            Command::Draw(DrawCall {
                vertex_buffer: BufferId(1),
                vertex_stride: 12,
                first_vertex: 0,
                vertex_count: 3,
                instance_count: 1,
            }),
            Command::EndPass,
            Command::Present,
        ]));

        assert_eq!(buffer.try_get(), Some(Ok(BufferId(1))));
        assert_eq!(report.executed, 4);
        assert_eq!(executor.stats().draw_calls, 0);
        assert_eq!(executor.stats().frame_number, 1);
    }

    #[test]
    fn signal_completes_in_order() {
        let (mut executor, _diagnostics) = executor();
        let (token, ready) = ReadinessToken::pending();
        let report = executor.execute(batch(vec![Command::Present, Command::Signal(ready)]));
        assert_eq!(token.try_get(), Some(Ok(())));
        assert!(report.is_clean());
    }

    #[test]
    fn panic_message_reads_both_payload_kinds() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
