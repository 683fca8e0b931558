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

//! An event pump with no window behind it.

use tandem_core::platform::{EventPump, PlatformEvent};

/// Pumps events that were injected through an [`EventInjector`].
///
/// This is the platform layer used when the engine runs without a window,
/// for tests and for the sandbox.
#[derive(Debug)]
pub struct HeadlessEventPump {
    source: flume::Receiver<PlatformEvent>,
    pumped: u64,
}

/// Feeds events into a [`HeadlessEventPump`] from any thread.
#[derive(Debug, Clone)]
pub struct EventInjector {
    sender: flume::Sender<PlatformEvent>,
}

impl HeadlessEventPump {
    /// Creates a pump and the injector that feeds it.
    pub fn new() -> (Self, EventInjector) {
        let (sender, source) = flume::unbounded();
        (Self { source, pumped: 0 }, EventInjector { sender })
    }

    /// Total number of events forwarded so far.
    pub fn pumped(&self) -> u64 {
        self.pumped
    }
}

impl EventPump for HeadlessEventPump {
    fn pump(&mut self, sink: &flume::Sender<PlatformEvent>) -> anyhow::Result<usize> {
        let mut count = 0;
        let mut dropped = 0;
        for event in self.source.try_iter() {
            match sink.try_send(event) {
                Ok(()) => count += 1,
                Err(flume::TrySendError::Full(_)) => dropped += 1,
                Err(flume::TrySendError::Disconnected(_)) => {
                    anyhow::bail!("platform event receiver disconnected")
                }
            }
        }
        if dropped > 0 {
            log::warn!("Platform event queue full; dropped {dropped} events.");
        }
        self.pumped += count as u64;
        Ok(count)
    }
}

impl EventInjector {
    /// Queues an event for the next pump. Returns `false` if the pump is gone.
    pub fn inject(&self, event: PlatformEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    /// Queues a close request.
    pub fn request_close(&self) -> bool {
        self.inject(PlatformEvent::CloseRequested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pump_forwards_injected_events_in_order() {
        let (mut pump, injector) = HeadlessEventPump::new();
        let (sink, events) = flume::unbounded();

        injector.inject(PlatformEvent::KeyPressed("A".into()));
        injector.request_close();

        assert_eq!(pump.pump(&sink).unwrap(), 2);
        assert_eq!(
            events.try_iter().collect::<Vec<_>>(),
            vec![
                PlatformEvent::KeyPressed("A".into()),
                PlatformEvent::CloseRequested
            ]
        );
        assert_eq!(pump.pump(&sink).unwrap(), 0);
        assert_eq!(pump.pumped(), 2);
    }

    #[test]
    fn pump_fails_when_sink_is_gone() {
        let (mut pump, injector) = HeadlessEventPump::new();
        let (sink, events) = flume::unbounded();
        drop(events);

        injector.request_close();
        assert!(pump.pump(&sink).is_err());
    }

    #[test]
    fn full_sink_drops_the_overflow() {
        let (mut pump, injector) = HeadlessEventPump::new();
        let (sink, events) = flume::bounded(2);

        for n in 0..5 {
            injector.inject(PlatformEvent::KeyPressed(n.to_string()));
        }

        assert_eq!(pump.pump(&sink).unwrap(), 2);
        assert_eq!(events.len(), 2);
        // The overflow is gone, not deferred to the next pump.
        events.drain();
        assert_eq!(pump.pump(&sink).unwrap(), 0);
        assert_eq!(pump.pumped(), 2);
    }

    #[test]
    fn injector_reports_dropped_pump() {
        let (pump, injector) = HeadlessEventPump::new();
        drop(pump);
        assert!(!injector.request_close());
    }
}
