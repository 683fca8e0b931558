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

/// Manages a generic, thread-safe event channel.
///
/// The render thread publishes its diagnostics and the platform events it
/// pumps through buses like this one; the simulation thread owns the
/// receiving end.
#[derive(Debug)]
pub struct EventBus<T: Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a new EventBus with an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    /// Creates an EventBus that holds at most `capacity` undelivered events.
    ///
    /// Publishing to a full bus drops the event instead of blocking.
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = flume::bounded(capacity);
        Self { sender, receiver }
    }

    /// Sends an event without blocking.
    ///
    /// Returns `false` if the event was dropped because the bus is full or
    /// every receiver is gone.
    pub fn publish(&self, event: T) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(flume::TrySendError::Full(_)) => {
                log::trace!("Event bus full; dropping event.");
                false
            }
            Err(flume::TrySendError::Disconnected(_)) => {
                log::error!("Failed to send event. Receiver likely disconnected.");
                false
            }
        }
    }

    /// Returns a clone of the sender end of the channel.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns a clone of the receiver end of the channel.
    ///
    /// Receivers compete for events: each event is delivered to one of them.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        self.receiver.clone()
    }

    /// Returns a reference to the receiver end of the channel.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Takes every event currently in the channel.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }
}

impl<T: Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;
    use std::{thread, time::Duration};

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Resized { width: u32, height: u32 },
        KeyPressed { key: String },
        CloseRequested,
    }

    #[test]
    fn try_receive_empty() {
        let bus = EventBus::<TestEvent>::new();
        match bus.receiver().try_recv() {
            Err(TryRecvError::Empty) => {}
            other => panic!("Received unexpected result: {other:?}"),
        }
    }

    #[test]
    fn publish_preserves_order() {
        let bus = EventBus::<TestEvent>::new();
        let events = vec![
            TestEvent::Resized {
                width: 1,
                height: 1,
            },
            TestEvent::KeyPressed {
                key: "Escape".to_string(),
            },
            TestEvent::CloseRequested,
        ];
        for event in &events {
            bus.publish(event.clone());
        }

        assert_eq!(bus.drain(), events);
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn send_from_another_thread() {
        let bus = EventBus::<TestEvent>::new();
        let sender = bus.sender();
        let producer = thread::spawn(move || {
            for _ in 0..10 {
                sender
                    .send(TestEvent::CloseRequested)
                    .expect("Send should succeed");
            }
        });
        producer.join().expect("Producer thread panicked");

        let receiver = bus.subscribe();
        let mut count = 0;
        while receiver.recv_timeout(Duration::from_millis(50)).is_ok() {
            count += 1;
        }
        assert_eq!(count, 10);
    }

    #[test]
    fn bounded_bus_drops_instead_of_growing() {
        let bus = EventBus::<TestEvent>::bounded(4);
        let accepted = (0..1000)
            .filter(|_| bus.publish(TestEvent::CloseRequested))
            .count();

        assert_eq!(accepted, 4);
        assert_eq!(bus.receiver().len(), 4);
        assert_eq!(bus.drain().len(), 4);
        assert!(bus.publish(TestEvent::CloseRequested));
    }

    #[test]
    fn sender_outliving_bus_reports_disconnect() {
        let bus = EventBus::<TestEvent>::new();
        let sender = bus.sender();
        drop(bus);
        assert!(sender.send(TestEvent::CloseRequested).is_err());
    }
}
