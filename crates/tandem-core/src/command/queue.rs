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
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::thread::ThreadId;

/// An ordered, thread-safe buffer of commands.
///
/// Producers append with [`enqueue`](Self::enqueue). The render thread takes
/// the whole current batch with [`drain_for_execution`](Self::drain_for_execution),
/// which swaps the buffer for an empty one under the lock. The swap is the
/// single synchronization point: every enqueue that acquired the lock before
/// it is in the returned batch, every later one is in the next batch.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Mutex<Vec<Command>>,
    total_enqueued: AtomicU64,
    drainer: OnceLock<ThreadId>,
}

impl CommandQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty queue with room for `capacity` commands.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: Mutex::new(Vec::with_capacity(capacity)),
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Command>> {
        self.pending.lock().unwrap_or_else(|e| {
            log::warn!("CommandQueue mutex poisoned; continuing");
            e.into_inner()
        })
    }

    /// Appends a command to the tail of the current batch.
    pub fn enqueue(&self, command: Command) {
        self.lock().push(command);
        self.total_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Appends several commands contiguously, under one lock acquisition.
    pub fn enqueue_all(&self, commands: impl IntoIterator<Item = Command>) {
        let mut pending = self.lock();
        let before = pending.len();
        pending.extend(commands);
        let added = (pending.len() - before) as u64;
        drop(pending);
        self.total_enqueued.fetch_add(added, Ordering::Relaxed);
    }

    /// Swaps out the current batch and returns it in enqueue order.
    ///
    /// Only the render thread drains. The first thread to drain a queue owns
    /// that role for the queue's lifetime; debug builds assert it.
    pub fn drain_for_execution(&self) -> Vec<Command> {
        let current = std::thread::current().id();
        let owner = *self.drainer.get_or_init(|| current);
        debug_assert_eq!(
            owner, current,
            "CommandQueue drained from a thread other than its render thread"
        );

        let mut pending = self.lock();
        let capacity = pending.len();
        std::mem::replace(&mut *pending, Vec::with_capacity(capacity))
    }

    /// Number of commands waiting for the next drain.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no command is waiting.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of commands ever enqueued.
    pub fn total_enqueued(&self) -> u64 {
        self.total_enqueued.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn marker(n: usize) -> Command {
        Command::DebugMarker(n.to_string())
    }

    fn marker_value(command: &Command) -> usize {
        match command {
            Command::DebugMarker(text) => text.parse().unwrap(),
            other => panic!("unexpected command {}", other.label()),
        }
    }

    #[test]
    fn drain_preserves_fifo_order() {
        let queue = CommandQueue::new();
        for n in 0..64 {
            queue.enqueue(marker(n));
        }

        let drained: Vec<usize> = queue.drain_for_execution().iter().map(marker_value).collect();
        assert_eq!(drained, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn drain_empties_the_queue() {
        let queue = CommandQueue::new();
        queue.enqueue(Command::Present);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.drain_for_execution().len(), 1);
        assert!(queue.is_empty());
        assert!(queue.drain_for_execution().is_empty());
        assert_eq!(queue.total_enqueued(), 1);
    }

    #[test]
    fn enqueue_all_keeps_commands_contiguous() {
        let queue = CommandQueue::with_capacity(4);
        queue.enqueue(marker(0));
        queue.enqueue_all((1..4).map(marker));

        let drained: Vec<usize> = queue.drain_for_execution().iter().map(marker_value).collect();
        assert_eq!(drained, vec![0, 1, 2, 3]);
        assert_eq!(queue.total_enqueued(), 4);
    }

    #[test]
    fn racing_enqueues_land_in_exactly_one_batch() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 2_000;

        let queue = Arc::new(CommandQueue::new());
        let handles: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for n in 0..PER_PRODUCER {
                        queue.enqueue(marker(p * PER_PRODUCER + n));
                    }
                })
            })
            .collect();

        let mut batches = Vec::new();
        while handles.iter().any(|h| !h.is_finished()) {
            batches.push(queue.drain_for_execution());
        }
        for handle in handles {
            handle.join().unwrap();
        }
        batches.push(queue.drain_for_execution());

        let mut seen = HashSet::new();
        let mut last_per_producer = vec![None; PRODUCERS];
        for command in batches.iter().flatten() {
            let value = marker_value(command);
            assert!(seen.insert(value), "command {value} drained twice");

            let producer = value / PER_PRODUCER;
            if let Some(last) = last_per_producer[producer] {
                assert!(value > last, "producer {producer} reordered");
            }
            last_per_producer[producer] = Some(value);
        }
        assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
    }
}
