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

use crate::utils::timer::Stopwatch;
use std::time::Duration;

/// Frame timing, advanced once per tick by the frame driver.
#[derive(Debug)]
pub struct Time {
    clock: Stopwatch,
    frame: u64,
    delta: Duration,
    elapsed: Duration,
}

impl Time {
    /// Starts the clock at frame zero.
    pub fn new() -> Self {
        Self {
            clock: Stopwatch::new(),
            frame: 0,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    /// Closes the current frame and returns its duration.
    pub fn update(&mut self) -> Duration {
        self.delta = self.clock.elapsed().unwrap_or_default();
        self.clock.restart();
        self.elapsed += self.delta;
        self.frame += 1;
        self.delta
    }

    /// Number of completed frames.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Duration of the last completed frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Duration of the last completed frame, in seconds.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Total time across completed frames.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn update_advances_frame_and_elapsed() {
        let mut time = Time::new();
        thread::sleep(Duration::from_millis(5));
        let first = time.update();
        let second = time.update();

        assert_eq!(time.frame(), 2);
        assert!(first >= Duration::from_millis(5));
        assert_eq!(time.elapsed(), first + second);
        assert_eq!(time.delta(), second);
    }
}
