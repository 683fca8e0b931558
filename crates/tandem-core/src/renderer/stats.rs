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

use crate::command::BatchReport;
use super::types::DrawCall;

/// Counters maintained by the render thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStats {
    /// Number of presents executed.
    pub frame_number: u64,
    /// Number of batches executed.
    pub batches_executed: u64,
    /// Number of commands that completed without error.
    pub commands_executed: u64,
    /// Number of commands that failed or panicked.
    pub commands_failed: u64,
    /// Number of successful draw calls.
    pub draw_calls: u64,
    /// Triangles submitted by successful draw calls.
    pub triangles_rendered: u64,
    /// Execution time of the most recent batch, in milliseconds.
    pub last_batch_time_ms: f32,
}

impl RenderStats {
    /// Folds an executed batch into the counters.
    pub fn record_batch(&mut self, report: &BatchReport) {
        self.batches_executed += 1;
        self.commands_executed += report.executed as u64;
        self.commands_failed += report.failures.len() as u64;
        self.last_batch_time_ms = report.elapsed.as_secs_f32() * 1000.0;
    }

    /// Counts a successful draw call.
    pub fn record_draw(&mut self, call: &DrawCall) {
        self.draw_calls += 1;
        self.triangles_rendered += call.triangle_count();
    }

    /// Counts a successful present.
    pub fn record_present(&mut self) {
        self.frame_number += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandFailure;
    use crate::renderer::context::ContextId;
    use crate::renderer::types::BufferId;
    use std::time::Duration;

    #[test]
    fn batch_counters_accumulate() {
        let mut stats = RenderStats::default();
        let report = BatchReport {
            context: ContextId(1),
            sequence: 1,
            executed: 4,
            failures: vec![CommandFailure {
                index: 2,
                command: "Draw",
                reason: "no pass".to_string(),
            }],
            elapsed: Duration::from_millis(2),
        };

        stats.record_batch(&report);
        stats.record_batch(&report);

        assert_eq!(stats.batches_executed, 2);
        assert_eq!(stats.commands_executed, 8);
        assert_eq!(stats.commands_failed, 2);
        assert!((stats.last_batch_time_ms - 2.0).abs() < 1e-3);
    }

    #[test]
    fn draws_count_triangles() {
        let mut stats = RenderStats::default();
        stats.record_draw(&DrawCall {
            vertex_buffer: BufferId(1),
            vertex_stride: 8,
            first_vertex: 0,
            vertex_count: 6,
            instance_count: 1,
        });
        stats.record_present();

        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.triangles_rendered, 2);
        assert_eq!(stats.frame_number, 1);
    }
}
