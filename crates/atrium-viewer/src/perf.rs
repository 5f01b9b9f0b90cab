// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tiny rolling frame time tracker.

use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub struct PerfStats {
    frame_ms: VecDeque<f32>,
    max_samples: usize,
}

impl Default for PerfStats {
    fn default() -> Self {
        Self::with_capacity(240)
    }
}

impl PerfStats {
    pub fn with_capacity(max_samples: usize) -> Self {
        Self {
            frame_ms: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
        }
    }

    pub fn push(&mut self, frame: f32) {
        if self.frame_ms.len() == self.max_samples {
            self.frame_ms.pop_front();
        }
        self.frame_ms.push_back(frame);
    }

    /// Mean over the window; 0 before the first sample.
    pub fn average_ms(&self) -> f32 {
        if self.frame_ms.is_empty() {
            return 0.0;
        }
        self.frame_ms.iter().sum::<f32>() / self.frame_ms.len() as f32
    }

    pub fn worst_ms(&self) -> f32 {
        self.frame_ms.iter().copied().fold(0.0, f32::max)
    }

    pub fn fps(&self) -> f32 {
        let avg = self.average_ms();
        if avg > 0.0 {
            1000.0 / avg
        } else {
            0.0
        }
    }

    pub fn clear(&mut self) {
        self.frame_ms.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn window_drops_oldest_samples() {
        let mut perf = PerfStats::with_capacity(3);
        for ms in [100.0, 10.0, 20.0, 30.0] {
            perf.push(ms);
        }
        assert_relative_eq!(perf.average_ms(), 20.0);
        assert_relative_eq!(perf.worst_ms(), 30.0);
        assert_relative_eq!(perf.fps(), 50.0);
    }

    #[test]
    fn empty_stats_read_zero() {
        let mut perf = PerfStats::default();
        assert_eq!((perf.average_ms(), perf.fps()), (0.0, 0.0));
        perf.push(16.0);
        perf.clear();
        assert_eq!(perf.worst_ms(), 0.0);
    }
}
