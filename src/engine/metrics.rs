//! Per-frame counters for the FPS overlay and headless diagnostics.

use std::collections::VecDeque;

/// Frame timestamps kept for the rolling FPS average
const FPS_WINDOW: usize = 60;

#[derive(Debug, Clone, Default)]
pub struct FrameMetrics {
    /// Frames simulated since the game started
    pub frame: u64,
    /// Rolling frames per second over the last `FPS_WINDOW` frames
    pub fps: f32,
    pub live_monsters: usize,
    pub active_projectiles: usize,
    pub show_fps: bool,
    stamps: VecDeque<u64>,
}

impl FrameMetrics {
    pub fn record_frame(&mut self, now_ms: u64, live_monsters: usize, active_projectiles: usize) {
        self.frame += 1;
        self.live_monsters = live_monsters;
        self.active_projectiles = active_projectiles;

        self.stamps.push_back(now_ms);
        while self.stamps.len() > FPS_WINDOW {
            self.stamps.pop_front();
        }
        if let (Some(first), Some(last)) = (self.stamps.front(), self.stamps.back()) {
            let span = last.saturating_sub(*first);
            if span > 0 {
                self.fps = (self.stamps.len() - 1) as f32 * 1000.0 / span as f32;
            }
        }
    }

    /// Overlay line, e.g. `FPS: 60 | monsters: 4 | projectiles: 1`
    pub fn overlay(&self) -> String {
        format!(
            "FPS: {:.0} | monsters: {} | projectiles: {}",
            self.fps, self.live_monsters, self.active_projectiles
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_from_steady_frames() {
        let mut metrics = FrameMetrics::default();
        for i in 0..30u64 {
            metrics.record_frame(i * 20, 3, 0);
        }
        assert_eq!(metrics.frame, 30);
        assert!((metrics.fps - 50.0).abs() < 0.01);
        assert_eq!(metrics.live_monsters, 3);
    }

    #[test]
    fn test_single_frame_has_no_fps() {
        let mut metrics = FrameMetrics::default();
        metrics.record_frame(100, 0, 2);
        assert_eq!(metrics.fps, 0.0);
        assert_eq!(metrics.overlay(), "FPS: 0 | monsters: 0 | projectiles: 2");
    }
}
