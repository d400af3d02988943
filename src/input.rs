//! Input intents and the mouse click buffer.
//!
//! Device handling lives outside the simulation: an adapter turns raw key
//! and mouse events into `Intent`s and clicks, delivered once per frame in
//! a `FrameInput`.

use std::collections::VecDeque;

use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDir {
    Forward,
    Back,
    StrafeLeft,
    StrafeRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDir {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    Inventory,
    Characters,
    Spellbook,
    Quests,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
        }
    }
}

/// Everything the player can ask the simulation to do
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Move(MoveDir),
    /// Continuous in real-time, a discrete 90 degree turn in turn-based mode
    Rotate(RotateDir),
    Attack,
    CastEquippedSpell,
    /// Cast the selected member's heal on the member under the cursor
    HealUnderCursor { target: usize },
    /// Zero-based member index
    SelectCharacter(usize),
    OpenMenu(Menu),
    OpenMainMenu,
    /// Pick an option in the open prompt (level-up choice, dialog)
    SelectOption(usize),
    Confirm,
    Cancel,
    ClickAt { x: f32, y: f32, button: MouseButton },
    ToggleMode,
    Interact,
    Rest,
    MapOverlay,
    ShowFps,
    Save(u8),
    Load(u8),
    Exit,
}

/// Input for one frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub intents: Vec<Intent>,
    /// Wall-clock milliseconds, used for click windows and teleporter cooldown
    pub now_ms: u64,
}

impl FrameInput {
    pub fn new(now_ms: u64, intents: Vec<Intent>) -> Self {
        Self { intents, now_ms }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    pub x: f32,
    pub y: f32,
    pub button: MouseButton,
    pub time_ms: u64,
}

/// Per-button queues of recent clicks. Each click is consumed at most once:
/// the first UI region to claim it wins.
#[derive(Debug, Clone, Default)]
pub struct MouseClickBuffer {
    queues: [VecDeque<Click>; 3],
}

impl MouseClickBuffer {
    pub fn enqueue(&mut self, click: Click) {
        let queue = &mut self.queues[click.button.index()];
        if queue.len() == CLICK_QUEUE_CAPACITY {
            queue.pop_front();
        }
        queue.push_back(click);
    }

    /// Drop clicks older than the click window
    pub fn prune(&mut self, now_ms: u64) {
        for queue in self.queues.iter_mut() {
            queue.retain(|c| now_ms.saturating_sub(c.time_ms) < CLICK_WINDOW_MS);
        }
    }

    /// Pop the oldest click of `button` inside the rectangle
    pub fn consume_click_in(&mut self, button: MouseButton, x1: f32, y1: f32, x2: f32, y2: f32) -> Option<Click> {
        let (min_x, max_x) = (x1.min(x2), x1.max(x2));
        let (min_y, max_y) = (y1.min(y2), y1.max(y2));
        let queue = &mut self.queues[button.index()];
        let index = queue
            .iter()
            .position(|c| c.x >= min_x && c.x <= max_x && c.y >= min_y && c.y <= max_y)?;
        queue.remove(index)
    }

    pub fn consume_left_click_in(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Option<Click> {
        self.consume_click_in(MouseButton::Left, x1, y1, x2, y2)
    }

    pub fn pending(&self, button: MouseButton) -> usize {
        self.queues[button.index()].len()
    }
}

/// Detects two clicks of the same button on the same target within the window
#[derive(Debug, Clone, Default)]
pub struct DoubleClickTracker {
    last: Option<(String, MouseButton, u64)>,
}

impl DoubleClickTracker {
    /// Record a click. Returns true when it completes a double click.
    pub fn register(&mut self, target: &str, button: MouseButton, time_ms: u64) -> bool {
        let is_double = self.last.as_ref().is_some_and(|(last_target, last_button, last_time)| {
            last_target == target
                && *last_button == button
                && time_ms.saturating_sub(*last_time) < CLICK_WINDOW_MS
        });
        self.last = if is_double {
            None
        } else {
            Some((target.to_string(), button, time_ms))
        };
        is_double
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left(x: f32, y: f32, time_ms: u64) -> Click {
        Click {
            x,
            y,
            button: MouseButton::Left,
            time_ms,
        }
    }

    #[test]
    fn test_click_consumed_once() {
        let mut buffer = MouseClickBuffer::default();
        buffer.enqueue(left(10.0, 10.0, 0));
        assert!(buffer.consume_left_click_in(0.0, 0.0, 20.0, 20.0).is_some());
        assert!(buffer.consume_left_click_in(0.0, 0.0, 20.0, 20.0).is_none());
    }

    #[test]
    fn test_oldest_matching_click_wins() {
        let mut buffer = MouseClickBuffer::default();
        buffer.enqueue(left(100.0, 100.0, 1));
        buffer.enqueue(left(10.0, 10.0, 2));
        buffer.enqueue(left(12.0, 12.0, 3));
        let click = buffer.consume_left_click_in(0.0, 0.0, 20.0, 20.0).unwrap();
        assert_eq!(click.time_ms, 2);
        assert_eq!(buffer.pending(MouseButton::Left), 2);
    }

    #[test]
    fn test_prune_discards_old_clicks() {
        let mut buffer = MouseClickBuffer::default();
        buffer.enqueue(left(10.0, 10.0, 0));
        buffer.enqueue(left(10.0, 10.0, 500));
        buffer.prune(CLICK_WINDOW_MS);
        assert_eq!(buffer.pending(MouseButton::Left), 1);
        assert_eq!(buffer.consume_left_click_in(0.0, 0.0, 20.0, 20.0).unwrap().time_ms, 500);
    }

    #[test]
    fn test_buttons_are_separate() {
        let mut buffer = MouseClickBuffer::default();
        buffer.enqueue(Click {
            x: 5.0,
            y: 5.0,
            button: MouseButton::Right,
            time_ms: 0,
        });
        assert!(buffer.consume_left_click_in(0.0, 0.0, 10.0, 10.0).is_none());
        assert!(buffer
            .consume_click_in(MouseButton::Right, 0.0, 0.0, 10.0, 10.0)
            .is_some());
    }

    #[test]
    fn test_queue_capacity() {
        let mut buffer = MouseClickBuffer::default();
        for i in 0..(CLICK_QUEUE_CAPACITY as u64 + 4) {
            buffer.enqueue(left(1.0, 1.0, i));
        }
        assert_eq!(buffer.pending(MouseButton::Left), CLICK_QUEUE_CAPACITY);
    }

    #[test]
    fn test_double_click_window_is_strict() {
        let mut tracker = DoubleClickTracker::default();
        assert!(!tracker.register("potion", MouseButton::Left, 1000));
        assert!(tracker.register("potion", MouseButton::Left, 1000 + CLICK_WINDOW_MS - 1));

        let mut tracker = DoubleClickTracker::default();
        tracker.register("potion", MouseButton::Left, 1000);
        assert!(!tracker.register("potion", MouseButton::Left, 1000 + CLICK_WINDOW_MS));
    }

    #[test]
    fn test_double_click_needs_same_target_and_button() {
        let mut tracker = DoubleClickTracker::default();
        tracker.register("potion", MouseButton::Left, 0);
        assert!(!tracker.register("sword", MouseButton::Left, 10));
        assert!(!tracker.register("sword", MouseButton::Right, 20));
    }
}
