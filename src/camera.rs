//! First-person camera. The camera position is the party's location.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;

use crate::constants::*;
use crate::grid::world_to_tile;

/// Normalize an angle to [0, 2π)
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec2,
    angle: f32,
    pub fov: f32,
    /// View distance in tiles
    pub view_distance: f32,
}

impl Camera {
    pub fn new(position: Vec2, angle: f32) -> Self {
        Self {
            position,
            angle: normalize_angle(angle),
            fov: CAMERA_DEFAULT_FOV,
            view_distance: CAMERA_VIEW_DISTANCE_TILES,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = normalize_angle(angle);
    }

    pub fn rotate(&mut self, delta: f32) {
        self.set_angle(self.angle + delta);
    }

    /// Turn exactly 90 degrees and snap to the nearest cardinal direction
    pub fn turn_quarter(&mut self, clockwise: bool) {
        let quarter = (self.angle / FRAC_PI_2).round();
        let next = if clockwise { quarter + 1.0 } else { quarter - 1.0 };
        self.set_angle(next * FRAC_PI_2);
    }

    /// Unit vector the party faces. Angle 0 faces +x, angles grow toward +y.
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    /// Unit vector to the party's right
    pub fn right(&self) -> Vec2 {
        self.forward().perp()
    }

    /// Forward snapped to the dominant axis, for grid steps
    pub fn cardinal_forward(&self) -> (i32, i32) {
        cardinal(self.forward())
    }

    pub fn tile(&self) -> (i32, i32) {
        world_to_tile(self.position)
    }
}

/// Dominant axis of a direction as a unit tile step
pub fn cardinal(dir: Vec2) -> (i32, i32) {
    if dir.x.abs() >= dir.y.abs() {
        (dir.x.signum() as i32, 0)
    } else {
        (0, dir.y.signum() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_angle_normalized() {
        let mut camera = Camera::new(Vec2::ZERO, -FRAC_PI_2);
        assert!((camera.angle() - 3.0 * FRAC_PI_2).abs() < 1e-5);
        camera.rotate(TAU + PI);
        assert!(camera.angle() >= 0.0 && camera.angle() < TAU);
    }

    #[test]
    fn test_quarter_turns_snap_to_cardinals() {
        let mut camera = Camera::new(Vec2::ZERO, 0.1);
        camera.turn_quarter(true);
        assert_eq!(camera.cardinal_forward(), (0, 1));
        camera.turn_quarter(true);
        assert_eq!(camera.cardinal_forward(), (-1, 0));
        camera.turn_quarter(false);
        camera.turn_quarter(false);
        assert_eq!(camera.cardinal_forward(), (1, 0));
    }

    #[test]
    fn test_right_is_perpendicular() {
        let camera = Camera::new(Vec2::ZERO, 0.0);
        assert!(camera.forward().dot(camera.right()).abs() < 1e-6);
        assert_eq!(cardinal(camera.right()), (0, 1));
    }
}
