//! Planetoids - a ZX81-style asteroid shooter core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, damage, game state)
//! - `audio`: Procedural tone synthesis and fail-open audio output
//! - `game`: Fixed-step session driver wiring the sim to the audio device
//! - `settings`: Player preferences

pub mod audio;
pub mod game;
pub mod settings;
pub mod sim;

pub use game::Game;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation tick rate
    pub const TICK_HZ: u32 = 60;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / TICK_HZ as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Playfield dimensions (toroidal)
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 600.0;

    /// Ticks per simulated second, for timer constants
    pub const TICKS_PER_SEC: u64 = TICK_HZ as u64;
}

/// Unit direction for a heading in radians.
///
/// Heading 0 points up the screen (negative y) and increases clockwise.
#[inline]
pub fn heading_vector(heading: f32) -> Vec2 {
    Vec2::new(heading.sin(), -heading.cos())
}

/// Heading (radians) that points along `dir`
#[inline]
pub fn heading_of(dir: Vec2) -> f32 {
    dir.x.atan2(-dir.y)
}

/// Wrap a position onto the toroidal playfield
#[inline]
pub fn wrap_position(pos: Vec2) -> Vec2 {
    Vec2::new(
        pos.x.rem_euclid(consts::SCREEN_WIDTH),
        pos.y.rem_euclid(consts::SCREEN_HEIGHT),
    )
}

/// Shortest displacement from `from` to `to` across the wrapped edges
#[inline]
pub fn toroidal_delta(from: Vec2, to: Vec2) -> Vec2 {
    use consts::{SCREEN_HEIGHT, SCREEN_WIDTH};
    let mut d = to - from;
    if d.x > SCREEN_WIDTH / 2.0 {
        d.x -= SCREEN_WIDTH;
    } else if d.x < -SCREEN_WIDTH / 2.0 {
        d.x += SCREEN_WIDTH;
    }
    if d.y > SCREEN_HEIGHT / 2.0 {
        d.y -= SCREEN_HEIGHT;
    } else if d.y < -SCREEN_HEIGHT / 2.0 {
        d.y += SCREEN_HEIGHT;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_zero_points_up() {
        let v = heading_vector(0.0);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y + 1.0).abs() < 1e-6);
        assert!(heading_of(v).abs() < 1e-6);
    }

    #[test]
    fn test_wrap_position() {
        let p = wrap_position(Vec2::new(-10.0, 610.0));
        assert!((p.x - 790.0).abs() < 1e-3);
        assert!((p.y - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_toroidal_delta_takes_short_way() {
        let d = toroidal_delta(Vec2::new(790.0, 300.0), Vec2::new(10.0, 300.0));
        assert!((d.x - 20.0).abs() < 1e-3);
        assert!(d.y.abs() < 1e-3);
    }
}
