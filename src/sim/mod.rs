//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No audio or platform dependencies; sounds leave as [`GameEvent::Sound`]

pub mod collision;
pub mod damage;
pub mod entity;
pub mod state;
pub mod tick;

pub use collision::{Contact, EntityRef, classify, detect, detect_contacts};
pub use damage::{
    DamageEvent, DamageKind, DamageOutcome, FlashColor, ShipCondition, apply_damage, decay_flash,
};
pub use entity::{AlienShip, Asteroid, AsteroidSize, Body, Bullet, BulletOwner, Ship};
pub use state::{EntityKind, EntitySnapshot, GameEvent, GamePhase, GameState, Snapshot};
pub use tick::{TickInput, tick};
