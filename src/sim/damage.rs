//! Ship damage state machine
//!
//! `Vulnerable --hit--> Invulnerable { until } --(now >= until)--> Vulnerable`,
//! and any hit that takes health to zero lands in the terminal `Destroyed`.
//! Time is the simulation tick counter, so the machine needs no real clock.
//!
//! Flash feedback decays linearly from 1.0 to 0 over [`FLASH_DURATION`] seconds.

use rand::Rng;
use serde::Serialize;

use crate::audio::SoundEffect;
use crate::consts::TICKS_PER_SEC;

use super::entity::Ship;

/// Invulnerability window after a hit (2 seconds)
pub const INVULNERABILITY_TICKS: u64 = 2 * TICKS_PER_SEC;
/// Seconds for a full-intensity flash to fade out
pub const FLASH_DURATION: f32 = 1.0;
/// Intensity below this snaps to zero
const FLASH_EPSILON: f32 = 1e-4;
/// Chance that a hyperspace jump destroys the ship
pub const HYPERSPACE_MALFUNCTION_CHANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShipCondition {
    Vulnerable,
    /// Hits are ignored until the tick counter reaches `until`
    Invulnerable { until: u64 },
    Destroyed,
}

/// Tint applied to the ship while it flashes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FlashColor {
    #[default]
    None,
    AsteroidRedOrange,
    AlienBrightRed,
    BulletYellowRed,
    HyperspacePurple,
}

impl FlashColor {
    /// Base colour at full intensity
    pub fn rgb(self) -> [u8; 3] {
        match self {
            FlashColor::None => [255, 255, 255],
            FlashColor::AsteroidRedOrange => [255, 100, 100],
            FlashColor::AlienBrightRed => [255, 50, 50],
            FlashColor::BulletYellowRed => [255, 255, 100],
            FlashColor::HyperspacePurple => [150, 100, 255],
        }
    }

    /// Colour blended from white toward the base colour by `intensity`
    pub fn tint(self, intensity: f32) -> [u8; 3] {
        let t = intensity.clamp(0.0, 1.0);
        let base = self.rgb();
        let mut out = [255u8; 3];
        for (o, b) in out.iter_mut().zip(base) {
            *o = (255.0 + (f32::from(b) - 255.0) * t).round() as u8;
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DamageKind {
    AsteroidHit,
    AlienCollision,
    AlienBulletHit,
    HyperspaceMalfunction,
}

impl DamageKind {
    pub fn flash_color(self) -> FlashColor {
        match self {
            DamageKind::AsteroidHit => FlashColor::AsteroidRedOrange,
            DamageKind::AlienCollision => FlashColor::AlienBrightRed,
            DamageKind::AlienBulletHit => FlashColor::BulletYellowRed,
            DamageKind::HyperspaceMalfunction => FlashColor::HyperspacePurple,
        }
    }

    pub fn sound(self) -> SoundEffect {
        match self {
            DamageKind::AsteroidHit => SoundEffect::AsteroidHit,
            DamageKind::AlienCollision => SoundEffect::AlienCollision,
            DamageKind::AlienBulletHit => SoundEffect::AlienBulletHit,
            DamageKind::HyperspaceMalfunction => SoundEffect::HyperspaceMalfunction,
        }
    }

    /// Health lost from a collision of this kind
    pub fn base_amount(self) -> i32 {
        match self {
            DamageKind::AsteroidHit => 1,
            DamageKind::AlienCollision => 2,
            DamageKind::AlienBulletHit => 1,
            // Always lethal; the real amount is the victim's remaining health
            DamageKind::HyperspaceMalfunction => super::entity::SHIP_MAX_HEALTH,
        }
    }
}

/// A single hit on a ship; consumed within the tick that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DamageEvent {
    pub kind: DamageKind,
    pub amount: i32,
    /// Ship id
    pub victim: u32,
}

impl DamageEvent {
    pub fn new(kind: DamageKind, victim: u32) -> Self {
        Self {
            kind,
            amount: kind.base_amount(),
            victim,
        }
    }

    /// Malfunction that takes all of `ship`'s remaining health
    pub fn hyperspace_malfunction(ship: &Ship) -> Self {
        Self {
            kind: DamageKind::HyperspaceMalfunction,
            amount: ship.health,
            victim: ship.id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Ship was invulnerable, already destroyed, or not the victim
    Ignored,
    /// Health dropped; invulnerability window started
    Wounded,
    /// Health reached zero
    Destroyed,
}

impl DamageOutcome {
    pub fn accepted(self) -> bool {
        self != DamageOutcome::Ignored
    }
}

/// Lapse an expired invulnerability window back to `Vulnerable`
pub fn refresh_condition(ship: &mut Ship, now: u64) {
    if let ShipCondition::Invulnerable { until } = ship.condition {
        if now >= until {
            ship.condition = ShipCondition::Vulnerable;
        }
    }
}

/// Feed one damage event through the state machine
pub fn apply_damage(ship: &mut Ship, event: &DamageEvent, now: u64) -> DamageOutcome {
    if event.victim != ship.id {
        return DamageOutcome::Ignored;
    }
    refresh_condition(ship, now);

    let malfunction = event.kind == DamageKind::HyperspaceMalfunction;
    match ship.condition {
        ShipCondition::Destroyed => return DamageOutcome::Ignored,
        ShipCondition::Invulnerable { .. } if !malfunction => return DamageOutcome::Ignored,
        _ => {}
    }

    ship.health = if malfunction {
        0
    } else {
        (ship.health - event.amount).max(0)
    };
    ship.flash_color = event.kind.flash_color();
    ship.flash_intensity = 1.0;

    if ship.health <= 0 {
        ship.condition = ShipCondition::Destroyed;
        ship.body.alive = false;
        DamageOutcome::Destroyed
    } else {
        ship.condition = ShipCondition::Invulnerable {
            until: now + INVULNERABILITY_TICKS,
        };
        DamageOutcome::Wounded
    }
}

/// Fade the flash by one step; clears the colour once it reaches zero
pub fn decay_flash(ship: &mut Ship, dt: f32) {
    if ship.flash_intensity <= 0.0 {
        ship.flash_intensity = 0.0;
        ship.flash_color = FlashColor::None;
        return;
    }
    ship.flash_intensity -= dt / FLASH_DURATION;
    if ship.flash_intensity < FLASH_EPSILON {
        ship.flash_intensity = 0.0;
        ship.flash_color = FlashColor::None;
    }
}

/// Roll the dice on a hyperspace jump
pub fn roll_malfunction(rng: &mut impl Rng) -> bool {
    rng.random_bool(HYPERSPACE_MALFUNCTION_CHANCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn ship() -> Ship {
        Ship::new(1, Vec2::new(400.0, 300.0))
    }

    #[test]
    fn test_three_spaced_hits_destroy() {
        let mut ship = ship();
        let hit = DamageEvent::new(DamageKind::AsteroidHit, 1);

        assert_eq!(apply_damage(&mut ship, &hit, 0), DamageOutcome::Wounded);
        assert_eq!(apply_damage(&mut ship, &hit, INVULNERABILITY_TICKS), DamageOutcome::Wounded);
        assert_eq!(
            apply_damage(&mut ship, &hit, 2 * INVULNERABILITY_TICKS),
            DamageOutcome::Destroyed
        );
        assert_eq!(ship.health, 0);
        assert_eq!(ship.condition, ShipCondition::Destroyed);
        assert!(!ship.body.alive);
    }

    #[test]
    fn test_hits_inside_window_ignored() {
        let mut ship = ship();
        let hit = DamageEvent::new(DamageKind::AsteroidHit, 1);

        assert_eq!(apply_damage(&mut ship, &hit, 10), DamageOutcome::Wounded);
        assert_eq!(
            apply_damage(&mut ship, &hit, 10 + INVULNERABILITY_TICKS - 1),
            DamageOutcome::Ignored
        );
        assert_eq!(ship.health, 2);
    }

    #[test]
    fn test_window_lapses_back_to_vulnerable() {
        let mut ship = ship();
        let hit = DamageEvent::new(DamageKind::AlienBulletHit, 1);
        apply_damage(&mut ship, &hit, 0);
        assert!(matches!(ship.condition, ShipCondition::Invulnerable { .. }));
        refresh_condition(&mut ship, INVULNERABILITY_TICKS);
        assert_eq!(ship.condition, ShipCondition::Vulnerable);
    }

    #[test]
    fn test_alien_collision_scenario() {
        let mut ship = ship();
        let now = 50;
        let outcome = apply_damage(&mut ship, &DamageEvent::new(DamageKind::AlienCollision, 1), now);
        assert_eq!(outcome, DamageOutcome::Wounded);
        assert_eq!(ship.health, 1);
        assert_eq!(ship.flash_color, FlashColor::AlienBrightRed);
        assert_eq!(ship.flash_intensity, 1.0);
        assert_eq!(
            ship.condition,
            ShipCondition::Invulnerable {
                until: now + INVULNERABILITY_TICKS
            }
        );
    }

    #[test]
    fn test_malfunction_bypasses_invulnerability() {
        let mut ship = ship();
        ship.condition = ShipCondition::Invulnerable { until: 1_000 };
        let event = DamageEvent::hyperspace_malfunction(&ship);
        assert_eq!(event.amount, 3);
        assert_eq!(apply_damage(&mut ship, &event, 5), DamageOutcome::Destroyed);
        assert_eq!(ship.health, 0);
        assert_eq!(ship.flash_color, FlashColor::HyperspacePurple);
    }

    #[test]
    fn test_destroyed_is_terminal() {
        let mut ship = ship();
        ship.condition = ShipCondition::Destroyed;
        let hit = DamageEvent::new(DamageKind::AsteroidHit, 1);
        assert_eq!(apply_damage(&mut ship, &hit, 0), DamageOutcome::Ignored);
        let malfunction = DamageEvent::hyperspace_malfunction(&ship);
        assert_eq!(apply_damage(&mut ship, &malfunction, 0), DamageOutcome::Ignored);
    }

    #[test]
    fn test_wrong_victim_ignored() {
        let mut ship = ship();
        let hit = DamageEvent::new(DamageKind::AsteroidHit, 42);
        assert_eq!(apply_damage(&mut ship, &hit, 0), DamageOutcome::Ignored);
        assert_eq!(ship.health, 3);
    }

    #[test]
    fn test_flash_decays_monotonically_within_a_second() {
        let mut ship = ship();
        apply_damage(&mut ship, &DamageEvent::new(DamageKind::AsteroidHit, 1), 0);

        let mut last = ship.flash_intensity;
        let mut ticks = 0;
        while ship.flash_intensity > 0.0 {
            decay_flash(&mut ship, SIM_DT);
            assert!(ship.flash_intensity <= last);
            last = ship.flash_intensity;
            ticks += 1;
            assert!(ticks <= 61, "flash should fade within one second");
        }
        assert_eq!(ship.flash_color, FlashColor::None);
    }

    #[test]
    fn test_tint_blends_from_white() {
        assert_eq!(FlashColor::AlienBrightRed.tint(1.0), [255, 50, 50]);
        assert_eq!(FlashColor::AlienBrightRed.tint(0.0), [255, 255, 255]);
        assert_eq!(FlashColor::HyperspacePurple.tint(0.5), [203, 178, 255]);
    }

    #[test]
    fn test_malfunction_rate_near_ten_percent() {
        let mut rng = Pcg32::seed_from_u64(0x5eed);
        let trials = 10_000;
        let hits = (0..trials).filter(|_| roll_malfunction(&mut rng)).count();
        let rate = hits as f64 / trials as f64;
        assert!((rate - 0.1).abs() <= 0.01, "observed rate {rate}");
    }
}
