//! Collision detection and classification
//!
//! Every alive entity is a circle. Detection is a plain pairwise scan (entity
//! counts are in the tens) and never mutates anything; the tick applies the
//! resulting contacts afterwards in scan order.

use serde::Serialize;

use super::damage::DamageKind;
use super::entity::{Body, BulletOwner};
use super::state::GameState;

/// Lookup key for an entity in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityRef {
    Ship(u32),
    Asteroid(u32),
    Alien(u32),
    Bullet(u32, BulletOwner),
}

/// What an overlapping pair means for the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Something hurt the ship
    ShipStruck {
        ship: u32,
        cause: EntityRef,
        kind: DamageKind,
    },
    /// Player bullet hit an asteroid
    AsteroidShot { asteroid: u32, bullet: u32 },
    /// Player bullet hit an alien
    AlienShot { alien: u32, bullet: u32 },
}

impl Contact {
    /// Entities this contact would consume
    pub fn participants(&self) -> [EntityRef; 2] {
        match *self {
            Contact::ShipStruck { ship, cause, .. } => [EntityRef::Ship(ship), cause],
            Contact::AsteroidShot { asteroid, bullet } => [
                EntityRef::Asteroid(asteroid),
                EntityRef::Bullet(bullet, BulletOwner::Player),
            ],
            Contact::AlienShot { alien, bullet } => [
                EntityRef::Alien(alien),
                EntityRef::Bullet(bullet, BulletOwner::Player),
            ],
        }
    }
}

/// Every alive entity with its body, in registry order (ship, asteroids, aliens, bullets)
pub fn alive_bodies(state: &GameState) -> Vec<(EntityRef, &Body)> {
    let mut out = Vec::with_capacity(
        1 + state.asteroids.len() + state.aliens.len() + state.bullets.len(),
    );
    if state.ship.body.alive {
        out.push((EntityRef::Ship(state.ship.id), &state.ship.body));
    }
    out.extend(
        state
            .asteroids
            .iter()
            .filter(|a| a.body.alive)
            .map(|a| (EntityRef::Asteroid(a.id), &a.body)),
    );
    out.extend(
        state
            .aliens
            .iter()
            .filter(|a| a.body.alive)
            .map(|a| (EntityRef::Alien(a.id), &a.body)),
    );
    out.extend(
        state
            .bullets
            .iter()
            .filter(|b| b.body.alive)
            .map(|b| (EntityRef::Bullet(b.id, b.owner), &b.body)),
    );
    out
}

/// All overlapping pairs. `distance <= ra + rb` counts as a hit.
pub fn detect(bodies: &[(EntityRef, &Body)]) -> Vec<(EntityRef, EntityRef)> {
    let mut pairs = Vec::new();
    for (i, (ref_a, a)) in bodies.iter().enumerate() {
        for (ref_b, b) in &bodies[i + 1..] {
            if a.overlaps(b) {
                pairs.push((*ref_a, *ref_b));
            }
        }
    }
    pairs
}

/// Decide what a pair means. Pairs that don't interact yield `None`.
pub fn classify(a: EntityRef, b: EntityRef) -> Option<Contact> {
    use EntityRef::*;

    let struck = |ship, cause, kind| Some(Contact::ShipStruck { ship, cause, kind });

    match (a, b) {
        (Ship(ship), cause @ Asteroid(_)) | (cause @ Asteroid(_), Ship(ship)) => {
            struck(ship, cause, DamageKind::AsteroidHit)
        }
        (Ship(ship), cause @ Alien(_)) | (cause @ Alien(_), Ship(ship)) => {
            struck(ship, cause, DamageKind::AlienCollision)
        }
        (Ship(ship), cause @ Bullet(_, BulletOwner::Alien))
        | (cause @ Bullet(_, BulletOwner::Alien), Ship(ship)) => {
            struck(ship, cause, DamageKind::AlienBulletHit)
        }
        (Asteroid(asteroid), Bullet(bullet, BulletOwner::Player))
        | (Bullet(bullet, BulletOwner::Player), Asteroid(asteroid)) => {
            Some(Contact::AsteroidShot { asteroid, bullet })
        }
        (Alien(alien), Bullet(bullet, BulletOwner::Player))
        | (Bullet(bullet, BulletOwner::Player), Alien(alien)) => {
            Some(Contact::AlienShot { alien, bullet })
        }
        // Own bullets, rocks bumping rocks, aliens flying through rocks, ...
        _ => None,
    }
}

/// Detect and classify everything touching this tick
pub fn detect_contacts(state: &GameState) -> Vec<Contact> {
    let bodies = alive_bodies(state);
    detect(&bodies)
        .into_iter()
        .filter_map(|(a, b)| classify(a, b))
        .collect()
}
