//! Session driver
//!
//! Owns the simulation, the pre-rendered sound bank and the audio device.
//! Frame time is fed through a fixed-step accumulator; sound events coming out
//! of the sim are played on the device after each step. The device is chosen
//! once and never consulted by the sim, so a silent session and a loud one
//! play out identically.

use crate::audio::{AudioDevice, SoundBank};
use crate::consts::*;
use crate::sim::{GameEvent, GamePhase, GameState, Snapshot, TickInput, tick};

/// Longest frame fed to the accumulator (seconds)
const MAX_FRAME_DT: f32 = 0.1;

/// Player commands from the input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    RotateLeft,
    RotateRight,
    Thrust,
    Fire,
    Hyperspace,
    Pause,
    Start,
    Quit,
}

pub struct Game {
    state: GameState,
    bank: SoundBank,
    audio: Box<dyn AudioDevice>,
    accumulator: f32,
    input: TickInput,
    quit: bool,
}

impl Game {
    pub fn new(seed: u64, audio: Box<dyn AudioDevice>) -> Self {
        Self {
            state: GameState::new(seed),
            bank: SoundBank::new(),
            audio,
            accumulator: 0.0,
            input: TickInput::default(),
            quit: false,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn audio_available(&self) -> bool {
        self.audio.is_available()
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.audio.set_volume(volume);
    }

    /// Set when the player asked to leave
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Key down / button press
    pub fn press(&mut self, command: Command) {
        match command {
            Command::RotateLeft => self.input.rotate_left = true,
            Command::RotateRight => self.input.rotate_right = true,
            Command::Thrust => self.input.thrust = true,
            Command::Fire => self.input.fire = true,
            Command::Hyperspace => self.input.hyperspace = true,
            Command::Pause => self.input.pause = true,
            Command::Start => self.input.start = true,
            Command::Quit => {
                log::info!("Quit requested at score {}", self.state.score);
                self.quit = true;
            }
        }
    }

    /// Key up. One-shot commands ignore releases.
    pub fn release(&mut self, command: Command) {
        match command {
            Command::RotateLeft => self.input.rotate_left = false,
            Command::RotateRight => self.input.rotate_right = false,
            Command::Thrust => self.input.thrust = false,
            _ => {}
        }
    }

    /// Run as many fixed ticks as `frame_dt` covers. Returns the non-sound events.
    pub fn update(&mut self, frame_dt: f32) -> Vec<GameEvent> {
        let dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
        self.accumulator += dt;

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            events.extend(self.step());
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        events
    }

    /// Advance exactly one tick and play whatever it sounded
    pub fn step(&mut self) -> Vec<GameEvent> {
        if self.quit {
            return Vec::new();
        }

        let input = self.input.clone();
        tick(&mut self.state, &input, SIM_DT);
        // Clear one-shot inputs after processing
        self.input.clear_one_shots();

        self.dispatch()
    }

    fn dispatch(&mut self) -> Vec<GameEvent> {
        let mut rest = Vec::new();
        for event in self.state.drain_events() {
            match event {
                GameEvent::Sound(effect) => self.audio.play(self.bank.get(effect)),
                other => rest.push(other),
            }
        }
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;

    use crate::audio::{PcmBuffer, SilentDevice, SoundEffect, SoundSpec};
    use crate::sim::{AlienShip, ShipCondition};

    /// Remembers the spec of every buffer it is asked to play
    #[derive(Clone, Default)]
    struct RecordingDevice {
        played: Rc<RefCell<Vec<Option<SoundSpec>>>>,
    }

    impl AudioDevice for RecordingDevice {
        fn play(&mut self, buffer: &PcmBuffer) {
            self.played.borrow_mut().push(buffer.spec());
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn started(seed: u64, audio: Box<dyn AudioDevice>) -> Game {
        let mut game = Game::new(seed, audio);
        game.press(Command::Start);
        game.step();
        assert_eq!(game.phase(), GamePhase::Playing);
        game
    }

    #[test]
    fn test_alien_collision_plays_its_sound_once() {
        let device = RecordingDevice::default();
        let played = device.played.clone();
        let mut game = started(21, Box::new(device));

        let state = game.state_mut();
        for (i, a) in state.asteroids.iter_mut().enumerate() {
            a.body.pos = Vec2::new(60.0 + 40.0 * i as f32, 60.0);
            a.body.vel = Vec2::ZERO;
        }
        state.ship.condition = ShipCondition::Vulnerable;
        let id = state.next_entity_id();
        let target = Some(state.ship.id);
        let pos = state.ship.body.pos;
        let mut alien = AlienShip::new(id, pos, target, &mut state.rng);
        alien.body.vel = Vec2::ZERO;
        alien.fire_timer = 10.0;
        state.aliens.push(alien);

        played.borrow_mut().clear();
        let events = game.step();

        assert_eq!(game.state().ship.health, 1);
        assert_eq!(
            *played.borrow(),
            vec![Some(SoundEffect::AlienCollision.spec())]
        );
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::ShipDamaged { health: 1, .. }
        )));
    }

    #[test]
    fn test_silent_and_recording_sessions_agree() {
        let script = |game: &mut Game, t: u32| {
            if t % 20 == 0 {
                game.press(Command::Fire);
            }
            if t % 100 == 0 {
                game.press(Command::RotateRight);
            } else if t % 100 == 30 {
                game.release(Command::RotateRight);
            }
        };

        let device = RecordingDevice::default();
        let played = device.played.clone();
        let mut loud = started(77, Box::new(device));
        let mut quiet = started(77, Box::new(SilentDevice));
        for t in 0..900 {
            script(&mut loud, t);
            script(&mut quiet, t);
            loud.step();
            quiet.step();
        }

        assert!(!played.borrow().is_empty());
        assert_eq!(loud.state().score, quiet.state().score);
        assert_eq!(loud.snapshot(), quiet.snapshot());
    }

    #[test]
    fn test_accumulator_runs_fixed_ticks() {
        let mut game = started(3, Box::new(SilentDevice));
        let before = game.state().time_ticks;
        game.update(SIM_DT * 3.5);
        assert_eq!(game.state().time_ticks, before + 3);
        game.update(SIM_DT * 0.6);
        assert_eq!(game.state().time_ticks, before + 4);
    }

    #[test]
    fn test_long_frame_is_capped() {
        let mut game = started(3, Box::new(SilentDevice));
        let before = game.state().time_ticks;
        game.update(5.0);
        let ran = game.state().time_ticks - before;
        assert!(ran > 0 && ran <= u64::from(MAX_SUBSTEPS));
        assert!(game.accumulator < SIM_DT * 2.0);
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut game = started(5, Box::new(SilentDevice));
        game.press(Command::Fire);
        game.update(SIM_DT * 4.0);
        let player_bullets = game
            .state()
            .bullets
            .iter()
            .filter(|b| b.owner == crate::sim::BulletOwner::Player)
            .count();
        assert_eq!(player_bullets, 1);
    }

    #[test]
    fn test_quit_stops_stepping() {
        let mut game = started(5, Box::new(SilentDevice));
        game.press(Command::Quit);
        assert!(game.should_quit());
        let ticks = game.state().time_ticks;
        game.update(SIM_DT * 4.0);
        assert_eq!(game.state().time_ticks, ticks);
    }
}
