//! Audio system
//!
//! Procedurally generated sound effects - no external files needed!
//!
//! Every effect is a short sine tone rendered to 16-bit PCM by [`synthesize`].
//! The output device is opened once at startup; if that fails the game runs
//! with a [`SilentDevice`] and nothing in the simulation can tell the difference.

mod synth;

#[cfg(all(feature = "native-audio", not(target_arch = "wasm32")))]
mod rodio_backend;
#[cfg(target_arch = "wasm32")]
mod web;

pub use synth::{PcmBuffer, synthesize};

use crate::settings::Settings;

/// Output sample rate (Hz)
pub const SAMPLE_RATE: u32 = 22050;
/// Output channels (mono content duplicated to stereo)
pub const CHANNELS: u16 = 2;
/// Device playback buffer size in frames (~23ms at 22050 Hz)
pub const PLAYBACK_BUFFER_FRAMES: u32 = 512;
/// Peak sample value at volume 1.0
pub const MAX_AMPLITUDE: f32 = i16::MAX as f32;

/// Errors raised inside the audio subsystem.
///
/// None of these ever reach the simulation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// No usable output device; audio is off for the rest of the process
    #[error("{0}")]
    Unavailable(String),
    /// A single playback request failed on an otherwise working device
    #[error("Playback failed: {0}")]
    Playback(String),
}

/// Immutable description of a tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundSpec {
    frequency_hz: u32,
    duration_s: f32,
    volume: f32,
}

impl SoundSpec {
    /// Build a tone description.
    ///
    /// Panics if `frequency_hz == 0`, `duration_s <= 0` or `volume` is outside `[0, 1]`.
    pub const fn new(frequency_hz: u32, duration_s: f32, volume: f32) -> Self {
        assert!(frequency_hz > 0, "frequency must be positive");
        assert!(duration_s > 0.0, "duration must be positive");
        assert!(volume >= 0.0 && volume <= 1.0, "volume must be within [0, 1]");
        Self {
            frequency_hz,
            duration_s,
            volume,
        }
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    pub fn duration_s(&self) -> f32 {
        self.duration_s
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Number of frames this tone renders to
    pub fn frame_count(&self) -> usize {
        (self.duration_s as f64 * SAMPLE_RATE as f64).round() as usize
    }
}

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum SoundEffect {
    /// Player fires a bullet
    Shoot,
    /// Ship clipped by an asteroid - low thud
    AsteroidHit,
    /// Ship rammed by an alien - sharp crash
    AlienCollision,
    /// Ship hit by alien fire - high zap
    AlienBulletHit,
    /// Hyperspace jump went wrong - warble
    HyperspaceMalfunction,
    /// Small asteroid destroyed
    ExplosionSmall,
    /// Medium asteroid destroyed
    ExplosionMedium,
    /// Large asteroid destroyed
    ExplosionLarge,
    /// Alien ship shot down
    ExplosionAlien,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 9] = [
        SoundEffect::Shoot,
        SoundEffect::AsteroidHit,
        SoundEffect::AlienCollision,
        SoundEffect::AlienBulletHit,
        SoundEffect::HyperspaceMalfunction,
        SoundEffect::ExplosionSmall,
        SoundEffect::ExplosionMedium,
        SoundEffect::ExplosionLarge,
        SoundEffect::ExplosionAlien,
    ];

    /// Fixed tone for this effect
    pub const fn spec(self) -> SoundSpec {
        match self {
            SoundEffect::Shoot => SoundSpec::new(600, 0.10, 0.05),
            SoundEffect::AsteroidHit => SoundSpec::new(200, 0.20, 0.10),
            SoundEffect::AlienCollision => SoundSpec::new(800, 0.30, 0.10),
            SoundEffect::AlienBulletHit => SoundSpec::new(1200, 0.15, 0.10),
            SoundEffect::HyperspaceMalfunction => SoundSpec::new(400, 0.40, 0.10),
            SoundEffect::ExplosionSmall => SoundSpec::new(150, 0.30, 0.08),
            SoundEffect::ExplosionMedium => SoundSpec::new(150, 0.40, 0.08),
            SoundEffect::ExplosionLarge => SoundSpec::new(150, 0.50, 0.08),
            SoundEffect::ExplosionAlien => SoundSpec::new(150, 0.50, 0.08),
        }
    }
}

/// An audio output.
///
/// Implementations must never panic or block; failures are absorbed here.
pub trait AudioDevice {
    /// Queue a buffer for playback and return immediately
    fn play(&mut self, buffer: &PcmBuffer);

    /// Set the playback gain applied on top of each buffer (0.0 - 1.0)
    fn set_volume(&mut self, _volume: f32) {}

    /// Whether sound actually reaches a speaker
    fn is_available(&self) -> bool;
}

/// Device used when no output could be opened. Every call is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentDevice;

impl AudioDevice for SilentDevice {
    fn play(&mut self, _buffer: &PcmBuffer) {}

    fn is_available(&self) -> bool {
        false
    }
}

/// Outcome of opening the audio output, recorded once per process
#[derive(Debug, Clone, PartialEq)]
pub enum AudioStatus {
    Ready,
    Unavailable(String),
}

impl AudioStatus {
    /// Human-readable startup diagnostic
    pub fn status_line(&self) -> String {
        match self {
            AudioStatus::Ready => "Sound system initialized successfully".to_string(),
            AudioStatus::Unavailable(reason) => format!("Sound system unavailable: {reason}"),
        }
    }
}

/// Try to open the platform output device.
#[cfg(all(feature = "native-audio", not(target_arch = "wasm32")))]
pub fn initialize() -> Result<Box<dyn AudioDevice>, AudioError> {
    Ok(Box::new(rodio_backend::RodioDevice::open()?))
}

/// Try to open the platform output device.
#[cfg(target_arch = "wasm32")]
pub fn initialize() -> Result<Box<dyn AudioDevice>, AudioError> {
    Ok(Box::new(web::WebAudioDevice::open()?))
}

/// Try to open the platform output device.
#[cfg(all(not(feature = "native-audio"), not(target_arch = "wasm32")))]
pub fn initialize() -> Result<Box<dyn AudioDevice>, AudioError> {
    Err(AudioError::Unavailable(
        "built without an audio backend (enable the `native-audio` feature)".to_string(),
    ))
}

/// Open the output once, falling back to [`SilentDevice`] on any failure.
///
/// The returned status is the only trace the failure leaves.
pub fn open_device(settings: &Settings) -> (Box<dyn AudioDevice>, AudioStatus) {
    let opened = if settings.audio_enabled {
        initialize()
    } else {
        Err(AudioError::Unavailable("disabled in settings".to_string()))
    };

    match opened {
        Ok(mut device) => {
            device.set_volume(settings.effective_volume());
            log::info!("Audio output ready ({SAMPLE_RATE} Hz, {CHANNELS} ch)");
            (device, AudioStatus::Ready)
        }
        Err(e) => {
            log::warn!("Audio disabled: {e}");
            (Box::new(SilentDevice), AudioStatus::Unavailable(e.to_string()))
        }
    }
}

/// Pre-rendered buffers for every [`SoundEffect`]
#[derive(Debug, Clone)]
pub struct SoundBank {
    // Indexed by declaration order, which is also the order of SoundEffect::ALL
    buffers: [PcmBuffer; SoundEffect::ALL.len()],
}

impl Default for SoundBank {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundBank {
    pub fn new() -> Self {
        Self {
            buffers: SoundEffect::ALL.map(|effect| synthesize(effect.spec())),
        }
    }

    pub fn get(&self, effect: SoundEffect) -> &PcmBuffer {
        &self.buffers[effect as usize]
    }
}
