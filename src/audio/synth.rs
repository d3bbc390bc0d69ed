//! Sine tone synthesis
//!
//! Renders a [`SoundSpec`] into interleaved stereo 16-bit PCM. Pure and
//! deterministic: the same spec always yields the same samples.

use std::f64::consts::TAU;

use super::{CHANNELS, MAX_AMPLITUDE, SAMPLE_RATE, SoundSpec};

/// Fraction of the buffer used for the linear fade at each end
pub const FADE_FRACTION: f64 = 0.05;

/// A rendered tone ready for an output device
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    spec: Option<SoundSpec>,
    /// One `[left, right]` pair per frame
    frames: Vec<[i16; 2]>,
}

impl PcmBuffer {
    /// A buffer with no frames
    pub fn empty() -> Self {
        Self {
            spec: None,
            frames: Vec::new(),
        }
    }

    /// Tone this buffer was rendered from, if any
    pub fn spec(&self) -> Option<SoundSpec> {
        self.spec
    }

    pub fn frames(&self) -> &[[i16; 2]] {
        &self.frames
    }

    /// Number of frames (samples per channel)
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    pub fn channels(&self) -> u16 {
        CHANNELS
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> u16 {
        self.frames
            .iter()
            .map(|[l, _]| l.unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// Samples interleaved L R L R ...
    pub fn interleaved(&self) -> Vec<i16> {
        self.frames.iter().flat_map(|&[l, r]| [l, r]).collect()
    }

    /// One channel as floats in [-1, 1]
    pub fn channel_f32(&self, channel: usize) -> Vec<f32> {
        let channel = channel.min(1);
        self.frames
            .iter()
            .map(|frame| frame[channel] as f32 / MAX_AMPLITUDE)
            .collect()
    }
}

/// Render `spec` as a faded sine tone.
///
/// Length is `round(duration_s * 22050)` frames; amplitude is `volume * i16::MAX`.
/// The first and last 5% of frames ramp linearly to avoid clicks.
pub fn synthesize(spec: SoundSpec) -> PcmBuffer {
    let len = spec.frame_count();
    let fade_len = ((len as f64 * FADE_FRACTION).round() as usize).max(1);
    let amplitude = spec.volume() as f64 * MAX_AMPLITUDE as f64;
    let step = TAU * spec.frequency_hz() as f64 / SAMPLE_RATE as f64;

    let frames = (0..len)
        .map(|i| {
            let from_end = len - 1 - i;
            let envelope = (i.min(from_end) as f64 / fade_len as f64).min(1.0);
            let sample = (amplitude * envelope * (step * i as f64).sin()).round() as i16;
            [sample, sample]
        })
        .collect();

    PcmBuffer {
        spec: Some(spec),
        frames,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_length_matches_duration() {
        let buf = synthesize(SoundSpec::new(600, 0.1, 0.05));
        assert_eq!(buf.len(), 2205);
        assert_eq!(buf.sample_rate(), 22050);
        assert_eq!(buf.channels(), 2);
    }

    #[test]
    fn test_channels_identical() {
        let buf = synthesize(SoundSpec::new(1200, 0.15, 0.1));
        assert!(buf.frames().iter().all(|[l, r]| l == r));
        assert_eq!(buf.interleaved().len(), buf.len() * 2);
    }

    #[test]
    fn test_fades_start_and_end_silent() {
        let buf = synthesize(SoundSpec::new(200, 0.2, 1.0));
        assert_eq!(buf.frames()[0], [0, 0]);
        assert_eq!(buf.frames()[buf.len() - 1], [0, 0]);
        // Past the fade-in the tone reaches near full scale
        assert!(buf.peak() > 32000);
    }

    #[test]
    fn test_silent_at_zero_volume() {
        let buf = synthesize(SoundSpec::new(440, 0.3, 0.0));
        assert_eq!(buf.peak(), 0);
        assert!(!buf.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let spec = SoundSpec::new(800, 0.3, 0.1);
        assert_eq!(synthesize(spec), synthesize(spec));
    }

    proptest! {
        #[test]
        fn prop_length_tracks_duration(
            freq in 1u32..5000,
            duration in 0.001f32..2.0,
            volume in 0.0f32..=1.0,
        ) {
            let buf = synthesize(SoundSpec::new(freq, duration, volume));
            let expected = (duration as f64 * 22050.0).round() as i64;
            prop_assert!((buf.len() as i64 - expected).abs() <= 1);
        }

        #[test]
        fn prop_peak_monotonic_in_volume(
            freq in 20u32..4000,
            duration in 0.01f32..0.5,
            a in 0.0f32..=1.0,
            b in 0.0f32..=1.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let quiet = synthesize(SoundSpec::new(freq, duration, lo));
            let loud = synthesize(SoundSpec::new(freq, duration, hi));
            prop_assert!(quiet.peak() <= loud.peak());
        }
    }
}
