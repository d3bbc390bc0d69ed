//! Browser output using the Web Audio API

use web_sys::{AudioContext, AudioContextState, GainNode};

use super::{AudioDevice, AudioError, PcmBuffer};

pub struct WebAudioDevice {
    ctx: AudioContext,
    gain: GainNode,
}

impl WebAudioDevice {
    pub fn open() -> Result<Self, AudioError> {
        // May fail outside a secure context
        let ctx = AudioContext::new()
            .map_err(|e| AudioError::Unavailable(format!("AudioContext: {e:?}")))?;
        let gain = ctx
            .create_gain()
            .map_err(|e| AudioError::Unavailable(format!("GainNode: {e:?}")))?;
        gain.connect_with_audio_node(&ctx.destination())
            .map_err(|e| AudioError::Unavailable(format!("connect: {e:?}")))?;
        Ok(Self { ctx, gain })
    }

    fn try_play(&self, buffer: &PcmBuffer) -> Result<(), AudioError> {
        let fail = |e| AudioError::Playback(format!("{e:?}"));

        // Browsers suspend the context until a user gesture
        if self.ctx.state() == AudioContextState::Suspended {
            let _ = self.ctx.resume();
        }

        let audio = self
            .ctx
            .create_buffer(
                u32::from(buffer.channels()),
                buffer.len() as u32,
                buffer.sample_rate() as f32,
            )
            .map_err(fail)?;
        for channel in 0..buffer.channels() {
            let mut samples = buffer.channel_f32(channel as usize);
            audio
                .copy_to_channel(&mut samples, i32::from(channel))
                .map_err(fail)?;
        }

        let source = self.ctx.create_buffer_source().map_err(fail)?;
        source.set_buffer(Some(&audio));
        source.connect_with_audio_node(&self.gain).map_err(fail)?;
        source.start().map_err(fail)?;
        Ok(())
    }
}

impl AudioDevice for WebAudioDevice {
    fn play(&mut self, buffer: &PcmBuffer) {
        if buffer.is_empty() {
            return;
        }
        if let Err(e) = self.try_play(buffer) {
            log::debug!("{e}");
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.gain.gain().set_value(volume.clamp(0.0, 1.0));
    }

    fn is_available(&self) -> bool {
        true
    }
}
