//! Native output through rodio
//!
//! Each effect gets its own detached sink, so overlapping effects are mixed
//! by rodio and `play` never waits for anything.

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};

use super::{AudioDevice, AudioError, PcmBuffer};

pub struct RodioDevice {
    /// Output stream (must be kept alive)
    _stream: OutputStream,
    handle: OutputStreamHandle,
    volume: f32,
}

impl RodioDevice {
    pub fn open() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| AudioError::Unavailable(format!("no output device: {e}")))?;
        log::info!("Rodio output stream opened");
        Ok(Self {
            _stream: stream,
            handle,
            volume: 1.0,
        })
    }

    fn try_play(&self, buffer: &PcmBuffer) -> Result<(), AudioError> {
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| AudioError::Playback(format!("failed to create sink: {e}")))?;
        sink.set_volume(self.volume);
        sink.append(SamplesBuffer::new(
            buffer.channels(),
            buffer.sample_rate(),
            buffer.interleaved(),
        ));
        sink.detach();
        Ok(())
    }
}

impl AudioDevice for RodioDevice {
    fn play(&mut self, buffer: &PcmBuffer) {
        if buffer.is_empty() || self.volume <= 0.0 {
            return;
        }
        if let Err(e) = self.try_play(buffer) {
            log::debug!("{e}");
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn is_available(&self) -> bool {
        true
    }
}
