//! Output-device backend built on rodio.
//!
//! Each handle owns one [`Sink`] on the shared output stream and plays a
//! short synthesized pop blip, so no clip asset ships with the crate. The
//! stream itself is not `Send`; callers keep it alive next to their event
//! loop and hand the backend only the stream handle.

use std::time::Duration;

use rodio::source::{SineWave, Source};
use rodio::{OutputStream, OutputStreamHandle, Sink};

use crate::{AudioBackend, AudioError, PlaybackHandle};

const POP_FREQUENCY_HZ: f32 = 740.0;
const POP_DURATION: Duration = Duration::from_millis(120);

/// Backend allocating sinks on the default output device.
pub struct RodioBackend {
    handle: OutputStreamHandle,
}

impl RodioBackend {
    /// Opens the default output device.
    ///
    /// The returned [`OutputStream`] must be kept alive for as long as any
    /// handle may play; dropping it silences every sink.
    pub fn open_default() -> Result<(OutputStream, Self), AudioError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|err| AudioError::Unavailable(err.to_string()))?;
        Ok((stream, Self { handle }))
    }
}

impl AudioBackend for RodioBackend {
    type Handle = RodioHandle;

    fn create_player(&self, volume: f32) -> Result<RodioHandle, AudioError> {
        let sink =
            Sink::try_new(&self.handle).map_err(|err| AudioError::CreateFailed(err.to_string()))?;
        sink.set_volume(volume);
        sink.pause();
        Ok(RodioHandle { sink })
    }
}

/// One reusable pop-sound voice.
pub struct RodioHandle {
    sink: Sink,
}

fn pop_blip() -> impl Source<Item = f32> + Send + 'static {
    SineWave::new(POP_FREQUENCY_HZ)
        .take_duration(POP_DURATION)
        .amplify(0.9)
}

impl PlaybackHandle for RodioHandle {
    fn start(&mut self) {
        self.sink.append(pop_blip());
        self.sink.play();
    }

    fn rewind(&mut self) {
        // Clears any leftover queue; the next start appends a fresh blip.
        self.sink.clear();
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}
