//! Concrete narration players for the terminal reader.

use anyhow::Result;
use fairytale_core::config::AppConfig;
use fairytale_core::playback::{Playback, SilentPlayback};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// Pick the player for this build and configuration.
pub fn player_for(config: &AppConfig) -> Box<dyn Playback> {
    if !config.audio_enabled {
        info!("Narration disabled in config");
        return Box::new(SilentPlayback);
    }
    #[cfg(feature = "rodio-playback")]
    {
        Box::new(rodio_player::RodioPlayback::new(config.volume))
    }
    #[cfg(not(feature = "rodio-playback"))]
    {
        info!("Built without rodio-playback; narration commands are only logged");
        Box::new(LoggingPlayback::default())
    }
}

/// Wall-clock position within the current track.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlayClock {
    offset: Duration,
    resumed_at: Option<Instant>,
}

impl PlayClock {
    pub fn started_at(offset: Duration) -> Self {
        Self {
            offset,
            resumed_at: Some(Instant::now()),
        }
    }

    pub fn position(&self) -> Duration {
        self.offset + self.resumed_at.map_or(Duration::ZERO, |at| at.elapsed())
    }

    pub fn pause(&mut self) {
        self.offset = self.position();
        self.resumed_at = None;
    }

    pub fn resume(&mut self) {
        if self.resumed_at.is_none() {
            self.resumed_at = Some(Instant::now());
        }
    }

    /// Move by `step` and return the new position; never before the start.
    pub fn seek(&mut self, step: Duration, forward: bool) -> Duration {
        let here = self.position();
        let target = if forward {
            here + step
        } else {
            here.saturating_sub(step)
        };
        self.offset = target;
        if self.resumed_at.is_some() {
            self.resumed_at = Some(Instant::now());
        }
        target
    }
}

/// Player that only logs what it was asked to do.
#[derive(Debug, Default)]
#[cfg_attr(feature = "rodio-playback", allow(dead_code))]
pub struct LoggingPlayback {
    clock: Option<PlayClock>,
}

impl Playback for LoggingPlayback {
    fn play(&mut self, path: &Path, start: Duration) -> Result<()> {
        info!(path = %path.display(), from_secs = start.as_secs(), "Play narration");
        self.clock = Some(PlayClock::started_at(start));
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if let Some(clock) = self.clock.as_mut() {
            clock.pause();
            info!(at_secs = clock.position().as_secs(), "Pause narration");
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        if let Some(clock) = self.clock.as_mut() {
            clock.resume();
            info!(at_secs = clock.position().as_secs(), "Resume narration");
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.clock.take().is_some() {
            info!("Stop narration");
        }
        Ok(())
    }

    fn seek(&mut self, offset: Duration, forward: bool) -> Result<()> {
        if let Some(clock) = self.clock.as_mut() {
            let target = clock.seek(offset, forward);
            info!(to_secs = target.as_secs(), "Seek narration");
        }
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        info!(volume, "Set narration volume");
        Ok(())
    }

    fn position(&self) -> Option<Duration> {
        self.clock.map(|clock| clock.position())
    }
}

#[cfg(feature = "rodio-playback")]
mod rodio_player {
    use super::PlayClock;
    use anyhow::{Context, Result, anyhow};
    use fairytale_core::playback::Playback;
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
    use std::fs::File;
    use std::io::BufReader;
    use std::path::Path;
    use std::time::Duration;
    use tracing::{debug, info};

    struct Output {
        _stream: OutputStream,
        handle: OutputStreamHandle,
    }

    /// Plays one track at a time through the default output device. The
    /// device is opened on first use so a machine without one can still read.
    pub struct RodioPlayback {
        volume: f32,
        output: Option<Output>,
        sink: Option<Sink>,
        clock: PlayClock,
    }

    impl RodioPlayback {
        pub fn new(volume: f32) -> Self {
            Self {
                volume: volume.clamp(0.0, 2.0),
                output: None,
                sink: None,
                clock: PlayClock::default(),
            }
        }

        fn handle(&mut self) -> Result<&OutputStreamHandle> {
            if self.output.is_none() {
                let (stream, handle) =
                    OutputStream::try_default().context("Opening audio output")?;
                self.output = Some(Output {
                    _stream: stream,
                    handle,
                });
            }
            self.output
                .as_ref()
                .map(|output| &output.handle)
                .ok_or_else(|| anyhow!("Audio output unavailable"))
        }
    }

    impl Playback for RodioPlayback {
        fn play(&mut self, path: &Path, start: Duration) -> Result<()> {
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
            let file = File::open(path)
                .with_context(|| format!("Failed to open narration {}", path.display()))?;
            let source = Decoder::new(BufReader::new(file))
                .with_context(|| format!("Failed to decode narration {}", path.display()))?;
            let volume = self.volume;
            let sink = Sink::try_new(self.handle()?).context("Creating sink")?;
            sink.set_volume(volume);
            sink.append(source);
            if !start.is_zero() {
                sink.try_seek(start).map_err(|err| {
                    anyhow!("Resume at {}s failed: {err:?}", start.as_secs())
                })?;
            }
            sink.play();
            info!(path = %path.display(), from_secs = start.as_secs(), "Started narration");
            self.sink = Some(sink);
            self.clock = PlayClock::started_at(start);
            Ok(())
        }

        fn pause(&mut self) -> Result<()> {
            if let Some(sink) = &self.sink {
                debug!("Pausing playback");
                sink.pause();
                self.clock.pause();
            }
            Ok(())
        }

        fn resume(&mut self) -> Result<()> {
            if let Some(sink) = &self.sink {
                debug!("Resuming playback");
                sink.play();
                self.clock.resume();
            }
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            if let Some(sink) = self.sink.take() {
                debug!("Stopping playback");
                sink.stop();
            }
            self.clock = PlayClock::default();
            Ok(())
        }

        fn seek(&mut self, offset: Duration, forward: bool) -> Result<()> {
            let Some(sink) = &self.sink else {
                return Ok(());
            };
            let target = self.clock.seek(offset, forward);
            sink.try_seek(target)
                .map_err(|err| anyhow!("Seek to {}s failed: {err:?}", target.as_secs()))?;
            debug!(to_secs = target.as_secs(), "Seeked narration");
            Ok(())
        }

        fn set_volume(&mut self, volume: f32) -> Result<()> {
            self.volume = volume.clamp(0.0, 2.0);
            if let Some(sink) = &self.sink {
                sink.set_volume(self.volume);
            }
            debug!(volume = self.volume, "Volume set");
            Ok(())
        }

        fn position(&self) -> Option<Duration> {
            self.sink.as_ref().map(|_| self.clock.position())
        }
    }
}
