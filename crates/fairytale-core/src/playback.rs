//! Narration playback seam.
//!
//! The controller only decides *what* should happen to the narration; an
//! implementation of [`Playback`] owned by the presentation layer makes it
//! happen. Buffering and threads live entirely on that side.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCommand {
    /// Start `path` from `start`.
    Play { path: PathBuf, start: Duration },
    Pause,
    Resume,
    Stop,
    SeekForward(Duration),
    SeekBackward(Duration),
    /// Output level in percent; 100 is unchanged.
    SetVolume { percent: u32 },
}

/// What the controller believes the player is doing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AudioState {
    #[default]
    Idle,
    Playing(PathBuf),
    Paused(PathBuf),
}

impl AudioState {
    pub fn track(&self) -> Option<&Path> {
        match self {
            AudioState::Idle => None,
            AudioState::Playing(path) | AudioState::Paused(path) => Some(path),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, AudioState::Playing(_))
    }
}

pub trait Playback {
    fn play(&mut self, path: &Path, start: Duration) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    /// Move the playhead by `offset`, forwards when `forward` is set.
    fn seek(&mut self, offset: Duration, forward: bool) -> Result<()>;
    /// Scale output; 1.0 is unchanged.
    fn set_volume(&mut self, volume: f32) -> Result<()>;
    /// Playhead of the current track, if one is loaded.
    fn position(&self) -> Option<Duration>;

    fn apply(&mut self, command: &AudioCommand) -> Result<()> {
        match command {
            AudioCommand::Play { path, start } => self.play(path, *start),
            AudioCommand::Pause => self.pause(),
            AudioCommand::Resume => self.resume(),
            AudioCommand::Stop => self.stop(),
            AudioCommand::SeekForward(step) => self.seek(*step, true),
            AudioCommand::SeekBackward(step) => self.seek(*step, false),
            AudioCommand::SetVolume { percent } => self.set_volume(*percent as f32 / 100.0),
        }
    }
}

impl<P: Playback + ?Sized> Playback for Box<P> {
    fn play(&mut self, path: &Path, start: Duration) -> Result<()> {
        (**self).play(path, start)
    }

    fn pause(&mut self) -> Result<()> {
        (**self).pause()
    }

    fn resume(&mut self) -> Result<()> {
        (**self).resume()
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn seek(&mut self, offset: Duration, forward: bool) -> Result<()> {
        (**self).seek(offset, forward)
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        (**self).set_volume(volume)
    }

    fn position(&self) -> Option<Duration> {
        (**self).position()
    }
}

/// Player that does nothing; used when narration is disabled.
#[derive(Debug, Default)]
pub struct SilentPlayback;

impl Playback for SilentPlayback {
    fn play(&mut self, _path: &Path, _start: Duration) -> Result<()> {
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn seek(&mut self, _offset: Duration, _forward: bool) -> Result<()> {
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) -> Result<()> {
        Ok(())
    }

    fn position(&self) -> Option<Duration> {
        None
    }
}
