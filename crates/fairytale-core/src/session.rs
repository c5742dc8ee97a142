//! Reader session: owns the navigator and performs the effects it asks for.

use crate::collection::Collection;
use crate::config::AppConfig;
use crate::navigation::{Effect, Input, Navigator, Snapshot};
use crate::playback::{AudioCommand, Playback};
use crate::progress::{ProgressRecord, ProgressStore};
use std::collections::VecDeque;
use tracing::{error, info, warn};

/// Whether the control loop should keep going after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct ReaderSession<P: Playback> {
    navigator: Navigator,
    store: ProgressStore,
    player: P,
}

impl<P: Playback> ReaderSession<P> {
    pub fn new(library: Vec<Collection>, config: &AppConfig, player: P) -> Self {
        let store = ProgressStore::with_root(&config.progress_dir);
        let mut navigator = Navigator::new(library, config.layout(), config.seek_step())
            .with_volume(config.volume_percent());
        let ids: Vec<String> = navigator.library().iter().map(|c| c.id.clone()).collect();
        for id in ids {
            navigator.remember(store.load(&id));
        }
        info!(
            collections = navigator.library().len(),
            progress = %store.root().display(),
            "Reader session ready"
        );
        Self {
            navigator,
            store,
            player,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn snapshot(&self) -> Snapshot {
        self.navigator.snapshot()
    }

    /// The record of the open collection, if any.
    pub fn checkpoint(&self) -> Option<ProgressRecord> {
        self.navigator.record().cloned()
    }

    /// Feed one input through the navigator and run every resulting effect,
    /// including follow-up inputs such as loaded progress.
    pub fn handle(&mut self, input: Input) -> Flow {
        let mut queue: VecDeque<Effect> = self.navigator.reduce(input).into();
        let mut flow = Flow::Continue;
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::LoadProgress { collection_id } => {
                    let record = self.store.load(&collection_id);
                    queue.extend(self.navigator.reduce(Input::ProgressLoaded(record)));
                }
                Effect::SaveProgress(record) => {
                    if let Err(err) = self.store.save(&record) {
                        error!("Failed to save progress: {err:?}");
                    }
                }
                Effect::Audio(command) => {
                    // The playhead is gone once the player stops, so read it first.
                    let stopped_at = match command {
                        AudioCommand::Stop => self.player.position(),
                        _ => None,
                    };
                    if let Err(err) = self.player.apply(&command) {
                        warn!(command = ?command, "Playback failed: {err:?}");
                        self.navigator.audio_failed();
                    } else if let Some(at) = stopped_at {
                        queue.extend(self.navigator.reduce(Input::AudioStopped { at }));
                    }
                }
                Effect::Quit => flow = Flow::Quit,
            }
        }
        flow
    }
}
