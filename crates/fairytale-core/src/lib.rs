//! Core of the fairytale reader: the book model and text store, audio
//! matching, progress persistence, pagination and the navigation state
//! machine. Presentation and downloading live in other crates.

pub mod collection;
pub mod config;
pub mod library;
pub mod matcher;
pub mod navigation;
pub mod pagination;
pub mod playback;
pub mod progress;
pub mod session;
pub mod util;

pub use collection::{AudioTrack, Chapter, Collection, CollectionKind, StoryOrigin};
pub use navigation::{Effect, Input, Mode, Navigator, Snapshot};
pub use progress::{Position, ProgressRecord, ProgressStore};
pub use session::{Flow, ReaderSession};
