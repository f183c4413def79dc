//! jaso core library — keeps filenames in a directory tree composed (NFC).
//!
//! Some operating systems and sync tools store filenames decomposed (NFD),
//! which splits Korean Hangul syllables into individual Jamo. `jaso-core`
//! watches a directory tree and renames any such entry to its composed
//! spelling. It has no UI of its own; a host shell supplies a
//! [`DirectoryPicker`] and an [`Alert`] sink.
//!
//! # Modules
//!
//! - [`normalize`] — the per-entry decision ([`decide`]) and rename ([`normalize_entry`]).
//! - [`tree`] — post-order subtree walk ([`TreeNormalizer`]).
//! - [`router`] — decoded filesystem events ([`FsEvent`]) and routing ([`EventRouter`]).
//! - [`session`] — one recursive watch with its worker and supervisor ([`WatchSession`]).
//! - [`slot`] — at most one live session ([`WatchSlot`], [`SessionManager`]).
//! - [`shell`] — collaborator traits the host implements.
//! - [`config`] — optional TOML tuning.
//! - [`error`] — unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod config;
pub mod error;
pub mod normalize;
pub mod router;
pub mod session;
pub mod shell;
pub mod slot;
pub mod tree;

pub use config::{Config, LogConfig, WatchConfig};
pub use error::{CoreError, CoreResult};
pub use normalize::{decide, nfc_string, normalize_entry, plan_entry, NormalizationDecision, Rename};
pub use router::{route, EventRouter, FsEvent};
pub use session::{SessionState, WatchSession};
pub use shell::{Alert, AlertLevel, DirectoryPicker, LogAlert};
pub use slot::{SessionManager, WatchSlot};
pub use tree::{CancelToken, EntryFailure, NormalizeReport, TreeNormalizer, TreeOptions};
