//! Herakles Process Explorer Library
//!
//! Point-in-time process snapshots for Linux, read from procfs: per-process
//! memory, threads, architecture, elevation and loaded modules, plus
//! heuristic classification of kernel/pseudo processes, game engines and
//! anti-tamper protections.
//!
//! # Features
//!
//! - **Snapshot building**: every enumerated process gets a record, even when
//!   inspection is denied
//! - **Data-driven classification**: ordered signature rules, extendable from
//!   a TOML file
//! - **Poll-driven refresh**: a scheduler that never overlaps or queues builds
//! - **Presentation view**: case-insensitive filter, memory/name sort and a
//!   pid-based selection that survives refreshes
//!
//! # Usage
//!
//! ```rust
//! use herakles_process_explorer::{
//!     AppState, FixtureSource, ProcessRecord, SignatureSet, StateOptions,
//! };
//!
//! let mut game = ProcessRecord::partial(4242, "game.exe", 32);
//! game.modules = vec!["UnityPlayer.dll".into(), "EasyAntiCheat.dll".into()];
//!
//! let source = FixtureSource::new(vec![game]);
//! let mut app = AppState::new(
//!     Box::new(source),
//!     SignatureSet::builtin().clone(),
//!     StateOptions::default(),
//! );
//!
//! // The first poll always builds
//! assert!(app.refresh_if_due());
//!
//! for row in app.rows() {
//!     println!("{} {} {} {}", row.pid, row.name, row.engine, row.protection);
//! }
//! ```

pub mod error;
pub mod process;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod view;

// Re-export main types for convenience
pub use error::{FixtureError, ProcfsError};
pub use process::{
    Access, Architecture, Classification, FixtureSource, ProcessRecord, ProcessSource,
    ProcfsOptions, ProcfsSource, SignatureSet, TestData,
};
pub use scheduler::{RefreshPhase, RefreshScheduler};
pub use snapshot::{build_snapshot, BuildOptions, ScanStats, Snapshot};
pub use state::{AppState, StateOptions};
pub use view::{ProcessView, Selection, SortMode};
