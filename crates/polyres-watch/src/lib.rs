#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]

//! Path-mapping hot reload.
//!
//! Interactive sessions watch the project root for `tsconfig.json` /
//! `jsconfig.json` changes. Events go through a tokio channel to a single
//! consumer task that coalesces them, reloads from disk and swaps the
//! snapshot in the shared [`polyres_core::PathMappingStore`].
//!
//! Export sessions never watch; the pipeline loads the config once.

pub mod watcher;

pub use watcher::{start_path_mapping_watch, ConfigWatcher, WatchError, WatchEvent, WatchEventKind};
