//! Vigil-State: document persistence for the Vigil engine
//!
//! This crate provides the persistence layer for the integrity and quarantine
//! engine. Every piece of state (integrity baseline, pending candidates,
//! reactivation list, move history, reports) is one logical document stored
//! at a path.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: whole-document writes and forgiving reads.
//!
//! ## Key Components
//!
//! - `StateStore`: async read/write of raw documents by path
//! - `JsonFileStore`: filesystem backend with temp-file + rename writes
//! - `MemoryStateStore`: in-memory fake for tests
//! - `read_json` / `write_json` / `read_or_default`: typed helpers

mod error;
pub mod fakes;
mod fs_store;
pub mod storage_traits;

pub use error::StateError;
pub use fs_store::JsonFileStore;
pub use storage_traits::{read_json, read_or_default, write_json, write_text, StateResult, StateStore};
