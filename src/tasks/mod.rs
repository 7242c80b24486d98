//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Autosave: Writes a cache snapshot at configured intervals
//!
//! Expired entries are not swept in the background; they are removed lazily.

mod autosave;

pub use autosave::spawn_autosave_task;
