//! Garbage collector core for a log-structured flash filesystem.
//!
//! This crate implements the victim-selection and reclamation machinery
//! that keeps a log-structured store writable: an adaptive sleep
//! controller, a pluggable cost-based victim selector, separate node- and
//! data-segment reclaimers, the checkpoint-retry handshake between them,
//! and a background driver tying the pieces into a cooperative worker
//! loop. It does not implement an on-disk format, a writeback pipeline, or
//! the actual block copy -- those live with whatever storage stack
//! supplies the collaborator traits in [`collab`].
//!
//! [`context::GcContext`] is the handle threaded through every module;
//! construct one from concrete implementations of the traits in
//! [`collab`] and a [`config::GcConfig`], then drive it through either
//! [`reclaim::f2fs_gc`] (foreground, blocking) or [`driver::run`]
//! (background worker thread).

pub mod bitset;
pub mod collab;
pub mod config;
pub mod context;
pub mod datareclaim;
pub mod dirty;
pub mod driver;
pub mod error;
pub mod manager;
pub mod nodereclaim;
pub mod reclaim;
pub mod sit;
pub mod sleep;
pub mod stats;
pub mod status;
pub mod summary;
pub mod sync;
#[cfg(test)]
pub mod testkit;
pub mod types;
pub mod victim;

pub use context::GcContext;
pub use error::{Errno, Error, Result};
pub use manager::GcManager;
pub use status::{GcCycleStatus, ReclaimStatus};
