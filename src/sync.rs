//! Small concurrency shim, mirroring the split the teacher crate makes in
//! its `os` module: a non-poisoning spin lock for hot, frequently-taken
//! state (segment entries, dirty seglists) and a std mutex/condvar pair for
//! the coordination the background worker and checkpoint handshake need.

pub use std::sync::Arc;
pub use std::sync::Condvar;
pub use std::sync::Mutex as CvarMutex;

pub use hashbrown::{HashMap, HashSet};
pub use spin::Mutex;
pub use spin::MutexGuard;
