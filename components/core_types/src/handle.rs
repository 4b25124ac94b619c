//! Stable identity tokens for reflected entities.
//!
//! Programs, types, members and objects are identified by a `HandleId`
//! instead of a memory address, so tables keyed by them never outlive or
//! pin the entity they describe.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a program, type, member or object.
///
/// # Examples
///
/// ```
/// use core_types::HandleId;
///
/// let a = HandleId::next();
/// let b = HandleId::next();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(u64);

impl HandleId {
    /// Allocate a fresh handle that has never been returned before.
    pub fn next() -> Self {
        HandleId(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for diagnostics.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
