//! Persistent (immutable) data structures.
//!
//! This module provides [`PersistentDeque`], an immutable double-ended queue
//! that uses structural sharing to minimize copying.
//!
//! # Structural Sharing
//!
//! Operations like pushing, popping, or concatenating create new versions
//! without copying the entire structure. Old versions remain valid and
//! unchanged:
//!
//! ```rust
//! use dequers::persistent::PersistentDeque;
//!
//! let deque = PersistentDeque::new()
//!     .push_back(1)
//!     .push_back(2)
//!     .push_back(3);
//!
//! let extended = deque.push_front(0);
//! assert_eq!(deque.len(), 3);     // Original unchanged
//! assert_eq!(extended.len(), 4);  // New deque
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Shared-ownership pointer used throughout the deque spine.
///
/// Every element and every interior spine node sits behind one of these, so
/// a push or pop copies a handful of pointers instead of the structure.
///
/// With the `arc` feature enabled this is `std::sync::Arc`, making deques
/// `Send + Sync` (for sendable element types) at the cost of atomic count
/// updates; by default it is `std::rc::Rc`.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod deque;

pub use deque::PersistentDeque;
pub use deque::PersistentDequeIntoIterator;
pub use deque::PersistentDequeIterator;

// =============================================================================
// Tests
// =============================================================================
