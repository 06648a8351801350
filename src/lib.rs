//! # dequers
//!
//! A persistent (immutable) double-ended queue for Rust.
//!
//! ## Overview
//!
//! The crate provides [`persistent::PersistentDeque`], an ordered sequence
//! with amortized O(1) insertion and removal at both ends, O(1) length, and
//! O(log n) concatenation and slicing. Every operation returns a new logical
//! value; previous values remain valid and share structure with their
//! successors.
//!
//! Alongside the container, a small type class layer ([`typeclass`]) exposes
//! the functional-programming view of it: `Functor`, `Foldable`, `Semigroup`
//! and `Monoid`.
//!
//! ## Feature Flags
//!
//! - `arc`: use `Arc` instead of `Rc` for structural sharing (thread-safe)
//! - `serde`: `Serialize`/`Deserialize` support
//!
//! ## Example
//!
//! ```rust
//! use dequers::prelude::*;
//!
//! let deque: PersistentDeque<i32> = (1..=100).collect();
//! let doubled = deque.map(|x| x * 2);
//!
//! assert_eq!(deque.front(), Some(&1));      // original unchanged
//! assert_eq!(doubled.back(), Some(&200));
//! assert_eq!(deque.append(&doubled).len(), 200);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Note: Disabling redundant_closure_for_method_calls due to clippy 0.1.92 panic bug
#![allow(clippy::redundant_closure_for_method_calls)]
// Note: proptest generates large arrays in property tests
#![cfg_attr(test, allow(clippy::large_stack_arrays))]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use dequers::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
    pub use crate::typeclass::*;
}

pub mod persistent;
pub mod typeclass;
