//! Type class traits for functional programming abstractions.
//!
//! This module provides the type classes that [`crate::persistent::PersistentDeque`]
//! participates in:
//!
//! - [`Functor`]: Mapping over container values
//! - [`FunctorMut`]: Mapping with mutable functions for multi-element containers
//! - [`Foldable`]: Folding over structures to produce summary values
//! - [`Semigroup`]: Associative binary operations
//! - [`Monoid`]: Semigroup with identity element
//!
//! ## Higher-Kinded Types Emulation
//!
//! Rust does not have native support for higher-kinded types (HKT).
//! This library uses Generic Associated Types (GAT) to emulate HKT
//! behavior through [`TypeConstructor`], allowing traits like `Functor`
//! to be defined generically.
//!
//! # Examples
//!
//! ## Using Semigroup and Monoid
//!
//! ```rust
//! use dequers::persistent::PersistentDeque;
//! use dequers::typeclass::{Monoid, Semigroup};
//!
//! let left: PersistentDeque<i32> = (1..=3).collect();
//! let right: PersistentDeque<i32> = (4..=6).collect();
//!
//! let combined = left.combine(right);
//! assert_eq!(combined.len(), 6);
//!
//! let empty: PersistentDeque<i32> = PersistentDeque::empty();
//! assert!(Monoid::is_empty_value(&empty));
//! ```
//!
//! ## Using Foldable
//!
//! ```rust
//! use dequers::persistent::PersistentDeque;
//! use dequers::typeclass::Foldable;
//!
//! let deque: PersistentDeque<i32> = (1..=5).collect();
//! let sum = deque.fold_left(0, |accumulator, element| accumulator + element);
//! assert_eq!(sum, 15);
//! ```

mod foldable;
mod functor;
mod higher;
mod monoid;
mod semigroup;

pub use foldable::Foldable;
pub use functor::{Functor, FunctorMut};
pub use higher::TypeConstructor;
pub use monoid::Monoid;
pub use semigroup::Semigroup;
