//! # radixvec
//!
//! A persistent (immutable) vector based on a radix balanced tree.
//!
//! ## Overview
//!
//! [`RadixVector`] is a 32-way branching trie with a tail buffer, in the
//! tradition of Clojure's `PersistentVector` and Scala's `Vector`. Every
//! operation that would modify the vector instead returns a new handle;
//! the old handle stays valid and unchanged. Structural sharing keeps the
//! cost of this persistence low:
//!
//! - O(log32 N) random access and update (effectively O(1) in practice)
//! - amortized O(1) append via the tail buffer
//! - O(N) bulk construction from iterators and slices
//! - O(N) iteration over leaf-array blocks
//!
//! ## Example
//!
//! ```rust
//! use radixvec::RadixVector;
//!
//! let vector: RadixVector<i32> = (0..100).collect();
//! assert_eq!(vector.len(), 100);
//! assert_eq!(vector.get(50), Ok(&50));
//!
//! // Structural sharing: the original vector is preserved
//! let updated = vector.set(50, 999).unwrap();
//! assert_eq!(vector.get(50), Ok(&50));
//! assert_eq!(updated.get(50), Ok(&999));
//! ```
//!
//! ## Feature Flags
//!
//! - `arc`: share tree nodes with `Arc` instead of `Rc`, making the vector
//!   `Send + Sync` so handles can cross thread boundaries.
//! - `serde`: serialize and deserialize vectors as plain sequences.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

// =============================================================================
// Shared Pointer Type Alias
// =============================================================================

/// Reference-counted smart pointer used for tree nodes.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type Shared<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type Shared<T> = std::rc::Rc<T>;

mod error;
mod vector;

pub use error::VectorError;
pub use vector::RadixVector;
pub use vector::RadixVectorIntoIterator;
pub use vector::RadixVectorIterator;

// =============================================================================
// Tests
// =============================================================================
