//! Error values reported by fallible vector operations.
//!
//! Errors here are pure values: an operation that fails leaves the input
//! vector untouched and fully usable.

use std::error::Error;
use std::fmt;

/// The error type for [`RadixVector`] operations.
///
/// [`RadixVector`]: crate::RadixVector
///
/// # Examples
///
/// ```rust
/// use radixvec::{RadixVector, VectorError};
///
/// let vector: RadixVector<i32> = (0..3).collect();
/// assert_eq!(
///     vector.get(10),
///     Err(VectorError::IndexOutOfRange { index: 10, length: 3 })
/// );
///
/// let empty: RadixVector<i32> = RadixVector::new();
/// assert_eq!(empty.pop().unwrap_err(), VectorError::EmptyVector);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorError {
    /// The requested index is not below the vector's length.
    ///
    /// Indices are never clamped; any access at or past `length` fails.
    IndexOutOfRange {
        /// The index that was requested.
        index: usize,
        /// The length of the vector at the time of the request.
        length: usize,
    },
    /// `pop` was called on a vector with no elements.
    EmptyVector,
}

impl fmt::Display for VectorError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { index, length } => write!(
                formatter,
                "index {index} out of range for vector of length {length}"
            ),
            Self::EmptyVector => formatter.write_str("cannot pop from an empty vector"),
        }
    }
}

impl Error for VectorError {}
