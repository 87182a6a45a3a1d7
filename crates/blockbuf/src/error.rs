// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// The result for fallible operations that use the [`Error`] type of this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An addressing error reported by the strict access methods of a block.
///
/// The legacy access methods ([`BlockCollection::byte_at()`][1] and the copy methods of
/// [`Block`][2]) never return this error - they hand out a sentinel byte or stop copying early.
/// The `try_*` variants report the same conditions through this type instead.
///
/// # Thread safety
///
/// This type is thread-safe.
///
/// [1]: crate::BlockCollection::byte_at
/// [2]: crate::Block
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A single byte was requested at a position past the end of the block.
    #[error("index {index} is out of range for a block of {len} bytes")]
    IndexOutOfRange {
        /// The logical index that was requested.
        index: usize,

        /// The logical length of the block at the time of the request.
        len: usize,
    },

    /// A bulk copy would have touched bytes past the end of the block.
    #[error("copying {count} bytes at index {index} is out of range for a block of {len} bytes")]
    RangeOutOfBounds {
        /// The logical index at which the copy was to start.
        index: usize,

        /// The number of bytes that were to be copied.
        count: usize,

        /// The logical length of the block at the time of the request.
        len: usize,
    },
}

impl Error {
    pub(crate) const fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    pub(crate) const fn range_out_of_bounds(index: usize, count: usize, len: usize) -> Self {
        Self::RangeOutOfBounds { index, count, len }
    }
}

/// Checks that `count` bytes starting at `index` fit inside a block of `len` bytes.
pub(crate) fn check_range(index: usize, count: usize, len: usize) -> Result<()> {
    match index.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => Err(Error::range_out_of_bounds(index, count, len)),
    }
}
