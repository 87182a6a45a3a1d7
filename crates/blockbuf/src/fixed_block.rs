// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::Block;

/// A block over a caller-supplied region of memory that the block does not own.
///
/// The whole region is the block's capacity. The addressable length starts out equal to the
/// capacity and can be shrunk (or grown back) via [`set_len()`][Self::set_len], which is useful
/// when only part of a receive buffer was filled.
///
/// # Examples
///
/// ```
/// use blockbuf::{Block, FixedBlock};
///
/// let mut storage = *b"hello";
/// let mut block = FixedBlock::new(&mut storage);
///
/// assert_eq!(block.len(), 5);
/// assert_eq!(block.get(1), Some(&b'e'));
///
/// block.copy_from_slice(0, b"J");
/// assert_eq!(block.data(), b"Jello");
/// ```
#[derive(Debug, Default)]
pub struct FixedBlock<'a> {
    data: &'a mut [u8],
    len: usize,
}

impl<'a> FixedBlock<'a> {
    /// Creates a block over `data`, with both length and capacity equal to `data.len()`.
    #[must_use]
    pub fn new(data: &'a mut [u8]) -> Self {
        let len = data.len();
        Self { data, len }
    }

    /// Replaces the region the block refers to, resetting length and capacity to `data.len()`.
    pub fn set_data(&mut self, data: &'a mut [u8]) {
        self.len = data.len();
        self.data = data;
    }

    /// Sets the number of addressable bytes.
    ///
    /// # Panics
    ///
    /// Panics if `len` is greater than the capacity of the block.
    pub fn set_len(&mut self, len: usize) {
        assert!(
            len <= self.data.len(),
            "block length {len} exceeds block capacity {}",
            self.data.len()
        );

        self.len = len;
    }

    /// The addressable bytes of the block.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        leaf_data(self.data, self.len)
    }

    /// The addressable bytes of the block, mutably.
    #[must_use]
    pub fn data_mut(&mut self) -> &mut [u8] {
        leaf_data_mut(self.data, self.len)
    }
}

impl Block for FixedBlock<'_> {
    fn len(&self) -> usize {
        self.len
    }

    fn max_len(&self) -> usize {
        self.data.len()
    }

    fn get(&self, index: usize) -> Option<&u8> {
        self.data().get(index)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut u8> {
        self.data_mut().get_mut(index)
    }

    fn copy_to_slice(&self, index: usize, dst: &mut [u8]) {
        copy_out(self.data(), index, dst);
    }

    fn copy_from_slice(&mut self, index: usize, src: &[u8]) {
        copy_in(self.data_mut(), index, src);
    }
}

// The leaf helpers below are shared by every block type that is backed by a single
// contiguous region. `len` never exceeds the region, which every leaf guarantees on
// construction and in its setters.

pub(crate) fn leaf_data(region: &[u8], len: usize) -> &[u8] {
    region.get(..len).unwrap_or(region)
}

pub(crate) fn leaf_data_mut(region: &mut [u8], len: usize) -> &mut [u8] {
    let len = len.min(region.len());
    &mut region[..len]
}

/// Copies as many bytes as are available in `data` past `index` into `dst`, up to `dst.len()`.
pub(crate) fn copy_out(data: &[u8], index: usize, dst: &mut [u8]) {
    let Some(available) = data.get(index..) else {
        return;
    };

    let count = available.len().min(dst.len());
    dst[..count].copy_from_slice(&available[..count]);
}

/// Copies as many bytes of `src` as fit into `data` past `index`.
pub(crate) fn copy_in(data: &mut [u8], index: usize, src: &[u8]) {
    let Some(available) = data.get_mut(index..) else {
        return;
    };

    let count = available.len().min(src.len());
    available[..count].copy_from_slice(&src[..count]);
}
