// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tracing::{Level, event};

use crate::fixed_block::{copy_in, copy_out, leaf_data, leaf_data_mut};
use crate::{AllocTraits, Allocator, Block, FixedBlock, GlobalAllocator};

/// A block that exclusively owns a heap buffer obtained from an [`Allocator`].
///
/// A `DynamicBlock` is either *unbound* (owns nothing, length zero) or *bound* (owns exactly
/// one buffer). The owned buffer is returned to the allocator exactly once: when the block is
/// dropped or when [`set_data()`][Self::set_data] replaces it, whichever comes first.
///
/// The addressable length may be smaller than the buffer; the remainder of the buffer is the
/// block's spare capacity as reported by [`max_len()`][Block::max_len].
///
/// # Examples
///
/// ```
/// use blockbuf::{Block, DynamicBlock};
///
/// let mut block = DynamicBlock::new(4);
/// block.copy_from_slice(0, b"abcd");
///
/// assert_eq!(block.len(), 4);
/// assert_eq!(block.data(), b"abcd");
///
/// // The previous buffer is released before the new one is adopted.
/// block.set_data(Some(Box::new(*b"xyz!")), 3);
/// assert_eq!(block.data(), b"xyz");
/// assert_eq!(block.max_len(), 4);
/// ```
#[derive(Debug)]
pub struct DynamicBlock<A: Allocator = GlobalAllocator> {
    buffer: Option<Box<[u8]>>,
    len: usize,
    allocator: A,
}

impl DynamicBlock {
    /// Allocates `size` bytes from the [`GlobalAllocator`] with default [`AllocTraits`].
    ///
    /// Both length and capacity of the new block are `size`.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self::with_allocator(size, GlobalAllocator)
    }

    /// Adopts a buffer previously obtained from the [`GlobalAllocator`] family without allocating.
    ///
    /// If `buffer` is `None`, the block is unbound and `size` is ignored.
    ///
    /// # Panics
    ///
    /// Panics if `size` is greater than the length of `buffer`.
    #[must_use]
    pub fn from_buffer(buffer: Option<Box<[u8]>>, size: usize) -> Self {
        Self::from_buffer_in(buffer, size, GlobalAllocator)
    }
}

impl<A: Allocator> DynamicBlock<A> {
    /// Allocates `size` bytes from `allocator` with default [`AllocTraits`].
    #[must_use]
    pub fn with_allocator(size: usize, allocator: A) -> Self {
        Self::with_allocator_and_traits(size, allocator, &AllocTraits::default())
    }

    /// Allocates `size` bytes from `allocator` using the provided [`AllocTraits`].
    #[must_use]
    pub fn with_allocator_and_traits(size: usize, allocator: A, traits: &AllocTraits) -> Self {
        let buffer = allocator.allocate(size, traits);

        event!(Level::TRACE, message = "dynamic block allocated", size);

        Self {
            buffer: Some(buffer),
            len: size,
            allocator,
        }
    }

    /// Adopts a buffer previously obtained from the same allocator family as `allocator`.
    ///
    /// If `buffer` is `None`, the block is unbound and `size` is ignored.
    ///
    /// # Panics
    ///
    /// Panics if `size` is greater than the length of `buffer`. The rejected buffer is returned
    /// to `allocator` first.
    #[must_use]
    pub fn from_buffer_in(buffer: Option<Box<[u8]>>, size: usize, allocator: A) -> Self {
        let mut block = Self {
            buffer: None,
            len: 0,
            allocator,
        };

        block.adopt(buffer, size);
        block
    }

    /// Releases the owned buffer (if any), then takes ownership of `buffer`.
    ///
    /// The old buffer is always released before the new one is adopted. Passing `None` leaves
    /// the block unbound.
    ///
    /// # Panics
    ///
    /// Panics if `size` is greater than the length of `buffer`. Both the old buffer and the
    /// rejected one have been returned to the allocator at that point and the block is unbound.
    pub fn set_data(&mut self, buffer: Option<Box<[u8]>>, size: usize) {
        self.release();
        self.adopt(buffer, size);
    }

    /// Does nothing.
    ///
    /// A dynamic block only ever adopts buffers from its own allocator family, so there is
    /// nothing meaningful to take over from a block that does not own its memory. The method
    /// exists so that code written against fixed blocks keeps compiling when switched over.
    #[cfg_attr(test, mutants::skip)] // Intentionally empty.
    pub fn set_block(&mut self, other: &FixedBlock<'_>) {
        _ = other;
    }

    /// Whether the block currently owns a buffer.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.buffer.is_some()
    }

    /// The addressable bytes of the block. Empty if the block is unbound.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.buffer.as_deref().map_or::<&[u8], _>(&[], |buffer| leaf_data(buffer, self.len))
    }

    /// The addressable bytes of the block, mutably. Empty if the block is unbound.
    #[must_use]
    pub fn data_mut(&mut self) -> &mut [u8] {
        match self.buffer.as_deref_mut() {
            Some(buffer) => leaf_data_mut(buffer, self.len),
            None => &mut [],
        }
    }

    /// The allocator that owned buffers are released to.
    #[must_use]
    pub const fn allocator(&self) -> &A {
        &self.allocator
    }

    fn adopt(&mut self, buffer: Option<Box<[u8]>>, size: usize) {
        debug_assert!(self.buffer.is_none(), "adopting over a bound block would leak its buffer");

        let Some(buffer) = buffer else {
            self.len = 0;
            return;
        };

        let capacity = buffer.len();

        if size > capacity {
            // The rejected buffer still belongs to the allocator family.
            self.allocator.free(buffer);
            #[expect(clippy::panic, reason = "oversized adoption is API misuse, documented under # Panics")]
            {
                panic!("block size {size} exceeds the length of the adopted buffer ({capacity})");
            }
        }

        event!(Level::TRACE, message = "dynamic block adopted buffer", size, capacity);

        self.len = size;
        self.buffer = Some(buffer);
    }

    fn release(&mut self) {
        self.len = 0;

        if let Some(buffer) = self.buffer.take() {
            event!(Level::TRACE, message = "dynamic block released buffer", capacity = buffer.len());

            self.allocator.free(buffer);
        }
    }
}

impl<A: Allocator> Drop for DynamicBlock<A> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<A: Allocator> Block for DynamicBlock<A> {
    fn len(&self) -> usize {
        self.data().len()
    }

    fn max_len(&self) -> usize {
        self.buffer.as_ref().map_or(0, |buffer| buffer.len())
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
