// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;

/// A region of bytes that can be addressed by logical index.
///
/// This is the capability shared by every block type in this crate: the leaf blocks that
/// wrap a single contiguous region of memory ([`FixedBlock`][1], [`DynamicBlock`][2]) and the
/// composite [`BlockCollection`][3] that stitches any number of other blocks together.
///
/// Because a composite is itself a block, composites can be nested arbitrarily.
///
/// # Out-of-range access
///
/// Indexed access reports out-of-range positions via `None`. The bulk copy methods never
/// fail - they copy as many bytes as the block can supply or accept starting at `index`
/// and silently ignore the rest. Use the strict variants on [`BlockCollection`][3] when the
/// caller needs to know about a shortfall.
///
/// [1]: crate::FixedBlock
/// [2]: crate::DynamicBlock
/// [3]: crate::BlockCollection
pub trait Block: Debug {
    /// The number of bytes addressable through the block.
    ///
    /// The length must not change while a [`BlockCollection`][crate::BlockCollection] borrows
    /// the block. A collection that observes a changed length rebuilds its lookup window
    /// instead of failing, but its own [`len()`][Self::len] keeps reporting the sum taken
    /// on append.
    #[must_use]
    fn len(&self) -> usize;

    /// The logical position at which the block's data starts.
    ///
    /// All block types in this crate start at zero.
    #[must_use]
    fn offset(&self) -> usize {
        0
    }

    /// The number of bytes of capacity reserved by the block.
    #[must_use]
    fn max_len(&self) -> usize;

    /// Whether the block addresses zero bytes.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// References the byte at `index`, or `None` if `index` is not less than [`len()`][Self::len].
    #[must_use]
    fn get(&self, index: usize) -> Option<&u8>;

    /// Mutably references the byte at `index`, or `None` if `index` is not less than
    /// [`len()`][Self::len].
    #[must_use]
    fn get_mut(&mut self, index: usize) -> Option<&mut u8>;

    /// Copies bytes starting at logical position `index` into `dst`.
    ///
    /// Copies `dst.len()` bytes if the block holds that many bytes past `index`. Otherwise only
    /// the bytes up to the end of the block are copied and the remainder of `dst` is untouched.
    fn copy_to_slice(&self, index: usize, dst: &mut [u8]);

    /// Copies the bytes of `src` into the block starting at logical position `index`.
    ///
    /// Bytes of `src` that would land past the end of the block are ignored.
    fn copy_from_slice(&mut self, index: usize, src: &[u8]);
}
