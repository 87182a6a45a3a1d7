// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::cell::Cell;
use std::iter::FusedIterator;
use std::mem;
use std::ops::{Index, IndexMut, Range};

use nm::{Event, Magnitude};
use smallvec::SmallVec;
use tracing::{Level, event};

use crate::error::check_range;
use crate::{Block, BlockReader, BlockWriter, Error, MAX_INLINE_BLOCKS, Result};

/// Out-of-range reads through [`Index`] observe this byte.
static OUT_OF_RANGE_BYTE: u8 = 0;

/// Presents an ordered sequence of blocks as one logically contiguous block.
///
/// The collection borrows its children; it never owns or releases them. Logical position 0 is
/// the first byte of the first child, followed by the rest of the first child, then the bytes
/// of the second child, and so on. Children of zero length are allowed and occupy no positions.
///
/// # Byte lookup
///
/// Indexed access remembers which child served the previous lookup (the [`CacheWindow`]) and
/// walks forward or backward one child at a time from there. Sequential and locally clustered
/// access therefore costs amortized O(1) per byte, while random access costs at most
/// O(number of children) per byte.
///
/// Because the window moves on every lookup, including lookups through `&self`, a collection
/// is not [`Sync`].
///
/// # Out-of-range access
///
/// Two families of access methods exist:
///
/// * The strict methods ([`get()`][Block::get], [`get_mut()`][Block::get_mut],
///   [`try_byte_at()`][Self::try_byte_at], [`try_copy_to_slice()`][Self::try_copy_to_slice] and
///   [`try_copy_from_slice()`][Self::try_copy_from_slice]) report out-of-range requests.
/// * The legacy methods ([`byte_at()`][Self::byte_at], indexing via `[]`, and the
///   [`Block`] copy methods) never fail. An out-of-range byte access yields a sentinel byte
///   that always reads as zero and discards whatever is written to it; bulk copies stop at
///   the end of the last child.
///
/// # Examples
///
/// ```
/// use blockbuf::{Block, BlockCollection, FixedBlock};
///
/// let mut head = *b"abcd";
/// let mut body = *b"efghij";
/// let mut tail = *b"kl";
///
/// let mut head = FixedBlock::new(&mut head);
/// let mut body = FixedBlock::new(&mut body);
/// let mut tail = FixedBlock::new(&mut tail);
///
/// let mut collection = BlockCollection::new(&mut head);
/// collection.push(&mut body);
/// collection.push(&mut tail);
///
/// assert_eq!(collection.len(), 12);
/// assert_eq!(collection[5], b'f');
/// assert_eq!(collection.get(12), None);
///
/// let mut dst = [0_u8; 5];
/// collection.copy_to_slice(3, &mut dst);
/// assert_eq!(&dst, b"defgh");
/// ```
#[derive(Debug)]
pub struct BlockCollection<'a> {
    blocks: SmallVec<[&'a mut dyn Block; MAX_INLINE_BLOCKS]>,

    /// Sum of the lengths of all children at the time they were appended.
    len: usize,

    max_len: usize,

    /// `None` only while the collection has no children.
    window: Cell<Option<CacheWindow>>,

    /// Handed out by `byte_at()` for out-of-range positions. Reset before every hand-out.
    sentinel: u8,
}

impl<'a> BlockCollection<'a> {
    /// Creates a collection with `first` as its only child.
    ///
    /// The cache window starts out covering `first`.
    #[must_use]
    pub fn new(first: &'a mut dyn Block) -> Self {
        let mut collection = Self::empty();
        collection.push(first);
        collection
    }

    /// Creates a collection without children, with storage for one child reference.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_capacity(1)
    }

    /// Creates a collection without children, with storage for `capacity` child references.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            blocks: SmallVec::with_capacity(capacity),
            len: 0,
            max_len: 0,
            window: Cell::new(None),
            sentinel: 0,
        }
    }

    /// Creates a collection from a sequence of children, in order.
    #[must_use]
    pub fn from_blocks<I>(blocks: I) -> Self
    where
        I: IntoIterator<Item = &'a mut dyn Block>,
    {
        let blocks = blocks.into_iter();

        let mut collection = Self::with_capacity(blocks.size_hint().0);
        blocks.for_each(|block| collection.push(block));
        collection
    }

    /// Appends a child to the end of the collection.
    ///
    /// Both the length and the capacity of the collection grow by the length of the child, and
    /// the child's bytes are immediately addressable. An established cache window is left
    /// where it is; appending never changes the range covered by existing children.
    ///
    /// # Panics
    ///
    /// Panics if the total length would exceed `usize::MAX`.
    pub fn push(&mut self, block: &'a mut dyn Block) {
        let block_len = block.len();

        self.len = self
            .len
            .checked_add(block_len)
            .expect("attempted to create a BlockCollection larger than usize::MAX bytes");
        self.max_len = self.max_len.saturating_add(block_len);

        if self.window.get().is_none() {
            debug_assert!(self.blocks.is_empty());

            self.window.set(Some(CacheWindow {
                position: 0,
                start: 0,
                end: block_len,
            }));
        }

        self.blocks.push(block);

        event!(
            Level::TRACE,
            message = "block appended",
            block_len,
            len = self.len,
            block_count = self.blocks.len()
        );
    }

    /// References the last child without removing it.
    ///
    /// The length and capacity of the collection are unaffected.
    #[must_use]
    pub fn peek_last(&self) -> Option<&(dyn Block + 'a)> {
        self.blocks.last().map(|block| &**block)
    }

    /// The number of children in the collection.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The child the most recent byte lookup was served from, if the collection has any children.
    #[must_use]
    pub fn cached_window(&self) -> Option<CacheWindow> {
        self.window.get()
    }

    /// Mutably references the byte at `index`, falling back to a sentinel byte when out of range.
    ///
    /// The sentinel is zeroed before it is handed out, so anything written to it is discarded
    /// by the next out-of-range access. Use [`try_byte_at()`][Self::try_byte_at] or
    /// [`get_mut()`][Block::get_mut] to detect out-of-range positions.
    ///
    /// Note that the returned reference only covers a single byte of a single child - it cannot
    /// be used to reach neighboring bytes that live in a different child.
    pub fn byte_at(&mut self, index: usize) -> &mut u8 {
        if let Some((position, local)) = self.locate(index)
            && let Some(byte) = self.blocks[position].get_mut(local)
        {
            return byte;
        }

        note_out_of_range(index, self.len);

        self.sentinel = 0;
        &mut self.sentinel
    }

    /// Mutably references the byte at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index` is not less than [`len()`][Block::len].
    pub fn try_byte_at(&mut self, index: usize) -> Result<&mut u8> {
        let len = self.len;
        self.get_mut(index).ok_or(Error::index_out_of_range(index, len))
    }

    /// References the byte at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index` is not less than [`len()`][Block::len].
    pub fn try_get(&self, index: usize) -> Result<&u8> {
        self.get(index).ok_or(Error::index_out_of_range(index, self.len))
    }

    /// Fills `dst` with the bytes starting at logical position `index`.
    ///
    /// Unlike [`copy_to_slice()`][Block::copy_to_slice], nothing is copied unless the whole
    /// range is available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RangeOutOfBounds`] if the collection holds fewer than `dst.len()` bytes
    /// past `index`.
    pub fn try_copy_to_slice(&self, index: usize, dst: &mut [u8]) -> Result<()> {
        check_range(index, dst.len(), self.len)?;
        self.copy_to_slice(index, dst);
        Ok(())
    }

    /// Writes all of `src` into the collection starting at logical position `index`.
    ///
    /// Unlike [`copy_from_slice()`][Block::copy_from_slice], nothing is written unless the whole
    /// range is available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RangeOutOfBounds`] if the collection holds fewer than `src.len()` bytes
    /// past `index`.
    pub fn try_copy_from_slice(&mut self, index: usize, src: &[u8]) -> Result<()> {
        check_range(index, src.len(), self.len)?;
        self.copy_from_slice(index, src);
        Ok(())
    }

    /// Iterates over the bytes of the collection in logical order.
    pub fn iter(&self) -> BlockCollectionBytes<'_, 'a> {
        BlockCollectionBytes::new(self)
    }

    /// Creates a [`std::io::Read`] adapter that reads the collection from the start.
    pub fn reader(&self) -> BlockReader<'_, Self> {
        BlockReader::new(self)
    }

    /// Creates a [`std::io::Write`] adapter that overwrites the collection from the start.
    pub fn writer(&mut self) -> BlockWriter<'_, Self> {
        BlockWriter::new(self)
    }

    /// Moves the cache window to the child covering `index` and returns the position of that
    /// child together with the offset of `index` inside it.
    ///
    /// Returns `None` if no child covers `index`. The window is then left on the first or last
    /// child, which it still describes correctly.
    ///
    /// If a child changed its length behind our back, the window no longer matches the
    /// children and is rebuilt by scanning from the first child.
    fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let window = self.window.get()?;

        let (window, steps) = self
            .walk(window, index)
            .unwrap_or_else(|| self.rebuild_window(index));

        if steps > 0 {
            self.window.set(Some(window));
            WINDOW_STEPS.with(|e| e.observe(steps));
        }

        window.contains(index).then(|| (window.position, index - window.start))
    }

    /// Walks `window` one child at a time toward `index`.
    ///
    /// Returns `None` if the window turns out to be inconsistent with the children.
    fn walk(&self, mut window: CacheWindow, index: usize) -> Option<(CacheWindow, usize)> {
        let current_len = self.blocks.get(window.position)?.len();

        if window.end.checked_sub(window.start) != Some(current_len) {
            return None;
        }

        let mut steps: usize = 0;

        if index < window.start {
            while window.position > 0 && index < window.start {
                window.position -= 1;
                window.end = window.start;
                window.start = window.start.checked_sub(self.blocks[window.position].len())?;
                steps += 1;
            }

            // The first child always starts at zero.
            if window.position == 0 && window.start != 0 {
                return None;
            }
        } else if index >= window.end {
            // Bounded by the last child. We never probe a position past the end.
            while window.position + 1 < self.blocks.len() && index >= window.end {
                window.position += 1;
                window.start = window.end;
                window.end = window.end.checked_add(self.blocks[window.position].len())?;
                steps += 1;
            }
        }

        Some((window, steps))
    }

    /// Derives the window for `index` from scratch, scanning the children from the first one.
    ///
    /// Stops on the child covering `index` or on the last child if none covers it.
    #[cold]
    fn rebuild_window(&self, index: usize) -> (CacheWindow, usize) {
        event!(Level::DEBUG, message = "cache window rebuilt", index, block_count = self.blocks.len());

        let mut window = CacheWindow {
            position: 0,
            start: 0,
            end: 0,
        };

        for (position, block) in self.blocks.iter().enumerate() {
            window = CacheWindow {
                position,
                start: window.end,
                end: window.end.saturating_add(block.len()),
            };

            if index < window.end {
                break;
            }
        }

        // Counts the children the scan visited.
        (window, window.position.saturating_add(1))
    }
}

fn note_out_of_range(index: usize, len: usize) {
    event!(Level::DEBUG, message = "out-of-range byte access", index, len);
    OUT_OF_RANGE.with(Event::observe_once);
}

impl Default for BlockCollection<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> Extend<&'a mut dyn Block> for BlockCollection<'a> {
    fn extend<I: IntoIterator<Item = &'a mut dyn Block>>(&mut self, iter: I) {
        iter.into_iter().for_each(|block| self.push(block));
    }
}

impl Block for BlockCollection<'_> {
    fn len(&self) -> usize {
        self.len
    }

    fn max_len(&self) -> usize {
        self.max_len
    }

    fn get(&self, index: usize) -> Option<&u8> {
        let (position, local) = self.locate(index)?;
        self.blocks[position].get(local)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut u8> {
        let (position, local) = self.locate(index)?;
        self.blocks[position].get_mut(local)
    }

    /// Copies bytes starting at logical position `index` into `dst`, across as many children
    /// as necessary.
    ///
    /// Children are always scanned from the first one; the cache window is neither consulted
    /// nor moved.
    fn copy_to_slice(&self, index: usize, dst: &mut [u8]) {
        let mut index = index;
        let mut dst = dst;

        for block in &self.blocks {
            if dst.is_empty() {
                break;
            }

            let block_len = block.len();

            if index < block_len {
                let count = (block_len - index).min(dst.len());
                let (head, tail) = mem::take(&mut dst).split_at_mut(count);

                block.copy_to_slice(index, head);

                dst = tail;
                index = 0;
            } else {
                index -= block_len;
            }
        }
    }

    /// Copies the bytes of `src` into the collection starting at logical position `index`,
    /// across as many children as necessary.
    ///
    /// Children are always scanned from the first one; the cache window is neither consulted
    /// nor moved.
    fn copy_from_slice(&mut self, index: usize, src: &[u8]) {
        let mut index = index;
        let mut src = src;

        for block in &mut self.blocks {
            if src.is_empty() {
                break;
            }

            let block_len = block.len();

            if index < block_len {
                let count = (block_len - index).min(src.len());
                let (head, tail) = src.split_at(count);

                block.copy_from_slice(index, head);

                src = tail;
                index = 0;
            } else {
                index -= block_len;
            }
        }
    }
}

/// Alias of [`BlockCollection::get()`][Block::get] that yields a zero byte when out of range.
impl Index<usize> for BlockCollection<'_> {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        self.get(index).unwrap_or_else(|| {
            note_out_of_range(index, self.len);
            &OUT_OF_RANGE_BYTE
        })
    }
}

/// Alias of [`BlockCollection::byte_at()`].
impl IndexMut<usize> for BlockCollection<'_> {
    fn index_mut(&mut self, index: usize) -> &mut u8 {
        self.byte_at(index)
    }
}

impl PartialEq<&[u8]> for BlockCollection<'_> {
    fn eq(&self, other: &&[u8]) -> bool {
        // We do not care about the structure, only the contents.
        self.len() == other.len() && self.iter().eq(other.iter().copied())
    }
}

impl PartialEq<BlockCollection<'_>> for &[u8] {
    fn eq(&self, other: &BlockCollection<'_>) -> bool {
        other.eq(self)
    }
}

impl<const LEN: usize> PartialEq<&[u8; LEN]> for BlockCollection<'_> {
    fn eq(&self, other: &&[u8; LEN]) -> bool {
        self.eq(&other.as_slice())
    }
}

impl<const LEN: usize> PartialEq<BlockCollection<'_>> for &[u8; LEN] {
    fn eq(&self, other: &BlockCollection<'_>) -> bool {
        other.eq(&self.as_slice())
    }
}

/// The child of a [`BlockCollection`] that served the most recent byte lookup.
///
/// Whenever a collection has at least one child, its window identifies one child by position
/// and the exact logical range `[start, end)` that child covers within the collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheWindow {
    position: usize,
    start: usize,
    end: usize,
}

impl CacheWindow {
    /// The position of the child in the collection, starting from zero.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// The logical position of the first byte of the child.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// The logical position just past the last byte of the child.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// The logical range covered by the child.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether the child covers the logical position `index`.
    #[must_use]
    pub const fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }
}

/// Iterator over the bytes of a [`BlockCollection`], in logical order.
///
/// Returned by [`BlockCollection::iter()`].
#[derive(Debug)]
pub struct BlockCollectionBytes<'c, 'a> {
    collection: &'c BlockCollection<'a>,
    index: usize,
}

impl<'c, 'a> BlockCollectionBytes<'c, 'a> {
    const fn new(collection: &'c BlockCollection<'a>) -> Self {
        Self { collection, index: 0 }
    }
}

impl Iterator for BlockCollectionBytes<'_, '_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let byte = *self.collection.get(self.index)?;
        self.index += 1;
        Some(byte)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.collection.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BlockCollectionBytes<'_, '_> {}

impl FusedIterator for BlockCollectionBytes<'_, '_> {}

const WINDOW_STEP_BUCKETS: &[Magnitude] = &[1, 2, 4, 8, 16, 32];

thread_local! {
    static WINDOW_STEPS: Event = Event::builder()
        .name("blockbuf_collection_window_steps")
        .histogram(WINDOW_STEP_BUCKETS)
        .build();

    static OUT_OF_RANGE: Event = Event::builder()
        .name("blockbuf_collection_out_of_range_index")
        .build();
}
