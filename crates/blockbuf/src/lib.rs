// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Present physically separate memory blocks as one logically contiguous byte range.
//!
//! Driver and protocol-stack code often receives or sends data in fragments - a chain of
//! descriptors, a header in one buffer and a payload in another. This crate lets such code
//! address the fragments as if they were one buffer, without copying them together first.
//!
//! # Blocks
//!
//! Everything in this crate is a [`Block`]: a region of bytes with a length, a capacity,
//! indexed byte access and bulk copies in and out. Three kinds of blocks exist:
//!
//! * [`FixedBlock`] wraps a region of memory owned by someone else (e.g. a static receive
//!   buffer or a slice of a larger frame).
//! * [`DynamicBlock`] owns a heap buffer obtained from an [`Allocator`] and returns it to the
//!   allocator exactly once, when dropped or when the buffer is replaced.
//! * [`BlockCollection`] borrows any number of other blocks and presents them back to back as
//!   one block. Because a collection is itself a block, collections nest.
//!
//! ```
//! use blockbuf::{Block, BlockCollection, DynamicBlock, FixedBlock};
//!
//! // A header that lives in caller-managed memory...
//! let mut header_storage = *b"LEN=5;";
//! let mut header = FixedBlock::new(&mut header_storage);
//!
//! // ...and a payload in a heap buffer.
//! let mut payload = DynamicBlock::new(5);
//! payload.copy_from_slice(0, b"hello");
//!
//! let mut message = BlockCollection::new(&mut header);
//! message.push(&mut payload);
//!
//! assert_eq!(message.len(), 11);
//! assert_eq!(message[6], b'h');
//!
//! // Bulk copies cross from one block into the next transparently.
//! let mut dst = [0_u8; 4];
//! message.copy_to_slice(4, &mut dst);
//! assert_eq!(&dst, b"5;he");
//! ```
//!
//! # Byte lookup
//!
//! A [`BlockCollection`] remembers which child served the previous byte lookup and walks to
//! neighboring children from there, so scanning a collection front to back (or back to front)
//! costs amortized O(1) per byte no matter how many children it has.
//!
//! # Out-of-range access
//!
//! Legacy-style access ([`BlockCollection::byte_at()`], the `[]` operator and the [`Block`]
//! copy methods) never fails: out-of-range bytes resolve to a sentinel that reads as zero and
//! swallows writes, and copies stop at the end of the data. Each of these has a strict
//! counterpart ([`Block::get()`], [`BlockCollection::try_byte_at()`],
//! [`BlockCollection::try_copy_to_slice()`], ...) that reports out-of-range requests via
//! [`Error`] or `None` instead.
//!
//! # Allocators
//!
//! [`DynamicBlock`] obtains its buffer from the [`GlobalAllocator`] unless told otherwise.
//! Any type implementing [`Allocator`] can be used instead; [`AllocTraits`] carries the
//! per-request options.
//!
//! # Testing
//!
//! For testing purposes (behind the `test-util` Cargo feature), the [`testing`] module exposes
//! `CountingAllocator`, an allocator that tallies allocations and releases so that tests can
//! verify buffer ownership.
//!
//! # Thread safety
//!
//! Block types are plain single-threaded data structures. [`BlockCollection`] updates its
//! lookup cache on reads and is therefore neither [`Send`] nor [`Sync`]; callers that share
//! blocks between threads or interrupt contexts must provide their own synchronization.

mod alloc;
mod block;
mod collection;
mod constants;
mod dynamic_block;
mod error;
mod fixed_block;
mod io_adapter;

pub use alloc::{AllocTraits, Allocator, GlobalAllocator};
pub use block::Block;
pub use collection::{BlockCollection, BlockCollectionBytes, CacheWindow};
pub use constants::MAX_INLINE_BLOCKS;
pub use dynamic_block::DynamicBlock;
pub use error::{Error, Result};
pub use fixed_block::FixedBlock;
pub use io_adapter::{BlockReader, BlockWriter};

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
