// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;

use nm::{Event, Magnitude};

/// Options that accompany an allocation request.
///
/// All fields have defaults; construct with [`AllocTraits::default()`] and adjust via the
/// `with_*` methods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct AllocTraits {
    /// The value every byte of a fresh allocation is initialized to.
    pub fill_byte: u8,
}

impl AllocTraits {
    /// Sets the value every byte of a fresh allocation is initialized to.
    #[must_use]
    pub const fn with_fill_byte(mut self, fill_byte: u8) -> Self {
        self.fill_byte = fill_byte;
        self
    }
}

/// Provides and releases the heap buffers owned by [`DynamicBlock`][crate::DynamicBlock].
///
/// Buffers are handed out as `Box<[u8]>` so ownership is always explicit. A buffer obtained
/// from one allocator must only ever be returned to an allocator of the same family.
///
/// # Allocation failure
///
/// The trait has no failure path. An implementation that cannot satisfy a request follows its
/// own failure contract (the [`GlobalAllocator`] aborts the process, like the Rust global
/// allocator does).
pub trait Allocator: Debug {
    /// Allocates a buffer of exactly `size` bytes, initialized as directed by `traits`.
    #[must_use]
    fn allocate(&self, size: usize, traits: &AllocTraits) -> Box<[u8]>;

    /// Releases a buffer previously obtained from [`allocate()`][Self::allocate].
    fn free(&self, buffer: Box<[u8]>);
}

impl<A: Allocator + ?Sized> Allocator for &A {
    #[inline]
    fn allocate(&self, size: usize, traits: &AllocTraits) -> Box<[u8]> {
        (*self).allocate(size, traits)
    }

    #[inline]
    fn free(&self, buffer: Box<[u8]>) {
        (*self).free(buffer);
    }
}

/// An allocator that delegates to the Rust global allocator.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalAllocator;

impl Allocator for GlobalAllocator {
    fn allocate(&self, size: usize, traits: &AllocTraits) -> Box<[u8]> {
        ALLOCATED_SIZE.with(|e| e.observe(size));

        vec![traits.fill_byte; size].into_boxed_slice()
    }

    #[cfg_attr(test, mutants::skip)] // Dropping is the release; nothing observable to mutate.
    fn free(&self, buffer: Box<[u8]>) {
        drop(buffer);
    }
}

const ALLOCATION_SIZE_BUCKETS: &[Magnitude] = &[0, 16, 64, 256, 1024, 4096, 16_384, 65_536];

thread_local! {
    static ALLOCATED_SIZE: Event = Event::builder()
        .name("blockbuf_global_allocator_allocated_size")
        .histogram(ALLOCATION_SIZE_BUCKETS)
        .build();
}
