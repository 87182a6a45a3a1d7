// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Utilities for testing code that works with blocks.

use std::sync::atomic::{self, AtomicUsize};
use std::sync::{Mutex, PoisonError};

use crate::{AllocTraits, Allocator, GlobalAllocator};

/// An allocator that delegates to the [`GlobalAllocator`] and keeps a tally of what it did.
///
/// This is meant for test scenarios that verify buffer ownership: that every buffer handed
/// out is released exactly once, and which buffers were released in what order.
///
/// Share one instance between many blocks by passing `&CountingAllocator`.
#[derive(Debug, Default)]
pub struct CountingAllocator {
    allocations: AtomicUsize,
    frees: AtomicUsize,
    outstanding_bytes: AtomicUsize,
    freed_sizes: Mutex<Vec<usize>>,
}

impl CountingAllocator {
    /// Creates a new allocator with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of buffers handed out so far.
    #[must_use]
    pub fn allocations(&self) -> usize {
        self.allocations.load(atomic::Ordering::Relaxed)
    }

    /// The number of buffers released so far.
    #[must_use]
    pub fn frees(&self) -> usize {
        self.frees.load(atomic::Ordering::Relaxed)
    }

    /// Bytes handed out but not yet released.
    ///
    /// Buffers adopted from elsewhere and later released through this allocator are
    /// subtracted too, so the value saturates at zero rather than wrapping.
    #[must_use]
    pub fn outstanding_bytes(&self) -> usize {
        self.outstanding_bytes.load(atomic::Ordering::Relaxed)
    }

    /// The sizes of all released buffers, in release order.
    #[must_use]
    pub fn freed_sizes(&self) -> Vec<usize> {
        self.freed_sizes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Allocator for CountingAllocator {
    fn allocate(&self, size: usize, traits: &AllocTraits) -> Box<[u8]> {
        self.allocations.fetch_add(1, atomic::Ordering::Relaxed);
        self.outstanding_bytes.fetch_add(size, atomic::Ordering::Relaxed);

        GlobalAllocator.allocate(size, traits)
    }

    fn free(&self, buffer: Box<[u8]>) {
        let size = buffer.len();

        self.frees.fetch_add(1, atomic::Ordering::Relaxed);

        // The closure never returns `None`, so this cannot fail.
        _ = self
            .outstanding_bytes
            .fetch_update(atomic::Ordering::Relaxed, atomic::Ordering::Relaxed, |x| {
                Some(x.saturating_sub(size))
            });

        self.freed_sizes.lock().unwrap_or_else(PoisonError::into_inner).push(size);

        GlobalAllocator.free(buffer);
    }
}
