// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// The number of children a [`BlockCollection`][crate::BlockCollection] can hold without
/// allocating storage for the child references on the heap.
///
/// Descriptor chains in the wild are typically short, so a handful of inline slots covers
/// the common case. Collections with more children spill over into a heap allocation.
pub const MAX_INLINE_BLOCKS: usize = 4;
