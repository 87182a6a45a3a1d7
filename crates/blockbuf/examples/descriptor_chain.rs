// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Reassembling a frame that arrived in a chain of receive descriptors.
//!
//! 1. A fake driver fills three heap-backed receive buffers of uneven size.
//! 2. We stitch them into a `BlockCollection` behind a caller-owned header.
//! 3. A parser reads fields that straddle buffer boundaries without copying the frame together.
//! 4. The `CountingAllocator` confirms every receive buffer was released exactly once.

use blockbuf::testing::CountingAllocator;
use blockbuf::{Block, BlockCollection, DynamicBlock, FixedBlock};

fn main() {
    let allocator = CountingAllocator::new();

    {
        let mut descriptors = receive_frame(&allocator);

        let mut header_storage = *b"ETH:";
        let mut header = FixedBlock::new(&mut header_storage);

        let mut frame = BlockCollection::with_capacity(1 + descriptors.len());
        frame.push(&mut header);
        descriptors.iter_mut().for_each(|d| frame.push(d));

        println!(
            "Frame of {} bytes spread over {} blocks.",
            frame.len(),
            frame.block_count()
        );

        inspect_frame(&frame);
    }

    println!(
        "Receive buffers allocated: {}, released: {}, bytes outstanding: {}.",
        allocator.allocations(),
        allocator.frees(),
        allocator.outstanding_bytes()
    );
}

fn receive_frame(allocator: &CountingAllocator) -> Vec<DynamicBlock<&CountingAllocator>> {
    const PAYLOAD: &[u8] = b"\x00\x2a-a frame split across several receive descriptors";
    const DESCRIPTOR_SIZES: [usize; 3] = [1, 9, 41];

    let mut offset = 0;

    DESCRIPTOR_SIZES
        .iter()
        .map(|&size| {
            let mut block = DynamicBlock::with_allocator(size, allocator);

            let end = (offset + size).min(PAYLOAD.len());
            block.copy_from_slice(0, &PAYLOAD[offset..end]);
            offset = end;

            block
        })
        .collect()
}

fn inspect_frame(frame: &BlockCollection<'_>) {
    // The 16-bit type field starts right after the header and straddles two descriptors.
    let mut type_field = [0_u8; 2];

    match frame.try_copy_to_slice(4, &mut type_field) {
        Ok(()) => println!("Frame type: {}", u16::from_be_bytes(type_field)),
        Err(e) => println!("Truncated frame: {e}"),
    }

    let text = frame.iter().skip(6).map(char::from).collect::<String>();
    println!("Frame text: {text}");

    // Reading past the end is reported, not silently ignored, by the strict accessors.
    if let Err(e) = frame.try_get(frame.len()) {
        println!("As expected: {e}");
    }
}
