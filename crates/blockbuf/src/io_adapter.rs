// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::{self, Read, Write};

use crate::Block;

/// Adapter that implements [`Read`] for any [`Block`].
///
/// Reads start at logical position zero and advance through the block. The block itself is
/// not modified.
///
/// Create an instance via [`BlockReader::new()`] or [`BlockCollection::reader()`][1].
///
/// [1]: crate::BlockCollection::reader
#[derive(Debug)]
pub struct BlockReader<'b, B: Block + ?Sized> {
    inner: &'b B,
    position: usize,
}

impl<'b, B: Block + ?Sized> BlockReader<'b, B> {
    /// Creates a reader positioned at the start of `inner`.
    #[must_use]
    pub const fn new(inner: &'b B) -> Self {
        Self { inner, position: 0 }
    }

    /// The logical position the next read starts at.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Moves the reader to logical position `position`.
    ///
    /// Positions past the end of the block are allowed; reads from there return zero bytes.
    pub const fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

impl<B: Block + ?Sized> Read for BlockReader<'_, B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.inner.len().saturating_sub(self.position);
        let to_read = buf.len().min(remaining);

        if to_read == 0 {
            return Ok(0);
        }

        self.inner.copy_to_slice(self.position, &mut buf[..to_read]);
        self.position += to_read;

        Ok(to_read)
    }
}

/// Adapter that implements [`Write`] for any [`Block`].
///
/// Writes overwrite the block starting at logical position zero. The block never grows - once
/// the end is reached, writes accept zero bytes, which [`Write::write_all()`] reports as
/// [`io::ErrorKind::WriteZero`].
///
/// Create an instance via [`BlockWriter::new()`] or [`BlockCollection::writer()`][1].
///
/// [1]: crate::BlockCollection::writer
#[derive(Debug)]
pub struct BlockWriter<'b, B: Block + ?Sized> {
    inner: &'b mut B,
    position: usize,
}

impl<'b, B: Block + ?Sized> BlockWriter<'b, B> {
    /// Creates a writer positioned at the start of `inner`.
    #[must_use]
    pub const fn new(inner: &'b mut B) -> Self {
        Self { inner, position: 0 }
    }

    /// The logical position the next write starts at.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Moves the writer to logical position `position`.
    ///
    /// Positions past the end of the block are allowed; writes from there accept zero bytes.
    pub const fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

impl<B: Block + ?Sized> Write for BlockWriter<'_, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = self.inner.len().saturating_sub(self.position);
        let to_write = buf.len().min(remaining);

        if to_write == 0 {
            return Ok(0);
        }

        self.inner.copy_from_slice(self.position, &buf[..to_write]);
        self.position += to_write;

        Ok(to_write)
    }

    #[cfg_attr(test, mutants::skip)] // Nothing is buffered.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
