//! Streaming body buffer
//!
//! A body is held as an ordered list of `BytesMut` slices. Data arriving from
//! the network or from a module is appended (or prepended) as whole slices, so
//! the scatter-gather layout a module sees is exactly how the bytes arrived.
//! Any mutation may reshape the list; raw slice pointers handed out earlier are
//! invalid afterwards.

use bytes::{Buf, Bytes, BytesMut};
use std::collections::VecDeque;

/// Scatter-gather byte buffer for one direction of a stream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Buffer {
    slices: VecDeque<BytesMut>,
    len: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer with one slice per non-empty input.
    pub fn from_slices<I, S>(slices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut buffer = Self::new();
        for slice in slices {
            buffer.add(slice.as_ref());
        }
        buffer
    }

    /// Total readable bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    /// The `index`-th raw slice, if any.
    pub fn slice(&self, index: usize) -> Option<&[u8]> {
        self.slices.get(index).map(|s| &s[..])
    }

    /// The `index`-th raw slice, writable in place.
    pub fn slice_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        self.slices.get_mut(index).map(|s| &mut s[..])
    }

    /// Copy `data` in as a new tail slice. Empty input is a no-op.
    pub fn add(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.slices.push_back(BytesMut::from(data));
        self.len += data.len();
    }

    /// Copy `data` in as a new head slice. Empty input is a no-op.
    pub fn prepend(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.slices.push_front(BytesMut::from(data));
        self.len += data.len();
    }

    /// Discard the first `n` bytes, or everything when `n` exceeds the length.
    pub fn drain(&mut self, n: usize) {
        let mut remaining = n.min(self.len);
        self.len -= remaining;
        while remaining > 0 {
            let Some(front) = self.slices.front_mut() else {
                break;
            };
            if front.len() <= remaining {
                remaining -= front.len();
                self.slices.pop_front();
            } else {
                front.advance(remaining);
                remaining = 0;
            }
        }
    }

    /// Copy bytes starting at logical `offset` into `dest`, crossing slice
    /// boundaries. Returns the number of bytes copied, which is short when the
    /// range runs past the end.
    pub fn copy_out(&self, offset: usize, dest: &mut [u8]) -> usize {
        if dest.is_empty() || offset >= self.len {
            return 0;
        }

        let mut skip = offset;
        let mut written = 0;
        for slice in &self.slices {
            if skip >= slice.len() {
                skip -= slice.len();
                continue;
            }
            let available = &slice[skip..];
            skip = 0;
            let n = available.len().min(dest.len() - written);
            dest[written..written + n].copy_from_slice(&available[..n]);
            written += n;
            if written == dest.len() {
                break;
            }
        }
        written
    }

    /// Drop all content.
    pub fn clear(&mut self) {
        self.slices.clear();
        self.len = 0;
    }

    /// Concatenate the slices into one contiguous `Bytes`.
    pub fn to_bytes(&self) -> Bytes {
        if self.slices.len() == 1 {
            return self.slices[0].clone().freeze();
        }
        let mut out = BytesMut::with_capacity(self.len);
        for slice in &self.slices {
            out.extend_from_slice(slice);
        }
        out.freeze()
    }
}

impl From<&[u8]> for Buffer {
    fn from(data: &[u8]) -> Self {
        let mut buffer = Self::new();
        buffer.add(data);
        buffer
    }
}

impl From<&str> for Buffer {
    fn from(data: &str) -> Self {
        Self::from(data.as_bytes())
    }
}
