//! Splits an ordered input into contiguous, near-equal partitions.
//!
//! For `len` elements and `parts` requested partitions, the first
//! `len % parts` partitions get one extra element. Empty partitions are never
//! produced: asking for more parts than elements yields one partition per
//! element.

use std::ops::Range;

/// A contiguous slice of the original input, by offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub index: usize,
    pub start: usize,
    pub len: usize,
}

impl Partition {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    pub fn slice<'a, T>(&self, values: &'a [T]) -> &'a [T] {
        &values[self.range()]
    }
}

/// Compute partition offsets for `len` elements over at most `parts` parts.
///
/// Returns an empty list when either `len` or `parts` is zero.
pub fn partition(len: usize, parts: usize) -> Vec<Partition> {
    let parts = parts.min(len);
    if parts == 0 {
        return Vec::new();
    }

    let base = len / parts;
    let remainder = len % parts;

    let mut start = 0;
    (0..parts)
        .map(|index| {
            let size = base + usize::from(index < remainder);
            let partition = Partition {
                index,
                start,
                len: size,
            };
            start += size;
            partition
        })
        .collect()
}

/// Split `values` into borrowed chunks following [`partition`].
pub fn split<T>(values: &[T], parts: usize) -> Vec<&[T]> {
    partition(values.len(), parts)
        .iter()
        .map(|p| p.slice(values))
        .collect()
}
