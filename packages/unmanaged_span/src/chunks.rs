use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::num::NonZero;
use std::slice;

use new_zealand::nz;

/// The largest number of elements in a single chunk produced by
/// [`UnmanagedSpan::chunks()`][crate::UnmanagedSpan::chunks].
///
/// This is the largest length representable by a 32-bit signed index, which keeps every chunk
/// usable with bulk primitives and foreign APIs that index with such integers.
pub const MAX_CHUNK_LEN: usize = 0x7FFF_FFFF;

const MAX_CHUNK_LEN_NZ: NonZero<usize> = nz!(0x7FFF_FFFF);

/// Splits a length into consecutive chunk lengths of at most `max` elements each.
///
/// This is the plan that [`Chunks`] follows when cutting a span into native slices. It touches
/// no memory, so it can describe regions of any length.
///
/// The sequence yields `len.div_ceil(max)` items whose sum is `len`. Every item except possibly
/// the last is exactly `max`. A zero length yields nothing.
///
/// # Example
///
/// ```
/// use std::num::NonZero;
///
/// use unmanaged_span::{ChunkLengths, MAX_CHUNK_LEN};
///
/// let max = NonZero::new(MAX_CHUNK_LEN).unwrap();
/// let lengths: Vec<usize> = ChunkLengths::new(2_500_000_000, max).collect();
///
/// assert_eq!(lengths, vec![2_147_483_647, 352_516_353]);
/// ```
#[derive(Clone, Debug)]
pub struct ChunkLengths {
    remaining: usize,
    max: NonZero<usize>,
}

impl ChunkLengths {
    /// Creates the chunk plan for `len` elements split into chunks of at most `max` elements.
    #[must_use]
    pub fn new(len: usize, max: NonZero<usize>) -> Self {
        Self {
            remaining: len,
            max,
        }
    }
}

impl Iterator for ChunkLengths {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let len = self.remaining.min(self.max.get());

        self.remaining = self
            .remaining
            .checked_sub(len)
            .expect("chunk length is never greater than the remaining length");

        Some(len)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.remaining.div_ceil(self.max.get());
        (count, Some(count))
    }
}

impl ExactSizeIterator for ChunkLengths {}
impl FusedIterator for ChunkLengths {}

/// Iterator over the native slices that together cover an
/// [`UnmanagedSpan`][crate::UnmanagedSpan].
///
/// Created by [`UnmanagedSpan::chunks()`][crate::UnmanagedSpan::chunks]. Each slice holds at most
/// [`MAX_CHUNK_LEN`] elements and the slices follow each other in memory order without gaps or
/// overlap.
#[derive(Debug)]
pub struct Chunks<'a, T> {
    next_ptr: *mut T,
    lengths: ChunkLengths,

    _span: PhantomData<&'a mut [T]>,
}

impl<T> Chunks<'_, T> {
    /// # Safety
    ///
    /// The caller must guarantee that `ptr` is valid for reads and writes of `len` elements for
    /// the lifetime `'a` and that nothing else accesses the region during that lifetime.
    pub(crate) unsafe fn new(ptr: *mut T, len: usize) -> Self {
        // SAFETY: Forwarding the caller's guarantee.
        unsafe { Self::with_max_len(ptr, len, MAX_CHUNK_LEN_NZ) }
    }

    /// # Safety
    ///
    /// Same as [`new()`][Self::new].
    unsafe fn with_max_len(ptr: *mut T, len: usize, max: NonZero<usize>) -> Self {
        Self {
            next_ptr: ptr,
            lengths: ChunkLengths::new(len, max),
            _span: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Chunks<'a, T> {
    type Item = &'a mut [T];

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.lengths.next()?;

        // SAFETY: The chunk plan never yields more than the remaining length, so the chunk stays
        // inside the region the constructor was given. Chunks do not overlap, so handing out
        // exclusive references to each of them is sound.
        let chunk = unsafe { slice::from_raw_parts_mut(self.next_ptr, len) };

        // SAFETY: At most one past the end of the region, which is a valid pointer to compute.
        self.next_ptr = unsafe { self.next_ptr.add(len) };

        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lengths.size_hint()
    }
}

impl<T> ExactSizeIterator for Chunks<'_, T> {}
impl<T> FusedIterator for Chunks<'_, T> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_not_impl_any;

    use super::*;

    assert_not_impl_any!(Chunks<'static, u8>: Send, Sync);

    #[test]
    fn zero_length_yields_nothing() {
        let mut lengths = ChunkLengths::new(0, nz!(10));

        assert_eq!(lengths.len(), 0);
        assert_eq!(lengths.next(), None);
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let lengths: Vec<_> = ChunkLengths::new(30, nz!(10)).collect();

        assert_eq!(lengths, vec![10, 10, 10]);
    }

    #[test]
    fn short_tail_is_last() {
        let lengths: Vec<_> = ChunkLengths::new(25, nz!(10)).collect();

        assert_eq!(lengths, vec![10, 10, 5]);
    }

    #[test]
    fn shorter_than_max_is_single_chunk() {
        let lengths: Vec<_> = ChunkLengths::new(3, nz!(10)).collect();

        assert_eq!(lengths, vec![3]);
    }

    #[test]
    fn count_and_sum_match_for_many_shapes() {
        for len in [0_usize, 1, 2, 7, 63, 64, 65, 1000, 4096] {
            for max in [1_usize, 2, 3, 64, 1000, 5000] {
                let max = NonZero::new(max).unwrap();
                let lengths = ChunkLengths::new(len, max);

                let expected_count = len.div_ceil(max.get());
                assert_eq!(lengths.len(), expected_count);

                let lengths: Vec<_> = lengths.collect();
                assert_eq!(lengths.len(), expected_count);
                assert_eq!(lengths.iter().sum::<usize>(), len);
                assert!(lengths.iter().all(|&l| l > 0 && l <= max.get()));
            }
        }
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn beyond_32_bit_range_splits_at_max_chunk_len() {
        let lengths: Vec<_> = ChunkLengths::new(2_500_000_000, MAX_CHUNK_LEN_NZ).collect();

        assert_eq!(lengths, vec![2_147_483_647, 352_516_353]);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn usize_max_length_is_finite() {
        let lengths = ChunkLengths::new(usize::MAX, MAX_CHUNK_LEN_NZ);

        let expected = usize::MAX.div_ceil(MAX_CHUNK_LEN);
        assert_eq!(lengths.len(), expected);
    }

    #[test]
    fn is_fused() {
        let mut lengths = ChunkLengths::new(5, nz!(5));

        assert_eq!(lengths.next(), Some(5));
        assert_eq!(lengths.next(), None);
        assert_eq!(lengths.next(), None);
    }

    #[test]
    fn chunks_cover_region_in_order() {
        let mut storage: Vec<u16> = (0..100).collect();

        // SAFETY: The vector outlives the iterator and is not accessed while it exists.
        let chunks = unsafe { Chunks::new(storage.as_mut_ptr(), storage.len()) };

        let chunks: Vec<&mut [u16]> = chunks.collect();
        assert_eq!(chunks.len(), 1);

        let chunk = chunks.into_iter().next().unwrap();
        assert_eq!(chunk.len(), 100);
        assert_eq!(chunk.first(), Some(&0));
        assert_eq!(chunk.last(), Some(&99));
    }

    #[test]
    fn constant_matches_nonzero_bound() {
        assert_eq!(MAX_CHUNK_LEN_NZ.get(), MAX_CHUNK_LEN);
    }

    #[test]
    fn chunks_advance_across_boundaries() {
        let mut storage: Vec<u32> = (0..100).collect();

        // SAFETY: The vector outlives the iterator and is not accessed while it exists.
        let chunks = unsafe { Chunks::with_max_len(storage.as_mut_ptr(), storage.len(), nz!(30)) };
        assert_eq!(chunks.len(), 4);

        let chunks: Vec<&mut [u32]> = chunks.collect();

        let lengths: Vec<usize> = chunks.iter().map(|chunk| chunk.len()).collect();
        assert_eq!(lengths, vec![30, 30, 30, 10]);

        let firsts: Vec<u32> = chunks.iter().map(|chunk| *chunk.first().unwrap()).collect();
        assert_eq!(firsts, vec![0, 30, 60, 90]);

        // Writing through every chunk touches every element exactly once.
        for chunk in chunks {
            for value in chunk.iter_mut() {
                *value += 1000;
            }
        }

        assert!(storage.iter().copied().eq(1000..1100));
    }
}
