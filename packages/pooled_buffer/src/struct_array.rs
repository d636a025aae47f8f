use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::slice;

use unmanaged_span::{Unmanaged, UnmanagedSpan};

use crate::{ArrayPool, Error, PooledArray, Result};

/// An array of plain-data values stored in bytes rented from a byte [`ArrayPool`].
///
/// This lets one byte pool serve storage for any [`Unmanaged`] type. The handle rents enough
/// bytes to hold `len` values at the alignment `T` requires and views them as a `[T]`. Like
/// [`PooledArray`], it returns the bytes to the pool exactly once, on
/// [`release()`][Self::release] or when dropped.
///
/// The values initially hold whatever bytes a previous renter left behind. Any bit pattern is a
/// valid `T`, so reading them is sound, but their values are unspecified.
///
/// # Example
///
/// ```
/// use pooled_buffer::{BucketedArrayPool, BytePoolExt};
///
/// let pool = BucketedArrayPool::<u8>::new();
///
/// let mut samples = pool.rent_unmanaged::<f64>(10)?;
/// assert_eq!(samples.len(), 10);
///
/// samples.fill(0.5);
/// assert_eq!(samples.iter().sum::<f64>(), 5.0);
///
/// drop(samples);
/// assert_eq!(pool.outstanding_elements(), 0);
/// # Ok::<(), pooled_buffer::Error>(())
/// ```
pub struct PooledStructArray<'p, T, P>
where
    T: Unmanaged,
    P: ArrayPool<u8> + ?Sized,
{
    bytes: PooledArray<'p, u8, P>,

    /// Byte offset of the first value, making it aligned for `T`.
    offset: usize,

    len: usize,

    _item: PhantomData<T>,
}

impl<'p, T, P> PooledStructArray<'p, T, P>
where
    T: Unmanaged,
    P: ArrayPool<u8> + ?Sized,
{
    /// Rents bytes for `len` values of `T` from `pool`.
    ///
    /// A `len` of zero creates an empty array without contacting the pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityOverflow`] if the number of bytes needed is not representable.
    /// Returns the pool's error unchanged if the pool cannot satisfy the request.
    pub fn acquire(pool: &'p P, len: usize) -> Result<Self> {
        if len == 0 {
            return Ok(Self {
                bytes: PooledArray::empty(pool),
                offset: 0,
                len: 0,
                _item: PhantomData,
            });
        }

        // Up to `align - 1` extra bytes let us start at an aligned address whatever the pool
        // hands out.
        let byte_len = len
            .checked_mul(size_of::<T>())
            .and_then(|values| values.checked_add(align_of::<T>().saturating_sub(1)))
            .ok_or(Error::CapacityOverflow {
                capacity: 0,
                size_hint: len,
            })?;

        let bytes = PooledArray::acquire(pool, byte_len)?;

        let start = bytes.as_ptr().addr();
        let offset = start
            .checked_next_multiple_of(align_of::<T>())
            .and_then(|aligned| aligned.checked_sub(start))
            .expect("the rented array lies inside the address space, so its aligned start does too");

        debug_assert!(offset < align_of::<T>());

        Ok(Self {
            bytes,
            offset,
            len,
            _item: PhantomData,
        })
    }

    /// Whether the handle still holds its rented bytes.
    ///
    /// A zero-length array never holds any.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.bytes.is_live()
    }

    /// The number of bytes occupied by the values, excluding any alignment padding in front.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.as_slice().len().saturating_mul(size_of::<T>())
    }

    /// The values as a shared slice. Empty if the handle has been released.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        if self.len == 0 || !self.bytes.is_live() {
            return &[];
        }

        #[allow(
            clippy::cast_ptr_alignment,
            reason = "the offset was chosen to align the pointer for T"
        )]
        let first = self
            .bytes
            .as_slice()
            .as_ptr()
            .wrapping_add(self.offset)
            .cast::<T>();

        // SAFETY: `acquire()` rented at least `offset + len * size_of::<T>()` initialized bytes
        // and chose `offset` so that `first` is aligned for `T`. Every bit pattern is a valid `T`
        // and we borrow `self`, which owns the bytes, for the lifetime of the slice.
        unsafe { slice::from_raw_parts(first, self.len) }
    }

    /// The values as an exclusive slice. Empty if the handle has been released.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        if self.len == 0 || !self.bytes.is_live() {
            return &mut [];
        }

        #[allow(
            clippy::cast_ptr_alignment,
            reason = "the offset was chosen to align the pointer for T"
        )]
        let first = self
            .bytes
            .as_mut_slice()
            .as_mut_ptr()
            .wrapping_add(self.offset)
            .cast::<T>();

        // SAFETY: As in `as_slice()`, and we borrow `self` exclusively for the lifetime of the
        // slice.
        unsafe { slice::from_raw_parts_mut(first, self.len) }
    }

    /// Creates an unmanaged span over the values.
    ///
    /// # Safety
    ///
    /// The span does not borrow the handle. The caller must not use the span or anything derived
    /// from it after the handle is released, dropped or accessed through any other method.
    #[must_use]
    pub unsafe fn as_unmanaged_span(&mut self) -> UnmanagedSpan<T> {
        let values = self.as_mut_slice();

        // SAFETY: The slice is a valid, exclusively borrowed region of `values.len()` elements.
        // Keeping it valid for the life of the span is forwarded to the caller.
        unsafe { UnmanagedSpan::from_raw_parts(values.as_mut_ptr(), values.len()) }
    }

    /// Returns the bytes to the pool if the handle still holds them. Does nothing otherwise.
    pub fn release(&mut self) {
        self.bytes.release();
    }
}

impl<T, P> Deref for PooledStructArray<'_, T, P>
where
    T: Unmanaged,
    P: ArrayPool<u8> + ?Sized,
{
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T, P> DerefMut for PooledStructArray<'_, T, P>
where
    T: Unmanaged,
    P: ArrayPool<u8> + ?Sized,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T, P> fmt::Debug for PooledStructArray<'_, T, P>
where
    T: Unmanaged,
    P: ArrayPool<u8> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("len", &self.as_slice().len())
            .field("offset", &self.offset)
            .field("is_live", &self.is_live())
            .finish_non_exhaustive()
    }
}

/// Rents typed storage from a byte pool.
///
/// This trait is implemented for every `ArrayPool<u8>`. Bring it into scope to use it.
pub trait BytePoolExt: ArrayPool<u8> {
    /// Rents bytes for `len` values of `T`, viewed as a `[T]`.
    ///
    /// The bytes go back to the pool when the returned array is released or dropped.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`PooledStructArray::acquire()`].
    fn rent_unmanaged<T: Unmanaged>(&self, len: usize) -> Result<PooledStructArray<'_, T, Self>> {
        PooledStructArray::acquire(self, len)
    }
}

impl<P> BytePoolExt for P where P: ArrayPool<u8> + ?Sized {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use mockall::Sequence;
    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::{BucketedArrayPool, MockBytePool};

    assert_not_impl_any!(PooledStructArray<'static, u64, BucketedArrayPool<u8>>: Clone, Send, Sync);

    fn assert_aligned<T>(values: &[T]) {
        assert!(values.as_ptr().is_aligned(), "{:p}", values.as_ptr());
    }

    #[test]
    fn acquire_rents_bytes_for_values_and_alignment() {
        let mut pool = MockBytePool::new();
        let mut seq = Sequence::new();

        pool.expect_rent()
            .withf(|&len| len == 10 * 8 + 7)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|len| Ok(vec![0; len].into_boxed_slice()));
        pool.expect_return_array()
            .withf(|array| array.len() == 87)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let values = PooledStructArray::<u64, _>::acquire(&pool, 10).unwrap();

        assert_eq!(values.len(), 10);
        assert_eq!(values.byte_len(), 80);
        assert_aligned(&values);
    }

    #[test]
    fn values_are_aligned_for_wide_types() {
        let pool = BucketedArrayPool::<u8>::new();

        let words = pool.rent_unmanaged::<u64>(33).unwrap();
        let big = pool.rent_unmanaged::<u128>(5).unwrap();
        let triples = pool.rent_unmanaged::<[u16; 3]>(7).unwrap();

        assert_aligned(&words);
        assert_aligned(&big);
        assert_aligned(&triples);
        assert_eq!(triples.byte_len(), 42);
    }

    #[test]
    fn written_values_read_back() {
        let pool = BucketedArrayPool::<u8>::new();
        let mut values = pool.rent_unmanaged::<i32>(100).unwrap();

        for (index, value) in values.iter_mut().enumerate() {
            *value = -i32::try_from(index).unwrap();
        }

        assert!(values.iter().copied().eq((0..100).map(|x: i32| -x)));
    }

    #[test]
    fn byte_count_overflow_is_reported() {
        let mut pool = MockBytePool::new();
        pool.expect_rent().never();

        let error = pool.rent_unmanaged::<u64>(usize::MAX / 4).unwrap_err();

        assert!(matches!(
            error,
            Error::CapacityOverflow {
                capacity: 0,
                size_hint
            } if size_hint == usize::MAX / 4
        ));
    }

    #[test]
    fn pool_failure_is_propagated() {
        let pool = BucketedArrayPool::<u8>::builder()
            .max_outstanding_elements(new_zealand::nz!(64))
            .build();

        let error = pool.rent_unmanaged::<u64>(100).unwrap_err();

        assert!(matches!(error, Error::PoolExhausted { .. }));
    }

    #[test]
    fn zero_length_does_not_rent() {
        let mut pool = MockBytePool::new();
        pool.expect_rent().never();
        pool.expect_return_array().never();

        let mut values = PooledStructArray::<u32, _>::acquire(&pool, 0).unwrap();

        assert!(values.is_empty());
        assert!(!values.is_live());
        assert!(values.as_mut_slice().is_empty());
    }

    #[test]
    fn release_returns_once_and_empties_view() {
        let pool = BucketedArrayPool::<u8>::new();
        let mut values = pool.rent_unmanaged::<u16>(20).unwrap();

        values.release();
        values.release();

        assert!(values.is_empty());
        assert_eq!(values.byte_len(), 0);
        assert_eq!(pool.outstanding_elements(), 0);
        assert_eq!(pool.retained_array_count(), 1);
    }

    #[test]
    fn zero_sized_values() {
        let pool = BucketedArrayPool::<u8>::new();
        let values = pool.rent_unmanaged::<[u32; 0]>(5).unwrap();

        assert_eq!(values.len(), 5);
        assert_eq!(values.byte_len(), 0);
        assert_aligned(&values);
    }

    #[test]
    fn unmanaged_span_covers_values() {
        let pool = BucketedArrayPool::<u8>::new();
        let mut values = pool.rent_unmanaged::<u32>(50).unwrap();

        {
            // SAFETY: The span is dropped before the array is touched again.
            let mut span = unsafe { values.as_unmanaged_span() };
            assert_eq!(span.len(), 50);
            span.fill(0xABCD);
        }

        assert!(values.iter().all(|&x| x == 0xABCD));
    }

    #[test]
    fn debug_names_state() {
        let pool = BucketedArrayPool::<u8>::new();
        let values = pool.rent_unmanaged::<u8>(3).unwrap();

        let debug = format!("{values:?}");

        assert!(debug.contains("PooledStructArray"));
        assert!(debug.contains("len: 3"));
    }
}
