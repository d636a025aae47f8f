use std::any::type_name;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::num::NonZero;

use tracing::{debug, trace};

use crate::{ArrayPool, BucketedArrayPoolBuilder, Error, Result};

/// A single-threaded array pool that keeps returned arrays in power-of-two size buckets.
///
/// A rent is served from the smallest bucket whose arrays are at least as long as requested.
/// If the bucket holds a previously returned array, that array is reused; otherwise a new one of
/// the bucket's length is allocated. Requests longer than the largest bucket are served with
/// exact-length arrays that the pool does not keep once they are returned.
///
/// Rented arrays may contain values written by a previous renter.
///
/// # Thread safety
///
/// The pool is not [`Sync`]. Share it by reference within one thread; give each thread its own
/// pool if you need one on several threads.
///
/// # Example
///
/// ```
/// use pooled_buffer::{ArrayPool, BucketedArrayPool};
///
/// let pool = BucketedArrayPool::<u32>::new();
///
/// let array = pool.rent(100)?;
/// assert_eq!(array.len(), 128);
///
/// pool.return_array(array);
/// assert_eq!(pool.retained_array_count(), 1);
///
/// // The returned array is handed out again for a request that fits the same bucket.
/// let again = pool.rent(120)?;
/// assert_eq!(again.len(), 128);
/// assert_eq!(pool.retained_array_count(), 0);
/// # pool.return_array(again);
/// # Ok::<(), pooled_buffer::Error>(())
/// ```
pub struct BucketedArrayPool<T> {
    /// Bucket `i` holds returned arrays of length `min_array_len << i`.
    buckets: RefCell<Vec<Vec<Box<[T]>>>>,

    min_array_len: NonZero<usize>,
    max_array_len: NonZero<usize>,
    arrays_per_bucket: NonZero<usize>,
    max_outstanding_elements: Option<NonZero<usize>>,

    /// Sum of the lengths of all arrays rented and not yet returned.
    outstanding_elements: Cell<usize>,
}

impl<T> BucketedArrayPool<T>
where
    T: Copy + Default,
{
    pub(crate) fn new_inner(
        min_array_len: NonZero<usize>,
        max_array_len: NonZero<usize>,
        arrays_per_bucket: NonZero<usize>,
        max_outstanding_elements: Option<NonZero<usize>>,
    ) -> Self {
        let bucket_count = bucket_index_for_power_of_two(min_array_len, max_array_len)
            .checked_add(1)
            .expect("bucket index is far below usize::MAX");

        Self {
            buckets: RefCell::new((0..bucket_count).map(|_| Vec::new()).collect()),
            min_array_len,
            max_array_len,
            arrays_per_bucket,
            max_outstanding_elements,
            outstanding_elements: Cell::new(0),
        }
    }

    /// Creates a new pool with the default configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pooled_buffer::BucketedArrayPool;
    ///
    /// let pool = BucketedArrayPool::<u8>::new();
    ///
    /// assert_eq!(pool.outstanding_elements(), 0);
    /// assert_eq!(pool.retained_array_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a new [`BucketedArrayPool`].
    ///
    /// Use this when you want to customize the pool configuration beyond the defaults.
    pub fn builder() -> BucketedArrayPoolBuilder<T> {
        BucketedArrayPoolBuilder::new()
    }

    /// The total length of all arrays currently rented out and not yet returned.
    #[must_use]
    pub fn outstanding_elements(&self) -> usize {
        self.outstanding_elements.get()
    }

    /// The number of returned arrays the pool is holding on to for reuse.
    #[must_use]
    pub fn retained_array_count(&self) -> usize {
        self.buckets.borrow().iter().map(Vec::len).sum()
    }

    /// Index of the smallest bucket whose arrays hold at least `min_len` elements, or `None` if
    /// the request is longer than the largest bucket.
    fn bucket_index(&self, min_len: usize) -> Option<usize> {
        if min_len > self.max_array_len.get() {
            return None;
        }

        let rounded = NonZero::new(min_len.max(self.min_array_len.get()).next_power_of_two())
            .expect("at least min_array_len, which is non-zero");

        Some(bucket_index_for_power_of_two(self.min_array_len, rounded))
    }

    fn bucket_array_len(&self, index: usize) -> usize {
        let shift = u32::try_from(index).expect("bucket count is bounded by usize::BITS");

        self.min_array_len
            .get()
            .checked_shl(shift)
            .expect("bucket lengths are bounded by max_array_len")
    }

    fn reserve_outstanding(&self, requested: usize, array_len: usize) -> Result<()> {
        let outstanding = self.outstanding_elements.get();

        let new_outstanding = outstanding.checked_add(array_len);

        if let Some(limit) = self.max_outstanding_elements {
            if new_outstanding.is_none_or(|n| n > limit.get()) {
                debug!(
                    requested,
                    outstanding,
                    limit = limit.get(),
                    item_type = type_name::<T>(),
                    "array pool exhausted"
                );

                return Err(Error::PoolExhausted {
                    requested,
                    outstanding,
                    limit: limit.get(),
                });
            }
        }

        self.outstanding_elements
            .set(new_outstanding.unwrap_or(usize::MAX));

        Ok(())
    }

    fn release_outstanding(&self, array_len: usize) {
        let outstanding = self.outstanding_elements.get();

        debug_assert!(
            array_len <= outstanding,
            "returned array of {array_len} elements but only {outstanding} were rented out - was it rented from a different pool?"
        );

        self.outstanding_elements
            .set(outstanding.saturating_sub(array_len));
    }
}

impl<T> ArrayPool<T> for BucketedArrayPool<T>
where
    T: Copy + Default,
{
    fn rent(&self, min_len: usize) -> Result<Box<[T]>> {
        if min_len == 0 {
            return Ok(Box::default());
        }

        let Some(index) = self.bucket_index(min_len) else {
            self.reserve_outstanding(min_len, min_len)?;

            trace!(min_len, "renting oversized array outside of buckets");

            return allocate(min_len).inspect_err(|_| self.release_outstanding(min_len));
        };

        let array_len = self.bucket_array_len(index);
        self.reserve_outstanding(min_len, array_len)?;

        let reused = self
            .buckets
            .borrow_mut()
            .get_mut(index)
            .expect("bucket_index() only returns indexes of existing buckets")
            .pop();

        if let Some(array) = reused {
            trace!(min_len, array_len, "reusing pooled array");
            return Ok(array);
        }

        trace!(min_len, array_len, "allocating new array for bucket");

        allocate(array_len).inspect_err(|_| self.release_outstanding(array_len))
    }

    fn return_array(&self, array: Box<[T]>) {
        if array.is_empty() {
            return;
        }

        self.release_outstanding(array.len());

        let Some(index) = self.bucket_index(array.len()) else {
            trace!(len = array.len(), "dropping returned oversized array");
            return;
        };

        if self.bucket_array_len(index) != array.len() {
            trace!(len = array.len(), "dropping returned array of foreign length");
            return;
        }

        let mut buckets = self.buckets.borrow_mut();
        let bucket = buckets
            .get_mut(index)
            .expect("bucket_index() only returns indexes of existing buckets");

        if bucket.len() >= self.arrays_per_bucket.get() {
            trace!(len = array.len(), "dropping returned array, bucket is full");
            return;
        }

        bucket.push(array);
    }
}

impl<T> fmt::Debug for BucketedArrayPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("min_array_len", &self.min_array_len)
            .field("max_array_len", &self.max_array_len)
            .field("arrays_per_bucket", &self.arrays_per_bucket)
            .field("max_outstanding_elements", &self.max_outstanding_elements)
            .field("outstanding_elements", &self.outstanding_elements.get())
            .field(
                "retained_array_count",
                &self.buckets.borrow().iter().map(Vec::len).sum::<usize>(),
            )
            .finish_non_exhaustive()
    }
}

impl<T> Default for BucketedArrayPool<T>
where
    T: Copy + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Allocates an array of `len` default-initialized elements without panicking on failure.
fn allocate<T: Copy + Default>(len: usize) -> Result<Box<[T]>> {
    let mut storage = Vec::new();

    storage
        .try_reserve_exact(len)
        .map_err(|source| Error::AllocationFailed { len, source })?;

    storage.resize(len, T::default());

    Ok(storage.into_boxed_slice())
}

/// Both arguments must be powers of two with `len >= min`.
fn bucket_index_for_power_of_two(min: NonZero<usize>, len: NonZero<usize>) -> usize {
    debug_assert!(min.is_power_of_two() && len.is_power_of_two() && len >= min);

    len.trailing_zeros()
        .checked_sub(min.trailing_zeros())
        .and_then(|index| usize::try_from(index).ok())
        .expect("len >= min, both powers of two")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use new_zealand::nz;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(BucketedArrayPool<u8>: Send, Debug, Default);
    assert_not_impl_any!(BucketedArrayPool<u8>: Sync);

    fn small_pool() -> BucketedArrayPool<u32> {
        BucketedArrayPool::builder()
            .min_array_len(nz!(4))
            .max_array_len(nz!(64))
            .arrays_per_bucket(nz!(2))
            .build()
    }

    #[test]
    fn zero_length_rent_is_empty_and_untracked() {
        let pool = small_pool();

        let array = pool.rent(0).unwrap();

        assert!(array.is_empty());
        assert_eq!(pool.outstanding_elements(), 0);

        pool.return_array(array);
        assert_eq!(pool.retained_array_count(), 0);
    }

    #[test]
    fn small_rent_rounds_up_to_min_len() {
        let pool = small_pool();

        let array = pool.rent(1).unwrap();

        assert_eq!(array.len(), 4);
        assert_eq!(pool.outstanding_elements(), 4);

        pool.return_array(array);
    }

    #[test]
    fn rent_rounds_up_to_power_of_two() {
        let pool = small_pool();

        for (requested, expected) in [(4, 4), (5, 8), (8, 8), (9, 16), (33, 64), (64, 64)] {
            let array = pool.rent(requested).unwrap();
            assert_eq!(array.len(), expected, "rent({requested})");
            pool.return_array(array);
        }
    }

    #[test]
    fn oversized_rent_is_exact_and_not_retained() {
        let pool = small_pool();

        let array = pool.rent(65).unwrap();

        assert_eq!(array.len(), 65);
        assert_eq!(pool.outstanding_elements(), 65);

        pool.return_array(array);

        assert_eq!(pool.outstanding_elements(), 0);
        assert_eq!(pool.retained_array_count(), 0);
    }

    #[test]
    fn returned_array_is_reused() {
        let pool = small_pool();

        let mut array = pool.rent(10).unwrap();
        let address = array.as_ptr();
        array.fill(7);

        pool.return_array(array);
        assert_eq!(pool.retained_array_count(), 1);
        assert_eq!(pool.outstanding_elements(), 0);

        let array = pool.rent(16).unwrap();

        assert_eq!(array.as_ptr(), address);
        assert!(array.iter().all(|&x| x == 7));

        pool.return_array(array);
    }

    #[test]
    fn full_bucket_drops_extra_arrays() {
        let pool = small_pool();

        let a = pool.rent(8).unwrap();
        let b = pool.rent(8).unwrap();
        let c = pool.rent(8).unwrap();

        pool.return_array(a);
        pool.return_array(b);
        pool.return_array(c);

        assert_eq!(pool.retained_array_count(), 2);
        assert_eq!(pool.outstanding_elements(), 0);
    }

    #[test]
    fn foreign_length_is_not_retained() {
        let pool = small_pool();

        // A 12-element array does not match any bucket length exactly.
        pool.outstanding_elements.set(12);
        pool.return_array(vec![0_u32; 12].into_boxed_slice());

        assert_eq!(pool.retained_array_count(), 0);
        assert_eq!(pool.outstanding_elements(), 0);
    }

    #[test]
    fn limit_is_enforced() {
        let pool = BucketedArrayPool::<u8>::builder()
            .min_array_len(nz!(16))
            .max_outstanding_elements(nz!(32))
            .build();

        let a = pool.rent(16).unwrap();
        let b = pool.rent(16).unwrap();

        let error = pool.rent(1).unwrap_err();
        assert!(matches!(
            error,
            Error::PoolExhausted {
                requested: 1,
                outstanding: 32,
                limit: 32
            }
        ));

        pool.return_array(a);

        let c = pool.rent(1).unwrap();
        assert_eq!(c.len(), 16);

        pool.return_array(b);
        pool.return_array(c);
        assert_eq!(pool.outstanding_elements(), 0);
    }

    #[test]
    fn limit_applies_to_rounded_length() {
        let pool = BucketedArrayPool::<u8>::builder()
            .min_array_len(nz!(16))
            .max_outstanding_elements(nz!(20))
            .build();

        // 17 rounds up to 32, which exceeds the limit even though 17 alone would not.
        assert!(matches!(
            pool.rent(17),
            Err(Error::PoolExhausted { .. })
        ));
        assert_eq!(pool.outstanding_elements(), 0);
    }

    #[test]
    fn allocation_failure_is_reported_and_not_counted() {
        let pool = BucketedArrayPool::<u64>::new();

        let error = pool.rent(usize::MAX / 2).unwrap_err();

        assert!(matches!(error, Error::AllocationFailed { .. }));
        assert_eq!(pool.outstanding_elements(), 0);
    }

    #[test]
    fn default_pool_has_expected_bucket_range() {
        let pool = BucketedArrayPool::<u8>::new();

        assert_eq!(pool.bucket_index(1), Some(0));
        assert_eq!(pool.bucket_index(16), Some(0));
        assert_eq!(pool.bucket_index(17), Some(1));
        assert_eq!(pool.bucket_index(1024 * 1024), Some(16));
        assert_eq!(pool.bucket_index(1024 * 1024 + 1), None);
        assert_eq!(pool.buckets.borrow().len(), 17);
    }
}
