use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZero;

use new_zealand::nz;

use crate::BucketedArrayPool;

pub(crate) const DEFAULT_MIN_ARRAY_LEN: NonZero<usize> = nz!(16);
pub(crate) const DEFAULT_MAX_ARRAY_LEN: NonZero<usize> = nz!(1_048_576);
pub(crate) const DEFAULT_ARRAYS_PER_BUCKET: NonZero<usize> = nz!(32);

/// Builder for creating an instance of [`BucketedArrayPool`].
///
/// You only need to use this builder if you want to customize the pool configuration.
/// The default configuration used by [`BucketedArrayPool::new()`][1] is sufficient for most use
/// cases.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use pooled_buffer::BucketedArrayPool;
///
/// let pool = BucketedArrayPool::<u8>::builder()
///     .min_array_len(NonZero::new(64).unwrap())
///     .max_array_len(NonZero::new(64 * 1024).unwrap())
///     .arrays_per_bucket(NonZero::new(8).unwrap())
///     .build();
/// ```
///
/// [1]: BucketedArrayPool::new
#[must_use]
pub struct BucketedArrayPoolBuilder<T> {
    min_array_len: NonZero<usize>,
    max_array_len: NonZero<usize>,
    arrays_per_bucket: NonZero<usize>,
    max_outstanding_elements: Option<NonZero<usize>>,

    _item: PhantomData<T>,
}

impl<T> fmt::Debug for BucketedArrayPoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketedArrayPoolBuilder")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("min_array_len", &self.min_array_len)
            .field("max_array_len", &self.max_array_len)
            .field("arrays_per_bucket", &self.arrays_per_bucket)
            .field("max_outstanding_elements", &self.max_outstanding_elements)
            .finish()
    }
}

impl<T> BucketedArrayPoolBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            min_array_len: DEFAULT_MIN_ARRAY_LEN,
            max_array_len: DEFAULT_MAX_ARRAY_LEN,
            arrays_per_bucket: DEFAULT_ARRAYS_PER_BUCKET,
            max_outstanding_elements: None,
            _item: PhantomData,
        }
    }

    /// Sets the length of the arrays in the smallest bucket. Smaller requests are rounded up to
    /// this length. Must be a power of two.
    pub fn min_array_len(mut self, len: NonZero<usize>) -> Self {
        self.min_array_len = len;
        self
    }

    /// Sets the length of the arrays in the largest bucket. Larger requests are served with
    /// exact-length arrays that the pool does not keep when they are returned. Must be a power
    /// of two.
    pub fn max_array_len(mut self, len: NonZero<usize>) -> Self {
        self.max_array_len = len;
        self
    }

    /// Sets how many returned arrays each bucket keeps for reuse. Arrays returned to a full
    /// bucket are released to the memory allocator.
    pub fn arrays_per_bucket(mut self, count: NonZero<usize>) -> Self {
        self.arrays_per_bucket = count;
        self
    }

    /// Limits the total number of elements that may be rented out and not yet returned at the
    /// same time. Rents that would exceed the limit fail with
    /// [`Error::PoolExhausted`][crate::Error::PoolExhausted].
    ///
    /// By default, there is no limit.
    pub fn max_outstanding_elements(mut self, limit: NonZero<usize>) -> Self {
        self.max_outstanding_elements = Some(limit);
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if either array length bound is not a power of two or if the minimum is greater
    /// than the maximum.
    ///
    /// # Examples
    ///
    /// ```
    /// use pooled_buffer::BucketedArrayPool;
    ///
    /// let pool = BucketedArrayPool::<u32>::builder().build();
    /// ```
    #[must_use]
    pub fn build(self) -> BucketedArrayPool<T>
    where
        T: Copy + Default,
    {
        assert!(
            self.min_array_len.is_power_of_two(),
            "min_array_len must be a power of two, got {}",
            self.min_array_len
        );
        assert!(
            self.max_array_len.is_power_of_two(),
            "max_array_len must be a power of two, got {}",
            self.max_array_len
        );
        assert!(
            self.min_array_len <= self.max_array_len,
            "min_array_len {} must not be greater than max_array_len {}",
            self.min_array_len,
            self.max_array_len
        );

        BucketedArrayPool::new_inner(
            self.min_array_len,
            self.max_array_len,
            self.arrays_per_bucket,
            self.max_outstanding_elements,
        )
    }
}
