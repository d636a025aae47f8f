use std::any::type_name;
use std::fmt;
use std::ops::{Deref, DerefMut};

use unmanaged_span::{Unmanaged, UnmanagedSpan};

use crate::{ArrayPool, Result};

/// Owns one array rented from an [`ArrayPool`] and returns it to the pool exactly once.
///
/// A handle is either *live*, holding the rented array, or *empty*, holding nothing. Releasing a
/// live handle returns the array to the pool and makes the handle empty. Releasing an empty
/// handle does nothing, so the same array can never be returned twice. Dropping the handle
/// releases it.
///
/// The handle dereferences to the full rented array, which may be longer than requested and may
/// contain values left behind by a previous renter. An empty handle dereferences to an empty
/// slice.
///
/// # Example
///
/// ```
/// use pooled_buffer::{BucketedArrayPool, PooledArray};
///
/// let pool = BucketedArrayPool::<u16>::new();
///
/// let mut array = PooledArray::acquire(&pool, 20)?;
/// assert!(array.len() >= 20);
///
/// array[..3].copy_from_slice(&[1, 2, 3]);
/// assert_eq!(array[..3], [1, 2, 3]);
///
/// array.release();
/// assert!(!array.is_live());
/// assert!(array.is_empty());
///
/// assert_eq!(pool.outstanding_elements(), 0);
/// # Ok::<(), pooled_buffer::Error>(())
/// ```
pub struct PooledArray<'p, T, P>
where
    P: ArrayPool<T> + ?Sized,
{
    pool: &'p P,
    array: Option<Box<[T]>>,
}

impl<'p, T, P> PooledArray<'p, T, P>
where
    P: ArrayPool<T> + ?Sized,
{
    /// Rents an array of at least `len` elements from `pool`.
    ///
    /// # Errors
    ///
    /// Returns the pool's error unchanged if the pool cannot satisfy the request.
    pub fn acquire(pool: &'p P, len: usize) -> Result<Self> {
        let array = pool.rent(len)?;

        Ok(Self::from_rented(pool, array))
    }

    /// Takes ownership of an array that was already rented from `pool`.
    ///
    /// The array will be returned to `pool` when the handle is released.
    #[must_use]
    pub fn from_rented(pool: &'p P, array: Box<[T]>) -> Self {
        Self {
            pool,
            array: Some(array),
        }
    }

    /// A handle that holds nothing and returns nothing.
    pub(crate) fn empty(pool: &'p P) -> Self {
        Self { pool, array: None }
    }

    /// Whether the handle still holds its rented array.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.array.is_some()
    }

    /// The rented array as a shared slice. Empty if the handle has been released.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        self.array.as_deref().unwrap_or(&[])
    }

    /// The rented array as an exclusive slice. Empty if the handle has been released.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.array.as_deref_mut().unwrap_or(&mut [])
    }

    /// Creates an unmanaged span over the full rented array.
    ///
    /// # Safety
    ///
    /// The span does not borrow the handle. The caller must not use the span or anything derived
    /// from it after the handle is released, dropped or accessed through any other method.
    #[must_use]
    pub unsafe fn as_unmanaged_span(&mut self) -> UnmanagedSpan<T>
    where
        T: Unmanaged,
    {
        let slice = self.as_mut_slice();

        // SAFETY: The slice is a valid, exclusively borrowed region of `slice.len()` elements.
        // Keeping it valid for the life of the span is forwarded to the caller.
        unsafe { UnmanagedSpan::from_raw_parts(slice.as_mut_ptr(), slice.len()) }
    }

    /// Returns the array to the pool if the handle still holds it. Does nothing otherwise.
    pub fn release(&mut self) {
        if let Some(array) = self.array.take() {
            self.pool.return_array(array);
        }
    }
}

impl<T, P> Deref for PooledArray<'_, T, P>
where
    P: ArrayPool<T> + ?Sized,
{
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T, P> DerefMut for PooledArray<'_, T, P>
where
    P: ArrayPool<T> + ?Sized,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T, P> Drop for PooledArray<'_, T, P>
where
    P: ArrayPool<T> + ?Sized,
{
    #[cfg_attr(test, mutants::skip)] // Skipping release only leaks pool capacity.
    fn drop(&mut self) {
        self.release();
    }
}

impl<T, P> fmt::Debug for PooledArray<'_, T, P>
where
    P: ArrayPool<T> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("len", &self.as_slice().len())
            .field("is_live", &self.is_live())
            .finish_non_exhaustive()
    }
}
