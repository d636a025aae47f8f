use crate::Result;

/// A pool that rents out arrays of `T` and takes them back for reuse.
///
/// Implementations decide how arrays are stored and when new ones are allocated. Consumers in
/// this package rely only on the contract below.
///
/// # Contract
///
/// * [`rent()`][Self::rent] never returns an array shorter than requested. It may return a
///   longer one. A request for zero elements may return an empty array.
/// * Rented arrays may contain values left behind by a previous renter.
/// * [`return_array()`][Self::return_array] only accepts arrays previously rented from the same
///   pool. Because the array is moved into the call, returning the same array twice cannot
///   happen in safe code.
///
/// A pool is not required to be thread-safe. Writers and pooled arrays borrow the pool, so the
/// borrow checker enforces that the pool outlives everything rented from it.
pub trait ArrayPool<T> {
    /// Rents an array of at least `min_len` elements.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot satisfy the request. Callers in this package propagate
    /// the error unchanged.
    fn rent(&self, min_len: usize) -> Result<Box<[T]>>;

    /// Returns a previously rented array to the pool.
    fn return_array(&self, array: Box<[T]>);
}

impl<T, P> ArrayPool<T> for &P
where
    P: ArrayPool<T> + ?Sized,
{
    fn rent(&self, min_len: usize) -> Result<Box<[T]>> {
        (**self).rent(min_len)
    }

    fn return_array(&self, array: Box<[T]>) {
        (**self).return_array(array);
    }
}
