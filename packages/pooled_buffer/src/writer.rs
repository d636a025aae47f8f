use std::any::type_name;
use std::{fmt, io};

use tracing::trace;

use crate::{ArrayPool, BufferWriter, Error, PooledArray, Result};

/// The capacity of the first array a writer rents when it grows from the empty state.
pub const DEFAULT_INITIAL_SIZE: usize = 64;

/// An append-only buffer whose backing array is rented from an [`ArrayPool`].
///
/// The writer starts out empty, holding no array at all. The first write rents an array of at
/// least [`DEFAULT_INITIAL_SIZE`] elements. Whenever the free capacity runs out, the writer rents
/// an array at least twice as large, copies the written elements over and returns the old array
/// to the pool. Appending `N` elements therefore causes `O(log N)` reallocations.
///
/// When you are done writing, either read the output via [`written()`][Self::written] and
/// [`reset()`][Self::reset] the writer for reuse, or take ownership of the backing array via
/// [`detach()`][Self::detach]. Dropping the writer returns its array to the pool.
///
/// # Example
///
/// ```
/// use pooled_buffer::{BucketedArrayPool, BufferWriter, PooledBufferWriter};
///
/// let pool = BucketedArrayPool::<u32>::new();
/// let mut writer = PooledBufferWriter::new(&pool);
///
/// let region = writer.writable(3)?;
/// region[..3].copy_from_slice(&[1, 2, 3]);
/// writer.advance(3);
///
/// writer.write_slice(&[4, 5])?;
///
/// assert_eq!(writer.written(), &[1, 2, 3, 4, 5]);
///
/// writer.reset();
/// assert_eq!(writer.capacity(), 0);
/// assert_eq!(pool.outstanding_elements(), 0);
/// # Ok::<(), pooled_buffer::Error>(())
/// ```
pub struct PooledBufferWriter<'p, T, P>
where
    P: ArrayPool<T> + ?Sized,
{
    pool: &'p P,

    /// `None` in the empty state. Anything held here was rented from `pool`.
    backing: Option<Box<[T]>>,

    /// Always `<= capacity()`.
    written: usize,
}

impl<'p, T, P> PooledBufferWriter<'p, T, P>
where
    T: Copy,
    P: ArrayPool<T> + ?Sized,
{
    /// Creates an empty writer that rents from `pool` once something is written.
    #[must_use]
    pub fn new(pool: &'p P) -> Self {
        Self {
            pool,
            backing: None,
            written: 0,
        }
    }

    /// Creates a writer that starts out with at least `capacity` elements of free capacity.
    ///
    /// A `capacity` of zero creates an empty writer without contacting the pool.
    ///
    /// # Errors
    ///
    /// Returns the pool's error unchanged if the pool cannot satisfy the request.
    pub fn with_capacity(pool: &'p P, capacity: usize) -> Result<Self> {
        let backing = if capacity == 0 {
            None
        } else {
            Some(pool.rent(capacity)?)
        };

        Ok(Self {
            pool,
            backing,
            written: 0,
        })
    }

    /// The length of the backing array, or zero if the writer is empty.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.backing.as_deref().map_or(0, <[T]>::len)
    }

    /// The number of elements written so far.
    #[must_use]
    pub fn written_count(&self) -> usize {
        self.written
    }

    /// The number of elements that can be written before the writer needs to grow.
    #[must_use]
    pub fn free_capacity(&self) -> usize {
        self.capacity()
            .checked_sub(self.written)
            .expect("written count never exceeds capacity")
    }

    /// The elements written so far.
    #[must_use]
    pub fn written(&self) -> &[T] {
        self.backing
            .as_deref()
            .unwrap_or(&[])
            .get(..self.written)
            .expect("written count never exceeds capacity")
    }

    /// The elements written so far, for in-place modification.
    #[must_use]
    pub fn written_mut(&mut self) -> &mut [T] {
        let written = self.written;

        self.backing
            .as_deref_mut()
            .unwrap_or(&mut [])
            .get_mut(..written)
            .expect("written count never exceeds capacity")
    }

    /// Ensures that at least `max(size_hint, 1)` elements can be written without growing.
    ///
    /// If the free capacity is insufficient, a larger array is rented from the pool, the written
    /// elements are copied into it and the previous array is returned to the pool. If this fails,
    /// the writer is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityOverflow`] if the grown capacity is not representable. Returns
    /// the pool's error unchanged if the pool cannot provide the larger array.
    pub fn reserve(&mut self, size_hint: usize) -> Result<()> {
        let size_hint = size_hint.max(1);

        if self.free_capacity() >= size_hint {
            return Ok(());
        }

        let capacity = self.capacity();

        // The first array is not doubled, so a fresh writer starts at exactly the floor.
        let new_size = if self.backing.is_none() {
            size_hint.max(DEFAULT_INITIAL_SIZE)
        } else {
            capacity
                .max(DEFAULT_INITIAL_SIZE)
                .max(size_hint)
                .checked_mul(2)
                .ok_or(Error::CapacityOverflow {
                    capacity,
                    size_hint,
                })?
        };

        let mut new_backing = self.pool.rent(new_size)?;

        new_backing
            .get_mut(..self.written)
            .expect("pool returned an array shorter than requested")
            .copy_from_slice(self.written());

        trace!(
            item_type = type_name::<T>(),
            old_capacity = capacity,
            new_capacity = new_backing.len(),
            written = self.written,
            "growing pooled buffer writer"
        );

        if let Some(old_backing) = self.backing.replace(new_backing) {
            self.pool.return_array(old_backing);
        }

        Ok(())
    }

    /// Returns the free region of the backing array after ensuring that it holds at least
    /// `max(size_hint, 1)` elements.
    ///
    /// Write into the start of the region, then call [`advance()`][Self::advance] with the number
    /// of elements written. The region may contain values left behind by a previous renter of
    /// the array.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`reserve()`][Self::reserve].
    pub fn writable(&mut self, size_hint: usize) -> Result<&mut [T]> {
        self.reserve(size_hint)?;

        let written = self.written;

        Ok(self
            .backing
            .as_deref_mut()
            .expect("reserve() always leaves the writer with a backing array")
            .get_mut(written..)
            .expect("written count never exceeds capacity"))
    }

    /// Commits `count` elements written into the region returned by
    /// [`writable()`][Self::writable].
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the free capacity.
    pub fn advance(&mut self, count: usize) {
        let free_capacity = self.free_capacity();

        assert!(
            count <= free_capacity,
            "cannot advance by {count} elements with only {free_capacity} elements of free capacity"
        );

        self.written = self
            .written
            .checked_add(count)
            .expect("bounded by capacity, which is a valid array length");
    }

    /// Moves the backing array out of the writer into a caller-owned [`PooledArray`].
    ///
    /// The array is not returned to the pool by the writer; the returned handle does that when it
    /// is released. The handle covers the full backing array, of which only the first
    /// [`written_count()`][Self::written_count] elements were written. The writer is left empty
    /// and can be reused.
    ///
    /// Detaching an empty writer yields an empty handle.
    #[must_use]
    pub fn detach(&mut self) -> PooledArray<'p, T, P> {
        let written = self.written;
        self.written = 0;

        match self.backing.take() {
            Some(backing) => {
                trace!(
                    item_type = type_name::<T>(),
                    capacity = backing.len(),
                    written,
                    "detaching pooled buffer writer"
                );

                PooledArray::from_rented(self.pool, backing)
            }
            None => PooledArray::empty(self.pool),
        }
    }

    /// Returns the backing array to the pool and leaves the writer empty.
    ///
    /// Does nothing if the writer is already empty.
    pub fn reset(&mut self) {
        self.written = 0;

        if let Some(backing) = self.backing.take() {
            self.pool.return_array(backing);
        }
    }
}

impl<T, P> BufferWriter<T> for PooledBufferWriter<'_, T, P>
where
    T: Copy,
    P: ArrayPool<T> + ?Sized,
{
    fn writable(&mut self, size_hint: usize) -> Result<&mut [T]> {
        Self::writable(self, size_hint)
    }

    fn advance(&mut self, count: usize) {
        Self::advance(self, count);
    }
}

impl<P> io::Write for PooledBufferWriter<'_, u8, P>
where
    P: ArrayPool<u8> + ?Sized,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_slice(buf).map_err(io::Error::other)?;

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T, P> Drop for PooledBufferWriter<'_, T, P>
where
    P: ArrayPool<T> + ?Sized,
{
    #[cfg_attr(test, mutants::skip)] // Skipping the return only leaks pool capacity.
    fn drop(&mut self) {
        if let Some(backing) = self.backing.take() {
            self.pool.return_array(backing);
        }
    }
}

impl<T, P> fmt::Debug for PooledBufferWriter<'_, T, P>
where
    P: ArrayPool<T> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field(
                "capacity",
                &self.backing.as_deref().map_or(0, <[T]>::len),
            )
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}
