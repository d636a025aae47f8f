use std::any::type_name;
use std::fmt;
use std::ptr;

use crate::{Chunks, Elements, Unmanaged};

/// A view over a contiguous region of raw memory holding values of type `T`.
///
/// The span is a `(pointer, length)` pair. It never owns the memory it points to - keeping the
/// memory alive and free of conflicting access is the responsibility of whoever creates the span.
/// The length is a machine word and is not limited to the range of a 32-bit index.
///
/// Bulk operations are provided directly:
///
/// * [`fill()`][Self::fill] writes one value to every element.
/// * [`clear()`][Self::clear] zeroes every byte.
/// * [`try_copy_to()`][Self::try_copy_to] copies into another span if it fits.
///
/// For anything else, iterate either per element via [`elements()`][Self::elements] or per
/// native slice via [`chunks()`][Self::chunks]. The chunk iterator is the only way to obtain
/// native slices from a span; each chunk holds at most [`MAX_CHUNK_LEN`][crate::MAX_CHUNK_LEN]
/// elements.
///
/// # Thread safety
///
/// The span is neither [`Send`] nor [`Sync`]. It is meant to be used by a single owner.
///
/// # Example
///
/// ```
/// use unmanaged_span::UnmanagedSpan;
///
/// let mut source = [1_u64, 2, 3];
/// let mut destination = [0_u64; 4];
///
/// // SAFETY: Both arrays outlive the spans and are not otherwise accessed while the spans exist.
/// let (source_span, mut destination_span) = unsafe {
///     (
///         UnmanagedSpan::from_raw_parts(source.as_mut_ptr(), source.len()),
///         UnmanagedSpan::from_raw_parts(destination.as_mut_ptr(), destination.len()),
///     )
/// };
///
/// assert!(source_span.try_copy_to(&mut destination_span));
///
/// assert_eq!(destination, [1, 2, 3, 0]);
/// ```
pub struct UnmanagedSpan<T: Unmanaged> {
    ptr: *mut T,
    len: usize,
}

impl<T: Unmanaged> UnmanagedSpan<T> {
    /// Creates a span over `len` elements starting at `ptr`.
    ///
    /// # Safety
    ///
    /// Unless `len` is zero, the caller must guarantee that:
    ///
    /// * `ptr` is non-null, aligned for `T` and valid for reads and writes of `len` elements,
    ///   all inside a single allocation, for as long as the span or anything derived from it
    ///   (slices, iterators, sub-spans) is used.
    /// * No other code reads or writes the region while the span is in use, except through the
    ///   span and what is derived from it.
    ///
    /// A null pointer is accepted when `len` is zero, producing an empty span.
    #[must_use]
    pub unsafe fn from_raw_parts(ptr: *mut T, len: usize) -> Self {
        debug_assert!(
            len == 0 || !ptr.is_null(),
            "non-empty span of {} must have a non-null pointer",
            type_name::<T>()
        );

        Self { ptr, len }
    }

    /// Creates a span of length zero that points nowhere.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            ptr: ptr::null_mut(),
            len: 0,
        }
    }

    /// The number of elements in the span.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the span refers to no elements, either because its length is zero or because its
    /// pointer is null.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ptr.is_null() || self.len == 0
    }

    /// The pointer to the first element.
    #[must_use]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr
    }

    /// The number of bytes covered by the span.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.len
            .checked_mul(size_of::<T>())
            .expect("span must fit in a single allocation, which cannot exceed isize::MAX bytes")
    }

    /// Returns a shared reference to the element at `index`, or `None` if out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }

        // SAFETY: Bounds checked above; validity of the region is a construction precondition.
        Some(unsafe { &*self.ptr.add(index) })
    }

    /// Returns an exclusive reference to the element at `index`, or `None` if out of bounds.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }

        // SAFETY: Bounds checked above; validity of the region is a construction precondition.
        // We hold `&mut self`, so no other reference is handed out through this span.
        Some(unsafe { &mut *self.ptr.add(index) })
    }

    /// Writes `value` to every element of the span.
    ///
    /// Single-byte element types are filled with one bulk byte fill over the whole region.
    /// Wider types are filled one native chunk at a time.
    pub fn fill(&mut self, value: T) {
        if self.is_empty() {
            return;
        }

        if size_of::<T>() == 1 {
            // SAFETY: `T` is one byte without padding, so reading it as `u8` is valid.
            let byte = unsafe { ptr::from_ref(&value).cast::<u8>().read() };

            // SAFETY: The region is valid for writes of `len` elements of one byte each and
            // any byte is a valid `T` as guaranteed by `Unmanaged`.
            unsafe {
                self.ptr.cast::<u8>().write_bytes(byte, self.len);
            }
        } else {
            for chunk in self.chunks() {
                chunk.fill(value);
            }
        }
    }

    /// Sets every byte of the span to zero.
    pub fn clear(&mut self) {
        if self.is_empty() {
            return;
        }

        // SAFETY: The region is valid for writes of `len` elements and all-zero is a valid value
        // of any `Unmanaged` type.
        unsafe {
            self.ptr.write_bytes(0, self.len);
        }
    }

    /// Copies all elements of this span to the start of `destination`.
    ///
    /// The copy happens only if the whole span fits. Returns `false` without writing anything if
    /// `destination` is shorter than this span. Overlapping regions are handled correctly.
    #[must_use]
    pub fn try_copy_to(&self, destination: &mut Self) -> bool {
        if self.len > destination.len {
            return false;
        }

        if self.is_empty() {
            return true;
        }

        // SAFETY: Both regions are valid for `self.len` elements (the destination is at least as
        // long). `ptr::copy` permits overlap.
        unsafe {
            ptr::copy(self.ptr, destination.ptr, self.len);
        }

        true
    }

    /// Returns a span over the elements from `offset` to the end of this span.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that `offset <= self.len()`. The new span is subject to the same
    /// requirements as this one and the caller must not use overlapping spans to create
    /// conflicting references.
    #[must_use]
    pub unsafe fn slice_from_unchecked(&self, offset: usize) -> Self {
        debug_assert!(
            offset <= self.len,
            "slice offset {offset} out of bounds of span with length {}",
            self.len
        );

        // SAFETY: The caller guarantees that `offset <= self.len`.
        let len = unsafe { self.len.unchecked_sub(offset) };

        // SAFETY: Forwarding the caller's guarantee.
        unsafe { self.slice_unchecked(offset, len) }
    }

    /// Returns a span over `len` elements starting at `offset` in this span.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that `offset + len <= self.len()`. The new span is subject to
    /// the same requirements as this one and the caller must not use overlapping spans to create
    /// conflicting references.
    #[must_use]
    pub unsafe fn slice_unchecked(&self, offset: usize, len: usize) -> Self {
        debug_assert!(
            offset.checked_add(len).is_some_and(|end| end <= self.len),
            "slice {offset}+{len} out of bounds of span with length {}",
            self.len
        );

        if self.ptr.is_null() {
            return Self::empty();
        }

        Self {
            // SAFETY: The caller guarantees the offset is inside (or one past the end of) the
            // region, which is a single allocation.
            ptr: unsafe { self.ptr.add(offset) },
            len,
        }
    }

    /// Returns an iterator over native slices that together cover the span in order.
    ///
    /// Each slice holds `min(remaining, MAX_CHUNK_LEN)` elements. An empty span yields no slices.
    pub fn chunks(&mut self) -> Chunks<'_, T> {
        let len = if self.ptr.is_null() { 0 } else { self.len };

        // SAFETY: The region is valid per the construction precondition and we hold `&mut self`
        // for the lifetime of the iterator.
        unsafe { Chunks::new(self.ptr, len) }
    }

    /// Returns an iterator over exclusive references to each element in order.
    pub fn elements(&mut self) -> Elements<'_, T> {
        let len = if self.ptr.is_null() { 0 } else { self.len };

        // SAFETY: The region is valid per the construction precondition and we hold `&mut self`
        // for the lifetime of the iterator.
        unsafe { Elements::new(self.ptr, len) }
    }
}

impl<T: Unmanaged> Default for UnmanagedSpan<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Unmanaged> fmt::Debug for UnmanagedSpan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

impl<T: Unmanaged> fmt::Display for UnmanagedSpan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UnmanagedSpan<{}>[{:#X}][{}]",
            type_name::<T>(),
            self.ptr.addr(),
            self.len
        )
    }
}
