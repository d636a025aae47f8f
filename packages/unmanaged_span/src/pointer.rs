use std::any::type_name;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;

/// A typed pointer that never owns the value it points to.
///
/// This is a thin wrapper over `*mut T` that carries the element type in its formatting and
/// compares and hashes by address only. Two pointers are equal if they point to the same
/// address, no matter what values are stored there.
///
/// # Example
///
/// ```
/// use unmanaged_span::Pointer;
///
/// let mut value = 42_u32;
/// let pointer = Pointer::new(&raw mut value);
///
/// assert!(!pointer.is_null());
/// assert_eq!(pointer, Pointer::new(&raw mut value));
///
/// // SAFETY: The pointer refers to a live, initialized value.
/// assert_eq!(unsafe { pointer.read() }, 42);
/// ```
pub struct Pointer<T> {
    ptr: *mut T,
}

impl<T> Pointer<T> {
    /// Wraps a raw pointer.
    #[must_use]
    pub const fn new(ptr: *mut T) -> Self {
        Self { ptr }
    }

    /// A pointer to nothing.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            ptr: ptr::null_mut(),
        }
    }

    /// Whether the pointer is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// The wrapped raw pointer.
    #[must_use]
    pub const fn as_ptr(&self) -> *mut T {
        self.ptr
    }

    /// Reads a copy of the value the pointer refers to.
    ///
    /// # Safety
    ///
    /// The pointer must be non-null, aligned and point to an initialized value of type `T` that
    /// is not being written concurrently.
    #[must_use]
    pub unsafe fn read(&self) -> T
    where
        T: Copy,
    {
        // SAFETY: Forwarding the caller's guarantee.
        unsafe { self.ptr.read() }
    }

    /// Creates a shared reference to the value the pointer refers to.
    ///
    /// # Safety
    ///
    /// The pointer must be non-null, aligned and point to an initialized value of type `T`. No
    /// exclusive reference to the value may exist for the chosen lifetime `'a`.
    #[must_use]
    pub unsafe fn as_ref<'a>(&self) -> &'a T {
        // SAFETY: Forwarding the caller's guarantee.
        unsafe { &*self.ptr }
    }

    /// Creates an exclusive reference to the value the pointer refers to.
    ///
    /// # Safety
    ///
    /// The pointer must be non-null, aligned and point to an initialized value of type `T`. No
    /// other reference to the value may exist for the chosen lifetime `'a`.
    #[must_use]
    #[allow(
        clippy::mut_from_ref,
        reason = "the pointer does not own the value, exclusivity is the caller's guarantee"
    )]
    pub unsafe fn as_mut<'a>(&self) -> &'a mut T {
        // SAFETY: Forwarding the caller's guarantee.
        unsafe { &mut *self.ptr }
    }
}

// Manual impls because derives would require `T: Clone` and friends, which is irrelevant for
// a pointer.
impl<T> Clone for Pointer<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Pointer<T> {}

impl<T> PartialEq for Pointer<T> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.ptr, other.ptr)
    }
}

impl<T> Eq for Pointer<T> {}

impl<T> Hash for Pointer<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ptr.addr().hash(state);
    }
}

impl<T> Default for Pointer<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<*mut T> for Pointer<T> {
    fn from(ptr: *mut T) -> Self {
        Self::new(ptr)
    }
}

impl<T> From<Pointer<T>> for *mut T {
    fn from(pointer: Pointer<T>) -> Self {
        pointer.ptr
    }
}

impl<T> fmt::Debug for Pointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<T> fmt::Display for Pointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:#X})<{}>*", self.ptr.addr(), type_name::<T>())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::HashSet;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(Pointer<String>: Copy, Eq, Hash);
    assert_not_impl_any!(Pointer<u8>: Send, Sync);

    #[test]
    fn is_null_for_real_value_is_false() {
        let mut value = 5_i32;
        let pointer = Pointer::new(&raw mut value);

        assert!(!pointer.is_null());
    }

    #[test]
    fn default_is_null() {
        let pointer = Pointer::<i32>::default();

        assert!(pointer.is_null());
        assert_eq!(pointer, Pointer::null());
    }

    #[test]
    fn equality_is_by_address_not_value() {
        let mut a = 1_u8;
        let mut b = 1_u8;

        let pa = Pointer::new(&raw mut a);
        let pb = Pointer::new(&raw mut b);

        assert_ne!(pa, pb);
        assert_eq!(pa, Pointer::from(&raw mut a));
    }

    #[test]
    fn hash_is_by_address() {
        let mut a = 1_u64;
        let mut b = 1_u64;

        let set: HashSet<_> = [
            Pointer::new(&raw mut a),
            Pointer::new(&raw mut a),
            Pointer::new(&raw mut b),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn as_mut_writes_through() {
        let mut value = 1_u16;
        let pointer = Pointer::new(&raw mut value);

        // SAFETY: No other references to the value exist while we use this one.
        unsafe {
            *pointer.as_mut() = 7;
        }

        assert_eq!(value, 7);
    }

    #[test]
    fn round_trips_through_raw_pointer() {
        let mut value = 3_i64;
        let raw = &raw mut value;

        let pointer = Pointer::from(raw);
        let back: *mut i64 = pointer.into();

        assert!(ptr::eq(raw, back));
    }

    #[test]
    fn display_includes_address_and_type() {
        let pointer = Pointer::<u32>::null();

        assert_eq!(pointer.to_string(), "(0x0)<u32>*");
    }
}
