use std::{ptr, slice};

/// Marker for plain-data types whose storage may be treated as raw bytes.
///
/// Values of these types can be filled byte by byte, zeroed, copied with bulk memory primitives
/// and reinterpreted as byte sequences without going through any constructor.
///
/// # Safety
///
/// Implementing types must satisfy all of the following:
///
/// * The type contains no padding bytes.
/// * Every bit pattern of `size_of::<Self>()` bytes is a valid value, including all zeroes.
/// * The type has no drop glue and no interior mutability (implied by `Copy + 'static` for
///   everything we implement it for).
pub unsafe trait Unmanaged: Copy + 'static {}

macro_rules! impl_unmanaged {
    ($($t:ty),* $(,)?) => {
        $(
            // SAFETY: Primitive integers and floats have no padding and accept any bit pattern.
            unsafe impl Unmanaged for $t {}
        )*
    };
}

impl_unmanaged!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64
);

// SAFETY: Arrays are laid out without padding between elements, so if the element type has no
// padding and accepts any bit pattern, so does the array.
unsafe impl<T: Unmanaged, const N: usize> Unmanaged for [T; N] {}

/// Views the storage of a value as a byte slice in native byte order.
///
/// # Example
///
/// ```
/// use unmanaged_span::as_bytes;
///
/// let value = 0x0102_0304_u32;
/// assert_eq!(as_bytes(&value), &value.to_ne_bytes());
/// ```
#[must_use]
pub fn as_bytes<T: Unmanaged>(value: &T) -> &[u8] {
    // SAFETY: `Unmanaged` guarantees there are no padding bytes, so every byte of the value is
    // initialized. The lifetime of the result is tied to the borrowed value.
    unsafe { slice::from_raw_parts(ptr::from_ref(value).cast::<u8>(), size_of::<T>()) }
}

/// Views the storage of a value as a mutable byte slice in native byte order.
///
/// Any bytes written through the returned slice produce a valid value of `T`.
///
/// # Example
///
/// ```
/// use unmanaged_span::as_bytes_mut;
///
/// let mut value = 0_u16;
/// as_bytes_mut(&mut value).copy_from_slice(&0xABCD_u16.to_ne_bytes());
/// assert_eq!(value, 0xABCD);
/// ```
#[must_use]
pub fn as_bytes_mut<T: Unmanaged>(value: &mut T) -> &mut [u8] {
    // SAFETY: `Unmanaged` guarantees there are no padding bytes and that any bit pattern is a
    // valid value, so arbitrary byte writes cannot produce an invalid `T`. We hold the only
    // reference to the value for the lifetime of the result.
    unsafe { slice::from_raw_parts_mut(ptr::from_mut(value).cast::<u8>(), size_of::<T>()) }
}
