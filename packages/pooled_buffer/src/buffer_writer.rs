use derive_more::derive::Display;
use unmanaged_span::{Unmanaged, as_bytes};

use crate::Result;

/// An append-only sink that hands out writable regions and is told afterwards how much of each
/// region was filled.
///
/// Writing follows a "reserve, write, commit" protocol:
///
/// 1. [`writable()`][Self::writable] returns a region of at least the requested size.
/// 2. The caller writes into the start of the region.
/// 3. [`advance()`][Self::advance] commits the number of elements that were written.
///
/// Nothing written into the region is considered part of the output until it is committed.
pub trait BufferWriter<T> {
    /// Returns a writable region of at least `max(size_hint, 1)` elements.
    ///
    /// The contents of the region are unspecified.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer cannot provide the requested capacity.
    fn writable(&mut self, size_hint: usize) -> Result<&mut [T]>;

    /// Commits `count` elements written into the region last returned by
    /// [`writable()`][Self::writable].
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the free capacity of the writer.
    fn advance(&mut self, count: usize);

    /// Appends a copy of `values` to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer cannot provide the capacity for `values`.
    fn write_slice(&mut self, values: &[T]) -> Result<()>
    where
        T: Copy,
    {
        if values.is_empty() {
            return Ok(());
        }

        let region = self.writable(values.len())?;

        region
            .get_mut(..values.len())
            .expect("writable() returns at least size_hint elements")
            .copy_from_slice(values);

        self.advance(values.len());

        Ok(())
    }
}

/// Byte order of a fixed-width value written to a byte buffer.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "there are only two byte orders worth supporting"
)]
pub enum Endian {
    /// Least significant byte first.
    Little,

    /// Most significant byte first.
    Big,
}

impl Endian {
    /// The byte order of the platform the code is running on.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::Little;

    /// The byte order of the platform the code is running on.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::Big;
}

macro_rules! write_fixed_width {
    ($($(#[$meta:meta])* $name:ident: $ty:ty;)*) => {
        $(
            $(#[$meta])*
            ///
            /// # Errors
            ///
            /// Returns an error if the writer cannot provide the capacity for the value.
            fn $name(&mut self, value: $ty, endian: Endian) -> Result<()> {
                let bytes = match endian {
                    Endian::Little => value.to_le_bytes(),
                    Endian::Big => value.to_be_bytes(),
                };

                self.write_slice(&bytes)
            }
        )*
    };
}

/// Writes fixed-width values to any byte [`BufferWriter`].
///
/// This trait is implemented for every `BufferWriter<u8>`. Bring it into scope to use it.
///
/// # Example
///
/// ```
/// use pooled_buffer::{BucketedArrayPool, BufferWriterExt, Endian, PooledBufferWriter};
///
/// let pool = BucketedArrayPool::<u8>::new();
/// let mut writer = PooledBufferWriter::new(&pool);
///
/// writer.write_u16(0x1234, Endian::Big)?;
/// writer.write_u16(0x1234, Endian::Little)?;
///
/// assert_eq!(writer.written(), &[0x12, 0x34, 0x34, 0x12]);
/// # Ok::<(), pooled_buffer::Error>(())
/// ```
pub trait BufferWriterExt: BufferWriter<u8> {
    /// Writes the in-memory representation of `value`, in the native byte order.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer cannot provide the capacity for the value.
    fn write_raw<V: Unmanaged>(&mut self, value: &V) -> Result<()> {
        self.write_slice(as_bytes(value))
    }

    write_fixed_width! {
        /// Writes a `u16` in the requested byte order.
        write_u16: u16;
        /// Writes an `i16` in the requested byte order.
        write_i16: i16;
        /// Writes a `u32` in the requested byte order.
        write_u32: u32;
        /// Writes an `i32` in the requested byte order.
        write_i32: i32;
        /// Writes a `u64` in the requested byte order.
        write_u64: u64;
        /// Writes an `i64` in the requested byte order.
        write_i64: i64;
        /// Writes an `f32` in the requested byte order.
        write_f32: f32;
        /// Writes an `f64` in the requested byte order.
        write_f64: f64;
    }
}

impl<W> BufferWriterExt for W where W: BufferWriter<u8> + ?Sized {}
