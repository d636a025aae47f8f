#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Growable output buffers backed by storage rented from an array pool.
//!
//! Code that produces a stream of values (serializers, packet builders, log formatters) tends to
//! allocate a fresh buffer for every output and throw it away afterwards. This package lets such
//! code recycle the backing storage instead:
//!
//! * [`ArrayPool<T>`] - the contract of a pool that rents out and takes back arrays of `T`.
//! * [`BucketedArrayPool<T>`] - a ready-made single-threaded pool with power-of-two size buckets.
//! * [`PooledBufferWriter<T, P>`] - an append-only buffer that rents its backing array from a
//!   pool, grows geometrically and returns the array to the pool on reset or drop.
//! * [`PooledArray<T, P>`] - owns one rented array and returns it to the pool exactly once.
//!   Writers hand over their accumulated output as one of these via
//!   [`detach()`][PooledBufferWriter::detach].
//! * [`PooledStructArray<T, P>`] and [`BytePoolExt`] - an array of plain-data values stored in
//!   bytes rented from a byte pool, so one byte pool can serve storage for any such type.
//! * [`BufferWriter<T>`] and [`BufferWriterExt`] - the "reserve, write, commit" writing protocol
//!   and fixed-width value writes in either byte order on top of it.
//!
//! # Example
//!
//! ```
//! use pooled_buffer::{BucketedArrayPool, BufferWriterExt, Endian, PooledBufferWriter};
//!
//! let pool = BucketedArrayPool::<u8>::new();
//!
//! let mut writer = PooledBufferWriter::new(&pool);
//! writer.write_u32(0xCAFE_F00D, Endian::Big)?;
//! writer.write_u16(7, Endian::Little)?;
//!
//! assert_eq!(writer.written(), &[0xCA, 0xFE, 0xF0, 0x0D, 7, 0]);
//!
//! // Take ownership of the output. The array goes back to the pool when `output` is dropped.
//! let output = writer.detach();
//! assert_eq!(output.get(..6), Some(&[0xCA, 0xFE, 0xF0, 0x0D, 7, 0][..]));
//! # Ok::<(), pooled_buffer::Error>(())
//! ```
//!
//! # Thread safety
//!
//! Writers, pooled arrays and the bucketed pool are meant for a single owner. Writers and pooled
//! arrays borrow their pool, so the pool outlives them by construction.

mod array_pool;
mod bucketed_pool;
mod buffer_writer;
mod builder;
mod error;
mod pooled_array;
mod struct_array;
mod writer;

#[cfg(test)]
mod mock_pool;

pub use array_pool::*;
pub use bucketed_pool::*;
pub use buffer_writer::*;
pub use builder::*;
pub use error::*;
pub use pooled_array::*;
pub use struct_array::*;
pub use writer::*;

#[cfg(test)]
pub(crate) use mock_pool::*;
