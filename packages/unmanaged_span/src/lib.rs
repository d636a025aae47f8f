#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Typed views over raw memory that does not belong to the viewer.
//!
//! This package provides the low-level building blocks for code that reads and writes
//! contiguous plain-data values through raw pointers:
//!
//! * [`UnmanagedSpan<T>`] - a `(pointer, length)` view over a memory region whose length is a
//!   machine word and is therefore not limited to what a 32-bit index can address. The span
//!   offers bulk fill, clear and copy operations as well as two ways to iterate: per element
//!   via [`elements()`][UnmanagedSpan::elements] and per bounded chunk via
//!   [`chunks()`][UnmanagedSpan::chunks].
//! * [`Pointer<T>`] - a typed pointer that never owns its referent, compared and hashed by
//!   address.
//! * [`Unmanaged`] - the marker trait for plain-data types that may be viewed as raw bytes,
//!   with [`as_bytes()`] and [`as_bytes_mut()`] to do exactly that.
//!
//! # Chunked access
//!
//! Many bulk primitives operate on native slices and interoperate with APIs that index with
//! 32-bit signed integers. The chunk iterator splits a span of any length into slices of at
//! most [`MAX_CHUNK_LEN`] elements, so such code can process arbitrarily large regions without
//! ever constructing an out-of-range length.
//!
//! ```
//! use unmanaged_span::UnmanagedSpan;
//!
//! let mut storage = vec![0_u32; 1000];
//!
//! // SAFETY: The vector outlives the span and is not otherwise accessed while the span is used.
//! let mut span = unsafe { UnmanagedSpan::from_raw_parts(storage.as_mut_ptr(), storage.len()) };
//!
//! span.fill(7);
//!
//! let total: usize = span.chunks().map(|chunk| chunk.len()).sum();
//! assert_eq!(total, 1000);
//!
//! drop(span);
//! assert!(storage.iter().all(|&x| x == 7));
//! ```

mod chunks;
mod elements;
mod pointer;
mod span;
mod unmanaged;

pub use chunks::*;
pub use elements::*;
pub use pointer::*;
pub use span::*;
pub use unmanaged::*;
