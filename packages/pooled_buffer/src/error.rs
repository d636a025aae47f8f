use std::collections::TryReserveError;

use thiserror::Error;

/// Errors that can occur when renting storage or growing a buffer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The size a buffer needed to grow to is not representable as an element count.
    #[error(
        "capacity overflow: cannot grow a buffer of capacity {capacity} to fit {size_hint} more elements"
    )]
    CapacityOverflow {
        /// The capacity of the buffer before the attempted growth.
        capacity: usize,

        /// The number of additional elements that were requested.
        size_hint: usize,
    },

    /// The pool refused the rent because it would exceed the configured limit on elements that
    /// may be rented out at the same time.
    #[error(
        "pool exhausted: renting {requested} elements with {outstanding} already rented would exceed the limit of {limit}"
    )]
    PoolExhausted {
        /// The number of elements the caller asked for.
        requested: usize,

        /// The number of elements rented out and not yet returned at the time of the request.
        outstanding: usize,

        /// The configured limit on outstanding elements.
        limit: usize,
    },

    /// The memory allocator could not provide a new array.
    #[error("allocation of an array of {len} elements failed")]
    AllocationFailed {
        /// The length of the array that could not be allocated.
        len: usize,

        /// The underlying allocation failure.
        #[source]
        source: TryReserveError,
    },
}

/// A specialized `Result` type for pooled buffer operations, returning the crate's [`Error`]
/// type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
