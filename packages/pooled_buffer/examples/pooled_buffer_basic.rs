//! Basic usage of the `pooled_buffer` crate:
//!
//! * Writing framed records into a writer backed by a shared pool.
//! * Detaching the output of one writer to keep it around.
//! * Observing pool reuse via the trace log.

use std::error::Error;

use pooled_buffer::{BucketedArrayPool, BufferWriter, BufferWriterExt, Endian, PooledBufferWriter};

fn main() -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    // The pool emits trace events for every rent and return; show them.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let pool = BucketedArrayPool::<u8>::new();

    for record in ["first", "second record", "the third and longest record of them all"] {
        let mut writer = PooledBufferWriter::new(&pool);

        // Length-prefixed frame: u16 length in network byte order, then the payload.
        let len = u16::try_from(record.len())?;
        writer.write_u16(len, Endian::Big)?;
        writer.write_slice(record.as_bytes())?;

        println!("{record:?} -> {:02X?}", writer.written());
    }

    let mut writer = PooledBufferWriter::new(&pool);
    writer.write_u64(u64::MAX, Endian::Little)?;

    let output = writer.detach();
    println!("Detached {} bytes of capacity", output.len());

    println!(
        "Pool holds {} arrays for reuse, {} elements still rented out",
        pool.retained_array_count(),
        pool.outstanding_elements()
    );

    drop(output);

    println!(
        "After dropping the output: {} elements rented out",
        pool.outstanding_elements()
    );

    Ok(())
}
