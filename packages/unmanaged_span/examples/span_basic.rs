//! Basic usage of the `unmanaged_span` crate:
//!
//! * Creating a span over memory owned by someone else.
//! * Filling, copying and clearing.
//! * Iterating per element and per chunk.

use unmanaged_span::UnmanagedSpan;

fn main() {
    let mut samples = vec![0_i32; 1_000];
    let mut backup = vec![0_i32; 1_000];

    // The span does not own the vector. We promise to keep the vector alive and to not touch it
    // through other means while the span is in use.
    // SAFETY: See above.
    let mut span = unsafe { UnmanagedSpan::from_raw_parts(samples.as_mut_ptr(), samples.len()) };
    println!("Created {span}");

    span.fill(-1);

    for (index, sample) in span.elements().enumerate().step_by(100) {
        *sample = i32::try_from(index).expect("index is small");
    }

    // Chunks are native slices, so anything that works on slices works on chunks.
    for chunk in span.chunks() {
        println!("Chunk of {} elements, sum {}", chunk.len(), chunk.iter().sum::<i32>());
    }

    // SAFETY: Same promise as above, for the backup vector.
    let mut backup_span =
        unsafe { UnmanagedSpan::from_raw_parts(backup.as_mut_ptr(), backup.len()) };

    if span.try_copy_to(&mut backup_span) {
        println!("Backed up {} samples", span.len());
    }

    span.clear();

    drop(span);
    drop(backup_span);

    println!(
        "Samples cleared: {}, backup intact: {}",
        samples.iter().all(|&x| x == 0),
        backup.first() == Some(&0) && backup.get(1) == Some(&-1)
    );
}
