//! Record batching: split guests into one group per template sheet.
//!
//! The template always has a fixed number of card positions, so the last
//! sheet must be filled too. It is padded with copies of its last guest
//! rather than blanks, which leaves the template free of "empty card"
//! handling and yields a few spare cards for that guest.

/// Split `records` into chunks of exactly `size`, padding the final chunk by
/// repeating its last element.
///
/// Empty input yields no chunks. A `size` of 0 is treated as 1.
pub fn batch<T: Clone>(records: &[T], size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    records
        .chunks(size)
        .map(|chunk| {
            let mut group = chunk.to_vec();
            if let Some(last) = chunk.last() {
                group.resize(size, last.clone());
            }
            group
        })
        .collect()
}

/// Number of padding copies `batch` adds for `count` records.
pub fn padding_for(count: usize, size: usize) -> usize {
    let size = size.max(1);
    match count % size {
        0 => 0,
        rem => size - rem,
    }
}
