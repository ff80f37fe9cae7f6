//! Batch distribution for parallel row conversion.
//!
//! Rows are split into contiguous batches; each batch is mapped in parallel and the
//! caller is told after every batch so progress can be reported from one thread.

use rayon::prelude::*;

/// Contiguous `[start, end)` row ranges, one per batch. Never more batches than rows; the
/// first `total % batches` ranges carry one extra row.
///
/// ```
/// # use starforge::parallel::batch_ranges;
/// assert_eq!(batch_ranges(7, 3), vec![(0, 3), (3, 5), (5, 7)]);
/// assert_eq!(batch_ranges(3, 20).len(), 3);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let batches = num_batches.min(total);
    let (size, extra) = (total / batches, total % batches);
    (0..batches)
        .scan(0, |start, batch| {
            let range = (*start, *start + size + usize::from(batch < extra));
            *start = range.1;
            Some(range)
        })
        .collect()
}

/// Map every item in parallel, batch by batch. Output order matches input order.
/// `on_batch` receives the number of items finished so far.
pub fn map_in_batches<T, R, F, P>(items: &[T], num_batches: usize, f: F, mut on_batch: P) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
    P: FnMut(usize),
{
    let mut out = Vec::with_capacity(items.len());
    for (_, end) in batch_ranges(items.len(), num_batches) {
        let start = out.len();
        let batch: Vec<R> = items[start..end].par_iter().map(&f).collect();
        out.extend(batch);
        on_batch(end);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_cover_every_row_once() {
        let ranges = batch_ranges(7, 20);
        assert_eq!(ranges.len(), 7);
        assert_eq!(ranges.first(), Some(&(0, 1)));
        assert_eq!(ranges.last(), Some(&(6, 7)));

        let ranges = batch_ranges(10, 3);
        assert_eq!(ranges, vec![(0, 4), (4, 7), (7, 10)]);
    }

    #[test]
    fn no_rows_or_no_batches_yield_nothing() {
        assert!(batch_ranges(0, 20).is_empty());
        assert!(batch_ranges(12, 0).is_empty());
    }

    #[test]
    fn map_in_batches_preserves_order_and_reports() {
        let items: Vec<u32> = (1..=10).collect();
        let mut seen = Vec::new();
        let doubled = map_in_batches(&items, 3, |n| n * 2, |done| seen.push(done));
        assert_eq!(doubled, (1..=10).map(|n| n * 2).collect::<Vec<_>>());
        assert_eq!(seen, vec![4, 7, 10]);
    }

    #[test]
    fn map_in_batches_on_empty_input_never_reports() {
        let items: Vec<u32> = Vec::new();
        let mut calls = 0;
        let out = map_in_batches(&items, 5, |n| *n, |_| calls += 1);
        assert!(out.is_empty());
        assert_eq!(calls, 0);
    }
}
