//! Purpose: Binary search primitives over slices sorted by an extracted key.
//! Exports: `find_first`, `find_first_ord`, `find_closest`, `lower_bound`, `upper_bound`,
//! `lower_bound_closest`, `upper_bound_closest`.
//! Role: Pure kernel used by table indexes; no allocation and no knowledge of records.
//! Invariants: Inputs are sorted ascending under `compare`; results are indexes into `rows`.
//! Invariants: Ranges are half-open; an empty range never performs a comparison.
use std::cmp::Ordering;
use std::ops::Range;

/// Index of the first row whose key equals `key`.
pub fn find_first<R, K, E, C>(rows: &[R], key: &K, extract: E, compare: C) -> Option<usize>
where
    E: Fn(&R) -> K,
    C: Fn(&K, &K) -> Ordering,
{
    lower_bound(rows, 0..rows.len(), key, extract, compare)
}

/// `find_first` for keys in their natural order; the comparator is resolved at
/// compile time instead of going through a function pointer.
pub fn find_first_ord<R, K, E>(rows: &[R], key: &K, extract: E) -> Option<usize>
where
    K: Ord,
    E: Fn(&R) -> K,
{
    let start = rows.partition_point(|row| extract(row) < *key);
    match rows.get(start) {
        Some(row) if extract(row) == *key => Some(start),
        _ => None,
    }
}

/// Exact match if present, otherwise the neighbour immediately below
/// (`select_lower`) or above the insertion point of `key` inside `range`.
pub fn find_closest<R, K, E, C>(
    rows: &[R],
    range: Range<usize>,
    key: &K,
    extract: E,
    compare: C,
    select_lower: bool,
) -> Option<usize>
where
    E: Fn(&R) -> K,
    C: Fn(&K, &K) -> Ordering,
{
    if range.is_empty() || range.end > rows.len() {
        return None;
    }
    let mut lo = range.start;
    let mut hi = range.end;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match compare(&extract(&rows[mid]), key) {
            Ordering::Equal => return Some(mid),
            Ordering::Less => lo = mid + 1,
            Ordering::Greater => hi = mid,
        }
    }
    if select_lower {
        (lo > range.start).then(|| lo - 1)
    } else {
        (lo < range.end).then_some(lo)
    }
}

/// First index of the run of rows equal to `key`.
pub fn lower_bound<R, K, E, C>(
    rows: &[R],
    range: Range<usize>,
    key: &K,
    extract: E,
    compare: C,
) -> Option<usize>
where
    E: Fn(&R) -> K,
    C: Fn(&K, &K) -> Ordering,
{
    let end = range.end;
    let start = lower_bound_closest(rows, range, key, &extract, &compare);
    if start >= end {
        return None;
    }
    (compare(&extract(&rows[start]), key) == Ordering::Equal).then_some(start)
}

/// Last index of the run of rows equal to `key`.
pub fn upper_bound<R, K, E, C>(
    rows: &[R],
    range: Range<usize>,
    key: &K,
    extract: E,
    compare: C,
) -> Option<usize>
where
    E: Fn(&R) -> K,
    C: Fn(&K, &K) -> Ordering,
{
    let start = range.start;
    let end = upper_bound_closest(rows, range, key, &extract, &compare);
    if end <= start {
        return None;
    }
    let last = end - 1;
    (compare(&extract(&rows[last]), key) == Ordering::Equal).then_some(last)
}

/// First index in `range` whose key is not less than `key`; `range.end` if none.
pub fn lower_bound_closest<R, K, E, C>(
    rows: &[R],
    range: Range<usize>,
    key: &K,
    extract: E,
    compare: C,
) -> usize
where
    E: Fn(&R) -> K,
    C: Fn(&K, &K) -> Ordering,
{
    if range.is_empty() || range.end > rows.len() {
        return range.start.min(range.end);
    }
    range.start
        + rows[range.clone()]
            .partition_point(|row| compare(&extract(row), key) == Ordering::Less)
}

/// Exclusive end of the rows in `range` whose key is not greater than `key`;
/// `range.start` if none.
pub fn upper_bound_closest<R, K, E, C>(
    rows: &[R],
    range: Range<usize>,
    key: &K,
    extract: E,
    compare: C,
) -> usize
where
    E: Fn(&R) -> K,
    C: Fn(&K, &K) -> Ordering,
{
    if range.is_empty() || range.end > rows.len() {
        return range.start.min(range.end);
    }
    range.start
        + rows[range.clone()]
            .partition_point(|row| compare(&extract(row), key) != Ordering::Greater)
}
