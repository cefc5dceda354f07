// Lazy, bidirectional views over a contiguous span of a sorted slice.
use std::iter::FusedIterator;
use std::ops::{Index, Range};

/// Rows `start..end` of a sorted slice, iterated ascending or descending.
///
/// Views borrow the table's rows and never mutate them; they are `Copy`, so
/// iterating one does not consume it.
#[derive(Debug)]
pub struct RangeView<'a, R> {
    rows: &'a [R],
    start: usize,
    end: usize,
    ascending: bool,
}

impl<'a, R> Clone for RangeView<'a, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, R> Copy for RangeView<'a, R> {}

impl<'a, R> RangeView<'a, R> {
    /// Ranges reaching past `rows` or with `start > end` collapse to empty.
    pub fn new(rows: &'a [R], range: Range<usize>, ascending: bool) -> Self {
        if range.start >= range.end || range.end > rows.len() {
            return Self::empty_of(rows, ascending);
        }
        Self {
            rows,
            start: range.start,
            end: range.end,
            ascending,
        }
    }

    /// Builds a view from an inclusive `[lo, hi]` pair; `lo > hi` is empty.
    pub fn inclusive(rows: &'a [R], lo: usize, hi: usize, ascending: bool) -> Self {
        if lo > hi {
            return Self::empty_of(rows, ascending);
        }
        Self::new(rows, lo..hi + 1, ascending)
    }

    pub fn empty() -> Self {
        Self {
            rows: &[],
            start: 0,
            end: 0,
            ascending: true,
        }
    }

    fn empty_of(rows: &'a [R], ascending: bool) -> Self {
        Self {
            rows,
            start: 0,
            end: 0,
            ascending,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    /// Position of the view inside the backing slice.
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The `index`-th row in iteration order.
    pub fn get(&self, index: usize) -> Option<&'a R> {
        if index >= self.len() {
            return None;
        }
        let offset = if self.ascending {
            self.start + index
        } else {
            self.end - 1 - index
        };
        self.rows.get(offset)
    }

    pub fn first(&self) -> Option<&'a R> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&'a R> {
        self.len().checked_sub(1).and_then(|index| self.get(index))
    }

    /// Same rows, opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            ascending: !self.ascending,
            ..*self
        }
    }

    /// Rows in ascending key order regardless of the view direction.
    pub fn as_slice(&self) -> &'a [R] {
        &self.rows[self.start..self.end]
    }

    pub fn iter(&self) -> RangeIter<'a, R> {
        RangeIter {
            rows: self.as_slice().iter(),
            ascending: self.ascending,
        }
    }

    pub fn to_vec(&self) -> Vec<R>
    where
        R: Clone,
    {
        self.iter().cloned().collect()
    }
}

impl<'a, R> Default for RangeView<'a, R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, R> Index<usize> for RangeView<'a, R> {
    type Output = R;

    fn index(&self, index: usize) -> &R {
        match self.get(index) {
            Some(row) => row,
            None => panic!("index {index} out of range for view of length {}", self.len()),
        }
    }
}

impl<'a, R> IntoIterator for RangeView<'a, R> {
    type Item = &'a R;
    type IntoIter = RangeIter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, 'v, R> IntoIterator for &'v RangeView<'a, R> {
    type Item = &'a R;
    type IntoIter = RangeIter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone, Debug)]
pub struct RangeIter<'a, R> {
    rows: std::slice::Iter<'a, R>,
    ascending: bool,
}

impl<'a, R> Iterator for RangeIter<'a, R> {
    type Item = &'a R;

    fn next(&mut self) -> Option<Self::Item> {
        if self.ascending {
            self.rows.next()
        } else {
            self.rows.next_back()
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<'a, R> DoubleEndedIterator for RangeIter<'a, R> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.ascending {
            self.rows.next_back()
        } else {
            self.rows.next()
        }
    }
}

impl<'a, R> ExactSizeIterator for RangeIter<'a, R> {}

impl<'a, R> FusedIterator for RangeIter<'a, R> {}

#[cfg(test)]
mod tests {
    use super::RangeView;

    const ROWS: [u32; 6] = [10, 20, 30, 40, 50, 60];

    #[test]
    fn ascending_and_descending_iteration() {
        let view = RangeView::new(&ROWS, 1..4, true);
        assert_eq!(view.iter().copied().collect::<Vec<_>>(), vec![20, 30, 40]);
        let view = view.reversed();
        assert_eq!(view.iter().copied().collect::<Vec<_>>(), vec![40, 30, 20]);
        assert_eq!(view.iter().rev().copied().collect::<Vec<_>>(), vec![20, 30, 40]);
    }

    #[test]
    fn indexed_access_follows_direction() {
        let view = RangeView::inclusive(&ROWS, 2, 5, false);
        assert_eq!(view.len(), 4);
        assert_eq!(view.first(), Some(&60));
        assert_eq!(view.last(), Some(&30));
        assert_eq!(view[1], 50);
        assert_eq!(view.get(4), None);
        assert_eq!(view.as_slice(), &[30, 40, 50, 60]);
    }

    #[test]
    fn inverted_bounds_are_empty() {
        let view = RangeView::inclusive(&ROWS, 4, 3, true);
        assert!(view.is_empty());
        assert_eq!(view.iter().count(), 0);
        assert_eq!(view.first(), None);
        assert_eq!(view.last(), None);

        let view = RangeView::new(&ROWS, 3..9, true);
        assert!(view.is_empty());
    }

    #[test]
    fn iteration_is_restartable() {
        let view = RangeView::new(&ROWS, 0..ROWS.len(), true);
        let first: u32 = view.iter().sum();
        let second: u32 = view.into_iter().sum();
        assert_eq!(first, second);
        assert_eq!(view.iter().len(), 6);
    }
}
