//! Read-only view over one column.

use std::ops::Index;
use std::slice;

/// A borrowed, read-only view of the live elements of one column.
///
/// Obtained from [`Arrays::column`](crate::Arrays::column). The view always
/// covers exactly `len()` elements of the container at the time it was
/// taken; request a new view after mutating the container.
#[derive(Debug)]
pub struct ColumnView<'a, T> {
    items: &'a [T],
}

impl<'a, T> ColumnView<'a, T> {
    pub(crate) fn new(items: &'a [T]) -> Self {
        Self { items }
    }

    /// Number of elements in the column.
    pub fn size(&self) -> usize {
        self.items.len()
    }

    /// Number of elements in the column.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the column holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The element at `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<&'a T> {
        self.items.get(index)
    }

    /// Iterate the column from the first element.
    pub fn iter(&self) -> slice::Iter<'a, T> {
        self.items.iter()
    }

    /// The column as a slice.
    pub fn as_slice(&self) -> &'a [T] {
        self.items
    }
}

impl<T> Clone for ColumnView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ColumnView<'_, T> {}

impl<T> Index<usize> for ColumnView<'_, T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for ColumnView<'a, T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &ColumnView<'a, T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_exposes_size_index_and_iteration() {
        let data = [3, 1, 4];
        let view = ColumnView::new(&data);
        assert_eq!(view.size(), 3);
        assert_eq!(view[1], 1);
        assert_eq!(view.get(3), None);
        assert_eq!(view.iter().copied().collect::<Vec<_>>(), vec![3, 1, 4]);
    }

    #[test]
    fn iteration_is_restartable() {
        let data = ["a", "b"];
        let view = ColumnView::new(&data);
        let first: Vec<_> = view.into_iter().collect();
        let second: Vec<_> = (&view).into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_view() {
        let data: [u8; 0] = [];
        let view = ColumnView::new(&data);
        assert!(view.is_empty());
        assert_eq!(view.iter().next(), None);
    }
}
