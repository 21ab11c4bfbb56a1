//! Stable sorts for items carrying an integer value.

/// An item ordered by an integer value and carrying arbitrary data.
pub trait SortItem {
    /// Payload type.
    type Data;

    /// Value the item is sorted by.
    fn value(&self) -> i64;

    /// Payload carried alongside the value.
    fn data(&self) -> &Self::Data;
}

impl<D> SortItem for (i64, D) {
    type Data = D;

    #[inline]
    fn value(&self) -> i64 {
        self.0
    }

    #[inline]
    fn data(&self) -> &D {
        &self.1
    }
}

impl<T: SortItem> SortItem for &T {
    type Data = T::Data;

    #[inline]
    fn value(&self) -> i64 {
        (**self).value()
    }

    #[inline]
    fn data(&self) -> &T::Data {
        (**self).data()
    }
}

/// Sorts `items` biggest value first. Equal values keep their order.
pub fn sort_biggest<T: SortItem>(items: &mut [T]) {
    items.sort_by(|a, b| b.value().cmp(&a.value()));
}

/// Sorts `items` smallest value first. Equal values keep their order.
pub fn sort_smallest<T: SortItem>(items: &mut [T]) {
    items.sort_by_key(SortItem::value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<T: SortItem>(items: &[T]) -> Vec<i64> {
        items.iter().map(SortItem::value).collect()
    }

    #[test]
    fn biggest_first() {
        let mut items = vec![(3i64, "c"), (-1, "neg"), (10, "j"), (0, "zero")];
        sort_biggest(&mut items);
        assert_eq!(values(&items), vec![10, 3, 0, -1]);
        assert_eq!(items[0].data(), &"j");
    }

    #[test]
    fn smallest_first() {
        let mut items = vec![(3i64, 'c'), (-1, 'n'), (10, 'j'), (0, 'z')];
        sort_smallest(&mut items);
        assert_eq!(values(&items), vec![-1, 0, 3, 10]);
    }

    #[test]
    fn equal_values_are_stable() {
        let mut items = vec![(1i64, "a"), (2, "b"), (1, "c"), (2, "d")];
        sort_biggest(&mut items);
        let data: Vec<_> = items.iter().map(|i| *i.data()).collect();
        assert_eq!(data, vec!["b", "d", "a", "c"]);

        sort_smallest(&mut items);
        let data: Vec<_> = items.iter().map(|i| *i.data()).collect();
        assert_eq!(data, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn sorts_borrowed_items() {
        let owned = vec![(5i64, ()), (7, ()), (6, ())];
        let mut refs: Vec<&(i64, ())> = owned.iter().collect();
        sort_biggest(&mut refs);
        assert_eq!(values(&refs), vec![7, 6, 5]);
    }

    #[test]
    fn empty_and_single() {
        let mut empty: Vec<(i64, ())> = Vec::new();
        sort_biggest(&mut empty);
        assert!(empty.is_empty());

        let mut one = vec![(42i64, "x")];
        sort_smallest(&mut one);
        assert_eq!(one, vec![(42, "x")]);
    }
}
