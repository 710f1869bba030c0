//! Multi-key comparators built from a [`Sort`]

use std::cmp::Ordering;

use super::accessor::{Accessor, Accessors};
use super::error::StoreError;
use super::sort::{Direction, Sort};

/// Total ordering over records of type `V`
pub type Comparator<V> = Box<dyn Fn(&V, &V) -> Ordering + Send + Sync>;

/// Build a comparator ordering records by every key of `sort`.
///
/// The first order is the primary key; each following order only decides
/// between records equal on all earlier keys. Descending keys are reversed
/// individually. Every field name is resolved before the comparator is
/// returned, so sorting itself cannot fail.
///
/// An empty sort yields a comparator that reports all records equal, which
/// keeps store order under a stable sort.
///
/// # Errors
///
/// Returns a [`StoreError`] of kind `UnknownSortField` for the first field
/// name without an accessor.
///
/// # Example
///
/// ```rust
/// use data_repository::repository::{build_comparator, Accessor, Accessors, Direction, Sort};
///
/// let accessors = Accessors::new(Accessor::new("id", |r: &(i64, &str)| r.0.into()))
///     .field("name", |r| r.1.into());
///
/// let mut rows = vec![(3, "b"), (1, "a"), (2, "b")];
/// let by_name_then_id = build_comparator(
///     &accessors,
///     &Sort::by(Direction::Descending, ["name", "id"]),
/// )?;
/// rows.sort_by(|a, b| by_name_then_id(a, b));
/// assert_eq!(rows, vec![(3, "b"), (2, "b"), (1, "a")]);
/// # Ok::<(), data_repository::repository::StoreError>(())
/// ```
pub fn build_comparator<V: 'static>(
    accessors: &Accessors<V>,
    sort: &Sort,
) -> Result<Comparator<V>, StoreError> {
    let keys = sort
        .iter()
        .map(|order| {
            accessors
                .get(&order.field)
                .cloned()
                .map(|accessor| (accessor, order.direction))
                .ok_or_else(|| StoreError::unknown_sort_field(&order.field))
        })
        .collect::<Result<Vec<(Accessor<V>, Direction)>, _>>()?;

    Ok(Box::new(move |a: &V, b: &V| {
        keys.iter().fold(Ordering::Equal, |ordering, (accessor, direction)| {
            ordering.then_with(|| {
                let ordering = accessor.get(a).cmp(&accessor.get(b));
                if direction.is_descending() {
                    ordering.reverse()
                } else {
                    ordering
                }
            })
        })
    }))
}
