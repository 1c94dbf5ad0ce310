//! Positional ordering helpers shared by boards and tasks.
//!
//! Every element carries an integer `order`. Transient UI state may hold
//! stale values; anything handed to persistence must satisfy
//! `index == order`, which [`renumber`] restores.

/// Element with an integer sort key.
pub trait Ordered {
    /// Current sort key.
    fn order(&self) -> u32;
    /// Overwrite the sort key.
    fn set_order(&mut self, order: u32);
}

/// Move the element at `from` so it ends up at index `to`.
///
/// The element is removed first and re-inserted at `to` in the shortened
/// sequence; `to` past the end appends. Returns `None` when `from` is out of
/// range. `from == to` yields an unchanged copy.
#[must_use]
pub fn move_item<T: Clone>(items: &[T], from: usize, to: usize) -> Option<Vec<T>> {
    if from >= items.len() {
        return None;
    }
    let mut moved = items.to_vec();
    if from == to {
        return Some(moved);
    }
    let item = moved.remove(from);
    insert_at(&mut moved, to, item);
    Some(moved)
}

/// Insert `item` at `index`, clamped to the end of the sequence.
pub fn insert_at<T>(items: &mut Vec<T>, index: usize, item: T) {
    let index = index.min(items.len());
    items.insert(index, item);
}

/// Re-derive every element's `order` from its position.
pub fn renumber<T: Ordered>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_order(position_to_order(index));
    }
}

/// Whether `index == order` holds for every element.
#[must_use]
pub fn is_contiguous<T: Ordered>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(index, item)| item.order() == position_to_order(index))
}

/// Order value for an element appended after `items`.
#[must_use]
pub fn next_order<T: Ordered>(items: &[T]) -> u32 {
    items
        .iter()
        .map(Ordered::order)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Convert a vector index into an order value.
#[must_use]
pub fn position_to_order(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}
