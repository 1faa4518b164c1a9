//! Id-addressed operations on ordered sequences. Order is the vector order,
//! there are no index fields to renumber.

use serde::{Deserialize, Serialize};

use crate::model::entity::{Duplicate, Identified};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

pub(crate) fn position<T: Identified>(items: &[T], id: &str) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

pub(crate) fn find_mut<'a, T: Identified>(items: &'a mut [T], id: &str) -> Option<&'a mut T> {
    items.iter_mut().find(|item| item.id() == id)
}

/// Swaps the element with its neighbour. `Some(false)` at the boundary,
/// `None` when there is no such element.
pub(crate) fn shift<T: Identified>(items: &mut [T], id: &str, direction: Direction) -> Option<bool> {
    let idx = position(items, id)?;
    let target = match direction {
        Direction::Up if idx == 0 => return Some(false),
        Direction::Up => idx - 1,
        Direction::Down if idx + 1 >= items.len() => return Some(false),
        Direction::Down => idx + 1,
    };
    items.swap(idx, target);
    Some(true)
}

pub(crate) fn remove<T: Identified>(items: &mut Vec<T>, id: &str) -> Option<T> {
    let idx = position(items, id)?;
    Some(items.remove(idx))
}

/// Appends a copy of the element to the end of the sequence.
pub(crate) fn duplicate<T: Identified + Duplicate + Clone>(items: &mut Vec<T>, id: &str) -> Option<T> {
    let copy = items.iter().find(|item| item.id() == id)?.duplicate();
    items.push(copy.clone());
    Some(copy)
}
