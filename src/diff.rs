//! Change detection between a loaded snapshot and a freshly encoded record.

use std::collections::HashMap;

use crate::protocol::{Child, Property};
use crate::value::PropertyValue;

/// Properties of `new` that are absent from `old` or whose value differs.
///
/// The result keeps the order of `new`. A property missing from `old` is always
/// included, even when its value is empty.
pub fn changed_properties(
    old: &HashMap<String, PropertyValue>,
    new: Vec<Property>,
) -> Vec<Property> {
    new.into_iter()
        .filter(|property| match old.get(&property.name) {
            Some(previous) => *previous != property.value,
            None => true,
        })
        .collect()
}

/// Children of `new` without an identical counterpart in `old`.
///
/// Children with an id are matched on type and id; a child whose payload or
/// aggregate value changed is kept. Children without an id, from types that
/// do not track the store's child ids, are matched on type, payload and
/// aggregate value, each snapshot child standing in for at most one of them.
pub fn changed_children(old: &[Child], new: Vec<Child>) -> Vec<Child> {
    let mut claimed = vec![false; old.len()];
    new.into_iter()
        .filter(|child| {
            let found = old.iter().enumerate().position(|(index, previous)| {
                !claimed[index]
                    && previous.type_name == child.type_name
                    && (child.child_id.is_empty() || previous.child_id == child.child_id)
                    && previous.aggregate_value == child.aggregate_value
                    && previous.data == child.data
            });
            match found {
                Some(index) => {
                    claimed[index] = true;
                    false
                }
                None => true,
            }
        })
        .collect()
}
