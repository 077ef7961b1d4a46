//! `Filter`: applies a predicate to the top-level row of each `Item`.
//! Per §4.4: on an `Edit` where the predicate's verdict flips, `Filter`
//! synthesizes an `Add` (entered) or `Remove` (left) instead of forwarding
//! the `Edit`, so downstream operators never see a row cross into or out of
//! existence as anything but an add/remove.

use crate::change::Change;
use crate::item::Item;
use alloc::boxed::Box;
use alloc::vec::Vec;

pub struct Filter {
    predicate: Box<dyn Fn(&Item) -> bool>,
}

impl Filter {
    pub fn new(predicate: impl Fn(&Item) -> bool + 'static) -> Self {
        Self { predicate: Box::new(predicate) }
    }

    pub fn apply(&self, changes: Vec<Change<Item>>) -> Vec<Change<Item>> {
        let mut out = Vec::with_capacity(changes.len());
        for change in changes {
            match change {
                Change::Add(item) => {
                    if (self.predicate)(&item) {
                        out.push(Change::Add(item));
                    }
                }
                Change::Remove(item) => {
                    if (self.predicate)(&item) {
                        out.push(Change::Remove(item));
                    }
                }
                Change::Edit { old, new } => {
                    let old_matches = (self.predicate)(&old);
                    let new_matches = (self.predicate)(&new);
                    match (old_matches, new_matches) {
                        (true, true) => out.push(Change::Edit { old, new }),
                        (true, false) => out.push(Change::Remove(old)),
                        (false, true) => out.push(Change::Add(new)),
                        (false, false) => {}
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use zero_core::{Row, Value};

    fn passes_even(item: &Item) -> bool {
        matches!(item.row.get(0), Some(Value::Int64(n)) if n % 2 == 0)
    }

    #[test]
    fn add_filtered_out_when_predicate_fails() {
        let filter = Filter::new(passes_even);
        let odd = Item::leaf(Row::new(1, vec![Value::Int64(3)]));
        assert!(filter.apply(vec![Change::Add(odd)]).is_empty());
    }

    #[test]
    fn edit_crossing_boundary_becomes_add_or_remove() {
        let filter = Filter::new(passes_even);
        let was_in = Item::leaf(Row::new(1, vec![Value::Int64(2)]));
        let now_out = Item::leaf(Row::new(1, vec![Value::Int64(3)]));
        let out = filter.apply(vec![Change::Edit { old: was_in, new: now_out.clone() }]);
        assert_eq!(out, vec![Change::Remove(Item::leaf(Row::new(1, vec![Value::Int64(2)])))]);

        let was_out = Item::leaf(Row::new(2, vec![Value::Int64(3)]));
        let now_in = Item::leaf(Row::new(2, vec![Value::Int64(4)]));
        let out = filter.apply(vec![Change::Edit { old: was_out, new: now_in.clone() }]);
        assert_eq!(out, vec![Change::Add(now_in)]);
        let _ = now_out;
    }

    #[test]
    fn edit_staying_inside_stays_edit() {
        let filter = Filter::new(passes_even);
        let old = Item::leaf(Row::new(1, vec![Value::Int64(2)]));
        let new = Item::leaf(Row::new(1, vec![Value::Int64(4)]));
        let out = filter.apply(vec![Change::Edit { old: old.clone(), new: new.clone() }]);
        assert_eq!(out, vec![Change::Edit { old, new }]);
    }
}
