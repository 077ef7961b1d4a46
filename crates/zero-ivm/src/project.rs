//! `Project`: reshapes each item's payload without ever dropping or
//! reclassifying a change (§4.4, §3 hidden-junction flattening, §4.1
//! correlated `[NOT] EXISTS`). Unlike `Filter`, which only decides whether a
//! change survives, `Project` always forwards exactly one change per input
//! change — it just rewrites the `Item` (hoisting a relationship up a level,
//! discarding an internal join's wiring before it reaches a subscriber).

use crate::change::Change;
use crate::item::Item;
use alloc::boxed::Box;
use alloc::vec::Vec;

pub struct Project {
    f: Box<dyn Fn(Item) -> Item>,
}

impl Project {
    pub fn new(f: impl Fn(Item) -> Item + 'static) -> Self {
        Self { f: Box::new(f) }
    }

    pub fn apply(&self, changes: Vec<Change<Item>>) -> Vec<Change<Item>> {
        changes.into_iter().map(|change| change.map(|item| (self.f)(item))).collect()
    }
}
