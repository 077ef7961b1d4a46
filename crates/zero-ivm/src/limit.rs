//! `Limit`: maintains the full ordered input (not just the visible window)
//! so that when a row inside the window is removed, the next-ranked row can
//! be promoted into view without re-scanning the source (§4.4). The planner
//! may call `unlimit` to turn this into a passthrough once an ancestor join
//! can no longer benefit from bounding its driver side (§4.2, §9 flip
//! selection).

use crate::change::Change;
use crate::item::Item;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cmp::Ordering;
use zero_core::RowId;

pub struct Limit {
    n: usize,
    limited: bool,
    compare: Box<dyn Fn(&Item, &Item) -> Ordering>,
    all: Vec<Item>,
}

impl Limit {
    pub fn new(n: usize, compare: impl Fn(&Item, &Item) -> Ordering + 'static) -> Self {
        Self { n, limited: true, compare: Box::new(compare), all: Vec::new() }
    }

    /// Disables windowing; every change now passes through unchanged, but
    /// the full ordered set is still tracked so re-`limit`ing is cheap.
    pub fn unlimit(&mut self) {
        self.limited = false;
    }

    pub fn limit_again(&mut self, n: usize) {
        self.n = n;
        self.limited = true;
    }

    fn window_snapshot(&self) -> Vec<Item> {
        if !self.limited {
            return self.all.clone();
        }
        self.all.iter().take(self.n).cloned().collect()
    }

    fn insert_sorted(&mut self, item: Item) {
        let pos = self.all.partition_point(|existing| (self.compare)(existing, &item) != Ordering::Greater);
        self.all.insert(pos, item);
    }

    fn remove_by_id(&mut self, id: RowId) -> Option<Item> {
        let pos = self.all.iter().position(|i| i.row.id() == id)?;
        Some(self.all.remove(pos))
    }

    pub fn apply(&mut self, changes: Vec<Change<Item>>) -> Vec<Change<Item>> {
        let mut out = Vec::new();
        for change in changes {
            let before = self.window_snapshot();
            match change {
                Change::Add(item) => self.insert_sorted(item),
                Change::Remove(item) => {
                    self.remove_by_id(item.row.id());
                }
                Change::Edit { old, new } => {
                    self.remove_by_id(old.row.id());
                    self.insert_sorted(new);
                }
            }
            let after = self.window_snapshot();
            out.extend(diff_window(&before, &after));
        }
        out
    }
}

/// Diffs two window snapshots by row id: ids only in `before` leave the
/// window (`Remove`), ids only in `after` enter it (`Add`), and ids in both
/// whose content changed become an `Edit`. Removes are emitted before adds
/// so a single-slot window surfaces as exactly one `Remove` then one `Add`.
fn diff_window(before: &[Item], after: &[Item]) -> Vec<Change<Item>> {
    let mut out = Vec::new();
    for b in before {
        if !after.iter().any(|a| a.row.id() == b.row.id()) {
            out.push(Change::Remove(b.clone()));
        }
    }
    for a in after {
        match before.iter().find(|b| b.row.id() == a.row.id()) {
            None => out.push(Change::Add(a.clone())),
            Some(b) if b != a => out.push(Change::Edit { old: b.clone(), new: a.clone() }),
            Some(_) => {}
        }
    }
    out
}
