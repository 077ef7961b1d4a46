//! `View`: the sink of an IVM tree. Buffers changes as they arrive and only
//! notifies listeners once `commit` is called, so a transaction touching
//! several rows produces exactly one notification, never one per row
//! (§4.4, §3 "at most one consistent commit per upstream transaction").

use crate::change::Change;
use crate::item::Item;
use alloc::boxed::Box;
use alloc::vec::Vec;
use zero_core::RowId;

pub struct View {
    singular: bool,
    rows: Vec<Item>,
    pending: bool,
    listeners: Vec<Box<dyn FnMut(&[Item])>>,
}

impl View {
    pub fn new(singular: bool) -> Self {
        Self { singular, rows: Vec::new(), pending: false, listeners: Vec::new() }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&[Item]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn snapshot(&self) -> &[Item] {
        &self.rows
    }

    /// Folds a batch of changes into the materialized view without
    /// notifying listeners yet.
    pub fn apply(&mut self, changes: Vec<Change<Item>>) {
        if changes.is_empty() {
            return;
        }
        for change in changes {
            match change {
                Change::Add(item) => self.rows.push(item),
                Change::Remove(item) => self.remove_by_id(item.row.id()),
                Change::Edit { old, new } => {
                    self.remove_by_id(old.row.id());
                    self.rows.push(new);
                }
            }
        }
        if self.singular && self.rows.len() > 1 {
            self.rows.truncate(1);
        }
        self.pending = true;
    }

    fn remove_by_id(&mut self, id: RowId) {
        self.rows.retain(|i| i.row.id() != id);
    }

    /// Notifies listeners once for the transaction just applied. A no-op if
    /// nothing changed since the last commit, so closing a streamer
    /// transaction with no writes never wakes a subscriber.
    pub fn commit(&mut self) {
        if !self.pending {
            return;
        }
        self.pending = false;
        for listener in &mut self.listeners {
            listener(&self.rows);
        }
    }

    pub fn teardown(&mut self) {
        self.listeners.clear();
        self.rows.clear();
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;
    use zero_core::Row;

    #[test]
    fn commit_is_a_noop_without_pending_changes() {
        let mut view = View::new(false);
        let notifications = Rc::new(RefCell::new(0u32));
        let counter = notifications.clone();
        view.subscribe(move |_| *counter.borrow_mut() += 1);
        view.commit();
        assert_eq!(*notifications.borrow(), 0);
    }

    #[test]
    fn batched_changes_notify_once() {
        let mut view = View::new(false);
        let notifications = Rc::new(RefCell::new(0u32));
        let counter = notifications.clone();
        view.subscribe(move |_| *counter.borrow_mut() += 1);
        view.apply(vec![Change::Add(Item::leaf(Row::new(1, vec![]))), Change::Add(Item::leaf(Row::new(2, vec![])))]);
        view.commit();
        assert_eq!(*notifications.borrow(), 1);
        assert_eq!(view.snapshot().len(), 2);
    }

    #[test]
    fn singular_view_keeps_one_row() {
        let mut view = View::new(true);
        view.apply(vec![Change::Add(Item::leaf(Row::new(1, vec![]))), Change::Add(Item::leaf(Row::new(2, vec![])))]);
        view.commit();
        assert_eq!(view.snapshot().len(), 1);
    }
}
