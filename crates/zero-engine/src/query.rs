//! `MaterializedQuery`: a live `Node`/`View` pair plus the table ids that
//! feed it, so it can be warmed from a `TableProvider` and then kept
//! current by pushing row-level changes (§6).

use crate::provider::TableProvider;
use zero_core::Row;
use zero_ivm::{Change, Item, Node, View};

pub struct MaterializedQuery {
    pub(crate) node: Node,
    pub(crate) view: View,
    pub(crate) preload_order: Vec<String>,
}

impl MaterializedQuery {
    /// Seeds the view from `provider`'s current table contents, in the
    /// planner-recommended order, then commits once so subscribers see a
    /// single notification for the whole initial load (§6, §9).
    pub fn preload(&mut self, provider: &dyn TableProvider) {
        for table in &self.preload_order {
            for row in provider.scan(table) {
                let changes = self.node.push(table, Change::Add(row));
                self.view.apply(changes);
            }
        }
        self.view.commit();
    }

    /// Applies one row-level change from `table` and folds the result into
    /// the view's pending batch (not yet visible to subscribers until
    /// `commit`).
    pub fn push(&mut self, table: &str, change: Change<Row>) {
        let changes = self.node.push(table, change);
        self.view.apply(changes);
    }

    pub fn commit(&mut self) {
        self.view.commit();
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&[Item]) + 'static) {
        self.view.subscribe(listener);
    }

    pub fn snapshot(&self) -> &[Item] {
        self.view.snapshot()
    }

    pub fn teardown(&mut self) {
        self.node.teardown();
        self.view.teardown();
    }
}
