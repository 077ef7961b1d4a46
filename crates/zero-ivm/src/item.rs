//! `Item`: a materialized row together with its nested related collections
//! (§4.4 Join, §3 hierarchical query results). Flat `zero_core::Row`s from a
//! `Source` are wrapped in an `Item` with no relations; `Join` populates
//! `related` as it composes parent and child rows.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use zero_core::Row;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Item {
    pub row: Row,
    pub related: BTreeMap<String, Vec<Item>>,
}

impl Item {
    pub fn leaf(row: Row) -> Self {
        Self { row, related: BTreeMap::new() }
    }

    pub fn with_related(mut self, name: impl Into<String>, children: Vec<Item>) -> Self {
        self.related.insert(name.into(), children);
        self
    }

    pub fn children(&self, name: &str) -> &[Item] {
        self.related.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use zero_core::Value;

    #[test]
    fn leaf_has_no_related() {
        let item = Item::leaf(Row::new(1, vec![Value::Int64(1)]));
        assert!(item.related.is_empty());
    }

    #[test]
    fn with_related_attaches_children() {
        let parent = Item::leaf(Row::new(1, vec![])).with_related("comments", vec![Item::leaf(Row::new(2, vec![]))]);
        assert_eq!(parent.children("comments").len(), 1);
        assert!(parent.children("missing").is_empty());
    }
}
