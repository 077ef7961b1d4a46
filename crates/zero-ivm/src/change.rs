//! `Change<T>`: the unit the IVM dataflow pushes between operators (§4.4,
//! §3 Data Model). Unlike the teacher's `Delta<T>` (a bare +1/-1 multiplicity),
//! `Edit` carries both the old and new value so operators can decide whether
//! a mutation crosses a filter/limit boundary without re-deriving it from a
//! remove+add pair.

use alloc::vec::Vec;

/// A single incremental change to a collection of `T`s.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<T> {
    Add(T),
    Remove(T),
    Edit { old: T, new: T },
}

impl<T> Change<T> {
    pub fn map<U>(self, f: impl Fn(T) -> U) -> Change<U> {
        match self {
            Change::Add(v) => Change::Add(f(v)),
            Change::Remove(v) => Change::Remove(f(v)),
            Change::Edit { old, new } => Change::Edit { old: f(old), new: f(new) },
        }
    }

    pub fn as_ref(&self) -> Change<&T> {
        match self {
            Change::Add(v) => Change::Add(v),
            Change::Remove(v) => Change::Remove(v),
            Change::Edit { old, new } => Change::Edit { old, new },
        }
    }
}

/// Applies `f` to every change in `changes`, discarding those for which the
/// predicate-shaped transform yields nothing (used by `Filter`).
pub fn filter_map_changes<T, U>(changes: Vec<Change<T>>, mut f: impl FnMut(Change<T>) -> Vec<Change<U>>) -> Vec<Change<U>> {
    let mut out = Vec::new();
    for change in changes {
        out.extend(f(change));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_preserves_variant() {
        let c = Change::Edit { old: 1, new: 2 };
        let mapped = c.map(|v| v * 10);
        assert_eq!(mapped, Change::Edit { old: 10, new: 20 });
    }
}
