//! SQL `LIKE`/`ILIKE` pattern matching, shared by the compiler (which emits
//! the same semantics as a SQL `LIKE`) and the IVM filter operator (which
//! evaluates predicates directly against rows), so both agree.
//!
//! `%` matches zero or more characters, `_` matches exactly one. Matching
//! is over Unicode scalar values.

use alloc::vec::Vec;

/// Case-sensitive `LIKE`.
pub fn like(value: &str, pattern: &str) -> bool {
    let v: Vec<char> = value.chars().collect();
    let p: Vec<char> = pattern.chars().collect();
    like_recursive(&v, &p, 0, 0, false)
}

/// Case-insensitive `ILIKE`.
pub fn ilike(value: &str, pattern: &str) -> bool {
    let v: Vec<char> = value.chars().flat_map(char::to_lowercase).collect();
    let p: Vec<char> = pattern.chars().flat_map(char::to_lowercase).collect();
    like_recursive(&v, &p, 0, 0, false)
}

fn like_recursive(v: &[char], p: &[char], vi: usize, pi: usize, _ci: bool) -> bool {
    if pi == p.len() {
        return vi == v.len();
    }
    match p[pi] {
        '%' => {
            for skip in vi..=v.len() {
                if like_recursive(v, p, skip, pi + 1, _ci) {
                    return true;
                }
            }
            false
        }
        '_' => vi < v.len() && like_recursive(v, p, vi + 1, pi + 1, _ci),
        ch => vi < v.len() && v[vi] == ch && like_recursive(v, p, vi + 1, pi + 1, _ci),
    }
}
