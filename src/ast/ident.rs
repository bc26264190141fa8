//! Identifier interning.
//!
//! Spec §3 describes `ident`/`ident2` as "interned symbol handles" but
//! leaves the interner itself unspecified — it's elaborator/parser
//! machinery the simplifier only consumes. This follows the same
//! intern-into-a-stable-handle shape as [`crate::diag::loc::FileRegistry`]
//! (this crate's only other interning table), rather than introducing a
//! second pattern for the same problem.

use crate::ast::node::Ident;
use rustc_hash::FxHashMap;

/// Interns identifier text into stable [`Ident`] handles.
#[derive(Default)]
pub struct IdentTable {
    names: Vec<String>,
    by_name: FxHashMap<String, Ident>,
}

impl IdentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> Ident {
        if let Some(&existing) = self.by_name.get(name) {
            return existing;
        }
        let id = Ident(self.names.len() as u32);
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn resolve(&self, id: Ident) -> &str {
        self.names
            .get(id.0 as usize)
            .map(|s| s.as_str())
            .unwrap_or("<invalid-ident>")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable_and_deduped() {
        let mut table = IdentTable::new();
        let a = table.intern("sig_a");
        let b = table.intern("sig_a");
        let c = table.intern("sig_b");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.resolve(a), "sig_a");
    }
}
