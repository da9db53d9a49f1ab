use std::collections::HashMap;

/// Assigns dense term ids in first-seen order. Shared across blocks during
/// indexing so that a term's id never changes once assigned, which is what
/// lets the merger treat matching term_ids as the same term without ever
/// comparing term text again.
#[derive(Debug, Default)]
pub struct TermTable {
    ids: HashMap<String, u32>,
    next: u32,
}

impl TermTable {
    pub fn new() -> Self {
        TermTable {
            ids: HashMap::new(),
            next: 0,
        }
    }

    /// Returns the id for `term`, assigning a fresh one if this is the first
    /// time it has been seen.
    pub fn id_for(&mut self, term: &str) -> u32 {
        if let Some(&id) = self.ids.get(term) {
            return id;
        }
        let id = self.next;
        self.ids.insert(term.to_string(), id);
        self.next += 1;
        id
    }

    /// Total number of distinct terms assigned so far. This is also the id
    /// that will be given to the `_universal` synthetic term.
    pub fn len(&self) -> u32 {
        self.next
    }

    pub fn is_empty(&self) -> bool {
        self.next == 0
    }

    /// Reverse mapping from id back to term text, needed by the dictionary
    /// builder to key entries while scanning the postings file by id.
    pub fn id_to_term(&self) -> HashMap<u32, String> {
        self.ids.iter().map(|(term, &id)| (id, term.clone())).collect()
    }
}
