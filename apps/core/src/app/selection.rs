/// Set of string keys that remembers insertion order for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    items: Vec<String>,
}

impl Selection {
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Adds `key` if absent, removes it if present. Returns whether it is
    /// selected afterwards.
    pub fn toggle(&mut self, key: &str) -> bool {
        if let Some(index) = self.items.iter().position(|item| item == key) {
            self.items.remove(index);
            false
        } else {
            self.items.push(key.to_string());
            true
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.iter().any(|item| item == key)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.items.clone()
    }

    /// Order-independent equality against a candidate list.
    pub fn same_members<S: AsRef<str>>(&self, candidates: &[S]) -> bool {
        self.items.len() == candidates.len()
            && candidates.iter().all(|candidate| self.contains(candidate.as_ref()))
    }

    /// Replaces the contents, dropping duplicates but keeping first-seen order.
    pub fn replace<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.clear();
        for key in keys {
            let key = key.into();
            if !self.contains(&key) {
                self.items.push(key);
            }
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Selects every candidate, or clears everything if that is already the
    /// case. Returns whether all candidates are selected afterwards.
    pub fn toggle_all<S: AsRef<str>>(&mut self, candidates: &[S]) -> bool {
        if self.same_members(candidates) {
            self.clear();
            false
        } else {
            self.replace(candidates.iter().map(|candidate| candidate.as_ref().to_string()));
            true
        }
    }
}
