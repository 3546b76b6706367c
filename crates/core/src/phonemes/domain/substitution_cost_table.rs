use std::collections::BTreeMap;

/// Sparse table of configured `(recognized, reference) -> cost` overrides.
///
/// Ordered so that registering its phonemes with a vocabulary is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubstitutionCostTable {
    entries: BTreeMap<(String, String), f64>,
}

impl SubstitutionCostTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, a: &str, b: &str, cost: f64) {
        self.entries.insert((a.to_string(), b.to_string()), cost);
    }

    /// Inserts both `(a, b)` and `(b, a)`.
    pub fn insert_symmetric(&mut self, a: &str, b: &str, cost: f64) {
        self.insert(a, b, cost);
        self.insert(b, a, cost);
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.entries.get(&(a.to_string(), b.to_string())).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.entries
            .iter()
            .map(|((a, b), cost)| (a.as_str(), b.as_str(), *cost))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<((String, String), f64)> for SubstitutionCostTable {
    fn from_iter<I: IntoIterator<Item = ((String, String), f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
