use std::collections::HashMap;

/// Dense integer identifier of a phoneme symbol.
pub type PhonemeId = usize;

/// Bidirectional mapping between phoneme symbols and dense ids.
///
/// Ids are handed out in first-seen order starting at zero and are never
/// reused or renumbered, so the vocabulary only ever grows.
#[derive(Debug, Clone, Default)]
pub struct PhonemeVocabulary {
    ids: HashMap<String, PhonemeId>,
    symbols: Vec<String>,
}

impl PhonemeVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `phoneme`, assigning the next free id on first sighting.
    pub fn encode(&mut self, phoneme: &str) -> PhonemeId {
        if let Some(&id) = self.ids.get(phoneme) {
            return id;
        }
        let id = self.symbols.len();
        self.symbols.push(phoneme.to_string());
        self.ids.insert(phoneme.to_string(), id);
        log::trace!("Registered phoneme {phoneme:?} as id {id}");
        id
    }

    /// Read-only lookup; never grows the vocabulary.
    pub fn id_of(&self, phoneme: &str) -> Option<PhonemeId> {
        self.ids.get(phoneme).copied()
    }

    pub fn symbol(&self, id: PhonemeId) -> Option<&str> {
        self.symbols.get(id).map(String::as_str)
    }

    pub fn size(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
