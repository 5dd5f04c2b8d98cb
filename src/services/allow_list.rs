use crate::events::LogicalKey;
use crate::mappings::KeysymToName;
use crate::services::key_decoder::KeyDecoder;
use std::collections::HashSet;

/// Набор клавиш, разрешённых к дублированию. Всё остальное отбрасывается.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    keys: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_allowed(&self, key: &LogicalKey) -> bool {
        self.keys.contains(key.as_str())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Имена, которые декодер никогда не выдаст
    pub fn unknown_names(&self) -> Vec<&str> {
        let mut unknown: Vec<&str> = self
            .keys
            .iter()
            .map(String::as_str)
            .filter(|name| !KeyDecoder::is_override_name(name) && !KeysymToName::is_known_name(name))
            .collect();
        unknown.sort_unstable();
        unknown
    }
}
