use std::fmt;
use thiserror::Error;

/// Errors raised while building a store from parallel key and value lists.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Key count {keys} does not match value count {values}")]
    LengthMismatch { keys: usize, values: usize },
    #[error("Duplicate key '{0}'")]
    DuplicateKey(String),
}

/// Association list keyed by string that remembers insertion order.
///
/// Keys are unique. Replacing the value of an existing key keeps the key at
/// its original position.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyValueStore<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for KeyValueStore<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> KeyValueStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from two parallel lists.
    pub fn from_pairs<K, I, J>(keys: I, values: J) -> Result<Self, StoreError>
    where
        K: Into<String>,
        I: IntoIterator<Item = K>,
        J: IntoIterator<Item = V>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let values: Vec<V> = values.into_iter().collect();
        if keys.len() != values.len() {
            return Err(StoreError::LengthMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }

        let mut store = Self::new();
        for (key, value) in keys.into_iter().zip(values) {
            if store.contains_key(&key) {
                return Err(StoreError::DuplicateKey(key));
            }
            store.entries.push((key, value));
        }
        Ok(store)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.position(&key) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.position(key).map(|index| &self.entries[index].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.position(key).map(move |index| &mut self.entries[index].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.position(key).map(|index| self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(existing, _)| existing == key)
    }
}

impl<V> FromIterator<(String, V)> for KeyValueStore<V> {
    fn from_iter<T: IntoIterator<Item = (String, V)>>(iter: T) -> Self {
        let mut store = Self::new();
        for (key, value) in iter {
            store.insert(key, value);
        }
        store
    }
}

impl<V> IntoIterator for KeyValueStore<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V: fmt::Debug> fmt::Debug for KeyValueStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
