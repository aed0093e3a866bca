use std::collections::BTreeMap;

/// String key/value store scoped to one viewer session
pub trait SessionStore {
    fn keys(&self) -> anyhow::Result<Vec<String>>;
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    fn delete(&mut self, key: &str) -> anyhow::Result<()>;
}

/// In-memory session store, for headless contexts
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MemoryStore(BTreeMap<String, String>);

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

impl SessionStore for MemoryStore {
    fn keys(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.0.keys().cloned().collect())
    }

    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.0.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.0.insert(String::from(key), String::from(value));
        Ok(())
    }

    fn delete(&mut self, key: &str) -> anyhow::Result<()> {
        self.0.remove(key);
        Ok(())
    }
}
