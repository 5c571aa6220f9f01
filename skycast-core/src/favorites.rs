//! Pinned cities: an ordered, duplicate-free list with a fixed capacity,
//! written through to a [`KeyValueStore`] on every change.

use crate::{error::AppError, storage::KeyValueStore};

/// Storage key the serialized list lives under.
pub const FAVORITES_KEY: &str = "favorites";

/// What a successful toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

#[derive(Debug)]
pub struct FavoritesStore {
    cities: Vec<String>,
    capacity: usize,
    storage: Box<dyn KeyValueStore>,
}

impl FavoritesStore {
    /// Read the list from `storage`. A missing or unreadable record yields an empty list.
    pub fn load(storage: Box<dyn KeyValueStore>, capacity: usize) -> Self {
        let cities = match storage.get(FAVORITES_KEY) {
            Ok(Some(raw)) => parse_record(&raw, capacity),
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "could not read favorites, starting empty");
                Vec::new()
            }
        };

        tracing::debug!(count = cities.len(), "loaded favorites");
        Self { cities, capacity, storage }
    }

    pub fn list(&self) -> &[String] {
        &self.cities
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.cities.len() >= self.capacity
    }

    pub fn is_favorite(&self, city: &str) -> bool {
        self.cities.iter().any(|c| c == city)
    }

    /// Remove `city` if pinned, otherwise pin it.
    ///
    /// Pinning onto a full list changes nothing and returns
    /// [`AppError::FavoritesFull`] with the current list.
    pub fn toggle(&mut self, city: &str) -> Result<Toggled, AppError> {
        if self.is_favorite(city) {
            let next = self.without(city);
            self.commit(next)?;
            return Ok(Toggled::Removed);
        }

        if self.is_full() {
            return Err(self.full_error());
        }

        let mut next = self.cities.clone();
        next.push(city.to_string());
        self.commit(next)?;
        Ok(Toggled::Added)
    }

    /// Drop `city_to_remove` (if present) and append `city_to_add` (if absent).
    pub fn evict_and_add(&mut self, city_to_remove: &str, city_to_add: &str) -> Result<(), AppError> {
        let mut next = self.without(city_to_remove);

        if !next.iter().any(|c| c == city_to_add) {
            if next.len() >= self.capacity {
                return Err(self.full_error());
            }
            next.push(city_to_add.to_string());
        }

        self.commit(next)
    }

    fn without(&self, city: &str) -> Vec<String> {
        self.cities.iter().filter(|c| *c != city).cloned().collect()
    }

    fn full_error(&self) -> AppError {
        AppError::FavoritesFull { favorites: self.cities.clone() }
    }

    /// Persist `next`, then adopt it. The in-memory list is untouched if the write fails.
    fn commit(&mut self, next: Vec<String>) -> Result<(), AppError> {
        let raw = serde_json::to_string(&next).map_err(|e| AppError::Storage(e.into()))?;
        self.storage.set(FAVORITES_KEY, &raw).map_err(AppError::Storage)?;

        tracing::info!(favorites = ?next, "favorites updated");
        self.cities = next;
        Ok(())
    }
}

fn parse_record(raw: &str, capacity: usize) -> Vec<String> {
    let stored: Vec<String> = match serde_json::from_str(raw) {
        Ok(list) => list,
        Err(err) => {
            tracing::warn!(error = %err, "favorites record is corrupt, starting empty");
            return Vec::new();
        }
    };

    let mut cities: Vec<String> = Vec::with_capacity(capacity);
    for city in &stored {
        if cities.len() == capacity {
            break;
        }
        if !cities.contains(city) {
            cities.push(city.clone());
        }
    }

    if cities.len() != stored.len() {
        tracing::warn!(stored = stored.len(), kept = cities.len(), "normalized favorites record");
    }
    cities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use anyhow::anyhow;

    fn store_with(cities: &[&str]) -> FavoritesStore {
        let raw = serde_json::to_string(cities).unwrap();
        FavoritesStore::load(Box::new(MemoryStore::with_entry(FAVORITES_KEY, &raw)), 3)
    }

    #[derive(Debug)]
    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow!("disk full"))
        }
    }

    #[test]
    fn starts_empty_without_record() {
        let store = FavoritesStore::load(Box::new(MemoryStore::new()), 3);
        assert!(store.list().is_empty());
        assert!(!store.is_full());
    }

    #[test]
    fn corrupt_record_is_treated_as_empty() {
        let store = FavoritesStore::load(
            Box::new(MemoryStore::with_entry(FAVORITES_KEY, "{\"oops\": 1}")),
            3,
        );
        assert!(store.list().is_empty());
    }

    #[test]
    fn oversized_record_is_normalized() {
        let store = store_with(&["Paris", "Paris", "London", "Berlin", "Tokyo"]);
        assert_eq!(store.list(), ["Paris", "London", "Berlin"]);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut store = store_with(&[]);

        assert_eq!(store.toggle("Paris").unwrap(), Toggled::Added);
        assert!(store.is_favorite("Paris"));

        assert_eq!(store.toggle("Paris").unwrap(), Toggled::Removed);
        assert!(!store.is_favorite("Paris"));

        assert_eq!(store.toggle("Paris").unwrap(), Toggled::Added);
        assert_eq!(store.list(), ["Paris"]);
    }

    #[test]
    fn membership_is_case_sensitive() {
        let store = store_with(&["Paris"]);
        assert!(store.is_favorite("Paris"));
        assert!(!store.is_favorite("paris"));
    }

    #[test]
    fn toggle_on_full_list_reports_current_favorites() {
        let mut store = store_with(&["Paris", "London", "Berlin"]);

        let err = store.toggle("Tokyo").unwrap_err();
        match err {
            AppError::FavoritesFull { favorites } => {
                assert_eq!(favorites, ["Paris", "London", "Berlin"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.list(), ["Paris", "London", "Berlin"]);
    }

    #[test]
    fn toggle_sequence_never_exceeds_capacity() {
        let mut store = store_with(&[]);
        let cities = ["A", "B", "C", "D", "B", "E", "A", "F", "G", "C", "D", "D"];

        for city in cities {
            let _ = store.toggle(city);
            assert!(store.list().len() <= 3);
        }
    }

    #[test]
    fn removing_from_full_list_is_allowed() {
        let mut store = store_with(&["Paris", "London", "Berlin"]);
        assert_eq!(store.toggle("London").unwrap(), Toggled::Removed);
        assert_eq!(store.list(), ["Paris", "Berlin"]);
    }

    #[test]
    fn evict_and_add_replaces_at_end() {
        let mut store = store_with(&["Paris", "London", "Berlin"]);
        store.evict_and_add("Paris", "Tokyo").unwrap();
        assert_eq!(store.list(), ["London", "Berlin", "Tokyo"]);
    }

    #[test]
    fn evict_and_add_does_not_duplicate() {
        let mut store = store_with(&["Paris", "London", "Berlin"]);
        store.evict_and_add("Paris", "London").unwrap();
        assert_eq!(store.list(), ["London", "Berlin"]);
    }

    #[test]
    fn evict_of_absent_city_on_full_list_is_rejected() {
        let mut store = store_with(&["Paris", "London", "Berlin"]);
        let err = store.evict_and_add("Rome", "Tokyo").unwrap_err();
        assert!(err.is_favorites_full());
        assert_eq!(store.list(), ["Paris", "London", "Berlin"]);
    }

    #[test]
    fn mutations_persist_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let mut store =
            FavoritesStore::load(Box::new(crate::storage::JsonFileStore::new(&path)), 3);
        store.toggle("Paris").unwrap();
        store.toggle("London").unwrap();
        store.toggle("Berlin").unwrap();
        store.evict_and_add("London", "Tokyo").unwrap();

        let reloaded =
            FavoritesStore::load(Box::new(crate::storage::JsonFileStore::new(&path)), 3);
        assert_eq!(reloaded.list(), ["Paris", "Berlin", "Tokyo"]);
    }

    #[test]
    fn garbage_bytes_on_disk_do_not_block_toggling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x7b]).unwrap();

        let mut store =
            FavoritesStore::load(Box::new(crate::storage::JsonFileStore::new(&path)), 3);
        assert!(store.list().is_empty());
        assert_eq!(store.toggle("Paris").unwrap(), Toggled::Added);

        let reloaded =
            FavoritesStore::load(Box::new(crate::storage::JsonFileStore::new(&path)), 3);
        assert_eq!(reloaded.list(), ["Paris"]);
    }

    #[test]
    fn failed_write_leaves_list_unchanged() {
        let mut store = FavoritesStore::load(Box::new(FailingStore), 3);

        let err = store.toggle("Paris").unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert!(store.list().is_empty());
    }

    #[test]
    fn smaller_capacity_is_honored() {
        let mut store = FavoritesStore::load(Box::new(MemoryStore::new()), 1);
        store.toggle("Paris").unwrap();
        assert!(store.toggle("London").unwrap_err().is_favorites_full());
    }
}
