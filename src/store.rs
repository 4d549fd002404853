use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub nickname: String,
    pub password: String,
    pub email: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory user directory. Every operation holds the one lock for its
/// whole duration; nothing is atomic across calls.
#[derive(Clone, Default)]
pub struct UserStore {
    users: Arc<Mutex<HashMap<String, User>>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the record stored under `user.id`.
    pub fn add(&self, user: User) {
        self.lock().insert(user.id.clone(), user);
    }

    pub fn get(&self, id: &str) -> Option<User> {
        self.lock().get(id).cloned()
    }

    /// Same upsert as [`UserStore::add`]; callers check existence first.
    pub fn update(&self, user: User) {
        self.lock().insert(user.id.clone(), user);
    }

    /// Removing an unknown id is a no-op.
    pub fn delete(&self, id: &str) {
        self.lock().remove(id);
    }

    /// Snapshot of all records, in no particular order.
    pub fn list(&self) -> Vec<User> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Critical sections are single map calls, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn user(id: &str, first_name: &str, country: &str) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            first_name: first_name.to_string(),
            last_name: "Smith".to_string(),
            nickname: String::new(),
            password: String::new(),
            email: String::new(),
            country: country.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn add_then_get() {
        let store = UserStore::new();
        store.add(user("1", "Alice", "UK"));

        let found = store.get("1").expect("user should exist");
        assert_eq!(found.first_name, "Alice");
        assert!(store.get("2").is_none());
    }

    #[test]
    fn add_with_colliding_id_overwrites() {
        let store = UserStore::new();
        store.add(user("1", "Alice", "UK"));
        store.add(user("1", "Bob", "US"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("1").unwrap().first_name, "Bob");
    }

    #[test]
    fn update_is_an_upsert() {
        let store = UserStore::new();
        store.update(user("7", "Carol", "FR"));

        assert_eq!(store.get("7").unwrap().country, "FR");
    }

    #[test]
    fn delete_missing_id_is_noop() {
        let store = UserStore::new();
        store.add(user("1", "Alice", "UK"));

        store.delete("missing");
        assert_eq!(store.len(), 1);

        store.delete("1");
        store.delete("1");
        assert!(store.is_empty());
    }

    #[test]
    fn list_returns_snapshot() {
        let store = UserStore::new();
        store.add(user("1", "Alice", "UK"));
        store.add(user("2", "Bob", "US"));

        let snapshot = store.list();
        store.delete("1");

        assert_eq!(snapshot.len(), 2);
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn clones_share_the_same_map() {
        let store = UserStore::new();
        let handle = store.clone();
        handle.add(user("1", "Alice", "UK"));

        assert!(store.get("1").is_some());
    }

    #[test]
    fn concurrent_adds_are_all_kept() {
        let store = UserStore::new();
        let workers: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        store.add(user(&format!("{t}-{i}"), "Worker", "UK"));
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(store.len(), 400);
    }
}
