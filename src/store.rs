use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// The Store maps keys to values for the whole lifetime of the server. It is shared by every
/// connection and cloned cheaply using reference counting.
///
/// Reads take a shared lock and may run in parallel; writes take the lock exclusively. Each call
/// is atomic on its own, there is no multi-key transaction.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<HashMap<Bytes, Bytes>>>,
}

impl Store {
    pub fn new() -> Store {
        Self::default()
    }

    /// Inserts `value` under `key`, replacing any previous value.
    pub fn set(&self, key: Bytes, value: Bytes) {
        self.inner.write().insert(key, value);
    }

    /// Returns the current value of `key`, or `None` if it was never set.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.inner.read().get(key).cloned()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn get_missing_key() {
        let store = Store::new();

        assert_eq!(store.get(b"missing"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn last_write_wins() {
        let store = Store::new();

        store.set(Bytes::from("foo"), Bytes::from("v1"));
        store.set(Bytes::from("foo"), Bytes::from("v2"));

        assert_eq!(store.get(b"foo"), Some(Bytes::from("v2")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clones_share_state() {
        let store = Store::new();
        let other = store.clone();

        other.set(Bytes::from("foo"), Bytes::from("bar"));

        assert_eq!(store.get(b"foo"), Some(Bytes::from("bar")));
    }

    #[test]
    fn readers_do_not_block_each_other() {
        let store = Store::new();
        store.set(Bytes::from("foo"), Bytes::from("bar"));

        // Holding a read guard must not prevent another reader from getting in.
        let guard = store.inner.read();
        let reader = {
            let store = store.clone();
            thread::spawn(move || store.get(b"foo"))
        };

        assert_eq!(reader.join().unwrap(), Some(Bytes::from("bar")));
        drop(guard);
    }

    #[test]
    fn concurrent_writes_are_never_torn() {
        let store = Store::new();
        let values: Vec<Bytes> = (0..8)
            .map(|i| Bytes::from(format!("{i}").repeat(1024)))
            .collect();

        let writers: Vec<_> = values
            .iter()
            .cloned()
            .map(|value| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.set(Bytes::from("key"), value.clone());
                    }
                })
            })
            .collect();

        for _ in 0..100 {
            if let Some(value) = store.get(b"key") {
                assert!(values.contains(&value));
            }
        }

        for writer in writers {
            writer.join().unwrap();
        }

        let last = store.get(b"key").unwrap();
        assert!(values.contains(&last));
    }
}
