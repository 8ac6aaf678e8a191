use std::sync::{Arc, RwLock};

/// Shared holder for the current bearer token
///
/// The token only ever lives in process memory. Clones share the same
/// slot, so a backend clearing a rejected token logs out every holder at
/// once.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored token
    pub fn set(&self, token: String) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token);
        }
    }

    /// Get a copy of the stored token
    pub fn get(&self) -> Option<String> {
        self.token.read().ok().and_then(|slot| slot.clone())
    }

    /// Drop the stored token, reporting whether one was present
    pub fn clear(&self) -> bool {
        self.token
            .write()
            .ok()
            .and_then(|mut slot| slot.take())
            .is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_ok_and(|slot| slot.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear() {
        let store = TokenStore::new();
        assert!(!store.is_authenticated());
        assert_eq!(store.get(), None);

        store.set("abc".to_string());
        assert!(store.is_authenticated());
        assert_eq!(store.get(), Some("abc".to_string()));

        assert!(store.clear());
        assert!(!store.is_authenticated());
        // Clearing twice reports that nothing was stored
        assert!(!store.clear());
    }

    #[test]
    fn test_clones_share_the_slot() {
        let store = TokenStore::new();
        let clone = store.clone();

        store.set("abc".to_string());
        assert_eq!(clone.get(), Some("abc".to_string()));

        clone.clear();
        assert!(!store.is_authenticated());
    }
}
