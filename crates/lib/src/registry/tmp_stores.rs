//! Stores handed between interactive screens by index.

use std::sync::{Arc, Mutex};

use handle_trait::Handle;

use crate::engine::EventStore;

/// Indexed list of temporary event stores.
///
/// A screen that opens a store outside any session registers it here and
/// passes the index to the next screen, which looks it up again. Indices stay
/// valid until [`clear`](Self::clear).
#[derive(Debug, Clone, Default, Handle)]
pub struct TmpStores {
    stores: Arc<Mutex<Vec<Arc<dyn EventStore>>>>,
}

impl TmpStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// List `store` and return its index. A store that is already listed
    /// keeps its index.
    pub fn add(&self, store: Arc<dyn EventStore>) -> usize {
        let mut stores = self.stores.lock().unwrap();
        if let Some(pos) = stores
            .iter()
            .position(|s| std::ptr::addr_eq(Arc::as_ptr(s), Arc::as_ptr(&store)))
        {
            return pos;
        }
        stores.push(store);
        stores.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<Arc<dyn EventStore>> {
        self.stores.lock().unwrap().get(index).cloned()
    }

    /// Drop every listed store. Previously returned indices become invalid.
    pub fn clear(&self) {
        self.stores.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.stores.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.lock().unwrap().is_empty()
    }
}
