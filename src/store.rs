//! Conversation store.
//!
//! Holds the graph attached to each chat conversation and which conversation
//! is active. It is an explicit object created once at startup and persisted
//! through an injected [`StoragePort`]; the layout core never reads it and
//! only ever receives the [`GraphDataset`] values it hands out.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::graph::GraphDataset;

/// Key the store persists under.
pub const STORAGE_KEY: &str = "kg-view.conversations";

/// Key/value persistence the store writes through.
pub trait StoragePort {
    /// Read a value. `Ok(None)` when the key was never written.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-process storage, for tests and hosts without persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePort for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Browser `localStorage`.
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    /// Open the window's local storage.
    pub fn open() -> Result<Self, StoreError> {
        let window =
            web_sys::window().ok_or_else(|| StoreError::Unavailable("no window".to_owned()))?;
        let storage = window
            .local_storage()
            .map_err(|error| StoreError::Unavailable(format!("{error:?}")))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".to_owned()))?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl StoragePort for LocalStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage
            .get_item(key)
            .map_err(|error| StoreError::Unavailable(format!("{error:?}")))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|error| StoreError::Unavailable(format!("{error:?}")))
    }
}

/// One chat conversation and the graph its last answer produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphDataset>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            graph: None,
        }
    }
}

/// Persisted form.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredState {
    #[serde(default)]
    conversations: Vec<Conversation>,
    #[serde(default)]
    active_id: Option<String>,
}

/// Conversations with their graphs, written through on every change.
pub struct ConversationStore<P: StoragePort> {
    port: P,
    conversations: Vec<Conversation>,
    active_id: Option<String>,
}

impl<P: StoragePort> ConversationStore<P> {
    /// Load persisted state from `port`, or start empty if nothing was saved.
    pub fn init(port: P) -> Result<Self, StoreError> {
        let state: StoredState = match port.load(STORAGE_KEY)? {
            Some(text) => serde_json::from_str(&text)?,
            None => StoredState::default(),
        };
        log::debug!("conversation store: {} conversations", state.conversations.len());

        let mut store = Self {
            port,
            conversations: state.conversations,
            active_id: None,
        };
        // A dangling active id is dropped rather than kept
        store.active_id = state.active_id.filter(|id| store.get(id).is_some());
        Ok(store)
    }

    /// All conversations in creation order.
    pub fn list(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|conversation| conversation.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations
            .iter_mut()
            .find(|conversation| conversation.id == id)
    }

    /// The active conversation.
    pub fn active(&self) -> Option<&Conversation> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    /// Graph of the active conversation, if it has one.
    pub fn active_dataset(&self) -> Option<&GraphDataset> {
        self.active().and_then(|conversation| conversation.graph.as_ref())
    }

    /// Add a conversation. An existing id keeps its graph and takes the new
    /// title.
    pub fn create(&mut self, id: &str, title: &str) -> Result<(), StoreError> {
        match self.get_mut(id) {
            Some(conversation) => conversation.title = title.to_owned(),
            None => self.conversations.push(Conversation::new(id, title)),
        }
        self.persist()
    }

    /// Switch the active conversation.
    pub fn set_active(&mut self, id: &str) -> Result<(), StoreError> {
        if self.get(id).is_none() {
            return Err(StoreError::NotFound(id.to_owned()));
        }
        self.active_id = Some(id.to_owned());
        self.persist()
    }

    /// Attach the graph from a chat answer to conversation `id`, creating the
    /// conversation if needed.
    ///
    /// Answers without a graph carry an empty object or `null`; those clear
    /// the graph rather than fail.
    pub fn upsert_graph(
        &mut self,
        id: &str,
        graph: serde_json::Value,
    ) -> Result<Option<&GraphDataset>, StoreError> {
        let dataset = match &graph {
            serde_json::Value::Null => None,
            serde_json::Value::Object(fields) if fields.is_empty() => None,
            _ => Some(GraphDataset::from_value(graph)?),
        };

        if self.get(id).is_none() {
            self.conversations.push(Conversation::new(id, id));
        }
        if let Some(conversation) = self.get_mut(id) {
            conversation.graph = dataset;
        }
        self.persist()?;
        Ok(self.get(id).and_then(|conversation| conversation.graph.as_ref()))
    }

    /// Delete a conversation. Returns true if it existed.
    pub fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.conversations.len();
        self.conversations.retain(|conversation| conversation.id != id);
        if self.conversations.len() == before {
            return Ok(false);
        }
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
        self.persist()?;
        Ok(true)
    }

    /// Give back the storage port, e.g. to reopen the store.
    pub fn into_port(self) -> P {
        self.port
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let state = StoredState {
            conversations: self.conversations.clone(),
            active_id: self.active_id.clone(),
        };
        let text = serde_json::to_string(&state)?;
        self.port.save(STORAGE_KEY, &text)
    }
}
