use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use super::{Ticket, TicketPatch};
use crate::error::StorageError;

/// Where tickets live between runs.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create(&self, ticket: Ticket) -> Result<Ticket, StorageError>;

    async fn get(&self, id: &str) -> Result<Option<Ticket>, StorageError>;

    /// Merge `patch` into the stored ticket, always refreshing `updated_at`.
    async fn update(&self, id: &str, patch: TicketPatch) -> Result<Option<Ticket>, StorageError>;

    async fn list(&self) -> Result<Vec<Ticket>, StorageError>;
}

/// Tickets held in a single JSON document, rewritten whole under a lock.
pub struct JsonFileTicketStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileTicketStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read(&self) -> Result<BTreeMap<String, Ticket>, StorageError> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, tickets: &BTreeMap<String, Ticket>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(tickets)?).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl TicketStore for JsonFileTicketStore {
    async fn create(&self, ticket: Ticket) -> Result<Ticket, StorageError> {
        let _guard = self.lock.lock().await;
        let mut tickets = self.read().await?;
        tickets.insert(ticket.id.clone(), ticket.clone());
        self.write(&tickets).await?;
        Ok(ticket)
    }

    async fn get(&self, id: &str) -> Result<Option<Ticket>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.remove(id))
    }

    async fn update(&self, id: &str, patch: TicketPatch) -> Result<Option<Ticket>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut tickets = self.read().await?;
        let Some(ticket) = tickets.get_mut(id) else {
            return Ok(None);
        };
        ticket.apply(patch);
        let updated = ticket.clone();
        self.write(&tickets).await?;
        Ok(Some(updated))
    }

    async fn list(&self) -> Result<Vec<Ticket>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut tickets: Vec<Ticket> = self.read().await?.into_values().collect();
        tickets.sort_by_key(|t| t.created_at);
        Ok(tickets)
    }
}

/// Volatile ticket store for tests and the offline demo.
#[derive(Default)]
pub struct InMemoryTicketStore {
    tickets: Mutex<BTreeMap<String, Ticket>>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn create(&self, ticket: Ticket) -> Result<Ticket, StorageError> {
        self.tickets
            .lock()
            .await
            .insert(ticket.id.clone(), ticket.clone());
        Ok(ticket)
    }

    async fn get(&self, id: &str) -> Result<Option<Ticket>, StorageError> {
        Ok(self.tickets.lock().await.get(id).cloned())
    }

    async fn update(&self, id: &str, patch: TicketPatch) -> Result<Option<Ticket>, StorageError> {
        let mut tickets = self.tickets.lock().await;
        Ok(tickets.get_mut(id).map(|ticket| {
            ticket.apply(patch);
            ticket.clone()
        }))
    }

    async fn list(&self) -> Result<Vec<Ticket>, StorageError> {
        let mut tickets: Vec<Ticket> = self.tickets.lock().await.values().cloned().collect();
        tickets.sort_by_key(|t| t.created_at);
        Ok(tickets)
    }
}
