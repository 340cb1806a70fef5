use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{not_found, Entity, Repository};
use crate::models::EntityId;
use crate::utils::error::AppResult;

/// Artificial delay applied by [`MemoryRepository`] to mimic a remote store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latency {
    pub read: Duration,
    pub write: Duration,
}

impl Latency {
    pub fn none() -> Self {
        Self::default()
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

struct Table<T> {
    rows: BTreeMap<EntityId, T>,
    /// Highest id ever handed out; ids are never reused after a delete.
    high_water: EntityId,
}

pub struct MemoryRepository<T: Entity> {
    table: RwLock<Table<T>>,
    latency: Latency,
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new(latency: Latency) -> Self {
        Self::with_rows(Vec::new(), latency)
    }

    pub fn with_rows(rows: Vec<T>, latency: Latency) -> Self {
        let rows: BTreeMap<EntityId, T> = rows.into_iter().map(|row| (row.id(), row)).collect();
        let high_water = rows.keys().next_back().copied().unwrap_or(0);
        Self {
            table: RwLock::new(Table { rows, high_water }),
            latency,
        }
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn get_all(&self) -> AppResult<Vec<T>> {
        pause(self.latency.read).await;
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn get_by_id(&self, id: EntityId) -> AppResult<T> {
        pause(self.latency.read).await;
        let table = self.table.read().await;
        table
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(T::KIND, id))
    }

    async fn get_by_parent_id(&self, parent_id: EntityId) -> AppResult<Vec<T>> {
        pause(self.latency.read).await;
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|row| row.parent_id() == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn create(&self, draft: T::Draft) -> AppResult<T> {
        pause(self.latency.write).await;
        let mut table = self.table.write().await;
        table.high_water += 1;
        let entity = T::from_draft(table.high_water, draft);
        table.rows.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: T) -> AppResult<T> {
        pause(self.latency.write).await;
        let mut table = self.table.write().await;
        match table.rows.get_mut(&entity.id()) {
            Some(row) => {
                *row = entity.clone();
                Ok(entity)
            }
            None => Err(not_found(T::KIND, entity.id())),
        }
    }

    async fn delete(&self, id: EntityId) -> AppResult<bool> {
        pause(self.latency.write).await;
        let mut table = self.table.write().await;
        table
            .rows
            .remove(&id)
            .map(|_| true)
            .ok_or_else(|| not_found(T::KIND, id))
    }
}
