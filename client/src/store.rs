//! Client view of the shared store.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use async_trait::async_trait;
use thiserror::Error;

use floorplan_shared::{BoothId, BoothRecord, EventId, FloorPlan, Zone};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
}

#[async_trait(?Send)]
pub trait SharedStore {
    async fn list_booths(&self, event_id: &EventId) -> Result<Vec<BoothRecord>, StoreError>;

    /// Writes every row in one request; the store applies it as a batch.
    async fn upsert_booths(
        &self,
        event_id: &EventId,
        records: &[BoothRecord],
    ) -> Result<(), StoreError>;

    async fn create_booth(
        &self,
        event_id: &EventId,
        record: &BoothRecord,
    ) -> Result<BoothRecord, StoreError>;

    async fn remove_booth(&self, event_id: &EventId, booth_id: &BoothId) -> Result<(), StoreError>;

    async fn list_zones(&self, event_id: &EventId) -> Result<Vec<Zone>, StoreError>;

    async fn save_zones(&self, event_id: &EventId, zones: &[Zone]) -> Result<(), StoreError>;

    async fn load_floor_plan(&self, event_id: &EventId) -> Result<Option<FloorPlan>, StoreError>;

    /// Change-feed identity, sent with writes so the feed skips our own echo.
    fn set_connection_id(&self, _connection_id: Option<String>) {}
}

#[async_trait(?Send)]
impl<T: SharedStore + ?Sized> SharedStore for Rc<T> {
    async fn list_booths(&self, event_id: &EventId) -> Result<Vec<BoothRecord>, StoreError> {
        (**self).list_booths(event_id).await
    }

    async fn upsert_booths(
        &self,
        event_id: &EventId,
        records: &[BoothRecord],
    ) -> Result<(), StoreError> {
        (**self).upsert_booths(event_id, records).await
    }

    async fn create_booth(
        &self,
        event_id: &EventId,
        record: &BoothRecord,
    ) -> Result<BoothRecord, StoreError> {
        (**self).create_booth(event_id, record).await
    }

    async fn remove_booth(&self, event_id: &EventId, booth_id: &BoothId) -> Result<(), StoreError> {
        (**self).remove_booth(event_id, booth_id).await
    }

    async fn list_zones(&self, event_id: &EventId) -> Result<Vec<Zone>, StoreError> {
        (**self).list_zones(event_id).await
    }

    async fn save_zones(&self, event_id: &EventId, zones: &[Zone]) -> Result<(), StoreError> {
        (**self).save_zones(event_id, zones).await
    }

    async fn load_floor_plan(&self, event_id: &EventId) -> Result<Option<FloorPlan>, StoreError> {
        (**self).load_floor_plan(event_id).await
    }

    fn set_connection_id(&self, connection_id: Option<String>) {
        (**self).set_connection_id(connection_id)
    }
}

#[derive(Debug, Default)]
struct MemoryStoreState {
    booths: BTreeMap<String, BoothRecord>,
    zones: Vec<Zone>,
    floor_plan: Option<FloorPlan>,
    upserts: Vec<Vec<BoothRecord>>,
    failures_left: usize,
    list_calls: usize,
    next_id: u64,
}

/// In-process store for tests and offline use. Writes can be made to fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<MemoryStoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_booths(records: impl IntoIterator<Item = BoothRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert_booth(record);
        }
        store
    }

    /// Changes a row as another editor would, bypassing failure injection.
    pub fn insert_booth(&self, record: BoothRecord) {
        self.state
            .borrow_mut()
            .booths
            .insert(record.id.clone(), record);
    }

    pub fn set_floor_plan(&self, plan: Option<FloorPlan>) {
        self.state.borrow_mut().floor_plan = plan;
    }

    pub fn fail_next_writes(&self, count: usize) {
        self.state.borrow_mut().failures_left = count;
    }

    pub fn booth(&self, id: &str) -> Option<BoothRecord> {
        self.state.borrow().booths.get(id).cloned()
    }

    pub fn upsert_batches(&self) -> Vec<Vec<BoothRecord>> {
        self.state.borrow().upserts.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.borrow().list_calls
    }

    pub fn zones(&self) -> Vec<Zone> {
        self.state.borrow().zones.clone()
    }

    fn check_write(&self) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(StoreError::Network("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl SharedStore for MemoryStore {
    async fn list_booths(&self, event_id: &EventId) -> Result<Vec<BoothRecord>, StoreError> {
        let mut state = self.state.borrow_mut();
        state.list_calls += 1;
        Ok(state
            .booths
            .values()
            .filter(|record| record.event_id == event_id.as_str())
            .cloned()
            .collect())
    }

    async fn upsert_booths(
        &self,
        event_id: &EventId,
        records: &[BoothRecord],
    ) -> Result<(), StoreError> {
        self.check_write()?;
        let mut state = self.state.borrow_mut();
        let batch = records
            .iter()
            .cloned()
            .map(|mut record| {
                record.event_id = event_id.to_string();
                record
            })
            .collect::<Vec<_>>();
        for record in &batch {
            state.booths.insert(record.id.clone(), record.clone());
        }
        state.upserts.push(batch);
        Ok(())
    }

    async fn create_booth(
        &self,
        event_id: &EventId,
        record: &BoothRecord,
    ) -> Result<BoothRecord, StoreError> {
        self.check_write()?;
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let mut created = record.clone();
        created.id = format!("booth-{}", state.next_id);
        created.event_id = event_id.to_string();
        state.booths.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn remove_booth(&self, _event_id: &EventId, booth_id: &BoothId) -> Result<(), StoreError> {
        self.check_write()?;
        self.state
            .borrow_mut()
            .booths
            .remove(booth_id.as_str())
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("booth {booth_id}")))
    }

    async fn list_zones(&self, _event_id: &EventId) -> Result<Vec<Zone>, StoreError> {
        Ok(self.state.borrow().zones.clone())
    }

    async fn save_zones(&self, _event_id: &EventId, zones: &[Zone]) -> Result<(), StoreError> {
        self.check_write()?;
        self.state.borrow_mut().zones = zones.to_vec();
        Ok(())
    }

    async fn load_floor_plan(&self, _event_id: &EventId) -> Result<Option<FloorPlan>, StoreError> {
        Ok(self.state.borrow().floor_plan.clone())
    }
}
