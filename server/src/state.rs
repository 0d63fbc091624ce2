use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use floorplan_shared::{BoothRecord, FloorPlan, PlanFileData, ServerMessage, Zone};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::geocode::Geocoder;
use crate::storage::Storage;

pub const MAX_BOOTHS: usize = 500;
pub const MAX_ZONES: usize = 64;

pub type SharedBoard = Arc<RwLock<Board>>;

#[derive(Clone)]
pub struct AppState {
    pub boards: Arc<RwLock<HashMap<String, SharedBoard>>>,
    pub storage: Arc<dyn Storage>,
    pub geocoder: Arc<dyn Geocoder>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            boards: Arc::new(RwLock::new(HashMap::new())),
            storage,
            geocoder,
        }
    }
}

/// Live state of one event's floor plan plus the editors watching it.
#[derive(Default)]
pub struct Board {
    pub booths: BTreeMap<String, BoothRecord>,
    pub zones: Vec<Zone>,
    pub floor_plan: Option<FloorPlan>,
    pub peers: HashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    pub dirty: bool,
}

impl Board {
    pub fn new(data: PlanFileData) -> Self {
        Self {
            booths: data
                .booths
                .into_iter()
                .map(|record| (record.id.clone(), record))
                .collect(),
            zones: data.zones,
            floor_plan: data.floor_plan,
            peers: HashMap::new(),
            dirty: false,
        }
    }

    pub fn to_plan_data(&self) -> PlanFileData {
        PlanFileData {
            floor_plan: self.floor_plan.clone(),
            booths: self.booths.values().cloned().collect(),
            zones: self.zones.clone(),
        }
    }
}
