//! One organizer's editing session for one event.
//!
//! The session wires the editor to the store: modifications restart the
//! debounced save, the change feed triggers whole-collection reloads, and
//! anything that goes wrong becomes a notice rather than an interruption.
//! Each async operation also exists as a synchronous begin/apply pair so a
//! front end holding the session in a `RefCell` never keeps it borrowed
//! across an await.

use floorplan_shared::{
    Booth, BoothDetails, BoothId, BoothRecord, CellSize, EventId, FloorPlan, GridPosition,
    ServerMessage, Zone, ZoneId, ZoneOverlay,
};

use crate::clock::Clock;
use crate::editor::{BoothKey, EditorEvent, GridPlacement, PlacementEditor};
use crate::notify::Notifier;
use crate::persistence::{InputKind, PersistenceLayer, SaveBatch};
use crate::reconcile::{Reconciler, RemoteDecision};
use crate::store::{SharedStore, StoreError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackgroundState {
    Absent,
    Loading(String),
    Ready(String),
    Failed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteFetch {
    Booths,
    Zones,
    FloorPlan,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub written: usize,
    pub skipped_drafts: usize,
    pub failed: bool,
}

pub struct PlacementSession<S, C> {
    store: S,
    clock: C,
    editor: PlacementEditor,
    persistence: PersistenceLayer,
    reconciler: Reconciler,
    notifier: Notifier,
    zones: ZoneOverlay,
    floor_plan: Option<FloorPlan>,
    background: BackgroundState,
    mounted: bool,
}

impl<S: SharedStore, C: Clock> PlacementSession<S, C> {
    pub fn new(event_id: EventId, store: S, clock: C, cell_size: CellSize) -> Self {
        Self {
            store,
            clock,
            editor: PlacementEditor::new(event_id, cell_size),
            persistence: PersistenceLayer::new(),
            reconciler: Reconciler::default(),
            notifier: Notifier::new(),
            zones: ZoneOverlay::default(),
            floor_plan: None,
            background: BackgroundState::Absent,
            mounted: true,
        }
    }

    pub fn event_id(&self) -> &EventId {
        self.editor.event_id()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn editor(&self) -> &PlacementEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut PlacementEditor {
        &mut self.editor
    }

    pub fn persistence(&self) -> &PersistenceLayer {
        &self.persistence
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut Notifier {
        &mut self.notifier
    }

    pub fn zones(&self) -> &ZoneOverlay {
        &self.zones
    }

    pub fn floor_plan(&self) -> Option<&FloorPlan> {
        self.floor_plan.as_ref()
    }

    pub fn background(&self) -> &BackgroundState {
        &self.background
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Initial fetch of booths, zones and the floor plan. Only a booth
    /// failure is fatal; the rest degrade to an empty overlay or no
    /// background.
    pub async fn load(&mut self) -> Result<(), StoreError> {
        let event_id = self.event_id().clone();
        let booths = self.store.list_booths(&event_id).await;
        self.loaded_booths(booths)?;
        let zones = self.store.list_zones(&event_id).await;
        self.loaded_zones(zones);
        let plan = self.store.load_floor_plan(&event_id).await;
        self.loaded_floor_plan(plan);
        tracing::info!(
            event_id = %event_id,
            booths = self.editor.booths().len(),
            zones = self.zones.list_zones().len(),
            "placement session loaded"
        );
        Ok(())
    }

    pub fn loaded_booths(
        &mut self,
        result: Result<Vec<BoothRecord>, StoreError>,
    ) -> Result<(), StoreError> {
        match result {
            Ok(records) => {
                self.apply_booths(records);
                Ok(())
            }
            Err(error) => {
                self.notifier
                    .error(format!("Could not load booths: {error}"));
                Err(error)
            }
        }
    }

    pub fn loaded_zones(&mut self, result: Result<Vec<Zone>, StoreError>) {
        match result {
            Ok(zones) => self.apply_zones(zones),
            Err(error) => {
                self.notifier.warn(format!("Could not load zones: {error}"));
            }
        }
    }

    pub fn loaded_floor_plan(&mut self, result: Result<Option<FloorPlan>, StoreError>) {
        match result {
            Ok(plan) => self.apply_floor_plan(plan),
            Err(error) => {
                self.notifier
                    .warn(format!("Could not load the floor plan: {error}"));
            }
        }
    }

    /// Replaces saved booths with store rows; rows that do not describe a
    /// placeable booth are skipped. Booths changed locally that the store
    /// has not acknowledged keep their local state.
    pub fn apply_booths(&mut self, records: Vec<BoothRecord>) {
        let mut booths = Vec::with_capacity(records.len());
        let mut skipped = 0usize;
        for record in records {
            match Booth::try_from(record) {
                Ok(booth) => booths.push(booth),
                Err(error) => {
                    tracing::warn!(%error, "booth row skipped");
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            self.notifier
                .warn(format!("{skipped} booth(s) could not be placed on the map"));
        }
        let keep = self.persistence.unacknowledged();
        self.editor.replace_saved_keeping(booths, &keep);
    }

    pub fn apply_zones(&mut self, zones: Vec<Zone>) {
        self.zones = ZoneOverlay::new(zones);
    }

    pub fn apply_floor_plan(&mut self, plan: Option<FloorPlan>) {
        let plan = plan.map(FloorPlan::sanitized);
        self.background = match plan.as_ref().and_then(|plan| plan.background_url.clone()) {
            Some(url) if self.background == BackgroundState::Ready(url.clone()) => {
                BackgroundState::Ready(url)
            }
            Some(url) => BackgroundState::Loading(url),
            None => BackgroundState::Absent,
        };
        self.floor_plan = plan;
    }

    pub fn background_loaded(&mut self) {
        if let BackgroundState::Loading(url) = &self.background {
            self.background = BackgroundState::Ready(url.clone());
        }
    }

    /// The map keeps working on the plain grid when the image is missing.
    pub fn background_failed(&mut self) {
        let url = match &self.background {
            BackgroundState::Loading(url) | BackgroundState::Ready(url) => url.clone(),
            BackgroundState::Absent | BackgroundState::Failed(_) => return,
        };
        tracing::warn!(%url, "floor-plan background failed to load");
        self.background = BackgroundState::Failed(url);
        self.notifier
            .warn("The floor-plan background could not be loaded; showing the grid only");
    }

    pub fn handle(&mut self, event: EditorEvent, input: InputKind) {
        if !self.mounted {
            return;
        }
        match event {
            EditorEvent::Modified(key) => {
                let now = self.clock.now();
                tracing::debug!(booth = %key, "booth modified");
                self.reconciler.note_local_interaction(now);
                self.persistence.track(key);
                self.persistence.note_mutation(now, input);
            }
        }
    }

    pub fn pointer_down(&mut self, screen_x: f64, screen_y: f64) {
        self.editor.pointer_down(screen_x, screen_y);
    }

    pub fn pointer_move(&mut self, screen_x: f64, screen_y: f64) {
        self.editor.pointer_move(screen_x, screen_y);
    }

    pub fn pointer_up(&mut self, input: InputKind) {
        if let Some(event) = self.editor.pointer_up() {
            self.handle(event, input);
        }
    }

    pub fn place_on_grid(
        &mut self,
        key: &BoothKey,
        position: GridPosition,
        input: InputKind,
    ) -> GridPlacement {
        let outcome = self.editor.place_on_grid(key, position);
        if outcome == GridPlacement::Placed {
            self.handle(EditorEvent::Modified(key.clone()), input);
        }
        outcome
    }

    pub fn update_details(&mut self, key: &BoothKey, details: BoothDetails, input: InputKind) -> bool {
        if !self.editor.update_details(key, details) {
            return false;
        }
        self.handle(EditorEvent::Modified(key.clone()), input);
        true
    }

    /// Starts the write if the idle timer has run out.
    pub fn poll_save(&mut self) -> Option<SaveBatch> {
        if !self.mounted || !self.persistence.poll(self.clock.now()) {
            return None;
        }
        self.begin_save()
    }

    pub fn begin_save(&mut self) -> Option<SaveBatch> {
        self.persistence.begin_save(&mut self.editor)
    }

    pub fn finish_save(&mut self, batch: &SaveBatch, result: Result<(), StoreError>) -> SaveReport {
        let report = SaveReport {
            written: if result.is_ok() { batch.records.len() } else { 0 },
            skipped_drafts: batch.skipped_drafts,
            failed: result.is_err(),
        };
        self.persistence
            .finish_save(&mut self.editor, batch, result, &mut self.notifier);
        report
    }

    async fn write_batch(&mut self, batch: SaveBatch) -> SaveReport {
        let result = if batch.records.is_empty() {
            Ok(())
        } else {
            let event_id = self.event_id().clone();
            self.store.upsert_booths(&event_id, &batch.records).await
        };
        self.finish_save(&batch, result)
    }

    /// Writes immediately, bypassing the idle timer.
    pub async fn save_now(&mut self) -> Option<SaveReport> {
        let batch = self.begin_save()?;
        Some(self.write_batch(batch).await)
    }

    /// Drives time-based work: a due save, then a held-back reload.
    pub async fn tick(&mut self) -> Option<SaveReport> {
        let report = match self.poll_save() {
            Some(batch) => Some(self.write_batch(batch).await),
            None => None,
        };
        if self.poll_deferred_reload() {
            if let Err(error) = self.fetch_remote_booths().await {
                tracing::warn!(%error, "deferred reload failed");
            }
        }
        report
    }

    /// Booth reloads wait for a gesture or a running write to finish,
    /// whether they come straight from the feed or were held back.
    fn booth_reload_blocked(&self) -> bool {
        self.editor.is_gesture_active() || self.persistence.is_in_flight()
    }

    /// A held-back remote change is released under the same rule as a live
    /// one: once the window is over and nothing blocks a reload.
    pub fn poll_deferred_reload(&mut self) -> bool {
        if !self.mounted || self.booth_reload_blocked() {
            return false;
        }
        self.reconciler.take_deferred(self.clock.now())
    }

    /// Classifies a change-feed frame and says what, if anything, to fetch.
    pub fn on_remote_message(&mut self, message: &ServerMessage) -> Option<RemoteFetch> {
        if !self.mounted {
            return None;
        }
        match message {
            ServerMessage::Welcome { connection_id } => {
                self.store.set_connection_id(Some(connection_id.clone()));
                None
            }
            ServerMessage::BoothsChanged { event_id } if event_id == self.event_id().as_str() => {
                if self.booth_reload_blocked() {
                    self.reconciler.defer();
                    return None;
                }
                match self.reconciler.on_remote_change(self.clock.now()) {
                    RemoteDecision::Reload => Some(RemoteFetch::Booths),
                    RemoteDecision::Suppressed => None,
                }
            }
            ServerMessage::ZonesChanged { event_id } if event_id == self.event_id().as_str() => {
                Some(RemoteFetch::Zones)
            }
            ServerMessage::FloorPlanChanged { event_id }
                if event_id == self.event_id().as_str() =>
            {
                Some(RemoteFetch::FloorPlan)
            }
            _ => None,
        }
    }

    /// Applies fetched booths unless local work started while they were in
    /// transit, in which case the change is held back again.
    pub fn apply_remote_booths(&mut self, records: Vec<BoothRecord>) -> bool {
        let now = self.clock.now();
        if self.booth_reload_blocked() || self.reconciler.is_suppressed(now) {
            self.reconciler.defer();
            return false;
        }
        self.apply_booths(records);
        true
    }

    async fn fetch_remote_booths(&mut self) -> Result<bool, StoreError> {
        let event_id = self.event_id().clone();
        let records = self.store.list_booths(&event_id).await?;
        Ok(self.apply_remote_booths(records))
    }

    /// Reacts to a change-feed frame; returns whether local state changed.
    pub async fn on_remote_change(&mut self, message: &ServerMessage) -> Result<bool, StoreError> {
        let Some(fetch) = self.on_remote_message(message) else {
            return Ok(false);
        };
        let event_id = self.event_id().clone();
        match fetch {
            RemoteFetch::Booths => self.fetch_remote_booths().await,
            RemoteFetch::Zones => {
                let zones = self.store.list_zones(&event_id).await?;
                self.apply_zones(zones);
                Ok(true)
            }
            RemoteFetch::FloorPlan => {
                let plan = self.store.load_floor_plan(&event_id).await?;
                self.apply_floor_plan(plan);
                Ok(true)
            }
        }
    }

    /// Re-reads every booth from the store. Drafts are kept.
    pub async fn reload(&mut self) -> Result<(), StoreError> {
        let event_id = self.event_id().clone();
        match self.store.list_booths(&event_id).await {
            Ok(records) => {
                self.apply_booths(records);
                Ok(())
            }
            Err(error) => {
                self.notifier
                    .warn(format!("Could not refresh booths: {error}"));
                Err(error)
            }
        }
    }

    /// Creates a draft in the store and adopts the id it was given.
    pub async fn create_booth(&mut self, key: &BoothKey) -> Result<BoothId, StoreError> {
        let record = self.begin_create(key)?;
        let event_id = self.event_id().clone();
        let result = self.store.create_booth(&event_id, &record).await;
        self.finish_create(key, result)
    }

    /// Row to send for a draft, once it has an organization name.
    pub fn begin_create(&self, key: &BoothKey) -> Result<BoothRecord, StoreError> {
        let record = self
            .editor
            .draft_record(key)
            .ok_or_else(|| StoreError::Invalid(format!("{key} is not a new booth")))?;
        if record.org_name.trim().is_empty() {
            return Err(StoreError::Invalid(
                "a booth needs an organization name before it can be saved".to_string(),
            ));
        }
        Ok(record)
    }

    pub fn finish_create(
        &mut self,
        key: &BoothKey,
        result: Result<BoothRecord, StoreError>,
    ) -> Result<BoothId, StoreError> {
        match result {
            Ok(created) => {
                let id = BoothId::new(created.id);
                self.editor.assign_identity(key, id.clone());
                tracing::info!(booth_id = %id, "booth created");
                Ok(id)
            }
            Err(error) => {
                self.notifier
                    .error(format!("Could not create booth: {error}"));
                Err(error)
            }
        }
    }

    /// Removes a booth locally and, if it was saved, from the store. A booth
    /// the store no longer knows is treated as already gone.
    pub async fn remove_booth(&mut self, key: &BoothKey) -> Result<(), StoreError> {
        let result = match key {
            BoothKey::Saved(id) => {
                let event_id = self.event_id().clone();
                self.store.remove_booth(&event_id, id).await
            }
            BoothKey::Draft(_) => Ok(()),
        };
        self.finish_remove(key, result)
    }

    pub fn finish_remove(
        &mut self,
        key: &BoothKey,
        result: Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        match result {
            Ok(()) | Err(StoreError::NotFound(_)) => {
                self.editor.remove(key);
                Ok(())
            }
            Err(error) => {
                self.notifier
                    .error(format!("Could not remove booth: {error}"));
                Err(error)
            }
        }
    }

    pub async fn add_zone(&mut self, zone: Zone) -> Result<ZoneId, StoreError> {
        let id = self.zones.add_zone(zone).id.clone();
        self.save_zones().await?;
        Ok(id)
    }

    pub async fn update_zone(&mut self, zone: Zone) -> Result<bool, StoreError> {
        if !self.zones.update_zone(zone) {
            return Ok(false);
        }
        self.save_zones().await?;
        Ok(true)
    }

    pub async fn remove_zone(&mut self, id: &ZoneId) -> Result<bool, StoreError> {
        if self.zones.remove_zone(id).is_none() {
            return Ok(false);
        }
        self.save_zones().await?;
        Ok(true)
    }

    async fn save_zones(&mut self) -> Result<(), StoreError> {
        let event_id = self.event_id().clone();
        let result = self
            .store
            .save_zones(&event_id, self.zones.list_zones())
            .await;
        if let Err(error) = &result {
            self.notifier.error(format!("Could not save zones: {error}"));
        }
        result
    }

    /// Stops the session. A save still waiting on its timer is dropped.
    pub fn unmount(&mut self) {
        if self.persistence.cancel() {
            tracing::warn!(event_id = %self.event_id(), "unsaved booth changes dropped on unmount");
        }
        self.mounted = false;
    }

    /// Resumes a session stopped by [`unmount`](Self::unmount), e.g. a page
    /// restored from the back-forward cache. Edits whose save was dropped are
    /// queued again and booths are re-read once nothing blocks a reload.
    pub fn remount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        if self.persistence.is_dirty() {
            self.persistence
                .note_mutation(self.clock.now(), InputKind::Pointer);
        }
        self.reconciler.defer();
        tracing::info!(event_id = %self.event_id(), "placement session resumed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::NoticeLevel;
    use crate::store::MemoryStore;
    use floorplan_shared::{Placement, ZoneFootprint};
    use pretty_assertions::assert_eq;

    fn cell(row: u8, col: u8) -> GridPosition {
        GridPosition::new(row, col).unwrap()
    }

    fn row(id: &str, row: i32, col: i32) -> BoothRecord {
        BoothRecord {
            id: id.to_string(),
            event_id: "expo".to_string(),
            grid_row: Some(row),
            grid_col: Some(col),
            org_name: format!("Org {id}"),
            ..BoothRecord::default()
        }
    }

    fn saved(id: &str) -> BoothKey {
        BoothKey::Saved(BoothId::new(id))
    }

    fn booths_changed() -> ServerMessage {
        ServerMessage::BoothsChanged {
            event_id: "expo".to_string(),
        }
    }

    async fn session_with(
        records: Vec<BoothRecord>,
    ) -> (PlacementSession<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        let mut session = PlacementSession::new(
            EventId::new("expo"),
            MemoryStore::with_booths(records),
            clock.clone(),
            CellSize::Desktop,
        );
        session.load().await.unwrap();
        (session, clock)
    }

    #[tokio::test]
    async fn two_quick_moves_produce_one_write_with_the_final_cell() {
        let (mut session, clock) = session_with(vec![row("a", 0, 0)]).await;

        session.place_on_grid(&saved("a"), cell(2, 5), InputKind::Pointer);
        clock.set(1500);
        session.place_on_grid(&saved("a"), cell(3, 6), InputKind::Pointer);

        clock.set(2000);
        assert_eq!(session.tick().await, None);
        clock.set(3499);
        assert_eq!(session.tick().await, None);
        clock.set(3500);
        assert_eq!(
            session.tick().await,
            Some(SaveReport {
                written: 1,
                skipped_drafts: 0,
                failed: false,
            })
        );

        let batches = session.store().upsert_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].grid_row, Some(3));
        assert_eq!(batches[0][0].grid_col, Some(6));
        clock.set(10_000);
        assert_eq!(session.tick().await, None);
        assert_eq!(session.store().upsert_batches().len(), 1);
    }

    #[tokio::test]
    async fn touch_input_waits_three_seconds() {
        let (mut session, clock) = session_with(vec![row("a", 0, 0)]).await;
        session.place_on_grid(&saved("a"), cell(1, 1), InputKind::Touch);
        clock.set(2999);
        assert_eq!(session.tick().await, None);
        clock.set(3000);
        assert!(session.tick().await.is_some());
    }

    #[tokio::test]
    async fn failed_write_keeps_local_state_and_retries_next_time() {
        let (mut session, clock) = session_with(vec![row("a", 0, 0)]).await;
        session.store().fail_next_writes(1);
        session.place_on_grid(&saved("a"), cell(4, 4), InputKind::Pointer);
        clock.set(2000);
        let report = session.tick().await.unwrap();
        assert!(report.failed);
        assert_eq!(
            session.editor().booth(&saved("a")).unwrap().placement,
            Placement::Grid(cell(4, 4))
        );
        assert!(session.editor().is_interactive());
        assert!(session
            .notifier()
            .pending()
            .any(|notice| notice.level == NoticeLevel::Error));
        assert_eq!(session.store().booth("a").unwrap().grid_row, Some(0));

        session.place_on_grid(&saved("a"), cell(5, 5), InputKind::Pointer);
        clock.set(4000);
        assert!(!session.tick().await.unwrap().failed);
        assert_eq!(session.store().booth("a").unwrap().grid_row, Some(5));
    }

    #[tokio::test]
    async fn drafts_are_not_written_and_the_organizer_is_told() {
        let (mut session, clock) = session_with(vec![row("a", 0, 0)]).await;
        let draft = session.editor_mut().add_blank();
        session.place_on_grid(&draft, cell(7, 11), InputKind::Pointer);
        clock.set(2000);
        let report = session.tick().await.unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.skipped_drafts, 1);
        assert!(session.notifier().pending().any(|notice| {
            notice.message == "1 new booth(s) need details before saving"
        }));
    }

    #[tokio::test]
    async fn remote_change_inside_the_window_waits_for_it_to_close() {
        let (mut session, clock) = session_with(vec![row("a", 0, 0), row("b", 1, 1)]).await;
        session.place_on_grid(&saved("a"), cell(2, 2), InputKind::Pointer);
        clock.set(2000);
        assert!(session.tick().await.is_some());

        clock.set(2500);
        session.store().insert_booth(row("b", 6, 6));
        assert!(!session.on_remote_change(&booths_changed()).await.unwrap());
        assert!(session.reconciler().has_deferred());

        clock.set(2999);
        session.tick().await;
        assert_eq!(
            session.editor().booth(&saved("b")).unwrap().placement,
            Placement::Grid(cell(1, 1))
        );

        clock.set(3000);
        session.tick().await;
        assert_eq!(
            session.editor().booth(&saved("b")).unwrap().placement,
            Placement::Grid(cell(6, 6))
        );
        assert_eq!(
            session.editor().booth(&saved("a")).unwrap().placement,
            Placement::Grid(cell(2, 2))
        );
        assert!(!session.reconciler().has_deferred());
    }

    #[tokio::test]
    async fn remote_change_outside_the_window_reloads_and_keeps_drafts() {
        let (mut session, clock) = session_with(vec![row("a", 0, 0)]).await;
        let draft = session.editor_mut().add_blank();
        clock.set(50_000);
        session.store().insert_booth(row("c", 3, 3));
        assert!(session.on_remote_change(&booths_changed()).await.unwrap());
        assert!(session.editor().booth(&saved("c")).is_some());
        assert!(session.editor().booth(&draft).is_some());

        let other_event = ServerMessage::BoothsChanged {
            event_id: "other".to_string(),
        };
        assert!(!session.on_remote_change(&other_event).await.unwrap());
    }

    #[tokio::test]
    async fn create_booth_requires_a_name_and_adopts_the_store_id() {
        let (mut session, _clock) = session_with(Vec::new()).await;
        let draft = session.editor_mut().add_blank();
        assert!(matches!(
            session.create_booth(&draft).await,
            Err(StoreError::Invalid(_))
        ));

        let details = BoothDetails {
            org_name: "Harbor College".to_string(),
            ..BoothDetails::default()
        };
        assert!(session.update_details(&draft, details, InputKind::Pointer));
        let id = session.create_booth(&draft).await.unwrap();
        assert_eq!(id, BoothId::new("booth-1"));
        assert!(session.editor().booth(&draft).is_none());
        assert!(session.store().booth("booth-1").is_some());

        session.remove_booth(&BoothKey::Saved(id)).await.unwrap();
        assert!(session.editor().booths().is_empty());
        assert!(session.store().booth("booth-1").is_none());
    }

    #[tokio::test]
    async fn zones_are_written_through() {
        let (mut session, _clock) = session_with(Vec::new()).await;
        let id = session
            .add_zone(Zone::new("Colleges", "", ZoneFootprint::clamped(0, 0, 2, 3)))
            .await
            .unwrap();
        assert_eq!(session.store().zones().len(), 1);
        assert!(session.remove_zone(&id).await.unwrap());
        assert!(session.store().zones().is_empty());
        assert!(!session.remove_zone(&id).await.unwrap());
    }

    #[tokio::test]
    async fn broken_background_degrades_to_the_grid() {
        let (mut session, _clock) = session_with(Vec::new()).await;
        let mut plan = FloorPlan::new(EventId::new("expo"), "hall".into());
        plan.background_url = Some("/bg.jpg".to_string());
        session.apply_floor_plan(Some(plan));
        assert_eq!(
            session.background(),
            &BackgroundState::Loading("/bg.jpg".to_string())
        );
        session.background_failed();
        assert_eq!(
            session.background(),
            &BackgroundState::Failed("/bg.jpg".to_string())
        );
        assert!(session.notifier().pending().any(|notice| notice.level == NoticeLevel::Warning));
    }

    #[tokio::test]
    async fn unmount_drops_the_pending_save() {
        let (mut session, clock) = session_with(vec![row("a", 0, 0)]).await;
        session.place_on_grid(&saved("a"), cell(3, 3), InputKind::Pointer);
        session.unmount();
        clock.set(5000);
        assert_eq!(session.tick().await, None);
        assert!(session.store().upsert_batches().is_empty());
    }

    #[tokio::test]
    async fn remount_resumes_saving_and_rereads_booths() {
        let (mut session, clock) = session_with(vec![row("a", 0, 0)]).await;
        session.place_on_grid(&saved("a"), cell(3, 3), InputKind::Pointer);
        session.unmount();
        clock.set(5000);
        assert_eq!(session.tick().await, None);

        session.store().insert_booth(row("b", 6, 6));
        session.remount();
        assert!(session.is_mounted());
        session.place_on_grid(&saved("a"), cell(4, 4), InputKind::Pointer);
        assert!(session.editor().booth(&saved("b")).is_none());

        clock.set(7000);
        assert!(!session.tick().await.unwrap().failed);
        assert_eq!(session.store().booth("a").unwrap().grid_row, Some(4));
        assert!(session.reconciler().has_deferred());

        clock.set(8000);
        session.tick().await;
        assert_eq!(
            session.editor().booth(&saved("b")).unwrap().placement,
            Placement::Grid(cell(6, 6))
        );
        assert!(!session.reconciler().has_deferred());
    }

    #[tokio::test]
    async fn failed_save_does_not_strand_a_held_back_reload() {
        let (mut session, clock) = session_with(vec![row("a", 0, 0), row("b", 1, 1)]).await;
        session.store().fail_next_writes(1);
        session.place_on_grid(&saved("a"), cell(2, 2), InputKind::Pointer);
        clock.set(2000);
        assert!(session.tick().await.unwrap().failed);

        clock.set(2500);
        session.store().insert_booth(row("b", 6, 6));
        assert!(!session.on_remote_change(&booths_changed()).await.unwrap());
        assert!(session.reconciler().has_deferred());

        clock.set(3000);
        session.tick().await;
        assert!(!session.reconciler().has_deferred());
        assert_eq!(
            session.editor().booth(&saved("b")).unwrap().placement,
            Placement::Grid(cell(6, 6))
        );
        assert_eq!(
            session.editor().booth(&saved("a")).unwrap().placement,
            Placement::Grid(cell(2, 2))
        );

        clock.set(3500);
        assert!(session.on_remote_change(&booths_changed()).await.unwrap());
        assert_eq!(
            session.editor().booth(&saved("a")).unwrap().placement,
            Placement::Grid(cell(2, 2))
        );

        let report = session.save_now().await.unwrap();
        assert!(!report.failed);
        assert_eq!(session.store().booth("a").unwrap().grid_row, Some(2));
        assert_eq!(session.store().booth("b").unwrap().grid_row, Some(6));
    }

    #[tokio::test]
    async fn blank_drafts_get_an_identity_once_named() {
        let (mut session, _clock) = session_with(Vec::new()).await;
        let draft = session.editor_mut().add_blank();
        assert!(matches!(session.begin_create(&draft), Err(StoreError::Invalid(_))));

        let details = BoothDetails {
            org_name: "Lakeside Academy".to_string(),
            ..BoothDetails::default()
        };
        assert!(session.update_details(&draft, details, InputKind::Pointer));
        let record = session.begin_create(&draft).unwrap();
        assert_eq!(record.org_name, "Lakeside Academy");
        let result = session
            .store()
            .create_booth(&EventId::new("expo"), &record)
            .await;
        let id = session.finish_create(&draft, result).unwrap();
        assert!(session.editor().booth(&BoothKey::Saved(id)).is_some());
        assert_eq!(session.editor().draft_count(), 0);
    }
}
