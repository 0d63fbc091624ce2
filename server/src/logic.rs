use std::collections::HashSet;

use floorplan_shared::{
    Booth, BoothId, BoothRecord, EventId, FloorPlan, OccupancyTracker, ServerMessage, Zone, ZoneId,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::{Board, MAX_BOOTHS, MAX_ZONES};

fn validate_record(event_id: &str, mut record: BoothRecord) -> ApiResult<BoothRecord> {
    record.event_id = event_id.to_string();
    record.org_name = record.org_name.trim().chars().take(120).collect();
    let booth = Booth::try_from(record)?;
    Ok(BoothRecord::from(&booth))
}

/// Batch upsert by id. The store keeps whatever arrives last; shared grid
/// cells are only reported.
pub fn upsert_booths(
    board: &mut Board,
    event_id: &str,
    records: Vec<BoothRecord>,
) -> ApiResult<Vec<BoothRecord>> {
    let mut seen = HashSet::new();
    let mut validated = Vec::with_capacity(records.len());
    for record in records {
        let record = validate_record(event_id, record)?;
        if !seen.insert(record.id.clone()) {
            return Err(ApiError::Invalid(format!(
                "booth {} appears twice in one batch",
                record.id
            )));
        }
        validated.push(record);
    }
    let new_ids = validated
        .iter()
        .filter(|record| !board.booths.contains_key(&record.id))
        .count();
    if board.booths.len() + new_ids > MAX_BOOTHS {
        return Err(ApiError::Invalid(format!(
            "an event holds at most {MAX_BOOTHS} booths"
        )));
    }
    for record in &validated {
        board.booths.insert(record.id.clone(), record.clone());
    }
    board.dirty = true;
    report_shared_cells(board, event_id);
    Ok(validated)
}

pub fn create_booth(board: &mut Board, event_id: &str, mut record: BoothRecord) -> ApiResult<BoothRecord> {
    if board.booths.len() >= MAX_BOOTHS {
        return Err(ApiError::Invalid(format!(
            "an event holds at most {MAX_BOOTHS} booths"
        )));
    }
    record.id = BoothId::generate().0;
    let record = validate_record(event_id, record)?;
    board.booths.insert(record.id.clone(), record.clone());
    board.dirty = true;
    report_shared_cells(board, event_id);
    Ok(record)
}

pub fn remove_booth(board: &mut Board, booth_id: &str) -> ApiResult<BoothRecord> {
    let removed = board
        .booths
        .remove(booth_id)
        .ok_or_else(|| ApiError::NotFound(format!("booth {booth_id}")))?;
    board.dirty = true;
    Ok(removed)
}

fn report_shared_cells(board: &Board, event_id: &str) {
    let tracker = OccupancyTracker::from_cells(
        board
            .booths
            .values()
            .filter_map(|record| Some((record.id.as_str(), record.grid_position()?))),
    );
    for (position, ids) in tracker.conflicts() {
        tracing::warn!(
            event_id,
            cell = %position.label(),
            booths = ?ids,
            "several booths share one grid cell"
        );
    }
}

pub fn replace_zones(board: &mut Board, zones: Vec<Zone>) -> ApiResult<Vec<Zone>> {
    if zones.len() > MAX_ZONES {
        return Err(ApiError::Invalid(format!(
            "a floor plan holds at most {MAX_ZONES} zones"
        )));
    }
    board.zones = zones.into_iter().map(Zone::sanitized).collect();
    board.dirty = true;
    Ok(board.zones.clone())
}

pub fn add_zone(board: &mut Board, zone: Zone) -> ApiResult<Zone> {
    let zone = zone.sanitized();
    let replacing = board.zones.iter().any(|existing| existing.id == zone.id);
    if !replacing && board.zones.len() >= MAX_ZONES {
        return Err(ApiError::Invalid(format!(
            "a floor plan holds at most {MAX_ZONES} zones"
        )));
    }
    board.zones.retain(|existing| existing.id != zone.id);
    board.zones.push(zone.clone());
    board.dirty = true;
    Ok(zone)
}

pub fn remove_zone(board: &mut Board, zone_id: &ZoneId) -> ApiResult<Zone> {
    let index = board
        .zones
        .iter()
        .position(|zone| &zone.id == zone_id)
        .ok_or_else(|| ApiError::NotFound(format!("zone {zone_id}")))?;
    board.dirty = true;
    Ok(board.zones.remove(index))
}

pub fn set_floor_plan(board: &mut Board, event_id: &str, mut plan: FloorPlan) -> FloorPlan {
    plan.event_id = EventId::new(event_id);
    let plan = plan.sanitized();
    board.floor_plan = Some(plan.clone());
    board.dirty = true;
    plan
}

pub async fn broadcast_except(board: &RwLock<Board>, sender: Option<Uuid>, message: ServerMessage) {
    let mut stale = Vec::new();
    {
        let board = board.read().await;
        for (id, tx) in board.peers.iter() {
            if Some(*id) == sender {
                continue;
            }
            if tx.send(message.clone()).is_err() {
                stale.push(*id);
            }
        }
    }

    if !stale.is_empty() {
        let mut board = board.write().await;
        for id in stale {
            board.peers.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use floorplan_shared::{VenueId, ZoneFootprint};
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use super::*;

    fn grid(id: &str, row: i32, col: i32) -> BoothRecord {
        BoothRecord {
            id: id.into(),
            event_id: "other".into(),
            grid_row: Some(row),
            grid_col: Some(col),
            org_name: format!("  Org {id} "),
            ..BoothRecord::default()
        }
    }

    #[test]
    fn upsert_is_last_write_wins() {
        let mut board = Board::default();
        upsert_booths(&mut board, "expo", vec![grid("x", 2, 5)]).unwrap();
        upsert_booths(&mut board, "expo", vec![grid("x", 3, 6)]).unwrap();
        let stored = &board.booths["x"];
        assert_eq!(stored.grid_row, Some(3));
        assert_eq!(stored.grid_col, Some(6));
        assert_eq!(stored.event_id, "expo");
        assert_eq!(stored.org_name, "Org x");
        assert!(board.dirty);
    }

    #[test]
    fn shared_cells_are_accepted() {
        let mut board = Board::default();
        upsert_booths(&mut board, "expo", vec![grid("a", 1, 1), grid("b", 1, 1)]).unwrap();
        assert_eq!(board.booths.len(), 2);
    }

    #[test]
    fn invalid_record_rejects_whole_batch() {
        let mut board = Board::default();
        let result = upsert_booths(&mut board, "expo", vec![grid("a", 1, 1), grid("b", 9, 1)]);
        assert!(matches!(result, Err(ApiError::Model(_))));
        assert!(board.booths.is_empty());
        assert!(!board.dirty);

        let result = upsert_booths(&mut board, "expo", vec![grid("a", 1, 1), grid("a", 2, 2)]);
        assert!(matches!(result, Err(ApiError::Invalid(_))));
    }

    #[test]
    fn create_assigns_fresh_id() {
        let mut board = Board::default();
        let created = create_booth(&mut board, "expo", grid("client-chosen", 0, 0)).unwrap();
        assert_ne!(created.id, "client-chosen");
        assert!(board.booths.contains_key(&created.id));
        assert!(remove_booth(&mut board, &created.id).is_ok());
        assert!(matches!(
            remove_booth(&mut board, &created.id),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn zone_set_is_bounded() {
        let mut board = Board::default();
        let zones = (0..=MAX_ZONES)
            .map(|i| Zone::new(format!("z{i}"), "", ZoneFootprint::clamped(0, 0, 1, 1)))
            .collect::<Vec<_>>();
        assert!(replace_zones(&mut board, zones).is_err());
        let zone = add_zone(
            &mut board,
            Zone::new("North Hall", "#fff", ZoneFootprint::clamped(0, 0, 2, 2)),
        )
        .unwrap();
        assert_eq!(board.zones.len(), 1);
        assert!(remove_zone(&mut board, &zone.id).is_ok());
        assert!(board.zones.is_empty());
    }

    #[test]
    fn floor_plan_is_pinned_to_event() {
        let mut board = Board::default();
        let mut plan = FloorPlan::new(EventId::from("elsewhere"), VenueId::from("gym"));
        plan.grid_opacity = 4.0;
        let stored = set_floor_plan(&mut board, "expo", plan);
        assert_eq!(stored.event_id.as_str(), "expo");
        assert_eq!(stored.grid_opacity, 1.0);
    }

    #[tokio::test]
    async fn broadcast_skips_writer_and_prunes_closed_peers() {
        let board = RwLock::new(Board::default());
        let writer = Uuid::new_v4();
        let watcher = Uuid::new_v4();
        let gone = Uuid::new_v4();
        let (writer_tx, mut writer_rx) = mpsc::unbounded_channel();
        let (watcher_tx, mut watcher_rx) = mpsc::unbounded_channel();
        let (gone_tx, gone_rx) = mpsc::unbounded_channel();
        drop(gone_rx);
        {
            let mut board = board.write().await;
            board.peers.insert(writer, writer_tx);
            board.peers.insert(watcher, watcher_tx);
            board.peers.insert(gone, gone_tx);
        }
        let message = ServerMessage::BoothsChanged {
            event_id: "expo".into(),
        };
        broadcast_except(&board, Some(writer), message.clone()).await;
        assert_eq!(watcher_rx.try_recv().unwrap(), message);
        assert!(writer_rx.try_recv().is_err());
        assert_eq!(board.read().await.peers.len(), 2);
    }
}
