use std::sync::Arc;

use floorplan_shared::PlanFileData;
use tokio::sync::RwLock;

use crate::state::{AppState, Board, SharedBoard};
use crate::storage::StorageError;

/// Event ids end up in file names and object keys.
pub fn normalize_event_id(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.len() > 64 {
        return None;
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    Some(value.to_ascii_lowercase())
}

pub async fn get_or_load_board(state: &AppState, event_id: &str) -> SharedBoard {
    if let Some(board) = state.boards.read().await.get(event_id).cloned() {
        return board;
    }
    tracing::info!(event_id, "loading board");
    let data = match state.storage.load_board(event_id).await {
        Ok(data) => data,
        Err(StorageError::NotFound(_)) => {
            tracing::info!(event_id, "no stored plan, starting empty");
            PlanFileData::default()
        }
        Err(error) => {
            tracing::warn!(event_id, %error, "stored plan unreadable, starting empty");
            PlanFileData::default()
        }
    };
    let board = Arc::new(RwLock::new(Board::new(data)));
    let mut boards = state.boards.write().await;
    let entry = boards
        .entry(event_id.to_string())
        .or_insert_with(|| board.clone());
    entry.clone()
}

pub async fn save_board(state: &AppState, event_id: &str, data: &PlanFileData) -> bool {
    match state.storage.save_board(event_id, data).await {
        Ok(()) => {
            tracing::debug!(event_id, booths = data.booths.len(), "board saved");
            true
        }
        Err(error) => {
            tracing::error!(event_id, %error, "failed to save board");
            false
        }
    }
}

/// Writes every dirty board; a failed write leaves the board dirty for the
/// next pass.
pub async fn flush_dirty_boards(state: &AppState) -> usize {
    let boards = {
        let boards = state.boards.read().await;
        boards
            .iter()
            .map(|(event_id, board)| (event_id.clone(), board.clone()))
            .collect::<Vec<_>>()
    };
    let mut saved = 0;
    for (event_id, board) in boards {
        let maybe_data = {
            let mut board = board.write().await;
            if !board.dirty {
                None
            } else {
                board.dirty = false;
                Some(board.to_plan_data())
            }
        };
        if let Some(data) = maybe_data {
            if save_board(state, &event_id, &data).await {
                saved += 1;
            } else {
                board.write().await.dirty = true;
            }
        }
    }
    saved
}

/// Drops an idle board from memory after persisting it.
pub async fn release_board_if_idle(state: &AppState, event_id: &str, board: &SharedBoard) {
    let mut should_remove = false;
    let mut maybe_data = None;
    {
        let mut guard = board.write().await;
        if guard.peers.is_empty() {
            should_remove = true;
            if guard.dirty {
                guard.dirty = false;
                maybe_data = Some(guard.to_plan_data());
            }
        }
    }
    if let Some(data) = maybe_data {
        tracing::info!(event_id, "saving board after last editor left");
        if !save_board(state, event_id, &data).await {
            board.write().await.dirty = true;
            return;
        }
    }
    if should_remove {
        let mut boards = state.boards.write().await;
        if let Some(current) = boards.get(event_id) {
            if Arc::ptr_eq(current, board) {
                boards.remove(event_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use floorplan_shared::BoothRecord;

    use super::*;
    use crate::geocode::{Coordinates, GeocodeError, Geocoder};
    use crate::storage::{MemoryStorage, Storage};

    struct NoGeocoder;

    #[async_trait::async_trait]
    impl Geocoder for NoGeocoder {
        async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
            Err(GeocodeError::NoMatch(address.to_string()))
        }
    }

    fn state() -> AppState {
        AppState::new(Arc::new(MemoryStorage::default()), Arc::new(NoGeocoder))
    }

    #[test]
    fn event_ids_are_restricted() {
        assert_eq!(normalize_event_id(" Expo-2024 "), Some("expo-2024".into()));
        assert_eq!(normalize_event_id("../etc/passwd"), None);
        assert_eq!(normalize_event_id(""), None);
        assert_eq!(normalize_event_id(&"a".repeat(65)), None);
    }

    #[tokio::test]
    async fn dirty_boards_are_flushed_once() {
        let state = state();
        let board = get_or_load_board(&state, "expo").await;
        {
            let mut board = board.write().await;
            board.booths.insert(
                "b1".into(),
                BoothRecord {
                    id: "b1".into(),
                    event_id: "expo".into(),
                    grid_row: Some(1),
                    grid_col: Some(1),
                    ..BoothRecord::default()
                },
            );
            board.dirty = true;
        }
        assert_eq!(flush_dirty_boards(&state).await, 1);
        assert_eq!(flush_dirty_boards(&state).await, 0);
        let stored = state.storage.load_board("expo").await.unwrap();
        assert_eq!(stored.booths.len(), 1);
    }

    #[tokio::test]
    async fn idle_board_is_released_and_reloaded_from_storage() {
        let state = state();
        let board = get_or_load_board(&state, "expo").await;
        board.write().await.dirty = true;
        release_board_if_idle(&state, "expo", &board).await;
        assert!(state.boards.read().await.get("expo").is_none());
        let again = get_or_load_board(&state, "expo").await;
        assert!(!Arc::ptr_eq(&board, &again));
    }
}
