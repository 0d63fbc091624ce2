use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use floorplan_shared::{BoothRecord, EventId, FloorPlan, ServerMessage, VenueId, Zone, ZoneId};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::boards::{get_or_load_board, normalize_event_id, release_board_if_idle};
use crate::error::{ApiError, ApiResult};
use crate::geocode::Coordinates;
use crate::images::{background_key, prepare_background};
use crate::logic;
use crate::logic::broadcast_except;
use crate::state::AppState;

/// Header an editor sets on writes so its own change-feed echo is skipped.
pub const CONNECTION_ID_HEADER: &str = "x-connection-id";

fn event_id(raw: &str) -> ApiResult<String> {
    normalize_event_id(raw).ok_or_else(|| ApiError::NotFound(format!("event {raw}")))
}

fn writer_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(CONNECTION_ID_HEADER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

pub async fn ping_handler() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

pub async fn list_booths(
    Path(event): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<BoothRecord>>> {
    let event = event_id(&event)?;
    let board = get_or_load_board(&state, &event).await;
    let booths = board.read().await.booths.values().cloned().collect();
    Ok(Json(booths))
}

pub async fn get_booth(
    Path((event, booth_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> ApiResult<Json<BoothRecord>> {
    let event = event_id(&event)?;
    let board = get_or_load_board(&state, &event).await;
    let booth = board.read().await.booths.get(&booth_id).cloned();
    booth
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("booth {booth_id}")))
}

pub async fn create_booth(
    Path(event): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(record): Json<BoothRecord>,
) -> ApiResult<(StatusCode, Json<BoothRecord>)> {
    let event = event_id(&event)?;
    let board = get_or_load_board(&state, &event).await;
    let created = logic::create_booth(&mut *board.write().await, &event, record)?;
    tracing::info!(event_id = %event, booth_id = %created.id, "booth created");
    broadcast_except(
        &board,
        writer_id(&headers),
        ServerMessage::BoothsChanged { event_id: event },
    )
    .await;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn upsert_booths(
    Path(event): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(records): Json<Vec<BoothRecord>>,
) -> ApiResult<Json<Vec<BoothRecord>>> {
    let event = event_id(&event)?;
    let board = get_or_load_board(&state, &event).await;
    let stored = logic::upsert_booths(&mut *board.write().await, &event, records)?;
    tracing::debug!(event_id = %event, count = stored.len(), "booths upserted");
    broadcast_except(
        &board,
        writer_id(&headers),
        ServerMessage::BoothsChanged { event_id: event },
    )
    .await;
    Ok(Json(stored))
}

pub async fn delete_booth(
    Path((event, booth_id)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let event = event_id(&event)?;
    let board = get_or_load_board(&state, &event).await;
    logic::remove_booth(&mut *board.write().await, &booth_id)?;
    tracing::info!(event_id = %event, booth_id = %booth_id, "booth removed");
    broadcast_except(
        &board,
        writer_id(&headers),
        ServerMessage::BoothsChanged { event_id: event },
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_zones(
    Path(event): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Zone>>> {
    let event = event_id(&event)?;
    let board = get_or_load_board(&state, &event).await;
    let zones = board.read().await.zones.clone();
    Ok(Json(zones))
}

pub async fn replace_zones(
    Path(event): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(zones): Json<Vec<Zone>>,
) -> ApiResult<Json<Vec<Zone>>> {
    let event = event_id(&event)?;
    let board = get_or_load_board(&state, &event).await;
    let zones = logic::replace_zones(&mut *board.write().await, zones)?;
    broadcast_except(
        &board,
        writer_id(&headers),
        ServerMessage::ZonesChanged { event_id: event },
    )
    .await;
    Ok(Json(zones))
}

pub async fn add_zone(
    Path(event): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(zone): Json<Zone>,
) -> ApiResult<(StatusCode, Json<Zone>)> {
    let event = event_id(&event)?;
    let board = get_or_load_board(&state, &event).await;
    let zone = logic::add_zone(&mut *board.write().await, zone)?;
    broadcast_except(
        &board,
        writer_id(&headers),
        ServerMessage::ZonesChanged { event_id: event },
    )
    .await;
    Ok((StatusCode::CREATED, Json(zone)))
}

pub async fn delete_zone(
    Path((event, zone_id)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let event = event_id(&event)?;
    let board = get_or_load_board(&state, &event).await;
    logic::remove_zone(&mut *board.write().await, &ZoneId::new(zone_id))?;
    broadcast_except(
        &board,
        writer_id(&headers),
        ServerMessage::ZonesChanged { event_id: event },
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_floor_plan(
    Path(event): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Option<FloorPlan>>> {
    let event = event_id(&event)?;
    let board = get_or_load_board(&state, &event).await;
    let plan = board.read().await.floor_plan.clone();
    Ok(Json(plan))
}

pub async fn put_floor_plan(
    Path(event): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(plan): Json<FloorPlan>,
) -> ApiResult<Json<FloorPlan>> {
    let event = event_id(&event)?;
    let board = get_or_load_board(&state, &event).await;
    let plan = logic::set_floor_plan(&mut *board.write().await, &event, plan);
    broadcast_except(
        &board,
        writer_id(&headers),
        ServerMessage::FloorPlanChanged { event_id: event },
    )
    .await;
    Ok(Json(plan))
}

pub async fn upload_background(
    Path(event): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<FloorPlan>> {
    let event = event_id(&event)?;
    let jpeg = prepare_background(&body)?;
    let size = jpeg.len();
    state
        .storage
        .put_object(&background_key(&event), jpeg, "image/jpeg")
        .await?;
    tracing::info!(event_id = %event, bytes = size, "floor-plan background stored");

    let board = get_or_load_board(&state, &event).await;
    let plan = {
        let mut board = board.write().await;
        let mut plan = board.floor_plan.clone().unwrap_or_else(|| {
            FloorPlan::new(EventId::new(event.as_str()), VenueId::new(event.as_str()))
        });
        plan.background_url = Some(format!(
            "/api/events/{event}/floor-plan/background?v={}",
            Uuid::now_v7().simple()
        ));
        logic::set_floor_plan(&mut board, &event, plan)
    };
    broadcast_except(
        &board,
        writer_id(&headers),
        ServerMessage::FloorPlanChanged { event_id: event },
    )
    .await;
    Ok(Json(plan))
}

pub async fn get_background(
    Path(event): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let event = event_id(&event)?;
    let bytes = state.storage.get_object(&background_key(&event)).await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}

#[derive(Deserialize)]
pub struct GeocodeQuery {
    pub address: String,
}

pub async fn geocode_handler(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> ApiResult<Json<Coordinates>> {
    let address = query.address.trim();
    if address.is_empty() {
        return Err(ApiError::Invalid("address must not be empty".into()));
    }
    let coordinates = state.geocoder.geocode(address).await?;
    Ok(Json(coordinates))
}

pub async fn ws_handler(
    Path(event): Path<String>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let event = match normalize_event_id(&event) {
        Some(id) => id,
        None => return StatusCode::NOT_FOUND.into_response(),
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, event))
}

fn encode_frame(message: &ServerMessage) -> Option<Message> {
    bincode::encode_to_vec(message, bincode::config::standard())
        .ok()
        .map(|payload| Message::Binary(payload.into()))
}

async fn handle_socket(socket: WebSocket, state: AppState, event_id: String) {
    let (mut socket_sender, mut socket_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let connection_id = Uuid::new_v4();

    let board = get_or_load_board(&state, &event_id).await;
    {
        let mut board = board.write().await;
        board.peers.insert(connection_id, tx);
        tracing::info!(
            event_id = %event_id,
            conn = %connection_id,
            peers = board.peers.len(),
            "change feed connected"
        );
    }

    let welcome = ServerMessage::Welcome {
        connection_id: connection_id.to_string(),
    };
    if let Some(frame) = encode_frame(&welcome) {
        if let Err(error) = socket_sender.send(frame).await {
            tracing::warn!(event_id = %event_id, conn = %connection_id, %error, "welcome send failed");
        }
    }

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Some(frame) = encode_frame(&message) {
                if socket_sender.send(frame).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(Ok(message)) = socket_receiver.next().await {
        if let Message::Close(frame) = message {
            if let Some(frame) = &frame {
                tracing::debug!(
                    event_id = %event_id,
                    conn = %connection_id,
                    code = frame.code,
                    reason = frame.reason.as_str(),
                    "close frame"
                );
            }
            break;
        }
    }

    {
        let mut board = board.write().await;
        board.peers.remove(&connection_id);
        tracing::info!(
            event_id = %event_id,
            conn = %connection_id,
            peers = board.peers.len(),
            "change feed disconnected"
        );
    }
    send_task.abort();
    release_board_if_idle(&state, &event_id, &board).await;
}
