use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::{
    add_zone, create_booth, delete_booth, delete_zone, geocode_handler, get_background, get_booth,
    get_floor_plan, list_booths, list_zones, ping_handler, put_floor_plan, replace_zones,
    upload_background, upsert_booths, ws_handler,
};
use crate::images::MAX_UPLOAD_SIZE;
use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping_handler))
        .route(
            "/api/events/{event_id}/booths",
            get(list_booths).post(create_booth).put(upsert_booths),
        )
        .route(
            "/api/events/{event_id}/booths/{booth_id}",
            get(get_booth).delete(delete_booth),
        )
        .route(
            "/api/events/{event_id}/zones",
            get(list_zones).put(replace_zones).post(add_zone),
        )
        .route("/api/events/{event_id}/zones/{zone_id}", delete(delete_zone))
        .route(
            "/api/events/{event_id}/floor-plan",
            get(get_floor_plan).put(put_floor_plan),
        )
        .route(
            "/api/events/{event_id}/floor-plan/background",
            get(get_background)
                .put(upload_background)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE)),
        )
        .route("/api/geocode", get(geocode_handler))
        .route("/ws/{event_id}", get(ws_handler))
        .with_state(state)
}
