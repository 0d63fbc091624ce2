use std::cell::RefCell;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Location, Request, RequestInit, Response, Window};

use floorplan_shared::{BoothId, BoothRecord, EventId, FloorPlan, Zone};

use crate::store::{SharedStore, StoreError};

pub const CONNECTION_ID_HEADER: &str = "x-connection-id";

pub fn websocket_url(window: &Window, event_id: &EventId) -> Result<String, JsValue> {
    let location = window.location();
    let protocol = location.protocol()?;
    let host = location.host()?;
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    Ok(format!("{scheme}://{host}/ws/{event_id}"))
}

/// Reads the event from `/e/{event}` or `?event={event}`.
pub fn event_id_from_location(location: &Location) -> Option<EventId> {
    let from_path = location.pathname().ok().and_then(|path| {
        let mut parts = path.trim_matches('/').split('/');
        if parts.next()? != "e" {
            return None;
        }
        parts.next().map(str::to_string)
    });
    let from_query = || {
        let search = location.search().ok()?;
        search
            .trim_start_matches('?')
            .split('&')
            .find_map(|pair| pair.strip_prefix("event="))
            .map(str::to_string)
    };
    from_path
        .or_else(from_query)
        .filter(|id| !id.is_empty())
        .map(|id| EventId::new(id.to_ascii_lowercase()))
}

fn js_error(value: JsValue) -> StoreError {
    StoreError::Network(
        value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}")),
    )
}

/// Shared store reached over the server's JSON routes.
pub struct HttpStore {
    window: Window,
    connection_id: RefCell<Option<String>>,
}

impl HttpStore {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            connection_id: RefCell::new(None),
        }
    }

    fn booths_url(event_id: &EventId) -> String {
        format!("/api/events/{event_id}/booths")
    }

    async fn send(
        &self,
        method: &str,
        url: &str,
        body: Option<String>,
    ) -> Result<Response, StoreError> {
        let headers = Headers::new().map_err(js_error)?;
        headers
            .set("accept", "application/json")
            .map_err(js_error)?;
        if let Some(connection_id) = self.connection_id.borrow().as_deref() {
            headers
                .set(CONNECTION_ID_HEADER, connection_id)
                .map_err(js_error)?;
        }
        let init = RequestInit::new();
        init.set_method(method);
        if let Some(body) = body {
            headers
                .set("content-type", "application/json")
                .map_err(js_error)?;
            init.set_body(&JsValue::from_str(&body));
        }
        init.set_headers(&headers);
        let request = Request::new_with_str_and_init(url, &init).map_err(js_error)?;
        let response: Response = JsFuture::from(self.window.fetch_with_request(&request))
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;
        if response.status() == 404 {
            return Err(StoreError::NotFound(url.to_string()));
        }
        if !response.ok() {
            let message = read_text(&response).await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: response.status(),
                message,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: &str,
        url: &str,
        body: Option<String>,
    ) -> Result<T, StoreError> {
        let response = self.send(method, url, body).await?;
        let text = read_text(&response).await?;
        serde_json::from_str(&text).map_err(|error| StoreError::Decode(error.to_string()))
    }
}

async fn read_text(response: &Response) -> Result<String, StoreError> {
    JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?
        .as_string()
        .ok_or_else(|| StoreError::Decode("response body is not text".to_string()))
}

fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|error| StoreError::Decode(error.to_string()))
}

#[async_trait(?Send)]
impl SharedStore for HttpStore {
    async fn list_booths(&self, event_id: &EventId) -> Result<Vec<BoothRecord>, StoreError> {
        self.send_json("GET", &Self::booths_url(event_id), None)
            .await
    }

    async fn upsert_booths(
        &self,
        event_id: &EventId,
        records: &[BoothRecord],
    ) -> Result<(), StoreError> {
        self.send("PUT", &Self::booths_url(event_id), Some(encode(records)?))
            .await
            .map(|_| ())
    }

    async fn create_booth(
        &self,
        event_id: &EventId,
        record: &BoothRecord,
    ) -> Result<BoothRecord, StoreError> {
        self.send_json("POST", &Self::booths_url(event_id), Some(encode(record)?))
            .await
    }

    async fn remove_booth(&self, event_id: &EventId, booth_id: &BoothId) -> Result<(), StoreError> {
        let url = format!("/api/events/{event_id}/booths/{booth_id}");
        self.send("DELETE", &url, None).await.map(|_| ())
    }

    async fn list_zones(&self, event_id: &EventId) -> Result<Vec<Zone>, StoreError> {
        let url = format!("/api/events/{event_id}/zones");
        self.send_json("GET", &url, None).await
    }

    async fn save_zones(&self, event_id: &EventId, zones: &[Zone]) -> Result<(), StoreError> {
        let url = format!("/api/events/{event_id}/zones");
        self.send("PUT", &url, Some(encode(zones)?))
            .await
            .map(|_| ())
    }

    async fn load_floor_plan(&self, event_id: &EventId) -> Result<Option<FloorPlan>, StoreError> {
        let url = format!("/api/events/{event_id}/floor-plan");
        self.send_json("GET", &url, None).await
    }

    fn set_connection_id(&self, connection_id: Option<String>) {
        *self.connection_id.borrow_mut() = connection_id;
    }
}
