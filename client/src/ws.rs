use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket, Window};

use floorplan_shared::{EventId, ServerMessage};

use crate::net::websocket_url;

#[derive(Debug)]
pub enum WsEvent {
    Open,
    Close,
    Error,
    Message(ServerMessage),
}

fn decode_frame(event: &MessageEvent) -> Option<ServerMessage> {
    if let Ok(buffer) = event.data().dyn_into::<js_sys::ArrayBuffer>() {
        let bytes = Uint8Array::new(&buffer).to_vec();
        return match bincode::decode_from_slice::<ServerMessage, _>(
            &bytes,
            bincode::config::standard(),
        ) {
            Ok((message, _)) => Some(message),
            Err(error) => {
                web_sys::console::error_1(&format!("Feed frame decode error: {error}").into());
                None
            }
        };
    }
    if let Some(text) = event.data().as_string() {
        return match serde_json::from_str::<ServerMessage>(&text) {
            Ok(message) => Some(message),
            Err(error) => {
                web_sys::console::error_1(&format!("Feed frame JSON error: {error}").into());
                None
            }
        };
    }
    web_sys::console::error_2(&"Feed frame is not text or binary".into(), &event.data());
    None
}

/// Opens the change feed for one event. Frames only say what changed.
pub fn connect_ws(
    window: &Window,
    event_id: &EventId,
    on_event: impl 'static + FnMut(WsEvent),
) -> Result<WebSocket, JsValue> {
    let socket = WebSocket::new(&websocket_url(window, event_id)?)?;
    let _ = Reflect::set(
        socket.as_ref(),
        &JsValue::from_str("binaryType"),
        &JsValue::from_str("arraybuffer"),
    );

    let on_event = Rc::new(RefCell::new(on_event));

    {
        let on_event = on_event.clone();
        let onopen = Closure::<dyn FnMut(Event)>::new(move |_| {
            on_event.borrow_mut()(WsEvent::Open);
        });
        socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        onopen.forget();
    }

    {
        let on_event = on_event.clone();
        let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |_| {
            on_event.borrow_mut()(WsEvent::Close);
        });
        socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();
    }

    {
        let on_event = on_event.clone();
        let onerror = Closure::<dyn FnMut(Event)>::new(move |_| {
            on_event.borrow_mut()(WsEvent::Error);
        });
        socket.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();
    }

    {
        let on_event = on_event.clone();
        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            if let Some(message) = decode_frame(&event) {
                on_event.borrow_mut()(WsEvent::Message(message));
            }
        });
        socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();
    }

    Ok(socket)
}
