use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement, PointerEvent, Window};

use crate::notify::{Notice, NoticeLevel};
use crate::state::{Mode, Tool};

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

pub fn set_tool_button(button: &HtmlElement, active: bool) {
    let pressed = if active { "true" } else { "false" };
    let _ = button.set_attribute("aria-pressed", pressed);
}

pub fn set_canvas_mode(canvas: &HtmlCanvasElement, mode: &Mode, interactive: bool) {
    let cursor = match (mode.tool(), mode.is_dragging()) {
        (_, _) if !interactive => "progress",
        (Tool::Pan, true) => "grabbing",
        (Tool::Pan, false) => "grab",
        (Tool::Select, true) => "move",
        (Tool::Select, false) => "default",
    };
    let _ = canvas.style().set_property("cursor", cursor);
}

pub fn set_status(status_el: &Element, status_text: &Element, state: &str, text: &str) {
    let _ = status_el.set_attribute("data-state", state);
    status_text.set_text_content(Some(text));
}

/// Rebuilds the notice list; each entry carries its id for dismissal.
pub fn render_notices<'a>(
    document: &Document,
    container: &Element,
    notices: impl Iterator<Item = &'a Notice>,
) {
    container.set_text_content(None);
    for notice in notices {
        let Ok(item) = document.create_element("div") else {
            continue;
        };
        let level = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        item.set_class_name(&format!("notice notice-{level}"));
        let _ = item.set_attribute("data-notice-id", &notice.id.to_string());
        item.set_text_content(Some(&notice.message));
        let _ = container.append_child(&item);
    }
}

/// Notice id of a clicked entry, if the click landed on one.
pub fn notice_id_from_event(event: &web_sys::Event) -> Option<u64> {
    let element: Element = event.target()?.dyn_into().ok()?;
    element.get_attribute("data-notice-id")?.parse().ok()
}

/// Sizes the backing store for the device pixel ratio and returns the CSS
/// size of the canvas.
pub fn resize_canvas(window: &Window, canvas: &HtmlCanvasElement) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    let dpr = window.device_pixel_ratio();
    canvas.set_width((rect.width() * dpr) as u32);
    canvas.set_height((rect.height() * dpr) as u32);
    (rect.width(), rect.height())
}

pub fn event_to_screen(canvas: &HtmlCanvasElement, event: &PointerEvent) -> Option<(f64, f64)> {
    let rect = canvas.get_bounding_client_rect();
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    Some((
        event.client_x() as f64 - rect.left(),
        event.client_y() as f64 - rect.top(),
    ))
}

pub fn is_touch_event(event: &PointerEvent) -> bool {
    event.pointer_type() == "touch"
}

pub fn navigator_max_touch_points(window: &Window) -> Option<u32> {
    let navigator = Reflect::get(window.as_ref(), &JsValue::from_str("navigator")).ok()?;
    Reflect::get(&navigator, &JsValue::from_str("maxTouchPoints"))
        .ok()?
        .as_f64()
        .map(|value| value as u32)
}
