use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, Event, HtmlCanvasElement, HtmlElement,
    HtmlImageElement, KeyboardEvent, PointerEvent, WheelEvent, Window,
};

use floorplan_shared::{BoothDetails, BoothId, CellSize, EventId, ServerMessage};

use crate::clock::SystemClock;
use crate::dom::{
    event_to_screen, get_element, is_touch_event, navigator_max_touch_points,
    notice_id_from_event, render_notices, resize_canvas, set_canvas_mode, set_status,
    set_tool_button,
};
use crate::editor::BoothKey;
use crate::kv::{guest_session_id, GuestFavorites};
use crate::net::{event_id_from_location, HttpStore};
use crate::persistence::{InputKind, SaveBatch};
use crate::render::{redraw, Surface};
use crate::session::{BackgroundState, PlacementSession, RemoteFetch};
use crate::state::Tool;
use crate::store::SharedStore;
use crate::web_storage::LocalStorage;
use crate::ws::{connect_ws, WsEvent};

pub type WebSession = PlacementSession<Rc<HttpStore>, SystemClock>;

const TICK_MS: i32 = 250;
const RECONNECT_MS: i32 = 2000;
const UNIT_SCROLL: f64 = 200.0;

struct App {
    window: Window,
    document: Document,
    event_id: EventId,
    store: Rc<HttpStore>,
    session: RefCell<WebSession>,
    surface: RefCell<Surface>,
    status_el: Element,
    status_text: Element,
    notices_el: Element,
    select_button: HtmlElement,
    pan_button: HtmlElement,
    touch_points: RefCell<HashMap<i32, (f64, f64)>>,
    feed_opened: Cell<bool>,
    sized: Cell<bool>,
}

impl App {
    fn refresh(&self) {
        let session = self.session.borrow();
        let surface = self.surface.borrow();
        redraw(&surface, &session);
        render_notices(
            &self.document,
            &self.notices_el,
            session.notifier().pending(),
        );
        let editor = session.editor();
        set_canvas_mode(&surface.canvas, editor.mode(), editor.is_interactive());
        set_tool_button(&self.select_button, editor.tool() == Tool::Select);
        set_tool_button(&self.pan_button, editor.tool() == Tool::Pan);
    }
}

fn document_ready_state(document: &Document) -> Option<String> {
    js_sys::Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let started = Rc::new(Cell::new(false));

    if document_ready_state(&document).as_deref() == Some("complete") {
        started.set(true);
        return start_app();
    }

    let onload_started = started.clone();
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        if onload_started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    window.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
    onload.forget();
    Ok(())
}

/// Stars or unstars a booth for this device's attendee view.
#[wasm_bindgen]
pub fn toggle_favorite(event_id: &str, booth_id: &str) -> Result<bool, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let storage =
        LocalStorage::open(&window).ok_or_else(|| JsValue::from_str("Storage unavailable"))?;
    GuestFavorites::new(storage, &EventId::new(event_id))
        .toggle(&BoothId::new(booth_id))
        .map_err(|error| JsValue::from_str(&error.to_string()))
}

#[wasm_bindgen]
pub fn favorite_booths(event_id: &str) -> Vec<String> {
    web_sys::window()
        .and_then(|window| LocalStorage::open(&window))
        .map(|storage| {
            GuestFavorites::new(storage, &EventId::new(event_id))
                .list()
                .into_iter()
                .map(|id| id.0)
                .collect()
        })
        .unwrap_or_default()
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let event_id = event_id_from_location(&window.location())
        .ok_or_else(|| JsValue::from_str("Missing event id; open /e/{event}"))?;

    let canvas: HtmlCanvasElement = get_element(&document, "board")?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    let cell_size = if navigator_max_touch_points(&window).unwrap_or(0) > 1 {
        CellSize::Touch
    } else {
        CellSize::Desktop
    };
    if let Some(storage) = LocalStorage::open(&window) {
        let guest = guest_session_id(&storage);
        web_sys::console::log_1(&format!("Floor plan {event_id} opened by {guest}").into());
    }

    let store = Rc::new(HttpStore::new(window.clone()));
    let session = PlacementSession::new(event_id.clone(), store.clone(), SystemClock, cell_size);
    let app = Rc::new(App {
        status_el: get_element(&document, "status")?,
        status_text: get_element(&document, "status-text")?,
        notices_el: get_element(&document, "notices")?,
        select_button: get_element(&document, "tool-select")?,
        pan_button: get_element(&document, "tool-pan")?,
        surface: RefCell::new(Surface {
            canvas,
            ctx,
            width: 0.0,
            height: 0.0,
            dpr: 1.0,
            background: None,
        }),
        session: RefCell::new(session),
        touch_points: RefCell::new(HashMap::new()),
        feed_opened: Cell::new(false),
        sized: Cell::new(false),
        window,
        document,
        event_id,
        store,
    });

    resize(&app);
    load_initial(&app);
    open_feed(&app);
    install_pointer_handlers(&app)?;
    install_toolbar_handlers(&app)?;
    install_window_handlers(&app)?;
    start_ticker(&app)?;
    Ok(())
}

fn resize(app: &App) {
    {
        let mut surface = app.surface.borrow_mut();
        let (width, height) = resize_canvas(&app.window, &surface.canvas);
        surface.width = width;
        surface.height = height;
        surface.dpr = app.window.device_pixel_ratio();
        if !app.sized.replace(true) {
            app.session
                .borrow_mut()
                .editor_mut()
                .home_view(width, height);
        }
    }
    app.refresh();
}

fn load_initial(app: &Rc<App>) {
    let app = app.clone();
    spawn_local(async move {
        set_status(&app.status_el, &app.status_text, "loading", "Loading…");
        let booths = app.store.list_booths(&app.event_id).await;
        if let Err(error) = app.session.borrow_mut().loaded_booths(booths) {
            web_sys::console::error_1(&format!("Booths: {error}").into());
        }
        let zones = app.store.list_zones(&app.event_id).await;
        app.session.borrow_mut().loaded_zones(zones);
        let plan = app.store.load_floor_plan(&app.event_id).await;
        app.session.borrow_mut().loaded_floor_plan(plan);
        load_background(&app);
        app.refresh();
    });
}

fn load_background(app: &Rc<App>) {
    let url = match app.session.borrow().background() {
        BackgroundState::Loading(url) => url.clone(),
        _ => return,
    };
    let image = match HtmlImageElement::new() {
        Ok(image) => image,
        Err(err) => {
            web_sys::console::error_1(&err);
            return;
        }
    };
    {
        let app = app.clone();
        let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
            app.session.borrow_mut().background_loaded();
            app.refresh();
        });
        image.set_onload(Some(onload.as_ref().unchecked_ref()));
        onload.forget();
    }
    {
        let app = app.clone();
        let onerror = Closure::<dyn FnMut(Event)>::new(move |_| {
            app.session.borrow_mut().background_failed();
            app.refresh();
        });
        image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();
    }
    image.set_src(&url);
    app.surface.borrow_mut().background = Some(image);
}

fn open_feed(app: &Rc<App>) {
    let handler_app = app.clone();
    let result = connect_ws(&app.window, &app.event_id, move |event| match event {
        WsEvent::Open => {
            set_status(
                &handler_app.status_el,
                &handler_app.status_text,
                "open",
                "Live",
            );
            if handler_app.feed_opened.replace(true) {
                // Changes made while disconnected were never announced.
                let message = ServerMessage::BoothsChanged {
                    event_id: handler_app.event_id.to_string(),
                };
                handle_message(&handler_app, &message);
            }
        }
        WsEvent::Close => {
            set_status(
                &handler_app.status_el,
                &handler_app.status_text,
                "closed",
                "Reconnecting…",
            );
            handler_app.store.set_connection_id(None);
            schedule_reconnect(&handler_app);
        }
        WsEvent::Error => {
            web_sys::console::error_1(&"Change feed error".into());
        }
        WsEvent::Message(message) => handle_message(&handler_app, &message),
    });
    if let Err(err) = result {
        web_sys::console::error_1(&err);
        schedule_reconnect(app);
    }
}

fn schedule_reconnect(app: &Rc<App>) {
    let reconnect_app = app.clone();
    let callback = Closure::once_into_js(move || open_feed(&reconnect_app));
    let _ = app
        .window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            RECONNECT_MS,
        );
}

fn handle_message(app: &Rc<App>, message: &ServerMessage) {
    let fetch = app.session.borrow_mut().on_remote_message(message);
    if let Some(fetch) = fetch {
        fetch_remote(app, fetch);
    }
}

fn fetch_remote(app: &Rc<App>, fetch: RemoteFetch) {
    let app = app.clone();
    spawn_local(async move {
        let result = match fetch {
            RemoteFetch::Booths => app
                .store
                .list_booths(&app.event_id)
                .await
                .map(|records| {
                    app.session.borrow_mut().apply_remote_booths(records);
                }),
            RemoteFetch::Zones => app
                .store
                .list_zones(&app.event_id)
                .await
                .map(|zones| app.session.borrow_mut().apply_zones(zones)),
            RemoteFetch::FloorPlan => app
                .store
                .load_floor_plan(&app.event_id)
                .await
                .map(|plan| {
                    app.session.borrow_mut().apply_floor_plan(plan);
                    load_background(&app);
                }),
        };
        if let Err(error) = result {
            web_sys::console::error_1(&format!("Refresh failed: {error}").into());
        }
        app.refresh();
    });
}

fn run_save(app: &Rc<App>, batch: SaveBatch) {
    app.refresh();
    let app = app.clone();
    spawn_local(async move {
        let result = if batch.records.is_empty() {
            Ok(())
        } else {
            app.store.upsert_booths(&app.event_id, &batch.records).await
        };
        app.session.borrow_mut().finish_save(&batch, result);
        app.refresh();
    });
}

fn create_draft(app: &Rc<App>, key: BoothKey) {
    let record = app.session.borrow().begin_create(&key);
    let record = match record {
        Ok(record) => record,
        Err(error) => {
            web_sys::console::log_1(&format!("{key} stays a draft: {error}").into());
            return;
        }
    };
    let app = app.clone();
    spawn_local(async move {
        let result = app.store.create_booth(&app.event_id, &record).await;
        let _ = app.session.borrow_mut().finish_create(&key, result);
        app.refresh();
    });
}

fn remove_selected(app: &Rc<App>) {
    let key = app.session.borrow().editor().selected().cloned();
    let Some(key) = key else {
        return;
    };
    let BoothKey::Saved(id) = key.clone() else {
        let _ = app.session.borrow_mut().finish_remove(&key, Ok(()));
        app.refresh();
        return;
    };
    let app = app.clone();
    spawn_local(async move {
        let result = app.store.remove_booth(&app.event_id, &id).await;
        let _ = app.session.borrow_mut().finish_remove(&key, result);
        app.refresh();
    });
}

fn start_ticker(app: &Rc<App>) -> Result<(), JsValue> {
    let tick_app = app.clone();
    let ontick = Closure::<dyn FnMut()>::new(move || {
        let batch = tick_app.session.borrow_mut().poll_save();
        if let Some(batch) = batch {
            run_save(&tick_app, batch);
        }
        let deferred = tick_app.session.borrow_mut().poll_deferred_reload();
        if deferred {
            fetch_remote(&tick_app, RemoteFetch::Booths);
        }
    });
    app.window
        .set_interval_with_callback_and_timeout_and_arguments_0(
            ontick.as_ref().unchecked_ref(),
            TICK_MS,
        )?;
    ontick.forget();
    Ok(())
}

fn input_kind(event: &PointerEvent) -> InputKind {
    if is_touch_event(event) {
        InputKind::Touch
    } else {
        InputKind::Pointer
    }
}

fn first_two_touches(app: &App) -> Option<((f64, f64), (f64, f64))> {
    let touches = app.touch_points.borrow();
    let mut points = touches.values().copied();
    Some((points.next()?, points.next()?))
}

fn install_pointer_handlers(app: &Rc<App>) -> Result<(), JsValue> {
    let canvas = app.surface.borrow().canvas.clone();

    {
        let app = app.clone();
        let down_canvas = canvas.clone();
        let ondown = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            if event.button() != 0 {
                return;
            }
            event.prevent_default();
            let Some((x, y)) = event_to_screen(&down_canvas, &event) else {
                return;
            };
            let _ = down_canvas.set_pointer_capture(event.pointer_id());
            if is_touch_event(&event) {
                app.touch_points
                    .borrow_mut()
                    .insert(event.pointer_id(), (x, y));
                if let Some((a, b)) = first_two_touches(&app) {
                    app.session.borrow_mut().editor_mut().pinch_start(a, b);
                    app.refresh();
                    return;
                }
            }
            app.session.borrow_mut().pointer_down(x, y);
            app.refresh();
        });
        canvas.add_event_listener_with_callback("pointerdown", ondown.as_ref().unchecked_ref())?;
        ondown.forget();
    }

    {
        let app = app.clone();
        let move_canvas = canvas.clone();
        let onmove = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let Some((x, y)) = event_to_screen(&move_canvas, &event) else {
                return;
            };
            if is_touch_event(&event) {
                let tracked = {
                    let mut touches = app.touch_points.borrow_mut();
                    match touches.get_mut(&event.pointer_id()) {
                        Some(point) => {
                            *point = (x, y);
                            true
                        }
                        None => false,
                    }
                };
                if tracked && app.session.borrow().editor().is_pinching() {
                    if let Some((a, b)) = first_two_touches(&app) {
                        app.session.borrow_mut().editor_mut().pinch_move(a, b);
                        app.refresh();
                    }
                    return;
                }
            }
            if !app.session.borrow().editor().is_gesture_active() {
                return;
            }
            app.session.borrow_mut().pointer_move(x, y);
            app.refresh();
        });
        canvas.add_event_listener_with_callback("pointermove", onmove.as_ref().unchecked_ref())?;
        onmove.forget();
    }

    {
        let app = app.clone();
        let onstop = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            if is_touch_event(&event) {
                app.touch_points.borrow_mut().remove(&event.pointer_id());
                if app.session.borrow().editor().is_pinching() {
                    if app.touch_points.borrow().len() < 2 {
                        app.session.borrow_mut().editor_mut().pinch_end();
                    }
                    app.refresh();
                    return;
                }
            }
            app.session.borrow_mut().pointer_up(input_kind(&event));
            app.refresh();
        });
        canvas.add_event_listener_with_callback("pointerup", onstop.as_ref().unchecked_ref())?;
        canvas
            .add_event_listener_with_callback("pointercancel", onstop.as_ref().unchecked_ref())?;
        onstop.forget();
    }

    {
        let app = app.clone();
        let wheel_canvas = canvas.clone();
        let onwheel = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let wheel_event = match event.dyn_into::<WheelEvent>() {
                Ok(event) => event,
                Err(_) => return,
            };
            wheel_event.prevent_default();
            let rect = wheel_canvas.get_bounding_client_rect();
            let cursor_x = wheel_event.client_x() as f64 - rect.left();
            let cursor_y = wheel_event.client_y() as f64 - rect.top();
            let factor = (-wheel_event.delta_y() / UNIT_SCROLL).exp();
            app.session
                .borrow_mut()
                .editor_mut()
                .zoom_at(factor, cursor_x, cursor_y);
            app.refresh();
        });
        canvas.add_event_listener_with_callback("wheel", onwheel.as_ref().unchecked_ref())?;
        onwheel.forget();
    }

    Ok(())
}

fn on_click(
    document: &Document,
    id: &str,
    handler: impl 'static + FnMut(Event),
) -> Result<(), JsValue> {
    let element: HtmlElement = get_element(document, id)?;
    let onclick = Closure::<dyn FnMut(Event)>::new(handler);
    element.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
    onclick.forget();
    Ok(())
}

fn install_toolbar_handlers(app: &Rc<App>) -> Result<(), JsValue> {
    let document = app.document.clone();

    let select_app = app.clone();
    on_click(&document, "tool-select", move |_| {
        select_app
            .session
            .borrow_mut()
            .editor_mut()
            .set_tool(Tool::Select);
        select_app.refresh();
    })?;

    let pan_app = app.clone();
    on_click(&document, "tool-pan", move |_| {
        pan_app.session.borrow_mut().editor_mut().set_tool(Tool::Pan);
        pan_app.refresh();
    })?;

    let add_app = app.clone();
    on_click(&document, "add-booth", move |_| {
        let name = add_app
            .window
            .prompt_with_message("Organization name (leave empty to fill in later)")
            .ok()
            .flatten()
            .unwrap_or_default();
        let name = name.trim().to_string();
        let key = {
            let mut session = add_app.session.borrow_mut();
            if name.is_empty() {
                session.editor_mut().add_blank()
            } else {
                session.editor_mut().add_from_roster(BoothDetails {
                    org_name: name.clone(),
                    ..BoothDetails::default()
                })
            }
        };
        if !name.is_empty() {
            create_draft(&add_app, key);
        }
        add_app.refresh();
    })?;

    let edit_app = app.clone();
    on_click(&document, "edit-booth", move |_| edit_selected(&edit_app))?;

    let remove_app = app.clone();
    on_click(&document, "remove-booth", move |_| remove_selected(&remove_app))?;

    let save_app = app.clone();
    on_click(&document, "save-now", move |_| {
        let batch = save_app.session.borrow_mut().begin_save();
        if let Some(batch) = batch {
            run_save(&save_app, batch);
        }
    })?;

    let notices_app = app.clone();
    on_click(&document, "notices", move |event: Event| {
        if let Some(id) = notice_id_from_event(&event) {
            notices_app.session.borrow_mut().notifier_mut().dismiss(id);
            notices_app.refresh();
        }
    })?;

    Ok(())
}

/// Prompts for the organization name of the selected booth. A draft that
/// gains a name is created in the store.
fn edit_selected(app: &Rc<App>) {
    let current = {
        let session = app.session.borrow();
        let editor = session.editor();
        editor
            .selected()
            .and_then(|key| editor.booth(key))
            .map(|booth| (booth.key.clone(), booth.details.clone()))
    };
    let Some((key, mut details)) = current else {
        return;
    };
    let Some(name) = app
        .window
        .prompt_with_message_and_default("Organization name", &details.org_name)
        .ok()
        .flatten()
    else {
        return;
    };
    details.org_name = name.trim().to_string();
    let updated = app
        .session
        .borrow_mut()
        .update_details(&key, details, InputKind::Pointer);
    if updated && key.is_draft() {
        create_draft(app, key);
    }
    app.refresh();
}

fn page_persisted(event: &Event) -> bool {
    js_sys::Reflect::get(event.as_ref(), &JsValue::from_str("persisted"))
        .ok()
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}

fn install_window_handlers(app: &Rc<App>) -> Result<(), JsValue> {
    {
        let resize_app = app.clone();
        let onresize = Closure::<dyn FnMut(Event)>::new(move |_| resize(&resize_app));
        app.window
            .add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    {
        let key_app = app.clone();
        let onkeydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            match event.key().as_str() {
                "Escape" => {
                    key_app.session.borrow_mut().editor_mut().cancel_gesture();
                    key_app.refresh();
                }
                "Delete" => remove_selected(&key_app),
                _ => {}
            }
        });
        app.window
            .add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
        onkeydown.forget();
    }

    {
        let hide_app = app.clone();
        let onpagehide = Closure::<dyn FnMut(Event)>::new(move |_| {
            hide_app.session.borrow_mut().unmount();
        });
        app.window
            .add_event_listener_with_callback("pagehide", onpagehide.as_ref().unchecked_ref())?;
        onpagehide.forget();
    }

    {
        let show_app = app.clone();
        let onpageshow = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if !page_persisted(&event) {
                return;
            }
            show_app.session.borrow_mut().remount();
            fetch_remote(&show_app, RemoteFetch::Zones);
            fetch_remote(&show_app, RemoteFetch::FloorPlan);
            show_app.refresh();
        });
        app.window
            .add_event_listener_with_callback("pageshow", onpageshow.as_ref().unchecked_ref())?;
        onpageshow.forget();
    }

    Ok(())
}
