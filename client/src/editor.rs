//! Organizer-facing booth placement surface.
//!
//! The editor owns the in-memory scene: saved booths from the store plus
//! drafts that have no store identity yet. It knows nothing about timers or
//! the network; gestures that change a booth report an [`EditorEvent`] and
//! the session decides what to do with it.

use std::collections::BTreeSet;
use std::fmt;

use floorplan_shared::attendee::footprint;
use floorplan_shared::{
    Booth, BoothDetails, BoothId, BoothRecord, CanvasPoint, CanvasRect, CellSize, EventId,
    GridMapper, GridPosition, OccupancyTracker, Placement, CANVAS_HEIGHT, CANVAS_WIDTH,
};

use crate::geometry::{self, Viewport};
use crate::state::{Mode, PanMode, PinchState, SelectMode, Tool};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 3.0;
pub const DEFAULT_BOOTH_WIDTH: f64 = 80.0;
pub const DEFAULT_BOOTH_DEPTH: f64 = 60.0;

/// Identity of a booth in the scene. Drafts are numbered locally until the
/// store hands out a real id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoothKey {
    Saved(BoothId),
    Draft(u32),
}

impl BoothKey {
    pub fn is_draft(&self) -> bool {
        matches!(self, BoothKey::Draft(_))
    }

    pub fn booth_id(&self) -> Option<&BoothId> {
        match self {
            BoothKey::Saved(id) => Some(id),
            BoothKey::Draft(_) => None,
        }
    }
}

impl fmt::Display for BoothKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoothKey::Saved(id) => write!(f, "{id}"),
            BoothKey::Draft(number) => write!(f, "draft-{number}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneBooth {
    pub key: BoothKey,
    pub details: BoothDetails,
    pub placement: Placement,
    pub label: CanvasPoint,
    pub selectable: bool,
}

impl SceneBooth {
    fn new(
        key: BoothKey,
        details: BoothDetails,
        placement: Placement,
        selectable: bool,
        mapper: &GridMapper,
    ) -> Self {
        let label = footprint(&placement, mapper).center();
        Self {
            key,
            details,
            placement,
            label,
            selectable,
        }
    }

    pub fn rect(&self, mapper: &GridMapper) -> CanvasRect {
        footprint(&self.placement, mapper)
    }

    fn recenter_label(&mut self, mapper: &GridMapper) {
        self.label = self.rect(mapper).center();
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    Modified(BoothKey),
}

#[derive(Clone, Debug, PartialEq)]
pub enum GridPlacement {
    Placed,
    Occupied(BoothKey),
    Unchanged,
}

pub struct PlacementEditor {
    event_id: EventId,
    mapper: GridMapper,
    booths: Vec<SceneBooth>,
    selected: Option<BoothKey>,
    mode: Mode,
    viewport: Viewport,
    pinch: Option<PinchState>,
    grid_preview: Option<CanvasRect>,
    next_draft: u32,
    interactive: bool,
}

impl PlacementEditor {
    pub fn new(event_id: EventId, cell_size: CellSize) -> Self {
        Self {
            event_id,
            mapper: GridMapper::new(cell_size),
            booths: Vec::new(),
            selected: None,
            mode: Mode::Select(SelectMode::Idle),
            viewport: Viewport::default(),
            pinch: None,
            grid_preview: None,
            next_draft: 1,
            interactive: true,
        }
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn mapper(&self) -> &GridMapper {
        &self.mapper
    }

    pub fn booths(&self) -> &[SceneBooth] {
        &self.booths
    }

    pub fn booth(&self, key: &BoothKey) -> Option<&SceneBooth> {
        self.booths.iter().find(|booth| &booth.key == key)
    }

    fn booth_mut(&mut self, key: &BoothKey) -> Option<&mut SceneBooth> {
        self.booths.iter_mut().find(|booth| &booth.key == key)
    }

    pub fn draft_count(&self) -> usize {
        self.booths.iter().filter(|booth| booth.key.is_draft()).count()
    }

    pub fn selected(&self) -> Option<&BoothKey> {
        self.selected.as_ref()
    }

    pub fn select(&mut self, key: Option<BoothKey>) {
        self.selected = key.filter(|key| self.booth(key).is_some_and(|booth| booth.selectable));
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn tool(&self) -> Tool {
        self.mode.tool()
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.cancel_gesture();
        self.mode = idle_mode(tool);
    }

    /// Outline of a grid booth being dragged, before it snaps to a cell.
    pub fn grid_preview(&self) -> Option<CanvasRect> {
        self.grid_preview
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    pub fn is_gesture_active(&self) -> bool {
        self.mode.is_dragging() || self.pinch.is_some()
    }

    /// Toggles whether booths can be picked up. A gesture already under way
    /// is allowed to finish.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
        for booth in &mut self.booths {
            booth.selectable = interactive;
        }
    }

    /// Swaps in a fresh copy of the saved booths. Drafts survive because the
    /// store has never seen them.
    pub fn replace_saved(&mut self, booths: Vec<Booth>) {
        self.replace_saved_keeping(booths, &BTreeSet::new());
    }

    /// Like [`replace_saved`](Self::replace_saved), but booths in `keep`
    /// hold on to their local placement and details as long as the store
    /// still has them.
    pub fn replace_saved_keeping(&mut self, booths: Vec<Booth>, keep: &BTreeSet<BoothKey>) {
        let mut local = std::mem::take(&mut self.booths);
        let drafts = local
            .iter()
            .filter(|booth| booth.key.is_draft())
            .cloned()
            .collect::<Vec<_>>();
        let mut scene = Vec::with_capacity(booths.len() + drafts.len());
        for booth in booths {
            let key = BoothKey::Saved(booth.id);
            let kept = keep
                .contains(&key)
                .then(|| local.iter().position(|scene| scene.key == key))
                .flatten()
                .map(|index| local.swap_remove(index));
            match kept {
                Some(mut scene_booth) => {
                    scene_booth.selectable = self.interactive;
                    scene.push(scene_booth);
                }
                None => scene.push(SceneBooth::new(
                    key,
                    booth.details,
                    booth.placement,
                    self.interactive,
                    &self.mapper,
                )),
            }
        }
        scene.extend(drafts);
        self.booths = scene;
        self.forget_missing();
    }

    pub fn add_blank(&mut self) -> BoothKey {
        self.add_draft(BoothDetails::default())
    }

    pub fn add_from_roster(&mut self, details: BoothDetails) -> BoothKey {
        self.add_draft(details)
    }

    /// New booths take the first free grid cell, or the middle of the canvas
    /// once the grid is full.
    fn add_draft(&mut self, details: BoothDetails) -> BoothKey {
        let key = BoothKey::Draft(self.next_draft);
        self.next_draft += 1;
        let placement = match self.occupancy().free_cells().first() {
            Some(position) => Placement::Grid(*position),
            None => Placement::Canvas(CanvasRect::new(
                (CANVAS_WIDTH - DEFAULT_BOOTH_WIDTH) / 2.0,
                (CANVAS_HEIGHT - DEFAULT_BOOTH_DEPTH) / 2.0,
                DEFAULT_BOOTH_WIDTH,
                DEFAULT_BOOTH_DEPTH,
            )),
        };
        self.booths.push(SceneBooth::new(
            key.clone(),
            details,
            placement,
            self.interactive,
            &self.mapper,
        ));
        key
    }

    /// Gives a draft the id the store assigned to it.
    pub fn assign_identity(&mut self, draft: &BoothKey, id: BoothId) -> bool {
        if !draft.is_draft() {
            return false;
        }
        let saved = BoothKey::Saved(id);
        let Some(booth) = self.booth_mut(draft) else {
            return false;
        };
        booth.key = saved.clone();
        if self.selected.as_ref() == Some(draft) {
            self.selected = Some(saved.clone());
        }
        match &mut self.mode {
            Mode::Select(SelectMode::Move { key, .. })
            | Mode::Select(SelectMode::Resize { key, .. })
                if *key == *draft =>
            {
                *key = saved;
            }
            _ => {}
        }
        true
    }

    pub fn remove(&mut self, key: &BoothKey) -> Option<SceneBooth> {
        let index = self.booths.iter().position(|booth| &booth.key == key)?;
        let removed = self.booths.remove(index);
        self.forget_missing();
        Some(removed)
    }

    pub fn update_details(&mut self, key: &BoothKey, details: BoothDetails) -> bool {
        match self.booth_mut(key) {
            Some(booth) => {
                booth.details = details;
                true
            }
            None => false,
        }
    }

    pub fn occupancy(&self) -> OccupancyTracker<BoothKey> {
        let mut tracker = OccupancyTracker::new();
        for booth in &self.booths {
            match booth.placement {
                Placement::Grid(position) => tracker.insert_cell(booth.key.clone(), position),
                Placement::Canvas(rect) => tracker.insert_region(booth.key.clone(), rect),
            }
        }
        tracker
    }

    /// Moves a booth to a grid cell unless another booth already holds it.
    pub fn place_on_grid(&mut self, key: &BoothKey, position: GridPosition) -> GridPlacement {
        let Some(current) = self.booth(key).map(|booth| booth.placement) else {
            return GridPlacement::Unchanged;
        };
        if current == Placement::Grid(position) {
            return GridPlacement::Unchanged;
        }
        if self.occupancy().is_occupied_excluding(position, key) {
            let occupant = self
                .booths
                .iter()
                .find(|booth| &booth.key != key && booth.placement == Placement::Grid(position))
                .map(|booth| booth.key.clone());
            if let Some(occupant) = occupant {
                return GridPlacement::Occupied(occupant);
            }
        }
        let mapper = self.mapper;
        if let Some(booth) = self.booth_mut(key) {
            booth.placement = Placement::Grid(position);
            booth.recenter_label(&mapper);
        }
        GridPlacement::Placed
    }

    /// Store rows for every saved booth, plus how many drafts were left out.
    pub fn save_records(&self) -> (Vec<BoothRecord>, usize) {
        let mut records = Vec::new();
        let mut drafts = 0;
        for booth in &self.booths {
            match &booth.key {
                BoothKey::Saved(id) => records.push(BoothRecord::from(&Booth {
                    id: id.clone(),
                    event_id: self.event_id.clone(),
                    placement: booth.placement,
                    details: booth.details.clone(),
                })),
                BoothKey::Draft(_) => drafts += 1,
            }
        }
        (records, drafts)
    }

    /// Row for creating a draft in the store; the id is left for the store.
    pub fn draft_record(&self, key: &BoothKey) -> Option<BoothRecord> {
        let booth = self.booth(key).filter(|booth| booth.key.is_draft())?;
        let mut record = BoothRecord::from(&Booth {
            id: BoothId::new(""),
            event_id: self.event_id.clone(),
            placement: booth.placement,
            details: booth.details.clone(),
        });
        record.id.clear();
        Some(record)
    }

    pub fn booth_at(&self, point: CanvasPoint) -> Option<&BoothKey> {
        self.booths
            .iter()
            .rev()
            .filter(|booth| booth.selectable)
            .find(|booth| booth.rect(&self.mapper).contains(point))
            .map(|booth| &booth.key)
    }

    pub fn pointer_down(&mut self, screen_x: f64, screen_y: f64) {
        if self.pinch.is_some() {
            return;
        }
        match self.mode {
            Mode::Pan(_) => {
                self.mode = Mode::Pan(PanMode::Active {
                    start_x: screen_x,
                    start_y: screen_y,
                    origin_x: self.viewport.pan_x,
                    origin_y: self.viewport.pan_y,
                });
            }
            Mode::Select(_) => {
                let Some(point) = self.viewport.screen_to_world(screen_x, screen_y) else {
                    return;
                };
                if let Some(mode) = self.resize_hit(screen_x, screen_y) {
                    self.mode = mode;
                    return;
                }
                let hit = self.booth_at(point).cloned();
                match hit {
                    Some(key) => {
                        let origin = self
                            .booth(&key)
                            .map(|booth| booth.rect(&self.mapper))
                            .unwrap_or_else(|| CanvasRect::new(point.x, point.y, 0.0, 0.0));
                        self.selected = Some(key.clone());
                        self.mode = Mode::Select(SelectMode::Move {
                            key,
                            start: point,
                            origin,
                        });
                    }
                    None => {
                        self.selected = None;
                        self.mode = Mode::Select(SelectMode::Idle);
                    }
                }
            }
        }
    }

    fn resize_hit(&self, screen_x: f64, screen_y: f64) -> Option<Mode> {
        let key = self.selected.as_ref()?;
        let booth = self.booth(key).filter(|booth| booth.selectable)?;
        let Placement::Canvas(rect) = booth.placement else {
            return None;
        };
        let corner = geometry::handle_hit_test(&self.viewport, &rect, screen_x, screen_y)?;
        Some(Mode::Select(SelectMode::Resize {
            key: key.clone(),
            anchor: corner.opposite().point(&rect),
            origin: rect,
        }))
    }

    pub fn pointer_move(&mut self, screen_x: f64, screen_y: f64) {
        if self.pinch.is_some() {
            return;
        }
        match self.mode.clone() {
            Mode::Pan(PanMode::Active {
                start_x,
                start_y,
                origin_x,
                origin_y,
            }) => {
                self.viewport.pan_x = origin_x + (screen_x - start_x);
                self.viewport.pan_y = origin_y + (screen_y - start_y);
            }
            Mode::Select(SelectMode::Move { key, start, origin }) => {
                let Some(point) = self.viewport.screen_to_world(screen_x, screen_y) else {
                    return;
                };
                let rect =
                    geometry::clamp_to_canvas(origin.translated(point.x - start.x, point.y - start.y));
                let on_grid = match self.booth_mut(&key) {
                    Some(booth) => match booth.placement {
                        Placement::Canvas(_) => {
                            booth.placement = Placement::Canvas(rect);
                            false
                        }
                        Placement::Grid(_) => true,
                    },
                    None => return,
                };
                if on_grid {
                    self.grid_preview = Some(rect);
                }
            }
            Mode::Select(SelectMode::Resize { key, anchor, .. }) => {
                let Some(point) = self.viewport.screen_to_world(screen_x, screen_y) else {
                    return;
                };
                let rect = geometry::resize_from_anchor(anchor, point);
                if let Some(booth) = self.booth_mut(&key) {
                    booth.placement = Placement::Canvas(rect);
                }
            }
            Mode::Pan(PanMode::Idle) | Mode::Select(SelectMode::Idle) => {}
        }
    }

    /// Ends the current gesture. A booth whose footprint changed gets its
    /// label recentered and is reported as modified.
    pub fn pointer_up(&mut self) -> Option<EditorEvent> {
        let tool = self.mode.tool();
        let finished = std::mem::replace(&mut self.mode, idle_mode(tool));
        let (key, origin) = match finished {
            Mode::Select(SelectMode::Move { key, origin, .. })
            | Mode::Select(SelectMode::Resize { key, origin, .. }) => (key, origin),
            _ => return None,
        };
        if let Some(preview) = self.grid_preview.take() {
            let target = self
                .mapper
                .coordinates_to_grid(CanvasPoint::new(preview.x, preview.y));
            return match self.place_on_grid(&key, target) {
                GridPlacement::Placed => Some(EditorEvent::Modified(key)),
                GridPlacement::Occupied(_) | GridPlacement::Unchanged => None,
            };
        }
        let mapper = self.mapper;
        let booth = self.booth_mut(&key)?;
        if booth.rect(&mapper) == origin {
            return None;
        }
        booth.recenter_label(&mapper);
        Some(EditorEvent::Modified(key))
    }

    /// Abandons a drag or resize and puts the booth back where it started.
    pub fn cancel_gesture(&mut self) {
        self.grid_preview = None;
        let tool = self.mode.tool();
        let finished = std::mem::replace(&mut self.mode, idle_mode(tool));
        if let Mode::Select(SelectMode::Move { key, origin, .. })
        | Mode::Select(SelectMode::Resize { key, origin, .. }) = finished
        {
            if let Some(booth) = self.booth_mut(&key) {
                if let Placement::Canvas(_) = booth.placement {
                    booth.placement = Placement::Canvas(origin);
                }
            }
        }
    }

    /// Zooms around a screen point, keeping the canvas point under it fixed.
    pub fn zoom_at(&mut self, factor: f64, screen_x: f64, screen_y: f64) {
        let Some(world) = self.viewport.screen_to_world(screen_x, screen_y) else {
            return;
        };
        let zoom = (self.viewport.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.viewport.zoom = zoom;
        self.viewport.pan_x = screen_x - world.x * zoom;
        self.viewport.pan_y = screen_y - world.y * zoom;
    }

    pub fn pinch_start(&mut self, a: (f64, f64), b: (f64, f64)) {
        self.cancel_gesture();
        let center_x = (a.0 + b.0) / 2.0;
        let center_y = (a.1 + b.1) / 2.0;
        self.pinch = Some(PinchState {
            world_center_x: (center_x - self.viewport.pan_x) / self.viewport.zoom,
            world_center_y: (center_y - self.viewport.pan_y) / self.viewport.zoom,
            distance: geometry::pinch_distance(a, b).max(0.001),
            zoom: self.viewport.zoom,
        });
    }

    pub fn pinch_move(&mut self, a: (f64, f64), b: (f64, f64)) {
        let Some(pinch) = self.pinch else {
            return;
        };
        let center_x = (a.0 + b.0) / 2.0;
        let center_y = (a.1 + b.1) / 2.0;
        let scale = geometry::pinch_distance(a, b).max(0.001) / pinch.distance;
        let zoom = (pinch.zoom * scale).clamp(MIN_ZOOM, MAX_ZOOM);
        self.viewport.zoom = zoom;
        self.viewport.pan_x = center_x - pinch.world_center_x * zoom;
        self.viewport.pan_y = center_y - pinch.world_center_y * zoom;
    }

    pub fn pinch_end(&mut self) {
        self.pinch = None;
    }

    /// Fits the whole canvas into a screen area and centers it.
    pub fn home_view(&mut self, screen_width: f64, screen_height: f64) {
        if screen_width <= 0.0 || screen_height <= 0.0 {
            return;
        }
        let zoom = (screen_width / CANVAS_WIDTH)
            .min(screen_height / CANVAS_HEIGHT)
            .clamp(MIN_ZOOM, MAX_ZOOM);
        self.viewport = Viewport {
            zoom,
            pan_x: (screen_width - CANVAS_WIDTH * zoom) / 2.0,
            pan_y: (screen_height - CANVAS_HEIGHT * zoom) / 2.0,
        };
    }

    fn forget_missing(&mut self) {
        if self
            .selected
            .as_ref()
            .is_some_and(|key| self.booth(key).is_none())
        {
            self.selected = None;
        }
        let target_missing = match &self.mode {
            Mode::Select(SelectMode::Move { key, .. })
            | Mode::Select(SelectMode::Resize { key, .. }) => self.booth(key).is_none(),
            _ => false,
        };
        if target_missing {
            self.grid_preview = None;
            self.mode = Mode::Select(SelectMode::Idle);
        }
    }
}

fn idle_mode(tool: Tool) -> Mode {
    match tool {
        Tool::Select => Mode::Select(SelectMode::Idle),
        Tool::Pan => Mode::Pan(PanMode::Idle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn editor() -> PlacementEditor {
        PlacementEditor::new(EventId::new("expo"), CellSize::Desktop)
    }

    fn booth(id: &str, placement: Placement) -> Booth {
        Booth {
            id: BoothId::new(id),
            event_id: EventId::new("expo"),
            placement,
            details: BoothDetails {
                org_name: format!("Org {id}"),
                ..BoothDetails::default()
            },
        }
    }

    fn cell(row: u8, col: u8) -> GridPosition {
        GridPosition::new(row, col).unwrap()
    }

    fn saved(id: &str) -> BoothKey {
        BoothKey::Saved(BoothId::new(id))
    }

    #[test]
    fn dragging_a_canvas_booth_reports_it_on_release() {
        let mut editor = editor();
        editor.replace_saved(vec![booth(
            "a",
            Placement::Canvas(CanvasRect::new(100.0, 100.0, 80.0, 60.0)),
        )]);
        editor.pointer_down(120.0, 120.0);
        editor.pointer_move(170.0, 140.0);
        let moved = editor.booth(&saved("a")).unwrap();
        assert_eq!(
            moved.placement,
            Placement::Canvas(CanvasRect::new(150.0, 120.0, 80.0, 60.0))
        );
        assert_eq!(moved.label, CanvasPoint::new(140.0, 130.0));

        assert_eq!(editor.pointer_up(), Some(EditorEvent::Modified(saved("a"))));
        assert_eq!(
            editor.booth(&saved("a")).unwrap().label,
            CanvasPoint::new(190.0, 150.0)
        );
        assert_eq!(editor.selected(), Some(&saved("a")));
    }

    #[test]
    fn a_click_without_movement_modifies_nothing() {
        let mut editor = editor();
        editor.replace_saved(vec![booth(
            "a",
            Placement::Canvas(CanvasRect::new(100.0, 100.0, 80.0, 60.0)),
        )]);
        editor.pointer_down(120.0, 120.0);
        assert_eq!(editor.pointer_up(), None);
    }

    #[test]
    fn corner_handle_resizes_down_to_the_minimum() {
        let mut editor = editor();
        editor.replace_saved(vec![booth(
            "a",
            Placement::Canvas(CanvasRect::new(100.0, 100.0, 80.0, 60.0)),
        )]);
        editor.select(Some(saved("a")));
        editor.pointer_down(180.0, 160.0);
        editor.pointer_move(101.0, 101.0);
        assert_eq!(editor.pointer_up(), Some(EditorEvent::Modified(saved("a"))));
        assert_eq!(
            editor.booth(&saved("a")).unwrap().placement,
            Placement::Canvas(CanvasRect::new(
                100.0,
                100.0,
                geometry::MIN_BOOTH_SIZE,
                geometry::MIN_BOOTH_SIZE
            ))
        );
    }

    #[test]
    fn non_interactive_booths_cannot_be_picked_up() {
        let mut editor = editor();
        editor.replace_saved(vec![booth(
            "a",
            Placement::Canvas(CanvasRect::new(100.0, 100.0, 80.0, 60.0)),
        )]);
        editor.set_interactive(false);
        editor.pointer_down(120.0, 120.0);
        editor.pointer_move(300.0, 300.0);
        assert_eq!(editor.pointer_up(), None);
        assert_eq!(editor.selected(), None);
        assert!(editor.booths().iter().all(|booth| !booth.selectable));

        editor.set_interactive(true);
        editor.pointer_down(120.0, 120.0);
        assert_eq!(editor.selected(), Some(&saved("a")));
    }

    #[test]
    fn grid_placement_respects_other_occupants_but_not_itself() {
        let mut editor = editor();
        editor.replace_saved(vec![
            booth("b", Placement::Grid(cell(2, 5))),
            booth("c", Placement::Grid(cell(0, 0))),
        ]);

        assert_eq!(
            editor.place_on_grid(&saved("c"), cell(2, 5)),
            GridPlacement::Occupied(saved("b"))
        );
        assert_eq!(
            editor.booth(&saved("c")).unwrap().placement,
            Placement::Grid(cell(0, 0))
        );
        assert_eq!(
            editor.place_on_grid(&saved("b"), cell(2, 5)),
            GridPlacement::Unchanged
        );
        assert_eq!(
            editor.place_on_grid(&saved("c"), cell(3, 6)),
            GridPlacement::Placed
        );
        assert_eq!(
            editor.booth(&saved("c")).unwrap().label,
            CanvasPoint::new(650.0, 350.0)
        );
    }

    #[test]
    fn dragging_a_grid_booth_snaps_to_the_nearest_cell() {
        let mut editor = editor();
        editor.replace_saved(vec![booth("a", Placement::Grid(cell(0, 0)))]);
        editor.pointer_down(50.0, 50.0);
        editor.pointer_move(690.0, 340.0);
        assert!(editor.grid_preview().is_some());
        assert_eq!(editor.pointer_up(), Some(EditorEvent::Modified(saved("a"))));
        assert_eq!(
            editor.booth(&saved("a")).unwrap().placement,
            Placement::Grid(cell(3, 6))
        );
        assert_eq!(editor.grid_preview(), None);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut editor = editor();
        editor.zoom_at(100.0, 0.0, 0.0);
        assert_eq!(editor.viewport().zoom, MAX_ZOOM);
        editor.zoom_at(0.0001, 0.0, 0.0);
        assert_eq!(editor.viewport().zoom, MIN_ZOOM);

        editor.pinch_start((0.0, 0.0), (10.0, 0.0));
        editor.pinch_move((0.0, 0.0), (1000.0, 0.0));
        assert_eq!(editor.viewport().zoom, MAX_ZOOM);
        editor.pinch_end();
        assert!(!editor.is_gesture_active());
    }

    #[test]
    fn pan_tool_moves_the_viewport_not_the_booths() {
        let mut editor = editor();
        editor.replace_saved(vec![booth(
            "a",
            Placement::Canvas(CanvasRect::new(100.0, 100.0, 80.0, 60.0)),
        )]);
        editor.set_tool(Tool::Pan);
        editor.pointer_down(120.0, 120.0);
        editor.pointer_move(150.0, 100.0);
        assert_eq!(editor.pointer_up(), None);
        assert_eq!(editor.viewport().pan_x, 30.0);
        assert_eq!(editor.viewport().pan_y, -20.0);
        assert_eq!(
            editor.booth(&saved("a")).unwrap().placement,
            Placement::Canvas(CanvasRect::new(100.0, 100.0, 80.0, 60.0))
        );
    }

    #[test]
    fn reload_keeps_drafts_and_drops_vanished_selection() {
        let mut editor = editor();
        editor.replace_saved(vec![booth("a", Placement::Grid(cell(0, 0)))]);
        let draft = editor.add_blank();
        assert_eq!(
            editor.booth(&draft).unwrap().placement,
            Placement::Grid(cell(0, 1))
        );
        editor.select(Some(saved("a")));

        editor.replace_saved(vec![booth("z", Placement::Grid(cell(4, 4)))]);
        assert_eq!(editor.selected(), None);
        let keys = editor
            .booths()
            .iter()
            .map(|booth| booth.key.clone())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![saved("z"), draft]);
    }

    #[test]
    fn saved_records_leave_drafts_out() {
        let mut editor = editor();
        editor.replace_saved(vec![booth("a", Placement::Grid(cell(1, 1)))]);
        let draft = editor.add_from_roster(BoothDetails {
            org_name: "State College".into(),
            ..BoothDetails::default()
        });
        let (records, drafts) = editor.save_records();
        assert_eq!(drafts, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[0].grid_row, Some(1));

        let row = editor.draft_record(&draft).unwrap();
        assert_eq!(row.id, "");
        assert_eq!(row.org_name, "State College");

        assert!(editor.assign_identity(&draft, BoothId::new("new-id")));
        assert_eq!(editor.save_records().1, 0);
        assert!(editor.booth(&saved("new-id")).is_some());
    }

    #[test]
    fn reload_can_keep_unsaved_local_booths() {
        let mut editor = editor();
        editor.replace_saved(vec![
            booth("a", Placement::Grid(cell(0, 0))),
            booth("b", Placement::Grid(cell(1, 1))),
            booth("c", Placement::Grid(cell(2, 2))),
        ]);
        assert_eq!(editor.place_on_grid(&saved("a"), cell(2, 5)), GridPlacement::Placed);

        let keep = BTreeSet::from([saved("a"), saved("c")]);
        editor.replace_saved_keeping(
            vec![
                booth("a", Placement::Grid(cell(0, 0))),
                booth("b", Placement::Grid(cell(6, 6))),
            ],
            &keep,
        );
        assert_eq!(
            editor.booth(&saved("a")).unwrap().placement,
            Placement::Grid(cell(2, 5))
        );
        assert_eq!(
            editor.booth(&saved("b")).unwrap().placement,
            Placement::Grid(cell(6, 6))
        );
        assert!(editor.booth(&saved("c")).is_none());
    }
}
