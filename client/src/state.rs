use floorplan_shared::{CanvasPoint, CanvasRect};

use crate::editor::BoothKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Select,
    Pan,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SelectMode {
    Idle,
    Move {
        key: BoothKey,
        start: CanvasPoint,
        origin: CanvasRect,
    },
    Resize {
        key: BoothKey,
        anchor: CanvasPoint,
        origin: CanvasRect,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PanMode {
    Idle,
    Active {
        start_x: f64,
        start_y: f64,
        origin_x: f64,
        origin_y: f64,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Mode {
    Select(SelectMode),
    Pan(PanMode),
}

impl Mode {
    pub fn tool(&self) -> Tool {
        match self {
            Mode::Select(_) => Tool::Select,
            Mode::Pan(_) => Tool::Pan,
        }
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(
            self,
            Mode::Select(SelectMode::Idle) | Mode::Pan(PanMode::Idle)
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchState {
    pub world_center_x: f64,
    pub world_center_y: f64,
    pub distance: f64,
    pub zoom: f64,
}
