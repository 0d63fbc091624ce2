use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use floorplan_shared::{
    CanvasRect, GridMapper, Placement, SponsorTier, Zone, CANVAS_HEIGHT, CANVAS_WIDTH, GRID_COLS,
    GRID_ROWS,
};

use crate::app::WebSession;
use crate::editor::SceneBooth;
use crate::geometry::{Corner, Viewport, HANDLE_SIZE};
use crate::session::BackgroundState;

const DEFAULT_GRID_OPACITY: f64 = 0.5;

pub struct Surface {
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
    pub background: Option<HtmlImageElement>,
}

pub fn redraw(surface: &Surface, session: &WebSession) {
    let ctx = &surface.ctx;
    let _ = ctx.set_transform(surface.dpr, 0.0, 0.0, surface.dpr, 0.0, 0.0);
    ctx.clear_rect(0.0, 0.0, surface.width, surface.height);

    let editor = session.editor();
    let viewport = editor.viewport();
    let mapper = editor.mapper();

    ctx.save();
    let _ = ctx.translate(viewport.pan_x, viewport.pan_y);
    let _ = ctx.scale(viewport.zoom, viewport.zoom);

    ctx.set_fill_style_str("#ffffff");
    ctx.fill_rect(0.0, 0.0, CANVAS_WIDTH, CANVAS_HEIGHT);
    if let (BackgroundState::Ready(_), Some(image)) = (session.background(), &surface.background) {
        let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
            image,
            0.0,
            0.0,
            CANVAS_WIDTH,
            CANVAS_HEIGHT,
        );
    }

    let opacity = session
        .floor_plan()
        .map(|plan| plan.grid_opacity)
        .unwrap_or(DEFAULT_GRID_OPACITY);
    draw_grid(ctx, mapper, opacity);
    for zone in session.zones().list_zones() {
        draw_zone(ctx, mapper, zone);
    }
    for booth in editor.booths() {
        let selected = editor.selected() == Some(&booth.key);
        draw_booth(ctx, mapper, booth, selected);
    }
    if let Some(preview) = editor.grid_preview() {
        draw_preview(ctx, &preview);
    }
    ctx.restore();

    if let Some(booth) = editor.selected().and_then(|key| editor.booth(key)) {
        if let Placement::Canvas(rect) = booth.placement {
            if booth.selectable {
                draw_handles(ctx, &viewport, &rect);
            }
        }
    }
}

fn draw_grid(ctx: &CanvasRenderingContext2d, mapper: &GridMapper, opacity: f64) {
    if opacity <= 0.0 {
        return;
    }
    let cell = mapper.cell_size();
    ctx.save();
    ctx.set_global_alpha(opacity);
    ctx.set_stroke_style_str("#8a94a6");
    ctx.set_line_width(1.0);
    ctx.begin_path();
    for row in 0..=GRID_ROWS {
        let y = row as f64 * cell;
        ctx.move_to(0.0, y);
        ctx.line_to(mapper.grid_width(), y);
    }
    for col in 0..=GRID_COLS {
        let x = col as f64 * cell;
        ctx.move_to(x, 0.0);
        ctx.line_to(x, mapper.grid_height());
    }
    ctx.stroke();
    ctx.restore();
}

fn draw_zone(ctx: &CanvasRenderingContext2d, mapper: &GridMapper, zone: &Zone) {
    let rect = zone.footprint.to_rect(mapper);
    ctx.save();
    ctx.set_fill_style_str(&zone.color);
    ctx.set_global_alpha(0.18);
    ctx.fill_rect(rect.x, rect.y, rect.width, rect.depth);
    ctx.set_global_alpha(0.9);
    ctx.set_stroke_style_str(&zone.color);
    ctx.set_line_width(2.0);
    ctx.stroke_rect(rect.x, rect.y, rect.width, rect.depth);
    ctx.set_fill_style_str(&zone.color);
    ctx.set_font("600 13px system-ui, sans-serif");
    ctx.set_text_baseline("top");
    let _ = ctx.fill_text(&zone.name, rect.x + 6.0, rect.y + 6.0);
    ctx.restore();
}

fn tier_color(tier: SponsorTier) -> &'static str {
    match tier {
        SponsorTier::Platinum => "#5b6b8c",
        SponsorTier::Gold => "#c9a227",
        SponsorTier::Silver => "#9aa3ad",
        SponsorTier::Bronze => "#b0703c",
        SponsorTier::Unsponsored => "#3d7ea6",
    }
}

fn draw_booth(
    ctx: &CanvasRenderingContext2d,
    mapper: &GridMapper,
    booth: &SceneBooth,
    selected: bool,
) {
    let rect = booth.rect(mapper);
    let inset = if matches!(booth.placement, Placement::Grid(_)) {
        4.0
    } else {
        0.0
    };
    ctx.save();
    if !booth.selectable {
        ctx.set_global_alpha(0.6);
    }
    ctx.set_fill_style_str(tier_color(booth.details.sponsor_tier));
    ctx.fill_rect(
        rect.x + inset,
        rect.y + inset,
        rect.width - inset * 2.0,
        rect.depth - inset * 2.0,
    );
    if booth.key.is_draft() {
        let _ = ctx.set_line_dash(&js_sys::Array::of2(&4.into(), &4.into()));
        ctx.set_stroke_style_str("#e46b49");
    } else {
        ctx.set_stroke_style_str(if selected { "#1a1f2a" } else { "#ffffff" });
    }
    ctx.set_line_width(if selected { 3.0 } else { 1.5 });
    ctx.stroke_rect(
        rect.x + inset,
        rect.y + inset,
        rect.width - inset * 2.0,
        rect.depth - inset * 2.0,
    );
    let _ = ctx.set_line_dash(&js_sys::Array::new());

    let label = match (&booth.details.table_no, booth.details.org_name.trim()) {
        (_, "") => "New booth".to_string(),
        (Some(table), name) => format!("{table} · {name}"),
        (None, name) => name.to_string(),
    };
    ctx.set_fill_style_str("#ffffff");
    ctx.set_font("12px system-ui, sans-serif");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text_with_max_width(
        &label,
        booth.label.x,
        booth.label.y,
        (rect.width - 8.0).max(8.0),
    );
    ctx.restore();
}

fn draw_preview(ctx: &CanvasRenderingContext2d, rect: &CanvasRect) {
    ctx.save();
    let _ = ctx.set_line_dash(&js_sys::Array::of2(&6.into(), &4.into()));
    ctx.set_stroke_style_str("rgba(26, 31, 42, 0.65)");
    ctx.set_fill_style_str("rgba(26, 31, 42, 0.08)");
    ctx.set_line_width(1.5);
    ctx.fill_rect(rect.x, rect.y, rect.width, rect.depth);
    ctx.stroke_rect(rect.x, rect.y, rect.width, rect.depth);
    ctx.restore();
}

fn draw_handles(ctx: &CanvasRenderingContext2d, viewport: &Viewport, rect: &CanvasRect) {
    let half = HANDLE_SIZE / 2.0;
    ctx.set_fill_style_str("rgba(26, 31, 42, 0.85)");
    for corner in Corner::ALL {
        let (x, y) = viewport.world_to_screen(corner.point(rect));
        ctx.fill_rect(x - half, y - half, HANDLE_SIZE, HANDLE_SIZE);
    }
}
