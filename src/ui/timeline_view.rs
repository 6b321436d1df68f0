use chrono::Utc;
use egui::{Color32, CursorIcon, Painter, Pos2, Rect, Response, Rounding, Sense, Stroke, Ui, Vec2};

use crate::config::TimelineConfig;
use crate::interaction::{DragCommit, DragOperation};
use crate::layout::{BarLayout, BoundsSource, MilestoneMarker, RowKind, RowLayout, TimelineLayout};
use crate::model::ItemRef;
use crate::state::TimelineState;
use crate::store::TimelineStore;
use crate::ui::theme;

const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
const HANDLE_WIDTH: f32 = theme::HANDLE_WIDTH;

/// What happened in the timeline this frame.
#[derive(Debug, Clone, Default)]
pub struct ChartInteraction {
    /// A gesture was released and handed to the store.
    pub commit: Option<DragCommit>,
    /// An item was clicked; the host opens its editor.
    pub edit_requested: Option<ItemRef>,
}

/// Maps percent positions onto the horizontal track.
#[derive(Debug, Clone, Copy)]
struct Track {
    left: f32,
    width: f32,
}

impl Track {
    fn x(&self, percent: f64) -> f32 {
        self.left + (percent / 100.0) as f32 * self.width
    }
}

/// Render the swimlane timeline and drive the drag gesture.
pub fn show_timeline(
    state: &mut TimelineState,
    store: &dyn TimelineStore,
    config: &TimelineConfig,
    ui: &mut Ui,
) -> ChartInteraction {
    let mut interaction = ChartInteraction::default();
    let layout = state.layout(config, Utc::now());
    let available = ui.available_size();
    let label_width = config.label_width.min(available.x * 0.4);
    let track_width = (available.x - label_width).max(120.0);
    let chart_height = HEADER_HEIGHT + layout.total_height();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let (response, painter) = ui.allocate_painter(
                Vec2::new(label_width + track_width, chart_height.max(available.y)),
                Sense::hover(),
            );
            let origin = response.rect.min;
            let bottom = response.rect.bottom();
            let track = Track {
                left: origin.x + label_width,
                width: track_width,
            };
            let track_clip = Rect::from_min_max(
                Pos2::new(track.left, origin.y),
                Pos2::new(track.left + track.width, bottom),
            );

            painter.rect_filled(response.rect, 0.0, theme::BG_DARK);
            painter.rect_filled(
                Rect::from_min_size(origin, Vec2::new(label_width, bottom - origin.y)),
                0.0,
                theme::BG_LABELS,
            );
            draw_header(&painter.with_clip_rect(track_clip), &layout, track, origin.y, bottom);

            let track_painter = painter.with_clip_rect(track_clip);
            let mut y = origin.y + HEADER_HEIGHT;
            for (index, row) in layout.rows.iter().enumerate() {
                draw_row_frame(&painter, row, index, origin.x, y, label_width + track_width);
                let color = row_color(row, index);

                for bar in &row.bars {
                    let rect = bar_rect(bar, track, y, config);
                    draw_bar(&track_painter, bar, rect, color);
                    bar_input(ui, state, &track_painter, bar, rect, track_clip, &mut interaction);
                }

                for marker in &row.milestones {
                    let center = Pos2::new(
                        track.x(marker.position),
                        y + config.rows.header_offset * 0.5 + 2.0,
                    );
                    let hit = draw_milestone(&track_painter, marker, center);
                    let visible = hit.intersect(track_clip);
                    if !visible.is_positive() {
                        continue;
                    }
                    let response = ui.interact(
                        visible,
                        ui.make_persistent_id(("milestone", marker.item)),
                        Sense::click(),
                    );
                    if response.clicked() {
                        interaction.edit_requested = Some(marker.item);
                    }
                    if response.hovered() {
                        ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
                        egui::show_tooltip_at_pointer(
                            ui.ctx(),
                            ui.layer_id(),
                            egui::Id::new(("milestone-tip", marker.item)),
                            |ui| {
                                ui.strong(&marker.label);
                                ui.label(
                                    layout
                                        .window
                                        .date_of(marker.position)
                                        .format("%d/%m/%Y")
                                        .to_string(),
                                );
                            },
                        );
                    }
                }

                y += row.height;
            }

            if let Some(today) = layout.today {
                draw_today_line(&track_painter, track.x(today), origin.y, bottom);
            }

            // Global pointer tracking exists only for the life of a session.
            if let Some(operation) = state.drag().session().map(|s| s.operation) {
                let (pointer, released) =
                    ui.input(|i| (i.pointer.latest_pos(), i.pointer.any_released()));
                if let Some(pos) = pointer {
                    state.update_drag(pos.x, &layout.window, track.width);
                }
                ui.ctx().set_cursor_icon(match operation {
                    DragOperation::Move => CursorIcon::Grabbing,
                    DragOperation::ResizeStart | DragOperation::ResizeEnd => {
                        CursorIcon::ResizeHorizontal
                    }
                });
                if released {
                    interaction.commit = state.release_drag(store);
                }
                ui.ctx().request_repaint();
            }
        });

    interaction
}

fn bar_rect(bar: &BarLayout, track: Track, row_top: f32, config: &TimelineConfig) -> Rect {
    let x_start = track.x(bar.left);
    let width = (track.x(bar.right) - x_start).max(theme::MIN_BAR_WIDTH);
    Rect::from_min_size(
        Pos2::new(x_start, row_top + config.rows.lane_top(bar.lane)),
        Vec2::new(width, config.rows.bar_height),
    )
}

/// Hit areas for the bar body and both resize handles. Handles are added
/// after the body so they win the hit test where they overlap it.
fn bar_input(
    ui: &mut Ui,
    state: &mut TimelineState,
    painter: &Painter,
    bar: &BarLayout,
    rect: Rect,
    clip: Rect,
    interaction: &mut ChartInteraction,
) {
    let body_rect = rect.intersect(clip);
    if !body_rect.is_positive() {
        return;
    }
    let body = ui.interact(
        body_rect,
        ui.make_persistent_id(("bar", bar.item)),
        Sense::click_and_drag(),
    );
    let left = handle_response(ui, bar.item, "resize-start", rect.left(), rect, clip);
    let right = handle_response(ui, bar.item, "resize-end", rect.right(), rect, clip);

    let started = [
        (left.as_ref(), DragOperation::ResizeStart),
        (right.as_ref(), DragOperation::ResizeEnd),
        (Some(&body), DragOperation::Move),
    ]
    .into_iter()
    .find_map(|(response, operation)| response?.drag_started().then_some(operation));
    if let Some(operation) = started {
        // egui reports the drag only past its movement threshold, so anchor on
        // where the press began rather than where the pointer is now.
        let press = ui.input(|i| i.pointer.press_origin());
        if let Some(anchor_x) = drag_anchor_x(press, body.interact_pointer_pos()) {
            state.begin_drag(operation, bar.item, anchor_x);
        }
    }

    if body.clicked() {
        interaction.edit_requested = Some(bar.item);
    }

    let on_handle = left.as_ref().is_some_and(Response::hovered)
        || right.as_ref().is_some_and(Response::hovered);
    if on_handle {
        ui.ctx().set_cursor_icon(CursorIcon::ResizeHorizontal);
    } else if body.hovered() {
        ui.ctx().set_cursor_icon(CursorIcon::Grab);
    }

    if on_handle || body.hovered() || bar.source == BoundsSource::Live {
        draw_handles(painter, rect);
        egui::show_tooltip_at_pointer(
            ui.ctx(),
            ui.layer_id(),
            egui::Id::new(("bar-tip", bar.item)),
            |ui| {
                ui.strong(&bar.label);
                ui.label(format!(
                    "{} → {}",
                    bar.bounds.start_date().format("%d/%m/%Y"),
                    bar.bounds.end_date().format("%d/%m/%Y"),
                ));
                if bar.source == BoundsSource::Optimistic {
                    ui.label("Saving…");
                }
            },
        );
    }
}

fn drag_anchor_x(press_origin: Option<Pos2>, pointer: Option<Pos2>) -> Option<f32> {
    press_origin.or(pointer).map(|pos| pos.x)
}

fn handle_response(
    ui: &mut Ui,
    item: ItemRef,
    edge: &'static str,
    x: f32,
    bar: Rect,
    clip: Rect,
) -> Option<Response> {
    let rect = Rect::from_min_max(
        Pos2::new(x - HANDLE_WIDTH * 0.5, bar.top()),
        Pos2::new(x + HANDLE_WIDTH * 0.5, bar.bottom()),
    )
    .expand2(Vec2::new(3.0, 0.0))
    .intersect(clip);
    if !rect.is_positive() {
        return None;
    }
    Some(ui.interact(rect, ui.make_persistent_id((edge, item)), Sense::drag()))
}

fn row_color(row: &RowLayout, index: usize) -> Color32 {
    match row.kind {
        RowKind::Phases => theme::PHASE_COLOR,
        RowKind::Workstream(_) => theme::stream_color(row.color_hint.as_deref(), index),
        RowKind::Unassigned => theme::TEXT_DIM,
    }
}

fn draw_header(painter: &Painter, layout: &TimelineLayout, track: Track, top: f32, bottom: f32) {
    painter.rect_filled(
        Rect::from_min_max(
            Pos2::new(track.left, top),
            Pos2::new(track.left + track.width, top + HEADER_HEIGHT),
        ),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(track.left, top + HEADER_HEIGHT),
            Pos2::new(track.left + track.width, top + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    for marker in &layout.months {
        let x = track.x(marker.position);
        painter.line_segment(
            [Pos2::new(x, top + HEADER_HEIGHT), Pos2::new(x, bottom)],
            Stroke::new(0.5, theme::GRID_LINE),
        );
        // A month that began before the window keeps its label at the edge.
        painter.text(
            Pos2::new(x.max(track.left) + 5.0, top + 18.0),
            egui::Align2::LEFT_CENTER,
            &marker.label,
            theme::font_header(),
            theme::TEXT_PRIMARY,
        );
    }

    let hint = "Drag bars to move · Drag edges to resize · Click to edit";
    painter.text(
        Pos2::new(track.left + 5.0, top + HEADER_HEIGHT - 9.0),
        egui::Align2::LEFT_CENTER,
        hint,
        theme::font_small(),
        theme::TEXT_DIM,
    );
}

fn draw_row_frame(painter: &Painter, row: &RowLayout, index: usize, left: f32, top: f32, width: f32) {
    if index % 2 == 1 {
        painter.rect_filled(
            Rect::from_min_size(Pos2::new(left, top), Vec2::new(width, row.height)),
            0.0,
            Color32::from_rgba_premultiplied(255, 255, 255, 6),
        );
    }
    painter.line_segment(
        [
            Pos2::new(left, top + row.height),
            Pos2::new(left + width, top + row.height),
        ],
        Stroke::new(0.5, theme::BORDER_SUBTLE),
    );

    painter.text(
        Pos2::new(left + 10.0, top + 12.0),
        egui::Align2::LEFT_CENTER,
        &row.title,
        theme::font_header(),
        if row.kind == RowKind::Unassigned {
            theme::TEXT_SECONDARY
        } else {
            theme::TEXT_PRIMARY
        },
    );
    if row.lane_count > 1 {
        painter.text(
            Pos2::new(left + 10.0, top + 28.0),
            egui::Align2::LEFT_CENTER,
            format!("{} lanes", row.lane_count),
            theme::font_small(),
            theme::TEXT_DIM,
        );
    }
}

fn draw_bar(painter: &Painter, bar: &BarLayout, rect: Rect, color: Color32) {
    let rounding = Rounding::same(theme::BAR_ROUNDING);

    painter.rect_filled(
        rect.translate(Vec2::new(1.0, 2.0)),
        rounding,
        Color32::from_black_alpha(35),
    );
    painter.rect_filled(rect, rounding, color);
    painter.rect_filled(
        Rect::from_min_size(rect.min, Vec2::new(rect.width(), (rect.height() * 0.45).max(4.0))),
        Rounding {
            nw: theme::BAR_ROUNDING,
            ne: theme::BAR_ROUNDING,
            sw: 0.0,
            se: 0.0,
        },
        Color32::from_white_alpha(25),
    );

    if let Some((grow, stroke)) = source_outline(bar.source) {
        painter.rect_stroke(
            rect.expand(grow),
            Rounding::same(theme::BAR_ROUNDING + grow),
            stroke,
        );
    }

    if rect.width() > 30.0 {
        let galley = painter.layout_no_wrap(bar.label.clone(), theme::font_bar(), theme::TEXT_ON_BAR);
        let text_y = rect.top() + (rect.height() - galley.size().y) / 2.0;
        painter
            .with_clip_rect(rect.intersect(painter.clip_rect()))
            .galley(Pos2::new(rect.left() + 6.0, text_y), galley, Color32::TRANSPARENT);
    }
}

/// Outline marking bars that are not showing server state: how far it sits
/// outside the bar, and its stroke.
fn source_outline(source: BoundsSource) -> Option<(f32, Stroke)> {
    match source {
        BoundsSource::Live => Some((1.5, Stroke::new(2.0, theme::BORDER_ACCENT))),
        BoundsSource::Optimistic => Some((1.0, Stroke::new(1.5, theme::PENDING_OUTLINE))),
        BoundsSource::Committed => None,
    }
}

fn draw_handles(painter: &Painter, bar: Rect) {
    let handle_h = bar.height() * 0.55;
    let handle_y = bar.center().y - handle_h / 2.0;
    for x in [bar.left() - 1.5, bar.right() - 2.5] {
        painter.rect_filled(
            Rect::from_min_size(Pos2::new(x, handle_y), Vec2::new(4.0, handle_h)),
            Rounding::same(2.0),
            theme::HANDLE_COLOR,
        );
    }
}

fn draw_milestone(painter: &Painter, marker: &MilestoneMarker, center: Pos2) -> Rect {
    let size = 6.0;
    let points = vec![
        Pos2::new(center.x, center.y - size),
        Pos2::new(center.x + size, center.y),
        Pos2::new(center.x, center.y + size),
        Pos2::new(center.x - size, center.y),
    ];
    painter.add(egui::Shape::convex_polygon(
        points.iter().map(|p| *p + Vec2::new(1.0, 1.5)).collect(),
        Color32::from_black_alpha(40),
        Stroke::NONE,
    ));
    painter.add(egui::Shape::convex_polygon(
        points,
        theme::MILESTONE_COLOR,
        Stroke::NONE,
    ));
    painter.text(
        Pos2::new(center.x + size + 4.0, center.y),
        egui::Align2::LEFT_CENTER,
        &marker.label,
        theme::font_small(),
        theme::TEXT_SECONDARY,
    );

    Rect::from_center_size(center, Vec2::splat(size * 2.0 + 4.0))
}

fn draw_today_line(painter: &Painter, x: f32, top: f32, bottom: f32) {
    painter.line_segment(
        [Pos2::new(x, top + HEADER_HEIGHT), Pos2::new(x, bottom)],
        Stroke::new(1.5, theme::TODAY_LINE),
    );

    let badge_w = 42.0;
    let badge_rect = Rect::from_min_size(
        Pos2::new(x - badge_w / 2.0, top + HEADER_HEIGHT - 1.0),
        Vec2::new(badge_w, 14.0),
    );
    painter.rect_filled(badge_rect, Rounding::same(3.0), theme::TODAY_LINE);
    painter.text(
        badge_rect.center(),
        egui::Align2::CENTER_CENTER,
        "Today",
        theme::font_small(),
        Color32::WHITE,
    );
}
