use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, vec2};
use signal_graph::model::Urgency;

const CLUSTER_PALETTE: [Color32; 8] = [
    Color32::from_rgb(103, 196, 255),
    Color32::from_rgb(246, 137, 92),
    Color32::from_rgb(132, 214, 140),
    Color32::from_rgb(201, 148, 245),
    Color32::from_rgb(245, 206, 93),
    Color32::from_rgb(94, 220, 205),
    Color32::from_rgb(240, 120, 160),
    Color32::from_rgb(170, 180, 110),
];

const STANDALONE_COLOR: Color32 = Color32::from_rgb(150, 156, 168);

pub(super) fn cluster_color(ordinal: Option<usize>) -> Color32 {
    ordinal.map_or(STANDALONE_COLOR, |ordinal| {
        CLUSTER_PALETTE[ordinal % CLUSTER_PALETTE.len()]
    })
}

pub(super) fn urgency_ring(urgency: Urgency) -> Option<Color32> {
    match urgency {
        Urgency::Urgent => Some(Color32::from_rgb(235, 82, 82)),
        Urgency::Emerging => Some(Color32::from_rgb(245, 170, 70)),
        Urgency::Monitor | Urgency::Stable => None,
    }
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = 56.0;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + step;
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + step;
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

/// Layout coordinates are viewport pixels with the origin at the top left
/// of the graph area.
pub(super) fn layout_to_screen(rect: Rect, x: f32, y: f32) -> Pos2 {
    rect.min + vec2(x, y)
}

pub(super) fn screen_to_layout(rect: Rect, screen: Pos2) -> Vec2 {
    screen - rect.min
}
