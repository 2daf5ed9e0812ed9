use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Shape, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use signal_graph::TickOutcome;

use super::super::render_utils::{
    blend_color, cluster_color, draw_background, layout_to_screen, urgency_ring, with_opacity,
};
use super::super::{SearchMatchCache, ViewModel};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    pub(in crate::app) fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let search_query = self.search.trim();
        if search_query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.run == self.run
            && cached.query == search_query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .view
            .graph()
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                fuzzy_match_score(&matcher, &node.title, search_query).map(|_| index)
            })
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: search_query.to_owned(),
            run: self.run,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        self.sync_viewport(rect);

        if let Some(run) = self.run {
            match self.view.tick(run) {
                Ok(TickOutcome::Advanced(status)) if !status.is_finished() => {
                    ui.ctx().request_repaint();
                }
                Ok(_) => {}
                Err(error) => self.engine_error = Some(error.to_string()),
            }
        }

        self.handle_pointer(ui, rect, &response);
        let search_matches = self.cached_search_matches();

        let Some(frame) = self.view.frame() else {
            ui.label("Waiting for a usable viewport.");
            return;
        };
        let graph = self.view.graph();

        for edge in &frame.edges {
            let start = layout_to_screen(rect, edge.x1, edge.y1);
            let end = layout_to_screen(rect, edge.x2, edge.y2);
            let stroke = Stroke::new(
                edge.stroke_width,
                with_opacity(Color32::from_gray(205), edge.opacity),
            );
            if edge.dashed {
                painter.extend(Shape::dashed_line(&[start, end], stroke, 6.0, 4.0));
            } else {
                painter.line_segment([start, end], stroke);
            }
        }

        let selected_color = Color32::from_rgb(245, 206, 93);
        for (index, node) in graph.nodes.iter().enumerate() {
            let Some(node_frame) = frame.nodes.get(&node.id) else {
                continue;
            };
            let position = layout_to_screen(rect, node_frame.x, node_frame.y);
            let radius = node_frame.radius;
            let opacity = node_frame.visual_opacity;
            let is_selected = self.selected.as_deref() == Some(node.id.as_str());
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let base_color = cluster_color(node.cluster);
            let color = if is_selected {
                blend_color(base_color, selected_color, 0.45)
            } else {
                base_color
            };
            painter.circle_filled(position, radius, with_opacity(color, opacity));

            if let Some(ring) = urgency_ring(node.urgency) {
                painter.circle_stroke(position, radius, Stroke::new(1.6, with_opacity(ring, opacity)));
            }
            if is_match {
                painter.circle_stroke(
                    position,
                    radius + 3.5,
                    Stroke::new(1.5, Color32::from_rgb(103, 196, 255)),
                );
            }
            if is_selected {
                painter.circle_stroke(
                    position,
                    radius + 5.0,
                    Stroke::new(2.0, with_opacity(selected_color, 0.8)),
                );
            }
        }

        for label in &frame.cluster_labels {
            painter.text(
                layout_to_screen(rect, label.x, label.y),
                Align2::CENTER_CENTER,
                label.text.as_str(),
                FontId::proportional(13.0),
                with_opacity(Color32::from_gray(235), label.opacity),
            );
        }
        for label in &frame.edge_labels {
            painter.text(
                layout_to_screen(rect, label.x, label.y),
                Align2::CENTER_CENTER,
                label.text.as_str(),
                FontId::proportional(10.5),
                with_opacity(Color32::from_gray(190), label.opacity),
            );
        }

        if let Some(tooltip) = &frame.tooltip {
            let galley = painter.layout_no_wrap(
                tooltip.title.clone(),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
            let anchor = layout_to_screen(rect, tooltip.anchor.x, tooltip.anchor.y);
            let background = Align2::CENTER_BOTTOM
                .anchor_size(anchor, galley.size())
                .expand(5.0);
            painter.rect_filled(background, 4.0, Color32::from_rgba_unmultiplied(12, 14, 18, 225));
            painter.galley(background.min + vec2(5.0, 5.0), galley, Color32::from_gray(240));
        }

        if let Some(error) = &self.engine_error {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                error.as_str(),
                FontId::proportional(13.0),
                egui::Color32::LIGHT_RED,
            );
        }
    }
}
