use eframe::egui::{self, Rect, Ui};
use signal_graph::Viewport;
use tracing::debug;

use super::super::ViewModel;
use super::super::render_utils::screen_to_layout;

impl ViewModel {
    /// Re-supplies the viewport when the graph area changes size.
    pub(in crate::app) fn sync_viewport(&mut self, rect: Rect) {
        let size = rect.size();
        let unchanged = self
            .view
            .viewport()
            .is_some_and(|viewport| viewport.width == size.x && viewport.height == size.y);
        if unchanged {
            return;
        }

        let result = Viewport::new(size.x, size.y).and_then(|viewport| self.view.set_viewport(viewport));
        match result {
            Ok(run) => {
                debug!(width = size.x, height = size.y, "viewport resized");
                self.run = run.or(self.run);
            }
            Err(error) => self.engine_error = Some(error.to_string()),
        }
    }

    /// Feeds pointer hover and primary clicks back into the view.
    pub(in crate::app) fn handle_pointer(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|position| rect.contains(*position));
        let hovered = pointer.and_then(|position| {
            self.view
                .node_at(screen_to_layout(rect, position))
                .map(str::to_owned)
        });

        if let Some(event) = self.view.hover(hovered.as_deref()) {
            self.dispatch(event);
        }

        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            match hovered.as_deref().and_then(|id| self.view.click(id)) {
                Some(event) => self.dispatch(event),
                None => self.set_selected(None),
            }
        }
    }
}
