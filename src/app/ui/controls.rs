use eframe::egui::{self, RichText, Ui};
use signal_graph::Surface;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Surface");
        ui.add_space(4.0);

        let mut surface = self.surface;
        egui::ComboBox::from_id_salt("surface_select")
            .selected_text(surface.label())
            .show_ui(ui, |ui| {
                for option in Surface::ALL {
                    ui.selectable_value(&mut surface, option, option.label());
                }
            });
        self.switch_surface(surface);

        let config = self.view.config();
        ui.small(format!(
            "{:?} mode, decay {:.4}, charge {:.0}, padding {:.0}",
            config.mode, config.alpha_decay, config.charge_strength, config.collision_padding
        ));

        ui.separator();
        ui.heading("Search");
        ui.add_space(4.0);
        ui.add(egui::TextEdit::singleline(&mut self.search).hint_text("signal title"));
        if let Some(matches) = self.cached_search_matches() {
            ui.small(format!("{} matching signals", matches.len()));
        }

        ui.separator();
        ui.heading("Snapshot");
        ui.add_space(4.0);
        let report = self.view.report();
        if report.is_clean() {
            ui.label("All records ingested.");
        } else {
            ui.label(format!("Dropped signals: {}", report.dropped_nodes()));
            ui.label(format!("Dropped edges: {}", report.dropped_edges()));
            if report.unknown_clusters > 0 {
                ui.label(format!(
                    "Unknown cluster references: {}",
                    report.unknown_clusters
                ));
            }
        }

        if let Some(error) = &self.engine_error {
            ui.separator();
            ui.label(RichText::new(error.as_str()).color(egui::Color32::LIGHT_RED));
        }

        if let Some(event) = &self.last_event {
            ui.separator();
            ui.small(format!("last event: {event}"));
        }
    }
}
