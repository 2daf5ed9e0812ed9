use eframe::egui::{self, Align, Context, Layout};
use signal_graph::{GraphEvent, GraphSnapshot, GraphView, HighlightStyle, Surface};
use tracing::{debug, warn};

use super::super::{LaunchOptions, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(
        options: LaunchOptions,
        snapshot: GraphSnapshot,
    ) -> signal_graph::Result<Self> {
        let surface = options.surface;
        let view = GraphView::new(options.config_for(surface)?, HighlightStyle::default())?;

        let mut model = Self {
            options,
            snapshot,
            surface,
            view,
            run: None,
            search: String::new(),
            search_match_cache: None,
            selected: None,
            last_event: None,
            engine_error: None,
        };
        model.restart();
        Ok(model)
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("signal-graph");
                    ui.separator();
                    ui.label(format!("source: {}", self.options.source_label()));
                    ui.label(format!("signals: {}", self.view.graph().nodes.len()));
                    ui.label(format!("edges: {}", self.view.graph().edges.len()));
                    ui.label(format!("clusters: {}", self.view.graph().clusters.len()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload snapshot"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Restart layout").clicked() {
                        self.restart();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.run_status_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Loading signal graph...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }

    /// Loads the snapshot into the current view, cancelling the running layout.
    pub(in crate::app) fn restart(&mut self) {
        match self.view.load(&self.snapshot) {
            Ok(run) => {
                self.run = Some(run);
                self.engine_error = None;
            }
            Err(error) => {
                warn!(%error, "failed to start layout");
                self.run = None;
                self.engine_error = Some(error.to_string());
            }
        }
        self.search_match_cache = None;
    }

    pub(in crate::app) fn replace_snapshot(&mut self, snapshot: GraphSnapshot) {
        self.snapshot = snapshot;
        if self
            .selected
            .as_deref()
            .is_some_and(|id| !self.snapshot_contains(id))
        {
            self.selected = None;
        }
        self.restart();
    }

    fn snapshot_contains(&self, id: &str) -> bool {
        self.snapshot
            .clusters
            .iter()
            .flat_map(|cluster| cluster.signals.iter())
            .chain(self.snapshot.standalone.iter())
            .any(|signal| signal.id == id)
    }

    pub(in crate::app) fn switch_surface(&mut self, surface: Surface) {
        if surface == self.surface {
            return;
        }

        let config = match self.options.config_for(surface) {
            Ok(config) => config,
            Err(error) => {
                self.engine_error = Some(error.to_string());
                return;
            }
        };
        match GraphView::new(config, HighlightStyle::default()) {
            Ok(view) => {
                self.view.unmount();
                self.view = view;
                self.surface = surface;
                self.restart();
            }
            Err(error) => self.engine_error = Some(error.to_string()),
        }
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        self.selected = selected;
    }

    /// Plays the host side of an engine event.
    pub(in crate::app) fn dispatch(&mut self, event: GraphEvent) {
        debug!(?event, "graph event");
        match &event {
            GraphEvent::NodeClick(id) => {
                self.set_selected(Some(id.clone()));
                self.last_event = Some(format!("click {id}"));
            }
            GraphEvent::NodeHover(Some(id)) => self.last_event = Some(format!("hover {id}")),
            GraphEvent::NodeHover(None) => self.last_event = Some("hover cleared".to_owned()),
            GraphEvent::Back => {
                self.set_selected(None);
                self.last_event = Some("back".to_owned());
            }
        }
    }

    fn run_status_text(&self) -> String {
        match self.view.simulation() {
            Some(simulation) => format!(
                "{}  |  {:?}  |  tick {}  |  alpha {:.4}",
                self.surface.label(),
                simulation.status(),
                simulation.ticks(),
                simulation.alpha()
            ),
            None => format!("{}  |  waiting for viewport", self.surface.label()),
        }
    }
}
