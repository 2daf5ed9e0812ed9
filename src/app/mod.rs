use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};
use signal_graph::demo::briefing_snapshot;
use signal_graph::{GraphSnapshot, GraphView, RunId, SimulationConfig, Surface};

mod graph;
mod render_utils;
mod ui;

const DEMO_SEED: u64 = 7;

/// Everything the viewer needs to (re)build a surface.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub snapshot_path: Option<PathBuf>,
    pub surface: Surface,
    /// Raw JSON tuning overrides, applied on top of every surface preset.
    pub tuning: Option<String>,
    pub seed: Option<u64>,
}

impl LaunchOptions {
    pub fn config_for(&self, surface: Surface) -> signal_graph::Result<SimulationConfig> {
        let mut config = match &self.tuning {
            Some(raw) => surface.config().merge_json(raw)?,
            None => surface.config(),
        };
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }

    pub fn load_snapshot(&self) -> signal_graph::Result<GraphSnapshot> {
        match &self.snapshot_path {
            Some(path) => GraphSnapshot::load(path),
            None => Ok(briefing_snapshot(self.seed.unwrap_or(DEMO_SEED))),
        }
    }

    fn source_label(&self) -> String {
        self.snapshot_path.as_ref().map_or_else(
            || "generated briefing".to_owned(),
            |path| path.display().to_string(),
        )
    }
}

pub struct SignalGraphApp {
    options: LaunchOptions,
    state: AppState,
    reload_rx: Option<Receiver<Result<GraphSnapshot, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<GraphSnapshot, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    options: LaunchOptions,
    snapshot: GraphSnapshot,
    surface: Surface,
    view: GraphView,
    run: Option<RunId>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    selected: Option<String>,
    last_event: Option<String>,
    engine_error: Option<String>,
}

struct SearchMatchCache {
    query: String,
    run: Option<RunId>,
    matches: Arc<HashSet<usize>>,
}

impl SignalGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, options: LaunchOptions) -> Self {
        let state = Self::start_load(&options);
        Self {
            options,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(options: &LaunchOptions) -> Receiver<Result<GraphSnapshot, String>> {
        let (tx, rx) = mpsc::channel();
        let options = options.clone();

        thread::spawn(move || {
            let result = options.load_snapshot().map_err(|error| error.to_string());
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(options: &LaunchOptions) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(options),
        }
    }

    fn ready_state(options: &LaunchOptions, snapshot: GraphSnapshot) -> AppState {
        match ViewModel::new(options.clone(), snapshot) {
            Ok(model) => AppState::Ready(Box::new(model)),
            Err(error) => AppState::Error(error.to_string()),
        }
    }
}

impl eframe::App for SignalGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(match result {
                            Ok(snapshot) => Self::ready_state(&self.options, snapshot),
                            Err(error) => AppState::Error(error),
                        });
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(AppState::Error(
                            "Background load worker disconnected".to_owned(),
                        ));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading signal graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load signal graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.options));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(&self.options));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(snapshot)) => model.replace_snapshot(snapshot),
                        Ok(Err(error)) => transition = Some(AppState::Error(error)),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            if let AppState::Ready(model) = &mut self.state {
                model.view.unmount();
            }
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
