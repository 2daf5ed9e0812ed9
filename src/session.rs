//! One surface's view of the engine: owns the current run, hands out run
//! ids so stale schedules can be recognized, and turns host input into
//! events.

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use tracing::{debug, info, warn};

use crate::config::{ExecutionMode, HighlightStyle, SimulationConfig, Surface};
use crate::error::{EngineError, Result};
use crate::frame::{FrameInputs, RenderFrame};
use crate::highlight::{AdjacencyIndex, TooltipTracker, VisualState, visual_state};
use crate::labels::{LabelBox, cluster_labels, edge_labels};
use crate::layout::Viewport;
use crate::model::{GraphSnapshot, IngestReport, Point, SignalGraph};
use crate::physics::{Simulation, SimulationStatus};

/// Identifies one layout run. A host schedule holding an older id has been
/// cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u64);

impl RunId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// One tick ran; the run is in the reported state afterwards.
    Advanced(SimulationStatus),
    /// The run had already finished; nothing moved.
    Finished(SimulationStatus),
    /// No usable viewport or nothing loaded yet.
    Skipped,
    /// The id belongs to a superseded or unmounted run.
    Cancelled,
}

/// Callbacks for the host, returned from input methods.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphEvent {
    NodeClick(String),
    NodeHover(Option<String>),
    Back,
}

pub struct GraphView {
    config: SimulationConfig,
    style: HighlightStyle,
    viewport: Option<Viewport>,
    graph: SignalGraph,
    report: IngestReport,
    adjacency: AdjacencyIndex,
    simulation: Option<Simulation>,
    current_run: Option<RunId>,
    next_run: u64,
    hovered: Option<usize>,
    tooltip: TooltipTracker,
    cluster_labels: Vec<LabelBox>,
    edge_labels: Vec<LabelBox>,
}

impl GraphView {
    pub fn new(config: SimulationConfig, style: HighlightStyle) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            style,
            viewport: None,
            graph: SignalGraph::default(),
            report: IngestReport::default(),
            adjacency: AdjacencyIndex::default(),
            simulation: None,
            current_run: None,
            next_run: 0,
            hovered: None,
            tooltip: TooltipTracker::default(),
            cluster_labels: Vec::new(),
            edge_labels: Vec::new(),
        })
    }

    pub fn for_surface(surface: Surface) -> Result<Self> {
        Self::new(surface.config(), HighlightStyle::default())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn style(&self) -> &HighlightStyle {
        &self.style
    }

    pub fn graph(&self) -> &SignalGraph {
        &self.graph
    }

    pub fn report(&self) -> IngestReport {
        self.report
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    pub fn status(&self) -> SimulationStatus {
        self.simulation
            .as_ref()
            .map_or(SimulationStatus::Idle, Simulation::status)
    }

    pub fn current_run(&self) -> Option<RunId> {
        self.current_run
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn adjacency(&self) -> &AdjacencyIndex {
        &self.adjacency
    }

    /// Replaces the graph and starts a fresh run, cancelling any run in
    /// flight. Batch surfaces finish before this returns.
    pub fn load(&mut self, snapshot: &GraphSnapshot) -> Result<RunId> {
        let (graph, report) = SignalGraph::ingest(snapshot);
        if !report.is_clean() {
            info!(
                dropped_nodes = report.dropped_nodes(),
                dropped_edges = report.dropped_edges(),
                unknown_clusters = report.unknown_clusters,
                "snapshot ingested with drops"
            );
        }
        self.report = report;
        self.replace_graph(graph)
    }

    /// Like [`Self::load`], pinning every signal found in `positions`, so a
    /// reopened view continues from its previous layout.
    pub fn load_with_positions(
        &mut self,
        snapshot: &GraphSnapshot,
        positions: &HashMap<String, Point>,
    ) -> Result<RunId> {
        let (graph, report) = SignalGraph::ingest(snapshot);
        self.report = report;
        self.replace_graph(graph.with_pins(positions))
    }

    fn replace_graph(&mut self, graph: SignalGraph) -> Result<RunId> {
        self.cancel_current();
        self.adjacency = AdjacencyIndex::build(&graph);
        self.graph = graph;
        self.hovered = None;
        self.tooltip.clear();
        self.start_run(&self.graph.clone())
    }

    /// Restarts the current graph from scratch.
    pub fn restart(&mut self) -> Result<RunId> {
        self.cancel_current();
        self.start_run(&self.graph.clone())
    }

    /// Supplies a new viewport. An existing layout is carried over with
    /// every node pinned at its position rescaled into the new bounds.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<Option<RunId>> {
        let previous = self.viewport.replace(viewport);
        if previous == Some(viewport) {
            return Ok(self.current_run);
        }
        if viewport.is_empty() {
            debug!(
                width = viewport.width,
                height = viewport.height,
                "empty viewport, simulation paused"
            );
            return Ok(self.current_run);
        }
        if self.current_run.is_none() {
            debug!(
                width = viewport.width,
                height = viewport.height,
                "viewport recorded, nothing loaded"
            );
            return Ok(None);
        }

        // Rescale from the bounds that were last simulated; an empty
        // viewport in between never replaced them.
        let carried = self.simulation.as_ref().map(|simulation| {
            let old = simulation.viewport();
            let ratio = vec2(viewport.width / old.width, viewport.height / old.height);
            let positions = self
                .graph
                .nodes
                .iter()
                .zip(simulation.bodies())
                .map(|(node, body)| (node.id.clone(), Point::from(body.position * ratio)))
                .collect::<HashMap<_, _>>();
            self.graph.with_pins(&positions)
        });

        self.cancel_current();
        let graph = carried.unwrap_or_else(|| self.graph.clone());
        self.start_run(&graph).map(Some)
    }

    fn cancel_current(&mut self) {
        if let Some(run) = self.current_run.take() {
            if let Some(simulation) = self.simulation.as_mut() {
                simulation.stop();
            }
            info!(run = run.get(), "layout run cancelled");
        }
        self.simulation = None;
        self.cluster_labels.clear();
        self.edge_labels.clear();
    }

    fn start_run(&mut self, graph: &SignalGraph) -> Result<RunId> {
        let run = RunId(self.next_run);
        self.next_run += 1;
        self.current_run = Some(run);

        let Some(viewport) = self.viewport.filter(|viewport| !viewport.is_empty()) else {
            debug!(run = run.get(), "run deferred until a viewport arrives");
            return Ok(run);
        };

        let mut simulation = Simulation::new(graph, viewport, self.config.clone())?;
        if self.config.mode == ExecutionMode::Batch {
            simulation.run_batch();
        }
        self.simulation = Some(simulation);
        self.refresh_labels();
        self.retarget_tooltip();
        Ok(run)
    }

    /// Advances the run identified by `run` by one tick.
    pub fn tick(&mut self, run: RunId) -> Result<TickOutcome> {
        if self.current_run != Some(run) {
            return Ok(TickOutcome::Cancelled);
        }
        let Some(viewport) = self.viewport else {
            warn!(run = run.get(), "tick requested before any viewport was supplied");
            return Err(EngineError::MissingViewport);
        };
        if viewport.is_empty() {
            return Ok(TickOutcome::Skipped);
        }
        let Some(simulation) = self.simulation.as_mut() else {
            return Ok(TickOutcome::Skipped);
        };

        if simulation.status().is_finished() {
            return Ok(TickOutcome::Finished(simulation.status()));
        }

        let status = simulation.tick();
        self.tooltip.follow(
            status,
            simulation.bodies(),
            self.style.hover_scale,
            self.style.tooltip_gap,
        );
        self.refresh_labels();
        Ok(TickOutcome::Advanced(status))
    }

    /// Cluster labels follow the layout every tick; edge captions are placed
    /// once the layout is final.
    fn refresh_labels(&mut self) {
        let Some(simulation) = self.simulation.as_ref() else {
            return;
        };
        self.cluster_labels = cluster_labels(
            &self.graph,
            simulation.bodies(),
            simulation.viewport(),
            &self.style,
        );
        self.edge_labels = if simulation.status().is_finished() {
            edge_labels(&self.graph, simulation.bodies(), &self.style)
        } else {
            Vec::new()
        };
    }

    fn retarget_tooltip(&mut self) {
        let bodies = self
            .simulation
            .as_ref()
            .map_or(&[][..], Simulation::bodies);
        self.tooltip.retarget(
            self.hovered,
            bodies,
            self.style.hover_scale,
            self.style.tooltip_gap,
        );
    }

    /// Stops the schedule; any later tick with the old id is cancelled.
    pub fn unmount(&mut self) {
        self.cancel_current();
        self.hovered = None;
        self.tooltip.clear();
    }

    /// Sets the hover target. Returns an event only when it changed.
    pub fn hover(&mut self, id: Option<&str>) -> Option<GraphEvent> {
        let index = id.and_then(|id| self.graph.index_of(id));
        if index == self.hovered {
            return None;
        }
        self.hovered = index;
        self.retarget_tooltip();
        Some(GraphEvent::NodeHover(
            index.map(|index| self.graph.nodes[index].id.clone()),
        ))
    }

    pub fn click(&self, id: &str) -> Option<GraphEvent> {
        self.graph
            .node(id)
            .map(|node| GraphEvent::NodeClick(node.id.clone()))
    }

    pub fn back(&self) -> GraphEvent {
        GraphEvent::Back
    }

    /// The signal whose drawn disc contains `point`, nearest center first.
    pub fn node_at(&self, point: Vec2) -> Option<&str> {
        let simulation = self.simulation.as_ref()?;
        simulation
            .bodies()
            .iter()
            .enumerate()
            .filter_map(|(index, body)| {
                let scale = if self.hovered == Some(index) {
                    self.style.hover_scale
                } else {
                    1.0
                };
                let distance_sq = (body.position - point).length_sq();
                let reach = body.radius * scale;
                (distance_sq <= reach * reach).then_some((index, distance_sq))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| self.graph.nodes[index].id.as_str())
    }

    /// Current positions by signal id, suitable for [`Self::load_with_positions`].
    pub fn positions(&self) -> HashMap<String, Point> {
        let Some(simulation) = self.simulation.as_ref() else {
            return HashMap::new();
        };
        self.graph
            .nodes
            .iter()
            .zip(simulation.bodies())
            .map(|(node, body)| (node.id.clone(), Point::from(body.position)))
            .collect()
    }

    pub fn visual_state(&self) -> VisualState {
        visual_state(&self.graph, &self.adjacency, self.hovered, &self.style)
    }

    pub fn tooltip_anchor(&self) -> Option<Vec2> {
        self.tooltip.anchor()
    }

    pub fn cluster_labels(&self) -> &[LabelBox] {
        &self.cluster_labels
    }

    pub fn edge_labels(&self) -> &[LabelBox] {
        &self.edge_labels
    }

    /// Draw-ready snapshot of the current state, or `None` before the first
    /// run has a viewport.
    pub fn frame(&self) -> Option<RenderFrame> {
        let simulation = self.simulation.as_ref()?;
        let state = self.visual_state();
        let tooltip = self
            .tooltip
            .target()
            .zip(self.tooltip.anchor())
            .map(|(index, anchor)| (index, Point::from(anchor)));

        Some(RenderFrame::build(FrameInputs {
            graph: &self.graph,
            bodies: simulation.bodies(),
            state: &state,
            cluster_labels: &self.cluster_labels,
            edge_labels: &self.edge_labels,
            tooltip,
            status: simulation.status(),
            tick: simulation.ticks(),
            alpha: simulation.alpha(),
        }))
    }
}
