//! Draw-ready output for one tick, independent of any drawing backend.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::highlight::{VisualState, visible_labels};
use crate::labels::LabelBox;
use crate::model::{Point, SignalGraph};
use crate::physics::{Body, SimulationStatus};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFrame {
    pub x: f32,
    pub y: f32,
    /// Drawn radius, hover emphasis included.
    pub radius: f32,
    pub visual_opacity: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeFrame {
    pub source_id: String,
    pub target_id: String,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub opacity: f32,
    pub stroke_width: f32,
    pub dashed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelFrame {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
}

impl LabelFrame {
    fn from_box(label: &LabelBox, opacity: f32) -> Self {
        Self {
            text: label.text.clone(),
            x: label.center.x,
            y: label.center.y,
            width: label.size.x,
            height: label.size.y,
            opacity,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipFrame {
    pub signal_id: String,
    pub title: String,
    pub anchor: Point,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStatus {
    Idle,
    Running,
    Converged,
    Stopped,
}

impl From<SimulationStatus> for FrameStatus {
    fn from(value: SimulationStatus) -> Self {
        match value {
            SimulationStatus::Idle => Self::Idle,
            SimulationStatus::Running => Self::Running,
            SimulationStatus::Converged => Self::Converged,
            SimulationStatus::Stopped => Self::Stopped,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame {
    pub status: FrameStatus,
    pub tick: usize,
    pub alpha: f32,
    pub nodes: BTreeMap<String, NodeFrame>,
    pub edges: Vec<EdgeFrame>,
    pub cluster_labels: Vec<LabelFrame>,
    pub edge_labels: Vec<LabelFrame>,
    pub tooltip: Option<TooltipFrame>,
}

/// Everything the frame is assembled from; borrowed for the duration of
/// one build.
pub struct FrameInputs<'a> {
    pub graph: &'a SignalGraph,
    pub bodies: &'a [Body],
    pub state: &'a VisualState,
    pub cluster_labels: &'a [LabelBox],
    pub edge_labels: &'a [LabelBox],
    pub tooltip: Option<(usize, Point)>,
    pub status: SimulationStatus,
    pub tick: usize,
    pub alpha: f32,
}

impl RenderFrame {
    pub fn build(inputs: FrameInputs<'_>) -> Self {
        let FrameInputs {
            graph,
            bodies,
            state,
            cluster_labels,
            edge_labels,
            tooltip,
            status,
            tick,
            alpha,
        } = inputs;

        let nodes = graph
            .nodes
            .iter()
            .zip(bodies)
            .zip(&state.nodes)
            .map(|((node, body), visual)| {
                (
                    node.id.clone(),
                    NodeFrame {
                        x: body.position.x,
                        y: body.position.y,
                        radius: body.radius * visual.scale,
                        visual_opacity: visual.opacity,
                    },
                )
            })
            .collect();

        let edges = graph
            .edges
            .iter()
            .zip(&state.edges)
            .map(|(edge, visual)| {
                let (from, to) = (bodies[edge.source].position, bodies[edge.target].position);
                EdgeFrame {
                    source_id: graph.nodes[edge.source].id.clone(),
                    target_id: graph.nodes[edge.target].id.clone(),
                    x1: from.x,
                    y1: from.y,
                    x2: to.x,
                    y2: to.y,
                    opacity: visual.opacity,
                    stroke_width: visual.stroke_width,
                    dashed: visual.dashed,
                }
            })
            .collect();

        let labels = |boxes: &[LabelBox]| {
            visible_labels(boxes, state)
                .map(|(label, visual)| LabelFrame::from_box(label, visual.opacity))
                .collect::<Vec<_>>()
        };

        let tooltip = tooltip.and_then(|(index, anchor)| {
            graph.nodes.get(index).map(|node| TooltipFrame {
                signal_id: node.id.clone(),
                title: node.title.clone(),
                anchor,
            })
        });

        Self {
            status: status.into(),
            tick,
            alpha,
            nodes,
            edges,
            cluster_labels: labels(cluster_labels),
            edge_labels: labels(edge_labels),
            tooltip,
        }
    }

    pub fn to_json_pretty(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
