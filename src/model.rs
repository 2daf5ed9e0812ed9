//! Graph data model: the snapshot a host hands to the engine and the
//! indexed, validated graph the engine simulates.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// How pressing a signal is. Drives baseline opacity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Urgent,
    Emerging,
    Monitor,
    #[default]
    Stable,
}

impl Urgency {
    pub fn label(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Emerging => "emerging",
            Self::Monitor => "monitor",
            Self::Stable => "stable",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for Point {
    fn from(value: Vec2) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }
}

impl From<Point> for Vec2 {
    fn from(value: Point) -> Self {
        vec2(value.x, value.y)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_source_count")]
    pub source_count: u32,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub cluster_id: Option<String>,
    /// Explicit radius override; the source-count step function is used
    /// when absent.
    #[serde(default)]
    pub radius: Option<f32>,
    /// Position from a previous layout of the same subgraph.
    #[serde(default)]
    pub pinned: Option<Point>,
}

fn default_source_count() -> u32 {
    1
}

impl SignalRecord {
    pub fn new(id: impl Into<String>, source_count: u32, urgency: Urgency) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            source_count,
            urgency,
            cluster_id: None,
            radius: None,
            pinned: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub signals: Vec<SignalRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub source_id: String,
    pub target_id: String,
    pub weight: f32,
}

impl EdgeRecord {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, weight: f32) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            weight,
        }
    }
}

/// Immutable input for one layout run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub clusters: Vec<ClusterRecord>,
    #[serde(default)]
    pub standalone: Vec<SignalRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl GraphSnapshot {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn signal_count(&self) -> usize {
        self.standalone.len()
            + self
                .clusters
                .iter()
                .map(|cluster| cluster.signals.len())
                .sum::<usize>()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignalNode {
    pub id: String,
    pub title: String,
    /// Index into [`SignalGraph::clusters`]; `None` for standalone signals.
    pub cluster: Option<usize>,
    pub urgency: Urgency,
    pub source_count: u32,
    pub radius_override: Option<f32>,
    pub pinned: Option<Vec2>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignalEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f32,
    pub crosses_cluster: bool,
}

impl SignalEdge {
    pub fn touches(&self, index: usize) -> bool {
        self.source == index || self.target == index
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    /// Position in traversal order; drives color and angular placement.
    pub ordinal: usize,
    pub members: Vec<usize>,
}

/// Counts of input records discarded during ingestion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub duplicate_nodes: usize,
    pub invalid_radius: usize,
    pub unknown_clusters: usize,
    pub dangling_edges: usize,
    pub self_edges: usize,
    pub invalid_weights: usize,
    pub duplicate_edges: usize,
}

impl IngestReport {
    pub fn dropped_nodes(&self) -> usize {
        self.duplicate_nodes + self.invalid_radius
    }

    pub fn dropped_edges(&self) -> usize {
        self.dangling_edges + self.self_edges + self.invalid_weights + self.duplicate_edges
    }

    pub fn is_clean(&self) -> bool {
        self.dropped_nodes() == 0 && self.dropped_edges() == 0 && self.unknown_clusters == 0
    }
}

/// Validated, index-addressed graph. Never mutated after ingestion.
#[derive(Clone, Debug, Default)]
pub struct SignalGraph {
    pub nodes: Vec<SignalNode>,
    pub edges: Vec<SignalEdge>,
    pub clusters: Vec<Cluster>,
    index_by_id: HashMap<String, usize>,
    cluster_by_id: HashMap<String, usize>,
}

impl SignalGraph {
    pub fn ingest(snapshot: &GraphSnapshot) -> (Self, IngestReport) {
        let mut graph = Self::default();
        let mut report = IngestReport::default();

        for record in &snapshot.clusters {
            if graph.cluster_by_id.contains_key(&record.id) {
                continue;
            }
            let ordinal = graph.clusters.len();
            graph.cluster_by_id.insert(record.id.clone(), ordinal);
            graph.clusters.push(Cluster {
                id: record.id.clone(),
                name: record.name.clone(),
                ordinal,
                members: Vec::new(),
            });
        }

        for record in &snapshot.clusters {
            let cluster = graph.cluster_by_id.get(&record.id).copied();
            for signal in &record.signals {
                graph.push_node(signal, cluster, &mut report);
            }
        }

        for signal in &snapshot.standalone {
            let cluster = match signal.cluster_id.as_deref() {
                Some(cluster_id) => {
                    let resolved = graph.cluster_by_id.get(cluster_id).copied();
                    if resolved.is_none() {
                        debug!(
                            signal = %signal.id,
                            cluster = cluster_id,
                            "unknown cluster reference, treating signal as standalone"
                        );
                        report.unknown_clusters += 1;
                    }
                    resolved
                }
                None => None,
            };
            graph.push_node(signal, cluster, &mut report);
        }

        let mut seen_pairs = HashSet::new();
        for edge in &snapshot.edges {
            let (Some(&source), Some(&target)) = (
                graph.index_by_id.get(&edge.source_id),
                graph.index_by_id.get(&edge.target_id),
            ) else {
                debug!(
                    source = %edge.source_id,
                    target = %edge.target_id,
                    "dropping edge with dangling endpoint"
                );
                report.dangling_edges += 1;
                continue;
            };

            if source == target {
                debug!(signal = %edge.source_id, "dropping self edge");
                report.self_edges += 1;
                continue;
            }

            if !edge.weight.is_finite() {
                debug!(
                    source = %edge.source_id,
                    target = %edge.target_id,
                    "dropping edge with non-finite weight"
                );
                report.invalid_weights += 1;
                continue;
            }

            if !seen_pairs.insert((source.min(target), source.max(target))) {
                report.duplicate_edges += 1;
                continue;
            }

            let source_cluster = graph.nodes[source].cluster;
            let target_cluster = graph.nodes[target].cluster;
            let crosses_cluster = source_cluster.is_none() || source_cluster != target_cluster;

            graph.edges.push(SignalEdge {
                source,
                target,
                weight: edge.weight.clamp(0.0, 1.0),
                crosses_cluster,
            });
        }

        (graph, report)
    }

    fn push_node(
        &mut self,
        signal: &SignalRecord,
        cluster: Option<usize>,
        report: &mut IngestReport,
    ) {
        if self.index_by_id.contains_key(&signal.id) {
            debug!(signal = %signal.id, "dropping duplicate signal id");
            report.duplicate_nodes += 1;
            return;
        }

        if let Some(radius) = signal.radius
            && !(radius.is_finite() && radius > 0.0)
        {
            debug!(signal = %signal.id, radius, "dropping signal with non-positive radius");
            report.invalid_radius += 1;
            return;
        }

        let pinned = signal
            .pinned
            .filter(|point| point.x.is_finite() && point.y.is_finite())
            .map(Vec2::from);

        let index = self.nodes.len();
        self.index_by_id.insert(signal.id.clone(), index);
        if let Some(cluster) = cluster {
            self.clusters[cluster].members.push(index);
        }
        self.nodes.push(SignalNode {
            id: signal.id.clone(),
            title: if signal.title.is_empty() {
                signal.id.clone()
            } else {
                signal.title.clone()
            },
            cluster,
            urgency: signal.urgency,
            source_count: signal.source_count,
            radius_override: signal.radius,
            pinned,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&SignalNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn pinned_fraction(&self) -> f32 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        let pinned = self.nodes.iter().filter(|node| node.pinned.is_some()).count();
        pinned as f32 / self.nodes.len() as f32
    }

    /// Copy of the graph with every node pinned at the supplied position
    /// when one exists for its id.
    pub fn with_pins(&self, positions: &HashMap<String, Point>) -> Self {
        let mut graph = self.clone();
        for node in &mut graph.nodes {
            if let Some(point) = positions.get(&node.id)
                && point.x.is_finite()
                && point.y.is_finite()
            {
                node.pinned = Some(Vec2::from(*point));
            }
        }
        graph
    }
}
