//! Interaction & highlight controller. Visual state is a pure function of
//! the graph, its adjacency index and the hovered node.

use std::collections::HashSet;

use eframe::egui::{Vec2, vec2};

use crate::config::HighlightStyle;
use crate::labels::{LabelBox, LabelKey};
use crate::model::{SignalGraph, Urgency};
use crate::physics::{Body, SimulationStatus};

/// Neighbor sets per node, built once per snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdjacencyIndex {
    neighbors: Vec<HashSet<usize>>,
}

impl AdjacencyIndex {
    pub fn build(graph: &SignalGraph) -> Self {
        let mut neighbors = vec![HashSet::new(); graph.nodes.len()];
        for edge in &graph.edges {
            neighbors[edge.source].insert(edge.target);
            neighbors[edge.target].insert(edge.source);
        }
        Self { neighbors }
    }

    pub fn neighbors(&self, index: usize) -> Option<&HashSet<usize>> {
        self.neighbors.get(index)
    }

    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        self.neighbors
            .get(a)
            .is_some_and(|neighbors| neighbors.contains(&b))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    /// The hovered node and its incident edges.
    Focus,
    Connected,
    Dimmed,
    /// No hover active.
    Baseline,
    Hidden,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeVisual {
    pub tier: Tier,
    pub opacity: f32,
    /// Radius multiplier.
    pub scale: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeVisual {
    pub tier: Tier,
    pub opacity: f32,
    pub stroke_width: f32,
    pub dashed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelVisual {
    pub tier: Tier,
    pub opacity: f32,
}

/// Per-element visual state, indexed like the graph's nodes and edges.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualState {
    pub hovered: Option<usize>,
    pub nodes: Vec<NodeVisual>,
    pub edges: Vec<EdgeVisual>,
    /// Indexed like the graph's clusters.
    pub clusters: Vec<LabelVisual>,
}

impl VisualState {
    pub fn label(&self, key: LabelKey) -> LabelVisual {
        match key {
            LabelKey::Cluster(index) => self.clusters.get(index).copied().unwrap_or(LabelVisual {
                tier: Tier::Hidden,
                opacity: 0.0,
            }),
            LabelKey::Edge(index) => match self.edges.get(index) {
                Some(edge) if edge.tier == Tier::Dimmed => LabelVisual {
                    tier: Tier::Hidden,
                    opacity: 0.0,
                },
                Some(edge) => LabelVisual {
                    tier: edge.tier,
                    opacity: 1.0,
                },
                None => LabelVisual {
                    tier: Tier::Hidden,
                    opacity: 0.0,
                },
            },
        }
    }
}

pub fn baseline_opacity(urgency: Urgency, style: &HighlightStyle) -> f32 {
    match urgency {
        Urgency::Urgent => style.urgent_opacity,
        Urgency::Emerging => style.emerging_opacity,
        Urgency::Monitor => style.monitor_opacity,
        Urgency::Stable => style.stable_opacity,
    }
}

fn baseline_edge(weight: f32, crosses_cluster: bool, style: &HighlightStyle) -> EdgeVisual {
    let weight = weight.clamp(0.0, 1.0);
    let attenuation = if crosses_cluster {
        style.cross_cluster_attenuation
    } else {
        1.0
    };
    EdgeVisual {
        tier: Tier::Baseline,
        opacity: (style.edge_min_opacity
            + (style.edge_max_opacity - style.edge_min_opacity) * weight)
            * attenuation,
        stroke_width: (style.edge_min_width
            + (style.edge_max_width - style.edge_min_width) * weight)
            * attenuation,
        dashed: crosses_cluster,
    }
}

/// Resolves every node and edge to a tier for the given hover target.
/// An index outside the graph is treated as no hover.
pub fn visual_state(
    graph: &SignalGraph,
    adjacency: &AdjacencyIndex,
    hovered: Option<usize>,
    style: &HighlightStyle,
) -> VisualState {
    let hovered = hovered.filter(|index| *index < graph.nodes.len());

    let nodes = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| match hovered {
            None => NodeVisual {
                tier: Tier::Baseline,
                opacity: baseline_opacity(node.urgency, style),
                scale: 1.0,
            },
            Some(focus) if focus == index => NodeVisual {
                tier: Tier::Focus,
                opacity: 1.0,
                scale: style.hover_scale,
            },
            Some(focus) if adjacency.are_adjacent(focus, index) => NodeVisual {
                tier: Tier::Connected,
                opacity: style.connected_opacity,
                scale: 1.0,
            },
            Some(_) => NodeVisual {
                tier: Tier::Dimmed,
                opacity: style.dimmed_opacity,
                scale: 1.0,
            },
        })
        .collect();

    let edges = graph
        .edges
        .iter()
        .map(|edge| {
            let baseline = baseline_edge(edge.weight, edge.crosses_cluster, style);
            match hovered {
                None => baseline,
                Some(focus) if edge.touches(focus) => EdgeVisual {
                    tier: Tier::Focus,
                    opacity: style.edge_focus_opacity,
                    ..baseline
                },
                Some(_) => EdgeVisual {
                    tier: Tier::Dimmed,
                    opacity: style.edge_dimmed_opacity,
                    ..baseline
                },
            }
        })
        .collect();

    let clusters = (0..graph.clusters.len())
        .map(|cluster| {
            let Some(focus) = hovered else {
                return LabelVisual {
                    tier: Tier::Baseline,
                    opacity: 1.0,
                };
            };
            let touched_by_neighbor = adjacency
                .neighbors(focus)
                .into_iter()
                .flatten()
                .any(|&neighbor| graph.nodes[neighbor].cluster == Some(cluster));
            if graph.nodes[focus].cluster == Some(cluster) {
                LabelVisual {
                    tier: Tier::Focus,
                    opacity: 1.0,
                }
            } else if touched_by_neighbor {
                LabelVisual {
                    tier: Tier::Connected,
                    opacity: style.connected_opacity,
                }
            } else {
                LabelVisual {
                    tier: Tier::Dimmed,
                    opacity: style.dimmed_opacity,
                }
            }
        })
        .collect();

    VisualState {
        hovered,
        nodes,
        edges,
        clusters,
    }
}

/// Keeps only labels visible under `state`.
pub fn visible_labels<'a>(
    labels: &'a [LabelBox],
    state: &'a VisualState,
) -> impl Iterator<Item = (&'a LabelBox, LabelVisual)> + 'a {
    labels
        .iter()
        .map(|label| (label, state.label(label.key)))
        .filter(|(_, visual)| visual.tier != Tier::Hidden)
}

/// Tooltip anchor for the hovered node: tracks the node while the run is
/// live, then stays where it was when the run finished.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TooltipTracker {
    target: Option<usize>,
    anchor: Option<Vec2>,
}

impl TooltipTracker {
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    pub fn anchor(&self) -> Option<Vec2> {
        self.anchor
    }

    pub fn clear(&mut self) {
        self.target = None;
        self.anchor = None;
    }

    /// Points the tooltip at `target`, anchoring immediately.
    pub fn retarget(&mut self, target: Option<usize>, bodies: &[Body], scale: f32, gap: f32) {
        self.target = target;
        self.anchor = target
            .and_then(|index| bodies.get(index))
            .map(|body| anchor_above(body, scale, gap));
    }

    /// Re-anchors after a tick unless the run has finished.
    pub fn follow(&mut self, status: SimulationStatus, bodies: &[Body], scale: f32, gap: f32) {
        if status.is_finished() {
            return;
        }
        if let Some(body) = self.target.and_then(|index| bodies.get(index)) {
            self.anchor = Some(anchor_above(body, scale, gap));
        }
    }
}

fn anchor_above(body: &Body, scale: f32, gap: f32) -> Vec2 {
    body.position - vec2(0.0, body.radius * scale + gap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClusterRecord, EdgeRecord, GraphSnapshot, SignalRecord};

    fn graph() -> SignalGraph {
        let snapshot = GraphSnapshot {
            clusters: vec![ClusterRecord {
                id: "c1".into(),
                name: "C1".into(),
                signals: vec![
                    SignalRecord::new("a", 1, Urgency::Urgent),
                    SignalRecord::new("b", 1, Urgency::Stable),
                    SignalRecord::new("c", 1, Urgency::Monitor),
                ],
            }],
            standalone: vec![SignalRecord::new("d", 1, Urgency::Stable)],
            edges: vec![
                EdgeRecord::new("a", "b", 0.5),
                EdgeRecord::new("b", "c", 0.8),
                EdgeRecord::new("c", "d", 0.8),
            ],
        };
        SignalGraph::ingest(&snapshot).0
    }

    fn body(x: f32, y: f32) -> Body {
        Body {
            position: vec2(x, y),
            velocity: Vec2::ZERO,
            radius: 10.0,
            anchor: vec2(x, y),
            cluster: None,
        }
    }

    #[test]
    fn test_baseline_follows_urgency() {
        let graph = graph();
        let style = HighlightStyle::default();
        let state = visual_state(&graph, &AdjacencyIndex::build(&graph), None, &style);

        assert!(state.nodes.iter().all(|node| node.tier == Tier::Baseline));
        assert!(state.nodes[0].opacity > state.nodes[1].opacity);
        assert_eq!(state.nodes[2].opacity, style.monitor_opacity);
    }

    #[test]
    fn test_hover_marks_neighbors_connected() {
        let graph = graph();
        let style = HighlightStyle::default();
        let adjacency = AdjacencyIndex::build(&graph);
        let b = graph.index_of("b").expect("b present");

        let state = visual_state(&graph, &adjacency, Some(b), &style);
        let tiers = state.nodes.iter().map(|node| node.tier).collect::<Vec<_>>();

        assert_eq!(
            tiers,
            vec![Tier::Connected, Tier::Focus, Tier::Connected, Tier::Dimmed]
        );
        assert_eq!(state.nodes[b].scale, style.hover_scale);
        assert_eq!(state.edges[0].tier, Tier::Focus);
        assert_eq!(state.edges[2].tier, Tier::Dimmed);
        assert_eq!(state.label(LabelKey::Edge(2)).tier, Tier::Hidden);
        assert_eq!(state.label(LabelKey::Edge(1)).tier, Tier::Focus);
    }

    #[test]
    fn test_cluster_labels_follow_hover() {
        let graph = graph();
        let style = HighlightStyle::default();
        let adjacency = AdjacencyIndex::build(&graph);
        let index = |id: &str| graph.index_of(id).expect("signal present");

        let idle = visual_state(&graph, &adjacency, None, &style);
        assert_eq!(idle.label(LabelKey::Cluster(0)).tier, Tier::Baseline);

        let member = visual_state(&graph, &adjacency, Some(index("a")), &style);
        assert_eq!(member.label(LabelKey::Cluster(0)).tier, Tier::Focus);

        let neighbor = visual_state(&graph, &adjacency, Some(index("d")), &style);
        assert_eq!(neighbor.label(LabelKey::Cluster(0)).tier, Tier::Connected);
        assert_eq!(neighbor.label(LabelKey::Cluster(0)).opacity, style.connected_opacity);
        assert_eq!(neighbor.label(LabelKey::Cluster(7)).tier, Tier::Hidden);

        let mut isolated = GraphSnapshot {
            clusters: vec![ClusterRecord {
                id: "c1".into(),
                name: "C1".into(),
                signals: vec![SignalRecord::new("a", 1, Urgency::Urgent)],
            }],
            standalone: vec![SignalRecord::new("lone", 1, Urgency::Stable)],
            edges: Vec::new(),
        };
        isolated.edges.push(EdgeRecord::new("a", "missing", 0.5));
        let (graph, _) = SignalGraph::ingest(&isolated);
        let adjacency = AdjacencyIndex::build(&graph);
        let lone = graph.index_of("lone").expect("lone present");

        let far = visual_state(&graph, &adjacency, Some(lone), &style);
        let label = far.label(LabelKey::Cluster(0));
        assert_eq!(label.tier, Tier::Dimmed);
        assert_eq!(label.opacity, style.dimmed_opacity);
    }

    #[test]
    fn test_cross_cluster_edges_are_attenuated() {
        let graph = graph();
        let style = HighlightStyle::default();
        let state = visual_state(&graph, &AdjacencyIndex::build(&graph), None, &style);

        let intra = state.edges[1];
        let cross = state.edges[2];
        assert!(!intra.dashed);
        assert!(cross.dashed);
        assert!(cross.opacity < intra.opacity);
        assert!(cross.stroke_width < intra.stroke_width);
    }

    #[test]
    fn test_out_of_range_hover_is_ignored() {
        let graph = graph();
        let style = HighlightStyle::default();
        let state = visual_state(&graph, &AdjacencyIndex::build(&graph), Some(99), &style);
        assert_eq!(state.hovered, None);
        assert!(state.nodes.iter().all(|node| node.tier == Tier::Baseline));
    }

    #[test]
    fn test_tooltip_tracks_until_finished() {
        let mut bodies = vec![body(100.0, 100.0)];
        let mut tooltip = TooltipTracker::default();

        tooltip.retarget(Some(0), &bodies, 1.1, 10.0);
        assert_eq!(tooltip.anchor(), Some(vec2(100.0, 79.0)));

        bodies[0].position = vec2(120.0, 100.0);
        tooltip.follow(SimulationStatus::Running, &bodies, 1.1, 10.0);
        assert_eq!(tooltip.anchor(), Some(vec2(120.0, 79.0)));

        bodies[0].position = vec2(150.0, 150.0);
        tooltip.follow(SimulationStatus::Converged, &bodies, 1.1, 10.0);
        assert_eq!(tooltip.anchor(), Some(vec2(120.0, 79.0)));

        tooltip.clear();
        assert_eq!(tooltip.target(), None);
    }
}
