//! Label placement: anchors cluster names above their members and edge
//! captions at edge midpoints, then pushes overlapping boxes apart with a
//! fixed number of passes. Residual overlap after the last pass is accepted.

use eframe::egui::{Vec2, vec2};

use crate::config::HighlightStyle;
use crate::layout::Viewport;
use crate::model::SignalGraph;
use crate::physics::Body;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelKey {
    /// Cluster ordinal.
    Cluster(usize),
    /// Index into [`SignalGraph::edges`].
    Edge(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelBox {
    pub key: LabelKey,
    pub text: String,
    pub center: Vec2,
    pub size: Vec2,
}

impl LabelBox {
    /// Per-axis penetration, if the boxes (grown by `separation`) intersect.
    fn penetration(&self, other: &Self, separation: f32) -> Option<Vec2> {
        let delta = self.center - other.center;
        let overlap_x = (self.size.x + other.size.x) * 0.5 + separation - delta.x.abs();
        let overlap_y = (self.size.y + other.size.y) * 0.5 + separation - delta.y.abs();
        (overlap_x > 0.0 && overlap_y > 0.0).then(|| vec2(overlap_x, overlap_y))
    }

    pub fn overlaps(&self, other: &Self, separation: f32) -> bool {
        self.penetration(other, separation).is_some()
    }

    fn clamp_into(&mut self, viewport: Viewport) {
        let half = self.size * 0.5;
        self.center.x = if viewport.width < self.size.x {
            viewport.width * 0.5
        } else {
            self.center.x.clamp(half.x, viewport.width - half.x)
        };
        self.center.y = if viewport.height < self.size.y {
            viewport.height * 0.5
        } else {
            self.center.y.clamp(half.y, viewport.height - half.y)
        };
    }
}

/// Distance along `direction` that clears the overlap on one axis.
fn push_distance(penetration: Vec2, direction: Vec2) -> f32 {
    let along = |overlap: f32, component: f32| {
        if component.abs() > 1e-4 {
            overlap / component.abs()
        } else {
            f32::INFINITY
        }
    };
    along(penetration.x, direction.x).min(along(penetration.y, direction.y))
}

/// Pairwise push: each box of an overlapping pair moves half the overlap
/// along the line between their centers.
pub fn resolve_overlaps(labels: &mut [LabelBox], separation: f32, passes: usize) {
    for _ in 0..passes {
        let mut moved = false;
        for i in 0..labels.len() {
            for j in (i + 1)..labels.len() {
                let Some(penetration) = labels[i].penetration(&labels[j], separation) else {
                    continue;
                };

                let delta = labels[i].center - labels[j].center;
                let distance = delta.length();
                let direction = if distance > 1e-4 {
                    delta / distance
                } else {
                    vec2(0.0, -1.0)
                };

                let shift = direction * (push_distance(penetration, direction) * 0.5);
                labels[i].center += shift;
                labels[j].center -= shift;
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
}

/// One label per non-empty cluster, above its topmost member and centered
/// on the members' mean x.
pub fn cluster_labels(
    graph: &SignalGraph,
    bodies: &[Body],
    viewport: Viewport,
    style: &HighlightStyle,
) -> Vec<LabelBox> {
    let size = vec2(style.label_width, style.label_height);
    let mut labels = graph
        .clusters
        .iter()
        .filter(|cluster| !cluster.members.is_empty())
        .map(|cluster| {
            let (sum_x, top) = cluster.members.iter().fold(
                (0.0_f32, f32::INFINITY),
                |(sum_x, top), &index| {
                    let body = &bodies[index];
                    (sum_x + body.position.x, top.min(body.position.y - body.radius))
                },
            );
            let mean_x = sum_x / cluster.members.len() as f32;

            let mut label = LabelBox {
                key: LabelKey::Cluster(cluster.ordinal),
                text: cluster.name.clone(),
                center: vec2(mean_x, top - style.label_gap - size.y * 0.5),
                size,
            };
            label.clamp_into(viewport);
            label
        })
        .collect::<Vec<_>>();

    resolve_overlaps(&mut labels, style.label_separation, style.label_passes);
    for label in &mut labels {
        label.clamp_into(viewport);
    }
    labels
}

/// Similarity captions at the midpoint of edges at or above
/// `edge_label_min_weight`, resolved independently of cluster labels.
pub fn edge_labels(graph: &SignalGraph, bodies: &[Body], style: &HighlightStyle) -> Vec<LabelBox> {
    let size = vec2(style.label_height * 2.4, style.label_height);
    let mut labels = graph
        .edges
        .iter()
        .enumerate()
        .filter(|(_, edge)| edge.weight >= style.edge_label_min_weight)
        .map(|(index, edge)| LabelBox {
            key: LabelKey::Edge(index),
            text: format!("{:.0}%", edge.weight * 100.0),
            center: (bodies[edge.source].position + bodies[edge.target].position) * 0.5,
            size,
        })
        .collect::<Vec<_>>();

    resolve_overlaps(&mut labels, style.label_separation, style.label_passes);
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClusterRecord, EdgeRecord, GraphSnapshot, SignalRecord, Urgency};

    fn label(x: f32, y: f32) -> LabelBox {
        LabelBox {
            key: LabelKey::Cluster(0),
            text: String::new(),
            center: vec2(x, y),
            size: vec2(100.0, 20.0),
        }
    }

    fn body(x: f32, y: f32, radius: f32, cluster: usize) -> Body {
        Body {
            position: vec2(x, y),
            velocity: Vec2::ZERO,
            radius,
            anchor: vec2(x, y),
            cluster: Some(cluster),
        }
    }

    #[test]
    fn test_identical_labels_are_separated() {
        let mut labels = vec![label(200.0, 200.0), label(200.0, 200.0)];

        resolve_overlaps(&mut labels, 4.0, 5);

        assert!(!labels[0].overlaps(&labels[1], 0.0));
        assert!(labels[0].center.y < labels[1].center.y);
    }

    #[test]
    fn test_overlap_shrinks_after_passes() {
        let mut labels = vec![label(200.0, 200.0), label(230.0, 205.0), label(260.0, 195.0)];
        let overlapping_before = count_overlaps(&labels);

        resolve_overlaps(&mut labels, 2.0, 5);

        assert!(count_overlaps(&labels) < overlapping_before);
    }

    #[test]
    fn test_separated_labels_stay_put() {
        let mut labels = vec![label(100.0, 100.0), label(300.0, 100.0)];
        let before = labels.clone();

        resolve_overlaps(&mut labels, 4.0, 5);

        assert_eq!(labels, before);
    }

    #[test]
    fn test_cluster_label_sits_above_topmost_member() {
        let snapshot = GraphSnapshot {
            clusters: vec![ClusterRecord {
                id: "c".into(),
                name: "Energy".into(),
                signals: vec![
                    SignalRecord::new("a", 1, Urgency::Stable),
                    SignalRecord::new("b", 1, Urgency::Stable),
                ],
            }],
            standalone: Vec::new(),
            edges: vec![EdgeRecord::new("a", "b", 0.9)],
        };
        let (graph, _) = SignalGraph::ingest(&snapshot);
        let bodies = vec![body(200.0, 300.0, 10.0, 0), body(260.0, 240.0, 12.0, 0)];
        let viewport = Viewport::new(600.0, 600.0).expect("valid viewport");
        let style = HighlightStyle::default();

        let labels = cluster_labels(&graph, &bodies, viewport, &style);
        let edges = edge_labels(&graph, &bodies, &style);

        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].text, "Energy");
        assert!((labels[0].center.x - 230.0).abs() < 1e-4);
        let bottom = labels[0].center.y + style.label_height * 0.5;
        assert!((bottom - (228.0 - style.label_gap)).abs() < 1e-4);

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].text, "90%");
        assert_eq!(edges[0].center, vec2(230.0, 270.0));
    }

    #[test]
    fn test_cluster_labels_stay_on_canvas_after_push() {
        let snapshot = GraphSnapshot {
            clusters: ["c1", "c2"]
                .iter()
                .map(|id| ClusterRecord {
                    id: id.to_string(),
                    name: id.to_uppercase(),
                    signals: vec![SignalRecord::new(format!("{id}-a"), 1, Urgency::Stable)],
                })
                .collect(),
            standalone: Vec::new(),
            edges: Vec::new(),
        };
        let (graph, _) = SignalGraph::ingest(&snapshot);
        // Both members hug the top edge, so both labels clamp to the same spot.
        let bodies = vec![body(300.0, 12.0, 10.0, 0), body(300.0, 14.0, 10.0, 1)];
        let viewport = Viewport::new(600.0, 400.0).expect("valid viewport");
        let style = HighlightStyle::default();

        let labels = cluster_labels(&graph, &bodies, viewport, &style);

        assert_eq!(labels.len(), 2);
        for label in &labels {
            let half = label.size * 0.5;
            assert!(label.center.x - half.x >= 0.0 && label.center.x + half.x <= viewport.width);
            assert!(label.center.y - half.y >= 0.0 && label.center.y + half.y <= viewport.height);
        }
    }

    fn count_overlaps(labels: &[LabelBox]) -> usize {
        let mut count = 0;
        for i in 0..labels.len() {
            for j in (i + 1)..labels.len() {
                if labels[i].overlaps(&labels[j], 0.0) {
                    count += 1;
                }
            }
        }
        count
    }
}
