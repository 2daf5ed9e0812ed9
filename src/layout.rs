use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Vec2, vec2};

use crate::config::SimulationConfig;
use crate::error::{EngineError, Result};
use crate::model::Cluster;

/// Reserved anchor key for signals outside every cluster.
pub const STANDALONE_KEY: &str = "standalone";

/// Extent (px) at which the radius schedule is drawn at 1.0x.
const RADIUS_REFERENCE_EXTENT: f32 = 640.0;
/// Cluster count above which radii start shrinking.
const CROWDING_THRESHOLD: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Result<Self> {
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(EngineError::InvalidViewport { width, height });
        }
        Ok(Self { width, height })
    }

    /// A zero-area viewport; simulation is skipped until a real size arrives.
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn center(self) -> Vec2 {
        vec2(self.width * 0.5, self.height * 0.5)
    }

    pub fn min_extent(self) -> f32 {
        self.width.min(self.height)
    }
}

/// Anchor points for one viewport and cluster list.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterPlan {
    pub center: Vec2,
    pub ring_radius: f32,
    /// Indexed by cluster ordinal.
    pub cluster_anchors: Vec<Vec2>,
    pub standalone_anchor: Vec2,
    pub radius_scale: f32,
}

impl ClusterPlan {
    pub fn anchor_for(&self, cluster: Option<usize>) -> Vec2 {
        cluster
            .and_then(|index| self.cluster_anchors.get(index).copied())
            .unwrap_or(self.standalone_anchor)
    }

    /// Anchors keyed by cluster id, plus [`STANDALONE_KEY`].
    pub fn anchor_map(&self, clusters: &[Cluster]) -> HashMap<String, Vec2> {
        let mut anchors = clusters
            .iter()
            .filter_map(|cluster| {
                self.cluster_anchors
                    .get(cluster.ordinal)
                    .map(|anchor| (cluster.id.clone(), *anchor))
            })
            .collect::<HashMap<_, _>>();
        anchors.insert(STANDALONE_KEY.to_owned(), self.standalone_anchor);
        anchors
    }
}

/// Places clusters evenly on a ring, first cluster at the top, proceeding
/// clockwise in screen space.
pub fn plan_clusters(
    viewport: Viewport,
    cluster_count: usize,
    config: &SimulationConfig,
) -> ClusterPlan {
    let center = viewport.center();
    let ring_radius = viewport.min_extent() * config.ring_factor;

    let cluster_anchors = (0..cluster_count)
        .map(|index| {
            let angle = (index as f32 / cluster_count as f32) * TAU - FRAC_PI_2;
            center + vec2(angle.cos(), angle.sin()) * ring_radius
        })
        .collect();

    ClusterPlan {
        center,
        ring_radius,
        cluster_anchors,
        standalone_anchor: center,
        radius_scale: radius_scale(
            viewport,
            cluster_count,
            config.radius_scale_min,
            config.radius_scale_max,
        ),
    }
}

pub fn radius_scale(viewport: Viewport, cluster_count: usize, min: f32, max: f32) -> f32 {
    let size_factor = viewport.min_extent() / RADIUS_REFERENCE_EXTENT;
    let count = cluster_count as f32;
    let crowding = if count > CROWDING_THRESHOLD {
        (CROWDING_THRESHOLD / count).sqrt()
    } else {
        1.0
    };
    (size_factor * crowding).clamp(min, max)
}

/// Monotonic step schedule: more corroborating sources, larger disc.
pub fn node_radius(source_count: u32, scale: f32) -> f32 {
    let base = match source_count {
        0..=1 => 7.0,
        2..=3 => 9.5,
        4..=6 => 12.0,
        7..=10 => 15.0,
        _ => 18.0,
    };
    base * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(width: f32, height: f32) -> Viewport {
        Viewport::new(width, height).expect("valid viewport")
    }

    #[test]
    fn test_first_cluster_at_top_then_clockwise() {
        let config = SimulationConfig::default();
        let plan = plan_clusters(viewport(800.0, 600.0), 4, &config);

        let radius = 600.0 * config.ring_factor;
        let top = plan.cluster_anchors[0];
        assert!((top.x - 400.0).abs() < 1e-3);
        assert!((top.y - (300.0 - radius)).abs() < 1e-3);

        let right = plan.cluster_anchors[1];
        assert!((right.x - (400.0 + radius)).abs() < 1e-3);
        assert!((right.y - 300.0).abs() < 1e-3);

        let bottom = plan.cluster_anchors[2];
        assert!(bottom.y > 300.0);
        assert_eq!(plan.standalone_anchor, vec2(400.0, 300.0));
    }

    #[test]
    fn test_zero_clusters_only_standalone() {
        let plan = plan_clusters(viewport(400.0, 400.0), 0, &SimulationConfig::default());
        let anchors = plan.anchor_map(&[]);

        assert!(plan.cluster_anchors.is_empty());
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors.get(STANDALONE_KEY), Some(&vec2(200.0, 200.0)));
        assert_eq!(plan.anchor_for(Some(3)), plan.standalone_anchor);
    }

    #[test]
    fn test_radius_scale_is_clamped() {
        let tiny = radius_scale(viewport(120.0, 90.0), 2, 0.55, 1.8);
        let huge = radius_scale(viewport(6000.0, 4000.0), 2, 0.55, 1.8);
        let crowded = radius_scale(viewport(640.0, 640.0), 16, 0.1, 1.8);

        assert_eq!(tiny, 0.55);
        assert_eq!(huge, 1.8);
        assert!((crowded - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_node_radius_is_monotonic() {
        let radii = (0..20).map(|count| node_radius(count, 1.0)).collect::<Vec<_>>();
        assert!(radii.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(radii.iter().all(|radius| *radius > 0.0));
        assert!(node_radius(12, 1.0) > node_radius(1, 1.0));
    }

    #[test]
    fn test_viewport_rejects_non_finite() {
        assert!(Viewport::new(f32::NAN, 10.0).is_err());
        assert!(Viewport::new(-1.0, 10.0).is_err());
        assert!(Viewport::new(0.0, 10.0).is_ok_and(|viewport| viewport.is_empty()));
    }
}
