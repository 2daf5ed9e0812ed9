//! Force simulation engine: a velocity-based relaxation solver driven by a
//! geometrically decaying `alpha`.

mod forces;
mod quadtree;

use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::{REFERENCE_EXTENT, SimulationConfig};
use crate::error::{EngineError, Result};
use crate::layout::{ClusterPlan, Viewport, node_radius, plan_clusters};
use crate::model::SignalGraph;

use forces::{
    apply_centering, apply_cluster_attraction, apply_cluster_separation, apply_collision,
    apply_links, apply_repulsion, contain, integrate,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationStatus {
    Idle,
    Running,
    Converged,
    Stopped,
}

impl SimulationStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Converged | Self::Stopped)
    }
}

/// One simulated signal. Indexed like [`SignalGraph::nodes`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub anchor: Vec2,
    pub cluster: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Link {
    pub(crate) source: usize,
    pub(crate) target: usize,
    pub(crate) strength: f32,
    pub(crate) rest_length: f32,
    /// Share of the correction taken by the target.
    pub(crate) bias: f32,
}

struct PhysicsScratch {
    positions: Vec<Vec2>,
    centroids: Vec<Option<Vec2>>,
}

/// Owns every body's position and velocity for the lifetime of one run.
pub struct Simulation {
    bodies: Vec<Body>,
    links: Vec<Link>,
    cluster_members: Vec<Vec<usize>>,
    config: SimulationConfig,
    viewport: Viewport,
    plan: ClusterPlan,
    alpha: f32,
    ticks: usize,
    status: SimulationStatus,
    scratch: PhysicsScratch,
}

impl Simulation {
    pub fn new(graph: &SignalGraph, viewport: Viewport, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        if viewport.is_empty() {
            return Err(EngineError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        let plan = plan_clusters(viewport, graph.clusters.len(), &config);
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut bodies = graph
            .nodes
            .iter()
            .map(|node| {
                let anchor = plan.anchor_for(node.cluster);
                let position = match node.pinned {
                    Some(pinned) => pinned,
                    None => anchor + jitter(&mut rng, &config),
                };
                Body {
                    position,
                    velocity: Vec2::ZERO,
                    radius: node
                        .radius_override
                        .unwrap_or_else(|| node_radius(node.source_count, plan.radius_scale)),
                    anchor,
                    cluster: node.cluster,
                }
            })
            .collect::<Vec<_>>();
        contain(&mut bodies, viewport, config.boundary_margin);

        let mut degree = vec![0usize; bodies.len()];
        for edge in &graph.edges {
            degree[edge.source] += 1;
            degree[edge.target] += 1;
        }
        let links = graph
            .edges
            .iter()
            .map(|edge| {
                let base = if edge.crosses_cluster {
                    config.cross_link_strength
                } else {
                    config.intra_link_strength
                };
                let (source_degree, target_degree) =
                    (degree[edge.source] as f32, degree[edge.target] as f32);
                Link {
                    source: edge.source,
                    target: edge.target,
                    strength: base * (0.35 + 0.65 * edge.weight),
                    rest_length: config.link_distance
                        + bodies[edge.source].radius
                        + bodies[edge.target].radius,
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect();

        let cluster_members = graph
            .clusters
            .iter()
            .map(|cluster| cluster.members.clone())
            .collect();

        let pinned_fraction = graph.pinned_fraction();
        let alpha = if pinned_fraction > 0.0 && pinned_fraction >= config.resume_pinned_fraction {
            config.alpha_resume
        } else {
            config.alpha_start
        };

        info!(
            nodes = bodies.len(),
            edges = graph.edges.len(),
            clusters = graph.clusters.len(),
            alpha,
            mode = ?config.mode,
            "layout run initialized"
        );

        Ok(Self {
            bodies,
            links,
            cluster_members,
            config,
            viewport,
            plan,
            alpha,
            ticks: 0,
            status: SimulationStatus::Idle,
            scratch: PhysicsScratch {
                positions: Vec::new(),
                centroids: Vec::new(),
            },
        })
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn plan(&self) -> &ClusterPlan {
        &self.plan
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Advances one tick in continuous mode. Finished runs are left as is.
    pub fn tick(&mut self) -> SimulationStatus {
        if self.status.is_finished() {
            return self.status;
        }

        self.status = SimulationStatus::Running;
        self.step();

        if self.alpha < self.config.alpha_min {
            self.status = SimulationStatus::Converged;
            info!(ticks = self.ticks, "layout converged");
        }
        self.status
    }

    /// Runs the remainder of the tick budget synchronously, ignoring alpha,
    /// then freezes the run.
    pub fn run_batch(&mut self) -> SimulationStatus {
        if self.status == SimulationStatus::Stopped {
            return self.status;
        }

        self.status = SimulationStatus::Running;
        while self.ticks < self.config.tick_budget {
            self.step();
        }

        self.status = if self.alpha < self.config.alpha_min {
            SimulationStatus::Converged
        } else {
            SimulationStatus::Stopped
        };
        info!(ticks = self.ticks, alpha = self.alpha, status = ?self.status, "batch layout finished");
        self.status
    }

    pub fn stop(&mut self) {
        if !self.status.is_finished() {
            debug!(ticks = self.ticks, "layout run stopped");
            self.status = SimulationStatus::Stopped;
        }
    }

    fn step(&mut self) {
        let config = &self.config;
        self.alpha *= 1.0 - config.alpha_decay;
        let alpha = self.alpha;
        let min_extent = self.viewport.min_extent();

        apply_repulsion(
            &mut self.bodies,
            &mut self.scratch.positions,
            config.charge_strength * min_extent / REFERENCE_EXTENT,
            config.barnes_hut_theta,
            alpha,
        );
        apply_collision(
            &mut self.bodies,
            config.collision_padding,
            config.collision_strength,
            config.collision_iterations,
        );
        apply_links(&mut self.bodies, &self.links, alpha);
        apply_cluster_attraction(
            &mut self.bodies,
            config.cluster_strength,
            config.standalone_strength,
            alpha,
        );
        apply_cluster_separation(
            &mut self.bodies,
            &self.cluster_members,
            &mut self.scratch.centroids,
            config.min_cluster_separation * min_extent,
            config.separation_strength,
            alpha,
        );
        if let Some(strength) = config.centering_strength {
            apply_centering(&mut self.bodies, self.plan.center, strength, alpha);
        }

        integrate(&mut self.bodies, config.velocity_retention, config.max_speed);
        contain(&mut self.bodies, self.viewport, config.boundary_margin);
        self.ticks += 1;
    }
}

fn jitter(rng: &mut StdRng, config: &SimulationConfig) -> Vec2 {
    let angle = rng.random_range(0.0..TAU);
    let magnitude = rng.random_range(config.jitter_min..=config.jitter_max);
    vec2(angle.cos(), angle.sin()) * magnitude
}
