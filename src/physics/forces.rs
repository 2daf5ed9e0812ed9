//! The fixed force pipeline. Each function adds to body velocities; the
//! caller runs them in declaration order once per tick.

use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;
use super::{Body, Link};
use crate::layout::Viewport;

/// Distance floor for coincident bodies.
pub(super) const MIN_DISTANCE: f32 = 1.0;
const COINCIDENT_EPSILON: f32 = 1e-4;

/// Deterministic unit vector for a pair sitting on the same point, pointing
/// from `b` toward `a`.
fn separation_direction(a: usize, b: usize) -> Vec2 {
    let (low, high) = (a.min(b), a.max(b));
    let angle = ((low as f32) * 0.618_034 + (high as f32) * 0.414_214 + 0.11) * TAU;
    let direction = vec2(angle.cos(), angle.sin());
    if a == low { direction } else { -direction }
}

fn unit_or_fallback(delta: Vec2, a: usize, b: usize) -> (Vec2, f32) {
    let distance = delta.length();
    if distance > COINCIDENT_EPSILON {
        (delta / distance, distance)
    } else {
        (separation_direction(a, b), 0.0)
    }
}

fn accumulate_repulsion(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    theta: f32,
    force: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.members {
            if other == index {
                continue;
            }
            let (direction, distance) = unit_or_fallback(point - positions[other], index, other);
            *force += direction * (strength / distance.max(MIN_DISTANCE));
        }
        return;
    }

    let delta = point - node.centroid;
    let distance = delta.length().max(MIN_DISTANCE);
    if !node.bounds.contains(point) && node.bounds.side() / distance < theta {
        *force += delta / distance * (strength * node.mass / distance);
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion(child, index, positions, strength, theta, force);
    }
}

/// Many-body repulsion, magnitude `strength / distance`.
pub(super) fn apply_repulsion(
    bodies: &mut [Body],
    positions: &mut Vec<Vec2>,
    strength: f32,
    theta: f32,
    alpha: f32,
) {
    positions.clear();
    positions.extend(bodies.iter().map(|body| body.position));
    let positions: &[Vec2] = positions;

    let Some(tree) = QuadNode::build(positions) else {
        return;
    };

    for (index, body) in bodies.iter_mut().enumerate() {
        let mut force = Vec2::ZERO;
        accumulate_repulsion(&tree, index, positions, strength, theta, &mut force);
        body.velocity += force * alpha;
    }
}

/// Pushes apart any pair closer than `r_a + r_b + padding`, judged on
/// next-step positions.
///
/// The one force that ignores alpha, so overlap cannot outlive the cooling
/// of a run.
pub(super) fn apply_collision(bodies: &mut [Body], padding: f32, strength: f32, iterations: usize) {
    for _ in 0..iterations {
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let (a, b) = (bodies[i], bodies[j]);
                let min_distance = a.radius + b.radius + padding;
                let delta = (a.position + a.velocity) - (b.position + b.velocity);
                if delta.length_sq() >= min_distance * min_distance {
                    continue;
                }

                let (direction, distance) = unit_or_fallback(delta, i, j);
                let push = direction * ((min_distance - distance) * strength);
                let (weight_a, weight_b) = (a.radius * a.radius, b.radius * b.radius);
                let share_a = weight_b / (weight_a + weight_b);

                bodies[i].velocity += push * share_a;
                bodies[j].velocity -= push * (1.0 - share_a);
            }
        }
    }
}

/// Springs toward each link's rest length.
pub(super) fn apply_links(bodies: &mut [Body], links: &[Link], alpha: f32) {
    for link in links {
        let (source, target) = (bodies[link.source], bodies[link.target]);
        let delta = (target.position + target.velocity) - (source.position + source.velocity);
        let (direction, distance) = unit_or_fallback(delta, link.target, link.source);
        let distance = distance.max(MIN_DISTANCE);

        let correction = direction * ((distance - link.rest_length) * link.strength * alpha);
        bodies[link.target].velocity -= correction * link.bias;
        bodies[link.source].velocity += correction * (1.0 - link.bias);
    }
}

/// Pulls every body toward its cluster (or standalone) anchor.
pub(super) fn apply_cluster_attraction(
    bodies: &mut [Body],
    cluster_strength: f32,
    standalone_strength: f32,
    alpha: f32,
) {
    for body in bodies {
        let strength = if body.cluster.is_some() {
            cluster_strength
        } else {
            standalone_strength
        };
        body.velocity += (body.anchor - body.position) * (strength * alpha);
    }
}

/// Pushes whole clusters apart when their centroids sit closer than
/// `min_separation`.
pub(super) fn apply_cluster_separation(
    bodies: &mut [Body],
    members: &[Vec<usize>],
    centroids: &mut Vec<Option<Vec2>>,
    min_separation: f32,
    strength: f32,
    alpha: f32,
) {
    centroids.clear();
    centroids.extend(members.iter().map(|group| {
        if group.is_empty() {
            return None;
        }
        let sum = group
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + bodies[index].position);
        Some(sum / group.len() as f32)
    }));

    for a in 0..members.len() {
        for b in (a + 1)..members.len() {
            let (Some(centroid_a), Some(centroid_b)) = (centroids[a], centroids[b]) else {
                continue;
            };

            let (direction, distance) = unit_or_fallback(centroid_a - centroid_b, a, b);
            if distance >= min_separation {
                continue;
            }

            let push = direction * ((min_separation - distance) * strength * alpha * 0.5);
            for &index in &members[a] {
                bodies[index].velocity += push;
            }
            for &index in &members[b] {
                bodies[index].velocity -= push;
            }
        }
    }
}

pub(super) fn apply_centering(bodies: &mut [Body], center: Vec2, strength: f32, alpha: f32) {
    for body in bodies {
        body.velocity += (center - body.position) * (strength * alpha);
    }
}

/// Damps velocity, caps speed and moves every body.
pub(super) fn integrate(bodies: &mut [Body], retention: f32, max_speed: f32) {
    for body in bodies {
        let mut velocity = body.velocity * retention;
        let speed = velocity.length();
        if speed > max_speed {
            velocity *= max_speed / speed;
        }
        body.velocity = velocity;
        body.position += velocity;
    }
}

/// Hard clamp keeping each full disc plus `margin` inside the viewport.
pub(super) fn contain(bodies: &mut [Body], viewport: Viewport, margin: f32) {
    fn clamp_axis(position: &mut f32, velocity: &mut f32, extent: f32, inset: f32) {
        let (low, high) = (inset, extent - inset);
        if low > high {
            *position = extent * 0.5;
            *velocity = 0.0;
        } else if *position < low {
            *position = low;
            *velocity = 0.0;
        } else if *position > high {
            *position = high;
            *velocity = 0.0;
        }
    }

    for body in bodies {
        let inset = body.radius + margin;
        clamp_axis(
            &mut body.position.x,
            &mut body.velocity.x,
            viewport.width,
            inset,
        );
        clamp_axis(
            &mut body.position.y,
            &mut body.velocity.y,
            viewport.height,
            inset,
        );
    }
}
