//! Tuning for the three product surfaces that share the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, Result};

/// Reference extent (px) at which `charge_strength` is expressed.
pub const REFERENCE_EXTENT: f32 = 600.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One tick per host frame, re-rendering in between.
    #[default]
    Continuous,
    /// The whole tick budget in one synchronous burst.
    Batch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Full-corpus map of every cluster.
    CorpusMap,
    /// Subgraph behind a single insight.
    InsightGraph,
    /// Compact graph embedded in the dashboard.
    DashboardGraph,
}

impl Surface {
    pub const ALL: [Self; 3] = [Self::CorpusMap, Self::InsightGraph, Self::DashboardGraph];

    pub fn label(self) -> &'static str {
        match self {
            Self::CorpusMap => "Corpus map",
            Self::InsightGraph => "Insight graph",
            Self::DashboardGraph => "Dashboard graph",
        }
    }

    pub fn config(self) -> SimulationConfig {
        let base = SimulationConfig::default();
        match self {
            Self::InsightGraph => base,
            Self::CorpusMap => SimulationConfig {
                mode: ExecutionMode::Batch,
                alpha_decay: 0.03,
                charge_strength: 45.0,
                collision_padding: 3.0,
                cluster_strength: 0.15,
                min_cluster_separation: 0.22,
                centering_strength: None,
                jitter_min: 40.0,
                jitter_max: 80.0,
                radius_scale_min: 0.55,
                radius_scale_max: 1.2,
                ..base
            },
            Self::DashboardGraph => SimulationConfig {
                alpha_decay: 0.035,
                charge_strength: 30.0,
                collision_padding: 3.0,
                cluster_strength: 0.14,
                min_cluster_separation: 0.28,
                centering_strength: None,
                radius_scale_min: 0.55,
                radius_scale_max: 1.4,
                ..base
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub mode: ExecutionMode,
    pub alpha_start: f32,
    /// Starting energy when most nodes carry a pinned position.
    pub alpha_resume: f32,
    pub alpha_min: f32,
    /// Fraction of alpha lost per tick.
    pub alpha_decay: f32,
    /// Fraction of velocity kept per tick.
    pub velocity_retention: f32,
    pub max_speed: f32,
    /// Many-body repulsion at [`REFERENCE_EXTENT`]; scales with `min(w, h)`.
    pub charge_strength: f32,
    pub barnes_hut_theta: f32,
    pub collision_padding: f32,
    pub collision_strength: f32,
    pub collision_iterations: usize,
    pub link_distance: f32,
    pub intra_link_strength: f32,
    pub cross_link_strength: f32,
    pub cluster_strength: f32,
    pub standalone_strength: f32,
    /// Minimum centroid distance between clusters, as a fraction of `min(w, h)`.
    pub min_cluster_separation: f32,
    pub separation_strength: f32,
    pub centering_strength: Option<f32>,
    pub boundary_margin: f32,
    pub jitter_min: f32,
    pub jitter_max: f32,
    pub tick_budget: usize,
    pub ring_factor: f32,
    pub radius_scale_min: f32,
    pub radius_scale_max: f32,
    /// Pinned share of nodes at or above which a run starts at `alpha_resume`.
    pub resume_pinned_fraction: f32,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Continuous,
            alpha_start: 1.0,
            alpha_resume: 0.1,
            alpha_min: 0.001,
            alpha_decay: 0.0228,
            velocity_retention: 0.6,
            max_speed: 40.0,
            charge_strength: 60.0,
            barnes_hut_theta: 0.9,
            collision_padding: 6.0,
            collision_strength: 0.7,
            collision_iterations: 2,
            link_distance: 60.0,
            intra_link_strength: 0.5,
            cross_link_strength: 0.03,
            cluster_strength: 0.1,
            standalone_strength: 0.06,
            min_cluster_separation: 0.3,
            separation_strength: 0.08,
            centering_strength: Some(0.02),
            boundary_margin: 6.0,
            jitter_min: 40.0,
            jitter_max: 100.0,
            tick_budget: 300,
            ring_factor: 0.38,
            radius_scale_min: 0.7,
            radius_scale_max: 1.8,
            resume_pinned_fraction: 0.5,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies the fields present in `raw` on top of `self`.
    pub fn merge_json(&self, raw: &str) -> Result<Self> {
        let overrides: Value = serde_json::from_str(raw)?;
        let Value::Object(overrides) = overrides else {
            return Err(EngineError::Config(
                "tuning overrides must be a JSON object".to_owned(),
            ));
        };

        let mut merged = serde_json::to_value(self)?;
        if let Value::Object(fields) = &mut merged {
            for (key, value) in overrides {
                if !fields.contains_key(&key) {
                    return Err(EngineError::Config(format!("unknown tuning field `{key}`")));
                }
                fields.insert(key, value);
            }
        }

        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        fn invalid(message: impl Into<String>) -> Result<()> {
            Err(EngineError::Config(message.into()))
        }

        if !(self.alpha_decay > 0.0 && self.alpha_decay < 1.0) {
            return invalid(format!("alpha_decay {} must be in (0, 1)", self.alpha_decay));
        }
        if !(self.alpha_min > 0.0
            && self.alpha_min < self.alpha_resume
            && self.alpha_resume <= self.alpha_start)
        {
            return invalid("alpha bounds must satisfy 0 < alpha_min < alpha_resume <= alpha_start");
        }
        if !(self.velocity_retention > 0.0 && self.velocity_retention <= 1.0) {
            return invalid("velocity_retention must be in (0, 1]");
        }
        if self.tick_budget == 0 {
            return invalid("tick_budget must be positive");
        }
        if !(self.radius_scale_min > 0.0 && self.radius_scale_min <= self.radius_scale_max) {
            return invalid("radius scale bounds must satisfy 0 < min <= max");
        }
        if self.jitter_min < 0.0 || self.jitter_min > self.jitter_max {
            return invalid("jitter range must satisfy 0 <= jitter_min <= jitter_max");
        }
        if self.max_speed <= 0.0 || self.barnes_hut_theta <= 0.0 {
            return invalid("max_speed and barnes_hut_theta must be positive");
        }
        if self.collision_padding < 0.0 || self.boundary_margin < 0.0 {
            return invalid("collision_padding and boundary_margin must not be negative");
        }
        Ok(())
    }

    /// Upper bound on continuous-mode ticks before alpha crosses `alpha_min`.
    pub fn ticks_to_converge(&self) -> usize {
        let ratio = (self.alpha_min / self.alpha_start).ln();
        let per_tick = (1.0 - self.alpha_decay).ln();
        (ratio / per_tick).ceil().max(1.0) as usize
    }
}

/// Opacity tiers, stroke ranges and label geometry for visual state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightStyle {
    pub urgent_opacity: f32,
    pub emerging_opacity: f32,
    pub monitor_opacity: f32,
    pub stable_opacity: f32,
    pub connected_opacity: f32,
    pub dimmed_opacity: f32,
    pub hover_scale: f32,
    pub edge_min_opacity: f32,
    pub edge_max_opacity: f32,
    pub edge_min_width: f32,
    pub edge_max_width: f32,
    /// Multiplier applied to cross-cluster edge opacity and width.
    pub cross_cluster_attenuation: f32,
    pub edge_focus_opacity: f32,
    pub edge_dimmed_opacity: f32,
    pub label_width: f32,
    pub label_height: f32,
    pub label_gap: f32,
    pub label_separation: f32,
    pub label_passes: usize,
    pub edge_label_min_weight: f32,
    pub tooltip_gap: f32,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            urgent_opacity: 1.0,
            emerging_opacity: 0.9,
            monitor_opacity: 0.78,
            stable_opacity: 0.65,
            connected_opacity: 0.85,
            dimmed_opacity: 0.12,
            hover_scale: 1.1,
            edge_min_opacity: 0.15,
            edge_max_opacity: 0.6,
            edge_min_width: 0.75,
            edge_max_width: 3.0,
            cross_cluster_attenuation: 0.45,
            edge_focus_opacity: 0.9,
            edge_dimmed_opacity: 0.04,
            label_width: 120.0,
            label_height: 18.0,
            label_gap: 8.0,
            label_separation: 4.0,
            label_passes: 5,
            edge_label_min_weight: 0.6,
            tooltip_gap: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for surface in Surface::ALL {
            surface.config().validate().expect("preset is valid");
        }
        assert_eq!(Surface::CorpusMap.config().mode, ExecutionMode::Batch);
        assert_eq!(Surface::InsightGraph.config(), SimulationConfig::default());
    }

    #[test]
    fn test_merge_json_keeps_unspecified_fields() {
        let base = Surface::DashboardGraph.config();
        let merged = base
            .merge_json(r#"{"alpha_decay": 0.05, "mode": "batch", "seed": 9}"#)
            .expect("valid overrides");

        assert_eq!(merged.alpha_decay, 0.05);
        assert_eq!(merged.mode, ExecutionMode::Batch);
        assert_eq!(merged.seed, Some(9));
        assert_eq!(merged.charge_strength, base.charge_strength);
    }

    #[test]
    fn test_merge_json_rejects_unknown_field() {
        let result = SimulationConfig::default().merge_json(r#"{"alpha_decya": 0.05}"#);
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_decay() {
        let config = SimulationConfig {
            alpha_decay: 1.0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());

        let result = SimulationConfig::from_json_str(r#"{"alpha_min": 0.5, "alpha_resume": 0.1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_ticks_to_converge() {
        let config = SimulationConfig::default();
        let ticks = config.ticks_to_converge();
        assert!((295..=305).contains(&ticks), "unexpected tick bound {ticks}");
    }
}
