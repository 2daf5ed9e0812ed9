//! Seeded sample briefing used when the viewer is started without a
//! snapshot file.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::model::{ClusterRecord, EdgeRecord, GraphSnapshot, SignalRecord, Urgency};

const CLUSTERS: [(&str, &[&str]); 5] = [
    (
        "Supply chain",
        &[
            "Port congestion in Rotterdam",
            "Container rates spike",
            "Chip allocation cuts",
            "Rail strike notice",
            "Warehouse vacancy drop",
        ],
    ),
    (
        "Energy",
        &[
            "Gas storage below target",
            "Grid curtailment orders",
            "Refinery outage",
            "Battery tariff review",
        ],
    ),
    (
        "Regulation",
        &[
            "Draft AI liability rules",
            "Data residency guidance",
            "Export licence backlog",
        ],
    ),
    (
        "Labor",
        &[
            "Wage settlement trend",
            "Skilled visa quota cut",
            "Union ballot scheduled",
            "Overtime ban extended",
        ],
    ),
    (
        "Markets",
        &[
            "Credit spreads widen",
            "Commodity index rebound",
            "Currency intervention hint",
        ],
    ),
];

const STANDALONE: [&str; 3] = [
    "Satellite imagery anomaly",
    "Unverified leak on forum",
    "Conference keynote remark",
];

const URGENCIES: [Urgency; 4] = [
    Urgency::Urgent,
    Urgency::Emerging,
    Urgency::Monitor,
    Urgency::Stable,
];

fn signal(rng: &mut StdRng, id: String, title: &str) -> SignalRecord {
    let mut record = SignalRecord::new(
        id,
        rng.random_range(1..=12),
        URGENCIES.choose(rng).copied().unwrap_or_default(),
    );
    record.title = title.to_owned();
    record
}

/// Same seed, same snapshot.
pub fn briefing_snapshot(seed: u64) -> GraphSnapshot {
    let mut rng = StdRng::seed_from_u64(seed);

    let clusters = CLUSTERS
        .iter()
        .enumerate()
        .map(|(cluster_index, (name, titles))| ClusterRecord {
            id: format!("cluster-{cluster_index}"),
            name: (*name).to_owned(),
            signals: titles
                .iter()
                .enumerate()
                .map(|(index, title)| {
                    signal(&mut rng, format!("sig-{cluster_index}-{index}"), title)
                })
                .collect(),
        })
        .collect::<Vec<_>>();

    let standalone = STANDALONE
        .iter()
        .enumerate()
        .map(|(index, title)| signal(&mut rng, format!("sig-s-{index}"), title))
        .collect::<Vec<_>>();

    let mut edges = Vec::new();
    for cluster in &clusters {
        for (index, a) in cluster.signals.iter().enumerate() {
            for b in cluster.signals.iter().skip(index + 1) {
                if rng.random_bool(0.55) {
                    edges.push(EdgeRecord::new(
                        a.id.clone(),
                        b.id.clone(),
                        rng.random_range(0.45..0.95),
                    ));
                }
            }
        }
    }

    let all_ids = clusters
        .iter()
        .flat_map(|cluster| cluster.signals.iter())
        .chain(standalone.iter())
        .map(|record| record.id.clone())
        .collect::<Vec<_>>();
    for _ in 0..8 {
        let (Some(a), Some(b)) = (all_ids.choose(&mut rng), all_ids.choose(&mut rng)) else {
            break;
        };
        if a != b {
            edges.push(EdgeRecord::new(
                a.clone(),
                b.clone(),
                rng.random_range(0.2..0.8),
            ));
        }
    }

    GraphSnapshot {
        clusters,
        standalone,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SignalGraph;

    #[test]
    fn test_same_seed_same_snapshot() {
        assert_eq!(briefing_snapshot(7), briefing_snapshot(7));
        assert_ne!(briefing_snapshot(7), briefing_snapshot(8));
    }

    #[test]
    fn test_snapshot_ingests_without_topology_errors() {
        let snapshot = briefing_snapshot(42);
        let (graph, report) = SignalGraph::ingest(&snapshot);

        assert_eq!(graph.nodes.len(), snapshot.signal_count());
        assert_eq!(graph.clusters.len(), CLUSTERS.len());
        assert_eq!(report.dropped_nodes(), 0);
        assert_eq!(report.dangling_edges + report.self_edges, 0);
    }
}
