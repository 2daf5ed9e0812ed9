use signal_graph::config::{ExecutionMode, HighlightStyle, SimulationConfig};
use signal_graph::highlight::{AdjacencyIndex, Tier, visual_state};
use signal_graph::model::{
    ClusterRecord, EdgeRecord, GraphSnapshot, Point, SignalGraph, SignalRecord, Urgency,
};
use signal_graph::physics::{Body, Simulation, SimulationStatus};
use signal_graph::{GraphView, Viewport};

fn viewport() -> Viewport {
    Viewport::new(800.0, 600.0).expect("valid viewport")
}

fn seeded(seed: u64) -> SimulationConfig {
    SimulationConfig {
        seed: Some(seed),
        ..SimulationConfig::default()
    }
}

fn cluster(id: &str, size: usize) -> ClusterRecord {
    ClusterRecord {
        id: id.to_string(),
        name: format!("Cluster {id}"),
        signals: (0..size)
            .map(|index| {
                SignalRecord::new(format!("{id}-{index}"), (index as u32) * 3 + 1, Urgency::Monitor)
            })
            .collect(),
    }
}

/// Chains every cluster's members with strong edges.
fn chained_edges(clusters: &[ClusterRecord]) -> Vec<EdgeRecord> {
    clusters
        .iter()
        .flat_map(|cluster| {
            cluster
                .signals
                .windows(2)
                .map(|pair| EdgeRecord::new(pair[0].id.clone(), pair[1].id.clone(), 0.9))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn run_to_convergence(simulation: &mut Simulation) {
    let limit = simulation.config().ticks_to_converge() + 5;
    while !simulation.status().is_finished() && simulation.ticks() < limit {
        simulation.tick();
    }
    assert_eq!(simulation.status(), SimulationStatus::Converged);
}

fn mean_pairwise(bodies: &[Body], pairs: &[(usize, usize)]) -> f32 {
    let total = pairs
        .iter()
        .map(|&(a, b)| (bodies[a].position - bodies[b].position).length())
        .sum::<f32>();
    total / pairs.len() as f32
}

fn assert_inside(bodies: &[Body], viewport: Viewport) {
    for body in bodies {
        let p = body.position;
        assert!(
            p.x >= body.radius && p.x <= viewport.width - body.radius,
            "x {} escapes with radius {}",
            p.x,
            body.radius
        );
        assert!(
            p.y >= body.radius && p.y <= viewport.height - body.radius,
            "y {} escapes with radius {}",
            p.y,
            body.radius
        );
    }
}

fn scenario_snapshot() -> GraphSnapshot {
    let clusters = vec![cluster("a", 4), cluster("b", 3)];
    let mut edges = vec![
        EdgeRecord::new("a-0", "a-1", 0.9),
        EdgeRecord::new("a-1", "a-2", 0.6),
        EdgeRecord::new("a-2", "a-3", 0.5),
        EdgeRecord::new("b-0", "b-1", 0.7),
        EdgeRecord::new("b-1", "b-2", 0.6),
    ];
    edges.push(EdgeRecord::new("a-3", "b-0", 0.9));
    GraphSnapshot {
        clusters,
        standalone: Vec::new(),
        edges,
    }
}

#[test]
fn test_converged_layout_has_no_overlap() {
    let clusters = vec![cluster("a", 5), cluster("b", 4), cluster("c", 3)];
    let snapshot = GraphSnapshot {
        edges: chained_edges(&clusters),
        clusters,
        standalone: vec![
            SignalRecord::new("s-0", 1, Urgency::Stable),
            SignalRecord::new("s-1", 8, Urgency::Urgent),
        ],
    };
    let (graph, _) = SignalGraph::ingest(&snapshot);
    let mut simulation = Simulation::new(&graph, viewport(), seeded(21)).expect("simulation");

    run_to_convergence(&mut simulation);

    let bodies = simulation.bodies();
    for a in 0..bodies.len() {
        for b in (a + 1)..bodies.len() {
            let distance = (bodies[a].position - bodies[b].position).length();
            let required = bodies[a].radius + bodies[b].radius;
            assert!(
                distance + 1.0 >= required,
                "bodies {a} and {b} overlap: {distance} < {required}"
            );
        }
    }
}

#[test]
fn test_every_tick_stays_inside_viewport() {
    let clusters = vec![cluster("a", 6), cluster("b", 6)];
    let snapshot = GraphSnapshot {
        edges: chained_edges(&clusters),
        clusters,
        standalone: vec![SignalRecord::new("s", 12, Urgency::Urgent)],
    };
    let (graph, _) = SignalGraph::ingest(&snapshot);
    let small = Viewport::new(260.0, 180.0).expect("valid viewport");
    let mut simulation = Simulation::new(&graph, small, seeded(4)).expect("simulation");

    assert_inside(simulation.bodies(), small);
    for _ in 0..200 {
        simulation.tick();
        assert_inside(simulation.bodies(), small);
    }
}

#[test]
fn test_clusters_are_cohesive() {
    let clusters = vec![cluster("a", 4), cluster("b", 4), cluster("c", 4)];
    let snapshot = GraphSnapshot {
        edges: chained_edges(&clusters),
        clusters,
        standalone: Vec::new(),
    };
    let (graph, _) = SignalGraph::ingest(&snapshot);
    let mut simulation = Simulation::new(&graph, viewport(), seeded(8)).expect("simulation");

    run_to_convergence(&mut simulation);

    let mut intra = Vec::new();
    let mut inter = Vec::new();
    for a in 0..graph.nodes.len() {
        for b in (a + 1)..graph.nodes.len() {
            if graph.nodes[a].cluster == graph.nodes[b].cluster {
                intra.push((a, b));
            } else {
                inter.push((a, b));
            }
        }
    }

    let bodies = simulation.bodies();
    assert!(mean_pairwise(bodies, &intra) < mean_pairwise(bodies, &inter));
}

#[test]
fn test_pinned_runs_are_deterministic() {
    let mut snapshot = scenario_snapshot();
    let mut offset = 0.0;
    for signal in snapshot
        .clusters
        .iter_mut()
        .flat_map(|cluster| cluster.signals.iter_mut())
    {
        signal.pinned = Some(Point {
            x: 200.0 + offset,
            y: 150.0 + offset * 0.5,
        });
        offset += 37.0;
    }
    let (graph, _) = SignalGraph::ingest(&snapshot);

    let mut first = Simulation::new(&graph, viewport(), SimulationConfig::default()).expect("simulation");
    let mut second = Simulation::new(&graph, viewport(), SimulationConfig::default()).expect("simulation");

    assert_eq!(first.bodies(), second.bodies());
    for _ in 0..120 {
        first.tick();
        second.tick();
        assert_eq!(first.bodies(), second.bodies());
    }
}

#[test]
fn test_hover_marks_exact_neighbors() {
    let snapshot = GraphSnapshot {
        clusters: Vec::new(),
        standalone: ["a", "b", "c", "d"]
            .iter()
            .map(|id| SignalRecord::new(*id, 1, Urgency::Stable))
            .collect(),
        edges: vec![EdgeRecord::new("a", "b", 0.5), EdgeRecord::new("b", "c", 0.8)],
    };
    let (graph, _) = SignalGraph::ingest(&snapshot);
    let adjacency = AdjacencyIndex::build(&graph);
    let index = |id: &str| graph.index_of(id).expect("signal present");

    let state = visual_state(&graph, &adjacency, Some(index("b")), &HighlightStyle::default());

    let connected = graph
        .nodes
        .iter()
        .enumerate()
        .filter(|(position, _)| state.nodes[*position].tier == Tier::Connected)
        .map(|(_, node)| node.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(connected, vec!["a", "c"]);
    assert_eq!(state.nodes[index("d")].tier, Tier::Dimmed);
    assert_eq!(state.nodes[index("b")].tier, Tier::Focus);
}

#[test]
fn test_continuous_mode_converges_within_bound() {
    let clusters = (0..5)
        .map(|index| cluster(&format!("k{index}"), 9))
        .collect::<Vec<_>>();
    let snapshot = GraphSnapshot {
        edges: chained_edges(&clusters),
        clusters,
        standalone: (0..5)
            .map(|index| SignalRecord::new(format!("s{index}"), 2, Urgency::Emerging))
            .collect(),
    };
    let (graph, _) = SignalGraph::ingest(&snapshot);
    assert_eq!(graph.nodes.len(), 50);

    let mut simulation = Simulation::new(&graph, viewport(), seeded(2)).expect("simulation");
    let bound = simulation.config().ticks_to_converge() + 1;
    while simulation.tick() == SimulationStatus::Running {
        assert!(simulation.ticks() <= bound, "no convergence after {bound} ticks");
    }

    assert_eq!(simulation.status(), SimulationStatus::Converged);
    assert!(simulation.alpha() < simulation.config().alpha_min);
}

#[test]
fn test_batch_mode_runs_exact_budget() {
    let (graph, _) = SignalGraph::ingest(&scenario_snapshot());
    for budget in [1, 57, 300] {
        let config = SimulationConfig {
            mode: ExecutionMode::Batch,
            tick_budget: budget,
            seed: Some(budget as u64),
            ..SimulationConfig::default()
        };
        let mut simulation = Simulation::new(&graph, viewport(), config).expect("simulation");

        simulation.run_batch();

        assert_eq!(simulation.ticks(), budget);
        assert!(simulation.status().is_finished());
    }
}

#[test]
fn test_two_cluster_scenario() {
    let mut view = GraphView::new(seeded(13), HighlightStyle::default()).expect("valid config");
    view.set_viewport(viewport()).expect("viewport");
    let run = view.load(&scenario_snapshot()).expect("load");

    while !view.status().is_finished() {
        view.tick(run).expect("tick");
    }

    let graph = view.graph();
    let simulation = view.simulation().expect("simulation");
    let centroid = |cluster: usize| {
        let members = &graph.clusters[cluster].members;
        members
            .iter()
            .fold(eframe::egui::Vec2::ZERO, |sum, &index| {
                sum + simulation.bodies()[index].position
            })
            / members.len() as f32
    };
    let separation = (centroid(0) - centroid(1)).length();
    let required = simulation.config().min_cluster_separation * viewport().min_extent();
    assert!(separation >= required, "centroids {separation} apart, need {required}");

    let frame = view.frame().expect("frame");
    let edge = |source: &str, target: &str| {
        frame
            .edges
            .iter()
            .find(|edge| edge.source_id == source && edge.target_id == target)
            .expect("edge rendered")
    };
    let intra = edge("a-0", "a-1");
    let cross = edge("a-3", "b-0");
    assert!(cross.opacity < intra.opacity);
    assert!(cross.stroke_width < intra.stroke_width);
    assert!(cross.dashed && !intra.dashed);
}

#[test]
fn test_headless_frame_serializes() {
    let mut view = GraphView::new(
        SimulationConfig {
            mode: ExecutionMode::Batch,
            ..seeded(3)
        },
        HighlightStyle::default(),
    )
    .expect("valid config");
    view.set_viewport(viewport()).expect("viewport");
    view.load(&scenario_snapshot()).expect("load");

    let json = view
        .frame()
        .expect("frame")
        .to_json_pretty()
        .expect("serializable");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");

    assert!(value["nodes"]["a-0"]["visualOpacity"].is_number());
    assert!(value["edges"][0]["strokeWidth"].is_number());
    assert_eq!(value["tick"], 300);
}
