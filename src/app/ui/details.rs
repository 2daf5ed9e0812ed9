use eframe::egui::{self, RichText, Ui};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Signal Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Click a signal in the graph.");
            return;
        };

        let graph = self.view.graph();
        let Some(index) = graph.index_of(&selected_id) else {
            ui.label("Selected signal is not part of the current snapshot.");
            return;
        };
        let node = &graph.nodes[index];

        ui.label(RichText::new(node.title.as_str()).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        ui.label(format!("Urgency: {}", node.urgency.label()));
        ui.label(format!("Sources: {}", node.source_count));
        let cluster_name = node
            .cluster
            .and_then(|cluster| graph.clusters.get(cluster))
            .map_or("standalone", |cluster| cluster.name.as_str());
        ui.label(format!("Cluster: {cluster_name}"));

        let mut related = self
            .view
            .adjacency()
            .neighbors(index)
            .into_iter()
            .flatten()
            .filter_map(|&neighbor| {
                let edge = graph.edges.iter().find(|edge| {
                    edge.touches(index) && edge.touches(neighbor)
                })?;
                Some((neighbor, edge.weight, edge.crosses_cluster))
            })
            .collect::<Vec<_>>();
        related.sort_by(|a, b| b.1.total_cmp(&a.1));

        ui.separator();
        ui.label(RichText::new("Related signals").strong());
        let mut clicked = None;
        if related.is_empty() {
            ui.label("No similarity edges.");
        } else {
            egui::ScrollArea::vertical()
                .id_salt("related_signals_scroll")
                .max_height(320.0)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for (neighbor, weight, crosses_cluster) in &related {
                        let neighbor = &graph.nodes[*neighbor];
                        let scope = if *crosses_cluster { "cross" } else { "same" };
                        let label = format!(
                            "{}  ({:.0}%, {scope} cluster)",
                            neighbor.title,
                            weight * 100.0
                        );
                        if ui.link(label).on_hover_text(neighbor.id.as_str()).clicked() {
                            clicked = Some(neighbor.id.clone());
                        }
                    }
                });
        }

        ui.add_space(8.0);
        let back = ui.button("Back").clicked();

        if let Some(event) = clicked.and_then(|id| self.view.click(&id)) {
            self.dispatch(event);
        }
        if back {
            let event = self.view.back();
            self.dispatch(event);
        }
    }
}
