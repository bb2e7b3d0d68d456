use std::cmp::Ordering;

use tracing::{debug, trace};

use super::error::LayoutError;
use super::normalize::WorkGraph;
use super::types::{LayoutParams, LinkInfo, LinkSort, NodeSort};

const COLLISION_EPSILON: f32 = 1e-6;

/// Assigns layers, provisional node boxes and link bands.
///
/// Depths come from breadth-first waves (a node's depth is the last wave that
/// reaches it), layers from the alignment policy, cross-axis sizes are
/// proportional to node values, and a few rounds of weighted relaxation pull
/// connected nodes towards each other before collisions are resolved.
pub(super) fn compute_layering(
    graph: &mut WorkGraph,
    params: &LayoutParams,
) -> Result<(), LayoutError> {
    if graph.nodes.is_empty() {
        return Ok(());
    }
    let (depth_extent, cross_extent) = params.extent();

    sort_links_by_policy(graph, &params.link_sort);
    compute_node_values(graph);

    let depths = depth_waves(graph, Direction::Forward)?;
    let reverse_depths = depth_waves(graph, Direction::Backward)?;
    for (idx, node) in graph.nodes.iter_mut().enumerate() {
        node.info.depth = depths[idx];
        node.info.reverse_depth = reverse_depths[idx];
    }
    for idx in 0..graph.nodes.len() {
        let min_target = graph.nodes[idx]
            .source_links
            .iter()
            .map(|&link| depths[graph.links[link].target])
            .min();
        graph.nodes[idx].info.min_target_depth = min_target;
    }

    let mut columns = assign_layers(graph, params, depth_extent);
    let max_column = columns.iter().map(Vec::len).max().unwrap_or(0);
    let py = if max_column > 1 {
        params
            .node_spacing
            .min(cross_extent / (max_column - 1) as f32)
    } else {
        params.node_spacing
    };

    let mut layering = Layering {
        graph,
        py,
        cross_extent,
        node_sort: &params.node_sort,
        link_sort: &params.link_sort,
    };
    let ky = layering.initialize_breadths(&columns);
    debug!(
        layers = columns.len(),
        ky,
        py,
        iterations = params.iterations,
        "initialized sankey columns"
    );

    for i in 0..params.iterations {
        let alpha = 0.99f32.powi(i as i32);
        let beta = (1.0 - alpha).max((i + 1) as f32 / params.iterations as f32);
        layering.relax_right_to_left(&mut columns, alpha, beta);
        layering.relax_left_to_right(&mut columns, alpha, beta);
        trace!(iteration = i, alpha, beta, "relaxed sankey columns");
    }
    layering.compute_link_breadths();
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

fn sort_links_by_policy(graph: &mut WorkGraph, link_sort: &LinkSort) {
    let LinkSort::Custom(compare) = link_sort else {
        return;
    };
    let infos: Vec<LinkInfo> = graph
        .links
        .iter()
        .map(|link| LinkInfo {
            index: link.index,
            source: link.source,
            target: link.target,
            value: link.value,
        })
        .collect();
    for node in &mut graph.nodes {
        node.source_links
            .sort_by(|a, b| compare(&infos[*a], &infos[*b]));
        node.target_links
            .sort_by(|a, b| compare(&infos[*a], &infos[*b]));
    }
}

fn compute_node_values(graph: &mut WorkGraph) {
    for idx in 0..graph.nodes.len() {
        let node = &graph.nodes[idx];
        let value = match node.fixed_value {
            Some(value) => value,
            None => {
                let out_total: f32 = node
                    .source_links
                    .iter()
                    .map(|&link| graph.links[link].value)
                    .sum();
                let in_total: f32 = node
                    .target_links
                    .iter()
                    .map(|&link| graph.links[link].value)
                    .sum();
                out_total.max(in_total)
            }
        };
        graph.nodes[idx].info.value = value;
    }
}

fn depth_waves(graph: &WorkGraph, direction: Direction) -> Result<Vec<usize>, LayoutError> {
    let node_count = graph.nodes.len();
    let mut depths = vec![0usize; node_count];
    let mut queued_in_wave = vec![usize::MAX; node_count];
    let mut current: Vec<usize> = (0..node_count).collect();
    let mut wave = 0usize;

    while !current.is_empty() {
        let mut next = Vec::new();
        for &node_idx in &current {
            depths[node_idx] = wave;
            let node = &graph.nodes[node_idx];
            let links = match direction {
                Direction::Forward => &node.source_links,
                Direction::Backward => &node.target_links,
            };
            for &link_idx in links {
                let link = &graph.links[link_idx];
                let other = match direction {
                    Direction::Forward => link.target,
                    Direction::Backward => link.source,
                };
                if queued_in_wave[other] != wave {
                    queued_in_wave[other] = wave;
                    next.push(other);
                }
            }
        }
        wave += 1;
        if wave > node_count {
            return Err(LayoutError::CyclicGraph {
                node: graph.nodes[current[0]].info.id.clone(),
            });
        }
        current = next;
    }
    Ok(depths)
}

fn assign_layers(
    graph: &mut WorkGraph,
    params: &LayoutParams,
    depth_extent: f32,
) -> Vec<Vec<usize>> {
    let layer_count = graph
        .nodes
        .iter()
        .map(|node| node.info.depth)
        .max()
        .unwrap_or(0)
        + 1;
    let dx = params.node_thickness;
    let kx = if layer_count > 1 {
        (depth_extent - dx) / (layer_count - 1) as f32
    } else {
        0.0
    };

    let mut columns: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
    for (idx, node) in graph.nodes.iter_mut().enumerate() {
        let layer = params.align.layer(&node.info, layer_count);
        node.layer = layer;
        node.x0 = layer as f32 * kx;
        node.x1 = node.x0 + dx;
        columns[layer].push(idx);
    }
    if let NodeSort::Custom(compare) = &params.node_sort {
        for column in &mut columns {
            column.sort_by(|a, b| compare(&graph.nodes[*a].info, &graph.nodes[*b].info));
        }
    }
    columns
}

struct Layering<'a> {
    graph: &'a mut WorkGraph,
    py: f32,
    cross_extent: f32,
    node_sort: &'a NodeSort,
    link_sort: &'a LinkSort,
}

impl Layering<'_> {
    /// Stacks every column from the top, spreads the leftover space evenly and
    /// returns the value-to-breadth scale shared by all columns.
    fn initialize_breadths(&mut self, columns: &[Vec<usize>]) -> f32 {
        let ky = columns
            .iter()
            .filter_map(|column| {
                let total: f32 = column
                    .iter()
                    .map(|&idx| self.graph.nodes[idx].info.value)
                    .sum();
                (total > 0.0).then(|| {
                    (self.cross_extent - (column.len() as f32 - 1.0) * self.py) / total
                })
            })
            .fold(None, |acc: Option<f32>, ky| Some(acc.map_or(ky, |min| min.min(ky))))
            .unwrap_or(0.0)
            .max(0.0);

        for column in columns {
            let mut y = 0.0;
            for &idx in column {
                let node = &mut self.graph.nodes[idx];
                node.y0 = y;
                node.y1 = y + node.info.value * ky;
                y = node.y1 + self.py;
                for &link in &node.source_links {
                    let link = &mut self.graph.links[link];
                    link.width = link.value * ky;
                }
            }
            let spread = (self.cross_extent - y + self.py) / (column.len() + 1) as f32;
            for (i, &idx) in column.iter().enumerate() {
                let node = &mut self.graph.nodes[idx];
                node.y0 += spread * (i + 1) as f32;
                node.y1 += spread * (i + 1) as f32;
            }
            self.reorder_links(column);
        }
        ky
    }

    fn relax_left_to_right(&mut self, columns: &mut [Vec<usize>], alpha: f32, beta: f32) {
        for i in 1..columns.len() {
            for k in 0..columns[i].len() {
                let target = columns[i][k];
                let mut y = 0.0;
                let mut w = 0.0;
                for &link_idx in &self.graph.nodes[target].target_links {
                    let link = &self.graph.links[link_idx];
                    let v = link.value * self.layer_span(link.source, target);
                    y += self.target_top(link.source, target) * v;
                    w += v;
                }
                if !(w > 0.0) {
                    continue;
                }
                let node = &mut self.graph.nodes[target];
                let dy = (y / w - node.y0) * alpha;
                node.y0 += dy;
                node.y1 += dy;
                self.reorder_node_links(target);
            }
            self.finish_column(&mut columns[i], beta);
        }
    }

    fn relax_right_to_left(&mut self, columns: &mut [Vec<usize>], alpha: f32, beta: f32) {
        for i in (0..columns.len().saturating_sub(1)).rev() {
            for k in 0..columns[i].len() {
                let source = columns[i][k];
                let mut y = 0.0;
                let mut w = 0.0;
                for &link_idx in &self.graph.nodes[source].source_links {
                    let link = &self.graph.links[link_idx];
                    let v = link.value * self.layer_span(source, link.target);
                    y += self.source_top(source, link.target) * v;
                    w += v;
                }
                if !(w > 0.0) {
                    continue;
                }
                let node = &mut self.graph.nodes[source];
                let dy = (y / w - node.y0) * alpha;
                node.y0 += dy;
                node.y1 += dy;
                self.reorder_node_links(source);
            }
            self.finish_column(&mut columns[i], beta);
        }
    }

    fn finish_column(&mut self, column: &mut [usize], beta: f32) {
        if matches!(self.node_sort, NodeSort::Automatic) {
            let nodes = &self.graph.nodes;
            column.sort_by(|a, b| nodes[*a].y0.total_cmp(&nodes[*b].y0));
        }
        self.resolve_collisions(column, beta);
    }

    fn layer_span(&self, source: usize, target: usize) -> f32 {
        self.graph.nodes[target].layer as f32 - self.graph.nodes[source].layer as f32
    }

    /// The `y0` the target would need for a straight link from `source`.
    fn target_top(&self, source: usize, target: usize) -> f32 {
        let nodes = &self.graph.nodes;
        let links = &self.graph.links;
        let src = &nodes[source];
        let mut y = src.y0 - (src.source_links.len() as f32 - 1.0) * self.py / 2.0;
        for &link in &src.source_links {
            if links[link].target == target {
                break;
            }
            y += links[link].width + self.py;
        }
        for &link in &nodes[target].target_links {
            if links[link].source == source {
                break;
            }
            y -= links[link].width;
        }
        y
    }

    /// The `y0` the source would need for a straight link to `target`.
    fn source_top(&self, source: usize, target: usize) -> f32 {
        let nodes = &self.graph.nodes;
        let links = &self.graph.links;
        let tgt = &nodes[target];
        let mut y = tgt.y0 - (tgt.target_links.len() as f32 - 1.0) * self.py / 2.0;
        for &link in &tgt.target_links {
            if links[link].source == source {
                break;
            }
            y += links[link].width + self.py;
        }
        for &link in &nodes[source].source_links {
            if links[link].target == target {
                break;
            }
            y -= links[link].width;
        }
        y
    }

    fn resolve_collisions(&mut self, column: &[usize], alpha: f32) {
        if column.is_empty() {
            return;
        }
        let mid = column.len() >> 1;
        let subject = &self.graph.nodes[column[mid]];
        let (above, below) = (subject.y0 - self.py, subject.y1 + self.py);
        self.push_up(column[..mid].iter().rev(), above, alpha);
        self.push_down(&column[mid + 1..], below, alpha);
        self.push_up(column.iter().rev(), self.cross_extent, alpha);
        self.push_down(column, 0.0, alpha);
    }

    fn push_down(&mut self, nodes: &[usize], mut y: f32, alpha: f32) {
        for &idx in nodes {
            let node = &mut self.graph.nodes[idx];
            let dy = (y - node.y0) * alpha;
            if dy > COLLISION_EPSILON {
                node.y0 += dy;
                node.y1 += dy;
            }
            y = node.y1 + self.py;
        }
    }

    fn push_up<'n>(&mut self, nodes: impl Iterator<Item = &'n usize>, mut y: f32, alpha: f32) {
        for &idx in nodes {
            let node = &mut self.graph.nodes[idx];
            let dy = (node.y1 - y) * alpha;
            if dy > COLLISION_EPSILON {
                node.y0 -= dy;
                node.y1 -= dy;
            }
            y = node.y0 - self.py;
        }
    }

    fn reorder_links(&mut self, column: &[usize]) {
        if !matches!(self.link_sort, LinkSort::Automatic) {
            return;
        }
        for &idx in column {
            self.sort_source_links(idx);
            self.sort_target_links(idx);
        }
    }

    fn reorder_node_links(&mut self, node: usize) {
        if !matches!(self.link_sort, LinkSort::Automatic) {
            return;
        }
        let incoming = self.graph.nodes[node].target_links.clone();
        for link in incoming {
            let source = self.graph.links[link].source;
            self.sort_source_links(source);
        }
        let outgoing = self.graph.nodes[node].source_links.clone();
        for link in outgoing {
            let target = self.graph.links[link].target;
            self.sort_target_links(target);
        }
    }

    fn sort_source_links(&mut self, node: usize) {
        let mut list = std::mem::take(&mut self.graph.nodes[node].source_links);
        let links = &self.graph.links;
        list.sort_by(|a, b| self.breadth_order(links[*a].target, links[*b].target, *a, *b));
        self.graph.nodes[node].source_links = list;
    }

    fn sort_target_links(&mut self, node: usize) {
        let mut list = std::mem::take(&mut self.graph.nodes[node].target_links);
        let links = &self.graph.links;
        list.sort_by(|a, b| self.breadth_order(links[*a].source, links[*b].source, *a, *b));
        self.graph.nodes[node].target_links = list;
    }

    fn breadth_order(
        &self,
        node_a: usize,
        node_b: usize,
        link_a: usize,
        link_b: usize,
    ) -> Ordering {
        self.graph.nodes[node_a]
            .y0
            .total_cmp(&self.graph.nodes[node_b].y0)
            .then_with(|| link_a.cmp(&link_b))
    }

    fn compute_link_breadths(&mut self) {
        for idx in 0..self.graph.nodes.len() {
            let mut y0 = self.graph.nodes[idx].y0;
            let mut y1 = y0;
            let node = &self.graph.nodes[idx];
            for &link_idx in &node.source_links {
                let link = &mut self.graph.links[link_idx];
                link.y0 = y0 + link.width / 2.0;
                y0 += link.width;
            }
            for &link_idx in &node.target_links {
                let link = &mut self.graph.links[link_idx];
                link.y1 = y1 + link.width / 2.0;
                y1 += link.width;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::SankeyData;
    use crate::layout::normalize::normalize;
    use crate::layout::types::Align;

    fn layered(flows: &[(&str, &str, f32)], params: &LayoutParams) -> WorkGraph {
        let mut data = SankeyData::new();
        for (s, t, v) in flows {
            data.push_flow(s, t, *v);
        }
        let mut graph = normalize(&data).unwrap();
        compute_layering(&mut graph, params).unwrap();
        graph
    }

    fn node<'g>(graph: &'g WorkGraph, id: &str) -> &'g super::super::normalize::WorkNode {
        graph.nodes.iter().find(|n| n.info.id == id).unwrap()
    }

    #[test]
    fn depth_is_longest_path() {
        let graph = layered(
            &[("a", "b", 1.0), ("b", "c", 1.0), ("a", "c", 1.0)],
            &LayoutParams::default(),
        );
        assert_eq!(node(&graph, "a").info.depth, 0);
        assert_eq!(node(&graph, "b").info.depth, 1);
        assert_eq!(node(&graph, "c").info.depth, 2);
        assert_eq!(node(&graph, "a").info.reverse_depth, 2);
    }

    #[test]
    fn node_value_is_max_of_in_and_out() {
        let graph = layered(
            &[("a", "b", 3.0), ("c", "b", 2.0), ("b", "d", 1.0)],
            &LayoutParams::default(),
        );
        assert_eq!(node(&graph, "b").info.value, 5.0);
    }

    #[test]
    fn fixed_value_overrides_link_sums() {
        let mut data = SankeyData::new();
        data.push_flow("a", "b", 5.0);
        data.push_flow("b", "c", 5.0);
        data.nodes[1].value = Some(20.0);
        let mut graph = normalize(&data).unwrap();
        compute_layering(&mut graph, &LayoutParams::default()).unwrap();

        let b = node(&graph, "b");
        assert_eq!(b.info.value, 20.0);
        assert_eq!(node(&graph, "a").info.value, 5.0);
        let band = graph.links[0].width;
        assert!(band > 0.0);
        assert!(((b.y1 - b.y0) - band * 4.0).abs() < 1e-3);
    }

    #[test]
    fn justify_pushes_sinks_to_last_layer() {
        let params = LayoutParams {
            align: Align::Justify,
            ..LayoutParams::default()
        };
        let graph = layered(&[("a", "b", 1.0), ("b", "c", 1.0), ("a", "d", 1.0)], &params);
        assert_eq!(node(&graph, "d").layer, 2);
        let params = LayoutParams {
            align: Align::Start,
            ..LayoutParams::default()
        };
        let graph = layered(&[("a", "b", 1.0), ("b", "c", 1.0), ("a", "d", 1.0)], &params);
        assert_eq!(node(&graph, "d").layer, 1);
    }

    #[test]
    fn end_align_uses_reverse_depth() {
        let params = LayoutParams {
            align: Align::End,
            ..LayoutParams::default()
        };
        let graph = layered(&[("a", "b", 1.0), ("b", "c", 1.0), ("d", "c", 1.0)], &params);
        assert_eq!(node(&graph, "d").layer, 1);
    }

    #[test]
    fn center_align_moves_late_sources_forward() {
        let graph = layered(
            &[("a", "b", 1.0), ("b", "c", 1.0), ("d", "c", 1.0)],
            &LayoutParams::default(),
        );
        assert_eq!(node(&graph, "d").layer, 1);
    }

    #[test]
    fn detects_self_loop() {
        let mut data = SankeyData::new();
        data.push_flow("a", "a", 1.0);
        let mut graph = normalize(&data).unwrap();
        let err = compute_layering(&mut graph, &LayoutParams::default()).unwrap_err();
        assert_eq!(err, LayoutError::CyclicGraph { node: "a".into() });
    }

    #[test]
    fn nodes_stay_inside_extent_without_overlap() {
        let graph = layered(
            &[
                ("a", "x", 5.0),
                ("b", "x", 3.0),
                ("c", "y", 2.0),
                ("a", "y", 1.0),
            ],
            &LayoutParams::default(),
        );
        let mut first: Vec<_> = graph.nodes.iter().filter(|n| n.layer == 0).collect();
        first.sort_by(|a, b| a.y0.total_cmp(&b.y0));
        for pair in first.windows(2) {
            assert!(pair[0].y1 <= pair[1].y0 + 1e-3);
        }
        for node in &graph.nodes {
            assert!(node.y0 >= -1e-3 && node.y1 <= 360.0 + 1e-3);
        }
    }

    #[test]
    fn link_width_follows_value() {
        let graph = layered(&[("a", "b", 10.0), ("a", "c", 5.0)], &LayoutParams::default());
        let ratio = graph.links[0].width / graph.links[1].width;
        assert!((ratio - 2.0).abs() < 1e-4);
    }
}
