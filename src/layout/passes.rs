use tracing::trace;

use super::normalize::{Frame, WorkGraph};
use super::types::{LayoutParams, Orientation};

/// Minimum `y0` of every layer, indexed by layer. Layers without nodes get 0.
pub(super) fn layer_offsets(graph: &WorkGraph) -> Vec<f32> {
    if graph.nodes.is_empty() {
        return Vec::new();
    }
    let mut offsets = vec![f32::INFINITY; graph.max_layer() + 1];
    for node in &graph.nodes {
        offsets[node.layer] = offsets[node.layer].min(node.y0);
    }
    for offset in &mut offsets {
        if !offset.is_finite() {
            *offset = 0.0;
        }
    }
    offsets
}

/// Shifts every layer so its topmost node starts at zero.
pub(super) fn center_layers(graph: &mut WorkGraph, offsets: &[f32]) {
    for node in &mut graph.nodes {
        let offset = offsets[node.layer];
        node.y0 -= offset;
        node.y1 -= offset;
    }
}

/// Grows gaps with the distance from the middle layer.
pub(super) fn amplify_spacing(graph: &mut WorkGraph, spacing_increase: f32) {
    let center_layer = graph.max_layer() / 2;
    for node in &mut graph.nodes {
        let distance = center_layer.abs_diff(node.layer) as f32;
        node.gap += spacing_increase * distance;
    }
}

/// Turns oracle bounds into the layer-relative frame, folding the gap of the
/// node above into each node's margin.
pub(super) fn project(graph: &mut WorkGraph, params: &LayoutParams) {
    let padding = params.node_inner_padding;
    for layer in graph.layers_in_cross_order() {
        let mut previous_gap = 0.0;
        for idx in layer {
            let node = &mut graph.nodes[idx];
            let margin = previous_gap + node.gap;
            node.gap = margin;
            node.frame = match params.orientation {
                Orientation::Horizontal => Frame {
                    depth: node.x0 + padding,
                    cross: node.y0 + margin,
                    depth_len: (node.x1 - node.x0 - padding * 2.0).max(0.0),
                    cross_len: (node.y1 - node.y0).max(0.0),
                },
                // The margin eats into both ends of the depth extent here.
                Orientation::Vertical => Frame {
                    depth: node.x0 + padding + margin,
                    cross: node.y0 + margin,
                    depth_len: (node.x1 - node.x0 - padding * 2.0 - margin * 2.0).max(0.0),
                    cross_len: (node.y1 - node.y0).max(0.0),
                },
            };
            previous_gap = margin;
        }
    }
}

/// Lines every layer up against the tallest one. Layers holding a single node
/// are centered on the tallest extent instead, measured from the node's
/// centered `y0` so the projection margin stays in its gap.
pub(super) fn balance(graph: &mut WorkGraph) {
    let Some(max_y1) = graph.nodes.iter().map(|node| node.y1).reduce(f32::max) else {
        return;
    };
    let global_center = max_y1 / 2.0;

    for layer in graph.layers_in_cross_order() {
        let count = layer.len();
        if count == 0 {
            continue;
        }
        if count == 1 {
            let node = &mut graph.nodes[layer[0]];
            let node_center = node.y0 + node.frame.cross_len / 2.0;
            let margin = global_center - node_center;
            node.frame.cross += margin;
            node.gap += margin;
            continue;
        }

        let layer_max_y1 = layer
            .iter()
            .map(|&idx| graph.nodes[idx].y1)
            .fold(f32::NEG_INFINITY, f32::max);
        let share = (max_y1 - layer_max_y1) / (count - 1) as f32;
        trace!(count, share, "balancing layer");

        let mut previous_gap = 0.0;
        for (position, &idx) in layer.iter().enumerate() {
            let node = &mut graph.nodes[idx];
            let mut margin = previous_gap + node.gap;
            if position > 0 {
                margin += share;
            }
            node.frame.cross += margin;
            node.gap += margin;
            previous_gap = node.gap;
        }
    }
}
