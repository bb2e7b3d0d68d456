mod enrich;
mod error;
mod layering;
mod links;
mod normalize;
mod passes;
pub(crate) mod types;

pub use enrich::*;
pub use error::LayoutError;
pub use types::*;

use tracing::debug;

use crate::config::SankeyConfig;
use crate::ir::SankeyData;

use links::project_links;
use normalize::{WorkGraph, normalize};
use passes::{amplify_spacing, balance, center_layers, layer_offsets, project};

/// Lays out a flow diagram.
///
/// The caller's data is only read; every call works on its own copy, so the
/// same inputs always produce identical output.
pub fn compute_sankey_layout(
    data: &SankeyData,
    params: &LayoutParams,
    accessors: &Accessors,
) -> Result<SankeyLayout, LayoutError> {
    let mut graph = normalize(data)?;
    layering::compute_layering(&mut graph, params)?;

    let offsets = layer_offsets(&graph);
    center_layers(&mut graph, &offsets);
    amplify_spacing(&mut graph, params.spacing_increase);
    project(&mut graph, params);
    balance(&mut graph);
    let links = project_links(&graph, &offsets);
    debug!(
        nodes = graph.nodes.len(),
        links = links.len(),
        layers = offsets.len(),
        orientation = ?params.orientation,
        "computed sankey layout"
    );

    let mut layout = SankeyLayout {
        orientation: params.orientation,
        width: params.width,
        height: params.height,
        nodes: finalize_nodes(graph, params.orientation),
        links,
        legend: Vec::new(),
    };
    enrich(&mut layout, accessors);
    Ok(layout)
}

/// [`compute_sankey_layout`] with parameters and accessors taken from a
/// serializable config.
pub fn layout_from_config(
    data: &SankeyData,
    config: &SankeyConfig,
) -> anyhow::Result<SankeyLayout> {
    let params = LayoutParams::from_config(config);
    let accessors = Accessors::from_config(config)?;
    Ok(compute_sankey_layout(data, &params, &accessors)?)
}

fn finalize_nodes(graph: WorkGraph, orientation: Orientation) -> Vec<SankeyNode> {
    graph
        .nodes
        .into_iter()
        .map(|node| {
            let frame = node.frame;
            let (x, y, width, height) = match orientation {
                Orientation::Horizontal => {
                    (frame.depth, frame.cross, frame.depth_len, frame.cross_len)
                }
                Orientation::Vertical => {
                    (frame.cross, frame.depth, frame.cross_len, frame.depth_len)
                }
            };
            let (x0, x1, y0, y1) = match orientation {
                Orientation::Horizontal => (node.x0, node.x1, node.y0, node.y1),
                Orientation::Vertical => (node.y0, node.y1, node.x0, node.x1),
            };
            SankeyNode {
                id: node.info.id,
                index: node.info.index,
                value: node.info.value,
                depth: node.info.depth,
                layer: node.layer,
                x0,
                x1,
                y0,
                y1,
                gap: node.gap,
                x,
                y,
                width,
                height,
                color: String::new(),
                label: String::new(),
                formatted_value: String::new(),
                input_label: node.label,
                input_color: node.color,
                data: node.data,
            }
        })
        .collect()
}
