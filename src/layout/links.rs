use super::normalize::WorkGraph;
use super::types::SankeyLink;

/// Moves link band centers by the gap their endpoint nodes accumulated and
/// drops the raw band fields of the layering step.
pub(super) fn project_links(graph: &WorkGraph, offsets: &[f32]) -> Vec<SankeyLink> {
    graph
        .links
        .iter()
        .map(|link| {
            let source = &graph.nodes[link.source];
            let target = &graph.nodes[link.target];
            SankeyLink {
                index: link.index,
                source: source.info.id.clone(),
                target: target.info.id.clone(),
                source_index: link.source,
                target_index: link.target,
                value: link.value,
                thickness: link.width.max(0.0),
                pos0: link.y0 + source.gap - offsets[source.layer],
                pos1: link.y1 + target.gap - offsets[target.layer],
                color: link.color.clone(),
                formatted_value: String::new(),
                data: link.data.clone(),
            }
        })
        .collect()
}
