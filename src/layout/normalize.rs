use std::collections::HashMap;

use crate::ir::{Datum, SankeyData};

use super::error::LayoutError;
use super::types::NodeInfo;

/// Geometry of a node in the layer-relative frame: `depth` runs along the
/// layering axis, `cross` along the axis nodes are stacked on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct Frame {
    pub depth: f32,
    pub cross: f32,
    pub depth_len: f32,
    pub cross_len: f32,
}

#[derive(Debug, Clone)]
pub(super) struct WorkNode {
    pub info: NodeInfo,
    pub fixed_value: Option<f32>,
    pub label: Option<String>,
    pub color: Option<String>,
    pub data: Datum,
    pub source_links: Vec<usize>,
    pub target_links: Vec<usize>,
    pub layer: usize,
    pub x0: f32,
    pub x1: f32,
    pub y0: f32,
    pub y1: f32,
    pub gap: f32,
    pub frame: Frame,
}

#[derive(Debug, Clone)]
pub(super) struct WorkLink {
    pub index: usize,
    pub source: usize,
    pub target: usize,
    pub value: f32,
    pub color: Option<String>,
    pub data: Datum,
    /// Band center at the source end, set by the layering step.
    pub y0: f32,
    /// Band center at the target end.
    pub y1: f32,
    pub width: f32,
}

#[derive(Debug, Clone, Default)]
pub(super) struct WorkGraph {
    pub nodes: Vec<WorkNode>,
    pub links: Vec<WorkLink>,
}

impl WorkGraph {
    pub fn max_layer(&self) -> usize {
        self.nodes.iter().map(|node| node.layer).max().unwrap_or(0)
    }

    /// Node indices grouped by layer, each group in cross-axis order.
    pub fn layers_in_cross_order(&self) -> Vec<Vec<usize>> {
        if self.nodes.is_empty() {
            return Vec::new();
        }
        let mut layers: Vec<Vec<usize>> = vec![Vec::new(); self.max_layer() + 1];
        for (idx, node) in self.nodes.iter().enumerate() {
            layers[node.layer].push(idx);
        }
        for layer in &mut layers {
            layer.sort_by(|a, b| {
                self.nodes[*a]
                    .y0
                    .total_cmp(&self.nodes[*b].y0)
                    .then_with(|| a.cmp(b))
            });
        }
        layers
    }
}

/// Builds an owned working graph from the caller's data. Nothing in `data`
/// is touched, so the same input can be laid out any number of times.
pub(super) fn normalize(data: &SankeyData) -> Result<WorkGraph, LayoutError> {
    let mut id_to_idx: HashMap<&str, usize> = HashMap::with_capacity(data.nodes.len());
    let mut nodes = Vec::with_capacity(data.nodes.len());

    for (index, node) in data.nodes.iter().enumerate() {
        if id_to_idx.insert(node.id.as_str(), index).is_some() {
            return Err(LayoutError::DuplicateNodeId {
                id: node.id.clone(),
            });
        }
        if let Some(value) = node.value
            && !(value.is_finite() && value >= 0.0)
        {
            return Err(LayoutError::InvalidNodeValue {
                id: node.id.clone(),
                value,
            });
        }
        nodes.push(WorkNode {
            info: NodeInfo {
                id: node.id.clone(),
                index,
                value: 0.0,
                depth: 0,
                reverse_depth: 0,
                in_degree: 0,
                out_degree: 0,
                min_target_depth: None,
            },
            fixed_value: node.value,
            label: node.label.clone(),
            color: node.color.clone(),
            data: node.data.clone(),
            source_links: Vec::new(),
            target_links: Vec::new(),
            layer: 0,
            x0: 0.0,
            x1: 0.0,
            y0: 0.0,
            y1: 0.0,
            gap: 0.0,
            frame: Frame::default(),
        });
    }

    let mut links = Vec::with_capacity(data.links.len());
    for (index, link) in data.links.iter().enumerate() {
        let resolve = |id: &str| {
            id_to_idx
                .get(id)
                .copied()
                .ok_or_else(|| LayoutError::UnknownNodeReference {
                    link: index,
                    id: id.to_string(),
                })
        };
        let source = resolve(&link.source)?;
        let target = resolve(&link.target)?;
        if !(link.value.is_finite() && link.value >= 0.0) {
            return Err(LayoutError::InvalidLinkValue {
                link: index,
                value: link.value,
            });
        }
        nodes[source].source_links.push(index);
        nodes[source].info.out_degree += 1;
        nodes[target].target_links.push(index);
        nodes[target].info.in_degree += 1;
        links.push(WorkLink {
            index,
            source,
            target,
            value: link.value,
            color: link.color.clone(),
            data: link.data.clone(),
            y0: 0.0,
            y1: 0.0,
            width: 0.0,
        });
    }

    Ok(WorkGraph { nodes, links })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{InputLink, InputNode};

    fn data(nodes: &[&str], links: &[(&str, &str, f32)]) -> SankeyData {
        SankeyData {
            nodes: nodes.iter().map(|id| InputNode::new(*id)).collect(),
            links: links
                .iter()
                .map(|(s, t, v)| InputLink::new(*s, *t, *v))
                .collect(),
        }
    }

    #[test]
    fn builds_adjacency_by_index() {
        let graph = normalize(&data(&["a", "b", "c"], &[("a", "b", 1.0), ("a", "c", 2.0)])).unwrap();
        assert_eq!(graph.nodes[0].source_links, vec![0, 1]);
        assert_eq!(graph.nodes[2].target_links, vec![1]);
        assert_eq!(graph.nodes[0].info.out_degree, 2);
        assert_eq!(graph.links[1].target, 2);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = normalize(&data(&["a", "a"], &[])).unwrap_err();
        assert_eq!(err, LayoutError::DuplicateNodeId { id: "a".into() });
    }

    #[test]
    fn rejects_unknown_reference() {
        let err = normalize(&data(&["a"], &[("a", "zz", 1.0)])).unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnknownNodeReference {
                link: 0,
                id: "zz".into()
            }
        );
    }

    #[test]
    fn rejects_negative_and_nan_values() {
        let err = normalize(&data(&["a", "b"], &[("a", "b", -1.0)])).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidLinkValue { link: 0, .. }));
        let err = normalize(&data(&["a", "b"], &[("a", "b", f32::NAN)])).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidLinkValue { .. }));
    }

    #[test]
    fn rejects_invalid_fixed_values() {
        for bad in [-2.0, f32::NAN, f32::INFINITY] {
            let mut input = data(&["a", "b"], &[("a", "b", 1.0)]);
            input.nodes[1].value = Some(bad);
            let err = normalize(&input).unwrap_err();
            assert!(
                matches!(&err, LayoutError::InvalidNodeValue { id, .. } if id == "b"),
                "{err:?}"
            );
        }

        let mut input = data(&["a", "b"], &[("a", "b", 1.0)]);
        input.nodes[0].value = Some(0.0);
        let graph = normalize(&input).unwrap();
        assert_eq!(graph.nodes[0].fixed_value, Some(0.0));
    }

    #[test]
    fn leaves_input_untouched() {
        let input = data(&["a", "b"], &[("a", "b", 4.0)]);
        let before = input.clone();
        let _ = normalize(&input).unwrap();
        assert_eq!(input, before);
    }
}
