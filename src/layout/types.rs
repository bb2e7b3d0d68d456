use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ir::Datum;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Layers run left to right, nodes stack top to bottom.
    #[default]
    Horizontal,
    /// Layers run top to bottom, nodes stack left to right.
    Vertical,
}

/// Topology of a node as seen by alignment and sort policies.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub id: String,
    pub index: usize,
    pub value: f32,
    /// Longest path from any source.
    pub depth: usize,
    /// Longest path to any sink.
    pub reverse_depth: usize,
    pub in_degree: usize,
    pub out_degree: usize,
    /// Smallest depth among the node's direct targets.
    pub min_target_depth: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkInfo {
    pub index: usize,
    pub source: usize,
    pub target: usize,
    pub value: f32,
}

pub type AlignFn = dyn Fn(&NodeInfo, usize) -> usize + Send + Sync;
pub type NodeCompareFn = dyn Fn(&NodeInfo, &NodeInfo) -> Ordering + Send + Sync;
pub type LinkCompareFn = dyn Fn(&LinkInfo, &LinkInfo) -> Ordering + Send + Sync;

/// Where a node settles within the layers it could occupy.
#[derive(Clone, Default)]
pub enum Align {
    Start,
    End,
    Justify,
    #[default]
    Center,
    /// Receives the node and the layer count; the result is clamped.
    Custom(Arc<AlignFn>),
}

impl Align {
    pub fn layer(&self, node: &NodeInfo, layer_count: usize) -> usize {
        let last = layer_count.saturating_sub(1);
        let layer = match self {
            Align::Start => node.depth,
            Align::End => last.saturating_sub(node.reverse_depth),
            Align::Justify => {
                if node.out_degree > 0 {
                    node.depth
                } else {
                    last
                }
            }
            Align::Center => {
                if node.in_degree > 0 {
                    node.depth
                } else if let Some(depth) = node.min_target_depth {
                    depth.saturating_sub(1)
                } else {
                    0
                }
            }
            Align::Custom(align) => align(node, layer_count),
        };
        layer.min(last)
    }
}

impl fmt::Debug for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Align::Start => write!(f, "Start"),
            Align::End => write!(f, "End"),
            Align::Justify => write!(f, "Justify"),
            Align::Center => write!(f, "Center"),
            Align::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Ordering of nodes inside a layer.
#[derive(Clone, Default)]
pub enum NodeSort {
    /// Re-sorted by position after every relaxation round.
    #[default]
    Automatic,
    InputOrder,
    /// Sorted once before stacking, never re-sorted.
    Custom(Arc<NodeCompareFn>),
}

impl NodeSort {
    pub fn ascending() -> Self {
        NodeSort::Custom(Arc::new(|a: &NodeInfo, b: &NodeInfo| a.value.total_cmp(&b.value)))
    }

    pub fn descending() -> Self {
        NodeSort::Custom(Arc::new(|a: &NodeInfo, b: &NodeInfo| b.value.total_cmp(&a.value)))
    }
}

impl fmt::Debug for NodeSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeSort::Automatic => write!(f, "Automatic"),
            NodeSort::InputOrder => write!(f, "InputOrder"),
            NodeSort::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Ordering of the links attached to a node.
#[derive(Clone, Default)]
pub enum LinkSort {
    /// Ordered by the position of the node at the other end.
    #[default]
    Automatic,
    InputOrder,
    Custom(Arc<LinkCompareFn>),
}

impl LinkSort {
    /// Input-ordered nodes keep their links in input order as well.
    pub fn following(sort: &NodeSort) -> Self {
        match sort {
            NodeSort::InputOrder => LinkSort::InputOrder,
            _ => LinkSort::Automatic,
        }
    }
}

impl fmt::Debug for LinkSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkSort::Automatic => write!(f, "Automatic"),
            LinkSort::InputOrder => write!(f, "InputOrder"),
            LinkSort::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Runtime parameters of a single layout call.
#[derive(Debug, Clone)]
pub struct LayoutParams {
    pub orientation: Orientation,
    pub width: f32,
    pub height: f32,
    pub align: Align,
    pub node_sort: NodeSort,
    pub link_sort: LinkSort,
    pub node_thickness: f32,
    pub node_spacing: f32,
    pub spacing_increase: f32,
    pub node_inner_padding: f32,
    pub iterations: usize,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            width: 560.0,
            height: 360.0,
            align: Align::Center,
            node_sort: NodeSort::Automatic,
            link_sort: LinkSort::Automatic,
            node_thickness: 12.0,
            node_spacing: 12.0,
            spacing_increase: 0.0,
            node_inner_padding: 0.0,
            iterations: 6,
        }
    }
}

impl LayoutParams {
    /// Extent handed to the layering step: (depth axis, cross axis).
    pub fn extent(&self) -> (f32, f32) {
        match self.orientation {
            Orientation::Horizontal => (self.width, self.height),
            Orientation::Vertical => (self.height, self.width),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeyNode {
    pub id: String,
    pub index: usize,
    pub value: f32,
    pub depth: usize,
    pub layer: usize,
    pub x0: f32,
    pub x1: f32,
    pub y0: f32,
    pub y1: f32,
    pub gap: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: String,
    pub label: String,
    pub formatted_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_color: Option<String>,
    #[serde(skip_serializing_if = "Datum::is_empty")]
    pub data: Datum,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeyLink {
    pub index: usize,
    pub source: String,
    pub target: String,
    pub source_index: usize,
    pub target_index: usize,
    pub value: f32,
    pub thickness: f32,
    pub pos0: f32,
    pub pos1: f32,
    pub color: Option<String>,
    pub formatted_value: String,
    #[serde(skip_serializing_if = "Datum::is_empty")]
    pub data: Datum,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendDatum {
    pub id: String,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyLayout {
    pub orientation: Orientation,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
    pub legend: Vec<LegendDatum>,
}

impl SankeyLayout {
    pub fn node(&self, id: &str) -> Option<&SankeyNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn layer_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| node.layer + 1)
            .max()
            .unwrap_or(0)
    }
}
