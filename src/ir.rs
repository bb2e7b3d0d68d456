use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Extra caller properties carried through the layout untouched.
pub type Datum = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Fixed node value, replaces the sum of the node's links when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
    #[serde(flatten)]
    pub data: Datum,
}

impl InputNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            color: None,
            value: None,
            data: Datum::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputLink {
    pub source: String,
    pub target: String,
    pub value: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(flatten)]
    pub data: Datum,
}

impl InputLink {
    pub fn new(source: impl Into<String>, target: impl Into<String>, value: f32) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
            color: None,
            data: Datum::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SankeyData {
    #[serde(default)]
    pub nodes: Vec<InputNode>,
    #[serde(default)]
    pub links: Vec<InputLink>,
}

impl SankeyData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node unless one with the same id already exists. Scans the node
    /// list; use [`FlowBuilder`] when adding many flows.
    pub fn ensure_node(&mut self, id: &str) {
        if !self.nodes.iter().any(|node| node.id == id) {
            self.nodes.push(InputNode::new(id));
        }
    }

    /// Adds a link, creating missing endpoints in first-appearance order.
    pub fn push_flow(&mut self, source: &str, target: &str, value: f32) {
        self.ensure_node(source);
        self.ensure_node(target);
        self.links.push(InputLink::new(source, target, value));
    }
}

/// Builds [`SankeyData`] from a stream of flows, looking endpoints up by id.
#[derive(Debug, Default)]
pub struct FlowBuilder {
    data: SankeyData,
    index: HashMap<String, usize>,
}

impl FlowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, id: &str) {
        if !self.index.contains_key(id) {
            self.index.insert(id.to_string(), self.data.nodes.len());
            self.data.nodes.push(InputNode::new(id));
        }
    }

    /// Same ordering as [`SankeyData::push_flow`].
    pub fn push_flow(&mut self, source: &str, target: &str, value: f32) {
        self.ensure_node(source);
        self.ensure_node(target);
        self.data.links.push(InputLink::new(source, target, value));
    }

    pub fn finish(self) -> SankeyData {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_extra_properties() {
        let json = r#"{
            "nodes": [{"id": "a", "nodeColor": "red"}, {"id": "b", "label": "Bee"}],
            "links": [{"source": "a", "target": "b", "value": 3, "kind": "x"}]
        }"#;
        let data: SankeyData = serde_json::from_str(json).unwrap();
        assert_eq!(data.nodes.len(), 2);
        assert_eq!(data.nodes[0].data["nodeColor"], "red");
        assert_eq!(data.nodes[1].label.as_deref(), Some("Bee"));
        assert_eq!(data.links[0].value, 3.0);
        assert_eq!(data.links[0].data["kind"], "x");
    }

    #[test]
    fn push_flow_keeps_first_appearance_order() {
        let mut data = SankeyData::new();
        data.push_flow("b", "a", 1.0);
        data.push_flow("a", "c", 2.0);
        let ids: Vec<_> = data.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
        assert_eq!(data.links.len(), 2);
    }

    #[test]
    fn builder_matches_push_flow() {
        let flows = [("b", "a", 1.0), ("a", "c", 2.0), ("c", "b", 0.5), ("d", "a", 3.0)];
        let mut data = SankeyData::new();
        let mut builder = FlowBuilder::new();
        for (source, target, value) in flows {
            data.push_flow(source, target, value);
            builder.push_flow(source, target, value);
        }
        assert_eq!(builder.finish(), data);
    }
}
