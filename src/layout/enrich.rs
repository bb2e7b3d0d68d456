use std::fmt;
use std::sync::Arc;

use crate::format::{FormatSpecError, NumberFormat};
use crate::theme::ColorScheme;

use super::types::{LegendDatum, SankeyLayout, SankeyNode};

pub trait NodeColor: Send + Sync {
    fn color(&self, node: &SankeyNode) -> String;
}

pub trait NodeLabel: Send + Sync {
    fn label(&self, node: &SankeyNode) -> String;
}

pub trait ValueFormatter: Send + Sync {
    fn format(&self, value: f32) -> String;
}

impl<F> NodeColor for F
where
    F: Fn(&SankeyNode) -> String + Send + Sync,
{
    fn color(&self, node: &SankeyNode) -> String {
        self(node)
    }
}

impl<F> NodeLabel for F
where
    F: Fn(&SankeyNode) -> String + Send + Sync,
{
    fn label(&self, node: &SankeyNode) -> String {
        self(node)
    }
}

impl<F> ValueFormatter for F
where
    F: Fn(f32) -> String + Send + Sync,
{
    fn format(&self, value: f32) -> String {
        self(value)
    }
}

/// Ordinal scale over a categorical palette. Ids take colors in first-seen
/// order, which is the node's input position, so an id keeps its color only
/// while the input order stays the same.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrdinalColors {
    pub scheme: ColorScheme,
}

impl NodeColor for OrdinalColors {
    fn color(&self, node: &SankeyNode) -> String {
        self.scheme.pick(node.index).to_string()
    }
}

/// Reads the color from a node property, falling back to a palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatumColors {
    pub property: String,
    pub fallback: OrdinalColors,
}

impl NodeColor for DatumColors {
    fn color(&self, node: &SankeyNode) -> String {
        let from_input = match self.property.as_str() {
            "color" => node.input_color.clone(),
            key => node
                .data
                .get(key)
                .and_then(|value| value.as_str())
                .map(str::to_string),
        };
        from_input.unwrap_or_else(|| self.fallback.color(node))
    }
}

/// Label accessor: `id`, `label` or any extra property of the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyLabel {
    pub property: String,
}

impl Default for PropertyLabel {
    fn default() -> Self {
        Self {
            property: "id".to_string(),
        }
    }
}

impl NodeLabel for PropertyLabel {
    fn label(&self, node: &SankeyNode) -> String {
        let found = match self.property.as_str() {
            "id" => None,
            "label" => node.input_label.clone(),
            key => node.data.get(key).and_then(|value| match value {
                serde_json::Value::String(text) => Some(text.clone()),
                serde_json::Value::Number(number) => Some(number.to_string()),
                _ => None,
            }),
        };
        found.unwrap_or_else(|| node.id.clone())
    }
}

/// Formats with the plain number display unless a specifier is given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecFormatter {
    format: Option<NumberFormat>,
}

impl SpecFormatter {
    pub fn new(spec: Option<&str>) -> Result<Self, FormatSpecError> {
        let format = spec.map(NumberFormat::parse).transpose()?;
        Ok(Self { format })
    }
}

impl ValueFormatter for SpecFormatter {
    fn format(&self, value: f32) -> String {
        match &self.format {
            Some(format) => format.format(value),
            None => value.to_string(),
        }
    }
}

/// The three enrichment strategies handed to [`enrich`].
#[derive(Clone)]
pub struct Accessors {
    pub color: Arc<dyn NodeColor>,
    pub label: Arc<dyn NodeLabel>,
    pub format: Arc<dyn ValueFormatter>,
}

impl Default for Accessors {
    fn default() -> Self {
        Self {
            color: Arc::new(OrdinalColors::default()),
            label: Arc::new(PropertyLabel::default()),
            format: Arc::new(SpecFormatter::default()),
        }
    }
}

impl fmt::Debug for Accessors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessors").finish_non_exhaustive()
    }
}

/// Fills colors, labels and formatted values, then rebuilds the legend.
/// Running it twice with the same accessors changes nothing.
pub fn enrich(layout: &mut SankeyLayout, accessors: &Accessors) {
    for node in &mut layout.nodes {
        node.color = accessors.color.color(node);
        node.label = accessors.label.label(node);
        node.formatted_value = accessors.format.format(node.value);
    }
    for link in &mut layout.links {
        link.formatted_value = accessors.format.format(link.value);
        if link.color.is_none() {
            link.color = Some(layout.nodes[link.source_index].color.clone());
        }
    }
    layout.legend = layout
        .nodes
        .iter()
        .map(|node| LegendDatum {
            id: node.id.clone(),
            label: node.label.clone(),
            color: node.color.clone(),
        })
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Datum;
    use crate::layout::types::Orientation;

    fn node(id: &str, index: usize) -> SankeyNode {
        SankeyNode {
            id: id.to_string(),
            index,
            value: 12.5,
            depth: 0,
            layer: 0,
            x0: 0.0,
            x1: 0.0,
            y0: 0.0,
            y1: 0.0,
            gap: 0.0,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            color: String::new(),
            label: String::new(),
            formatted_value: String::new(),
            input_label: None,
            input_color: None,
            data: Datum::new(),
        }
    }

    #[test]
    fn label_falls_back_to_id() {
        let mut n = node("a", 0);
        let accessor = PropertyLabel {
            property: "label".into(),
        };
        assert_eq!(accessor.label(&n), "a");
        n.input_label = Some("Alpha".into());
        assert_eq!(accessor.label(&n), "Alpha");
        n.data.insert("short".into(), serde_json::json!("A"));
        let accessor = PropertyLabel {
            property: "short".into(),
        };
        assert_eq!(accessor.label(&n), "A");
    }

    #[test]
    fn ordinal_colors_follow_input_position() {
        let colors = OrdinalColors::default();
        assert_eq!(colors.color(&node("a", 0)), colors.color(&node("b", 0)));
        assert_eq!(colors.color(&node("a", 2)), ColorScheme::Nivo.pick(2));
        assert_ne!(colors.color(&node("a", 0)), colors.color(&node("a", 1)));
    }

    #[test]
    fn datum_colors_prefer_input() {
        let mut n = node("a", 1);
        let colors = DatumColors {
            property: "color".into(),
            fallback: OrdinalColors::default(),
        };
        assert_eq!(colors.color(&n), ColorScheme::Nivo.pick(1));
        n.input_color = Some("#000".into());
        assert_eq!(colors.color(&n), "#000");
    }

    #[test]
    fn closures_work_as_strategies() {
        let accessors = Accessors {
            color: Arc::new(|_: &SankeyNode| "red".to_string()),
            label: Arc::new(|n: &SankeyNode| n.id.to_uppercase()),
            format: Arc::new(|v: f32| format!("{v} kWh")),
        };
        let mut layout = SankeyLayout {
            orientation: Orientation::Horizontal,
            width: 0.0,
            height: 0.0,
            nodes: vec![node("a", 0)],
            links: Vec::new(),
            legend: Vec::new(),
        };
        enrich(&mut layout, &accessors);
        assert_eq!(layout.nodes[0].label, "A");
        assert_eq!(layout.nodes[0].formatted_value, "12.5 kWh");
        assert_eq!(
            layout.legend,
            vec![LegendDatum {
                id: "a".into(),
                label: "A".into(),
                color: "red".into()
            }]
        );
    }
}
