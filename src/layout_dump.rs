use crate::layout::{LegendDatum, Orientation, SankeyLayout};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub orientation: Orientation,
    pub width: f32,
    pub height: f32,
    pub layers: usize,
    pub nodes: Vec<NodeDump>,
    pub links: Vec<LinkDump>,
    pub legend: Vec<LegendDatum>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub label: String,
    pub color: String,
    pub value: f32,
    pub formatted_value: String,
    pub layer: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct LinkDump {
    pub source: String,
    pub target: String,
    pub value: f32,
    pub formatted_value: String,
    pub thickness: f32,
    pub pos0: f32,
    pub pos1: f32,
    pub color: Option<String>,
}

impl LayoutDump {
    pub fn from_layout(layout: &SankeyLayout) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                label: node.label.clone(),
                color: node.color.clone(),
                value: node.value,
                formatted_value: node.formatted_value.clone(),
                layer: node.layer,
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
            })
            .collect();

        let links = layout
            .links
            .iter()
            .map(|link| LinkDump {
                source: link.source.clone(),
                target: link.target.clone(),
                value: link.value,
                formatted_value: link.formatted_value.clone(),
                thickness: link.thickness,
                pos0: link.pos0,
                pos1: link.pos1,
                color: link.color.clone(),
            })
            .collect();

        LayoutDump {
            orientation: layout.orientation,
            width: layout.width,
            height: layout.height,
            layers: layout.layer_count(),
            nodes,
            links,
            legend: layout.legend.clone(),
        }
    }
}

/// Writes the dump as pretty JSON to `path`, or to stdout when no path is given.
pub fn write_layout_dump(path: Option<&Path>, layout: &SankeyLayout) -> anyhow::Result<()> {
    let dump = LayoutDump::from_layout(layout);
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::SankeyData;
    use crate::layout::{Accessors, LayoutParams, compute_sankey_layout};

    #[test]
    fn dump_mirrors_layout() {
        let mut data = SankeyData::new();
        data.push_flow("a", "b", 4.0);
        data.push_flow("a", "c", 2.0);
        let layout =
            compute_sankey_layout(&data, &LayoutParams::default(), &Accessors::default()).unwrap();
        let dump = LayoutDump::from_layout(&layout);
        assert_eq!(dump.layers, 2);
        assert_eq!(dump.nodes.len(), 3);
        assert_eq!(dump.links[0].source, "a");
        assert_eq!(dump.links[0].color.as_deref(), Some(dump.nodes[0].color.as_str()));

        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["orientation"], "horizontal");
        assert_eq!(json["legend"].as_array().map(Vec::len), Some(3));
    }
}
