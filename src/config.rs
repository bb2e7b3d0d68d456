use crate::format::FormatSpecError;
use crate::layout::{
    Accessors, Align, DatumColors, LayoutParams, LinkSort, NodeSort, OrdinalColors, Orientation,
    PropertyLabel, SpecFormatter,
};
use crate::theme::ColorScheme;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignMode {
    #[serde(alias = "left")]
    Start,
    #[serde(alias = "right")]
    End,
    #[default]
    Center,
    Justify,
}

impl From<AlignMode> for Align {
    fn from(mode: AlignMode) -> Self {
        match mode {
            AlignMode::Start => Align::Start,
            AlignMode::End => Align::End,
            AlignMode::Center => Align::Center,
            AlignMode::Justify => Align::Justify,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Auto,
    Input,
    Ascending,
    Descending,
}

impl From<SortMode> for NodeSort {
    fn from(mode: SortMode) -> Self {
        match mode {
            SortMode::Auto => NodeSort::Automatic,
            SortMode::Input => NodeSort::InputOrder,
            SortMode::Ascending => NodeSort::ascending(),
            SortMode::Descending => NodeSort::descending(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorConfig {
    pub scheme: ColorScheme,
    /// Node property holding an explicit color, e.g. `color`.
    pub datum: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeyConfig {
    pub layout: Orientation,
    pub width: f32,
    pub height: f32,
    pub align: AlignMode,
    pub sort: SortMode,
    pub node_thickness: f32,
    pub node_spacing: f32,
    pub spacing_increase: f32,
    pub node_inner_padding: f32,
    pub iterations: usize,
    pub colors: ColorConfig,
    pub label: String,
    pub value_format: Option<String>,
}

impl Default for SankeyConfig {
    fn default() -> Self {
        Self {
            layout: Orientation::Horizontal,
            width: 560.0,
            height: 360.0,
            align: AlignMode::Center,
            sort: SortMode::Auto,
            node_thickness: 12.0,
            node_spacing: 12.0,
            spacing_increase: 0.0,
            node_inner_padding: 0.0,
            iterations: 6,
            colors: ColorConfig::default(),
            label: "id".to_string(),
            value_format: None,
        }
    }
}

impl LayoutParams {
    pub fn from_config(config: &SankeyConfig) -> Self {
        let node_sort = NodeSort::from(config.sort);
        let link_sort = LinkSort::following(&node_sort);
        Self {
            orientation: config.layout,
            width: config.width.max(0.0),
            height: config.height.max(0.0),
            align: config.align.into(),
            node_sort,
            link_sort,
            node_thickness: config.node_thickness.max(0.0),
            node_spacing: config.node_spacing.max(0.0),
            spacing_increase: config.spacing_increase,
            node_inner_padding: config.node_inner_padding,
            iterations: config.iterations,
        }
    }
}

impl Accessors {
    pub fn from_config(config: &SankeyConfig) -> Result<Self, FormatSpecError> {
        let ordinal = OrdinalColors {
            scheme: config.colors.scheme,
        };
        let color: Arc<dyn crate::layout::NodeColor> = match &config.colors.datum {
            Some(property) => Arc::new(DatumColors {
                property: property.clone(),
                fallback: ordinal,
            }),
            None => Arc::new(ordinal),
        };
        Ok(Self {
            color,
            label: Arc::new(PropertyLabel {
                property: config.label.clone(),
            }),
            format: Arc::new(SpecFormatter::new(config.value_format.as_deref())?),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub sankey: SankeyConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    sankey: Option<SankeyConfigFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SankeyConfigFile {
    layout: Option<Orientation>,
    width: Option<f32>,
    height: Option<f32>,
    #[serde(alias = "nodeAlignment")]
    align: Option<AlignMode>,
    sort: Option<SortMode>,
    node_thickness: Option<f32>,
    node_spacing: Option<f32>,
    spacing_increase: Option<f32>,
    node_inner_padding: Option<f32>,
    iterations: Option<usize>,
    color_scheme: Option<String>,
    color_datum: Option<String>,
    label: Option<String>,
    value_format: Option<String>,
}

impl SankeyConfigFile {
    fn apply(self, config: &mut SankeyConfig) {
        if let Some(v) = self.layout {
            config.layout = v;
        }
        if let Some(v) = self.width {
            config.width = v;
        }
        if let Some(v) = self.height {
            config.height = v;
        }
        if let Some(v) = self.align {
            config.align = v;
        }
        if let Some(v) = self.sort {
            config.sort = v;
        }
        if let Some(v) = self.node_thickness {
            config.node_thickness = v;
        }
        if let Some(v) = self.node_spacing {
            config.node_spacing = v;
        }
        if let Some(v) = self.spacing_increase {
            config.spacing_increase = v;
        }
        if let Some(v) = self.node_inner_padding {
            config.node_inner_padding = v;
        }
        if let Some(v) = self.iterations {
            config.iterations = v;
        }
        if let Some(scheme) = self.color_scheme.as_deref() {
            match ColorScheme::from_name(scheme) {
                Some(scheme) => config.colors.scheme = scheme,
                None => tracing::warn!(scheme, "unknown color scheme, keeping default"),
            }
        }
        if self.color_datum.is_some() {
            config.colors.datum = self.color_datum;
        }
        if let Some(v) = self.label {
            config.label = v;
        }
        if self.value_format.is_some() {
            config.value_format = self.value_format;
        }
    }
}

fn parse_config_text(contents: &str) -> anyhow::Result<ConfigFile> {
    match serde_json::from_str(contents) {
        Ok(parsed) => Ok(parsed),
        Err(_) => Ok(json5::from_str(contents)?),
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let parsed = parse_config_text(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    if let Some(sankey) = parsed.sankey {
        sankey.apply(&mut config.sankey);
    }
    Ok(config)
}

/// Merges the `sankey` block of a Mermaid init directive.
pub fn merge_init_config(mut config: Config, init: &serde_json::Value) -> anyhow::Result<Config> {
    if let Some(sankey) = init.get("sankey") {
        let file: SankeyConfigFile = serde_json::from_value(sankey.clone())?;
        file.apply(&mut config.sankey);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let parsed = parse_config_text(r#"{"sankey": {"layout": "vertical", "nodeSpacing": 4}}"#)
            .unwrap();
        let mut config = SankeyConfig::default();
        parsed.sankey.unwrap().apply(&mut config);
        assert_eq!(config.layout, Orientation::Vertical);
        assert_eq!(config.node_spacing, 4.0);
        assert_eq!(config.node_thickness, 12.0);
    }

    #[test]
    fn accepts_json5_and_mermaid_alignment_names() {
        let parsed = parse_config_text("{sankey: {nodeAlignment: 'left', colorScheme: 'set2',}}")
            .unwrap();
        let mut config = SankeyConfig::default();
        parsed.sankey.unwrap().apply(&mut config);
        assert_eq!(config.align, AlignMode::Start);
        assert_eq!(config.colors.scheme, ColorScheme::Set2);
    }

    #[test]
    fn init_directive_overrides() {
        let init = serde_json::json!({"sankey": {"width": 800, "sort": "input"}});
        let config = merge_init_config(Config::default(), &init).unwrap();
        assert_eq!(config.sankey.width, 800.0);
        let params = LayoutParams::from_config(&config.sankey);
        assert!(matches!(params.node_sort, NodeSort::InputOrder));
        assert!(matches!(params.link_sort, LinkSort::InputOrder));
    }

    #[test]
    fn bad_value_format_is_reported() {
        let config = SankeyConfig {
            value_format: Some("zz9".into()),
            ..SankeyConfig::default()
        };
        assert!(Accessors::from_config(&config).is_err());
    }

    #[test]
    fn load_without_path_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, Config::default());
    }
}
