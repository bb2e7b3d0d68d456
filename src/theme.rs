use serde::{Deserialize, Serialize};

const NIVO: [&str; 6] = ["#e8c1a0", "#f47560", "#f1e15b", "#e8a838", "#61cdbb", "#97e3d5"];

const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const ACCENT: [&str; 8] = [
    "#7fc97f", "#beaed4", "#fdc086", "#ffff99", "#386cb0", "#f0027f", "#bf5b17", "#666666",
];

const DARK2: [&str; 8] = [
    "#1b9e77", "#d95f02", "#7570b3", "#e7298a", "#66a61e", "#e6ab02", "#a6761d", "#666666",
];

const PAIRED: [&str; 12] = [
    "#a6cee3", "#1f78b4", "#b2df8a", "#33a02c", "#fb9a99", "#e31a1c", "#fdbf6f", "#ff7f00",
    "#cab2d6", "#6a3d9a", "#ffff99", "#b15928",
];

const PASTEL1: [&str; 9] = [
    "#fbb4ae", "#b3cde3", "#ccebc5", "#decbe4", "#fed9a6", "#ffffcc", "#e5d8bd", "#fddaec",
    "#f2f2f2",
];

const PASTEL2: [&str; 8] = [
    "#b3e2cd", "#fdcdac", "#cbd5e8", "#f4cae4", "#e6f5c9", "#fff2ae", "#f1e2cc", "#cccccc",
];

const SET1: [&str; 9] = [
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33", "#a65628", "#f781bf",
    "#999999",
];

const SET2: [&str; 8] = [
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494", "#b3b3b3",
];

const SET3: [&str; 12] = [
    "#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462", "#b3de69", "#fccde5",
    "#d9d9d9", "#bc80bd", "#ccebc5", "#ffed6f",
];

const TABLEAU10: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

/// Categorical palettes available to the ordinal node color scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Nivo,
    Category10,
    Accent,
    Dark2,
    Paired,
    Pastel1,
    Pastel2,
    Set1,
    Set2,
    Set3,
    Tableau10,
}

impl ColorScheme {
    pub fn from_name(name: &str) -> Option<Self> {
        let scheme = match name.trim().to_ascii_lowercase().as_str() {
            "nivo" => Self::Nivo,
            "category10" => Self::Category10,
            "accent" => Self::Accent,
            "dark2" => Self::Dark2,
            "paired" => Self::Paired,
            "pastel1" => Self::Pastel1,
            "pastel2" => Self::Pastel2,
            "set1" => Self::Set1,
            "set2" => Self::Set2,
            "set3" => Self::Set3,
            "tableau10" => Self::Tableau10,
            _ => return None,
        };
        Some(scheme)
    }

    pub fn colors(self) -> &'static [&'static str] {
        match self {
            Self::Nivo => &NIVO,
            Self::Category10 => &CATEGORY10,
            Self::Accent => &ACCENT,
            Self::Dark2 => &DARK2,
            Self::Paired => &PAIRED,
            Self::Pastel1 => &PASTEL1,
            Self::Pastel2 => &PASTEL2,
            Self::Set1 => &SET1,
            Self::Set2 => &SET2,
            Self::Set3 => &SET3,
            Self::Tableau10 => &TABLEAU10,
        }
    }

    /// Color for the `index`-th key, cycling through the palette.
    pub fn pick(self, index: usize) -> &'static str {
        let colors = self.colors();
        colors[index % colors.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_cycle_through_palette() {
        let scheme = ColorScheme::Nivo;
        assert_eq!(scheme.pick(0), "#e8c1a0");
        assert_eq!(scheme.pick(6), scheme.pick(0));
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(ColorScheme::from_name("Set2"), Some(ColorScheme::Set2));
        assert_eq!(ColorScheme::from_name("nope"), None);
    }
}
