#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod format;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, SankeyConfig, load_config};
pub use format::NumberFormat;
pub use ir::{FlowBuilder, InputLink, InputNode, SankeyData};
pub use layout::{
    Accessors, LayoutError, LayoutParams, SankeyLayout, compute_sankey_layout, enrich,
    layout_from_config,
};
pub use parser::{ParseError, parse_input, parse_sankey};
pub use theme::ColorScheme;
