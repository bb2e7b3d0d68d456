use crate::config::{AlignMode, Config, SortMode, load_config, merge_init_config};
use crate::layout::{Orientation, layout_from_config};
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_input;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sankey-layout",
    version,
    about = "Sankey flow diagram layout (JSON or Mermaid sankey-beta input)"
)]
pub struct Args {
    /// Input file (.json, .mmd, .md) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout JSON. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config file (JSON or JSON5) with a `sankey` block
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Orientation of the layers
    #[arg(long = "layout", value_enum)]
    pub layout: Option<LayoutArg>,

    /// Node alignment across layers
    #[arg(long = "align", value_enum)]
    pub align: Option<AlignArg>,

    /// Node order inside a layer
    #[arg(long = "sort", value_enum)]
    pub sort: Option<SortArg>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LayoutArg {
    Horizontal,
    Vertical,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum AlignArg {
    Start,
    End,
    Center,
    Justify,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum SortArg {
    Auto,
    Input,
    Ascending,
    Descending,
}

impl Args {
    /// Command-line flags win over the config file.
    fn apply(&self, config: &mut Config) {
        let sankey = &mut config.sankey;
        if let Some(width) = self.width {
            sankey.width = width;
        }
        if let Some(height) = self.height {
            sankey.height = height;
        }
        if let Some(layout) = self.layout {
            sankey.layout = match layout {
                LayoutArg::Horizontal => Orientation::Horizontal,
                LayoutArg::Vertical => Orientation::Vertical,
            };
        }
        if let Some(align) = self.align {
            sankey.align = match align {
                AlignArg::Start => AlignMode::Start,
                AlignArg::End => AlignMode::End,
                AlignArg::Center => AlignMode::Center,
                AlignArg::Justify => AlignMode::Justify,
            };
        }
        if let Some(sort) = self.sort {
            sankey.sort = match sort {
                SortArg::Auto => SortMode::Auto,
                SortArg::Input => SortMode::Input,
                SortArg::Ascending => SortMode::Ascending,
                SortArg::Descending => SortMode::Descending,
            };
        }
    }
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut base_config = load_config(args.config.as_deref())?;
    args.apply(&mut base_config);

    let (input, is_markdown) = read_input(args.input.as_deref())?;
    let diagrams = if is_markdown {
        extract_mermaid_blocks(&input)
    } else {
        vec![input]
    };

    if diagrams.is_empty() {
        return Err(anyhow::anyhow!("No Mermaid diagrams found in input"));
    }

    if diagrams.len() == 1 {
        return layout_one(&diagrams[0], &base_config, &args, args.output.as_deref());
    }

    // Multiple diagrams (Markdown input)
    let outputs = resolve_multi_outputs(args.output.as_deref(), diagrams.len())?;
    for (diagram, output) in diagrams.iter().zip(&outputs) {
        layout_one(diagram, &base_config, &args, Some(output))?;
    }
    Ok(())
}

fn layout_one(source: &str, base: &Config, args: &Args, output: Option<&Path>) -> Result<()> {
    let parsed = parse_input(source)?;
    let mut config = base.clone();
    if let Some(init_cfg) = parsed.init_config {
        config = merge_init_config(config, &init_cfg)?;
        // Flags still win over the diagram's own directive.
        args.apply(&mut config);
    }
    let layout = layout_from_config(&parsed.data, &config.sankey)?;
    tracing::info!(
        nodes = layout.nodes.len(),
        links = layout.links.len(),
        "layout ready"
    );
    write_layout_dump(output, &layout)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<(String, bool)> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok((buf, false));
        }
        let content = std::fs::read_to_string(path)?;
        let is_md = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| matches!(ext, "md" | "markdown"))
            .unwrap_or(false);
        return Ok((content, is_md));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, false))
}

fn extract_mermaid_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut in_block = false;
    let mut current = Vec::new();
    let mut fence = "";

    for line in input.lines() {
        let trimmed = line.trim();
        if !in_block {
            if let Some(start_fence) = detect_mermaid_fence(trimmed) {
                in_block = true;
                fence = start_fence;
            }
            continue;
        }
        if is_fence_end(trimmed, fence) {
            in_block = false;
            blocks.push(current.join("\n"));
            current.clear();
            continue;
        }
        current.push(line);
    }

    blocks
}

fn detect_mermaid_fence(line: &str) -> Option<&'static str> {
    ["```", "~~~", ":::"].into_iter().find(|fence| {
        line.strip_prefix(fence).is_some_and(|rest| {
            rest.trim_start_matches(|ch| fence.starts_with(ch))
                .trim()
                .starts_with("mermaid")
        })
    })
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    line.strip_prefix(fence)
        .is_some_and(|rest| rest.trim().is_empty())
}

fn resolve_multi_outputs(output: Option<&Path>, count: usize) -> Result<Vec<PathBuf>> {
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for markdown input"))?;
    if base.is_dir() {
        return Ok((1..=count)
            .map(|idx| base.join(format!("sankey-{idx}.json")))
            .collect());
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("sankey");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    Ok((1..=count)
        .map(|idx| parent.join(format!("{stem}-{idx}.json")))
        .collect())
}
