//! mathlayout - lay out a JSON markup tree and print the display tree
//!
//! Reads a markup tree as JSON from a file or standard input, runs one layout
//! pass, and writes the display tree as JSON or tag markup to standard out.
//! Logging goes to standard error and is controlled by `RUST_LOG`.

use anyhow::{Context, Result};
use clap::Parser;
use math_layout::{typeset, FontParameterSet, LayoutOptions, MathTree};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Lay out a math markup tree.
#[derive(Debug, Parser)]
#[command(name = "mathlayout", version, about, max_term_width(100))]
struct Cli {
    /// JSON markup tree to lay out; `-` reads standard input.
    input: PathBuf,

    /// JSON font parameter set. Defaults to the TeX (Computer Modern) set.
    #[arg(long)]
    font: Option<PathBuf>,

    /// JSON layout options. Flags given on the command line override it.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Lay the root out in display style.
    #[arg(long)]
    display: bool,

    /// Pixels per em for absolute length units.
    #[arg(long)]
    em_px: Option<f64>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Format {
    /// Pretty-printed JSON display tree
    Json,
    /// Nested tag markup with inline styles
    Markup,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let output = cli.run()?;
    println!("{output}");
    Ok(())
}

impl Cli {
    fn run(&self) -> Result<String> {
        let source = read_input(&self.input)?;
        let tree = MathTree::from_json(&source)
            .with_context(|| format!("failed to parse markup tree from {}", self.input.display()))?;
        let font = self.font_parameters()?;
        let options = self.layout_options()?;
        tracing::info!(
            nodes = tree.len(),
            display = options.display,
            "laying out {}",
            self.input.display()
        );

        let result = typeset(&tree, &font, &options).context("layout failed")?;
        match self.format {
            Format::Json => serde_json::to_string_pretty(&result.display)
                .context("failed to serialize display tree"),
            Format::Markup => Ok(result.display.to_markup()),
        }
    }

    fn font_parameters(&self) -> Result<FontParameterSet> {
        match &self.font {
            Some(path) => {
                let json = read_input(path)?;
                FontParameterSet::from_json(&json)
                    .with_context(|| format!("invalid font parameter file {}", path.display()))
            }
            None => Ok(FontParameterSet::tex()),
        }
    }

    fn layout_options(&self) -> Result<LayoutOptions> {
        let mut options = match &self.options {
            Some(path) => {
                let json = read_input(path)?;
                LayoutOptions::from_json(&json)
                    .with_context(|| format!("invalid layout options file {}", path.display()))?
            }
            None => LayoutOptions::default(),
        };
        if self.display {
            options.display = true;
        }
        if let Some(em_px) = self.em_px {
            options.em_px = em_px;
        }
        options.validate().context("invalid layout options")?;
        Ok(options)
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read standard input")?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
