//! Tracery CLI
//!
//! Usage:
//!   tracery [OPTIONS] [FILE]
//!
//! Reads a TOML scene from FILE (or stdin), lays it out and prints the text
//! dump. Non-fatal diagnostics go to stderr.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::Parser;
use log::{debug, error, info, warn, LevelFilter};

use tracery::{layout_source, LayoutConfig, RenderConfig, RenderError, Theme};

#[derive(Parser, Debug)]
#[command(name = "tracery")]
#[command(about = "Resolve, route and dump declarative diagram geometry")]
struct Cli {
    /// Scene file in TOML format (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Theme file with tint colors (TOML format)
    #[arg(short, long)]
    theme: Option<PathBuf>,

    /// Routing grid cell size
    #[arg(long)]
    grid_size: Option<f64>,

    /// Minimum clearance between connectors and nodes
    #[arg(long)]
    min_spacing: Option<f64>,

    /// Padding added around nodes before routing
    #[arg(long)]
    node_padding: Option<f64>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    fn layout_config(&self) -> LayoutConfig {
        let mut config = LayoutConfig::default();
        if let Some(grid_size) = self.grid_size {
            config = config.with_grid_size(grid_size);
        }
        if let Some(min_spacing) = self.min_spacing {
            config = config.with_min_spacing(min_spacing);
        }
        if let Some(node_padding) = self.node_padding {
            config = config.with_node_padding(node_padding);
        }
        config
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = LevelFilter::from_str(&cli.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", cli.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
    debug!(cli:?; "Parsed arguments");

    let theme = match &cli.theme {
        Some(path) => match Theme::from_file(path) {
            Ok(theme) => theme,
            Err(e) => {
                error!("Error loading theme '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => Theme::default(),
    };

    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                error!("Error reading file '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                error!("Error reading from stdin: {}", e);
                process::exit(1);
            }
            (buffer, "<stdin>".to_string())
        }
    };

    let config = RenderConfig::new()
        .with_layout(cli.layout_config())
        .with_theme(theme);
    match layout_source(&source, &config) {
        Ok(layout) => {
            for diagnostic in &layout.diagnostics {
                warn!("{diagnostic}");
            }
            print!("{}", layout.dump());
            info!(file = filename.as_str(); "Completed successfully");
        }
        Err(RenderError::Scene(e)) => {
            eprint!("{}", e.format(&source, &filename));
            process::exit(1);
        }
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}
