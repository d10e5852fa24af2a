//! `svgsolid` turns SVG outlines into printable STL solids.
//!
//! - `svgsolid preflight <input.svg>` prints the diagnostics as JSON
//! - `svgsolid convert <input.svg> -o <out.stl>` extrudes and exports

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use svgsolid::{
    generate, GenerateOptions, GeometryPipeline, ProfileSettings, Severity, StlFormat,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "svgsolid")]
#[command(about = "Extrude SVG outlines into printable STL solids", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diagnose an SVG file without converting it
    Preflight {
        input: PathBuf,

        /// Settings JSON file (defaults to the user config file)
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Convert an SVG file into an STL solid
    Convert {
        input: PathBuf,

        /// Output STL path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        overrides: SettingsOverrides,

        /// Write ASCII STL instead of binary
        #[arg(long)]
        ascii: bool,

        /// Abort the conversion after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Convert even when preflight reports errors
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args)]
struct SettingsOverrides {
    /// Settings JSON file (defaults to the user config file)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Extrusion height
    #[arg(long)]
    thickness: Option<f64>,

    /// Base slab height (0 disables the base)
    #[arg(long)]
    base_thickness: Option<f64>,

    /// Outline offset, positive grows and negative shrinks
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<f64>,

    /// Simplification tolerance (0 disables simplification)
    #[arg(long)]
    simplify: Option<f64>,

    /// Drop closed shapes smaller than this area
    #[arg(long)]
    remove_islands: Option<f64>,

    /// Top edge chamfer size
    #[arg(long)]
    bevel: Option<f64>,
}

impl SettingsOverrides {
    fn resolve(&self) -> Result<ProfileSettings> {
        let mut settings = load_settings(self.settings.as_deref())?;
        if let Some(v) = self.thickness {
            settings.thickness = v;
        }
        if let Some(v) = self.base_thickness {
            settings.base_thickness = v;
        }
        if let Some(v) = self.offset {
            settings.offset = v;
        }
        if let Some(v) = self.simplify {
            settings.simplify_tolerance = v;
        }
        if let Some(v) = self.remove_islands {
            settings.remove_islands_threshold = v;
        }
        if let Some(v) = self.bevel {
            settings.bevel = v;
        }
        Ok(settings)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Preflight { input, settings } => {
            let settings = load_settings(settings.as_deref())?;
            preflight(&input, settings)
        }
        Commands::Convert {
            input,
            output,
            overrides,
            ascii,
            timeout_ms,
            force,
        } => {
            let settings = overrides.resolve()?;
            let options = GenerateOptions {
                format: if ascii { StlFormat::Ascii } else { StlFormat::Binary },
                timeout: timeout_ms.map(Duration::from_millis),
            };
            convert(&input, &output, settings, options, force)
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<ProfileSettings> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => ProfileSettings::default_settings_path()?,
    };
    ProfileSettings::load_from_path(&path)
}

fn read_markup(input: &Path) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("read {}", input.display()))
}

fn preflight(input: &Path, settings: ProfileSettings) -> Result<()> {
    let markup = read_markup(input)?;
    let pipeline = GeometryPipeline::new(settings);
    let parsed = pipeline.parse(&markup)?;
    let result = pipeline.preflight(&parsed);
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("serialize preflight result")?
    );
    Ok(())
}

fn convert(
    input: &Path,
    output: &Path,
    settings: ProfileSettings,
    options: GenerateOptions,
    force: bool,
) -> Result<()> {
    let markup = read_markup(input)?;

    let pipeline = GeometryPipeline::new(settings.clone());
    let parsed = pipeline.parse(&markup)?;
    let report = pipeline.preflight(&parsed);
    for issue in &report.issues {
        match issue.severity {
            Severity::Error => tracing::error!(detail = ?issue.detail, "{}", issue.message),
            Severity::Warning => tracing::warn!(detail = ?issue.detail, "{}", issue.message),
            Severity::Info => tracing::info!(detail = ?issue.detail, "{}", issue.message),
        }
    }
    if !report.passed && !force {
        bail!("preflight failed; fix the reported errors or pass --force");
    }

    let result = generate(&markup, &settings, options);
    for warning in &result.warnings {
        tracing::warn!("{warning}");
    }
    let Some(blob) = result.blob else {
        bail!(
            "conversion failed: {}",
            result.error.unwrap_or_else(|| "unknown error".to_string())
        );
    };
    fs::write(output, &blob).with_context(|| format!("write {}", output.display()))?;
    println!(
        "Wrote {} ({} bytes, {:.1} ms)",
        output.display(),
        blob.len(),
        result.processing_time
    );
    Ok(())
}
