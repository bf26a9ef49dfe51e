use std::fmt;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use itertools::Itertools;
use serde::Deserialize;

use crate::citymodel::SurfaceRole;


const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Runtime configuration for underpass detection.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub eps: f64,
    pub roof_roles: Vec<SurfaceRole>,
    pub ground_roles: Vec<SurfaceRole>,
    pub output_dir: PathBuf,
    pub write_surfaces: bool,
    pub write_geojson: bool,
    pub crs: String,
    pub clip_factor: f64,
    #[serde(default)]
    pub lod: Option<String>,
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default = "default_progress")]
    pub progress: bool,
}

fn default_progress() -> bool {
    true
}

/// Loads the built-in default settings only.
pub fn load_default_config() -> Result<Settings> {
    let settings: Settings = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .build()?
        .try_deserialize()?;

    validate_config(&settings)?;

    Ok(settings)
}

/// Loads the settings for a run: built-in defaults, then the optional
/// config file, then `UNDERPASS_*` environment variables, then CLI flags.
pub fn load_config(args: &CliArgs) -> Result<Settings> {
    let mut builder =
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

    if let Some(path) = &args.config {
        tracing::info!(config = ?path, "using configuration file");
        builder = builder.add_source(File::from(path.clone()).required(true));
    }

    let mut settings: Settings = builder
        .add_source(
            Environment::with_prefix("underpass")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("roof_roles")
                .with_list_parse_key("ground_roles"),
        )
        .build()
        .map_err(|err| anyhow!("error loading configuration: {}", err))?
        .try_deserialize()
        .map_err(|err| anyhow!("error deserializing configuration: {}", err))?;

    args.apply(&mut settings);

    validate_config(&settings)?;

    tracing::debug!(?settings, "loaded settings");

    Ok(settings)
}

pub fn validate_config(settings: &Settings) -> Result<()> {
    if !settings.eps.is_finite() || settings.eps < 0.0 {
        return Err(anyhow!(
            "eps must be a finite, non-negative number, got {}",
            settings.eps
        ));
    }
    if !settings.clip_factor.is_finite() || settings.clip_factor <= 0.0 {
        return Err(anyhow!(
            "clip_factor must be positive, got {}",
            settings.clip_factor
        ));
    }
    if settings.roof_roles.is_empty() {
        return Err(anyhow!("roof_roles must name at least one surface role"));
    }
    if settings.ground_roles.is_empty() {
        return Err(anyhow!("ground_roles must name at least one surface role"));
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about = "Detect buildings with underpasses in a CityJSON model")]
pub struct CliArgs {
    /// Input CityJSON file.
    pub input: PathBuf,

    /// Minimum difference between roof and ground areas to consider an underpass.
    #[arg(long)]
    pub eps: Option<f64>,

    /// Semantic surface roles merged into the upper region, separated by spaces.
    /// For example `RoofSurface OuterFloorSurface` or `OuterCeilingSurface`.
    #[arg(long, num_args = 1.., value_delimiter = ' ')]
    pub roof_roles: Option<Vec<String>>,

    /// Semantic surface roles merged into the ground footprint, separated by spaces.
    #[arg(long, num_args = 1.., value_delimiter = ' ')]
    pub ground_roles: Option<Vec<String>>,

    /// Directory receiving the output files.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Also write the merged regions as GeoJSON layers.
    #[arg(long)]
    pub geojson: bool,

    /// Do not write the per-surface tables.
    #[arg(long)]
    pub no_surfaces: bool,

    /// Use the geometry with this level of detail instead of the first one.
    #[arg(long)]
    pub lod: Option<String>,

    /// Number of worker threads. Defaults to the number of logical cores.
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Additional TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log debug output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Overrides `settings` with every flag given on the command line.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(eps) = self.eps {
            settings.eps = eps;
        }
        if let Some(roles) = &self.roof_roles {
            settings.roof_roles = roles.iter().map(|r| SurfaceRole::from(r.as_str())).collect();
        }
        if let Some(roles) = &self.ground_roles {
            settings.ground_roles = roles.iter().map(|r| SurfaceRole::from(r.as_str())).collect();
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if self.geojson {
            settings.write_geojson = true;
        }
        if self.no_surfaces {
            settings.write_surfaces = false;
        }
        if let Some(lod) = &self.lod {
            settings.lod = Some(lod.clone());
        }
        if let Some(threads) = self.threads {
            settings.threads = Some(threads);
        }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Tolerance: {:e}
  - Roof Roles: {}
  - Ground Roles: {}
  - Output Directory: {}
  - LoD: {}
  ",
            self.eps,
            self.roof_roles.iter().join(", "),
            self.ground_roles.iter().join(", "),
            self.output_dir.display(),
            self.lod.as_deref().unwrap_or("first geometry"),
        )
    }
}
