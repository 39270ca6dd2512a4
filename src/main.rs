use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;
use reqwest::Url;

use objectviewer::catalog::ModelCatalog;
use objectviewer::progress::{LoadStatus, LogStatus};
use objectviewer::routing::{ModelConfig, ViewerRoute};
use objectviewer::units::{GridPlane, UnitScale};
use objectviewer::{ModelSource, ViewerConfig, ViewerSession};

#[derive(Parser, Debug)]
#[command(name = "objectviewer")]
#[command(about = "Load a glTF 1/2 museum object, frame it and report its measurements")]
struct Cli {
    /// Model file path or URL. Bypasses the catalog.
    source: Option<String>,

    /// Model metadata table (models.json)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// 1-based model number in the catalog
    #[arg(long)]
    model: Option<usize>,

    /// Viewer page URL whose query selects the model, e.g. viewer.html?model=2&debug=true
    #[arg(long)]
    page: Option<Url>,

    /// Directory or URL that catalog paths are relative to. Defaults to the catalog's directory.
    #[arg(long)]
    base: Option<String>,

    /// Print box size and clip planes
    #[arg(long)]
    debug: bool,

    /// Override the model's unit (mm, cm, m, in, ft, yd)
    #[arg(long)]
    scale: Option<String>,

    /// Unit to display measurements in. Defaults to the model's unit.
    #[arg(long)]
    unit: Option<String>,

    /// Share of the progress value reserved for the download
    #[arg(long, default_value_t = 75)]
    download_ceiling: u8,

    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 35.0)]
    fov: f32,

    #[arg(long, default_value_t = 10)]
    grid_divisions: u32,

    /// Reject glTF 2 files that need Draco mesh decompression
    #[arg(long)]
    no_compressed_geometry: bool,

    /// Print catalog links for this viewer page and exit
    #[arg(long)]
    links: Option<String>,

    /// Limit --links to one institution
    #[arg(long, requires = "links")]
    institution: Option<String>,
}

impl Cli {
    fn route(&self) -> ViewerRoute {
        let mut route = self
            .page
            .as_ref()
            .map(ViewerRoute::from_url)
            .unwrap_or_default();

        if self.model.is_some() {
            route.model = self.model;
        }
        route.debug |= self.debug;
        if let Some(scale) = &self.scale {
            route.scale = Some(UnitScale::parse_or_unknown(scale));
        }

        route
    }

    fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig {
            field_of_view: self.fov,
            grid_divisions: self.grid_divisions,
            compressed_geometry: !self.no_compressed_geometry,
            ..ViewerConfig::default()
        }
        .with_download_phase_ceiling(self.download_ceiling)
    }

    fn model_config(&self, route: &ViewerRoute) -> Result<ModelConfig> {
        if let Some(source) = &self.source {
            return Ok(ModelConfig::direct(ModelSource::parse(source), route));
        }

        let catalog_path = self
            .catalog
            .as_ref()
            .context("Pass a model file or --catalog")?;
        let catalog = ModelCatalog::from_path(catalog_path)?;

        let base = match &self.base {
            Some(base) => ModelSource::parse(base),
            None => ModelSource::File(
                catalog_path
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_default(),
            ),
        };

        Ok(ModelConfig::resolve(&catalog, route, &base)?)
    }
}

fn print_links(catalog: &ModelCatalog, page: &str, institution: Option<&str>) {
    for link in catalog.links(page, institution) {
        println!("{}\t{}\t{}", link.name, link.href, link.debug_href);
    }
}

fn print_session(session: &ViewerSession, display_unit: UnitScale) {
    let metadata = &session.model.metadata;
    println!("{}", metadata.name);
    if !metadata.institution.is_empty() {
        println!("{}", metadata.institution);
    }

    let header = &session.header;
    print!("format: {}", session.version());
    if let Some(generator) = &header.generator {
        print!(" ({})", generator);
    }
    println!();
    if !header.extensions_required.is_empty() {
        println!("requires: {}", header.extensions_required.iter().join(", "));
    }
    if let Some(dimensions) = &metadata.dimensions {
        println!("catalog dimensions: {}", dimensions);
    }

    match session
        .measurements
        .as_ref()
        .and_then(|measurements| measurements.display(display_unit))
    {
        Some(displayed) => println!("{}", displayed),
        None => println!("measurements: unavailable (unknown unit)"),
    }

    if session.model.debug {
        println!("{}", session.debug_report());
        let floor = session.grid(GridPlane::Horizontal);
        println!(
            "floor grid:  {} x {:.3} at {:?}",
            floor.divisions,
            floor.cell_size(),
            floor.position
        );
        println!("camera eye:  {:?}", session.camera.eye);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    if let Some(page) = &cli.links {
        let catalog_path = cli.catalog.as_ref().context("--links needs --catalog")?;
        let catalog = ModelCatalog::from_path(catalog_path)?;
        print_links(&catalog, page, cli.institution.as_deref());
        return Ok(());
    }

    let mut status = LogStatus::new();
    let route = cli.route();
    let model = match cli.model_config(&route) {
        Ok(model) => model,
        Err(err) => {
            status.set_label(&err.to_string());
            return Err(err);
        }
    };

    let session = ViewerSession::open(model, cli.viewer_config(), &mut status)
        .await
        .context("Failed to open model")?;

    let display_unit = cli
        .unit
        .as_deref()
        .map(UnitScale::parse_or_unknown)
        .unwrap_or_else(|| session.default_display_unit());

    print_session(&session, display_unit);

    Ok(())
}
