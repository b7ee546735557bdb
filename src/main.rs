use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod catalog;
mod controller;
mod domain;
mod filter;
mod loader;
mod markup;
mod model;
mod query;
mod render;
mod sort;
mod store;
mod table;
mod ui;
mod view;

use catalog::CatalogConfig;
use controller::Controller;
use domain::{HclError, ViewerConfig};
use model::{Model, Status};
use store::RecordStore;
use ui::CatalogUI;
use view::CatalogView;

/// Browse the UPS hardware compatibility list.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the NUT driver.list
    driver_list: String,

    /// Initial filters, e.g. "manufacturer=Eaton&connection=USB" or a full page url
    #[arg(short, long)]
    query: Option<String>,

    /// Write the table as HTML to FILE and exit
    #[arg(long, value_name = "FILE")]
    html: Option<String>,

    /// Write the loaded device data as JSON to FILE and exit
    #[arg(long, value_name = "FILE")]
    json: Option<String>,

    /// Log file, the verbosity is taken from RUST_LOG
    #[arg(long, value_name = "FILE", default_value = "hclview.log")]
    log: String,

    /// Event poll time of the ui in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 100)]
    poll: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn expand_path(path: &str) -> Result<PathBuf, HclError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.into_owned()))
        .map_err(|e| HclError::LoadingFailed(e.to_string()))
}

fn init_logging(path: &Path) -> Result<(), HclError> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run(args: Args) -> Result<(), HclError> {
    let cfg = ViewerConfig::default()
        .with_event_poll_time(args.poll)
        .with_log_file(expand_path(&args.log)?);
    init_logging(&cfg.log_file)?;
    info!("Starting hclview!");

    let config = Arc::new(CatalogConfig::nut());
    let records = loader::load_device_list(&expand_path(&args.driver_list)?, &config.schema)?;
    let store = RecordStore::load(config, records)?;
    let all = store.all_records();
    let mut view = CatalogView::new(store)?;

    if let Some(q) = &args.query {
        view.apply_query(&query::parse_query(q))?;
    }

    if let Some(out) = &args.json {
        let out = expand_path(out)?;
        fs::write(&out, markup::render_device_data(&all)?)?;
        info!("Wrote {} devices to {}", all.len(), out.display());
    }
    if let Some(out) = &args.html {
        let out = expand_path(out)?;
        fs::write(&out, markup::render_table(view.config(), view.rows()))?;
        info!("Wrote {} rows to {}", view.rows().len(), out.display());
    }
    if args.json.is_some() || args.html.is_some() {
        return Ok(());
    }

    let mut terminal = ratatui::init();
    let result = run_ui(&cfg, view, &mut terminal);
    ratatui::restore();
    result
}

fn run_ui(cfg: &ViewerConfig, view: CatalogView, terminal: &mut DefaultTerminal) -> Result<(), HclError> {
    let size = terminal.size()?;
    let mut model = Model::init(view, size.height as usize);
    let mut ui = CatalogUI::new();
    let controller = Controller::new(cfg);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event()?;
        model.update(message)?;
    }

    Ok(())
}
