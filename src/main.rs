//! Watches the image files given on the command line like the viewer's local
//! bitmap browser does, and logs every update pass.
//!
//! Usage: `local-bitmaps [--config FILE] IMAGE...`

#[macro_use]
extern crate failure;
extern crate opensim_local_bitmaps;
#[macro_use]
extern crate slog;
extern crate slog_term;

use failure::Error;
use opensim_local_bitmaps::config::{self, Config};
use opensim_local_bitmaps::data::texture::TextureList;
use opensim_local_bitmaps::data::World;
use opensim_local_bitmaps::{LocalBitmapManager, ViewerState};
use slog::{Drain, Logger};
use std::env;
use std::path::Path;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

const DEFAULT_CONFIG: &str = "local_bitmaps.toml";

fn setup_logging() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    Logger::root(Mutex::new(drain).fuse(), o!())
}

fn load_config(path: Option<String>, log: &Logger) -> Result<Config, Error> {
    match path {
        Some(path) => Ok(config::get_config(path)?),
        None if Path::new(DEFAULT_CONFIG).exists() => Ok(config::get_config(DEFAULT_CONFIG)?),
        None => {
            debug!(log, "no config file, using defaults");
            Ok(Config::default())
        }
    }
}

fn run(log: &Logger) -> Result<(), Error> {
    let mut args = env::args().skip(1).peekable();
    let config_path = if args.peek().map(|a| a == "--config").unwrap_or(false) {
        args.next();
        Some(args.next().ok_or_else(|| format_err!("--config needs a file argument"))?)
    } else {
        None
    };
    let files: Vec<String> = args.collect();
    if files.is_empty() {
        bail!("usage: local-bitmaps [--config FILE] IMAGE...");
    }

    let cfg = load_config(config_path, log)?;
    let viewer = ViewerState::new(TextureList::new(), World::new());
    let mut manager =
        LocalBitmapManager::new(cfg.local_bitmaps.clone(), viewer.clone(), log.clone());
    if !manager.add_units(files) {
        bail!("none of the given files could be used");
    }
    for entry in manager.list_entries() {
        info!(log, "watching"; "name" => entry.name, "tracking_id" => %entry.tracking_id);
    }

    loop {
        if manager.tick() {
            // No simulator to send them to, so the queue only gets logged.
            let updates = viewer.world.write().objects.take_pending_updates();
            debug!(log, "update pass done";
                "textures" => viewer.textures.read().len(),
                "object_updates" => updates.len());
        }
        thread::sleep(Duration::from_millis(100));
    }
}

fn main() {
    let log = setup_logging();
    if let Err(e) = run(&log) {
        crit!(log, "{}", e);
        drop(log);
        ::std::process::exit(1);
    }
}
