// src/cli.rs
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::{Result, eyre};

use crate::browser::{ReplayBrowser, SiteSnapshot};
use crate::config::ScrapeConfig;
use crate::config::consts::{DEBUG_LOG_FILE, DEFAULT_FILE, DEFAULT_OUT_DIR};
use crate::progress::Progress;
use crate::scrape::RestaurantSummary;
use crate::store::{FileStore, StoreFormat, store_stats};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format { Csv, Json }

impl From<Format> for StoreFormat {
    fn from(f: Format) -> Self {
        match f { Format::Csv => StoreFormat::Csv, Format::Json => StoreFormat::Json }
    }
}

#[derive(Parser, Debug)]
#[command(name = "menu_scrape", version)]
#[command(about = "Walk a dining menu site and collect per-item nutrition data", long_about = None)]
pub struct Args {
    /// Config file (JSON). Defaults to ./menu_scrape.json when present
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Site snapshot to replay instead of a live browser session
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Restaurant to scrape; repeatable. Overrides the config list
    #[arg(short, long = "restaurant", value_name = "NAME")]
    pub restaurants: Vec<String>,

    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Output file. Defaults to out/items.<format>
    #[arg(short, long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Output format. Defaults to the output file's extension, else CSV
    #[arg(long, value_enum)]
    pub format: Option<Format>,

    /// Also append log lines to this file. With -v and no file, .store/debug.log
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// -v for debug, -vv for trace
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print per-restaurant counts of the output file and exit
    #[arg(long)]
    pub stats: bool,
}

impl Args {
    fn out_path(&self) -> (PathBuf, StoreFormat) {
        match (&self.out, self.format) {
            (Some(p), Some(f)) => (p.clone(), f.into()),
            (Some(p), None) => (p.clone(), StoreFormat::from_path(p)),
            (None, f) => {
                let fmt: StoreFormat = f.map(Into::into).unwrap_or(StoreFormat::Csv);
                (PathBuf::from(DEFAULT_OUT_DIR).join(format!("{}.{}", DEFAULT_FILE, fmt.ext())), fmt)
            }
        }
    }

    fn log_file(&self) -> Option<PathBuf> {
        self.log_file.clone().or_else(|| (self.verbose > 0).then(|| PathBuf::from(DEBUG_LOG_FILE)))
    }

    fn apply(&self, cfg: &mut ScrapeConfig) {
        if !self.restaurants.is_empty() {
            cfg.restaurants = self.restaurants.clone();
        }
        if let Some(url) = &self.base_url {
            cfg.base_url = url.clone();
        }
    }
}

/// Prints one line per restaurant.
struct CliProgress;

impl Progress for CliProgress {
    fn begin(&mut self, total: usize) { println!("Scraping {} restaurant(s)…", total); }
    fn log(&mut self, msg: &str) { println!("{}", msg); }
    fn restaurant_started(&mut self, name: &str) { println!("→ {}", name); }
    fn restaurant_done(&mut self, name: &str, s: &RestaurantSummary) {
        println!(
            "  {}: {} items, {} with nutrition, {} rejected, {} placeholders",
            name, s.items_found, s.items_with_nutrition, s.rejected, s.placeholders
        );
    }
    fn restaurant_failed(&mut self, name: &str, error: &str) { println!("  {} failed: {}", name, error); }
}

pub fn run() -> Result<()> {
    run_with(Args::parse())
}

pub fn run_with(args: Args) -> Result<()> {
    crate::log::init(args.verbose, args.log_file().as_deref())?;

    let (out, format) = args.out_path();
    if args.stats {
        let store = FileStore::open(&out, format)?;
        for (restaurant, (items, with_cal)) in store_stats(&store) {
            println!("{},{},{}", restaurant, items, with_cal);
        }
        return Ok(());
    }

    let mut cfg = ScrapeConfig::load(args.config.as_deref())?;
    args.apply(&mut cfg);
    cfg.validate()?;
    if cfg.restaurants.is_empty() {
        return Err(eyre!("no restaurants given (use -r/--restaurant or the config file)"));
    }

    let snapshot = args
        .snapshot
        .as_deref()
        .ok_or_else(|| eyre!("--snapshot is required: no live browser backend is built in"))?;
    let mut browser = ReplayBrowser::new(SiteSnapshot::from_file(snapshot)?);
    let mut store = FileStore::open(&out, format)?;

    let report = crate::runner::run(&mut browser, &cfg, &mut store, &mut CliProgress)?;
    for (name, error) in report.failed() {
        eprintln!("Error: {}: {}", name, error);
    }
    println!("{}", report.summary_line());
    println!("Wrote {}", out.display());
    Ok(())
}
