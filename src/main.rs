//! estate-recovery CLI
//!
//! Evaluate restructuring scenarios against an estate snapshot.
//!
//! # Usage
//!
//! ```bash
//! # Recovery under full consolidation with Sam coins subordinated
//! estate-recovery recover --snapshot data/estate_snapshot.json --scenario SUBCON,SUBCON_US,ZERO_SAM
//!
//! # Same, repricing liquid tickers from yesterday's close, as JSON
//! estate-recovery recover --scenario SUBCON --update-prices --format json
//!
//! # Standalone silo balance sheets
//! estate-recovery silos --snapshot data/estate_snapshot.json
//!
//! # One cached close price
//! estate-recovery price --ticker BTC
//! ```

use chrono::{NaiveDate, Utc};
use estate_recovery::config::EstateConfig;
use estate_recovery::core::snapshot::Snapshot;
use estate_recovery::pricing::cache::PriceCache;
use estate_recovery::pricing::refresher::{ClosePriceLookup, PriceRefresher};
use estate_recovery::pricing::source::HttpPriceSource;
use estate_recovery::recovery::calculator::RecoveryError;
use estate_recovery::recovery::report::RecoveryReport;
use estate_recovery::recovery::silos::{silo_overview, SiloOverview};
use estate_recovery::scenario::composer::ScenarioComposer;
use estate_recovery::scenario::selection::{ScenarioKey, Selection};
use std::path::PathBuf;
use std::process;

fn print_usage() {
    eprintln!(
        r#"estate-recovery - creditor recovery scenarios for a bankruptcy estate

USAGE:
    estate-recovery <COMMAND> [OPTIONS]

COMMANDS:
    recover     Compose a scenario and report recovery per exchange
    silos       Show standalone silo balance sheets
    price       Look up one prior-day close price (cache first)
    help        Show this message

OPTIONS (all):
    --config <FILE>     JSON config file (defaults + ESTATE_* env overrides)
    --snapshot <FILE>   Snapshot JSON export (overrides config)

OPTIONS (recover):
    --scenario <LIST>   Comma-separated toggles: ZERO_SAM, SUBCON, SUBCON_US, CLAIM_ALAMEDA
    --update-prices     Reprice liquid category A tickers (CATEGORY_A_UPDATE)
    --date <DATE>       As-of date for prices, YYYY-MM-DD (default: today)
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (silos):
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (price):
    --ticker <TICKER>   Ticker symbol, e.g. BTC
    --date <DATE>       As-of date, YYYY-MM-DD (default: today)

EXAMPLES:
    estate-recovery recover --scenario SUBCON,ZERO_SAM
    estate-recovery recover --scenario CLAIM_ALAMEDA,SUBCON_US --format json
    estate-recovery recover --scenario SUBCON --update-prices --date 2026-10-14
    estate-recovery silos --format json
    estate-recovery price --ticker SOL"#
    );
}

#[derive(Default)]
struct Options {
    config: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    scenario: Option<String>,
    update_prices: bool,
    date: Option<NaiveDate>,
    format: Option<String>,
    ticker: Option<String>,
}

fn value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| {
        eprintln!("{} requires {}", flag, what);
        process::exit(1);
    })
}

fn parse_options(args: &[String]) -> Options {
    let mut options = Options::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                options.config = Some(PathBuf::from(value(args, i, "--config", "a file path")));
            }
            "--snapshot" => {
                i += 1;
                options.snapshot = Some(PathBuf::from(value(args, i, "--snapshot", "a file path")));
            }
            "--scenario" => {
                i += 1;
                options.scenario = Some(value(args, i, "--scenario", "a comma-separated list"));
            }
            "--update-prices" => options.update_prices = true,
            "--date" => {
                i += 1;
                let raw = value(args, i, "--date", "a date (YYYY-MM-DD)");
                options.date = Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").unwrap_or_else(|e| {
                    eprintln!("Invalid date '{}': {}", raw, e);
                    process::exit(1);
                }));
            }
            "--format" => {
                i += 1;
                options.format = Some(value(args, i, "--format", "'text' or 'json'"));
            }
            "--ticker" => {
                i += 1;
                options.ticker = Some(value(args, i, "--ticker", "a ticker symbol"));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }
    options
}

fn load_config(options: &Options) -> EstateConfig {
    let mut config = EstateConfig::load(options.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });
    if let Some(path) = &options.snapshot {
        config.snapshot_path = path.clone();
    }
    config
}

fn load_snapshot(config: &EstateConfig) -> Snapshot {
    Snapshot::load(&config.snapshot_path).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    })
}

fn price_refresher(config: &EstateConfig) -> PriceRefresher<HttpPriceSource> {
    let source = HttpPriceSource::new(
        config.price_api_base.clone(),
        config.price_api_key.clone(),
        config.request_timeout(),
    )
    .unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });
    PriceRefresher::new(source, PriceCache::open(&config.price_cache_path))
        .with_throttle(config.throttle_threshold, config.throttle_pause())
}

fn is_json(options: &Options) -> bool {
    match options.format.as_deref() {
        None | Some("text") => false,
        Some("json") => true,
        Some(other) => {
            eprintln!("Unknown format '{}': expected 'text' or 'json'", other);
            process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn cmd_recover(args: &[String]) {
    let options = parse_options(args);
    let json = is_json(&options);
    let config = load_config(&options);
    let baseline = load_snapshot(&config);

    let mut selection = Selection::parse_list(options.scenario.as_deref().unwrap_or(""))
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        });
    if selection.contains(ScenarioKey::CategoryAUpdate) && !options.update_prices {
        eprintln!("Use --update-prices instead of CATEGORY_A_UPDATE in --scenario");
        process::exit(1);
    }
    if options.update_prices {
        selection.toggle_on(ScenarioKey::CategoryAUpdate);
    }

    let mut prices = price_refresher(&config);
    let as_of = options.date.unwrap_or_else(|| Utc::now().date_naive());
    let mut composer = ScenarioComposer::new(&baseline)
        .with_tickers(config.liquid_tickers.clone())
        .with_as_of(as_of)
        .with_prices(&mut prices);

    let report = composer
        .compose(&selection)
        .map_err(RecoveryError::from)
        .and_then(|outcome| RecoveryReport::build(&outcome, &selection))
        .unwrap_or_else(|e| {
            eprintln!("Scenario aborted: {}", e);
            process::exit(2);
        });

    if json {
        print_json(&report);
    } else {
        println!("{}", report);
    }
}

fn cmd_silos(args: &[String]) {
    let options = parse_options(args);
    let json = is_json(&options);
    let config = load_config(&options);
    let baseline = load_snapshot(&config);

    let overview = silo_overview(&baseline).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(2);
    });

    if json {
        print_json(&overview);
    } else {
        println!("{}", SiloOverview(&overview));
    }
}

fn cmd_price(args: &[String]) {
    let options = parse_options(args);
    let config = load_config(&options);
    let ticker = options.ticker.clone().unwrap_or_else(|| {
        eprintln!("Error: --ticker <TICKER> is required");
        process::exit(1);
    });
    let date = options.date.unwrap_or_else(|| Utc::now().date_naive());

    let mut prices = price_refresher(&config);
    match prices.close_price(&ticker, date) {
        Ok(price) => println!("{} close before {}: {} USD", ticker, date, price),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(3);
        }
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "recover" => cmd_recover(rest),
        "silos" => cmd_silos(rest),
        "price" => cmd_price(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
