//! Walk the bundled estate snapshot through the main restructuring
//! scenarios and print the recovery each one implies.

use estate_recovery::core::snapshot::Snapshot;
use estate_recovery::recovery::calculator::{ExchangeKey, RecoveryError};
use estate_recovery::recovery::report::RecoveryReport;
use estate_recovery::recovery::silos::{silo_overview, SiloOverview};
use estate_recovery::scenario::composer::ScenarioComposer;
use estate_recovery::scenario::selection::{ScenarioKey, Selection};

const SNAPSHOT: &str = include_str!("../data/estate_snapshot.json");

fn main() {
    println!("╔══════════════════════════════════════════════╗");
    println!("║  estate-recovery: Consolidation Scenarios    ║");
    println!("╚══════════════════════════════════════════════╝\n");

    let baseline = match Snapshot::from_json(SNAPSHOT) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("bundled snapshot is invalid: {}", e);
            return;
        }
    };

    // --- Standalone silos ---
    println!("━━━ Standalone Silos ━━━\n");
    match silo_overview(&baseline) {
        Ok(overview) => println!("{}", SiloOverview(&overview)),
        Err(e) => eprintln!("silo overview failed: {}", e),
    }

    let scenarios: [(&str, &[ScenarioKey]); 5] = [
        ("Dotcom with Alameda consolidated", &[ScenarioKey::Subcon]),
        ("Dotcom with a claim against Alameda", &[ScenarioKey::ClaimAlameda]),
        ("FTX.US with WRS consolidated", &[ScenarioKey::SubconUs]),
        (
            "Full consolidation, Sam coins zeroed",
            &[ScenarioKey::Subcon, ScenarioKey::SubconUs, ScenarioKey::ZeroSam],
        ),
        (
            "Claim and consolidation together (consolidation wins)",
            &[ScenarioKey::Subcon, ScenarioKey::ClaimAlameda],
        ),
    ];

    let mut composer = ScenarioComposer::new(&baseline);
    for (title, keys) in scenarios {
        println!("━━━ {} ━━━\n", title);
        let selection: Selection = keys.iter().copied().collect();
        let report = composer
            .compose(&selection)
            .map_err(RecoveryError::from)
            .and_then(|outcome| RecoveryReport::build(&outcome, &selection));
        match report {
            Ok(report) => {
                for exchange in ExchangeKey::ALL {
                    if let Some(entry) = report.exchange(exchange) {
                        println!(
                            "  {:<8} assets {:>8}  liabilities {:>8}  recovery {}",
                            exchange.to_string(),
                            entry.breakdown.total_assets(),
                            entry.breakdown.total_liabilities(),
                            entry.displayed
                        );
                    }
                }
                println!();
            }
            Err(e) => eprintln!("  scenario aborted: {}\n", e),
        }
    }
}
