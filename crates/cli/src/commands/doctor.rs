//! `parlor doctor` — Diagnose configuration, credentials and storage.

use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("Parlor Doctor");
    println!("=============\n");

    let mut issues = 0;

    let path = super::config_file(config_path);
    if path.exists() {
        println!("  ok   Config file found: {}", path.display());
    } else {
        println!("  warn No config file at {} (defaults in use, run `parlor init`)", path.display());
        issues += 1;
    }

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ok   Config valid");
            config
        }
        Err(e) => {
            println!("  FAIL Config invalid: {e}");
            println!("\n  1+ issue(s) found. Fix the config and run again.");
            return Ok(());
        }
    };

    match config.require_credentials() {
        Ok(()) => println!("  ok   Credentials present"),
        Err(e) => {
            println!("  FAIL {e}");
            issues += 1;
        }
    }

    match parlor_auth::build_from_config(&config.auth) {
        Ok(verifier) => println!("  ok   Identity verifier ready ({})", verifier.name()),
        Err(e) => {
            println!("  FAIL Identity verifier: {e}");
            issues += 1;
        }
    }

    match parlor_store::open_from_config(&config).await {
        Ok(store) => match store.health_check().await {
            Ok(true) => println!("  ok   Conversation store reachable ({})", store.name()),
            Ok(false) | Err(_) => {
                println!("  FAIL Conversation store not responding ({})", store.name());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  FAIL Conversation store: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
