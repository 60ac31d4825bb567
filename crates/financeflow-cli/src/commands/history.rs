//! Calculator history command implementations

use anyhow::Result;
use financeflow_core::LocalStore;

use super::truncate;

pub fn cmd_history(store: &mut LocalStore, clear: bool) -> Result<()> {
    if clear {
        if store.clear_calculator_history()? {
            println!("✅ Calculator history cleared");
        } else {
            println!("Calculator history is already empty.");
        }
        return Ok(());
    }

    let history = store.calculator_history()?;
    if history.is_empty() {
        println!("No calculator history.");
        return Ok(());
    }

    println!();
    println!("🧮 Calculator History (newest first)");
    println!("   ─────────────────────────────────────────────────────────────");
    for entry in &history {
        println!("   {:40} = {:>12.2}", truncate(&entry.expression, 40), entry.result);
    }

    Ok(())
}
