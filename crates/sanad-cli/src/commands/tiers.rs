//! Tiers command implementation.

use crate::error::Result;
use crate::output::Formatter;
use sanad_engine::SanadEngine;

/// Execute the tiers command.
pub async fn execute_tiers(engine: &SanadEngine, formatter: &Formatter) -> Result<()> {
    let rows = engine.classifier().rows();
    println!("{}", formatter.format_tiers(&rows)?);
    Ok(())
}
