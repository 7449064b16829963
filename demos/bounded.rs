//! Bounded stat example
//!
//! This example demonstrates:
//! - Range constraints reading live bound values
//! - Propagation: moving a bound re-clamps the dependent value
//! - Setup-time wiring validation

use statflow::*;

fn main() -> Result<(), StatError> {
    let (mut system, _clock) = StatSystem::with_manual_clock();

    // Mana clamped into [0, mana_cap]; the cap itself is a live value.
    let mana = system.add_range_stat(
        "mana",
        ValueSpec::Constrained(80.0),
        ValueSpec::Plain(0.0),
        ValueSpec::Plain(100.0),
    )?;
    let cap = mana.max().expect("range stat always has a max");

    system.validate()?;
    println!("Wiring is acyclic ({} relations)", system.relations().len());

    println!("\nmana = {}", system.stat_amount("mana")?);

    println!("\nA curse halves the mana cap:");
    system.set_amount(cap, 50.0)?;
    println!("cap  = {}", system.amount(cap)?);
    println!("mana = {} (re-clamped automatically)", system.stat_amount("mana")?);

    println!("\nThe curse lifts:");
    system.set_amount(cap, 100.0)?;
    println!("mana = {} (clamping never restores)", system.stat_amount("mana")?);

    println!("\nOvercasting:");
    system.set_stat_amount("mana", 400.0)?;
    println!("mana = {}", system.stat_amount("mana")?);

    Ok(())
}
