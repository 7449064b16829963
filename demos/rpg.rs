//! RPG character sheet example
//!
//! This example demonstrates:
//! - Registering stats (plain, bounded, derived)
//! - Stacking equipment and buff modifiers by priority
//! - Watching amounts change through a subscription

use statflow::*;
use std::cell::RefCell;
use std::rc::Rc;

fn main() -> Result<(), StatError> {
    let (mut system, _clock) = StatSystem::with_manual_clock();

    // Attack is derived: a fixed base plus whatever is equipped.
    let attack = system.add_stat("attack", ValueSpec::Derived { base: 10.0 })?;

    // Health is host-driven, clamped into [0, max_hp].
    let hp = system.add_range_stat(
        "hp",
        ValueSpec::Modifiable(100.0),
        ValueSpec::Plain(0.0),
        ValueSpec::Plain(100.0),
    )?;

    // Narrate every attack change.
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    system.subscribe(attack.current(), move |change| {
        sink.borrow_mut()
            .push(format!("attack: {} -> {}", change.previous, change.amount));
    })?;

    println!("Equipping items:");
    let sword = system.apply_modifier(
        attack.current(),
        Modifier::new(5.0).with_origin("iron-sword"),
    )?;
    println!("  - iron sword: +5");

    system.apply_modifier(
        attack.current(),
        Modifier::new(3.0).with_origin("strength-ring"),
    )?;
    println!("  - strength ring: +3");

    // A late multiplicative blessing scales everything before it.
    system.apply_modifier(
        attack.current(),
        Modifier::new(1.5)
            .with_priority(10)
            .with_finalize(CombineRule::Product)
            .with_origin("war-blessing"),
    )?;
    println!("  - war blessing: x1.5 (priority 10)");

    println!("\nAttack: {}", system.stat_amount("attack")?);
    println!("Calculation: (10 + 5 + 3) * 1.5 = 27");

    println!("\nTaking 130 damage (clamped at the floor):");
    system.set_amount(hp.current(), 100.0 - 130.0)?;
    println!("HP: {}", system.stat_amount("hp")?);

    println!("\nUnequipping the sword:");
    system.remove_modifier(attack.current(), sword)?;
    println!("Attack: {}", system.stat_amount("attack")?);

    println!("\nChange log:");
    for line in log.borrow().iter() {
        println!("  {line}");
    }

    Ok(())
}
