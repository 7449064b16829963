//! Damage-over-time example
//!
//! This example demonstrates:
//! - Ticking modifiers applying impulses on a schedule
//! - Expiring buffs removing themselves
//! - Driving the manual clock and feeding fired timers back in

use statflow::*;
use std::time::Duration;

fn main() -> Result<(), StatError> {
    let (mut system, clock) = StatSystem::with_manual_clock();

    let hp = system.add_floor_stat("hp", ValueSpec::Modifiable(20.0), ValueSpec::Plain(0.0))?;
    let speed = system.add_stat("speed", ValueSpec::Derived { base: 6.0 })?;

    // Poison: -3 hp every second for 4 seconds.
    system.apply_modifier(
        hp.current(),
        Modifier::ticking(
            -3.0,
            TickSpan::Bounded(Duration::from_secs(4)),
            Duration::from_secs(1),
        )?
        .with_origin("poison"),
    )?;

    // Haste: +4 speed for 3 seconds.
    system.apply_modifier(
        speed.current(),
        Modifier::expiring(4.0, Duration::from_secs(3)).with_origin("haste"),
    )?;

    println!("t=0s  hp={:<5} speed={}", system.stat_amount("hp")?, system.stat_amount("speed")?);

    for second in 1..=5u64 {
        let fired = clock.borrow_mut().advance(Duration::from_secs(1));
        for handle in fired {
            system.timer_fired(handle);
        }
        println!(
            "t={second}s  hp={:<5} speed={}",
            system.stat_amount("hp")?,
            system.stat_amount("speed")?
        );
    }

    println!("\nPoison expired after 4 ticks; haste fell off at t=3s.");
    Ok(())
}
