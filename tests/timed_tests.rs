use statflow::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Advance the clock and deliver every fired timer to the system.
fn pump(system: &mut StatSystem, clock: &Rc<RefCell<ManualScheduler>>, dt: Duration) {
    let fired = clock.borrow_mut().advance(dt);
    for handle in fired {
        system.timer_fired(handle);
    }
}

/// The exact-interval scenario: duration 6, interval 2, amount 1, base 10.
/// Three impulses land, the target ends at 13 and the modifier removes
/// itself.
#[test]
fn ticking_modifier_exact_interval() {
    let (mut system, clock) = StatSystem::with_manual_clock();
    let hp = system.add_value(ValueSpec::Modifiable(10.0));

    let regen = Modifier::ticking(
        1.0,
        TickSpan::Bounded(Duration::from_secs(6)),
        Duration::from_secs(2),
    )
    .unwrap();
    let mid = system.apply_modifier(hp, regen).unwrap();

    pump(&mut system, &clock, Duration::from_secs(6));

    assert_eq!(system.amount(hp).unwrap(), 13.0);
    assert!(!system.has_modifier(hp, mid));
    assert_eq!(system.modifier_phase(mid), Some(ModifierPhase::Expired));
    assert_eq!(clock.borrow().pending(), 0);
}

/// Ticks arrive one interval at a time as the clock is driven.
#[test]
fn ticking_modifier_steps_with_the_clock() {
    let (mut system, clock) = StatSystem::with_manual_clock();
    let hp = system.add_value(ValueSpec::Modifiable(10.0));

    system
        .apply_modifier(
            hp,
            Modifier::ticking(
                1.0,
                TickSpan::Bounded(Duration::from_secs(6)),
                Duration::from_secs(2),
            )
            .unwrap(),
        )
        .unwrap();

    pump(&mut system, &clock, Duration::from_secs(1));
    assert_eq!(system.amount(hp).unwrap(), 10.0);
    pump(&mut system, &clock, Duration::from_secs(1));
    assert_eq!(system.amount(hp).unwrap(), 11.0);
    pump(&mut system, &clock, Duration::from_secs(4));
    assert_eq!(system.amount(hp).unwrap(), 13.0);
}

/// An expiring modifier contributes while attached and removes itself when
/// its timer fires.
#[test]
fn expiring_modifier_detaches_on_expiry() {
    let (mut system, clock) = StatSystem::with_manual_clock();
    let speed = system.add_value(ValueSpec::Derived { base: 6.0 });

    let mid = system
        .apply_modifier(speed, Modifier::expiring(4.0, Duration::from_secs(3)))
        .unwrap();
    assert_eq!(system.amount(speed).unwrap(), 10.0);
    assert!(matches!(
        system.modifier_phase(mid),
        Some(ModifierPhase::Scheduled { timer: Some(_) })
    ));

    pump(&mut system, &clock, Duration::from_secs(2));
    assert_eq!(system.amount(speed).unwrap(), 10.0);

    pump(&mut system, &clock, Duration::from_secs(1));
    assert_eq!(system.amount(speed).unwrap(), 6.0);
    assert!(!system.has_modifier(speed, mid));
    assert_eq!(system.modifier_phase(mid), Some(ModifierPhase::Expired));
}

/// Removing a timed modifier early cancels its timer: the scheduled expiry
/// never fires and no impulse is ever applied.
#[test]
fn early_removal_cancels_the_timer() {
    let (mut system, clock) = StatSystem::with_manual_clock();
    let speed = system.add_value(ValueSpec::Derived { base: 6.0 });

    let mid = system
        .apply_modifier(speed, Modifier::expiring(4.0, Duration::from_secs(3)))
        .unwrap();
    assert_eq!(system.amount(speed).unwrap(), 10.0);

    system.remove_modifier(speed, mid).unwrap();
    assert_eq!(system.amount(speed).unwrap(), 6.0);
    assert_eq!(system.modifier_phase(mid), Some(ModifierPhase::Cancelled));
    assert_eq!(clock.borrow().pending(), 0);

    pump(&mut system, &clock, Duration::from_secs(10));
    assert_eq!(system.amount(speed).unwrap(), 6.0);
}

/// A stale handle delivered after cancellation is an idempotent no-op.
#[test]
fn stale_timer_delivery_is_ignored() {
    let (mut system, clock) = StatSystem::with_manual_clock();
    let hp = system.add_value(ValueSpec::Modifiable(10.0));

    let mid = system
        .apply_modifier(
            hp,
            Modifier::ticking(5.0, TickSpan::Unbounded, Duration::from_secs(1)).unwrap(),
        )
        .unwrap();
    let Some(ModifierPhase::Scheduled { timer: Some(handle) }) = system.modifier_phase(mid) else {
        panic!("expected a scheduled timer");
    };

    system.remove_modifier(hp, mid).unwrap();

    // The host delivers the handle anyway; nothing may happen.
    system.timer_fired(handle);
    system.timer_fired(handle);
    assert_eq!(system.amount(hp).unwrap(), 10.0);

    let _ = clock;
}

/// Unbounded ticking runs until removed.
#[test]
fn unbounded_ticking_runs_until_removed() {
    let (mut system, clock) = StatSystem::with_manual_clock();
    let heat = system.add_value(ValueSpec::Modifiable(0.0));

    let mid = system
        .apply_modifier(
            heat,
            Modifier::ticking(1.0, TickSpan::Unbounded, Duration::from_secs(1)).unwrap(),
        )
        .unwrap();

    pump(&mut system, &clock, Duration::from_secs(5));
    assert_eq!(system.amount(heat).unwrap(), 5.0);

    system.remove_modifier(heat, mid).unwrap();
    pump(&mut system, &clock, Duration::from_secs(5));
    assert_eq!(system.amount(heat).unwrap(), 5.0);
    assert_eq!(system.modifier_phase(mid), Some(ModifierPhase::Cancelled));
}

/// Impulses honor the modifier's finalize rule.
#[test]
fn tick_impulse_uses_finalize_rule() {
    let (mut system, clock) = StatSystem::with_manual_clock();
    let stacks = system.add_value(ValueSpec::Modifiable(3.0));

    system
        .apply_modifier(
            stacks,
            Modifier::ticking(
                2.0,
                TickSpan::Bounded(Duration::from_secs(2)),
                Duration::from_secs(1),
            )
            .unwrap()
            .with_finalize(CombineRule::Product),
        )
        .unwrap();

    pump(&mut system, &clock, Duration::from_secs(2));
    assert_eq!(system.amount(stacks).unwrap(), 12.0);
}

/// Damage-over-time against a floored stat: impulses clamp at the floor and
/// the modifier still retires on schedule.
#[test]
fn poison_clamps_at_the_floor() {
    let sink = Rc::new(RefCell::new(MemorySink::new()));
    let (mut system, clock) = StatSystem::with_manual_clock();
    system.set_telemetry(sink.clone());

    let hp = system
        .add_floor_stat("hp", ValueSpec::Modifiable(5.0), ValueSpec::Plain(0.0))
        .unwrap();

    let poison = Modifier::ticking(
        -2.0,
        TickSpan::Bounded(Duration::from_secs(4)),
        Duration::from_secs(1),
    )
    .unwrap()
    .with_origin("poison");
    let mid = system.apply_modifier(hp.current(), poison).unwrap();

    pump(&mut system, &clock, Duration::from_secs(4));

    assert_eq!(system.stat_amount("hp").unwrap(), 0.0);
    assert!(!system.has_modifier(hp.current(), mid));

    let events = sink.borrow().events().to_vec();
    let ticks = events
        .iter()
        .filter(|e| matches!(e, TelemetryEvent::ModifierTicked { .. }))
        .count();
    let expiries = events
        .iter()
        .filter(|e| matches!(e, TelemetryEvent::ModifierExpired { .. }))
        .count();
    assert_eq!(ticks, 4);
    assert_eq!(expiries, 1);
}

/// Two timed modifiers retire independently, in due order.
#[test]
fn staggered_expiries_fold_out_one_at_a_time() {
    let (mut system, clock) = StatSystem::with_manual_clock();
    let power = system.add_value(ValueSpec::Derived { base: 10.0 });

    system
        .apply_modifier(power, Modifier::expiring(5.0, Duration::from_secs(2)))
        .unwrap();
    system
        .apply_modifier(power, Modifier::expiring(3.0, Duration::from_secs(4)))
        .unwrap();
    assert_eq!(system.amount(power).unwrap(), 18.0);

    pump(&mut system, &clock, Duration::from_secs(2));
    assert_eq!(system.amount(power).unwrap(), 13.0);

    pump(&mut system, &clock, Duration::from_secs(2));
    assert_eq!(system.amount(power).unwrap(), 10.0);
}

/// Removing a modifier twice stays a no-op, surfaced only as telemetry.
#[test]
fn double_removal_is_a_telemetry_diagnostic() {
    let sink = Rc::new(RefCell::new(MemorySink::new()));
    let (mut system, _clock) = StatSystem::with_manual_clock();
    system.set_telemetry(sink.clone());

    let hp = system.add_value(ValueSpec::Modifiable(10.0));
    let mid = system.apply_modifier(hp, Modifier::new(1.0)).unwrap();

    system.remove_modifier(hp, mid).unwrap();
    system.remove_modifier(hp, mid).unwrap();

    let redundant = sink
        .borrow()
        .events()
        .iter()
        .filter(|e| matches!(e, TelemetryEvent::RedundantDeactivation { .. }))
        .count();
    assert_eq!(redundant, 1);
}

/// The full scheduled lifecycle shows up in telemetry in order.
#[test]
fn telemetry_traces_the_timed_lifecycle() {
    let sink = Rc::new(RefCell::new(MemorySink::new()));
    let (mut system, clock) = StatSystem::with_manual_clock();
    system.set_telemetry(sink.clone());

    let speed = system.add_value(ValueSpec::Derived { base: 6.0 });
    let mid = system
        .apply_modifier(speed, Modifier::expiring(4.0, Duration::from_secs(1)))
        .unwrap();
    pump(&mut system, &clock, Duration::from_secs(1));

    let events = sink.borrow().events().to_vec();
    let scheduled = events
        .iter()
        .position(|e| matches!(e, TelemetryEvent::ModifierScheduled { modifier, .. } if *modifier == mid));
    let expired = events
        .iter()
        .position(|e| matches!(e, TelemetryEvent::ModifierExpired { modifier, .. } if *modifier == mid));
    assert!(scheduled.is_some());
    assert!(expired.is_some());
    assert!(scheduled < expired);
}
