//! The stat system root.
//!
//! `StatSystem` owns every cell, stat, modifier and relation, and drives all
//! mutation: constrained writes, change dispatch, modifier folding and timer
//! expiry. The model is single-threaded and cooperative — every cascade runs
//! synchronously inside the call that caused it, and the engine assumes the
//! constraint wiring is acyclic (checked only by the opt-in
//! [`validate`](StatSystem::validate)).

use crate::amount::Amount;
use crate::constraint::{Constraint, ConstraintId};
use crate::error::StatError;
use crate::modifier::{Lifetime, Modifier, ModifierId, ModifierPhase, TickSpan};
use crate::relation::{Relation, RelationGraph};
use crate::schedule::{ManualScheduler, SharedScheduler, TimerHandle};
use crate::stat::Stat;
use crate::stat_key::StatKey;
use crate::telemetry::{NullSink, SharedSink, TelemetryEvent};
use crate::value::{
    AmountChanged, ConstraintEntry, Subscriber, SubscriptionId, ValueCell, ValueId, ValueKind,
    ValueSpec,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

struct ModifierEntry {
    def: Modifier,
    target: ValueId,
    phase: ModifierPhase,
    elapsed: Duration,
}

/// Root object owning the whole stat graph.
///
/// Cells are created through [`add_value`](Self::add_value) or the stat
/// constructors and addressed by [`ValueId`]; they live as long as the
/// system. The scheduler is host-provided; timed modifiers arm timers on it
/// and the host reports expiry back via [`timer_fired`](Self::timer_fired).
///
/// # Examples
///
/// ```rust
/// use statflow::{Modifier, StatSystem, ValueSpec};
///
/// let (mut system, _clock) = StatSystem::with_manual_clock();
/// let attack = system
///     .add_stat("attack", ValueSpec::Derived { base: 10.0 })
///     .unwrap();
///
/// system.apply_modifier(attack.current(), Modifier::new(5.0)).unwrap();
/// system.apply_modifier(attack.current(), Modifier::new(3.0)).unwrap();
/// system
///     .apply_modifier(attack.current(), Modifier::new(2.0).with_priority(1))
///     .unwrap();
///
/// // 10 + (5 + 3) + 2
/// assert_eq!(system.amount(attack.current()).unwrap(), 20.0);
/// ```
pub struct StatSystem {
    cells: Vec<ValueCell>,
    stats: HashMap<StatKey, Stat>,
    modifiers: HashMap<ModifierId, ModifierEntry>,
    timers: HashMap<TimerHandle, ModifierId>,
    relations: RelationGraph,
    scheduler: SharedScheduler,
    telemetry: SharedSink,
    next_modifier: u64,
    next_subscription: u64,
    next_constraint: u64,
}

impl StatSystem {
    /// Create a system on top of a host scheduler. Telemetry defaults to
    /// [`NullSink`]; swap it with [`set_telemetry`](Self::set_telemetry).
    pub fn new(scheduler: SharedScheduler) -> Self {
        Self {
            cells: Vec::new(),
            stats: HashMap::new(),
            modifiers: HashMap::new(),
            timers: HashMap::new(),
            relations: RelationGraph::new(),
            scheduler,
            telemetry: Rc::new(RefCell::new(NullSink)),
            next_modifier: 0,
            next_subscription: 0,
            next_constraint: 0,
        }
    }

    /// Create a system driven by a [`ManualScheduler`], returning the clock
    /// so the host can advance it and feed fired handles back in.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statflow::{Modifier, StatSystem, ValueSpec};
    /// use std::time::Duration;
    ///
    /// let (mut system, clock) = StatSystem::with_manual_clock();
    /// let speed = system.add_value(ValueSpec::Derived { base: 6.0 });
    /// system
    ///     .apply_modifier(speed, Modifier::expiring(4.0, Duration::from_secs(3)))
    ///     .unwrap();
    /// assert_eq!(system.amount(speed).unwrap(), 10.0);
    ///
    /// let fired = clock.borrow_mut().advance(Duration::from_secs(3));
    /// for handle in fired {
    ///     system.timer_fired(handle);
    /// }
    /// assert_eq!(system.amount(speed).unwrap(), 6.0);
    /// ```
    pub fn with_manual_clock() -> (Self, Rc<RefCell<ManualScheduler>>) {
        let clock = Rc::new(RefCell::new(ManualScheduler::new()));
        (Self::new(clock.clone()), clock)
    }

    /// Replace the telemetry sink.
    pub fn set_telemetry(&mut self, sink: SharedSink) {
        self.telemetry = sink;
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    /// Create a standalone value cell.
    pub fn add_value(&mut self, spec: ValueSpec) -> ValueId {
        let id = ValueId(self.cells.len() as u32);
        self.cells.push(ValueCell::new(spec));
        tracing::debug!(value = %id, ?spec, "value created");
        id
    }

    /// Current amount of a cell.
    pub fn amount(&self, id: ValueId) -> Result<Amount, StatError> {
        self.check(id)?;
        Ok(self.cells[id.index()].amount)
    }

    /// Behavior kind of a cell.
    pub fn kind(&self, id: ValueId) -> Result<ValueKind, StatError> {
        self.check(id)?;
        Ok(self.cells[id.index()].kind)
    }

    /// Fixed base of a derived cell.
    pub fn base_amount(&self, id: ValueId) -> Result<Amount, StatError> {
        self.check(id)?;
        let cell = &self.cells[id.index()];
        if cell.kind != ValueKind::Derived {
            return Err(StatError::Unsupported {
                value: id,
                operation: "base amounts",
            });
        }
        Ok(cell.base)
    }

    /// Write an amount through the cell's constraint chain.
    ///
    /// Rejected with [`StatError::ImmutableWrite`] on locked and derived
    /// cells (a derived amount only moves through recalculation). A write
    /// that does not change the stored amount notifies nobody.
    pub fn set_amount(&mut self, id: ValueId, amount: Amount) -> Result<(), StatError> {
        self.check(id)?;
        if self.cells[id.index()].kind.write_locked() {
            return Err(StatError::ImmutableWrite(id));
        }
        self.internal_set(id, amount);
        Ok(())
    }

    /// Re-submit a cell's amount through its full write path: derived cells
    /// re-fold their modifiers, everything else re-applies its constraint
    /// chain against the bounds' current amounts.
    pub fn recalculate(&mut self, id: ValueId) -> Result<(), StatError> {
        self.check(id)?;
        self.recalc(id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Register a change callback on a cell. Callbacks fire synchronously,
    /// in registration order, only on actual changes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statflow::{StatSystem, ValueSpec};
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    ///
    /// let (mut system, _clock) = StatSystem::with_manual_clock();
    /// let hp = system.add_value(ValueSpec::Plain(10.0));
    ///
    /// let seen = Rc::new(RefCell::new(Vec::new()));
    /// let log = seen.clone();
    /// system
    ///     .subscribe(hp, move |change| log.borrow_mut().push(change.amount))
    ///     .unwrap();
    ///
    /// system.set_amount(hp, 7.0).unwrap();
    /// system.set_amount(hp, 7.0).unwrap(); // no-op write, no callback
    /// assert_eq!(*seen.borrow(), vec![7.0]);
    /// ```
    pub fn subscribe(
        &mut self,
        id: ValueId,
        callback: impl FnMut(&AmountChanged) + 'static,
    ) -> Result<SubscriptionId, StatError> {
        self.check(id)?;
        self.next_subscription += 1;
        let sid = SubscriptionId(self.next_subscription);
        self.cells[id.index()]
            .subscribers
            .push((sid, Subscriber::Callback(Box::new(callback))));
        Ok(sid)
    }

    /// Drop a subscription. Unsubscribing during a dispatch takes effect
    /// once the dispatch completes.
    pub fn unsubscribe(&mut self, id: ValueId, sid: SubscriptionId) -> Result<(), StatError> {
        self.check(id)?;
        self.drop_subscriber(id, sid);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Constraints
    // ------------------------------------------------------------------

    /// Attach a constraint and immediately recalculate the protected value.
    ///
    /// The constraint's dependencies must already exist with settled
    /// amounts; attachment subscribes the protected value to each of them.
    pub fn add_constraint(&mut self, id: ValueId, rule: Constraint) -> Result<ConstraintId, StatError> {
        self.check(id)?;
        if !self.cells[id.index()].kind.accepts_constraints() {
            return Err(StatError::Unsupported {
                value: id,
                operation: "constraints",
            });
        }
        for dep in rule.dependencies() {
            self.check(dep)?;
        }
        self.next_constraint += 1;
        let cid = ConstraintId(self.next_constraint);
        let mut links = Vec::new();
        for dep in rule.dependencies() {
            self.next_subscription += 1;
            let sid = SubscriptionId(self.next_subscription);
            self.cells[dep.index()]
                .subscribers
                .push((sid, Subscriber::Trigger { dependent: id }));
            self.relations.link(dep, id, cid);
            links.push((dep, sid));
        }
        self.cells[id.index()].constraints.push(ConstraintEntry {
            id: cid,
            rule,
            links,
        });
        self.recalc(id);
        Ok(cid)
    }

    /// Detach a constraint and recalculate. Unknown constraint ids are a
    /// no-op.
    pub fn remove_constraint(&mut self, id: ValueId, cid: ConstraintId) -> Result<(), StatError> {
        self.check(id)?;
        let idx = id.index();
        let Some(pos) = self.cells[idx].constraints.iter().position(|e| e.id == cid) else {
            return Ok(());
        };
        let entry = self.cells[idx].constraints.remove(pos);
        for (dep, sid) in entry.links {
            self.drop_subscriber(dep, sid);
        }
        self.relations.unlink(cid);
        self.recalc(id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Modifiers
    // ------------------------------------------------------------------

    /// Attach a modifier, activating it exactly once (timed lifetimes arm
    /// their timer here). Derived targets refresh their priority set and
    /// recalculate; modifiable targets just carry the modifier.
    pub fn apply_modifier(&mut self, target: ValueId, def: Modifier) -> Result<ModifierId, StatError> {
        self.check(target)?;
        let kind = self.cells[target.index()].kind;
        if !kind.accepts_modifiers() {
            return Err(StatError::Unsupported {
                value: target,
                operation: "modifiers",
            });
        }
        self.next_modifier += 1;
        let mid = ModifierId(self.next_modifier);
        self.modifiers.insert(
            mid,
            ModifierEntry {
                def,
                target,
                phase: ModifierPhase::Pending,
                elapsed: Duration::ZERO,
            },
        );
        self.cells[target.index()].modifiers.push(mid);
        self.activate(mid);
        if kind == ValueKind::Derived {
            self.refresh_priorities(target.index());
            self.recalc(target);
        }
        Ok(mid)
    }

    /// Deactivate and detach a modifier. Removing one that is not attached
    /// to `target` is a silent no-op, surfaced only as a
    /// [`TelemetryEvent::RedundantDeactivation`].
    pub fn remove_modifier(&mut self, target: ValueId, mid: ModifierId) -> Result<(), StatError> {
        self.check(target)?;
        if !self.has_modifier(target, mid) {
            self.record(TelemetryEvent::RedundantDeactivation { modifier: mid });
            return Ok(());
        }
        self.deactivate(mid);
        self.detach(target, mid);
        Ok(())
    }

    /// Identity containment check.
    pub fn has_modifier(&self, target: ValueId, mid: ModifierId) -> bool {
        target.index() < self.cells.len() && self.cells[target.index()].modifiers.contains(&mid)
    }

    /// Modifiers attached to a cell, in insertion order.
    pub fn modifiers_of(&self, id: ValueId) -> Result<&[ModifierId], StatError> {
        self.check(id)?;
        Ok(&self.cells[id.index()].modifiers)
    }

    /// Scheduling phase of a modifier, if the system has seen it.
    pub fn modifier_phase(&self, mid: ModifierId) -> Option<ModifierPhase> {
        self.modifiers.get(&mid).map(|e| e.phase)
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    /// Register a stat with a single unbounded value.
    pub fn add_stat(&mut self, key: impl Into<StatKey>, spec: ValueSpec) -> Result<Stat, StatError> {
        let key = key.into();
        self.ensure_unregistered(&key)?;
        let current = self.add_value(spec);
        let stat = Stat {
            key: key.clone(),
            current,
            min: None,
            max: None,
        };
        self.stats.insert(key, stat.clone());
        Ok(stat)
    }

    /// Register a stat whose current value is floored by a bound value.
    ///
    /// The bound is created first so the floor reads a live amount when it
    /// attaches; `spec` must be a constraint-capable kind.
    pub fn add_floor_stat(
        &mut self,
        key: impl Into<StatKey>,
        spec: ValueSpec,
        min: ValueSpec,
    ) -> Result<Stat, StatError> {
        let key = key.into();
        self.ensure_unregistered(&key)?;
        let min_id = self.add_value(min);
        let current = self.add_value(spec);
        self.add_constraint(current, Constraint::floor(min_id))?;
        let stat = Stat {
            key: key.clone(),
            current,
            min: Some(min_id),
            max: None,
        };
        self.stats.insert(key, stat.clone());
        Ok(stat)
    }

    /// Register a stat whose current value is clamped between two bound
    /// values. Bounds are created before the current value attaches its
    /// range constraint.
    pub fn add_range_stat(
        &mut self,
        key: impl Into<StatKey>,
        spec: ValueSpec,
        min: ValueSpec,
        max: ValueSpec,
    ) -> Result<Stat, StatError> {
        let key = key.into();
        self.ensure_unregistered(&key)?;
        let min_id = self.add_value(min);
        let max_id = self.add_value(max);
        let current = self.add_value(spec);
        self.add_constraint(current, Constraint::range(min_id, max_id))?;
        let stat = Stat {
            key: key.clone(),
            current,
            min: Some(min_id),
            max: Some(max_id),
        };
        self.stats.insert(key, stat.clone());
        Ok(stat)
    }

    /// Look up a registered stat.
    pub fn stat(&self, key: &str) -> Option<&Stat> {
        self.stats.get(key)
    }

    /// The stat owning a cell, if any — matches bound cells as well as
    /// current cells. Ownership flows downward only; cells never hold a
    /// reference back.
    pub fn owner_of(&self, id: ValueId) -> Option<&Stat> {
        self.stats
            .values()
            .find(|s| s.current == id || s.min == Some(id) || s.max == Some(id))
    }

    /// Current amount of a stat's current value.
    pub fn stat_amount(&self, key: &str) -> Result<Amount, StatError> {
        let stat = self
            .stats
            .get(key)
            .ok_or_else(|| StatError::UnknownStat(StatKey::new(key)))?;
        self.amount(stat.current)
    }

    /// Write to a stat's current value through the usual write path.
    pub fn set_stat_amount(&mut self, key: &str, amount: Amount) -> Result<(), StatError> {
        let current = self
            .stats
            .get(key)
            .map(|s| s.current)
            .ok_or_else(|| StatError::UnknownStat(StatKey::new(key)))?;
        self.set_amount(current, amount)
    }

    /// All registered stats, in no particular order.
    pub fn stats(&self) -> impl Iterator<Item = &Stat> {
        self.stats.values()
    }

    // ------------------------------------------------------------------
    // Relations
    // ------------------------------------------------------------------

    /// Values recalculated when `id` changes, in attachment order.
    pub fn dependents_of(&self, id: ValueId) -> Vec<ValueId> {
        self.relations.dependents_of(id)
    }

    /// Values read by the constraints protecting `id`, in attachment order.
    pub fn dependencies_of(&self, id: ValueId) -> Vec<ValueId> {
        self.relations.dependencies_of(id)
    }

    /// Every recorded dependency relation.
    pub fn relations(&self) -> Vec<Relation> {
        self.relations.relations()
    }

    /// Setup-time wiring check: reports the first dependency cycle, if any.
    /// The write path never runs this.
    pub fn validate(&self) -> Result<(), StatError> {
        self.relations.validate()
    }

    // ------------------------------------------------------------------
    // Timer dispatch
    // ------------------------------------------------------------------

    /// Deliver a fired timer. Handles that were cancelled, already fired to
    /// completion, or never belonged to this system are ignored.
    pub fn timer_fired(&mut self, handle: TimerHandle) {
        let Some(&mid) = self.timers.get(&handle) else {
            return;
        };
        let Some(entry) = self.modifiers.get(&mid) else {
            self.timers.remove(&handle);
            return;
        };
        if !matches!(entry.phase, ModifierPhase::Scheduled { .. }) {
            self.timers.remove(&handle);
            return;
        }
        let target = entry.target;
        let lifetime = entry.def.lifetime;
        let amount = entry.def.amount;
        let finalize = entry.def.finalize;
        let elapsed = entry.elapsed;

        match lifetime {
            Lifetime::Expiring { .. } => {
                self.timers.remove(&handle);
                self.expire(mid, target);
            }
            Lifetime::Ticking { span, every } => {
                let elapsed = elapsed + every;
                if let Some(e) = self.modifiers.get_mut(&mid) {
                    e.elapsed = elapsed;
                }
                let impulse = finalize.apply(self.cells[target.index()].amount, amount);
                self.record(TelemetryEvent::ModifierTicked {
                    modifier: mid,
                    target,
                    amount,
                });
                self.internal_set(target, impulse);
                if let TickSpan::Bounded(total) = span {
                    if elapsed >= total {
                        self.scheduler.borrow_mut().cancel(handle);
                        self.timers.remove(&handle);
                        self.expire(mid, target);
                    }
                }
            }
            Lifetime::Permanent => {
                self.timers.remove(&handle);
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn check(&self, id: ValueId) -> Result<(), StatError> {
        if id.index() < self.cells.len() {
            Ok(())
        } else {
            Err(StatError::UnknownValue(id))
        }
    }

    fn ensure_unregistered(&self, key: &StatKey) -> Result<(), StatError> {
        if self.stats.contains_key(key.as_str()) {
            Err(StatError::DuplicateStat(key.clone()))
        } else {
            Ok(())
        }
    }

    fn record(&self, event: TelemetryEvent) {
        self.telemetry.borrow_mut().record(&event);
    }

    fn drop_subscriber(&mut self, id: ValueId, sid: SubscriptionId) {
        let cell = &mut self.cells[id.index()];
        if let Some(pos) = cell.subscribers.iter().position(|(s, _)| *s == sid) {
            cell.subscribers.remove(pos);
        } else {
            // Entry is checked out for a dispatch; tombstone it instead.
            cell.dropped.push(sid);
        }
    }

    /// Write path shared by external writes, recalculation, derived commits
    /// and tick impulses: constraint fold, then commit. Bypasses the public
    /// write lock by construction.
    fn internal_set(&mut self, id: ValueId, proposed: Amount) {
        let idx = id.index();
        let rules: Vec<Constraint> = self.cells[idx].constraints.iter().map(|e| e.rule).collect();
        let mut folded = proposed;
        for rule in rules {
            folded = rule.apply(folded, |dep| self.cells[dep.index()].amount);
        }
        self.commit(id, folded);
    }

    /// Store a folded amount and dispatch the cell's multicast list in
    /// registration order. Constraint triggers cascade synchronously;
    /// subscriptions added mid-dispatch join afterwards.
    fn commit(&mut self, id: ValueId, amount: Amount) {
        let idx = id.index();
        if amount == self.cells[idx].amount {
            return;
        }
        let previous = self.cells[idx].amount;
        self.cells[idx].amount = amount;
        tracing::trace!(value = %id, previous, amount, "amount committed");
        self.record(TelemetryEvent::AmountChanged {
            value: id,
            previous,
            amount,
        });

        let event = AmountChanged {
            value: id,
            previous,
            amount,
        };
        let mut taken = std::mem::take(&mut self.cells[idx].subscribers);
        for (sid, sub) in taken.iter_mut() {
            if self.cells[idx].dropped.contains(sid) {
                continue;
            }
            match sub {
                Subscriber::Trigger { dependent } => {
                    let dep = *dependent;
                    self.recalc(dep);
                }
                Subscriber::Callback(callback) => callback(&event),
            }
        }
        let cell = &mut self.cells[idx];
        let added = std::mem::take(&mut cell.subscribers);
        taken.retain(|(sid, _)| !cell.dropped.contains(sid));
        taken.extend(added);
        cell.subscribers = taken;
        cell.dropped.clear();
    }

    fn recalc(&mut self, id: ValueId) {
        let idx = id.index();
        let proposed = match self.cells[idx].kind {
            ValueKind::Derived => self.derived_fold(idx),
            _ => self.cells[idx].amount,
        };
        self.internal_set(id, proposed);
    }

    /// Fold a derived cell: base, then each priority group ascending. Within
    /// a group, contributions fold via each modifier's own stack rule from a
    /// zero subtotal; the group's last modifier decides how the subtotal
    /// folds into the running result. Ticking modifiers are impulse-only and
    /// never participate.
    fn derived_fold(&self, idx: usize) -> Amount {
        let cell = &self.cells[idx];
        let mut result = cell.base;
        for &priority in &cell.priorities {
            let mut subtotal = 0.0;
            let mut finalize = None;
            for mid in &cell.modifiers {
                let Some(entry) = self.modifiers.get(mid) else {
                    continue;
                };
                if entry.def.is_ticking() || entry.def.priority != priority {
                    continue;
                }
                subtotal = entry.def.stack.apply(subtotal, entry.def.amount);
                finalize = Some(entry.def.finalize);
            }
            debug_assert!(
                finalize.is_some(),
                "priority {priority} has no standing modifier"
            );
            if let Some(rule) = finalize {
                result = rule.apply(result, subtotal);
            }
        }
        result
    }

    fn refresh_priorities(&mut self, idx: usize) {
        let mut priorities: Vec<i32> = self.cells[idx]
            .modifiers
            .iter()
            .filter_map(|mid| self.modifiers.get(mid))
            .filter(|e| !e.def.is_ticking())
            .map(|e| e.def.priority)
            .collect();
        priorities.sort_unstable();
        priorities.dedup();
        self.cells[idx].priorities = priorities;
    }

    fn activate(&mut self, mid: ModifierId) {
        let Some(entry) = self.modifiers.get(&mid) else {
            return;
        };
        if !matches!(entry.phase, ModifierPhase::Pending) {
            self.record(TelemetryEvent::DuplicateActivation { modifier: mid });
            return;
        }
        let lifetime = entry.def.lifetime;
        let target = entry.target;
        let timer = match lifetime {
            Lifetime::Permanent => None,
            Lifetime::Expiring { duration } => {
                Some(self.scheduler.borrow_mut().schedule_once(duration))
            }
            Lifetime::Ticking { every, .. } => {
                Some(self.scheduler.borrow_mut().schedule_repeating(every))
            }
        };
        if let Some(handle) = timer {
            self.timers.insert(handle, mid);
        }
        if let Some(entry) = self.modifiers.get_mut(&mid) {
            entry.phase = ModifierPhase::Scheduled { timer };
        }
        self.record(TelemetryEvent::ModifierScheduled {
            modifier: mid,
            target,
        });
    }

    fn deactivate(&mut self, mid: ModifierId) {
        let Some((phase, target)) = self.modifiers.get(&mid).map(|e| (e.phase, e.target)) else {
            self.record(TelemetryEvent::RedundantDeactivation { modifier: mid });
            return;
        };
        match phase {
            ModifierPhase::Scheduled { timer } => {
                if let Some(handle) = timer {
                    self.scheduler.borrow_mut().cancel(handle);
                    self.timers.remove(&handle);
                }
                if let Some(entry) = self.modifiers.get_mut(&mid) {
                    entry.phase = ModifierPhase::Cancelled;
                }
                self.record(TelemetryEvent::ModifierCancelled {
                    modifier: mid,
                    target,
                });
            }
            _ => self.record(TelemetryEvent::RedundantDeactivation { modifier: mid }),
        }
    }

    /// Timer-driven retirement: mark expired, then detach from the target
    /// (which recalculates derived targets).
    fn expire(&mut self, mid: ModifierId, target: ValueId) {
        if let Some(entry) = self.modifiers.get_mut(&mid) {
            entry.phase = ModifierPhase::Expired;
        }
        self.record(TelemetryEvent::ModifierExpired {
            modifier: mid,
            target,
        });
        self.detach(target, mid);
    }

    fn detach(&mut self, target: ValueId, mid: ModifierId) {
        let idx = target.index();
        self.cells[idx].modifiers.retain(|m| *m != mid);
        if self.cells[idx].kind == ValueKind::Derived {
            self.refresh_priorities(idx);
            self.recalc(target);
        }
    }
}
