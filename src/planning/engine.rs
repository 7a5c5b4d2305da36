//! Slot assignment engine.
//!
//! # Algorithm
//!
//! For every day and every slot of the day:
//! 1. Complete in-progress instances whose last slot has elapsed; their
//!    outputs enter the inventory.
//! 2. Collect pending instances whose requirements pass the dependency gate.
//! 3. Visit idle workers past their start gate, fixed workers first, then
//!    flow workers, each group in roster order.
//! 4. A fixed worker continues the task type of its last assignment, else
//!    takes a type it owns today, else claims a new type while it owns fewer
//!    than `owned_type_cap` types. A new type is scored by skill match, or
//!    after a previous task by `α · similarity + (1 − α) · skill match`.
//! 5. A flow worker takes the best candidate of the rule engine.
//! 6. Only fitting instances are candidates. The chosen one reserves its
//!    slots on the worker and goes in progress.
//!
//! After each day the rebalancer runs. The loop stops when every instance
//! completes, the day budget runs out, or a day passes in which nothing was
//! started, finished or in flight.
//!
//! # Complexity
//! O(d · s · w · n) for d days, s slots per day, w workers, n instances.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

use tracing::{debug, trace, warn};

use super::expander::{Expansion, TaskType};
use super::rebalance::{rebalance_day, RebalanceMove};
use super::scoring::{skill_match, task_similarity};
use crate::config::{DependencyGate, PlannerConfig};
use crate::dispatching::{Candidate, RuleEngine, SelectionContext};
use crate::models::{
    InstanceId, InstanceStatus, Inventory, OutputKey, Schedule, SlotTime, TaskInstance, TaskTypeId,
    Worker, WorkerRole,
};

/// Final state of a simulation.
#[derive(Debug, Clone)]
pub struct EngineOutcome {
    pub schedule: Schedule,
    pub task_types: Vec<TaskType>,
    pub instances: Vec<TaskInstance>,
    pub inventory: Inventory,
    pub moves: Vec<RebalanceMove>,
    /// Days the loop visited.
    pub days_simulated: u32,
    /// Whether the loop stopped because nothing could change any more.
    pub stalled: bool,
}

/// Greedy slot-by-slot planner over one run's mutable state.
#[derive(Debug)]
pub struct SlotPlanner<'a> {
    config: &'a PlannerConfig,
    workers: Vec<&'a Worker>,
    roles: Vec<WorkerRole>,
    start_slots: Vec<u32>,
    /// Fixed workers first, then flow; roster order within each group.
    visit_order: Vec<usize>,
    task_types: Vec<TaskType>,
    instances: Vec<TaskInstance>,
    rules: RuleEngine,
    schedule: Schedule,
    inventory: Inventory,
    /// Global slots reserved per instance.
    reserved: Vec<Vec<u32>>,
    in_flight: Vec<InstanceId>,
    /// Task types each worker owns today.
    owned: Vec<Vec<TaskTypeId>>,
    spd: u32,
    budget: u32,
}

impl<'a> SlotPlanner<'a> {
    /// Creates a planner.
    ///
    /// `workers`, `roles` and `start_slots` are parallel and define the
    /// schedule rows.
    pub fn new(
        config: &'a PlannerConfig,
        workers: Vec<&'a Worker>,
        roles: Vec<WorkerRole>,
        start_slots: Vec<u32>,
        expansion: Expansion,
    ) -> Self {
        let spd = config.slots_per_day();
        let budget = config.effective_day_budget();

        let mut visit_order: Vec<usize> = (0..workers.len())
            .filter(|&w| roles[w] == WorkerRole::Fixed)
            .collect();
        visit_order.extend((0..workers.len()).filter(|&w| roles[w] == WorkerRole::Flow));

        let mut schedule = Schedule::new(workers.iter().map(|w| w.id.clone()).collect(), spd);
        schedule.ensure_days(budget);

        let n = expansion.instances.len();
        let w = workers.len();
        Self {
            config,
            workers,
            roles,
            start_slots,
            visit_order,
            task_types: expansion.task_types,
            instances: expansion.instances,
            rules: RuleEngine::from_weights(&config.flow_weights).with_mode(config.flow_mode),
            schedule,
            inventory: Inventory::new(),
            reserved: vec![Vec::new(); n],
            in_flight: Vec::new(),
            owned: vec![Vec::new(); w],
            spd,
            budget,
        }
    }

    /// Runs the simulation to completion.
    pub fn run(mut self) -> EngineOutcome {
        let mut moves = Vec::new();
        let mut days_simulated = 0;
        let mut stalled = false;

        for day in 0..self.budget {
            days_simulated = day + 1;
            for owned in &mut self.owned {
                owned.clear();
            }
            let mut commits = 0usize;
            let mut completions = 0usize;
            let mut finished = false;

            for slot in 0..self.spd {
                let now = day * self.spd + slot;
                completions += self.complete_due(now);
                if self.instances.iter().all(TaskInstance::is_completed) {
                    finished = true;
                    break;
                }

                let eligible = self.eligible(now);
                if eligible.is_empty() {
                    continue;
                }
                for k in 0..self.visit_order.len() {
                    let w = self.visit_order[k];
                    if !self.is_idle(w, now) {
                        continue;
                    }
                    let choice = match self.roles[w] {
                        WorkerRole::Fixed => self.choose_fixed(w, now, &eligible),
                        WorkerRole::Flow => self.choose_flow(w, now, &eligible),
                    };
                    if let Some((i, slots)) = choice {
                        if self.commit(w, i, slots) {
                            commits += 1;
                        }
                    }
                }
            }

            let day_moves = rebalance_day(
                &mut self.schedule,
                &mut self.instances,
                &self.roles,
                &self.start_slots,
                day,
                self.config.rebalance_ceiling,
            );
            debug!(
                day = day + 1,
                commits,
                completions,
                moves = day_moves.len(),
                in_flight = self.in_flight.len(),
                "day planned"
            );
            moves.extend(day_moves);

            if finished {
                break;
            }
            if commits == 0 && completions == 0 && self.in_flight.is_empty() {
                let pending = self.instances.iter().filter(|i| i.is_pending()).count();
                warn!(day = day + 1, pending, "no progress possible, stopping");
                stalled = true;
                break;
            }
        }

        // Reserved work inside the horizon finishes at its recorded end
        for id in std::mem::take(&mut self.in_flight) {
            let inst = &mut self.instances[id.0];
            inst.status = InstanceStatus::Completed;
            self.inventory.add(inst.output.clone());
        }

        EngineOutcome {
            schedule: self.schedule,
            task_types: self.task_types,
            instances: self.instances,
            inventory: self.inventory,
            moves,
            days_simulated,
            stalled,
        }
    }

    /// Completes in-flight instances whose last slot is before `now`.
    fn complete_due(&mut self, now: u32) -> usize {
        let mut done = 0;
        let mut i = 0;
        while i < self.in_flight.len() {
            let id = self.in_flight[i];
            let finished = self.reserved[id.0].last().is_some_and(|&last| last < now);
            if finished {
                self.in_flight.swap_remove(i);
                let inst = &mut self.instances[id.0];
                inst.status = InstanceStatus::Completed;
                self.inventory.add(inst.output.clone());
                done += 1;
            } else {
                i += 1;
            }
        }
        if done > 0 {
            // swap_remove scrambles order; keep it deterministic
            self.in_flight.sort_unstable();
        }
        done
    }

    /// Pending instances whose requirements pass the gate at `now`.
    fn eligible(&self, now: u32) -> Vec<usize> {
        self.instances
            .iter()
            .enumerate()
            .filter(|(_, inst)| inst.is_pending())
            .filter(|(_, inst)| inst.requires.iter().all(|k| self.requirement_met(k, now)))
            .map(|(i, _)| i)
            .collect()
    }

    fn requirement_met(&self, key: &OutputKey, now: u32) -> bool {
        if self.inventory.contains(key) {
            return true;
        }
        match self.config.dependency_gate {
            DependencyGate::Completed => false,
            DependencyGate::PartialProgress { min_fraction } => self.in_flight.iter().any(|&id| {
                self.instances[id.0].output == *key && self.progress(id, now) >= min_fraction
            }),
        }
    }

    /// Fraction of an instance's slots already elapsed at `now`.
    fn progress(&self, id: InstanceId, now: u32) -> f64 {
        let slots = &self.reserved[id.0];
        if slots.is_empty() {
            return 0.0;
        }
        let elapsed = slots.iter().filter(|&&s| s < now).count();
        elapsed as f64 / slots.len() as f64
    }

    fn is_idle(&self, w: usize, now: u32) -> bool {
        now % self.spd >= self.start_slots[w] && self.schedule.is_free(w, now)
    }

    /// Slots an instance of `duration` would occupy if started by `w` at `now`.
    ///
    /// `None` if it does not fit the day (or, with cross-day span, the
    /// worker's working slots within the horizon).
    fn span(&self, w: usize, now: u32, duration: u32) -> Option<Vec<u32>> {
        let horizon = self.schedule.horizon();
        let gate = self.start_slots[w];
        let mut slots = Vec::with_capacity(duration as usize);
        let mut idx = now;
        while (slots.len() as u32) < duration {
            if idx >= horizon {
                return None;
            }
            if idx % self.spd < gate {
                idx = idx - idx % self.spd + gate;
                continue;
            }
            if !self.schedule.is_free(w, idx) {
                return None;
            }
            slots.push(idx);
            idx += 1;
            if idx % self.spd == 0
                && (slots.len() as u32) < duration
                && !self.config.allow_cross_day_span
            {
                return None;
            }
        }
        Some(slots)
    }

    fn fits(&self, w: usize, now: u32, i: usize) -> bool {
        self.span(w, now, self.instances[i].duration_slots).is_some()
    }

    fn previous(&self, w: usize, now: u32) -> Option<&TaskInstance> {
        self.schedule
            .last_before(w, now)
            .map(|o| &self.instances[o.instance.0])
    }

    fn choose_fixed(&self, w: usize, now: u32, eligible: &[usize]) -> Option<(usize, Vec<u32>)> {
        let open = |i: &&usize| self.instances[**i].is_pending() && self.fits(w, now, **i);

        if let Some(last) = self.previous(w, now).map(|p| p.task_type) {
            if let Some(&i) = eligible
                .iter()
                .filter(|&&i| self.instances[i].task_type == last)
                .find(open)
            {
                return self.with_span(w, now, i);
            }
        }

        let owned = &self.owned[w];
        if let Some(&i) = eligible
            .iter()
            .filter(|&&i| owned.contains(&self.instances[i].task_type))
            .find(open)
        {
            return self.with_span(w, now, i);
        }

        if owned.len() < self.config.owned_type_cap {
            let skills = &self.workers[w].skills;
            let last = self
                .previous(w, now)
                .map(|p| &self.task_types[p.task_type.0].requirements);
            let alpha = self.config.similarity_weight;
            let mut best: Option<(usize, f64)> = None;
            for &i in eligible.iter().filter(open) {
                let tt = &self.task_types[self.instances[i].task_type.0];
                let fit = skill_match(skills, &tt.requirements);
                let score = match last {
                    Some(prev) => alpha * task_similarity(prev, &tt.requirements) + (1.0 - alpha) * fit,
                    None => fit,
                };
                match best {
                    Some((_, b)) if score <= b => {}
                    _ => best = Some((i, score)),
                }
            }
            if let Some((i, _)) = best {
                return self.with_span(w, now, i);
            }
        }

        None
    }

    fn choose_flow(&self, w: usize, now: u32, eligible: &[usize]) -> Option<(usize, Vec<u32>)> {
        let indices: Vec<usize> = eligible
            .iter()
            .copied()
            .filter(|&i| self.instances[i].is_pending() && self.fits(w, now, i))
            .collect();
        let candidates: Vec<Candidate<'_>> = indices
            .iter()
            .map(|&i| {
                let inst = &self.instances[i];
                Candidate::new(inst, &self.task_types[inst.task_type.0])
            })
            .collect();
        let context = SelectionContext::for_worker(self.workers[w], SlotTime::from_index(now, self.spd))
            .with_previous_product(self.previous(w, now).map(|p| p.product.as_str()));

        let best = self.rules.select_best(&candidates, &context)?;
        self.with_span(w, now, indices[best])
    }

    fn with_span(&self, w: usize, now: u32, i: usize) -> Option<(usize, Vec<u32>)> {
        self.span(w, now, self.instances[i].duration_slots)
            .map(|slots| (i, slots))
    }

    /// Reserves `slots` on `w` for instance `i`.
    fn commit(&mut self, w: usize, i: usize, slots: Vec<u32>) -> bool {
        let (Some(&first), Some(&last)) = (slots.first(), slots.last()) else {
            return false;
        };
        let role = self.roles[w];
        let id = self.instances[i].id;
        if !self.schedule.occupy(w, &slots, id, role.into()) {
            return false;
        }

        let inst = &mut self.instances[i];
        inst.status = InstanceStatus::InProgress;
        inst.worker = Some(w);
        inst.role = Some(role.into());
        inst.start = Some(SlotTime::from_index(first, self.spd));
        inst.end = Some(SlotTime::from_index(last, self.spd));
        trace!(
            worker = %self.workers[w].id,
            instance = %inst.label(),
            start = %SlotTime::from_index(first, self.spd),
            slots = slots.len(),
            "committed"
        );

        if !self.owned[w].contains(&inst.task_type) {
            self.owned[w].push(inst.task_type);
        }
        self.reserved[i] = slots;
        self.in_flight.push(id);
        true
    }
}
