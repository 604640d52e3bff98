//! Cooperative step sequencing.
//!
//! A [`Workflow`] performs one unit of work per [`step`](Workflow::step) and
//! then yields back to the [`Scheduler`], saying when it wants to resume.
//! The scheduler resumes due workflows strictly in spawn order, one step
//! each per [`tick`](Scheduler::tick). Tearing down a scope abandons every
//! workflow spawned into it; there is no other form of cancellation.
//!
//! # Examples
//!
//! ```rust
//! use ferrous_resolver::{Scheduler, ScopeId, StepList, Wait};
//! use std::time::Duration;
//!
//! let mut log: Vec<&'static str> = Vec::new();
//! let mut scheduler = Scheduler::new();
//! let level = ScopeId::new(1);
//!
//! let solve = StepList::new()
//!     .then(|log: &mut Vec<&'static str>| {
//!         log.push("resolve");
//!         Wait::NextTick
//!     })
//!     .then(|log: &mut Vec<&'static str>| {
//!         log.push("act");
//!         Wait::Duration(Duration::from_millis(30))
//!     })
//!     .then(|log: &mut Vec<&'static str>| {
//!         log.push("resolve again");
//!         Wait::NextTick
//!     });
//! let token = scheduler.spawn(level, solve);
//!
//! scheduler.tick(&mut log, Duration::from_millis(16));
//! scheduler.tick(&mut log, Duration::from_millis(16));
//! scheduler.tick(&mut log, Duration::from_millis(16));
//! assert_eq!(log, ["resolve", "act"]);
//!
//! scheduler.tick(&mut log, Duration::from_millis(16));
//! assert_eq!(log, ["resolve", "act", "resolve again"]);
//! assert!(!scheduler.is_pending(token));
//! ```

use std::fmt;
use std::time::Duration;

/// When a yielding workflow wants to run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// On the next tick.
    NextTick,
    /// On the first tick at which at least this much time has elapsed.
    Duration(Duration),
}

/// Outcome of one workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Yield(Wait),
    Done,
}

/// A resumable sequence of steps over a shared context `Cx`.
pub trait Workflow<Cx: ?Sized> {
    fn step(&mut self, cx: &mut Cx) -> Step;
}

impl<Cx: ?Sized, F> Workflow<Cx> for F
where
    F: FnMut(&mut Cx) -> Step,
{
    fn step(&mut self, cx: &mut Cx) -> Step {
        (*self)(cx)
    }
}

/// Groups workflows for teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Identifies one spawned workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResumeToken {
    id: u64,
    scope: ScopeId,
}

impl ResumeToken {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }
}

enum Due {
    NextTick,
    After(Duration),
}

struct Task<Cx: ?Sized> {
    token: ResumeToken,
    due: Due,
    workflow: Box<dyn Workflow<Cx>>,
}

/// Drives workflows from an external update loop.
pub struct Scheduler<Cx: ?Sized> {
    tasks: Vec<Task<Cx>>,
    next_id: u64,
}

impl<Cx: ?Sized> Default for Scheduler<Cx> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
        }
    }
}

impl<Cx: ?Sized> fmt::Debug for Scheduler<Cx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.tasks.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<Cx: ?Sized> Scheduler<Cx> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `workflow` under `scope`. Its first step runs on the next tick.
    pub fn spawn<W>(&mut self, scope: ScopeId, workflow: W) -> ResumeToken
    where
        W: Workflow<Cx> + 'static,
    {
        let token = ResumeToken {
            id: self.next_id,
            scope,
        };
        self.next_id += 1;
        self.tasks.push(Task {
            token,
            due: Due::NextTick,
            workflow: Box::new(workflow),
        });
        tracing::trace!(id = token.id, scope = scope.raw(), "Spawned workflow");
        token
    }

    /// Advances time by `elapsed` and runs one step of every due workflow,
    /// in spawn order. Returns how many steps ran.
    pub fn tick(&mut self, cx: &mut Cx, elapsed: Duration) -> usize {
        let mut ran = 0;
        self.tasks.retain_mut(|task| {
            let due = match &mut task.due {
                Due::NextTick => true,
                Due::After(remaining) => {
                    *remaining = remaining.saturating_sub(elapsed);
                    remaining.is_zero()
                }
            };
            if !due {
                return true;
            }
            ran += 1;
            match task.workflow.step(cx) {
                Step::Yield(Wait::NextTick) => {
                    task.due = Due::NextTick;
                    true
                }
                Step::Yield(Wait::Duration(wait)) => {
                    task.due = Due::After(wait);
                    true
                }
                Step::Done => {
                    tracing::trace!(id = task.token.id, "Workflow finished");
                    false
                }
            }
        });
        ran
    }

    /// Abandons every suspended workflow of `scope`. Returns how many went.
    pub fn teardown(&mut self, scope: ScopeId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.token.scope != scope);
        let abandoned = before - self.tasks.len();
        if abandoned > 0 {
            tracing::debug!(scope = scope.raw(), abandoned, "Abandoned workflows on teardown");
        }
        abandoned
    }

    pub fn is_pending(&self, token: ResumeToken) -> bool {
        self.tasks.iter().any(|task| task.token == token)
    }

    pub fn pending_in(&self, scope: ScopeId) -> usize {
        self.tasks.iter().filter(|task| task.token.scope == scope).count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

type StepFn<Cx> = Box<dyn FnMut(&mut Cx) -> Wait>;

/// A workflow made of an ordered list of closures.
///
/// Each closure is one step and returns how long to wait before the next;
/// the workflow is done after the last closure ran.
pub struct StepList<Cx: ?Sized> {
    steps: Vec<StepFn<Cx>>,
    position: usize,
}

impl<Cx: ?Sized> Default for StepList<Cx> {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            position: 0,
        }
    }
}

impl<Cx: ?Sized> StepList<Cx> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then<F>(mut self, step: F) -> Self
    where
        F: FnMut(&mut Cx) -> Wait + 'static,
    {
        self.steps.push(Box::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the next step to run.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<Cx: ?Sized> Workflow<Cx> for StepList<Cx> {
    fn step(&mut self, cx: &mut Cx) -> Step {
        let Some(step) = self.steps.get_mut(self.position) else {
            return Step::Done;
        };
        let wait = (*step)(cx);
        self.position += 1;
        if self.position < self.steps.len() {
            Step::Yield(wait)
        } else {
            Step::Done
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(label: &'static str, steps: u32) -> impl FnMut(&mut Vec<String>) -> Step {
        let mut done = 0;
        move |log: &mut Vec<String>| {
            done += 1;
            log.push(format!("{label}{done}"));
            if done == steps {
                Step::Done
            } else {
                Step::Yield(Wait::NextTick)
            }
        }
    }

    #[test]
    fn interleaves_in_spawn_order() {
        let mut scheduler = Scheduler::new();
        let scope = ScopeId::new(0);
        scheduler.spawn(scope, counter("a", 2));
        scheduler.spawn(scope, counter("b", 3));

        let mut log = Vec::new();
        assert_eq!(scheduler.tick(&mut log, Duration::ZERO), 2);
        assert_eq!(scheduler.tick(&mut log, Duration::ZERO), 2);
        assert_eq!(scheduler.tick(&mut log, Duration::ZERO), 1);
        assert_eq!(log, ["a1", "b1", "a2", "b2", "b3"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn duration_waits_accumulate_elapsed_time() {
        let mut scheduler = Scheduler::new();
        let mut ticks = 0u32;
        let steps = StepList::new()
            .then(|_: &mut u32| Wait::Duration(Duration::from_millis(50)))
            .then(|ticks: &mut u32| {
                *ticks += 100;
                Wait::NextTick
            });
        let token = scheduler.spawn(ScopeId::new(3), steps);

        scheduler.tick(&mut ticks, Duration::from_millis(20));
        scheduler.tick(&mut ticks, Duration::from_millis(20));
        scheduler.tick(&mut ticks, Duration::from_millis(20));
        assert_eq!(ticks, 0);
        assert!(scheduler.is_pending(token));

        scheduler.tick(&mut ticks, Duration::from_millis(20));
        assert_eq!(ticks, 100);
        assert!(!scheduler.is_pending(token));
    }

    #[test]
    fn teardown_abandons_only_its_scope() {
        let mut scheduler = Scheduler::new();
        let level = ScopeId::new(1);
        let menu = ScopeId::new(2);
        let abandoned = scheduler.spawn(level, counter("level", 5));
        let kept = scheduler.spawn(menu, counter("menu", 5));

        let mut log = Vec::new();
        scheduler.tick(&mut log, Duration::ZERO);
        assert_eq!(scheduler.teardown(level), 1);
        assert_eq!(scheduler.teardown(level), 0);
        scheduler.tick(&mut log, Duration::ZERO);

        assert!(!scheduler.is_pending(abandoned));
        assert!(scheduler.is_pending(kept));
        assert_eq!(scheduler.pending_in(menu), 1);
        assert_eq!(log, ["level1", "menu1", "menu2"]);
    }

    #[test]
    fn empty_step_list_finishes_immediately() {
        let mut scheduler: Scheduler<()> = Scheduler::new();
        scheduler.spawn(ScopeId::new(0), StepList::new());
        assert_eq!(scheduler.tick(&mut (), Duration::ZERO), 1);
        assert!(scheduler.is_empty());
    }
}
