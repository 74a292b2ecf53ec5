use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rhai::{Dynamic, Engine, FnPtr, NativeCallContext, AST};
use tracing::{debug, error, warn};

pub const CANCELLED_REASON: &str = "scheduled task cancelled: script context unloaded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Pending,
    Resolved,
    Cancelled,
}

/// Continuation state for one scheduled task. Continuations are opaque
/// callable handles; the scheduler only ever invokes them.
pub struct TaskState {
    due_tick: u64,
    outcome: TaskOutcome,
    on_resolve: Vec<FnPtr>,
    on_error: Vec<FnPtr>,
}

pub type SharedTask = Rc<RefCell<TaskState>>;

/// Script-facing handle for a scheduled delay. Scripts chain continuations
/// with `.then(|| ...)` and `.on_error(|reason| ...)`.
#[derive(Clone)]
pub struct TickFuture {
    state: SharedTask,
}

impl TickFuture {
    pub fn due_tick(&self) -> u64 {
        self.state.borrow().due_tick
    }

    pub fn outcome(&self) -> TaskOutcome {
        self.state.borrow().outcome
    }

    /// Attaches a resolve continuation. If the task already resolved (a
    /// continuation attached after the due tick), it runs immediately with
    /// the recorded outcome rather than being dropped.
    fn then(&mut self, ctx: &NativeCallContext, callback: FnPtr) -> Self {
        let outcome = self.state.borrow().outcome;
        match outcome {
            TaskOutcome::Pending => self.state.borrow_mut().on_resolve.push(callback),
            TaskOutcome::Resolved => {
                if let Err(err) = callback.call_within_context::<Dynamic>(ctx, ()) {
                    error!(error = %err, "scheduled continuation failed");
                }
            }
            TaskOutcome::Cancelled => {}
        }
        self.clone()
    }

    fn on_error(&mut self, ctx: &NativeCallContext, callback: FnPtr) -> Self {
        let outcome = self.state.borrow().outcome;
        match outcome {
            TaskOutcome::Pending => self.state.borrow_mut().on_error.push(callback),
            TaskOutcome::Cancelled => {
                if let Err(err) = callback.call_within_context::<Dynamic>(ctx, (CANCELLED_REASON.to_string(),)) {
                    error!(error = %err, "rejection handler failed");
                }
            }
            TaskOutcome::Resolved => {}
        }
        self.clone()
    }
}

/// Tick-ordered task queue. Resumption happens synchronously inside the tick
/// pump: ascending due tick, then registration order for ties.
pub struct TickScheduler {
    current_tick: u64,
    next_seq: u64,
    queue: BTreeMap<(u64, u64), SharedTask>,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TickScheduler {
    pub fn new() -> Self {
        Self { current_tick: 0, next_seq: 0, queue: BTreeMap::new() }
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Aligns a fresh scheduler with the host tick counter before any script
    /// runs, so delays scheduled at load time are relative to the live tick.
    pub fn resume_at(&mut self, tick: u64) {
        self.current_tick = tick;
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Records a task due `delay_ticks` from now. A zero delay resolves on
    /// the next tick boundary, never synchronously within the scheduling
    /// call, so a script cannot starve the tick loop by rescheduling itself.
    pub fn schedule(&mut self, delay_ticks: i64) -> TickFuture {
        let delay = if delay_ticks < 0 {
            warn!(delay = delay_ticks, "negative schedule delay clamped to zero");
            0
        } else {
            delay_ticks as u64
        };
        let due_tick = self.current_tick + delay.max(1);
        let seq = self.next_seq;
        self.next_seq += 1;
        let state = Rc::new(RefCell::new(TaskState {
            due_tick,
            outcome: TaskOutcome::Pending,
            on_resolve: Vec::new(),
            on_error: Vec::new(),
        }));
        self.queue.insert((due_tick, seq), state.clone());
        TickFuture { state }
    }

    /// Advances the tick counter and removes every task now due, in
    /// resumption order. The caller invokes the continuations; the queue is
    /// drained first so continuations may schedule new tasks freely.
    pub fn take_due(&mut self, tick: u64) -> Vec<SharedTask> {
        self.current_tick = tick;
        let mut due = Vec::new();
        while let Some((&key, _)) = self.queue.iter().next() {
            if key.0 > tick {
                break;
            }
            if let Some(state) = self.queue.remove(&key) {
                due.push(state);
            }
        }
        due
    }

    /// Drains every pending task for rejection at context unload.
    pub fn cancel_pending(&mut self) -> Vec<SharedTask> {
        let queue = std::mem::take(&mut self.queue);
        queue.into_values().collect()
    }
}

/// Resumes one due task: marks it resolved and runs its continuations.
/// Continuation errors are caught here and never reach the tick loop.
pub fn resolve(engine: &Engine, ast: &AST, task: &SharedTask) {
    let callbacks = {
        let mut state = task.borrow_mut();
        state.outcome = TaskOutcome::Resolved;
        std::mem::take(&mut state.on_resolve)
    };
    for callback in callbacks {
        if let Err(err) = callback.call::<Dynamic>(engine, ast, ()) {
            error!(error = %err, "scheduled continuation failed");
        }
    }
}

/// Rejects one task: continuations never run, error handlers receive the
/// reason. An unhandled rejection is logged, not fatal.
pub fn reject(engine: &Engine, ast: &AST, task: &SharedTask, reason: &str) {
    let handlers = {
        let mut state = task.borrow_mut();
        state.outcome = TaskOutcome::Cancelled;
        state.on_resolve.clear();
        std::mem::take(&mut state.on_error)
    };
    if handlers.is_empty() {
        debug!(reason, "scheduled task rejected without handler");
        return;
    }
    for handler in handlers {
        if let Err(err) = handler.call::<Dynamic>(engine, ast, (reason.to_string(),)) {
            error!(error = %err, "rejection handler failed");
        }
    }
}

pub fn register_scheduler_api(engine: &mut Engine) {
    engine.register_type_with_name::<TickFuture>("TickFuture");
    engine.register_fn("then", |ctx: NativeCallContext, fut: &mut TickFuture, callback: FnPtr| {
        fut.then(&ctx, callback)
    });
    engine.register_fn("on_error", |ctx: NativeCallContext, fut: &mut TickFuture, callback: FnPtr| {
        fut.on_error(&ctx, callback)
    });
}
