use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rand::Rng;
use rhai::module_resolvers::StaticModuleResolver;
use rhai::{Dynamic, Engine, FnPtr, Map, Module, Scope, AST};
use tracing::{error, info, warn};

use crate::args::parse_syntax;
use crate::commands::{register_command_api, CommandArgs, CommandBridge, CommandDefinition};
use crate::error::LoadError;
use crate::events::{EventBridge, EventCategory, HostEvent};
use crate::host::{CommandSender, HostHandle, PlayerId};
use crate::modules::ModuleSet;
use crate::proxy::{
    register_views, BlockInteractEvent, BlockView, PlayerMoveEvent, PlayerView, PositionView,
    SenderView,
};
use crate::scheduler::{self, register_scheduler_api, TickFuture, TickScheduler, CANCELLED_REASON};

pub const DEFAULT_OPERATION_BUDGET: u64 = 100_000;

/// The one object injected into every script module's scope as the constant
/// `bridge`. All host capabilities scripts hold flow through here or through
/// the proxy views it hands out.
#[derive(Clone)]
pub struct Bridge {
    host: HostHandle,
    events: Rc<RefCell<EventBridge>>,
    commands: Rc<RefCell<CommandBridge>>,
    scheduler: Rc<RefCell<TickScheduler>>,
}

impl Bridge {
    fn on(&mut self, category_name: &str, callback: FnPtr) {
        match EventCategory::parse(category_name) {
            Some(category) => self.events.borrow_mut().subscribe(category, callback),
            None => warn!(category = category_name, "subscription to unknown event category ignored"),
        }
    }

    fn broadcast_message(&mut self, message: &str) {
        self.host.borrow_mut().broadcast(message);
    }

    fn send_message(&mut self, uuid: &str, message: &str) -> bool {
        match uuid.parse::<PlayerId>() {
            Ok(id) => self.host.borrow_mut().send_message(id, message),
            Err(_) => {
                warn!(uuid, "send_message called with malformed uuid");
                false
            }
        }
    }

    fn schedule(&mut self, delay_ticks: i64) -> TickFuture {
        self.scheduler.borrow_mut().schedule(delay_ticks)
    }

    fn register_command(&mut self, definition: Map) -> bool {
        let definition = match CommandDefinition::from_map(&definition) {
            Ok(def) => def,
            Err(err) => {
                error!(error = %err, "command registration rejected");
                return false;
            }
        };
        let name = definition.name.clone();
        let aliases = definition.aliases.clone();
        if let Err(err) = self.commands.borrow_mut().register(definition) {
            error!(error = %err, "command registration rejected");
            return false;
        }
        self.host.borrow_mut().install_command(&name, &aliases);
        info!(command = %name, "script command registered");
        true
    }

    fn online_players(&mut self) -> rhai::Array {
        self.host
            .borrow()
            .online_players()
            .into_iter()
            .map(|id| Dynamic::from(PlayerView::new(id, self.host.clone())))
            .collect()
    }

    fn random(&mut self, min: i64, max: i64) -> i64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        rand::thread_rng().gen_range(lo..=hi)
    }

    fn current_tick(&mut self) -> i64 {
        self.scheduler.borrow().current_tick() as i64
    }
}

fn register_api(engine: &mut Engine) {
    register_views(engine);
    register_scheduler_api(engine);
    register_command_api(engine);

    engine.register_type_with_name::<Bridge>("Bridge");
    engine.register_fn("on", |b: &mut Bridge, category: &str, callback: FnPtr| {
        b.on(category, callback)
    });
    engine.register_fn("broadcast_message", |b: &mut Bridge, message: &str| {
        b.broadcast_message(message)
    });
    engine.register_fn("send_message", |b: &mut Bridge, uuid: &str, message: &str| {
        b.send_message(uuid, message)
    });
    engine.register_fn("schedule", |b: &mut Bridge, delay: i64| b.schedule(delay));
    engine.register_fn("register_command", |b: &mut Bridge, definition: Map| {
        b.register_command(definition)
    });
    engine.register_fn("online_players", |b: &mut Bridge| b.online_players());
    engine.register_fn("current_tick", |b: &mut Bridge| b.current_tick());
    engine.register_fn("random", |b: &mut Bridge, min: i64, max: i64| b.random(min, max));

    engine.on_print(|text| info!(target: "script", "{text}"));
}

/// Uninstalls every registered command from the host dispatcher and rejects
/// every pending task. Shared by teardown and failed-load rollback.
fn release_bridge_state(
    engine: &Engine,
    ast: &AST,
    host: &HostHandle,
    commands: &Rc<RefCell<CommandBridge>>,
    scheduler: &Rc<RefCell<TickScheduler>>,
) -> (usize, usize) {
    let drained = commands.borrow_mut().drain();
    for definition in &drained {
        host.borrow_mut().uninstall_command(&definition.name);
        for alias in &definition.aliases {
            host.borrow_mut().uninstall_command(alias);
        }
    }
    let cancelled = scheduler.borrow_mut().cancel_pending();
    for task in &cancelled {
        scheduler::reject(engine, ast, task, CANCELLED_REASON);
    }
    (drained.len(), cancelled.len())
}

fn abort_load(
    engine: &Engine,
    ast: &AST,
    host: &HostHandle,
    commands: &Rc<RefCell<CommandBridge>>,
    scheduler: &Rc<RefCell<TickScheduler>>,
) {
    let (removed, rejected) = release_bridge_state(engine, ast, host, commands, scheduler);
    if removed > 0 || rejected > 0 {
        warn!(commands = removed, tasks = rejected, "failed load rolled back");
    }
}

/// One loaded script generation: an engine, the merged AST of every module,
/// and the per-generation bridge state. Torn down as a unit.
pub struct ScriptHost {
    engine: Engine,
    ast: AST,
    host: HostHandle,
    events: Rc<RefCell<EventBridge>>,
    commands: Rc<RefCell<CommandBridge>>,
    scheduler: Rc<RefCell<TickScheduler>>,
    unloaded: bool,
}

impl ScriptHost {
    pub fn load(host: HostHandle, modules: &ModuleSet, entry: &str) -> Result<Self, LoadError> {
        Self::load_at(host, modules, entry, DEFAULT_OPERATION_BUDGET, 0)
    }

    /// Evaluates the module graph rooted at `entry` in dependency order
    /// inside a fresh engine. Each module sees the same `bridge` constant;
    /// callbacks from any module stay invocable through the merged AST.
    pub fn load_at(
        host: HostHandle,
        modules: &ModuleSet,
        entry: &str,
        operation_budget: u64,
        start_tick: u64,
    ) -> Result<Self, LoadError> {
        let order = modules.load_order(entry)?;

        let mut engine = Engine::new();
        engine.set_max_operations(operation_budget);
        register_api(&mut engine);

        let events = Rc::new(RefCell::new(EventBridge::new()));
        let commands = Rc::new(RefCell::new(CommandBridge::new()));
        let scheduler = Rc::new(RefCell::new(TickScheduler::new()));
        scheduler.borrow_mut().resume_at(start_tick);
        let bridge = Bridge {
            host: host.clone(),
            events: events.clone(),
            commands: commands.clone(),
            scheduler: scheduler.clone(),
        };

        let mut resolver = StaticModuleResolver::new();
        let mut combined: Option<AST> = None;
        for module in order {
            let mut scope = Scope::new();
            scope.push_constant("bridge", bridge.clone());
            // Self-contained ASTs embed their resolved imports, so callbacks
            // invoked long after load can still reach sibling modules.
            let ast = match engine.compile_into_self_contained(&scope, &module.source) {
                Ok(ast) => ast,
                Err(err) => {
                    let merged = combined.take().unwrap_or_else(AST::empty);
                    abort_load(&engine, &merged, &host, &commands, &scheduler);
                    return Err(LoadError::Parse {
                        module: module.name.clone(),
                        message: err.to_string(),
                    });
                }
            };
            let eval_error = if module.name == entry {
                engine.run_ast_with_scope(&mut scope, &ast).err().map(|err| err.to_string())
            } else {
                match Module::eval_ast_as_new(scope, &ast, &engine) {
                    Ok(evaluated) => {
                        resolver.insert(module.name.clone(), evaluated);
                        engine.set_module_resolver(resolver.clone());
                        None
                    }
                    Err(err) => Some(err.to_string()),
                }
            };
            // A module that failed mid-evaluation may already have registered
            // commands, tasks, and error handlers; its AST joins the merge so
            // rollback can still invoke those handlers for rejection.
            combined = Some(match combined.take() {
                Some(prior) => prior.merge(&ast),
                None => ast,
            });
            if let Some(message) = eval_error {
                let merged = combined.take().unwrap_or_else(AST::empty);
                abort_load(&engine, &merged, &host, &commands, &scheduler);
                return Err(LoadError::Eval { module: module.name.clone(), message });
            }
        }
        let ast = combined.expect("load order always contains the entry module");

        info!(entry, modules = modules.len(), "script context loaded");
        Ok(Self { engine, ast, host, events, commands, scheduler, unloaded: false })
    }

    /// Invokes every subscription for the event's category in registration
    /// order. A throwing callback is logged and skipped; later callbacks for
    /// the same dispatch still run.
    pub fn dispatch(&self, event: &HostEvent) {
        let category = event.category();
        let callbacks = self.events.borrow().snapshot(category);
        if callbacks.is_empty() {
            return;
        }
        let payload = self.payload(event);
        for callback in &callbacks {
            if let Err(err) = callback.call::<Dynamic>(&self.engine, &self.ast, (payload.clone(),)) {
                error!(category = category.label(), error = %err, "event callback failed");
            }
        }
    }

    fn payload(&self, event: &HostEvent) -> Dynamic {
        match event {
            HostEvent::PlayerJoin { player } | HostEvent::PlayerLeave { player } => {
                Dynamic::from(PlayerView::new(*player, self.host.clone()))
            }
            HostEvent::PlayerMove { player, position, on_ground } => {
                Dynamic::from(PlayerMoveEvent {
                    player: PlayerView::new(*player, self.host.clone()),
                    position: PositionView::from_position(*position),
                    on_ground: *on_ground,
                })
            }
            HostEvent::PlayerBlockInteract { player, block, block_id, hand } => {
                Dynamic::from(BlockInteractEvent {
                    player: PlayerView::new(*player, self.host.clone()),
                    block: BlockView::new(*block, block_id.clone()),
                    hand: hand.label(),
                })
            }
        }
    }

    /// Routes one raw command line. Returns false when no script command
    /// matches the first token; the host falls through to its own commands.
    /// Syntaxes are tried in declaration order; handler errors never escape.
    pub fn execute_command(&self, line: &str, sender: CommandSender) -> bool {
        let line = line.trim().trim_start_matches('/');
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return false;
        };
        let Some(definition) = self.commands.borrow().lookup(name) else {
            return false;
        };
        let tokens: Vec<&str> = tokens.collect();

        let sender_view = SenderView::new(sender, self.host.clone());
        let mut last_failure = None;
        for syntax in &definition.syntaxes {
            match parse_syntax(&syntax.arguments, &tokens, &self.host) {
                Ok(parsed) => {
                    let values: HashMap<String, Dynamic> = parsed
                        .into_iter()
                        .map(|(name, value)| (name, value.into_dynamic(&self.host)))
                        .collect();
                    let args = CommandArgs::new(values);
                    if let Err(err) = syntax.handler.call::<Dynamic>(
                        &self.engine,
                        &self.ast,
                        (sender_view.clone(), args),
                    ) {
                        error!(command = %definition.name, error = %err, "command handler failed");
                        sender_view.send_message("An internal error occurred while running this command.");
                    }
                    return true;
                }
                Err(failure) => last_failure = Some(failure),
            }
        }

        match last_failure {
            Some(failure) => {
                sender_view.send_message(&format!("Invalid syntax for '{name}': {failure}"));
            }
            None => {
                sender_view.send_message(&format!("Invalid syntax for '{name}'"));
            }
        }
        true
    }

    /// Tick pump: resumes every task due at or before `tick`, in due-tick
    /// then registration order. The queue is drained before any continuation
    /// runs, so continuations may schedule follow-up work for later ticks.
    pub fn on_tick(&self, tick: u64) {
        let due = self.scheduler.borrow_mut().take_due(tick);
        for task in &due {
            scheduler::resolve(&self.engine, &self.ast, task);
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.events.borrow().subscription_count()
    }

    pub fn command_count(&self) -> usize {
        self.commands.borrow().command_count()
    }

    pub fn pending_task_count(&self) -> usize {
        self.scheduler.borrow().pending_count()
    }

    pub fn current_tick(&self) -> u64 {
        self.scheduler.borrow().current_tick()
    }

    pub fn unload(mut self) {
        self.teardown();
    }

    /// Releases everything this generation owns: subscriptions first, then
    /// commands (uninstalled from the host dispatcher), then pending tasks,
    /// which are rejected rather than resumed.
    fn teardown(&mut self) {
        if self.unloaded {
            return;
        }
        self.unloaded = true;

        self.events.borrow_mut().clear();
        let (commands, tasks) = release_bridge_state(
            &self.engine,
            &self.ast,
            &self.host,
            &self.commands,
            &self.scheduler,
        );
        info!(commands, tasks, "script context unloaded");
    }
}

impl Drop for ScriptHost {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Owns the current script generation and serializes reloads: the old
/// generation is torn down completely before the replacement loads, so no
/// callback can fire into a half-unloaded context and no command name can
/// collide across generations.
pub struct ScriptRuntime {
    host: HostHandle,
    operation_budget: u64,
    last_tick: u64,
    current: Option<ScriptHost>,
}

impl ScriptRuntime {
    pub fn new(host: HostHandle, operation_budget: u64) -> Self {
        Self { host, operation_budget, last_tick: 0, current: None }
    }

    /// Hot (re)load. On failure no generation is active; the caller decides
    /// whether to retry or run without scripts.
    pub fn load(&mut self, modules: &ModuleSet, entry: &str) -> Result<(), LoadError> {
        if let Some(previous) = self.current.take() {
            previous.unload();
        }
        let loaded = ScriptHost::load_at(
            self.host.clone(),
            modules,
            entry,
            self.operation_budget,
            self.last_tick,
        )?;
        self.current = Some(loaded);
        Ok(())
    }

    pub fn unload(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.unload();
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&ScriptHost> {
        self.current.as_ref()
    }

    pub fn dispatch(&self, event: &HostEvent) {
        if let Some(host) = &self.current {
            host.dispatch(event);
        }
    }

    pub fn execute_command(&self, line: &str, sender: CommandSender) -> bool {
        match &self.current {
            Some(host) => host.execute_command(line, sender),
            None => false,
        }
    }

    pub fn on_tick(&mut self, tick: u64) {
        self.last_tick = tick;
        if let Some(host) = &self.current {
            host.on_tick(tick);
        }
    }
}
