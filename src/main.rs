use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tickbridge::host::{BlockPos, Position};
use tickbridge::{
    BridgeConfig, CommandSender, Hand, HostEngine, HostEvent, HostHandle, ModuleSet,
    ScriptRuntime, SimHost,
};

/// Interactive harness: drives the bridge against the in-memory host the
/// same way a real server loop would, one console line per host action.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BridgeConfig::load_or_default("tickbridge.json");
    let sim = Rc::new(RefCell::new(SimHost::new()));
    let host = HostHandle::from_shared(sim.clone());
    let mut runtime = ScriptRuntime::new(host, config.operation_budget);

    let scripts_dir = Path::new(&config.scripts_dir);
    let modules = ModuleSet::from_dir(scripts_dir)
        .with_context(|| format!("loading scripts from {}", scripts_dir.display()))?;
    runtime
        .load(&modules, &config.entry_module)
        .with_context(|| format!("loading entry module '{}'", config.entry_module))?;
    info!(
        dir = %scripts_dir.display(),
        tps = config.ticks_per_second,
        "bridge ready; type 'help' for commands"
    );

    let mut tick = 0u64;
    let mut seen_console = 0usize;
    let mut seen_broadcasts = 0usize;
    let stdin = io::stdin();
    print_prompt()?;
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let line = line.trim();
        if line.is_empty() {
            print_prompt()?;
            continue;
        }
        if line == "quit" {
            break;
        }

        if let Some(rest) = line.strip_prefix('/') {
            runtime.execute_command(rest, CommandSender::Console);
        } else {
            let mut words = line.split_whitespace();
            let verb = words.next().unwrap_or_default();
            let rest: Vec<&str> = words.collect();
            match verb {
                "help" => print_help()?,
                "tick" => {
                    let count: u64 = rest.first().and_then(|n| n.parse().ok()).unwrap_or(1);
                    for _ in 0..count {
                        tick += 1;
                        runtime.on_tick(tick);
                    }
                    info!(tick, "advanced");
                }
                "join" => match rest.first() {
                    Some(name) => {
                        let id = sim.borrow_mut().spawn_player(name);
                        runtime.dispatch(&HostEvent::PlayerJoin { player: id });
                    }
                    None => warn!("usage: join <name>"),
                },
                "leave" => match rest.first().and_then(|name| sim.borrow().find_player(name)) {
                    Some(id) => {
                        runtime.dispatch(&HostEvent::PlayerLeave { player: id });
                        sim.borrow_mut().remove_player(id);
                    }
                    None => warn!("usage: leave <online-player>"),
                },
                "move" => match parse_move(&rest, &sim) {
                    Some((id, position)) => {
                        sim.borrow_mut().set_position(id, position);
                        runtime.dispatch(&HostEvent::PlayerMove {
                            player: id,
                            position,
                            on_ground: true,
                        });
                    }
                    None => warn!("usage: move <online-player> <x> <y> <z>"),
                },
                "interact" => match parse_interact(&rest, &sim) {
                    Some((id, block, block_id)) => {
                        runtime.dispatch(&HostEvent::PlayerBlockInteract {
                            player: id,
                            block,
                            block_id,
                            hand: Hand::Main,
                        });
                    }
                    None => warn!("usage: interact <online-player> <x> <y> <z> <block-id>"),
                },
                "as" => {
                    let sender = rest.first().and_then(|name| sim.borrow().find_player(name));
                    let command = rest.get(1..).unwrap_or_default().join(" ");
                    match sender {
                        Some(id) if !command.is_empty() => {
                            runtime.execute_command(&command, CommandSender::Player(id));
                        }
                        _ => warn!("usage: as <online-player> /<command...>"),
                    }
                }
                "reload" => match ModuleSet::from_dir(scripts_dir) {
                    Ok(modules) => match runtime.load(&modules, &config.entry_module) {
                        Ok(()) => info!("scripts reloaded"),
                        Err(err) => warn!(error = %err, "reload failed; no scripts active"),
                    },
                    Err(err) => warn!(error = %err, "could not read scripts directory"),
                },
                _ => warn!(verb, "unknown action; type 'help'"),
            }
        }

        drain_output(&sim, &mut seen_console, &mut seen_broadcasts)?;
        print_prompt()?;
    }

    runtime.unload();
    Ok(())
}

fn parse_move(rest: &[&str], sim: &Rc<RefCell<SimHost>>) -> Option<(tickbridge::PlayerId, Position)> {
    let id = sim.borrow().find_player(rest.first()?)?;
    let x: f64 = rest.get(1)?.parse().ok()?;
    let y: f64 = rest.get(2)?.parse().ok()?;
    let z: f64 = rest.get(3)?.parse().ok()?;
    Some((id, Position::new(x, y, z)))
}

fn parse_interact(
    rest: &[&str],
    sim: &Rc<RefCell<SimHost>>,
) -> Option<(tickbridge::PlayerId, BlockPos, String)> {
    let id = sim.borrow().find_player(rest.first()?)?;
    let x: i32 = rest.get(1)?.parse().ok()?;
    let y: i32 = rest.get(2)?.parse().ok()?;
    let z: i32 = rest.get(3)?.parse().ok()?;
    let block_id = rest.get(4)?.to_string();
    Some((id, BlockPos::new(x, y, z), block_id))
}

fn drain_output(
    sim: &Rc<RefCell<SimHost>>,
    seen_console: &mut usize,
    seen_broadcasts: &mut usize,
) -> Result<()> {
    let sim = sim.borrow();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in &sim.console_lines()[*seen_console..] {
        writeln!(out, "[console] {line}")?;
    }
    *seen_console = sim.console_lines().len();
    for line in &sim.broadcasts()[*seen_broadcasts..] {
        writeln!(out, "[broadcast] {line}")?;
    }
    *seen_broadcasts = sim.broadcasts().len();
    Ok(())
}

fn print_prompt() -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write!(out, "> ")?;
    out.flush()?;
    Ok(())
}

fn print_help() -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "  tick [n]                             advance the tick loop")?;
    writeln!(out, "  join <name>                          connect a player")?;
    writeln!(out, "  leave <name>                         disconnect a player")?;
    writeln!(out, "  move <name> <x> <y> <z>              move a player")?;
    writeln!(out, "  interact <name> <x> <y> <z> <block>  right-click a block")?;
    writeln!(out, "  /<command...>                        run a command as the console")?;
    writeln!(out, "  as <name> /<command...>              run a command as a player")?;
    writeln!(out, "  reload                               hot-reload all scripts")?;
    writeln!(out, "  quit")?;
    Ok(())
}
