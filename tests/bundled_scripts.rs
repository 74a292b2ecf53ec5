use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use tickbridge::{CommandSender, GameMode, HostEvent, HostHandle, ModuleSet, ScriptHost, SimHost};

fn load_bundled() -> (Rc<RefCell<SimHost>>, ScriptHost) {
    let sim = Rc::new(RefCell::new(SimHost::new()));
    let host = HostHandle::from_shared(sim.clone());
    let modules =
        ModuleSet::from_dir(Path::new("assets/scripts")).expect("bundled scripts readable");
    let script = ScriptHost::load(host, &modules, "main").expect("bundled scripts load");
    (sim, script)
}

#[test]
fn bundled_scripts_register_their_surface() {
    let (sim, script) = load_bundled();
    assert_eq!(script.subscription_count(), 4);
    assert_eq!(script.command_count(), 2);
    let sim = sim.borrow();
    assert!(sim.installed_commands().contains(&"jscmd".to_string()));
    assert!(sim.installed_commands().contains(&"gamemode".to_string()));
}

#[test]
fn joining_greets_and_schedules_a_follow_up() {
    let (sim, script) = load_bundled();
    let alice = sim.borrow_mut().spawn_player("Alice");

    script.dispatch(&HostEvent::PlayerJoin { player: alice });

    assert_eq!(sim.borrow().messages_for(alice), ["Welcome to the server, Alice!"]);
    assert_eq!(sim.borrow().broadcasts(), ["Alice joined the server."]);
    assert_eq!(script.pending_task_count(), 1);
}

#[test]
fn jscmd_version_reports_the_util_module_version() {
    let (sim, script) = load_bundled();
    assert!(script.execute_command("jscmd version", CommandSender::Console));
    assert_eq!(sim.borrow().console_lines(), ["bridge scripts v1.2.0"]);
}

#[test]
fn gamemode_command_switches_modes() {
    let (sim, script) = load_bundled();
    let alice = sim.borrow_mut().spawn_player("Alice");

    assert!(script.execute_command("gm creative Alice", CommandSender::Console));
    assert_eq!(sim.borrow().game_mode(alice), Some(GameMode::Creative));
}
