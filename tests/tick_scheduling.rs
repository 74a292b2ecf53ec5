use std::cell::RefCell;
use std::rc::Rc;

use tickbridge::{CommandSender, HostHandle, ModuleSet, ScriptHost, SimHost};

fn load_script(source: &str) -> (Rc<RefCell<SimHost>>, ScriptHost) {
    let sim = Rc::new(RefCell::new(SimHost::new()));
    let host = HostHandle::from_shared(sim.clone());
    let mut modules = ModuleSet::new();
    modules.insert("main", source);
    let script = ScriptHost::load(host, &modules, "main").expect("script should load");
    (sim, script)
}

#[test]
fn zero_delay_resolves_on_the_next_tick_never_synchronously() {
    let (sim, script) = load_script(
        r#"
            bridge.schedule(0).then(|| bridge.broadcast_message("ran"));
            bridge.broadcast_message("scheduled");
        "#,
    );
    assert_eq!(
        sim.borrow().broadcasts(),
        ["scheduled"],
        "the continuation must not run inside the scheduling call"
    );

    script.on_tick(1);
    assert_eq!(sim.borrow().broadcasts(), ["scheduled", "ran"]);
}

#[test]
fn a_twenty_tick_delay_is_observed_on_tick_twenty() {
    let (sim, script) = load_script(
        r#"
            bridge.schedule(20).then(|| bridge.broadcast_message("due"));
        "#,
    );
    for tick in 1..20 {
        script.on_tick(tick);
        assert!(sim.borrow().broadcasts().is_empty(), "nothing may run before tick 20");
    }
    script.on_tick(20);
    assert_eq!(sim.borrow().broadcasts(), ["due"]);
    assert_eq!(script.pending_task_count(), 0);
}

#[test]
fn continuations_observe_the_due_tick() {
    let (sim, script) = load_script(
        r#"
            bridge.schedule(20).then(|| {
                bridge.broadcast_message(`resumed at ${bridge.current_tick()}`);
            });
        "#,
    );
    for tick in 1..=20 {
        script.on_tick(tick);
    }
    assert_eq!(sim.borrow().broadcasts(), ["resumed at 20"]);
}

#[test]
fn tasks_resume_in_due_tick_then_registration_order() {
    let (sim, script) = load_script(
        r#"
            bridge.schedule(5).then(|| bridge.broadcast_message("late"));
            bridge.schedule(2).then(|| bridge.broadcast_message("early-a"));
            bridge.schedule(2).then(|| bridge.broadcast_message("early-b"));
        "#,
    );
    // A stalled tick loop catches up in one pump; ordering still holds.
    script.on_tick(5);
    assert_eq!(sim.borrow().broadcasts(), ["early-a", "early-b", "late"]);
}

#[test]
fn continuations_may_schedule_follow_up_work() {
    let (sim, script) = load_script(
        r#"
            bridge.schedule(1).then(|| {
                bridge.broadcast_message("one");
                bridge.schedule(2).then(|| bridge.broadcast_message("two"));
            });
        "#,
    );
    script.on_tick(1);
    assert_eq!(sim.borrow().broadcasts(), ["one"]);
    assert_eq!(script.pending_task_count(), 1, "follow-up lands in the queue, not this pump");

    script.on_tick(2);
    assert_eq!(sim.borrow().broadcasts(), ["one"]);
    script.on_tick(3);
    assert_eq!(sim.borrow().broadcasts(), ["one", "two"]);
}

#[test]
fn continuations_attached_after_resolution_run_immediately() {
    let (sim, script) = load_script(
        r#"
            let fut = bridge.schedule(1);
            bridge.register_command(#{
                name: "attach",
                syntaxes: [
                    #{
                        handler: |sender, args| {
                            fut.then(|| bridge.broadcast_message("late-attach"));
                        }
                    }
                ]
            });
        "#,
    );
    script.on_tick(2);
    assert!(sim.borrow().broadcasts().is_empty());

    assert!(script.execute_command("attach", CommandSender::Console));
    assert_eq!(
        sim.borrow().broadcasts(),
        ["late-attach"],
        "a continuation chained onto an already-resolved future runs at once"
    );
}

#[test]
fn throwing_continuations_do_not_poison_the_pump() {
    let (sim, script) = load_script(
        r#"
            bridge.schedule(1).then(|| { throw "boom" });
            bridge.schedule(1).then(|| bridge.broadcast_message("survivor"));
        "#,
    );
    script.on_tick(1);
    assert_eq!(sim.borrow().broadcasts(), ["survivor"]);
}

#[test]
fn chaining_returns_the_same_future() {
    let (sim, script) = load_script(
        r#"
            bridge.schedule(3)
                .then(|| bridge.broadcast_message("a"))
                .then(|| bridge.broadcast_message("b"));
        "#,
    );
    script.on_tick(3);
    assert_eq!(sim.borrow().broadcasts(), ["a", "b"]);
}
