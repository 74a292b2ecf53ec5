use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use glam::{DVec3, IVec3};
use uuid::Uuid;

pub type PlayerId = Uuid;
pub type Position = DVec3;
pub type BlockPos = IVec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "survival" => Some(GameMode::Survival),
            "creative" => Some(GameMode::Creative),
            "adventure" => Some(GameMode::Adventure),
            "spectator" => Some(GameMode::Spectator),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GameMode::Survival => "survival",
            GameMode::Creative => "creative",
            GameMode::Adventure => "adventure",
            GameMode::Spectator => "spectator",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Main,
    Off,
}

impl Hand {
    pub fn label(self) -> &'static str {
        match self {
            Hand::Main => "main_hand",
            Hand::Off => "off_hand",
        }
    }
}

/// Origin of a command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSender {
    Console,
    Player(PlayerId),
}

/// Everything the bridge needs from the surrounding game server. Mutating
/// operations return whether they took effect so script-facing views can
/// fail gracefully instead of erroring.
pub trait HostEngine {
    fn player_name(&self, player: PlayerId) -> Option<String>;
    fn player_position(&self, player: PlayerId) -> Option<Position>;
    fn find_player(&self, name: &str) -> Option<PlayerId>;
    fn online_players(&self) -> Vec<PlayerId>;

    fn send_message(&mut self, player: PlayerId, message: &str) -> bool;
    fn broadcast(&mut self, message: &str);
    fn console_message(&mut self, message: &str);
    fn set_game_mode(&mut self, player: PlayerId, mode: GameMode) -> bool;
    fn set_block(&mut self, player: PlayerId, pos: BlockPos, block_id: &str) -> bool;

    fn install_command(&mut self, name: &str, aliases: &[String]);
    fn uninstall_command(&mut self, name: &str);
}

/// Shared handle to the host engine. Proxy views hold clones of this; the
/// engine itself is single-threaded so interior mutability is enough.
#[derive(Clone)]
pub struct HostHandle(Rc<RefCell<dyn HostEngine>>);

impl HostHandle {
    pub fn new(engine: impl HostEngine + 'static) -> Self {
        Self(Rc::new(RefCell::new(engine)))
    }

    /// Wraps an already-shared engine so callers can keep their own handle
    /// to the concrete type.
    pub fn from_shared(engine: Rc<RefCell<dyn HostEngine>>) -> Self {
        Self(engine)
    }

    pub fn borrow(&self) -> Ref<'_, dyn HostEngine> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, dyn HostEngine> {
        self.0.borrow_mut()
    }
}

#[derive(Debug, Default)]
struct SimPlayer {
    name: String,
    position: Position,
    game_mode: Option<GameMode>,
    messages: Vec<String>,
}

/// In-memory host engine. Stands in for a real game server in the demo
/// binary and in tests, recording every side effect for inspection.
#[derive(Default)]
pub struct SimHost {
    players: HashMap<PlayerId, SimPlayer>,
    blocks: HashMap<IVec3, String>,
    broadcasts: Vec<String>,
    console: Vec<String>,
    commands: Vec<String>,
}

impl SimHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn_player(&mut self, name: &str) -> PlayerId {
        let id = Uuid::new_v4();
        self.players.insert(id, SimPlayer { name: name.to_string(), ..Default::default() });
        id
    }

    pub fn remove_player(&mut self, player: PlayerId) {
        self.players.remove(&player);
    }

    pub fn set_position(&mut self, player: PlayerId, position: Position) {
        if let Some(p) = self.players.get_mut(&player) {
            p.position = position;
        }
    }

    pub fn game_mode(&self, player: PlayerId) -> Option<GameMode> {
        self.players.get(&player).and_then(|p| p.game_mode)
    }

    pub fn messages_for(&self, player: PlayerId) -> &[String] {
        self.players.get(&player).map(|p| p.messages.as_slice()).unwrap_or(&[])
    }

    pub fn broadcasts(&self) -> &[String] {
        &self.broadcasts
    }

    pub fn console_lines(&self) -> &[String] {
        &self.console
    }

    pub fn block_at(&self, pos: BlockPos) -> Option<&str> {
        self.blocks.get(&pos).map(String::as_str)
    }

    pub fn installed_commands(&self) -> &[String] {
        &self.commands
    }

    fn valid_block_id(block_id: &str) -> bool {
        !block_id.is_empty()
            && block_id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | ':'))
    }
}

impl HostEngine for SimHost {
    fn player_name(&self, player: PlayerId) -> Option<String> {
        self.players.get(&player).map(|p| p.name.clone())
    }

    fn player_position(&self, player: PlayerId) -> Option<Position> {
        self.players.get(&player).map(|p| p.position)
    }

    fn find_player(&self, name: &str) -> Option<PlayerId> {
        self.players.iter().find(|(_, p)| p.name.eq_ignore_ascii_case(name)).map(|(id, _)| *id)
    }

    fn online_players(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    fn send_message(&mut self, player: PlayerId, message: &str) -> bool {
        match self.players.get_mut(&player) {
            Some(p) => {
                p.messages.push(message.to_string());
                true
            }
            None => false,
        }
    }

    fn broadcast(&mut self, message: &str) {
        self.broadcasts.push(message.to_string());
    }

    fn console_message(&mut self, message: &str) {
        self.console.push(message.to_string());
    }

    fn set_game_mode(&mut self, player: PlayerId, mode: GameMode) -> bool {
        match self.players.get_mut(&player) {
            Some(p) => {
                p.game_mode = Some(mode);
                true
            }
            None => false,
        }
    }

    fn set_block(&mut self, player: PlayerId, pos: BlockPos, block_id: &str) -> bool {
        if !self.players.contains_key(&player) || !Self::valid_block_id(block_id) {
            return false;
        }
        self.blocks.insert(pos, block_id.to_string());
        true
    }

    fn install_command(&mut self, name: &str, _aliases: &[String]) {
        self.commands.push(name.to_string());
    }

    fn uninstall_command(&mut self, name: &str) {
        self.commands.retain(|c| c != name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_mode_parsing_is_case_insensitive() {
        assert_eq!(GameMode::parse("CREATIVE"), Some(GameMode::Creative));
        assert_eq!(GameMode::parse("Survival"), Some(GameMode::Survival));
        assert_eq!(GameMode::parse("hardcore"), None);
    }

    #[test]
    fn messages_to_missing_players_are_dropped() {
        let mut sim = SimHost::new();
        let alice = sim.spawn_player("Alice");
        assert!(sim.send_message(alice, "hi"));
        sim.remove_player(alice);
        assert!(!sim.send_message(alice, "gone"));
        assert!(sim.messages_for(alice).is_empty());
    }

    #[test]
    fn block_ids_are_validated_before_placement() {
        let mut sim = SimHost::new();
        let alice = sim.spawn_player("Alice");
        let pos = BlockPos::new(0, 64, 0);
        assert!(sim.set_block(alice, pos, "minecraft:gold_block"));
        assert_eq!(sim.block_at(pos), Some("minecraft:gold_block"));
        assert!(!sim.set_block(alice, pos, "NOT VALID"));
    }
}
