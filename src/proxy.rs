use rhai::{Dynamic, Engine};
use tracing::debug;

use crate::host::{BlockPos, CommandSender, GameMode, HostHandle, PlayerId, Position};

/// Immutable coordinate snapshot. Handing out a copy rather than a live
/// reference means scripts must re-query to observe movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionView {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PositionView {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_position(position: Position) -> Self {
        Self::new(position.x, position.y, position.z)
    }
}

/// Capability-restricted view of a player. Holds only the stable identity;
/// every method re-resolves the player at call time and fails gracefully if
/// the player has since disconnected.
#[derive(Clone)]
pub struct PlayerView {
    id: PlayerId,
    host: HostHandle,
}

impl PlayerView {
    pub fn new(id: PlayerId, host: HostHandle) -> Self {
        Self { id, host }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> String {
        self.host.borrow().player_name(self.id).unwrap_or_default()
    }

    pub fn uuid(&self) -> String {
        self.id.to_string()
    }

    pub fn send_message(&self, message: &str) -> bool {
        let delivered = self.host.borrow_mut().send_message(self.id, message);
        if !delivered {
            debug!(player = %self.id, "dropped message for disconnected player");
        }
        delivered
    }

    /// Value snapshot of the current position, or unit if the player is gone.
    pub fn position(&self) -> Dynamic {
        match self.host.borrow().player_position(self.id) {
            Some(position) => Dynamic::from(PositionView::from_position(position)),
            None => Dynamic::UNIT,
        }
    }

    pub fn set_game_mode(&self, mode_name: &str) -> bool {
        let Some(mode) = GameMode::parse(mode_name) else {
            debug!(mode = mode_name, "unrecognized game mode");
            return false;
        };
        self.host.borrow_mut().set_game_mode(self.id, mode)
    }

    pub fn instance(&self) -> Dynamic {
        if self.host.borrow().player_name(self.id).is_some() {
            Dynamic::from(InstanceView { player: self.id, host: self.host.clone() })
        } else {
            Dynamic::UNIT
        }
    }
}

/// View of the world instance a player occupies. Mutations go through the
/// host engine and re-resolve the player each call.
#[derive(Clone)]
pub struct InstanceView {
    player: PlayerId,
    host: HostHandle,
}

impl InstanceView {
    pub fn send_message(&self, message: &str) -> bool {
        self.host.borrow_mut().send_message(self.player, message)
    }

    pub fn set_block(&self, x: i64, y: i64, z: i64, block_id: &str) -> bool {
        let (Ok(x), Ok(y), Ok(z)) = (i32::try_from(x), i32::try_from(y), i32::try_from(z)) else {
            debug!(x, y, z, "set_block coordinates outside the world");
            return false;
        };
        let pos = BlockPos::new(x, y, z);
        let placed = self.host.borrow_mut().set_block(self.player, pos, block_id);
        if !placed {
            debug!(block = block_id, "set_block rejected by host");
        }
        placed
    }
}

/// Read-only block description carried by interaction events.
#[derive(Debug, Clone)]
pub struct BlockView {
    pub pos: BlockPos,
    pub namespace_id: String,
}

impl BlockView {
    pub fn new(pos: BlockPos, namespace_id: impl Into<String>) -> Self {
        Self { pos, namespace_id: namespace_id.into() }
    }

    fn short_id(&self) -> String {
        self.namespace_id
            .split_once(':')
            .map(|(_, path)| path.to_string())
            .unwrap_or_else(|| self.namespace_id.clone())
    }
}

/// Payload view for `player_block_interact`.
#[derive(Clone)]
pub struct BlockInteractEvent {
    pub player: PlayerView,
    pub block: BlockView,
    pub hand: &'static str,
}

/// Payload view for `player_move`.
#[derive(Clone)]
pub struct PlayerMoveEvent {
    pub player: PlayerView,
    pub position: PositionView,
    pub on_ground: bool,
}

/// View of whoever invoked a command: a player or the console.
#[derive(Clone)]
pub struct SenderView {
    sender: CommandSender,
    host: HostHandle,
}

impl SenderView {
    pub fn new(sender: CommandSender, host: HostHandle) -> Self {
        Self { sender, host }
    }

    pub fn name(&self) -> String {
        match self.sender {
            CommandSender::Console => "CONSOLE".to_string(),
            CommandSender::Player(id) => self.host.borrow().player_name(id).unwrap_or_default(),
        }
    }

    pub fn uuid(&self) -> Dynamic {
        match self.sender {
            CommandSender::Console => Dynamic::UNIT,
            CommandSender::Player(id) => Dynamic::from(id.to_string()),
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.sender, CommandSender::Player(_))
    }

    pub fn send_message(&self, message: &str) -> bool {
        match self.sender {
            CommandSender::Console => {
                self.host.borrow_mut().console_message(message);
                true
            }
            CommandSender::Player(id) => self.host.borrow_mut().send_message(id, message),
        }
    }
}

/// Registers every proxy view with the script engine. Only whitelisted
/// fields and methods appear here; the raw host handle is never exposed.
pub fn register_views(engine: &mut Engine) {
    engine.register_type_with_name::<PositionView>("Position");
    engine.register_get("x", |p: &mut PositionView| p.x);
    engine.register_get("y", |p: &mut PositionView| p.y);
    engine.register_get("z", |p: &mut PositionView| p.z);

    engine.register_type_with_name::<PlayerView>("Player");
    engine.register_get("name", |p: &mut PlayerView| p.name());
    engine.register_get("uuid", |p: &mut PlayerView| p.uuid());
    engine.register_get("instance", |p: &mut PlayerView| p.instance());
    engine.register_fn("send_message", |p: &mut PlayerView, message: &str| p.send_message(message));
    engine.register_fn("position", |p: &mut PlayerView| p.position());
    engine.register_fn("set_game_mode", |p: &mut PlayerView, mode: &str| p.set_game_mode(mode));

    engine.register_type_with_name::<InstanceView>("Instance");
    engine.register_fn("send_message", |i: &mut InstanceView, message: &str| i.send_message(message));
    engine.register_fn("set_block", |i: &mut InstanceView, x: i64, y: i64, z: i64, block: &str| {
        i.set_block(x, y, z, block)
    });

    engine.register_type_with_name::<BlockView>("Block");
    engine.register_get("x", |b: &mut BlockView| b.pos.x as i64);
    engine.register_get("y", |b: &mut BlockView| b.pos.y as i64);
    engine.register_get("z", |b: &mut BlockView| b.pos.z as i64);
    engine.register_get("id", |b: &mut BlockView| b.short_id());
    engine.register_get("namespace_id", |b: &mut BlockView| b.namespace_id.clone());

    engine.register_type_with_name::<BlockInteractEvent>("BlockInteractEvent");
    engine.register_get("player", |e: &mut BlockInteractEvent| e.player.clone());
    engine.register_get("block", |e: &mut BlockInteractEvent| e.block.clone());
    engine.register_get("hand", |e: &mut BlockInteractEvent| e.hand);

    engine.register_type_with_name::<PlayerMoveEvent>("PlayerMoveEvent");
    engine.register_get("player", |e: &mut PlayerMoveEvent| e.player.clone());
    engine.register_get("position", |e: &mut PlayerMoveEvent| e.position);
    engine.register_get("on_ground", |e: &mut PlayerMoveEvent| e.on_ground);

    engine.register_type_with_name::<SenderView>("Sender");
    engine.register_get("name", |s: &mut SenderView| s.name());
    engine.register_get("uuid", |s: &mut SenderView| s.uuid());
    engine.register_fn("is_player", |s: &mut SenderView| s.is_player());
    engine.register_fn("send_message", |s: &mut SenderView, message: &str| s.send_message(message));
}
