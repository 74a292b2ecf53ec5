use std::collections::HashMap;

use rhai::FnPtr;

use crate::host::{BlockPos, Hand, PlayerId, Position};

/// Closed set of host event categories scripts may subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    PlayerJoin,
    PlayerLeave,
    PlayerMove,
    PlayerBlockInteract,
}

impl EventCategory {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "player_join" => Some(EventCategory::PlayerJoin),
            "player_leave" => Some(EventCategory::PlayerLeave),
            "player_move" => Some(EventCategory::PlayerMove),
            "player_block_interact" => Some(EventCategory::PlayerBlockInteract),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EventCategory::PlayerJoin => "player_join",
            EventCategory::PlayerLeave => "player_leave",
            EventCategory::PlayerMove => "player_move",
            EventCategory::PlayerBlockInteract => "player_block_interact",
        }
    }
}

/// One host engine event occurrence, with its fixed payload schema.
#[derive(Debug, Clone)]
pub enum HostEvent {
    PlayerJoin { player: PlayerId },
    PlayerLeave { player: PlayerId },
    PlayerMove { player: PlayerId, position: Position, on_ground: bool },
    PlayerBlockInteract { player: PlayerId, block: BlockPos, block_id: String, hand: Hand },
}

impl HostEvent {
    pub fn category(&self) -> EventCategory {
        match self {
            HostEvent::PlayerJoin { .. } => EventCategory::PlayerJoin,
            HostEvent::PlayerLeave { .. } => EventCategory::PlayerLeave,
            HostEvent::PlayerMove { .. } => EventCategory::PlayerMove,
            HostEvent::PlayerBlockInteract { .. } => EventCategory::PlayerBlockInteract,
        }
    }
}

/// Ordered script subscriptions per event category. The bridge stores each
/// callback as an opaque callable handle and never inspects it; invocation
/// happens in `ScriptHost::dispatch` where the engine and AST live.
#[derive(Default)]
pub struct EventBridge {
    subscriptions: HashMap<EventCategory, Vec<FnPtr>>,
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends in registration order. No de-duplication: registering the same
    /// callback twice invokes it twice per event.
    pub fn subscribe(&mut self, category: EventCategory, callback: FnPtr) {
        self.subscriptions.entry(category).or_default().push(callback);
    }

    /// Snapshot of the callbacks for one dispatch. Cloning up front keeps the
    /// bridge re-entrant: a callback may subscribe more listeners without
    /// affecting the dispatch already in flight.
    pub fn snapshot(&self, category: EventCategory) -> Vec<FnPtr> {
        self.subscriptions.get(&category).cloned().unwrap_or_default()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_round_trip_through_labels() {
        for category in [
            EventCategory::PlayerJoin,
            EventCategory::PlayerLeave,
            EventCategory::PlayerMove,
            EventCategory::PlayerBlockInteract,
        ] {
            assert_eq!(EventCategory::parse(category.label()), Some(category));
        }
        assert_eq!(EventCategory::parse("player_chat"), None);
    }
}
