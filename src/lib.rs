pub mod args;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod modules;
pub mod proxy;
pub mod scheduler;
pub mod script_host;

pub use config::BridgeConfig;
pub use error::{LoadError, RegistrationError};
pub use events::{EventBridge, EventCategory, HostEvent};
pub use host::{CommandSender, GameMode, Hand, HostEngine, HostHandle, PlayerId, SimHost};
pub use modules::ModuleSet;
pub use script_host::{ScriptHost, ScriptRuntime};
