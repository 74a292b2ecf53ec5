use std::collections::HashMap;
use std::rc::Rc;

use rhai::{Dynamic, Engine, FnPtr, Map};

use crate::args::{validate_syntax, ArgumentDef};
use crate::error::RegistrationError;

/// One argument sequence plus the handler invoked when it matches.
pub struct CommandSyntax {
    pub arguments: Vec<ArgumentDef>,
    pub handler: FnPtr,
}

/// A script-defined command. Immutable once registered; syntaxes are tried
/// in declaration order and the first full match wins.
pub struct CommandDefinition {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub syntaxes: Vec<CommandSyntax>,
}

impl CommandDefinition {
    /// Parses and validates a script-supplied definition map.
    pub fn from_map(map: &Map) -> Result<Self, RegistrationError> {
        let name = map
            .get("name")
            .and_then(|v| v.clone().into_string().ok())
            .filter(|n| !n.trim().is_empty())
            .ok_or(RegistrationError::MissingName)?;

        let aliases = map
            .get("aliases")
            .and_then(|v| v.clone().try_cast::<rhai::Array>())
            .map(|values| values.into_iter().filter_map(|v| v.into_string().ok()).collect())
            .unwrap_or_default();
        let description = map.get("description").and_then(|v| v.clone().into_string().ok());

        let syntax_values = map
            .get("syntaxes")
            .and_then(|v| v.clone().try_cast::<rhai::Array>())
            .filter(|values| !values.is_empty())
            .ok_or_else(|| RegistrationError::NoSyntaxes { command: name.clone() })?;

        let mut syntaxes = Vec::with_capacity(syntax_values.len());
        for (index, value) in syntax_values.into_iter().enumerate() {
            let syntax_map = value.try_cast::<Map>().ok_or_else(|| {
                RegistrationError::InvalidDefinition(format!(
                    "command '{name}': syntax {index} must be a map"
                ))
            })?;
            let handler = syntax_map
                .get("handler")
                .and_then(|v| v.clone().try_cast::<FnPtr>())
                .ok_or_else(|| RegistrationError::MissingHandler { command: name.clone(), index })?;

            let mut arguments = Vec::new();
            if let Some(argument_values) =
                syntax_map.get("arguments").and_then(|v| v.clone().try_cast::<rhai::Array>())
            {
                for argument_value in argument_values {
                    let argument_map = argument_value.try_cast::<Map>().ok_or_else(|| {
                        RegistrationError::InvalidDefinition(format!(
                            "command '{name}': argument definitions must be maps"
                        ))
                    })?;
                    arguments.push(ArgumentDef::from_map(&name, &argument_map)?);
                }
            }
            validate_syntax(&name, &arguments)?;
            syntaxes.push(CommandSyntax { arguments, handler });
        }

        Ok(Self { name, aliases, description, syntaxes })
    }
}

/// Per-generation command registry. Owns every script-defined command and
/// routes lookups by name or alias (case-insensitive, Minestom style).
#[derive(Default)]
pub struct CommandBridge {
    definitions: Vec<Rc<CommandDefinition>>,
    index: HashMap<String, usize>,
}

impl CommandBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a definition, rejecting any name or alias that collides with
    /// a command already registered by this script generation.
    pub fn register(&mut self, definition: CommandDefinition) -> Result<(), RegistrationError> {
        let mut keys = vec![definition.name.to_ascii_lowercase()];
        keys.extend(definition.aliases.iter().map(|a| a.to_ascii_lowercase()));
        for key in &keys {
            if self.index.contains_key(key) {
                return Err(RegistrationError::DuplicateName(key.clone()));
            }
        }
        let slot = self.definitions.len();
        self.definitions.push(Rc::new(definition));
        for key in keys {
            self.index.insert(key, slot);
        }
        Ok(())
    }

    pub fn lookup(&self, token: &str) -> Option<Rc<CommandDefinition>> {
        self.index.get(&token.to_ascii_lowercase()).map(|&slot| self.definitions[slot].clone())
    }

    pub fn command_count(&self) -> usize {
        self.definitions.len()
    }

    /// Removes every definition, returning them so the host dispatcher
    /// entries can be uninstalled.
    pub fn drain(&mut self) -> Vec<Rc<CommandDefinition>> {
        self.index.clear();
        std::mem::take(&mut self.definitions)
    }
}

/// Parsed-argument context handed to command handlers. `get(name)` returns
/// the parsed value, or unit for unknown or unmatched names.
#[derive(Clone)]
pub struct CommandArgs {
    values: Rc<HashMap<String, Dynamic>>,
}

impl CommandArgs {
    pub fn new(values: HashMap<String, Dynamic>) -> Self {
        Self { values: Rc::new(values) }
    }

    pub fn get(&self, name: &str) -> Dynamic {
        self.values.get(name).cloned().unwrap_or(Dynamic::UNIT)
    }
}

pub fn register_command_api(engine: &mut Engine) {
    engine.register_type_with_name::<CommandArgs>("CommandArgs");
    engine.register_fn("get", |args: &mut CommandArgs, name: &str| args.get(name));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(name: &str, aliases: &[&str]) -> CommandDefinition {
        CommandDefinition {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            description: None,
            syntaxes: vec![CommandSyntax { arguments: Vec::new(), handler: FnPtr::new("noop").unwrap() }],
        }
    }

    #[test]
    fn duplicate_names_and_aliases_are_rejected() {
        let mut bridge = CommandBridge::new();
        bridge.register(definition("jscmd", &["jc"])).expect("first registration");
        assert!(matches!(
            bridge.register(definition("jscmd", &[])),
            Err(RegistrationError::DuplicateName(_))
        ));
        assert!(matches!(
            bridge.register(definition("other", &["JC"])),
            Err(RegistrationError::DuplicateName(_)),
        ), "alias collisions are case-insensitive");
    }

    #[test]
    fn lookup_matches_name_and_alias() {
        let mut bridge = CommandBridge::new();
        bridge.register(definition("jscmd", &["jc"])).expect("registration");
        assert!(bridge.lookup("JSCMD").is_some());
        assert!(bridge.lookup("jc").is_some());
        assert!(bridge.lookup("nope").is_none());
    }

    #[test]
    fn drain_empties_the_registry() {
        let mut bridge = CommandBridge::new();
        bridge.register(definition("jscmd", &[])).expect("registration");
        let drained = bridge.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(bridge.command_count(), 0);
        assert!(bridge.lookup("jscmd").is_none());
    }

    #[test]
    fn from_map_validates_argument_schemas() {
        let mut arg = Map::new();
        arg.insert("name".into(), Dynamic::from("mode".to_string()));
        arg.insert("type".into(), Dynamic::from("enum".to_string()));
        let mut syntax = Map::new();
        syntax.insert("handler".into(), Dynamic::from(FnPtr::new("handler").unwrap()));
        syntax.insert("arguments".into(), Dynamic::from(vec![Dynamic::from(arg)]));
        let mut map = Map::new();
        map.insert("name".into(), Dynamic::from("modecmd".to_string()));
        map.insert("syntaxes".into(), Dynamic::from(vec![Dynamic::from(syntax)]));

        assert!(
            matches!(CommandDefinition::from_map(&map), Err(RegistrationError::EmptyEnum { .. })),
            "enum without enum_values must fail at registration"
        );
    }
}
