use std::fmt;

use glam::{DVec2, DVec3};
use rhai::{Dynamic, Map};
use uuid::Uuid;

use crate::error::RegistrationError;
use crate::host::{BlockPos, HostHandle, PlayerId};
use crate::proxy::{PlayerView, PositionView};

/// Closed set of argument types a command syntax may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    String,
    Word,
    GreedyString,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Player,
    Entity,
    Uuid,
    Command,
    Component,
    ItemStack,
    BlockPosition,
    Vec2,
    Vec3,
    Color,
    Time,
    ResourceLocation,
    Potion,
    Enum,
}

impl ArgKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "string" => Some(ArgKind::String),
            "word" => Some(ArgKind::Word),
            "greedystring" => Some(ArgKind::GreedyString),
            "integer" => Some(ArgKind::Integer),
            "long" => Some(ArgKind::Long),
            "float" => Some(ArgKind::Float),
            "double" => Some(ArgKind::Double),
            "boolean" => Some(ArgKind::Boolean),
            "player" => Some(ArgKind::Player),
            "entity" => Some(ArgKind::Entity),
            "uuid" => Some(ArgKind::Uuid),
            "command" => Some(ArgKind::Command),
            "component" => Some(ArgKind::Component),
            "itemstack" => Some(ArgKind::ItemStack),
            "blockposition" => Some(ArgKind::BlockPosition),
            "vec2" => Some(ArgKind::Vec2),
            "vec3" => Some(ArgKind::Vec3),
            "color" => Some(ArgKind::Color),
            "time" => Some(ArgKind::Time),
            "resourcelocation" => Some(ArgKind::ResourceLocation),
            "potion" => Some(ArgKind::Potion),
            "enum" => Some(ArgKind::Enum),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ArgKind::Integer | ArgKind::Long | ArgKind::Float | ArgKind::Double)
    }

    /// Greedy kinds consume every remaining token and must close the syntax.
    pub fn is_greedy(self) -> bool {
        matches!(self, ArgKind::GreedyString)
    }
}

/// One declared argument of a command syntax.
#[derive(Debug, Clone)]
pub struct ArgumentDef {
    pub name: String,
    pub kind: ArgKind,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub enum_values: Vec<String>,
    pub default_value: Option<String>,
    pub single_only: bool,
    pub players_only: bool,
}

impl ArgumentDef {
    pub fn new(name: impl Into<String>, kind: ArgKind) -> Self {
        Self {
            name: name.into(),
            kind,
            min: None,
            max: None,
            enum_values: Vec::new(),
            default_value: None,
            single_only: true,
            players_only: false,
        }
    }

    /// Reads one argument definition out of a script-supplied map.
    pub fn from_map(command: &str, map: &Map) -> Result<Self, RegistrationError> {
        let name = map
            .get("name")
            .and_then(|v| v.clone().into_string().ok())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                RegistrationError::InvalidDefinition(format!(
                    "command '{command}': argument definition requires a 'name'"
                ))
            })?;
        let kind_name = map.get("type").and_then(|v| v.clone().into_string().ok()).ok_or_else(|| {
            RegistrationError::InvalidDefinition(format!(
                "command '{command}': argument '{name}' requires a 'type'"
            ))
        })?;
        let kind = ArgKind::parse(&kind_name).ok_or_else(|| RegistrationError::UnknownArgumentType {
            command: command.to_string(),
            argument: name.clone(),
            kind: kind_name,
        })?;

        let mut def = ArgumentDef::new(name, kind);
        def.min = map.get("min").and_then(as_number);
        def.max = map.get("max").and_then(as_number);
        if let Some(values) = map.get("enum_values").and_then(|v| v.clone().try_cast::<rhai::Array>()) {
            def.enum_values =
                values.into_iter().filter_map(|v| v.into_string().ok()).collect();
        }
        def.default_value = map.get("default").map(|v| v.to_string());
        if let Some(single) = map.get("single_only").and_then(|v| v.as_bool().ok()) {
            def.single_only = single;
        }
        if let Some(players) = map.get("players_only").and_then(|v| v.as_bool().ok()) {
            def.players_only = players;
        }
        def.validate(command)?;
        Ok(def)
    }

    fn validate(&self, command: &str) -> Result<(), RegistrationError> {
        if (self.min.is_some() || self.max.is_some()) && !self.kind.is_numeric() {
            return Err(RegistrationError::NonNumericRange {
                command: command.to_string(),
                argument: self.name.clone(),
            });
        }
        if self.kind == ArgKind::Enum && self.enum_values.is_empty() {
            return Err(RegistrationError::EmptyEnum {
                command: command.to_string(),
                argument: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Checks syntax-level invariants at registration time.
pub fn validate_syntax(command: &str, arguments: &[ArgumentDef]) -> Result<(), RegistrationError> {
    for (index, def) in arguments.iter().enumerate() {
        if def.kind.is_greedy() && index + 1 != arguments.len() {
            return Err(RegistrationError::GreedyNotLast {
                command: command.to_string(),
                argument: def.name.clone(),
            });
        }
    }
    Ok(())
}

fn as_number(value: &Dynamic) -> Option<f64> {
    value.as_float().ok().or_else(|| value.as_int().ok().map(|i| i as f64))
}

/// A parsed argument value, typed by the declaring `ArgKind`.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Player(PlayerId),
    Uuid(Uuid),
    BlockPos(BlockPos),
    Vec2(DVec2),
    Vec3(DVec3),
    Color([u8; 3]),
    Ticks(i64),
    ResourceLocation(String),
}

impl ArgValue {
    /// Converts into a script-facing value. Live entity references become
    /// proxy views; everything else becomes a plain value or map.
    pub fn into_dynamic(self, host: &HostHandle) -> Dynamic {
        match self {
            ArgValue::Str(s) | ArgValue::ResourceLocation(s) => Dynamic::from(s),
            ArgValue::Int(i) | ArgValue::Ticks(i) => Dynamic::from(i),
            ArgValue::Float(f) => Dynamic::from(f),
            ArgValue::Bool(b) => Dynamic::from(b),
            ArgValue::Player(id) => Dynamic::from(PlayerView::new(id, host.clone())),
            ArgValue::Uuid(id) => Dynamic::from(id.to_string()),
            ArgValue::BlockPos(pos) => {
                let mut map = Map::new();
                map.insert("x".into(), Dynamic::from(pos.x as i64));
                map.insert("y".into(), Dynamic::from(pos.y as i64));
                map.insert("z".into(), Dynamic::from(pos.z as i64));
                Dynamic::from(map)
            }
            ArgValue::Vec2(v) => {
                let mut map = Map::new();
                map.insert("x".into(), Dynamic::from(v.x));
                map.insert("y".into(), Dynamic::from(v.y));
                Dynamic::from(map)
            }
            ArgValue::Vec3(v) => Dynamic::from(PositionView::new(v.x, v.y, v.z)),
            ArgValue::Color([r, g, b]) => {
                let mut map = Map::new();
                map.insert("r".into(), Dynamic::from(r as i64));
                map.insert("g".into(), Dynamic::from(g as i64));
                map.insert("b".into(), Dynamic::from(b as i64));
                Dynamic::from(map)
            }
        }
    }
}

/// Why a syntax did not match the supplied tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseFailure {
    MissingToken { argument: String },
    BadValue { argument: String, token: String, expected: &'static str },
    OutOfRange { argument: String, token: String },
    UnknownEnumValue { argument: String, token: String },
    PlayerNotFound { argument: String, token: String },
    TrailingTokens { count: usize },
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFailure::MissingToken { argument } => {
                write!(f, "missing value for argument '{argument}'")
            }
            ParseFailure::BadValue { argument, token, expected } => {
                write!(f, "argument '{argument}': '{token}' is not a valid {expected}")
            }
            ParseFailure::OutOfRange { argument, token } => {
                write!(f, "argument '{argument}': '{token}' is out of range")
            }
            ParseFailure::UnknownEnumValue { argument, token } => {
                write!(f, "argument '{argument}': '{token}' is not an accepted value")
            }
            ParseFailure::PlayerNotFound { argument, token } => {
                write!(f, "argument '{argument}': player '{token}' not found")
            }
            ParseFailure::TrailingTokens { count } => {
                write!(f, "{count} unexpected trailing token(s)")
            }
        }
    }
}

/// Parses a token stream against one syntax, left to right. Succeeds only
/// when every token is consumed ("full match").
pub fn parse_syntax(
    arguments: &[ArgumentDef],
    tokens: &[&str],
    host: &HostHandle,
) -> Result<Vec<(String, ArgValue)>, ParseFailure> {
    let mut values = Vec::with_capacity(arguments.len());
    let mut cursor = 0usize;

    for def in arguments {
        if def.kind.is_greedy() {
            if cursor >= tokens.len() {
                match def.default_value.clone() {
                    Some(value) => {
                        values.push((def.name.clone(), ArgValue::Str(value)));
                        continue;
                    }
                    None => return Err(ParseFailure::MissingToken { argument: def.name.clone() }),
                }
            }
            let rest = tokens[cursor..].join(" ");
            cursor = tokens.len();
            values.push((def.name.clone(), ArgValue::Str(rest)));
            continue;
        }
        let value = parse_one(def, tokens, &mut cursor, host)?;
        values.push((def.name.clone(), value));
    }

    if cursor < tokens.len() {
        return Err(ParseFailure::TrailingTokens { count: tokens.len() - cursor });
    }
    Ok(values)
}

// Exhausted input falls back to the argument's declared default, if any.
fn next_token<'t>(
    def: &'t ArgumentDef,
    tokens: &[&'t str],
    cursor: &mut usize,
) -> Result<&'t str, ParseFailure> {
    match tokens.get(*cursor) {
        Some(token) => {
            *cursor += 1;
            Ok(token)
        }
        None => match def.default_value.as_deref() {
            Some(value) => Ok(value),
            None => Err(ParseFailure::MissingToken { argument: def.name.clone() }),
        },
    }
}

fn parse_one(
    def: &ArgumentDef,
    tokens: &[&str],
    cursor: &mut usize,
    host: &HostHandle,
) -> Result<ArgValue, ParseFailure> {
    match def.kind {
        ArgKind::String | ArgKind::Word | ArgKind::Command | ArgKind::Component => {
            let token = next_token(def, tokens, cursor)?;
            Ok(ArgValue::Str(token.to_string()))
        }
        ArgKind::GreedyString => unreachable!("greedy arguments are consumed by parse_syntax"),
        ArgKind::Integer | ArgKind::Long => {
            let token = next_token(def, tokens, cursor)?;
            let value: i64 = token.parse().map_err(|_| ParseFailure::BadValue {
                argument: def.name.clone(),
                token: token.to_string(),
                expected: "integer",
            })?;
            check_range(def, value as f64, token)?;
            Ok(ArgValue::Int(value))
        }
        ArgKind::Float | ArgKind::Double => {
            let token = next_token(def, tokens, cursor)?;
            let value: f64 = token.parse().map_err(|_| ParseFailure::BadValue {
                argument: def.name.clone(),
                token: token.to_string(),
                expected: "number",
            })?;
            check_range(def, value, token)?;
            Ok(ArgValue::Float(value))
        }
        ArgKind::Boolean => {
            let token = next_token(def, tokens, cursor)?;
            match token.to_ascii_lowercase().as_str() {
                "true" => Ok(ArgValue::Bool(true)),
                "false" => Ok(ArgValue::Bool(false)),
                _ => Err(ParseFailure::BadValue {
                    argument: def.name.clone(),
                    token: token.to_string(),
                    expected: "boolean",
                }),
            }
        }
        ArgKind::Player | ArgKind::Entity => {
            let token = next_token(def, tokens, cursor)?;
            resolve_player(def, token, host)
        }
        ArgKind::Uuid => {
            let token = next_token(def, tokens, cursor)?;
            let id = Uuid::parse_str(token).map_err(|_| ParseFailure::BadValue {
                argument: def.name.clone(),
                token: token.to_string(),
                expected: "uuid",
            })?;
            Ok(ArgValue::Uuid(id))
        }
        ArgKind::ItemStack | ArgKind::ResourceLocation | ArgKind::Potion => {
            let token = next_token(def, tokens, cursor)?;
            parse_resource_location(def, token)
        }
        ArgKind::BlockPosition => {
            let x = parse_int_component(def, tokens, cursor)?;
            let y = parse_int_component(def, tokens, cursor)?;
            let z = parse_int_component(def, tokens, cursor)?;
            Ok(ArgValue::BlockPos(BlockPos::new(x, y, z)))
        }
        ArgKind::Vec2 => {
            let x = parse_float_component(def, tokens, cursor)?;
            let y = parse_float_component(def, tokens, cursor)?;
            Ok(ArgValue::Vec2(DVec2::new(x, y)))
        }
        ArgKind::Vec3 => {
            let x = parse_float_component(def, tokens, cursor)?;
            let y = parse_float_component(def, tokens, cursor)?;
            let z = parse_float_component(def, tokens, cursor)?;
            Ok(ArgValue::Vec3(DVec3::new(x, y, z)))
        }
        ArgKind::Color => {
            let token = next_token(def, tokens, cursor)?;
            parse_color(def, token)
        }
        ArgKind::Time => {
            let token = next_token(def, tokens, cursor)?;
            parse_time(def, token)
        }
        ArgKind::Enum => {
            let token = next_token(def, tokens, cursor)?;
            def.enum_values
                .iter()
                .find(|value| value.eq_ignore_ascii_case(token))
                .map(|value| ArgValue::Str(value.clone()))
                .ok_or_else(|| ParseFailure::UnknownEnumValue {
                    argument: def.name.clone(),
                    token: token.to_string(),
                })
        }
    }
}

fn check_range(def: &ArgumentDef, value: f64, token: &str) -> Result<(), ParseFailure> {
    let below = def.min.is_some_and(|min| value < min);
    let above = def.max.is_some_and(|max| value > max);
    if below || above {
        return Err(ParseFailure::OutOfRange { argument: def.name.clone(), token: token.to_string() });
    }
    Ok(())
}

fn resolve_player(def: &ArgumentDef, token: &str, host: &HostHandle) -> Result<ArgValue, ParseFailure> {
    let host = host.borrow();
    let resolved = host.find_player(token).or_else(|| {
        Uuid::parse_str(token).ok().filter(|id| host.player_name(*id).is_some())
    });
    match resolved {
        Some(id) => Ok(ArgValue::Player(id)),
        None => Err(ParseFailure::PlayerNotFound {
            argument: def.name.clone(),
            token: token.to_string(),
        }),
    }
}

// Coordinates must fit the world's i32 space; anything wider is a bad value,
// not a silent wrap.
fn parse_int_component(def: &ArgumentDef, tokens: &[&str], cursor: &mut usize) -> Result<i32, ParseFailure> {
    let token = next_token(def, tokens, cursor)?;
    token.parse().map_err(|_| ParseFailure::BadValue {
        argument: def.name.clone(),
        token: token.to_string(),
        expected: "integer coordinate",
    })
}

fn parse_float_component(def: &ArgumentDef, tokens: &[&str], cursor: &mut usize) -> Result<f64, ParseFailure> {
    let token = next_token(def, tokens, cursor)?;
    token.parse().map_err(|_| ParseFailure::BadValue {
        argument: def.name.clone(),
        token: token.to_string(),
        expected: "coordinate",
    })
}

fn parse_resource_location(def: &ArgumentDef, token: &str) -> Result<ArgValue, ParseFailure> {
    let valid = token
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | ':' | '/' | '.' | '-'))
        && !token.is_empty()
        && token.matches(':').count() <= 1;
    if !valid {
        return Err(ParseFailure::BadValue {
            argument: def.name.clone(),
            token: token.to_string(),
            expected: "resource location",
        });
    }
    let qualified =
        if token.contains(':') { token.to_string() } else { format!("minecraft:{token}") };
    Ok(ArgValue::ResourceLocation(qualified))
}

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0x00, 0x00, 0x00]),
    ("white", [0xff, 0xff, 0xff]),
    ("red", [0xff, 0x00, 0x00]),
    ("green", [0x00, 0xff, 0x00]),
    ("blue", [0x00, 0x00, 0xff]),
    ("yellow", [0xff, 0xff, 0x00]),
];

fn parse_color(def: &ArgumentDef, token: &str) -> Result<ArgValue, ParseFailure> {
    if let Some(hex) = token.strip_prefix('#') {
        if hex.len() == 6 {
            if let Ok(value) = u32::from_str_radix(hex, 16) {
                return Ok(ArgValue::Color([
                    ((value >> 16) & 0xff) as u8,
                    ((value >> 8) & 0xff) as u8,
                    (value & 0xff) as u8,
                ]));
            }
        }
    } else if let Some((_, rgb)) =
        NAMED_COLORS.iter().find(|(name, _)| name.eq_ignore_ascii_case(token))
    {
        return Ok(ArgValue::Color(*rgb));
    }
    Err(ParseFailure::BadValue {
        argument: def.name.clone(),
        token: token.to_string(),
        expected: "color",
    })
}

// Minestom-style durations: a bare number is ticks, `s` is seconds (20 ticks),
// `d` is in-game days (24000 ticks). Durations are non-negative and must fit
// an i64 tick count after scaling.
fn parse_time(def: &ArgumentDef, token: &str) -> Result<ArgValue, ParseFailure> {
    let bad = || ParseFailure::BadValue {
        argument: def.name.clone(),
        token: token.to_string(),
        expected: "duration",
    };
    let (digits, multiplier) = match token.chars().last() {
        Some('t') => (&token[..token.len() - 1], 1),
        Some('s') => (&token[..token.len() - 1], 20),
        Some('d') => (&token[..token.len() - 1], 24_000),
        Some(c) if c.is_ascii_digit() => (token, 1),
        _ => return Err(bad()),
    };
    let value: i64 = digits.parse().map_err(|_| bad())?;
    if value < 0 {
        return Err(bad());
    }
    let ticks = value.checked_mul(multiplier).ok_or_else(bad)?;
    Ok(ArgValue::Ticks(ticks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimHost;

    fn host() -> HostHandle {
        HostHandle::new(SimHost::new())
    }

    #[test]
    fn integer_range_is_enforced() {
        let def = {
            let mut d = ArgumentDef::new("level", ArgKind::Integer);
            d.min = Some(0.0);
            d.max = Some(100.0);
            d
        };
        let host = host();
        assert_eq!(
            parse_syntax(&[def.clone()], &["100"], &host).expect("100 is in range")[0].1,
            ArgValue::Int(100)
        );
        assert!(matches!(
            parse_syntax(&[def.clone()], &["150"], &host),
            Err(ParseFailure::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_syntax(&[def], &["-1"], &host),
            Err(ParseFailure::OutOfRange { .. })
        ));
    }

    #[test]
    fn greedy_string_consumes_the_rest() {
        let def = ArgumentDef::new("message", ArgKind::GreedyString);
        let parsed =
            parse_syntax(&[def], &["hello", "scripted", "world"], &host()).expect("greedy match");
        assert_eq!(parsed[0].1, ArgValue::Str("hello scripted world".to_string()));
    }

    #[test]
    fn full_match_rejects_leftover_tokens() {
        let def = ArgumentDef::new("word", ArgKind::Word);
        assert!(matches!(
            parse_syntax(&[def], &["one", "two"], &host()),
            Err(ParseFailure::TrailingTokens { count: 1 })
        ));
        assert!(matches!(
            parse_syntax(&[], &["one"], &host()),
            Err(ParseFailure::TrailingTokens { count: 1 })
        ));
        assert!(parse_syntax(&[], &[], &host()).expect("empty syntax matches empty input").is_empty());
    }

    #[test]
    fn enum_matching_is_case_insensitive() {
        let mut def = ArgumentDef::new("mode", ArgKind::Enum);
        def.enum_values = vec!["info".to_string(), "debug".to_string()];
        let parsed = parse_syntax(&[def.clone()], &["INFO"], &host()).expect("enum match");
        assert_eq!(parsed[0].1, ArgValue::Str("info".to_string()), "canonical casing is kept");
        assert!(matches!(
            parse_syntax(&[def], &["verbose"], &host()),
            Err(ParseFailure::UnknownEnumValue { .. })
        ));
    }

    #[test]
    fn player_arguments_resolve_against_the_live_registry() {
        let mut sim = SimHost::new();
        let alice = sim.spawn_player("Alice");
        let host = HostHandle::new(sim);
        let def = ArgumentDef::new("target", ArgKind::Player);
        let parsed = parse_syntax(&[def.clone()], &["Alice"], &host).expect("player resolves");
        assert_eq!(parsed[0].1, ArgValue::Player(alice));
        assert!(matches!(
            parse_syntax(&[def], &["Bob"], &host),
            Err(ParseFailure::PlayerNotFound { .. })
        ));
    }

    #[test]
    fn greedy_must_be_last_is_a_registration_error() {
        let defs = vec![
            ArgumentDef::new("message", ArgKind::GreedyString),
            ArgumentDef::new("level", ArgKind::Integer),
        ];
        assert!(matches!(
            validate_syntax("jscmd", &defs),
            Err(RegistrationError::GreedyNotLast { .. })
        ));
    }

    #[test]
    fn compound_and_suffixed_kinds_parse() {
        let host = host();
        let pos = ArgumentDef::new("at", ArgKind::BlockPosition);
        let parsed = parse_syntax(&[pos], &["1", "64", "-3"], &host).expect("block position");
        assert_eq!(parsed[0].1, ArgValue::BlockPos(BlockPos::new(1, 64, -3)));

        let time = ArgumentDef::new("delay", ArgKind::Time);
        let parsed = parse_syntax(&[time], &["5s"], &host).expect("duration");
        assert_eq!(parsed[0].1, ArgValue::Ticks(100));

        let color = ArgumentDef::new("tint", ArgKind::Color);
        let parsed = parse_syntax(&[color], &["#ff8000"], &host).expect("hex color");
        assert_eq!(parsed[0].1, ArgValue::Color([0xff, 0x80, 0x00]));

        let item = ArgumentDef::new("item", ArgKind::ItemStack);
        let parsed = parse_syntax(&[item], &["gold_block"], &host).expect("item id");
        assert_eq!(parsed[0].1, ArgValue::ResourceLocation("minecraft:gold_block".to_string()));

        let brew = ArgumentDef::new("brew", ArgKind::Potion);
        let parsed = parse_syntax(&[brew], &["strength"], &host).expect("potion id");
        assert_eq!(parsed[0].1, ArgValue::ResourceLocation("minecraft:strength".to_string()));
    }

    #[test]
    fn durations_reject_overflow_and_negatives() {
        let host = host();
        let time = ArgumentDef::new("delay", ArgKind::Time);
        assert!(matches!(
            parse_syntax(&[time.clone()], &["999999999999999999d"], &host),
            Err(ParseFailure::BadValue { .. })
        ), "a scaled duration wider than i64 is a parse failure, not a wrap");
        assert!(matches!(
            parse_syntax(&[time.clone()], &["-5s"], &host),
            Err(ParseFailure::BadValue { .. })
        ));
        let parsed = parse_syntax(&[time], &["2d"], &host).expect("in-range duration");
        assert_eq!(parsed[0].1, ArgValue::Ticks(48_000));
    }

    #[test]
    fn block_coordinates_must_fit_the_world() {
        let pos = ArgumentDef::new("at", ArgKind::BlockPosition);
        assert!(matches!(
            parse_syntax(&[pos], &["1", "9999999999", "0"], &host()),
            Err(ParseFailure::BadValue { .. })
        ));
    }

    #[test]
    fn declared_defaults_fill_missing_tokens() {
        let mut level = ArgumentDef::new("level", ArgKind::Integer);
        level.default_value = Some("10".to_string());
        let parsed = parse_syntax(&[level.clone()], &[], &host()).expect("default applies");
        assert_eq!(parsed[0].1, ArgValue::Int(10));
        let parsed = parse_syntax(&[level], &["42"], &host()).expect("token wins over default");
        assert_eq!(parsed[0].1, ArgValue::Int(42));

        let mut message = ArgumentDef::new("message", ArgKind::GreedyString);
        message.default_value = Some("nothing to say".to_string());
        let parsed = parse_syntax(&[message], &[], &host()).expect("greedy default");
        assert_eq!(parsed[0].1, ArgValue::Str("nothing to say".to_string()));
    }
}
