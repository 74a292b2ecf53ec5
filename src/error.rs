use thiserror::Error;

/// Failures while loading or reloading a script context. The previous
/// context is torn down before a replacement load begins, so a failed load
/// leaves no scripts active.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("module '{module}' failed to parse: {message}")]
    Parse { module: String, message: String },
    #[error("module '{module}' failed to evaluate: {message}")]
    Eval { module: String, message: String },
    #[error("cyclic module dependency: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),
    #[error("module '{module}' imports unknown module '{import}'")]
    MissingImport { module: String, import: String },
    #[error("entry module '{0}' not found")]
    MissingEntry(String),
    #[error("failed to read module '{module}': {message}")]
    Io { module: String, message: String },
}

/// Rejected command definitions. Surfaced to the registering script at
/// registration time, never at dispatch time.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("command definition requires a non-empty 'name'")]
    MissingName,
    #[error("command or alias '{0}' is already registered")]
    DuplicateName(String),
    #[error("command '{command}' declares no syntaxes")]
    NoSyntaxes { command: String },
    #[error("command '{command}': syntax {index} has no handler")]
    MissingHandler { command: String, index: usize },
    #[error("command '{command}': greedy argument '{argument}' must be last in its syntax")]
    GreedyNotLast { command: String, argument: String },
    #[error("command '{command}': argument '{argument}' has unknown type '{kind}'")]
    UnknownArgumentType { command: String, argument: String, kind: String },
    #[error("command '{command}': enum argument '{argument}' declares no values")]
    EmptyEnum { command: String, argument: String },
    #[error("command '{command}': argument '{argument}' declares a range but is not numeric")]
    NonNumericRange { command: String, argument: String },
    #[error("invalid command definition: {0}")]
    InvalidDefinition(String),
}
