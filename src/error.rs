//! Error types for the awsnet shell.
//!
//! Three layers: `InventoryError` comes from the inventory provider, `StorageError`
//! from the persistent cache, and `ShellError` is what a command reports to the user.
//! Every `ShellError` carries the offending input so the session can print it without
//! guessing which token failed.

use thiserror::Error;

/// Failures reported by an inventory provider.
///
/// The provider decides whether a failure is worth retrying; the cache only honors it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("transient inventory failure: {0}")]
    Transient(String),

    #[error("inventory failure: {0}")]
    Permanent(String),
}

impl InventoryError {
    pub fn is_transient(&self) -> bool {
        matches!(self, InventoryError::Transient(_))
    }
}

/// Persistent cache errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cache database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Cache encoding error: {0}")]
    Encoding(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised while building a command graph.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("no command table declared for context '{0}'")]
    MissingContext(String),

    #[error("context '{child}' cannot be entered from '{parent}'")]
    IllegalEntry { parent: String, child: String },

    #[error("context cycle through '{0}'")]
    Cycle(String),

    #[error("duplicate command path: {0}")]
    DuplicatePath(String),
}

/// Errors reported by a shell command.
///
/// A command error never ends the session and never leaves the context stack
/// half-changed; it is printed and the prompt comes back.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShellError {
    #[error("not found: {message}")]
    NotFound { message: String, input: String },

    #[error("ambiguous selector '{input}': {message}")]
    AmbiguousSelector { message: String, input: String },

    #[error("ambiguous route: {message}")]
    AmbiguousRoute { message: String, input: String },

    #[error("not available here: {message}")]
    InvalidTransition { message: String, input: String },

    #[error("already at root; use `quit` to leave the shell")]
    CannotExitRoot,

    #[error("routing loop detected: {message}")]
    RoutingLoopDetected { message: String, input: String },

    #[error("unreachable: {message}")]
    Unreachable { message: String, input: String },

    #[error("inventory error: {message}")]
    Adapter {
        message: String,
        input: String,
        transient: bool,
    },

    #[error("invalid argument '{input}': {message}")]
    InvalidArgument { message: String, input: String },

    #[error("not implemented: {message}")]
    NotImplemented { message: String, input: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ShellError {
    pub fn not_found(message: impl Into<String>, input: impl Into<String>) -> Self {
        ShellError::NotFound {
            message: message.into(),
            input: input.into(),
        }
    }

    pub fn ambiguous_selector(message: impl Into<String>, input: impl Into<String>) -> Self {
        ShellError::AmbiguousSelector {
            message: message.into(),
            input: input.into(),
        }
    }

    pub fn ambiguous_route(message: impl Into<String>, input: impl Into<String>) -> Self {
        ShellError::AmbiguousRoute {
            message: message.into(),
            input: input.into(),
        }
    }

    pub fn invalid_transition(message: impl Into<String>, input: impl Into<String>) -> Self {
        ShellError::InvalidTransition {
            message: message.into(),
            input: input.into(),
        }
    }

    pub fn routing_loop(message: impl Into<String>, input: impl Into<String>) -> Self {
        ShellError::RoutingLoopDetected {
            message: message.into(),
            input: input.into(),
        }
    }

    pub fn unreachable(message: impl Into<String>, input: impl Into<String>) -> Self {
        ShellError::Unreachable {
            message: message.into(),
            input: input.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>, input: impl Into<String>) -> Self {
        ShellError::InvalidArgument {
            message: message.into(),
            input: input.into(),
        }
    }

    pub fn not_implemented(message: impl Into<String>, input: impl Into<String>) -> Self {
        ShellError::NotImplemented {
            message: message.into(),
            input: input.into(),
        }
    }

    /// Map a provider failure onto the user-facing taxonomy.
    ///
    /// `NotFound` stays a `NotFound` so "missing" is never confused with "empty".
    pub fn from_inventory(err: InventoryError, input: impl Into<String>) -> Self {
        let input = input.into();
        match err {
            InventoryError::NotFound { kind, id } => ShellError::NotFound {
                message: format!("{} {} does not exist", kind, id),
                input,
            },
            InventoryError::Transient(message) => ShellError::Adapter {
                message,
                input,
                transient: true,
            },
            InventoryError::Permanent(message) => ShellError::Adapter {
                message,
                input,
                transient: false,
            },
        }
    }

    /// Stable name of the error kind, used in logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            ShellError::NotFound { .. } => "NotFound",
            ShellError::AmbiguousSelector { .. } => "AmbiguousSelector",
            ShellError::AmbiguousRoute { .. } => "AmbiguousRoute",
            ShellError::InvalidTransition { .. } => "InvalidTransition",
            ShellError::CannotExitRoot => "CannotExitRoot",
            ShellError::RoutingLoopDetected { .. } => "RoutingLoopDetected",
            ShellError::Unreachable { .. } => "Unreachable",
            ShellError::Adapter { .. } => "AdapterError",
            ShellError::InvalidArgument { .. } => "InvalidArgument",
            ShellError::NotImplemented { .. } => "NotImplemented",
            ShellError::Storage(_) => "StorageError",
            ShellError::Config(_) => "ConfigError",
        }
    }

    /// The input that triggered the error, when there is one.
    pub fn input(&self) -> Option<&str> {
        match self {
            ShellError::NotFound { input, .. }
            | ShellError::AmbiguousSelector { input, .. }
            | ShellError::AmbiguousRoute { input, .. }
            | ShellError::InvalidTransition { input, .. }
            | ShellError::RoutingLoopDetected { input, .. }
            | ShellError::Unreachable { input, .. }
            | ShellError::Adapter { input, .. }
            | ShellError::InvalidArgument { input, .. }
            | ShellError::NotImplemented { input, .. } => Some(input.as_str()),
            ShellError::CannotExitRoot | ShellError::Storage(_) | ShellError::Config(_) => None,
        }
    }
}

impl From<StorageError> for ShellError {
    fn from(err: StorageError) -> Self {
        ShellError::Storage(err.to_string())
    }
}

impl From<GraphError> for ShellError {
    fn from(err: GraphError) -> Self {
        ShellError::Config(err.to_string())
    }
}

impl From<config::ConfigError> for ShellError {
    fn from(err: config::ConfigError) -> Self {
        ShellError::Config(err.to_string())
    }
}
