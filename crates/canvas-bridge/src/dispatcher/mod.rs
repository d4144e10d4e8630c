//! Command dispatch: a table from command name to handler.
//!
//! Handlers are plain functions over a [`CommandContext`], so each one can be
//! exercised without a connection. [`Dispatcher::dispatch`] is the failure
//! boundary: handler errors, undecodable parameters and panics all come back
//! as `{success: false, error}` results.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use canvas_core::{CoreError, GraphStore, TemplateCatalog};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

mod handlers;

/// Everything a handler may touch
pub struct CommandContext<'a> {
    /// The graph being edited
    pub store: &'a mut GraphStore,
    /// Templates available to `load_template`
    pub templates: &'a dyn TemplateCatalog,
}

/// A command handler
pub type Handler = fn(&mut CommandContext<'_>, Value) -> Result<Value, CoreError>;

#[derive(Clone, Copy)]
struct HandlerEntry {
    handler: Handler,
    mutating: bool,
}

/// Result of dispatching one command
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The `result` object for the response envelope
    pub result: Value,
    /// Whether the command may have changed the graph, so a state push is due
    pub mutating: bool,
}

/// Routes commands to handlers
pub struct Dispatcher {
    handlers: HashMap<&'static str, HandlerEntry>,
    templates: Arc<dyn TemplateCatalog>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("commands", &self.commands())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher with every built-in command registered
    pub fn new(templates: Arc<dyn TemplateCatalog>) -> Self {
        let mut dispatcher = Self {
            handlers: HashMap::new(),
            templates,
        };

        dispatcher.register("create_node", handlers::create_node, true);
        dispatcher.register("update_node", handlers::update_node, true);
        dispatcher.register("delete_node", handlers::delete_node, true);
        dispatcher.register("connect_nodes", handlers::connect_nodes, true);
        dispatcher.register("disconnect_nodes", handlers::disconnect_nodes, true);
        dispatcher.register("clear_canvas", handlers::clear_canvas, true);
        dispatcher.register("load_template", handlers::load_template, true);
        dispatcher.register("validate_agent", handlers::validate_agent, false);
        dispatcher.register("export_agent", handlers::export_agent, false);

        dispatcher
    }

    /// Register or replace a command handler
    pub fn register(&mut self, command: &'static str, handler: Handler, mutating: bool) {
        self.handlers.insert(command, HandlerEntry { handler, mutating });
    }

    /// Registered command names, sorted
    pub fn commands(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Whether `command` is registered as graph-mutating
    pub fn is_mutating(&self, command: &str) -> bool {
        self.handlers.get(command).is_some_and(|entry| entry.mutating)
    }

    /// Run one command against the store.
    ///
    /// Always produces a result; nothing a handler does escapes this call.
    pub fn dispatch(&self, store: &mut GraphStore, command: &str, params: Value) -> Outcome {
        let Some(entry) = self.handlers.get(command).copied() else {
            warn!("Unknown command: {}", command);
            return Outcome {
                result: failure(format!("Unknown command: {}", command)),
                mutating: false,
            };
        };

        let params = match params {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        let mut ctx = CommandContext {
            store,
            templates: self.templates.as_ref(),
        };

        let result = match panic::catch_unwind(AssertUnwindSafe(|| (entry.handler)(&mut ctx, params))) {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!("Command {} failed: {}", command, e);
                failure(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("Command {} panicked: {}", command, message);
                failure(message)
            }
        };

        debug!("Command {} handled", command);
        Outcome {
            result,
            mutating: entry.mutating,
        }
    }
}

fn failure(error: impl Into<String>) -> Value {
    json!({ "success": false, "error": error.into() })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "command handler panicked".to_string()
    }
}

/// Decode handler parameters into a typed struct
pub(crate) fn decode_params<T: DeserializeOwned>(params: Value) -> Result<T, CoreError> {
    serde_json::from_value(params).map_err(|e| CoreError::InvalidParams(e.to_string()))
}
