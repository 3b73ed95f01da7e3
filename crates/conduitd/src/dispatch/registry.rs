//! Name-to-handler table built before the server starts.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::command::CommandHandler;
use super::errors::RegistryError;
use super::router::{BATCH_COMMAND, DISPATCH_TARGET};

/// Command handlers keyed by exact command name.
///
/// The registry is populated during startup and moved into the server, which
/// only reads from it afterwards.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from `(name, handler)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for the first reserved or empty name.
    pub fn from_handlers<I, N>(handlers: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (N, Arc<dyn CommandHandler>)>,
        N: Into<String>,
    {
        let mut registry = Self::new();
        for (name, handler) in handlers {
            registry.register_shared(name, handler)?;
        }
        Ok(registry)
    }

    /// Registers `handler` under `name`.
    ///
    /// Registering a name twice replaces the earlier handler, which is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Reserved`] for `batch_execute` and
    /// [`RegistryError::EmptyName`] for an empty name.
    pub fn register<H>(
        &mut self,
        name: impl Into<String>,
        handler: H,
    ) -> Result<Option<Arc<dyn CommandHandler>>, RegistryError>
    where
        H: CommandHandler + 'static,
    {
        self.register_shared(name, Arc::new(handler))
    }

    /// Registers an already shared handler under `name`.
    ///
    /// # Errors
    ///
    /// See [`CommandRegistry::register`].
    pub fn register_shared(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<Option<Arc<dyn CommandHandler>>, RegistryError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if name == BATCH_COMMAND {
            return Err(RegistryError::Reserved { name });
        }

        let replaced = self.handlers.insert(name.clone(), handler);
        if replaced.is_some() {
            warn!(
                target: DISPATCH_TARGET,
                command = %name,
                "replacing previously registered command handler"
            );
        }
        Ok(replaced)
    }

    /// Finds the handler registered under exactly `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Whether a handler is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered command names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no commands are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}
