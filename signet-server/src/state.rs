//! Shared application state.

use std::fmt;
use std::sync::Arc;

use signet_core::{Health, UserDirectory, UsersRepository};

use crate::config::Config;

/// State handed to every handler. Cheap to clone; everything inside is a
/// handle.
#[derive(Clone)]
pub struct AppState {
    directory: Arc<UserDirectory<dyn UsersRepository>>,
    health: Health,
    config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("health", &self.health)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        directory: UserDirectory<dyn UsersRepository>,
        health: Health,
        config: Arc<Config>,
    ) -> Self {
        Self {
            directory: Arc::new(directory),
            health,
            config,
        }
    }

    pub fn directory(&self) -> &UserDirectory<dyn UsersRepository> {
        &self.directory
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
