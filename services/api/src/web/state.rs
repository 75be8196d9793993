//! services/api/src/web/state.rs
//!
//! Defines the application's shared state, created once at startup.

use crate::config::Config;
use letter_core::{
    KeyValueStore, LetterRepository, ReadingService, SummaryRepository, TokenRegistry,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub letters: LetterRepository,
    pub summaries: SummaryRepository,
    pub tokens: Arc<TokenRegistry>,
    pub reading: ReadingService,
}

impl AppState {
    /// Wires the repositories, the token registry and the reading service to one store.
    pub fn new(config: Arc<Config>, store: Arc<dyn KeyValueStore>) -> Self {
        let letters = LetterRepository::new(store.clone());
        let summaries = SummaryRepository::new(store.clone());
        let tokens = Arc::new(TokenRegistry::new(
            store,
            letters.clone(),
            config.token_lifetime,
        ));
        let reading = ReadingService::new(tokens.clone(), letters.clone(), summaries.clone());
        Self {
            config,
            letters,
            summaries,
            tokens,
            reading,
        }
    }
}
