//! Core Connect auth library (client, token store, state, route guard, config).

pub mod auth;
pub mod config;
pub mod guard;
pub mod state;
pub mod token_store;
