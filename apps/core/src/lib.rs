pub mod action_executor;
pub mod candidate_store;
pub mod config;
pub mod discovery;
pub mod filter;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod terminal_bar;
