//! Library crate for trivia-rush-back, exposing modules for binaries and integration tests.

pub mod config;
pub mod dto;
mod error;
pub mod provider;
pub mod routes;
pub mod services;
pub mod state;
