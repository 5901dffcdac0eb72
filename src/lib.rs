//! Campus Market Backend Library
//!
//! Accounts, token authentication, and the listing, offer, question,
//! message and flag APIs of a campus peer-to-peer marketplace.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
