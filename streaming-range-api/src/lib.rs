//! Streaming Range API - audio serving and startup orchestration for the golf directory.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
