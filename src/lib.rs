//! Queue ETA engine
//!
//! Estimates customer wait times from smoothed per-queue service rates and
//! runs the countdown that notifies customers and retires finished tickets.
//!
//! [`engine::Engine`] wires everything together. The bundled binary runs the
//! countdown scheduler; a host process reaches the same engine through
//! `Engine::service` to answer ETA lookups and report throughput.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod store;
