//! Common test utilities and helpers
//!
//! This module provides shared functionality for all tests.

#![allow(dead_code)]

pub mod db;

pub use db::TestDb;
pub use fixtures::{
    lifecycle, t0, ticket, BlockingTicketStore, FailingStatsStore, RecordingNotifier,
    TestTicketStore,
};
