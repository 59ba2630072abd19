//! Core domain types and logic.

pub mod bar;
pub mod indicator;
pub mod ledger;
pub mod signal;
pub mod tracker;
pub mod strategy;
pub mod detector;
pub mod cycles;
pub mod sweep;
pub mod verify;
pub mod config_validation;
pub mod error;
