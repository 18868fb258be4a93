//! Core domain types and logic.

pub mod ohlcv;
pub mod error;
pub mod indicator;
pub mod indicator_helpers;
pub mod frame;
pub mod condition;
pub mod condition_parser;
pub mod scorer;
pub mod position;
pub mod simulator;
pub mod report;
pub mod pipeline;
pub mod strategy;
pub mod config_validation;
pub mod universe;
pub mod scanner;
