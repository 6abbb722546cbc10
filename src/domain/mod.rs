//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod signal;
pub mod position;
pub mod trade;
pub mod execution;
pub mod backtest;
pub mod timeline;
pub mod portfolio;
pub mod metrics;
pub mod features;
pub mod predictor;
pub mod universe;
pub mod config;
pub mod engine;
pub mod error;
