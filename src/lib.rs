//! kalshi-vigil: Automated trading bot for Kalshi crypto event contracts
//!
//! This library provides the core components for:
//! - RSA request signing and a typed Kalshi REST client
//! - Multi-source spot, RSI, and trend feeds
//! - Strike extraction and momentum-guarded signal generation
//! - Fractional Kelly position sizing
//! - A cycle engine that scans, scores, and executes under hard caps
//! - Trade journaling to an external HTTP sink
//! - Structured logging

pub mod cli;
pub mod config;
pub mod engine;
pub mod exchange;
pub mod feed;
pub mod journal;
pub mod risk;
pub mod signal;
pub mod telemetry;
