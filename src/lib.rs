//! cella-stats: daily warehouse Cella statistics loader
//!
//! Reads the partial and full fulfilment reports and the hourly forecast
//! export, merges them into one record per Cella and writes the batch to a
//! database table.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod utils;
