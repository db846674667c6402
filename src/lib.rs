pub mod analyzers;
pub mod config;
pub mod dataset;
pub mod error;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod stats;
