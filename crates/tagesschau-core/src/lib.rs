pub mod aggregate;
pub mod classification;
pub mod classifier;
pub mod config;
pub mod dedup;
pub mod error;
pub mod outputs;
pub mod pipeline;
pub mod quarantine;
pub mod schema;
pub mod summary;
pub mod temporal;
pub mod unstack;
pub mod validation;
