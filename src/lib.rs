pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod gate;
pub mod logging;
pub mod policy;
pub mod report;
pub mod shell;
