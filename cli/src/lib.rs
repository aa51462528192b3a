pub mod cli;
pub mod config;
pub mod logger;
pub mod runner;
pub mod supervisor;
pub mod watchdog;
