pub mod config;
pub mod file;
pub mod ledger;
pub mod stdin;
