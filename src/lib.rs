pub mod cli;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod errors;
pub mod storage;
pub mod vault;
