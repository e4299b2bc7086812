mod term;

pub mod bytecode;
pub mod config;
pub mod ethereum;
pub mod params;
pub mod testing;
pub mod wallets;

pub use term::{error, logger};
