#[macro_use]
pub mod error;
pub mod truth;
pub mod ast;
pub mod symbol;
pub mod prover;
pub mod config;
pub mod client;

#[macro_use] extern crate log;

pub use config::Config;
pub use prover::{verify, verify_with, Failure, ProofError, VerifyError};
