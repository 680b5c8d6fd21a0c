//! Configuration for spy.
//!
//! - [defaults]: the built-in configuration text, parsed first.
//! - [parser]: the `.spyrc` line language.
//! - [rules]: ignore and color rule sets.
//! - [load]: lookup of the user file and the assembled [Config].
//! - [env]: environment variables with their fallbacks.

pub mod defaults;
pub mod env;
pub mod load;
pub mod parser;
pub mod rules;

pub use env::Environment;
pub use load::Config;
pub use parser::{ConfigDiagnostic, ConfigWarning, Settings};
pub use rules::{ColorRules, IgnoreRules};
