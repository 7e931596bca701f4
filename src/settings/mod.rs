//! Layered settings: a TOML file overlaid with `REDCLASS__SECTION__KEY`
//! environment variables.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
