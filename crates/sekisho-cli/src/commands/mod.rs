//! CLI command implementations

pub mod check;
pub mod explain;
pub mod exports;

pub use check::CheckArgs;
pub use explain::ExplainArgs;
pub use exports::ExportsArgs;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the imports and exports of JavaScript/TypeScript files
    Check(CheckArgs),

    /// Print the export map of one module
    Exports(ExportsArgs),

    /// Show detailed explanation for a specific rule
    Explain(ExplainArgs),
}
