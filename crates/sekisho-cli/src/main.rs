//! Sekisho CLI - command-line interface for the Sekisho import/export analyzer
//!
//! Checks that what a JavaScript/TypeScript module imports is actually exported by
//! the module it comes from, following re-exports and `export *` chains.

mod commands;
mod output;

use clap::Parser;
use commands::Commands;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter, e.g. `sekisho_core=debug`.
const LOG_ENV: &str = "SEKISHO_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "sekisho",
    author,
    version,
    about = "Import/export checker for JavaScript and TypeScript",
    long_about = "Sekisho resolves every import of a JavaScript or TypeScript project to the\n\
                  module it names and checks the imported names against that module's\n\
                  exports, following re-exports and `export *` chains."
)]
pub struct Cli {
    /// Log engine activity (cache hits, resolutions) to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check(args) => args.run(),
        Commands::Exports(args) => args.run(),
        Commands::Explain(args) => args.run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_check_command() {
        let cli = Cli::try_parse_from(["sekisho", "check", "./src"]).unwrap();
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.path.to_str().unwrap(), "./src");
                assert_eq!(args.format, "pretty");
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn cli_parses_check_with_format() {
        let cli = Cli::try_parse_from(["sekisho", "check", "./src", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Check(args) => assert_eq!(args.format, "json"),
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn verbose_is_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from(["sekisho", "check", ".", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn cli_parses_exports_with_name() {
        let cli =
            Cli::try_parse_from(["sekisho", "exports", "src/index.js", "--name", "Button"]).unwrap();
        match cli.command {
            Commands::Exports(args) => {
                assert_eq!(args.file.to_str().unwrap(), "src/index.js");
                assert_eq!(args.name.as_deref(), Some("Button"));
            }
            _ => panic!("Expected Exports command"),
        }
    }

    #[test]
    fn cli_parses_explain_command() {
        let cli = Cli::try_parse_from(["sekisho", "explain", "no-cycle"]).unwrap();
        match cli.command {
            Commands::Explain(args) => assert_eq!(args.rule_id, "no-cycle"),
            _ => panic!("Expected Explain command"),
        }
    }

    #[test]
    fn check_requires_a_path() {
        assert!(Cli::try_parse_from(["sekisho", "check"]).is_err());
    }

    #[test]
    fn cli_help_contains_commands() {
        let mut cmd = Cli::command();
        let help = cmd.render_help().to_string();
        assert!(help.contains("check"));
        assert!(help.contains("exports"));
        assert!(help.contains("explain"));
    }

    #[test]
    fn check_help_shows_options() {
        let mut cmd = Cli::command();
        let check_cmd = cmd
            .get_subcommands_mut()
            .find(|c| c.get_name() == "check")
            .unwrap();
        let help = check_cmd.render_help().to_string();
        assert!(help.contains("PATH"));
        assert!(help.contains("--format"));
        assert!(help.contains("--fail-on-warnings"));
    }
}
