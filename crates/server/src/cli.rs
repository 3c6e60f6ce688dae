//! Command line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Foodgram recipe server.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file; defaults to `config/` layering and `FOODGRAM__*` variables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Server subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Load ingredients from a JSON array of `{"name", "measurement_unit"}` objects
    ImportIngredients {
        /// Path to the JSON file
        path: PathBuf,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["foodgram"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_import_ingredients_takes_path() {
        let cli =
            Cli::try_parse_from(["foodgram", "import-ingredients", "data/ingredients.json"])
                .unwrap();
        match cli.command {
            Some(Command::ImportIngredients { path }) => {
                assert_eq!(path, PathBuf::from("data/ingredients.json"));
            }
            _ => panic!("expected import-ingredients"),
        }
    }
}
