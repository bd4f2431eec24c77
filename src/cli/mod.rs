//! Command line interface

pub mod serve;

use clap::{Parser, Subcommand};

/// User account service
#[derive(Parser)]
#[command(name = "user-accounts")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["user-accounts", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["user-accounts"]).is_err());
    }
}
