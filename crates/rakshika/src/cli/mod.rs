//! Command-line interface for rakshika.
//!
//! This module provides the CLI structure for the `rakshika` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, ContactsCommand, DashboardCommand, FallbackArg, HelplinesCommand,
    ShareCommand, SosCommand, SupportCommand,
};

/// rakshika - Personal safety toolkit
///
/// Sends an SOS with your location to trusted contacts, shares your live
/// location for a bounded time, and keeps safety tips and helplines at hand.
#[derive(Debug, Parser)]
#[command(name = "rakshika")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Alert every trusted contact
    Sos(SosCommand),

    /// Manage trusted contacts
    #[command(subcommand)]
    Contacts(ContactsCommand),

    /// Share live location for a bounded time
    Share(ShareCommand),

    /// Check that location access works
    Locate,

    /// Show daily safety tips
    Tips,

    /// Show emergency helplines
    Helplines(HelplinesCommand),

    /// Show community support options
    Support(SupportCommand),

    /// Show the account dashboard
    Dashboard(DashboardCommand),

    /// Show what platform the host is detected as
    Platform,

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli_with(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Tips,
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "rakshika");
    }

    #[test]
    fn test_verbosity_levels() {
        use crate::logging::Verbosity;

        assert_eq!(cli_with(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli_with(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli_with(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sos() {
        let cli = Cli::try_parse_from(["rakshika", "sos", "--fallback", "email"]).unwrap();
        match cli.command {
            Command::Sos(cmd) => assert_eq!(cmd.fallback, Some(FallbackArg::Email)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_contacts_add() {
        let cli = Cli::try_parse_from([
            "rakshika",
            "contacts",
            "add",
            "Mom",
            "9876543210",
            "--country-code",
            "44",
        ])
        .unwrap();
        match cli.command {
            Command::Contacts(ContactsCommand::Add {
                name, country_code, ..
            }) => {
                assert_eq!(name, "Mom");
                assert_eq!(country_code.as_deref(), Some("44"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_share() {
        let cli = Cli::try_parse_from(["rakshika", "share", "mom,dad", "-m", "15", "--link"]).unwrap();
        match cli.command {
            Command::Share(cmd) => {
                assert_eq!(cmd.recipients, "mom,dad");
                assert_eq!(cmd.minutes, Some(15));
                assert!(cmd.link);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_with_config() {
        let cli = Cli::try_parse_from(["rakshika", "-c", "/custom/config.toml", "tips"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose_and_quiet() {
        let cli = Cli::try_parse_from(["rakshika", "-vv", "platform"]).unwrap();
        assert_eq!(cli.verbose, 2);
        let cli = Cli::try_parse_from(["rakshika", "-q", "locate"]).unwrap();
        assert!(cli.quiet);
    }
}
