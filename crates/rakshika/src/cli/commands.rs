//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::sos::FallbackAction;

/// SOS command arguments.
#[derive(Debug, Args)]
pub struct SosCommand {
    /// Run this backup action if the first contact falls back to the clipboard
    #[arg(short, long, value_enum)]
    pub fallback: Option<FallbackArg>,

    /// Output the dispatch report as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Contact management commands.
#[derive(Debug, Subcommand)]
pub enum ContactsCommand {
    /// List trusted contacts
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add a trusted contact
    Add {
        /// Contact name
        name: String,

        /// Phone number (at least 10 digits)
        phone: String,

        /// Dialling code without `+` (defaults to the configured one)
        #[arg(long)]
        country_code: Option<String>,
    },

    /// Remove a trusted contact
    Delete {
        /// Contact id, as shown by `contacts list`
        id: String,
    },
}

/// Live location sharing arguments.
#[derive(Debug, Args)]
pub struct ShareCommand {
    /// Comma-separated emails or phone numbers of the people to share with
    pub recipients: String,

    /// Session length in minutes (defaults to the configured one)
    #[arg(short, long)]
    pub minutes: Option<u32>,

    /// Share the map link once the first fix arrives
    #[arg(short, long)]
    pub link: bool,
}

/// Helpline arguments.
#[derive(Debug, Args)]
pub struct HelplinesCommand {
    /// Open the dialler for a helpline, by number or name
    #[arg(long, value_name = "HELPLINE")]
    pub call: Option<String>,
}

/// Community support arguments.
#[derive(Debug, Args)]
pub struct SupportCommand {
    /// Request a support service by title
    #[arg(long, value_name = "TITLE")]
    pub request: Option<String>,
}

/// Dashboard arguments.
#[derive(Debug, Args)]
pub struct DashboardCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Backup action argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FallbackArg {
    /// Copy the message again
    Copy,
    /// Open the SMS composer (mobile only)
    Sms,
    /// Open the email composer
    Email,
    /// Try the chat deep links again
    Retry,
}

impl From<FallbackArg> for FallbackAction {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::Copy => Self::CopyMessage,
            FallbackArg::Sms => Self::SendSms,
            FallbackArg::Email => Self::SendEmail,
            FallbackArg::Retry => Self::RetryDeepLink,
        }
    }
}
