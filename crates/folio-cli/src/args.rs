//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "folio", version, about = "Command-line client for the folio portfolio API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Project fields given on the command line. Unset fields keep their
/// current value on update.
#[derive(Args, Debug, Default, PartialEq, Eq)]
pub struct ProjectFields {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub url: Option<String>,

    /// Technology tag (repeatable). Replaces the existing tags on update.
    #[arg(long = "tech", value_name = "NAME")]
    pub technologies: Vec<String>,

    /// Image file to upload
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,

    /// Remove the current image (update only)
    #[arg(long, conflicts_with = "image")]
    pub remove_image: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Log in (prompts for the password)
    Login { email: Option<String> },
    /// Log out and forget the stored credential
    Logout,
    /// Show the logged-in user
    #[command(name = "whoami")]
    WhoAmI,
    /// Create an account
    Register,
    /// List projects, optionally filtered by technology
    List { filter: Option<String> },
    /// Show one project
    Show { id: String },
    /// Create a project
    Create(ProjectFields),
    /// Update a project
    Update {
        id: String,
        #[command(flatten)]
        fields: ProjectFields,
    },
    /// Delete a project
    Delete { id: String },
}
