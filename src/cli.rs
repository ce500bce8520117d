use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "qcp", version)]
#[command(about = "Store text and image snippets, search them, copy them in one keystroke", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where the body of a snippet comes from. At most one may be given.
#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct BodySource {
    /// Text content
    #[arg(short, long)]
    pub content: Option<String>,

    /// Remote image URL
    #[arg(long)]
    pub image_url: Option<String>,

    /// Local image file, embedded as a data URL
    #[arg(long)]
    pub image_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a snippet
    Add {
        #[arg(short, long)]
        title: String,

        #[command(flatten)]
        body: BodySource,

        /// Use the current text selection as content
        #[arg(short, long, conflicts_with_all = ["content", "image_url", "image_file"])]
        selection: bool,
    },
    /// Change the title and/or body of a snippet
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[command(flatten)]
        body: BodySource,
    },
    /// List snippets, optionally filtered
    List {
        search: Option<String>,
    },
    /// Copy a snippet to the clipboard
    Copy {
        id: String,
    },
    /// Delete a snippet
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Run the message server
    Serve {
        /// Port to listen on (defaults to server_port from config.toml)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_text() {
        let cli = Cli::try_parse_from(["qcp", "add", "--title", "Note", "--content", "Hello"]).unwrap();
        match cli.command {
            Some(Commands::Add { title, body, selection }) => {
                assert_eq!(title, "Note");
                assert_eq!(body.content.as_deref(), Some("Hello"));
                assert!(!selection);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_add_rejects_two_bodies() {
        let result = Cli::try_parse_from([
            "qcp", "add", "--title", "X", "--content", "a", "--image-url", "https://x/y.png",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_selection_conflicts_with_content() {
        let result = Cli::try_parse_from(["qcp", "add", "-t", "X", "--selection", "--content", "a"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_command_launches_tui() {
        let cli = Cli::try_parse_from(["qcp"]).unwrap();
        assert!(cli.command.is_none());
    }
}
