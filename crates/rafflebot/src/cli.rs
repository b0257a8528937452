use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rafflebot")]
#[command(author, version, about = "Telegram giveaway bot for channel subscribers", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Serve the webhook endpoint (default)
    Run,

    /// Register the webhook URL with Telegram and publish the command list
    SetWebhook {
        /// Public base URL (defaults to WEBHOOK_URL); the webhook path is appended
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Remove the webhook registration
    DeleteWebhook,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["rafflebot"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_set_webhook_with_url() {
        let cli = Cli::try_parse_from(["rafflebot", "set-webhook", "--url", "https://example.com"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::SetWebhook {
                url: Some("https://example.com".to_string())
            })
        );
    }

    #[test]
    fn test_delete_webhook() {
        let cli = Cli::try_parse_from(["rafflebot", "delete-webhook"]).unwrap();
        assert_eq!(cli.command, Some(Commands::DeleteWebhook));
    }
}
