use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "relaygate",
    about = "relaygate - protocol-translating gateway over a pool of OAuth credentials",
    version = env!("GIT_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, global = true, env = "RELAYGATE_CONFIG", help = "Path to config.json")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, env = "RELAYGATE_PORT", help = "Override server.port")]
    pub port: Option<u16>,

    #[arg(long, global = true, env = "RELAYGATE_HOST", help = "Override server.host")]
    pub host: Option<String>,

    #[arg(short, long, global = true, env = "RELAYGATE_LOG_LEVEL", help = "Override logging.level")]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Start the gateway (default if no command specified)")]
    Serve,

    #[command(about = "Load and validate the configuration, then print it")]
    CheckConfig {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "List pooled credentials with their scheduling state")]
    ListCredentials {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["relaygate"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.port.is_none());
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "relaygate",
            "list-credentials",
            "--json",
            "--port",
            "9000",
            "--config",
            "/tmp/relaygate.json",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Commands::ListCredentials { json: true }));
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/relaygate.json")));
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["relaygate", "--port", "http"]).is_err());
    }
}
