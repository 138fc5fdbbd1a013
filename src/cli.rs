//! Command-line interface.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::{DotenvFile, EnvSource, LayeredSource, ProcessEnv};

#[derive(Debug, Parser)]
#[command(name = "app-bootstrap", version)]
#[command(about = "Load configuration, open the database, serve health checks", long_about = None)]
pub struct Cli {
    /// Dotenv file holding the configuration
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Read only the process environment, ignoring the file
    #[arg(long, conflicts_with = "env_overrides")]
    pub process_env: bool,

    /// Read the file, then let process variables override it
    #[arg(long)]
    pub env_overrides: bool,

    /// Expose Prometheus metrics on this address
    #[arg(long, env = "METRICS_ADDRESS")]
    pub metrics_address: Option<SocketAddr>,
}

impl Cli {
    /// The environment source selected by the flags.
    pub fn env_source(&self) -> Box<dyn EnvSource> {
        if self.process_env {
            Box::new(ProcessEnv)
        } else if self.env_overrides {
            Box::new(
                LayeredSource::new()
                    .layer(DotenvFile::new(&self.env_file))
                    .layer(ProcessEnv),
            )
        } else {
            Box::new(DotenvFile::new(&self.env_file))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_dotenv_in_working_directory() {
        let cli = Cli::try_parse_from(["app-bootstrap"]).unwrap();
        assert_eq!(cli.env_file, PathBuf::from(".env"));
        assert_eq!(cli.env_source().describe(), ".env");
    }

    #[test]
    fn test_process_env_flag() {
        let cli = Cli::try_parse_from(["app-bootstrap", "--process-env"]).unwrap();
        assert_eq!(cli.env_source().describe(), "process environment");
    }

    #[test]
    fn test_env_overrides_layers_process_over_file() {
        let cli = Cli::try_parse_from([
            "app-bootstrap",
            "--env-file",
            "/etc/app/prod.env",
            "--env-overrides",
        ])
        .unwrap();
        assert_eq!(
            cli.env_source().describe(),
            "/etc/app/prod.env + process environment"
        );
    }

    #[test]
    fn test_source_flags_conflict() {
        let result = Cli::try_parse_from(["app-bootstrap", "--process-env", "--env-overrides"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_metrics_address_parses() {
        let cli =
            Cli::try_parse_from(["app-bootstrap", "--metrics-address", "127.0.0.1:9100"]).unwrap();
        assert_eq!(cli.metrics_address, Some("127.0.0.1:9100".parse().unwrap()));
    }
}
