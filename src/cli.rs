//! # Command Line Interface

use std::path::PathBuf;

use clap::Parser;

use crate::errors::{Error, Result};

#[derive(Parser, Debug)]
#[command(name = "openvpn-authd")]
#[command(about = "Issues short-lived OpenVPN client profiles from Vault PKI")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Validate the configuration, print it with secrets redacted and exit
    #[arg(long)]
    pub check_config: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Seed the process environment from a dotenv file.
    ///
    /// An explicit `--env-file` must exist; the implicit `./.env` is optional.
    pub fn load_env_file(&self) -> Result<()> {
        match &self.env_file {
            Some(path) => dotenvy::from_path(path).map_err(|e| {
                Error::config(format!("Failed to load env file {}: {}", path.display(), e))
            }),
            None => match dotenvy::dotenv() {
                Ok(_) => Ok(()),
                Err(e) if e.not_found() => Ok(()),
                Err(e) => Err(Error::config(format!("Failed to load .env file: {}", e))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from(["openvpn-authd", "--env-file", "/etc/authd.env", "--check-config", "-v"]);
        assert_eq!(cli.env_file, Some(PathBuf::from("/etc/authd.env")));
        assert!(cli.check_config);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["openvpn-authd"]);
        assert!(cli.env_file.is_none());
        assert!(!cli.check_config);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_missing_explicit_env_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([
            "openvpn-authd".to_string(),
            "--env-file".to_string(),
            dir.path().join("missing.env").display().to_string(),
        ]);
        assert!(matches!(cli.load_env_file(), Err(Error::Config(_))));
    }
}
