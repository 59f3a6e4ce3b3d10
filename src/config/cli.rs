//! Command-line argument parsing

use clap::{Parser, ValueEnum};

use super::discovery_config::DEFAULT_MAX_PAYLOAD_BYTES;
use crate::cluster::DEFAULT_POLL_INTERVAL;

/// Query an ElastiCache configuration endpoint for the current cluster nodes
#[derive(Parser, Debug, Clone)]
#[command(name = "elasticache-discovery")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    // ===== Connection Options =====
    /// Configuration endpoint (host:port)
    #[arg(short = 'e', long = "endpoint")]
    pub endpoint: String,

    /// Connection timeout in milliseconds
    #[arg(long = "connect-timeout", default_value_t = 100)]
    pub connect_timeout_ms: u64,

    /// Deadline in milliseconds for the whole exchange after connecting
    #[arg(long = "timeout", default_value_t = 100)]
    pub timeout_ms: u64,

    /// Largest config payload to accept, in bytes
    #[arg(long = "max-payload", default_value_t = DEFAULT_MAX_PAYLOAD_BYTES)]
    pub max_payload_bytes: usize,

    // ===== Watch Options =====
    /// Keep polling and print each new cluster version
    #[arg(short = 'w', long = "watch")]
    pub watch: bool,

    /// Poll interval in seconds (with --watch)
    #[arg(long = "interval", default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    pub interval_secs: u64,

    /// Stop after this many polls (with --watch)
    #[arg(long = "polls")]
    pub polls: Option<u64>,

    // ===== Output Options =====
    /// Output format
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format for results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.quiet && self.verbose {
            return Err("--quiet and --verbose are mutually exclusive".to_string());
        }

        if self.watch && self.interval_secs == 0 {
            return Err("--interval must be at least 1 second".to_string());
        }

        if self.polls.is_some() && !self.watch {
            return Err("--polls requires --watch".to_string());
        }

        if self.polls == Some(0) {
            return Err("--polls must be at least 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["test", "--endpoint", "cfg:11211"]);
        assert_eq!(args.endpoint, "cfg:11211");
        assert_eq!(args.connect_timeout_ms, 100);
        assert_eq!(args.timeout_ms, 100);
        assert_eq!(Duration::from_secs(args.interval_secs), DEFAULT_POLL_INTERVAL);
        assert_eq!(args.max_payload_bytes, DEFAULT_MAX_PAYLOAD_BYTES);
        assert_eq!(args.output_format, OutputFormat::Text);
        assert!(!args.watch);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_endpoint_required() {
        assert!(CliArgs::try_parse_from(["test"]).is_err());
    }

    #[test]
    fn test_watch_args() {
        let args = CliArgs::parse_from([
            "test",
            "-e",
            "cfg:11211",
            "--watch",
            "--interval",
            "5",
            "--polls",
            "3",
            "--output-format",
            "json",
        ]);
        assert!(args.watch);
        assert_eq!(args.interval_secs, 5);
        assert_eq!(args.polls, Some(3));
        assert_eq!(args.output_format, OutputFormat::Json);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_polls_without_watch() {
        let args = CliArgs::parse_from(["test", "-e", "cfg:11211", "--polls", "3"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_quiet_and_verbose() {
        let args = CliArgs::parse_from(["test", "-e", "cfg:11211", "-q", "-v"]);
        assert!(args.validate().is_err());
    }
}
