//! Command-line surface.
//!
//! Flags override values from the optional TOML file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{AdhocQuery, RunConfig};

#[derive(Debug, Parser)]
#[command(name = "dash-plot")]
#[command(about = "Render every query of a set of monitoring dashboards to PNG", long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Prometheus address, e.g. http://127.0.0.1:9090.
    #[arg(short, long)]
    pub address: Option<String>,

    /// Window start ("YYYY-MM-DD HH:MM:SS" local time, RFC 3339 or unix seconds).
    #[arg(long)]
    pub start: Option<String>,

    /// Window end. Defaults to now.
    #[arg(long)]
    pub end: Option<String>,

    /// Render this single query instead of reading dashboards.
    #[arg(short, long, requires = "name")]
    pub query: Option<String>,

    /// Output name for the ad-hoc query.
    #[arg(short, long, requires = "query")]
    pub name: Option<String>,

    /// Step in seconds for the ad-hoc query.
    #[arg(long, requires = "query")]
    pub step: Option<u64>,

    /// Dashboard file or URL. Repeat for several.
    #[arg(short, long = "source")]
    pub sources: Vec<String>,

    /// Directory for the images.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of concurrent workers.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Log level for this crate when RUST_LOG is unset.
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Merge the flags over `config`.
    pub fn apply(self, mut config: RunConfig) -> RunConfig {
        if let Some(address) = self.address {
            config.backend.address = address;
        }
        if let Some(start) = self.start {
            config.window.start = Some(start);
        }
        if let Some(end) = self.end {
            config.window.end = Some(end);
        }
        if !self.sources.is_empty() {
            config.sources.paths = self.sources;
        }
        if let Some(output) = self.output {
            config.output.directory = Some(output);
        }
        if let Some(workers) = self.workers {
            config.pipeline.workers = workers;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let (Some(query), Some(name)) = (self.query, self.name) {
            let step_secs = self
                .step
                .or(config.adhoc.as_ref().map(|a| a.step_secs))
                .unwrap_or(config.pipeline.default_step_secs);
            config.adhoc = Some(AdhocQuery {
                query,
                name,
                step_secs,
            });
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dash-plot").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_override_file_values() {
        let mut file = RunConfig::default();
        file.backend.address = "http://file:9090".into();
        file.pipeline.workers = 8;

        let config = parse(&[
            "--address",
            "http://cli:9090",
            "--source",
            "a.json",
            "--source",
            "https://example.com/b.json",
            "--start",
            "2024-01-01 00:00:00",
        ])
        .apply(file);

        assert_eq!(config.backend.address, "http://cli:9090");
        assert_eq!(config.pipeline.workers, 8);
        assert_eq!(config.sources.paths, vec!["a.json", "https://example.com/b.json"]);
        assert_eq!(config.window.start.as_deref(), Some("2024-01-01 00:00:00"));
        assert!(config.adhoc.is_none());
    }

    #[test]
    fn test_adhoc_query() {
        let config = parse(&["-q", "rate(x[1m])", "-n", "x_rate"]).apply(RunConfig::default());
        let adhoc = config.adhoc.unwrap();
        assert_eq!(adhoc.query, "rate(x[1m])");
        assert_eq!(adhoc.name, "x_rate");
        assert_eq!(adhoc.step_secs, 15);

        let config = parse(&["-q", "up", "-n", "up", "--step", "60"]).apply(RunConfig::default());
        assert_eq!(config.adhoc.unwrap().step_secs, 60);
    }

    #[test]
    fn test_query_requires_name() {
        let result = Cli::try_parse_from(["dash-plot", "--query", "up"]);
        assert!(result.is_err());
    }
}
