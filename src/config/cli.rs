use crate::adapters::executor::ExecutorMode;
use crate::config::toml_config::AppConfig;
use crate::utils::error::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "triad-mvp")]
#[command(about = "Triad rebalancer and XML-RPC send panel in a console shell")]
pub struct CliConfig {
    #[arg(long, short, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "XML-RPC endpoint (\"/RPC2\" is appended when missing)")]
    pub endpoint: Option<String>,

    #[arg(long, value_enum, help = "Where the remote call runs")]
    pub executor: Option<ExecutorMode>,

    #[arg(long, help = "Initial total of the triad")]
    pub total: Option<u32>,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// 讀取設定檔 (若有)，再以命令列參數覆寫
    pub fn resolve(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(endpoint) = &self.endpoint {
            config.rpc.endpoint = endpoint.clone();
        }
        if let Some(mode) = self.executor {
            config.executor.mode = mode;
        }
        if let Some(total) = self.total {
            // 只改 total 時重新分配初始值，維持總和
            if total != config.triad.total {
                config.triad.total = total;
                config.triad.initial = split_evenly(total);
            }
        }
        config.logging.verbose |= self.verbose;
        config.logging.json |= self.log_json;

        Ok(config)
    }
}

/// Splits `total` into three parts, the remainder going to the first ones.
fn split_evenly(total: u32) -> [u32; 3] {
    let base = total / 3;
    let rest = total % 3;
    [
        base + u32::from(rest > 0),
        base + u32::from(rest > 1),
        base,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::Validate;

    #[test]
    fn test_split_evenly() {
        assert_eq!(split_evenly(100), [34, 33, 33]);
        assert_eq!(split_evenly(101), [34, 34, 33]);
        assert_eq!(split_evenly(0), [0, 0, 0]);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = CliConfig::parse_from([
            "triad-mvp",
            "--endpoint",
            "http://localhost:9000",
            "--executor",
            "tokio",
            "--total",
            "10",
            "-v",
        ]);
        let config = cli.resolve().unwrap();

        assert_eq!(config.rpc.endpoint, "http://localhost:9000");
        assert_eq!(config.executor.mode, ExecutorMode::Tokio);
        assert_eq!(config.triad.total, 10);
        assert_eq!(config.triad.initial, [4, 3, 3]);
        assert!(config.logging.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = CliConfig::parse_from(["triad-mvp", "--config", "/nonexistent/triad.toml"]);
        assert!(cli.resolve().is_err());
    }
}
