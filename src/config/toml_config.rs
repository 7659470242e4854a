use crate::adapters::executor::ExecutorMode;
use crate::adapters::xmlrpc::{XmlRpcOptions, DEFAULT_ENDPOINT, DEFAULT_METHOD, DEFAULT_TIMEOUT_MS};
use crate::domain::model::Triple;
use crate::utils::error::{Result, TriadError};
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const MAX_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rpc: RpcConfig,
    pub triad: TriadConfig,
    pub executor: ExecutorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub endpoint: String,
    pub method: String,
    pub connect_timeout_ms: u64,
    pub reply_timeout_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            method: DEFAULT_METHOD.to_string(),
            connect_timeout_ms: DEFAULT_TIMEOUT_MS,
            reply_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriadConfig {
    pub total: u32,
    pub initial: [u32; 3],
}

impl Default for TriadConfig {
    fn default() -> Self {
        Self {
            total: 100,
            initial: [34, 33, 33],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub mode: ExecutorMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub json: bool,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TriadError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${RPC_ENDPOINT})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn initial_values(&self) -> Triple {
        Triple::from(self.triad.initial)
    }

    pub fn xmlrpc_options(&self) -> XmlRpcOptions {
        XmlRpcOptions {
            endpoint: self.rpc.endpoint.clone(),
            method: self.rpc.method.clone(),
            connect_timeout: Duration::from_millis(self.rpc.connect_timeout_ms),
            reply_timeout: Duration::from_millis(self.rpc.reply_timeout_ms),
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_url("rpc.endpoint", &self.rpc.endpoint)?;
        validate_non_empty_string("rpc.method", &self.rpc.method)?;
        validate_range("rpc.connect_timeout_ms", self.rpc.connect_timeout_ms, 1, MAX_TIMEOUT_MS)?;
        validate_range("rpc.reply_timeout_ms", self.rpc.reply_timeout_ms, 1, MAX_TIMEOUT_MS)?;

        let initial = self.initial_values();
        if initial.sum() != u64::from(self.triad.total) {
            return Err(TriadError::InvalidConfigValueError {
                field: "triad.initial".to_string(),
                value: initial.to_string(),
                reason: format!("Values must sum to triad.total ({})", self.triad.total),
            });
        }

        Ok(())
    }
}
