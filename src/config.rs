use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{AppResult, ConfigError};
use crate::ordering::ChangeDetection;
use crate::workflow::ViewMode;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "scan_client.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 扫描服务器地址
    pub server_base_url: String,
    /// 轮询间隔（秒）
    pub poll_interval_secs: u64,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 本地顺序存储文件
    pub order_store_path: String,
    /// 提示信息记录文件
    pub alert_log_file: String,
    /// 变更检测策略
    pub change_detection: ChangeDetection,
    /// 启动时的视图模式
    pub view_mode: ViewMode,
    /// 本地移动后是否同步到服务器
    pub sync_moves_to_server: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_base_url: "http://localhost:5000".to_string(),
            poll_interval_secs: 3,
            request_timeout_secs: 30,
            order_store_path: ".scan_client_state.json".to_string(),
            alert_log_file: "alerts.txt".to_string(),
            change_detection: ChangeDetection::Count,
            view_mode: ViewMode::Digitalization,
            sync_moves_to_server: false,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：TOML 文件（可选）→ 环境变量覆盖
    pub fn load() -> AppResult<Self> {
        let path = std::env::var("SCAN_CLIENT_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(&path)?
        } else {
            debug!("未找到配置文件 {}，使用默认配置", path);
            Self::default()
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件读取，缺失字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    pub fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        let config = toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: origin.to_string(),
            source,
        })?;
        Ok(config)
    }

    /// 仅使用默认值和环境变量
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 用环境变量覆盖，无法解析的值保持原样
    pub fn with_env_overrides(self) -> Self {
        Self {
            server_base_url: std::env::var("SCAN_SERVER_URL").unwrap_or(self.server_base_url),
            poll_interval_secs: std::env::var("POLL_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.poll_interval_secs),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
            order_store_path: std::env::var("ORDER_STORE_PATH").unwrap_or(self.order_store_path),
            alert_log_file: std::env::var("ALERT_LOG_FILE").unwrap_or(self.alert_log_file),
            change_detection: std::env::var("CHANGE_DETECTION").ok().and_then(|v| ChangeDetection::parse(&v)).unwrap_or(self.change_detection),
            view_mode: std::env::var("VIEW_MODE").ok().and_then(|v| ViewMode::parse(&v)).unwrap_or(self.view_mode),
            sync_moves_to_server: std::env::var("SYNC_MOVES_TO_SERVER").ok().and_then(|v| v.parse().ok()).unwrap_or(self.sync_moves_to_server),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
        }
    }

    /// 轮询间隔，至少 1 秒
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs.max(1))
    }
}
