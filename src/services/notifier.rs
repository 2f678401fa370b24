//! 用户提示能力
//!
//! 阻塞式提示（alert）用于失败和确认信息，短暂提示（toast）用于成功反馈

use std::sync::Mutex;

use tracing::{error, info, warn};

use super::alert_log::AlertLog;

/// 提示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn label(self) -> &'static str {
        match self {
            NoticeLevel::Success => "SUCCESS",
            NoticeLevel::Info => "INFO",
            NoticeLevel::Warning => "WARNING",
            NoticeLevel::Error => "ERROR",
        }
    }
}

/// 一条提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// true 为 alert，false 为 toast
    pub blocking: bool,
}

pub trait Notifier: Send + Sync {
    /// 需要用户注意的提示
    fn alert(&self, message: &str);
    /// 短暂提示
    fn toast(&self, message: &str, level: NoticeLevel);
}

/// 终端提示：写日志，alert 额外追加到提示文件
pub struct ConsoleNotifier {
    alert_log: Option<AlertLog>,
}

impl ConsoleNotifier {
    pub fn new(alert_log: Option<AlertLog>) -> Self {
        Self { alert_log }
    }
}

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        warn!("⚠️ {}", message);
        if let Some(log) = &self.alert_log {
            if let Err(e) = log.append(NoticeLevel::Warning, message) {
                error!("写入提示文件失败 ({}): {}", log.path(), e);
            }
        }
    }

    fn toast(&self, message: &str, level: NoticeLevel) {
        match level {
            NoticeLevel::Success => info!("✓ {}", message),
            NoticeLevel::Info => info!("{}", message),
            NoticeLevel::Warning => warn!("{}", message),
            NoticeLevel::Error => error!("❌ {}", message),
        }
    }
}

/// 记录所有提示，供嵌入方和测试读取
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// 所有 alert 的文本
    pub fn alerts(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.blocking)
            .map(|n| n.message)
            .collect()
    }

    fn push(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notice);
    }
}

impl Notifier for MemoryNotifier {
    fn alert(&self, message: &str) {
        self.push(Notice {
            level: NoticeLevel::Warning,
            message: message.to_string(),
            blocking: true,
        });
    }

    fn toast(&self, message: &str, level: NoticeLevel) {
        self.push(Notice {
            level,
            message: message.to_string(),
            blocking: false,
        });
    }
}
