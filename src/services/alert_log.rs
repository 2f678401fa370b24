//! 提示记录服务 - 业务能力层
//!
//! 只负责"把提示写入 alerts.txt"，不关心流程

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

use super::notifier::NoticeLevel;

/// 提示记录服务
pub struct AlertLog {
    file_path: String,
}

impl AlertLog {
    /// 使用默认文件 alerts.txt
    pub fn new() -> Self {
        Self {
            file_path: "alerts.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.file_path
    }

    /// 追加一条提示
    pub fn append(&self, level: NoticeLevel, message: &str) -> Result<()> {
        debug!("写入提示: [{}] 长度 {}", level.label(), message.len());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        let line = format!(
            "{} [{}] {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            level.label(),
            message.replace('\n', " | ")
        );

        file.write_all(line.as_bytes())?;

        Ok(())
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_writes_single_line() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("alerts.txt");
        let log = AlertLog::with_path(path.to_string_lossy());
        log.append(NoticeLevel::Error, "Error al rotar\nla imagen").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let last = content.lines().last().unwrap();
        assert!(last.contains("[ERROR] Error al rotar | la imagen"));
    }
}
