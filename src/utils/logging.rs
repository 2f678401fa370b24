/// 日志工具模块
///
/// 提供日志初始化和输出格式化的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::PageRef;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则根据 `verbose` 选择 debug 或 info。重复调用无副作用
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 扫描客户端启动 - {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("🌐 服务器: {}", config.server_base_url);
    info!("📂 视图模式: {:?}", config.view_mode);
    info!("⏱️ 轮询间隔: {} 秒", config.poll_interval().as_secs());
    info!("{}", "=".repeat(60));
}

/// 输出当前页面列表
///
/// # 参数
/// - `pages`: 按显示顺序排列的页面
/// - `selected`: OCR 选中的文件名
pub fn log_page_listing(pages: &[PageRef], selected: &[String]) {
    info!("\n{}", "─".repeat(60));
    if pages.is_empty() {
        info!("📭 没有可用的图片");
    }
    for (index, page) in pages.iter().enumerate() {
        let marker = if selected.iter().any(|s| s == &page.name) { "[x]" } else { "[ ]" };
        let status = match (&page.data, &page.error, page.is_placeholder()) {
            (_, _, true) => "占位".to_string(),
            (Some(_), _, _) => "✓".to_string(),
            (None, Some(err), _) => format!("❌ {}", truncate_text(err, 40)),
            (None, None, _) => "❌ 无缩略图".to_string(),
        };
        info!(
            "{} {:>2}. {} | 修改: {} | {}",
            marker,
            index + 1,
            page.name,
            page.modified,
            status
        );
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Carpeta vacía", 20), "Carpeta vacía");
        assert_eq!(truncate_text("Carpeta vacía", 7), "Carpeta...");
    }
}
