//! 应用入口 - 编排层
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志、创建客户端、打开本地存储、恢复视图模式和顺序
//! 2. **事件循环**：固定间隔轮询服务器变化，同时读取终端命令
//! 3. **单线程处理**：轮询和命令在同一个 select 循环里依次处理
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个操作的细节，全部委托给 ScanController
//! - **不会因失败退出**：每个命令的错误已由控制器提示，循环继续

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::clients::ScanClient;
use crate::config::Config;
use crate::infrastructure::JsonFileStore;
use crate::orchestrator::command::{Command, HELP_TEXT};
use crate::orchestrator::ScanController;
use crate::services::{AlertLog, ConsoleNotifier};
use crate::utils::logging::{log_page_listing, log_startup};
use crate::workflow::ViewMode;

/// 应用主结构
pub struct App {
    config: Config,
    controller: ScanController,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let client = ScanClient::new(&config)?;
        let store = Arc::new(JsonFileStore::new(&config.order_store_path));
        let notifier = Arc::new(ConsoleNotifier::new(Some(AlertLog::with_path(
            config.alert_log_file.clone(),
        ))));
        let controller = ScanController::new(client, &config, store, notifier);

        if let Some(mode) = controller.restore_mode().await {
            info!("✓ 已恢复视图模式: {:?}", mode);
        }
        let restored = controller.restore_order().await;
        if restored > 0 {
            info!("✓ 已恢复 {} 项图片顺序", restored);
        }

        Ok(Self { config, controller })
    }

    pub fn controller(&self) -> &ScanController {
        &self.controller
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        self.initial_load().await;
        info!("输入 help 查看命令");

        let mut ticker = interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Ok(true) = self.controller.poll_once().await {
                        self.show().await;
                    }
                }
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => break,
                        Err(e) => {
                            warn!("读取终端输入失败: {}", e);
                            break;
                        }
                    };
                    match Command::parse(&line) {
                        Ok(Some(Command::Quit)) => break,
                        Ok(Some(command)) => self.execute(command).await,
                        Ok(None) => {}
                        Err(message) => warn!("{}", message),
                    }
                }
            }
        }

        info!("👋 扫描客户端退出");
        Ok(())
    }

    async fn initial_load(&self) {
        let mode = self.controller.workflow().await.mode();
        let loaded = match mode {
            ViewMode::Digitalization => self.controller.refresh().await.map(|_| ()),
            ViewMode::Indexation => self.controller.load_folders(None).await.map(|_| ()),
        };
        if let Err(e) = loaded {
            warn!("初次加载失败: {}", e);
        }
        self.show().await;
    }

    /// 执行单条命令，错误已由控制器提示
    async fn execute(&self, command: Command) {
        match command {
            Command::Refresh => {
                if let Err(e) = self.controller.refresh().await {
                    warn!("刷新失败: {}", e);
                }
            }
            Command::List => {}
            Command::Page(action) => {
                let _ = self.controller.dispatch(action).await;
            }
            Command::Upload(paths) => {
                let _ = self.controller.upload(&paths).await;
            }
            Command::Select(name) => {
                let selected = self.controller.toggle_selection(&name).await;
                info!("{} {}", if selected { "已选中" } else { "已取消选中" }, name);
            }
            Command::Ocr => {
                if self.controller.run_ocr().await.is_ok() {
                    let workflow = self.controller.workflow().await;
                    info!("📝 表单: {:?}", workflow.form());
                }
            }
            Command::Set { field, value } => {
                if !self.controller.set_field(&field, &value).await {
                    warn!("无法设置字段 {} = {}", field, value);
                }
            }
            Command::Finalize => {
                let _ = self.controller.finalize().await;
            }
            Command::Folders(folder) => {
                if let Ok(listing) = self.controller.load_folders(folder.as_deref()).await {
                    info!(
                        "📁 文件夹: {:?} (当前: {:?})",
                        listing.folders, listing.current_folder
                    );
                }
            }
            Command::GenerateFolder => {
                let _ = self.controller.generate_folder().await;
            }
            Command::Mode(mode) => {
                let _ = self.controller.set_mode(mode).await;
            }
            Command::NewSession => {
                let _ = self.controller.new_session().await;
            }
            Command::Help => {
                info!("\n{}", HELP_TEXT);
                return;
            }
            Command::Quit => return,
        }
        self.show().await;
    }

    async fn show(&self) {
        let view = self.controller.current_view().await;
        let workflow = self.controller.workflow().await;
        log_page_listing(&view, workflow.selected());
        info!(
            "流程状态: {} | 模式: {:?}",
            workflow.state().label(),
            workflow.mode()
        );
    }
}
