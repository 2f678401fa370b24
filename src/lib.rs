//! # Doc Scan Client
//!
//! 文档数字化流程的客户端：扫描/上传页面图片，调整顺序、旋转、删除，
//! 执行 OCR 填写项目代码等字段，并触发服务器生成 PDF 与对账表
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 本地键值存储，持久化图片顺序
//!
//! ### ② 能力层（Clients / Services / Ordering）
//! - `clients/` - `ScanClient`，所有服务器接口
//! - `services/` - `Notifier` 提示能力、`AlertLog`
//! - `ordering/` - `ImageOrdering` 顺序协调
//!
//! ### ③ 流程层（Workflow）
//! - `ScanSession` - 会话状态（顺序 + 最近快照 + 刷新凭据）
//! - `PageAction` - 由数据属性解码的单页操作
//! - `DocumentWorkflow` - OCR → 完成 状态机
//!
//! ### ④ 编排层（Orchestration）
//! - `ScanController` - 单个用户操作的完整流程
//! - `App` - 轮询与终端命令循环
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod ordering;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::ScanClient;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::PageRef;
pub use orchestrator::{App, ScanController};
pub use ordering::{ChangeDetection, Direction, ImageOrdering};
pub use workflow::{PageAction, ScanSession};
