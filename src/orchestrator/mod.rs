//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 轮询定时器与终端命令的 select 循环
//!
//! ### `scan_controller` - 扫描控制器
//! - 刷新/轮询/单页操作/上传/OCR/完成
//! - 捕获并提示每个操作的错误
//!
//! ### `command` - 终端命令解析
//!
//! ## 层次关系
//!
//! ```text
//! app (事件循环)
//!     ↓
//! scan_controller (单个用户操作)
//!     ↓
//! workflow (ScanSession / DocumentWorkflow / PageAction)
//!     ↓
//! ordering (ImageOrdering)      clients (ScanClient)      services (Notifier)
//!     ↓
//! infrastructure (KeyValueStore)
//! ```

pub mod app;
pub mod command;
pub mod scan_controller;

pub use app::App;
pub use command::Command;
pub use scan_controller::ScanController;
