//! 页面快照数据结构
//!
//! 服务器每次刷新都会返回完整的页面列表，客户端只拥有顺序，不拥有显示属性

use serde::{Deserialize, Serialize};

/// 服务器已知的一页扫描件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRef {
    /// 唯一标识（文件名）
    pub name: String,
    /// 缩略图 data URL，服务器渲染失败时为空
    #[serde(default)]
    pub data: Option<String>,
    /// 修改时间（仅用于显示）
    #[serde(default)]
    pub modified: String,
    /// 服务器存储路径，占位项为空
    #[serde(default)]
    pub path: Option<String>,
    /// 服务器渲染错误信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageRef {
    /// 仅包含名称的页面，主要用于测试和占位
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
            modified: String::new(),
            path: None,
            error: None,
        }
    }

    /// 是否为服务器占位项（"No hay imagen disponible"）
    pub fn is_placeholder(&self) -> bool {
        self.path.is_none()
    }

    /// 是否带有可显示的缩略图
    pub fn has_thumbnail(&self) -> bool {
        self.data.is_some()
    }
}

/// 轮询接口返回的最后修改标记
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateMarker {
    pub last_modified: f64,
    #[serde(default)]
    pub timestamp: String,
}
