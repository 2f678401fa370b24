use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 扫描服务器 API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 本地存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 流程前置条件错误
    #[error("流程错误: {0}")]
    Workflow(#[from] WorkflowError),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// HTTP 状态码异常且无法解析响应体
    #[error("API返回异常状态 ({endpoint}): status={status}, message={message:?}")]
    BadStatus {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    /// 服务器明确拒绝（success=false 或带 error 字段）
    #[error("服务器拒绝请求 ({endpoint}): {message}")]
    Rejected { endpoint: String, message: String },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    /// URL 构造失败
    #[error("无效的URL ({url}): {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 本地键值存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 读取存储文件失败
    #[error("读取存储文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入存储文件失败
    #[error("写入存储文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 存储内容损坏
    #[error("存储内容损坏 (键: {key}): {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 流程前置条件错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// 数字化模式下选中了多张图片
    #[error("请只选择一张图片进行OCR (当前选中 {count} 张)")]
    TooManySelected { count: usize },
    /// 没有选中文件夹
    #[error("请先选择一个文件夹")]
    MissingFolder,
    /// 缺少项目代码
    #[error("请输入项目代码")]
    MissingProjectCode,
    /// 当前状态不允许该操作
    #[error("当前流程状态为 {actual}，无法执行该操作 (需要 {expected})")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },
    /// 没有可移动的图片
    #[error("没有可以移动到新文件夹的图片")]
    NoImagesToMove,
    /// 没有可上传的文件
    #[error("请至少选择一个 .jpg/.jpeg 文件")]
    NoFilesToUpload,
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        })
    }

    /// 创建服务器拒绝错误
    pub fn rejected(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Api(ApiError::Rejected {
            endpoint: endpoint.into(),
            message: message.into(),
        })
    }

    /// 创建URL构造错误
    pub fn invalid_url(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::InvalidUrl {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 是否为服务器明确拒绝（而非网络故障）
    pub fn is_rejection(&self) -> bool {
        matches!(self, AppError::Api(ApiError::Rejected { .. }))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_is_rejection() {
        let err = AppError::rejected("/delete", "Archivo no encontrado");
        assert!(err.is_rejection());
        assert!(err.to_string().contains("Archivo no encontrado"));
    }

    #[test]
    fn test_workflow_error_converts() {
        let err: AppError = WorkflowError::MissingProjectCode.into();
        assert!(!err.is_rejection());
        assert!(matches!(
            err,
            AppError::Workflow(WorkflowError::MissingProjectCode)
        ));
    }
}
