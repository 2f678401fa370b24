/// 扫描服务器 API 客户端
///
/// 封装所有与扫描服务器相关的调用逻辑：刷新、轮询、旋转、删除、上传、OCR、生成文档
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::future::try_join_all;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, StoreError, WorkflowError};
use crate::models::{
    FinalizeForm, FolderListing, GenerateFolderAck, MoveDirection, OcrOutcome, OcrTarget,
    PageRef, RotateDirection, UpdateMarker, UploadAck,
};

/// 扫描服务器客户端
#[derive(Debug, Clone)]
pub struct ScanClient {
    http: Client,
    base_url: Url,
}

impl ScanClient {
    /// 创建新的扫描服务器客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_base_url(
            &config.server_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// 使用指定地址创建
    pub fn with_base_url(base_url: &str, timeout: Duration) -> AppResult<Self> {
        // 确保以 / 结尾，join 时保留原有路径前缀
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url =
            Url::parse(&normalized).map_err(|e| AppError::invalid_url(normalized.clone(), e))?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::request_failed(base_url.as_str(), e))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::invalid_url(path, e))
    }

    /// 获取最新快照
    ///
    /// # 参数
    /// - `reverse`: 数字化模式下按时间倒序
    pub async fn refresh(&self, reverse: bool) -> AppResult<Vec<PageRef>> {
        let url = self.endpoint("refresh")?;
        let mut request = self.http.get(url);
        if reverse {
            request = request.query(&[("reverse", "true")]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AppError::request_failed("/refresh", e))?;
        let pages: Vec<PageRef> = decode_json("/refresh", response).await?;
        debug!("刷新获得 {} 个页面", pages.len());
        Ok(pages)
    }

    /// 查询最后修改标记
    pub async fn check_updates(&self) -> AppResult<UpdateMarker> {
        let url = self.endpoint("check_updates")?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::request_failed("/check_updates", e))?;
        decode_json("/check_updates", response).await
    }

    /// 旋转图片
    pub async fn rotate(&self, filename: &str, direction: RotateDirection) -> AppResult<()> {
        let url = self.endpoint("rotate_image")?;
        let response = self
            .http
            .get(url)
            .query(&[("filename", filename), ("direction", direction.as_str())])
            .send()
            .await
            .map_err(|e| AppError::request_failed("/rotate_image", e))?;
        decode_ack::<Value>("/rotate_image", response).await?;
        info!("✓ 图片已旋转: {} ({})", filename, direction.as_str());
        Ok(())
    }

    /// 删除图片
    pub async fn delete(&self, filename: &str) -> AppResult<()> {
        let mut url = self.endpoint("delete/")?;
        url.path_segments_mut()
            .map_err(|_| {
                AppError::Api(ApiError::InvalidUrl {
                    url: self.base_url.to_string(),
                    source: "base URL cannot carry a path".into(),
                })
            })?
            .pop_if_empty()
            .push(filename);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::request_failed("/delete", e))?;
        decode_ack::<Value>("/delete", response).await?;
        info!("✓ 图片已删除: {}", filename);
        Ok(())
    }

    /// 在服务器端同步移动
    pub async fn move_image(&self, filename: &str, direction: MoveDirection) -> AppResult<()> {
        let url = self.endpoint("move_image")?;
        let response = self
            .http
            .get(url)
            .query(&[("filename", filename), ("direction", direction.as_str())])
            .send()
            .await
            .map_err(|e| AppError::request_failed("/move_image", e))?;
        decode_ack::<Value>("/move_image", response).await?;
        Ok(())
    }

    /// 批量上传图片，只接受 .jpg / .jpeg
    pub async fn upload(&self, paths: &[PathBuf]) -> AppResult<UploadAck> {
        let accepted: Vec<&PathBuf> = paths.iter().filter(|p| is_jpeg(p)).collect();
        if accepted.is_empty() {
            return Err(WorkflowError::NoFilesToUpload.into());
        }

        let parts = try_join_all(accepted.iter().map(|path| read_part(path))).await?;
        let form = parts
            .into_iter()
            .fold(Form::new(), |form, part| form.part("file", part));

        let url = self.endpoint("upload")?;
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::request_failed("/upload", e))?;
        let ack: UploadAck = decode_ack("/upload", response).await?;
        info!("✓ 上传完成: {} 个文件", ack.files.len());
        Ok(ack)
    }

    /// 执行 OCR
    pub async fn run_ocr(&self, target: &OcrTarget) -> AppResult<OcrOutcome> {
        let url = self.endpoint("ocr")?;
        let mut request = self.http.get(url);
        request = match target {
            OcrTarget::Latest => request,
            OcrTarget::File(filename) => request.query(&[("filename", filename)]),
            OcrTarget::Folder(folder) => request.query(&[("folder", folder)]),
        };
        debug!("执行 OCR: {:?}", target);
        let response = request
            .send()
            .await
            .map_err(|e| AppError::request_failed("/ocr", e))?;
        decode_ack("/ocr", response).await
    }

    /// 生成 PDF 与对账表
    pub async fn finalize(&self, form: &FinalizeForm) -> AppResult<Value> {
        let multipart = form
            .fields()
            .into_iter()
            .fold(Form::new(), |acc, (name, value)| {
                acc.text(name, value.to_string())
            });

        let url = self.endpoint("process_and_finalize")?;
        let response = self
            .http
            .post(url)
            .multipart(multipart)
            .send()
            .await
            .map_err(|e| AppError::request_failed("/process_and_finalize", e))?;
        decode_ack("/process_and_finalize", response).await
    }

    /// 把当前图片移动到新文件夹
    pub async fn generate_folder(&self) -> AppResult<GenerateFolderAck> {
        let url = self.endpoint("generar_carpeta")?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::request_failed("/generar_carpeta", e))?;
        decode_ack("/generar_carpeta", response).await
    }

    /// 列出文件夹以及当前文件夹的图片
    pub async fn list_folders(&self, folder: Option<&str>) -> AppResult<FolderListing> {
        let url = self.endpoint("get_folders")?;
        let mut request = self.http.get(url);
        if let Some(folder) = folder {
            request = request.query(&[("folder", folder)]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AppError::request_failed("/get_folders", e))?;
        decode_ack("/get_folders", response).await
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

async fn read_part(path: &Path) -> AppResult<Part> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| StoreError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Part::bytes(bytes)
        .file_name(filename)
        .mime_str("image/jpeg")
        .map_err(|e| AppError::request_failed("/upload", e))
}

/// 读取响应体为 JSON；非 2xx 时尽量带上服务器的 error 字段
async fn read_body(endpoint: &str, response: Response) -> AppResult<Value> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| AppError::request_failed(endpoint, e))?;

    match serde_json::from_str::<Value>(&text) {
        Ok(body) => {
            if !status.is_success() && body.get("error").is_none() {
                return Err(ApiError::BadStatus {
                    endpoint: endpoint.to_string(),
                    status: status.as_u16(),
                    message: None,
                }
                .into());
            }
            Ok(body)
        }
        Err(source) if status.is_success() => Err(ApiError::JsonParseFailed {
            endpoint: endpoint.to_string(),
            source,
        }
        .into()),
        Err(_) => Err(ApiError::BadStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message: Some(text.chars().take(200).collect()),
        }
        .into()),
    }
}

/// 解码不带 success 标记的数据接口
async fn decode_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> AppResult<T> {
    let body = read_body(endpoint, response).await?;
    if let Some(message) = body.get("error").and_then(|v| v.as_str()) {
        return Err(AppError::rejected(endpoint, message));
    }
    parse_value(endpoint, body)
}

/// 解码带 success 标记的变更接口
async fn decode_ack<T: DeserializeOwned>(endpoint: &str, response: Response) -> AppResult<T> {
    let body = read_body(endpoint, response).await?;
    check_ack(endpoint, &body)?;
    parse_value(endpoint, body)
}

/// `success: true` 视为成功；`success: false` 或带 error 字段视为拒绝
fn check_ack(endpoint: &str, body: &Value) -> AppResult<()> {
    let success = body.get("success").and_then(|v| v.as_bool());
    let error = body.get("error").and_then(|v| v.as_str());

    match (success, error) {
        (Some(true), _) => Ok(()),
        (_, Some(message)) => Err(AppError::rejected(endpoint, message)),
        (Some(false), None) => Err(AppError::rejected(endpoint, "Error desconocido")),
        (None, None) => Ok(()),
    }
}

fn parse_value<T: DeserializeOwned>(endpoint: &str, body: Value) -> AppResult<T> {
    serde_json::from_value(body).map_err(|source| {
        ApiError::JsonParseFailed {
            endpoint: endpoint.to_string(),
            source,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_ack() {
        assert!(check_ack("/x", &json!({"success": true})).is_ok());
        assert!(check_ack("/x", &json!({"folders": []})).is_ok());

        let err = check_ack("/x", &json!({"error": "Archivo no encontrado"})).unwrap_err();
        assert!(err.is_rejection());
        assert!(err.to_string().contains("Archivo no encontrado"));

        let err = check_ack("/x", &json!({"success": false})).unwrap_err();
        assert!(err.is_rejection());
    }

    #[test]
    fn test_is_jpeg() {
        assert!(is_jpeg(Path::new("scan/001.JPG")));
        assert!(is_jpeg(Path::new("002.jpeg")));
        assert!(!is_jpeg(Path::new("notes.pdf")));
        assert!(!is_jpeg(Path::new("noext")));
    }

    #[test]
    fn test_base_url_keeps_prefix() {
        let client =
            ScanClient::with_base_url("http://localhost:5000/app", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.endpoint("refresh").unwrap().as_str(),
            "http://localhost:5000/app/refresh"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ScanClient::with_base_url("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::InvalidUrl { .. })));
    }
}
