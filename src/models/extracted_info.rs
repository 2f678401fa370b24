//! OCR 提取字段
//!
//! 服务器返回的字段在填表前做一次校验：项目代码按格式匹配，RUT 做校验位验证

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 项目代码格式，例如 2301AB1234
const PROJECT_CODE_PATTERN: &str = r"\b23\d{2}[A-Z]{1,2}\d{4}\b";

static PROJECT_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PROJECT_CODE_PATTERN).expect("项目代码正则无效"));

/// OCR 提取到的结构化信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedInfo {
    #[serde(default)]
    pub project_code: Option<String>,
    #[serde(default)]
    pub box_number: Option<String>,
    #[serde(default)]
    pub observation: Option<String>,
    #[serde(default)]
    pub rut: Option<String>,
    #[serde(default)]
    pub folio: Option<String>,
}

impl ExtractedInfo {
    /// 校验并规范化所有字段，无效值会被丢弃
    pub fn sanitized(&self) -> Self {
        let project_code = self.project_code.as_deref().and_then(|raw| {
            let found = find_project_code(raw);
            if found.is_none() {
                warn!("OCR 返回的项目代码格式无效: {}", raw);
            }
            found
        });

        let rut = self.rut.as_deref().and_then(|raw| {
            let normalized = normalize_rut(raw);
            if normalized.is_none() {
                warn!("OCR 返回的 RUT 校验失败: {}", raw);
            }
            normalized
        });

        Self {
            project_code,
            box_number: non_empty(self.box_number.as_deref()),
            observation: non_empty(self.observation.as_deref()),
            rut,
            folio: non_empty(self.folio.as_deref()),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 在文本中查找第一个项目代码
pub fn find_project_code(text: &str) -> Option<String> {
    let found = PROJECT_CODE_RE.find(text).map(|m| m.as_str().to_string());
    debug!("项目代码匹配结果: {:?}", found);
    found
}

/// 规范化 RUT 为 `NNNNNNNN-D` 形式，校验位不正确时返回 None
pub fn normalize_rut(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '.' | ' ' | '-'))
        .collect::<String>()
        .to_uppercase();

    // OCR 可能带回非 ASCII 字符，按字节切分前先排除
    if cleaned.len() < 2 || !cleaned.is_ascii() {
        return None;
    }

    let dv = cleaned.chars().last()?;
    let body = &cleaned[..cleaned.len() - dv.len_utf8()];
    if !body.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let expected = rut_check_digit(body)?;
    if dv != expected {
        return None;
    }

    let body = body.trim_start_matches('0');
    if body.is_empty() {
        return None;
    }
    Some(format!("{}-{}", body, expected))
}

/// 模 11 校验位
fn rut_check_digit(body: &str) -> Option<char> {
    let mut sum = 0u32;
    for (i, c) in body.chars().rev().enumerate() {
        let digit = c.to_digit(10)?;
        sum += digit * (2 + (i as u32 % 6));
    }
    match 11 - (sum % 11) {
        11 => Some('0'),
        10 => Some('K'),
        n => char::from_digit(n, 10),
    }
}
