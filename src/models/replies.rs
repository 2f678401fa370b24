//! 服务器响应结构
//!
//! 所有变更类接口都返回 `{success: true, ...}` 或 `{error: "..."}`

use serde::Deserialize;

use super::extracted_info::ExtractedInfo;
use super::page::PageRef;

/// 旋转方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Left,
    Right,
}

impl RotateDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            RotateDirection::Left => "left",
            RotateDirection::Right => "right",
        }
    }
}

/// 服务器端移动方向（与本地排序操作一一对应）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
    First,
}

impl MoveDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveDirection::Up => "up",
            MoveDirection::Down => "down",
            MoveDirection::First => "first",
        }
    }
}

/// 上传结果
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadAck {
    #[serde(default)]
    pub files: Vec<String>,
}

/// OCR 目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrTarget {
    /// 服务器自行选择最新图片
    Latest,
    /// 指定单张图片
    File(String),
    /// 整个文件夹
    Folder(String),
}

/// OCR 结果
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrOutcome {
    #[serde(default)]
    pub extracted_info: Option<ExtractedInfo>,
    #[serde(default)]
    pub text: Option<String>,
}

/// 生成 PDF 和对账表的表单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeForm {
    pub project_code: String,
    pub box_number: String,
    pub document_present: String,
    pub observation: String,
    pub folder: String,
}

impl FinalizeForm {
    /// 表单字段（multipart 字段名, 值）
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("projectCode", self.project_code.as_str()),
            ("boxNumber", self.box_number.as_str()),
            ("documentPresent", self.document_present.as_str()),
            ("observation", self.observation.as_str()),
            ("folder", self.folder.as_str()),
        ]
    }
}

/// 生成新文件夹结果
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateFolderAck {
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub files_moved: usize,
}

/// 文件夹列表（索引模式）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderListing {
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default)]
    pub current_folder: Option<String>,
    #[serde(default)]
    pub images: Vec<PageRef>,
}
