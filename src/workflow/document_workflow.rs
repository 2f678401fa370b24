//! 文档处理流程
//!
//! 流程顺序：
//! 1. OCR → 自动填写表单
//! 2. 完成 → 服务器生成 PDF 与对账表
//! 3. 重置回 OCR

use std::fmt;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::WorkflowError;
use crate::models::{ExtractedInfo, FinalizeForm, OcrOutcome, OcrTarget};

/// 视图模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// 扫描输入目录，按时间倒序
    #[default]
    Digitalization,
    /// 浏览已生成的文件夹
    Indexation,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Digitalization => "digitalization",
            ViewMode::Indexation => "indexation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "digitalization" | "digitalizacion" => Some(ViewMode::Digitalization),
            "indexation" | "indexacion" => Some(ViewMode::Indexation),
            _ => None,
        }
    }
}

/// 流程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Ocr,
    Finalize,
}

impl WorkflowState {
    pub fn label(self) -> &'static str {
        match self {
            WorkflowState::Ocr => "OCR",
            WorkflowState::Finalize => "FINALIZE",
        }
    }
}

/// 是否附带纸质原件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentPresent {
    #[default]
    Si,
    No,
}

impl DocumentPresent {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentPresent::Si => "SI",
            DocumentPresent::No => "NO",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SI" | "SÍ" | "YES" => Some(DocumentPresent::Si),
            "NO" => Some(DocumentPresent::No),
            _ => None,
        }
    }
}

/// 索引表单
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexForm {
    pub project_code: String,
    pub box_number: String,
    pub document_present: DocumentPresent,
    pub observation: String,
}

impl IndexForm {
    /// 用 OCR 结果填写，未提取到的字段保持原值
    pub fn fill_from(&mut self, info: &ExtractedInfo) {
        if let Some(code) = &info.project_code {
            self.project_code = code.clone();
        }
        if let Some(box_number) = &info.box_number {
            self.box_number = box_number.clone();
        }
        if let Some(observation) = &info.observation {
            self.observation = observation.clone();
        }
    }

    /// 按字段名设置，未知字段返回 false
    pub fn set_field(&mut self, field: &str, value: &str) -> bool {
        match field {
            "project" | "projectCode" => self.project_code = value.trim().to_string(),
            "box" | "boxNumber" => self.box_number = value.trim().to_string(),
            "observation" => self.observation = value.trim().to_string(),
            "present" | "documentPresent" => match DocumentPresent::parse(value) {
                Some(present) => self.document_present = present,
                None => return false,
            },
            _ => return false,
        }
        true
    }
}

/// 文档流程状态机
#[derive(Debug, Clone)]
pub struct DocumentWorkflow {
    mode: ViewMode,
    state: WorkflowState,
    form: IndexForm,
    selected: Vec<String>,
    current_folder: Option<String>,
    last_extracted: Option<ExtractedInfo>,
}

impl DocumentWorkflow {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            state: WorkflowState::Ocr,
            form: IndexForm::default(),
            selected: Vec::new(),
            current_folder: None,
            last_extracted: None,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        if self.mode != mode {
            info!("切换视图模式: {:?} → {:?}", self.mode, mode);
            self.mode = mode;
            self.reset();
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn form(&self) -> &IndexForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut IndexForm {
        &mut self.form
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn last_extracted(&self) -> Option<&ExtractedInfo> {
        self.last_extracted.as_ref()
    }

    /// 切换图片的 OCR 选中状态，返回切换后是否选中
    pub fn toggle_selected(&mut self, name: &str) -> bool {
        if let Some(index) = self.selected.iter().position(|n| n == name) {
            self.selected.remove(index);
            false
        } else {
            self.selected.push(name.to_string());
            true
        }
    }

    /// 图片被删除后同步清除选中
    pub fn forget(&mut self, name: &str) {
        self.selected.retain(|n| n != name);
    }

    pub fn current_folder(&self) -> Option<&str> {
        self.current_folder.as_deref()
    }

    pub fn set_current_folder(&mut self, folder: Option<String>) {
        self.current_folder = folder.filter(|f| !f.is_empty());
    }

    /// 根据模式决定 OCR 目标
    pub fn ocr_target(&self) -> Result<OcrTarget, WorkflowError> {
        self.expect_state(WorkflowState::Ocr)?;
        match self.mode {
            ViewMode::Digitalization => match self.selected.as_slice() {
                [] => Ok(OcrTarget::Latest),
                [only] => Ok(OcrTarget::File(only.clone())),
                many => Err(WorkflowError::TooManySelected { count: many.len() }),
            },
            ViewMode::Indexation => self
                .current_folder
                .clone()
                .map(OcrTarget::Folder)
                .ok_or(WorkflowError::MissingFolder),
        }
    }

    /// 应用 OCR 结果并进入完成阶段
    pub fn apply_ocr(&mut self, outcome: &OcrOutcome) {
        if let Some(info) = &outcome.extracted_info {
            let clean = info.sanitized();
            debug!("OCR 提取结果: {:?}", clean);
            self.form.fill_from(&clean);
            self.last_extracted = Some(clean);
        }
        self.state = WorkflowState::Finalize;
    }

    /// 构造完成表单
    pub fn finalize_form(&self) -> Result<FinalizeForm, WorkflowError> {
        self.expect_state(WorkflowState::Finalize)?;
        let project_code = self.form.project_code.trim();
        if project_code.is_empty() {
            return Err(WorkflowError::MissingProjectCode);
        }
        let folder = self
            .current_folder
            .clone()
            .ok_or(WorkflowError::MissingFolder)?;

        Ok(FinalizeForm {
            project_code: project_code.to_string(),
            box_number: self.form.box_number.trim().to_string(),
            document_present: self.form.document_present.as_str().to_string(),
            observation: self.form.observation.trim().to_string(),
            folder,
        })
    }

    /// 回到初始状态，清空表单和选中
    pub fn reset(&mut self) {
        self.state = WorkflowState::Ocr;
        self.form = IndexForm::default();
        self.selected.clear();
        self.last_extracted = None;
    }

    fn expect_state(&self, expected: WorkflowState) -> Result<(), WorkflowError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(WorkflowError::InvalidState {
                expected: expected.label(),
                actual: self.state.label(),
            })
        }
    }
}

impl fmt::Display for FinalizeForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Carpeta: {}", self.folder)?;
        writeln!(f, "Archivo: {}.pdf", self.project_code)?;
        writeln!(
            f,
            "Caja: {}",
            if self.box_number.is_empty() { "No especificada" } else { &self.box_number }
        )?;
        writeln!(
            f,
            "Observación: {}",
            if self.observation.is_empty() { "Ninguna" } else { &self.observation }
        )?;
        write!(f, "Presenta documento: {}", self.document_present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ocr_outcome(code: &str) -> OcrOutcome {
        OcrOutcome {
            extracted_info: Some(ExtractedInfo {
                project_code: Some(code.to_string()),
                box_number: Some("12".to_string()),
                ..Default::default()
            }),
            text: None,
        }
    }

    #[test]
    fn test_digitalization_selection_rules() {
        let mut wf = DocumentWorkflow::new(ViewMode::Digitalization);
        assert_eq!(wf.ocr_target(), Ok(OcrTarget::Latest));

        wf.toggle_selected("001.jpg");
        assert_eq!(wf.ocr_target(), Ok(OcrTarget::File("001.jpg".to_string())));

        wf.toggle_selected("002.jpg");
        assert_eq!(
            wf.ocr_target(),
            Err(WorkflowError::TooManySelected { count: 2 })
        );

        assert!(!wf.toggle_selected("002.jpg"));
        wf.forget("001.jpg");
        assert_eq!(wf.ocr_target(), Ok(OcrTarget::Latest));
    }

    #[test]
    fn test_indexation_requires_folder() {
        let mut wf = DocumentWorkflow::new(ViewMode::Indexation);
        assert_eq!(wf.ocr_target(), Err(WorkflowError::MissingFolder));
        wf.set_current_folder(Some("carpeta_002".to_string()));
        assert_eq!(
            wf.ocr_target(),
            Ok(OcrTarget::Folder("carpeta_002".to_string()))
        );
    }

    #[test]
    fn test_ocr_then_finalize() {
        let mut wf = DocumentWorkflow::new(ViewMode::Indexation);
        wf.set_current_folder(Some("carpeta_002".to_string()));
        assert!(matches!(
            wf.finalize_form(),
            Err(WorkflowError::InvalidState { .. })
        ));

        wf.apply_ocr(&ocr_outcome("2301AB1234"));
        assert_eq!(wf.state(), WorkflowState::Finalize);
        assert!(matches!(
            wf.ocr_target(),
            Err(WorkflowError::InvalidState { .. })
        ));

        let form = wf.finalize_form().unwrap();
        assert_eq!(form.project_code, "2301AB1234");
        assert_eq!(form.box_number, "12");
        assert_eq!(form.document_present, "SI");
        assert_eq!(form.folder, "carpeta_002");
        assert!(form.to_string().contains("Observación: Ninguna"));

        wf.reset();
        assert_eq!(wf.state(), WorkflowState::Ocr);
        assert_eq!(wf.form(), &IndexForm::default());
    }

    #[test]
    fn test_invalid_ocr_code_requires_manual_entry() {
        let mut wf = DocumentWorkflow::new(ViewMode::Indexation);
        wf.set_current_folder(Some("carpeta_002".to_string()));
        wf.apply_ocr(&ocr_outcome("not-a-code"));
        assert_eq!(wf.finalize_form(), Err(WorkflowError::MissingProjectCode));

        assert!(wf.form_mut().set_field("project", "2301AB1234"));
        assert!(wf.form_mut().set_field("present", "no"));
        assert!(!wf.form_mut().set_field("present", "maybe"));
        assert!(!wf.form_mut().set_field("color", "red"));

        let form = wf.finalize_form().unwrap();
        assert_eq!(form.document_present, "NO");
    }

    #[test]
    fn test_view_mode_parse() {
        assert_eq!(ViewMode::parse("indexacion"), Some(ViewMode::Indexation));
        assert_eq!(ViewMode::parse("Digitalization"), Some(ViewMode::Digitalization));
        assert_eq!(ViewMode::parse("grid"), None);
        for mode in [ViewMode::Digitalization, ViewMode::Indexation] {
            assert_eq!(ViewMode::parse(mode.as_str()), Some(mode));
        }
    }
}
