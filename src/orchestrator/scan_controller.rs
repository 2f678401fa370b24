//! 扫描控制器 - 编排层
//!
//! ## 职责
//!
//! - 持有客户端、会话、文档流程、本地存储和提示能力
//! - 刷新时先在锁内领取凭据，锁外请求服务器，再回到锁内应用快照
//! - 每个用户操作自行捕获错误：记录日志并弹出提示，不会中断进程
//!
//! ## 错误分类
//!
//! - 网络/传输失败：记录并提示，不自动重试
//! - 服务器拒绝：提示服务器返回的信息，顺序保持不变
//! - 本地无效操作（移动不存在的名称等）：静默忽略

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::clients::ScanClient;
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, WorkflowError};
use crate::infrastructure::{clear_order, load_order, save_order, KeyValueStore, VIEW_MODE_KEY};
use crate::models::{FinalizeForm, FolderListing, GenerateFolderAck, PageRef, UploadAck};
use crate::services::{NoticeLevel, Notifier};
use crate::workflow::{DocumentWorkflow, PageAction, ScanSession, ViewMode};

/// 扫描控制器
pub struct ScanController {
    client: ScanClient,
    session: Mutex<ScanSession>,
    workflow: Mutex<DocumentWorkflow>,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    sync_moves: bool,
}

impl ScanController {
    pub fn new(
        client: ScanClient,
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            client,
            session: Mutex::new(ScanSession::new(config.change_detection)),
            workflow: Mutex::new(DocumentWorkflow::new(config.view_mode)),
            store,
            notifier,
            sync_moves: config.sync_moves_to_server,
        }
    }

    /// 启动时读取一次已保存的顺序，损坏时当作空
    pub async fn restore_order(&self) -> usize {
        let names = match load_order(self.store.as_ref()) {
            Ok(names) => names,
            Err(e) => {
                warn!("读取已保存的顺序失败，忽略: {}", e);
                Vec::new()
            }
        };
        let count = names.len();
        self.session.lock().await.restore(names);
        count
    }

    /// 启动时恢复上次使用的视图模式，未保存或无法识别时沿用配置值
    pub async fn restore_mode(&self) -> Option<ViewMode> {
        let raw = match self.store.get(VIEW_MODE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("读取已保存的视图模式失败，忽略: {}", e);
                return None;
            }
        };
        let Some(mode) = ViewMode::parse(&raw) else {
            warn!("无法识别已保存的视图模式，忽略: {}", raw);
            return None;
        };
        self.workflow.lock().await.set_mode(mode);
        Some(mode)
    }

    /// 当前显示顺序（基于最近快照重新协调）
    pub async fn current_view(&self) -> Vec<PageRef> {
        self.session.lock().await.view()
    }

    /// 当前名称顺序
    pub async fn order(&self) -> Vec<String> {
        self.session.lock().await.order().to_vec()
    }

    /// 文档流程的当前状态副本
    pub async fn workflow(&self) -> DocumentWorkflow {
        self.workflow.lock().await.clone()
    }

    // ========== 刷新与轮询 ==========

    /// 从服务器获取快照并协调
    pub async fn refresh(&self) -> AppResult<Vec<PageRef>> {
        let ticket = self.session.lock().await.issue_ticket();
        let snapshot = self.fetch_snapshot().await?;

        let mut session = self.session.lock().await;
        match session.apply_snapshot(ticket, snapshot) {
            Some(view) => {
                debug!("快照已应用 (凭据 {}): {} 项", ticket.generation(), view.len());
                Ok(view)
            }
            None => Ok(session.view()),
        }
    }

    /// 按模式获取快照：数字化模式倒序刷新，索引模式读取当前文件夹
    async fn fetch_snapshot(&self) -> AppResult<Vec<PageRef>> {
        let (mode, folder) = {
            let workflow = self.workflow.lock().await;
            (workflow.mode(), workflow.current_folder().map(str::to_string))
        };

        match mode {
            ViewMode::Digitalization => self.client.refresh(true).await,
            ViewMode::Indexation => {
                let listing = self.client.list_folders(folder.as_deref()).await?;
                self.workflow
                    .lock()
                    .await
                    .set_current_folder(listing.current_folder.clone().or(folder));
                Ok(listing.images)
            }
        }
    }

    /// 轮询一次：修改标记前进时刷新。失败只记录日志，不弹提示
    pub async fn poll_once(&self) -> AppResult<bool> {
        let marker = match self.client.check_updates().await {
            Ok(marker) => marker,
            Err(e) => {
                error!("检查更新失败: {}", e);
                return Err(e);
            }
        };

        let advanced = self.session.lock().await.observe_marker(&marker);
        if !advanced {
            return Ok(false);
        }

        info!("📥 检测到文件夹变化 ({})，刷新图片...", marker.timestamp);
        if let Err(e) = self.refresh().await {
            error!("刷新图片失败: {}", e);
            return Err(e);
        }
        Ok(true)
    }

    // ========== 单页操作 ==========

    /// 分发单页操作
    pub async fn dispatch(&self, action: PageAction) -> AppResult<Vec<PageRef>> {
        debug!("分发操作: {:?}", action);
        match &action {
            PageAction::MoveUp(_) | PageAction::MoveDown(_) | PageAction::MoveToFirst(_) => {
                self.move_page(&action).await
            }
            PageAction::RotateLeft(name) | PageAction::RotateRight(name) => {
                let result = self.rotate_page(name, &action).await;
                self.alert_on_error("Error al rotar la imagen", result)
            }
            PageAction::Delete(name) => {
                let result = self.delete_page(name).await;
                self.alert_on_error("Error al eliminar la imagen", result)
            }
        }
    }

    async fn move_page(&self, action: &PageAction) -> AppResult<Vec<PageRef>> {
        let name = action.filename();
        let (changed, order, view) = {
            let mut session = self.session.lock().await;
            let changed = match action.adjacent_direction() {
                Some(direction) => session.move_adjacent(name, direction),
                None => session.move_to_front(name),
            };
            (changed, session.order().to_vec(), session.view())
        };

        if !changed {
            debug!("移动无效，忽略: {:?}", action);
            return Ok(view);
        }

        self.persist_order(&order);
        if matches!(action, PageAction::MoveToFirst(_)) {
            self.notifier
                .toast("Imagen movida a la primera posición", NoticeLevel::Success);
        }

        if self.sync_moves {
            if let Some(direction) = action.move_direction() {
                // 服务器同步失败不回滚本地顺序
                if let Err(e) = self.client.move_image(name, direction).await {
                    error!("同步移动到服务器失败: {}", e);
                    self.notifier.alert(&format!(
                        "Error al mover la imagen: {}",
                        user_message(&e)
                    ));
                }
            }
        }

        Ok(view)
    }

    async fn rotate_page(&self, name: &str, action: &PageAction) -> AppResult<Vec<PageRef>> {
        if !self.is_actionable(name).await {
            debug!("忽略对不存在页面的旋转: {}", name);
            return Ok(self.current_view().await);
        }
        let Some(direction) = action.rotate_direction() else {
            return Ok(self.current_view().await);
        };
        self.client.rotate(name, direction).await?;
        self.refresh().await
    }

    async fn delete_page(&self, name: &str) -> AppResult<Vec<PageRef>> {
        if !self.is_actionable(name).await {
            debug!("忽略对不存在页面的删除: {}", name);
            return Ok(self.current_view().await);
        }
        self.client.delete(name).await?;

        let order = {
            let mut session = self.session.lock().await;
            session.remove(name);
            session.order().to_vec()
        };
        self.workflow.lock().await.forget(name);
        self.persist_order(&order);

        self.refresh().await
    }

    /// 只有最近快照中的真实图片才能旋转或删除，占位项不行
    async fn is_actionable(&self, name: &str) -> bool {
        self.session
            .lock()
            .await
            .last_snapshot()
            .iter()
            .any(|p| p.name == name && !p.is_placeholder())
    }

    // ========== 上传与文档流程 ==========

    /// 上传图片后刷新
    pub async fn upload(&self, paths: &[PathBuf]) -> AppResult<UploadAck> {
        let result = self.try_upload(paths).await;
        self.alert_on_error("Error al subir archivos", result)
    }

    async fn try_upload(&self, paths: &[PathBuf]) -> AppResult<UploadAck> {
        let ack = self.client.upload(paths).await?;
        self.notifier.toast(
            &format!("{} archivo(s) subido(s) correctamente", ack.files.len()),
            NoticeLevel::Success,
        );
        self.refresh().await?;
        Ok(ack)
    }

    /// 切换 OCR 选中状态
    pub async fn toggle_selection(&self, name: &str) -> bool {
        self.workflow.lock().await.toggle_selected(name)
    }

    /// 设置表单字段
    pub async fn set_field(&self, field: &str, value: &str) -> bool {
        self.workflow.lock().await.form_mut().set_field(field, value)
    }

    /// 执行 OCR 并填写表单
    pub async fn run_ocr(&self) -> AppResult<()> {
        let result = self.try_run_ocr().await;
        self.alert_on_error("Error en OCR", result)
    }

    async fn try_run_ocr(&self) -> AppResult<()> {
        let target = self.workflow.lock().await.ocr_target()?;
        info!("📄 执行 OCR: {:?}", target);
        let outcome = self.client.run_ocr(&target).await?;
        self.workflow.lock().await.apply_ocr(&outcome);
        self.notifier
            .toast("OCR completado, revise los campos", NoticeLevel::Success);
        Ok(())
    }

    /// 生成 PDF 与对账表，成功后重置流程
    pub async fn finalize(&self) -> AppResult<FinalizeForm> {
        let result = self.try_finalize().await;
        self.alert_on_error("Error", result)
    }

    async fn try_finalize(&self) -> AppResult<FinalizeForm> {
        let form = self.workflow.lock().await.finalize_form()?;
        let reply: Value = self.client.finalize(&form).await?;
        debug!("完成结果: {}", reply);

        self.notifier.alert(&format!(
            "Documento procesado correctamente:\n{}\nLa carpeta {} ha sido eliminada.",
            form, form.folder
        ));
        self.notifier.toast(
            &format!("Documento procesado y carpeta {} eliminada", form.folder),
            NoticeLevel::Success,
        );

        {
            let mut workflow = self.workflow.lock().await;
            workflow.reset();
            workflow.set_current_folder(None);
        }
        self.reset_order().await;
        if let Err(e) = self.refresh().await {
            warn!("完成后刷新失败: {}", e);
        }
        Ok(form)
    }

    /// 把当前图片移动到新文件夹
    pub async fn generate_folder(&self) -> AppResult<GenerateFolderAck> {
        let result = self.try_generate_folder().await;
        self.alert_on_error("Error al crear carpeta", result)
    }

    async fn try_generate_folder(&self) -> AppResult<GenerateFolderAck> {
        let snapshot = self.client.refresh(true).await?;
        if snapshot.first().map_or(true, PageRef::is_placeholder) {
            return Err(WorkflowError::NoImagesToMove.into());
        }

        let ack = self.client.generate_folder().await?;
        self.notifier.alert(&format!(
            "Carpeta {} creada con éxito. Se movieron {} imágenes.",
            ack.folder, ack.files_moved
        ));

        self.reset_order().await;
        if let Err(e) = self.refresh().await {
            warn!("生成文件夹后刷新失败: {}", e);
        }
        Ok(ack)
    }

    /// 列出文件夹（索引模式），可指定要打开的文件夹
    pub async fn load_folders(&self, folder: Option<&str>) -> AppResult<FolderListing> {
        let result = self.try_load_folders(folder).await;
        self.alert_on_error("Error al cargar carpetas", result)
    }

    async fn try_load_folders(&self, folder: Option<&str>) -> AppResult<FolderListing> {
        let ticket = self.session.lock().await.issue_ticket();
        let mut listing = self.client.list_folders(folder).await?;

        self.workflow.lock().await.set_current_folder(
            listing
                .current_folder
                .clone()
                .or_else(|| folder.map(str::to_string)),
        );

        let images = std::mem::take(&mut listing.images);
        let mut session = self.session.lock().await;
        listing.images = match session.apply_snapshot(ticket, images) {
            Some(view) => view,
            None => session.view(),
        };
        Ok(listing)
    }

    /// 切换视图模式并保存，两种模式的图片来源不同，顺序重新开始
    pub async fn set_mode(&self, mode: ViewMode) -> AppResult<Vec<PageRef>> {
        self.workflow.lock().await.set_mode(mode);
        if let Err(e) = self.store.set(VIEW_MODE_KEY, mode.as_str()) {
            warn!("保存视图模式失败: {}", e);
        }
        self.session.lock().await.reset();
        let result = self.refresh().await;
        self.alert_on_error("Error al actualizar imágenes", result)
    }

    /// 开始新的数字化会话
    pub async fn new_session(&self) -> AppResult<Vec<PageRef>> {
        self.workflow.lock().await.reset();
        self.reset_order().await;
        info!("🆕 新的数字化会话");
        let result = self.refresh().await;
        self.alert_on_error("Error al actualizar imágenes", result)
    }

    // ========== 辅助方法 ==========

    async fn reset_order(&self) {
        self.session.lock().await.reset();
        if let Err(e) = clear_order(self.store.as_ref()) {
            warn!("清除已保存的顺序失败: {}", e);
        }
    }

    fn persist_order(&self, order: &[String]) {
        if let Err(e) = save_order(self.store.as_ref(), order) {
            warn!("保存顺序失败: {}", e);
        }
    }

    /// 失败时记录并提示，原样返回结果
    fn alert_on_error<T>(&self, prefix: &str, result: AppResult<T>) -> AppResult<T> {
        if let Err(e) = &result {
            error!("{}: {}", prefix, e);
            self.notifier
                .alert(&format!("{}: {}", prefix, user_message(e)));
        }
        result
    }
}

/// 服务器拒绝时只显示服务器信息，其余显示完整错误
fn user_message(err: &AppError) -> String {
    match err {
        AppError::Api(ApiError::Rejected { message, .. }) => message.clone(),
        AppError::Workflow(e) => e.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = AppError::rejected("/delete", "Archivo no encontrado");
        assert_eq!(user_message(&err), "Archivo no encontrado");

        let err: AppError = WorkflowError::MissingFolder.into();
        assert_eq!(user_message(&err), "请先选择一个文件夹");
    }
}
