pub mod document_workflow;
pub mod page_action;
pub mod scan_session;

pub use document_workflow::{DocumentPresent, DocumentWorkflow, IndexForm, ViewMode, WorkflowState};
pub use page_action::PageAction;
pub use scan_session::{RefreshTicket, ScanSession};
