//! 扫描会话 - 流程层
//!
//! 会话状态不再是全局变量：顺序、最近快照、修改标记和刷新代数都归会话所有，
//! 由控制器持有，可以独立创建多个实例

use tracing::debug;

use crate::models::{PageRef, UpdateMarker};
use crate::ordering::{ChangeDetection, Direction, ImageOrdering};

/// 刷新凭据
///
/// 发起刷新时领取，应用快照时校验，过期的响应直接丢弃
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// 扫描会话
#[derive(Debug, Default)]
pub struct ScanSession {
    ordering: ImageOrdering,
    last_snapshot: Vec<PageRef>,
    last_known_modification: f64,
    issued: u64,
    applied: u64,
}

impl ScanSession {
    pub fn new(detection: ChangeDetection) -> Self {
        Self {
            ordering: ImageOrdering::new(detection),
            ..Default::default()
        }
    }

    /// 用持久化的顺序恢复
    pub fn restore(&mut self, names: Vec<String>) {
        debug!("恢复已保存的顺序: {} 项", names.len());
        self.ordering.replace(names);
    }

    pub fn order(&self) -> &[String] {
        self.ordering.names()
    }

    pub fn last_snapshot(&self) -> &[PageRef] {
        &self.last_snapshot
    }

    /// 领取刷新凭据
    pub fn issue_ticket(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    /// 应用快照；已有更新的快照生效时返回 None
    pub fn apply_snapshot(
        &mut self,
        ticket: RefreshTicket,
        snapshot: Vec<PageRef>,
    ) -> Option<Vec<PageRef>> {
        if ticket.0 <= self.applied {
            debug!(
                "丢弃过期快照: 凭据 {} <= 已应用 {}",
                ticket.0, self.applied
            );
            return None;
        }
        self.applied = ticket.0;
        let view = self.ordering.reconcile(&snapshot);
        self.last_snapshot = snapshot;
        Some(view)
    }

    /// 基于最近快照重新协调（本地移动后重新渲染）
    pub fn view(&mut self) -> Vec<PageRef> {
        self.ordering.reconcile(&self.last_snapshot)
    }

    /// 修改标记前进时返回 true 并记录新值
    pub fn observe_marker(&mut self, marker: &UpdateMarker) -> bool {
        if marker.last_modified > self.last_known_modification {
            self.last_known_modification = marker.last_modified;
            true
        } else {
            false
        }
    }

    pub fn move_adjacent(&mut self, name: &str, direction: Direction) -> bool {
        self.ordering.move_adjacent(name, direction)
    }

    pub fn move_to_front(&mut self, name: &str) -> bool {
        self.ordering.move_to_front(name)
    }

    /// 服务器删除成功后移除，同时从最近快照中去掉
    pub fn remove(&mut self, name: &str) -> bool {
        self.last_snapshot.retain(|p| p.name != name);
        self.ordering.remove(name)
    }

    /// 新的数字化会话：清空一切，并使所有进行中的刷新失效
    pub fn reset(&mut self) {
        self.ordering.clear();
        self.last_snapshot.clear();
        self.last_known_modification = 0.0;
        self.applied = self.issued;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(names: &[&str]) -> Vec<PageRef> {
        names.iter().map(|n| PageRef::named(*n)).collect()
    }

    fn names(view: &[PageRef]) -> Vec<&str> {
        view.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut session = ScanSession::new(ChangeDetection::Count);
        let older = session.issue_ticket();
        let newer = session.issue_ticket();

        let view = session.apply_snapshot(newer, pages(&["a", "b", "c"])).unwrap();
        assert_eq!(names(&view), vec!["a", "b", "c"]);

        // 较早发出的请求后到达，不能覆盖
        assert!(session.apply_snapshot(older, pages(&["a"])).is_none());
        assert_eq!(session.order(), &["a", "b", "c"]);
    }

    #[test]
    fn test_reset_invalidates_in_flight() {
        let mut session = ScanSession::new(ChangeDetection::Count);
        let ticket = session.issue_ticket();
        session.reset();
        assert!(session.apply_snapshot(ticket, pages(&["a"])).is_none());

        let fresh = session.issue_ticket();
        assert!(session.apply_snapshot(fresh, pages(&["a"])).is_some());
    }

    #[test]
    fn test_restored_order_survives_first_snapshot() {
        let mut session = ScanSession::new(ChangeDetection::Count);
        session.restore(vec!["c".into(), "a".into(), "b".into()]);
        let ticket = session.issue_ticket();
        let view = session.apply_snapshot(ticket, pages(&["a", "b", "c"])).unwrap();
        assert_eq!(names(&view), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_view_reflects_local_moves() {
        let mut session = ScanSession::new(ChangeDetection::Count);
        let ticket = session.issue_ticket();
        session.apply_snapshot(ticket, pages(&["a", "b", "c"]));
        assert!(session.move_to_front("c"));
        assert!(session.move_adjacent("a", Direction::Next));
        assert_eq!(names(&session.view()), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_remove_updates_view() {
        let mut session = ScanSession::new(ChangeDetection::Count);
        let ticket = session.issue_ticket();
        session.apply_snapshot(ticket, pages(&["a", "b", "c"]));
        assert!(session.remove("b"));
        assert!(!session.remove("b"));
        assert_eq!(names(&session.view()), vec!["a", "c"]);
    }

    #[test]
    fn test_observe_marker_only_advances() {
        let mut session = ScanSession::new(ChangeDetection::Count);
        let marker = |v: f64| UpdateMarker {
            last_modified: v,
            timestamp: String::new(),
        };
        assert!(session.observe_marker(&marker(10.0)));
        assert!(!session.observe_marker(&marker(10.0)));
        assert!(!session.observe_marker(&marker(5.0)));
        assert!(session.observe_marker(&marker(11.5)));
    }
}
