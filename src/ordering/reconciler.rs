//! 图片顺序协调器
//!
//! 客户端维护一份名称顺序，服务器每次返回的快照只提供显示属性。
//! 规则：
//! 1. 顺序为空或长度与快照不一致时，整体重置为快照顺序
//! 2. 否则按现有顺序输出仍存在的页面，丢弃已被删除的名称
//! 3. 快照中未出现过的页面按快照顺序追加到末尾

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use tracing::debug;

use crate::models::PageRef;

/// 变更检测策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDetection {
    /// 仅比较数量（默认）
    #[default]
    Count,
    /// 比较名称集合，集合不同即整体重置
    NameSet,
}

impl ChangeDetection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "count" => Some(ChangeDetection::Count),
            "name_set" | "nameset" | "set" => Some(ChangeDetection::NameSet),
            _ => None,
        }
    }
}

/// 相邻移动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// 图片显示顺序
#[derive(Debug, Clone, Default)]
pub struct ImageOrdering {
    names: Vec<String>,
    detection: ChangeDetection,
}

impl ImageOrdering {
    pub fn new(detection: ChangeDetection) -> Self {
        Self {
            names: Vec::new(),
            detection,
        }
    }

    /// 从已保存的名称恢复，重复名称只保留第一次出现
    pub fn from_names<I, S>(names: I, detection: ChangeDetection) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordering = Self::new(detection);
        ordering.replace(names);
        ordering
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    /// 用新的名称序列整体替换
    pub fn replace<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        self.names = names
            .into_iter()
            .map(Into::into)
            .filter(|n: &String| seen.insert(n.clone()))
            .collect();
    }

    /// 将服务器快照与当前顺序合并，返回按显示顺序排列的页面
    pub fn reconcile(&mut self, snapshot: &[PageRef]) -> Vec<PageRef> {
        let unique = dedup_snapshot(snapshot);

        if unique.is_empty() {
            self.names.clear();
            return Vec::new();
        }

        if self.needs_resync(&unique) {
            debug!(
                "顺序重置: 原有 {} 项, 快照 {} 项",
                self.names.len(),
                unique.len()
            );
            self.names = unique.iter().map(|p| p.name.clone()).collect();
            return unique.into_iter().cloned().collect();
        }

        let by_name: HashMap<&str, &PageRef> =
            unique.iter().map(|p| (p.name.as_str(), *p)).collect();
        let mut consumed: HashSet<&str> = HashSet::with_capacity(unique.len());
        let mut output = Vec::with_capacity(unique.len());
        let mut kept = Vec::with_capacity(unique.len());

        for name in &self.names {
            if let Some(page) = by_name.get(name.as_str()) {
                consumed.insert(page.name.as_str());
                output.push((*page).clone());
                kept.push(name.clone());
            }
        }

        for page in &unique {
            if !consumed.contains(page.name.as_str()) {
                output.push((*page).clone());
                kept.push(page.name.clone());
            }
        }

        self.names = kept;
        output
    }

    fn needs_resync(&self, unique: &[&PageRef]) -> bool {
        if self.names.is_empty() || self.names.len() != unique.len() {
            return true;
        }
        match self.detection {
            ChangeDetection::Count => false,
            ChangeDetection::NameSet => {
                let current: HashSet<&str> = self.names.iter().map(String::as_str).collect();
                unique.iter().any(|p| !current.contains(p.name.as_str()))
            }
        }
    }

    /// 与相邻项交换位置，越界或名称不存在时不做任何事
    pub fn move_adjacent(&mut self, name: &str, direction: Direction) -> bool {
        let Some(index) = self.position(name) else {
            return false;
        };
        let target = match direction {
            Direction::Previous if index > 0 => index - 1,
            Direction::Next if index + 1 < self.names.len() => index + 1,
            _ => return false,
        };
        self.names.swap(index, target);
        true
    }

    /// 移动到第一位
    pub fn move_to_front(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) if index > 0 => {
                let entry = self.names.remove(index);
                self.names.insert(0, entry);
                true
            }
            _ => false,
        }
    }

    /// 删除名称，不存在时为空操作
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.names.remove(index);
                true
            }
            None => false,
        }
    }
}

/// 按名称去重，第一次出现的保留
fn dedup_snapshot(snapshot: &[PageRef]) -> Vec<&PageRef> {
    let mut seen = HashSet::with_capacity(snapshot.len());
    snapshot
        .iter()
        .filter(|p| seen.insert(p.name.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(names: &[&str]) -> Vec<PageRef> {
        names.iter().map(|n| PageRef::named(*n)).collect()
    }

    fn ordering(names: &[&str]) -> ImageOrdering {
        ImageOrdering::from_names(names.iter().copied(), ChangeDetection::Count)
    }

    fn names_of(pages: &[PageRef]) -> Vec<&str> {
        pages.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_length_mismatch_resets_to_snapshot_order() {
        let mut order = ordering(&["A", "B", "C"]);
        let result = order.reconcile(&snapshot(&["B", "C", "A", "D"]));
        assert_eq!(names_of(&result), vec!["B", "C", "A", "D"]);
        assert_eq!(order.names(), &["B", "C", "A", "D"]);
    }

    #[test]
    fn test_same_length_keeps_local_order() {
        let mut order = ordering(&["A", "B", "C"]);
        let result = order.reconcile(&snapshot(&["A", "C", "B"]));
        assert_eq!(names_of(&result), vec!["A", "B", "C"]);
        assert_eq!(order.names(), &["A", "B", "C"]);
    }

    #[test]
    fn test_first_load_takes_snapshot_order() {
        let mut order = ImageOrdering::new(ChangeDetection::Count);
        let result = order.reconcile(&snapshot(&["x.jpg", "y.jpg"]));
        assert_eq!(names_of(&result), vec!["x.jpg", "y.jpg"]);
    }

    #[test]
    fn test_same_count_swap_drops_missing_and_appends_new() {
        let mut order = ordering(&["C", "A", "B"]);
        let result = order.reconcile(&snapshot(&["A", "D", "C"]));
        assert_eq!(names_of(&result), vec!["C", "A", "D"]);
        assert_eq!(order.names(), &["C", "A", "D"]);
    }

    #[test]
    fn test_name_set_detection_resyncs_on_swap() {
        let mut order =
            ImageOrdering::from_names(["C", "A", "B"], ChangeDetection::NameSet);
        let result = order.reconcile(&snapshot(&["A", "D", "C"]));
        assert_eq!(names_of(&result), vec!["A", "D", "C"]);

        // 集合相同时仍保留本地顺序
        let result = order.reconcile(&snapshot(&["C", "D", "A"]));
        assert_eq!(names_of(&result), vec!["A", "D", "C"]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut order = ordering(&["B", "A", "C"]);
        let snap = snapshot(&["A", "B", "C"]);
        let first = order.reconcile(&snap);
        let second = order.reconcile(&snap);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_snapshot_clears() {
        let mut order = ordering(&["A", "B"]);
        assert!(order.reconcile(&[]).is_empty());
        assert!(order.is_empty());
    }

    #[test]
    fn test_duplicate_snapshot_names_are_collapsed() {
        let mut order = ImageOrdering::new(ChangeDetection::Count);
        let mut snap = snapshot(&["No hay imagen disponible", "No hay imagen disponible"]);
        snap[1].modified = "N/A".to_string();
        let result = order.reconcile(&snap);
        assert_eq!(result.len(), 1);
        assert_eq!(order.len(), 1);

        // 第二次协调时长度一致，不会重复重置
        let again = order.reconcile(&snap);
        assert_eq!(again, result);
    }

    #[test]
    fn test_reconcile_merges_fresh_attributes() {
        let mut order = ordering(&["B", "A"]);
        let mut snap = snapshot(&["A", "B"]);
        snap[0].modified = "2024-05-01 10:00:00".to_string();
        let result = order.reconcile(&snap);
        assert_eq!(result[1].name, "A");
        assert_eq!(result[1].modified, "2024-05-01 10:00:00");
    }

    #[test]
    fn test_move_previous_on_first_is_noop() {
        let mut order = ordering(&["A", "B", "C"]);
        assert!(!order.move_adjacent("A", Direction::Previous));
        assert!(!order.move_adjacent("C", Direction::Next));
        assert!(!order.move_adjacent("Z", Direction::Next));
        assert_eq!(order.names(), &["A", "B", "C"]);
    }

    #[test]
    fn test_move_adjacent_swaps_two_entries() {
        let mut order = ordering(&["A", "B", "C", "D"]);
        assert!(order.move_adjacent("C", Direction::Previous));
        assert_eq!(order.names(), &["A", "C", "B", "D"]);
        assert!(order.move_adjacent("A", Direction::Next));
        assert_eq!(order.names(), &["C", "A", "B", "D"]);
    }

    #[test]
    fn test_move_to_front() {
        let mut order = ordering(&["A", "B", "C"]);
        assert!(order.move_to_front("C"));
        assert_eq!(order.names(), &["C", "A", "B"]);
        assert!(!order.move_to_front("C"));
        assert!(!order.move_to_front("missing"));
        assert_eq!(order.names(), &["C", "A", "B"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut order = ordering(&["A", "B", "C"]);
        assert!(order.remove("B"));
        assert!(!order.remove("B"));
        assert_eq!(order.names(), &["A", "C"]);
    }

    #[test]
    fn test_moves_survive_reconcile() {
        let mut order = ImageOrdering::new(ChangeDetection::Count);
        let snap = snapshot(&["A", "B", "C"]);
        order.reconcile(&snap);
        order.move_to_front("C");
        let result = order.reconcile(&snap);
        assert_eq!(names_of(&result), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_from_names_dedups() {
        let order = ordering(&["A", "B", "A"]);
        assert_eq!(order.names(), &["A", "B"]);
    }

    #[test]
    fn test_change_detection_parse() {
        assert_eq!(ChangeDetection::parse("count"), Some(ChangeDetection::Count));
        assert_eq!(ChangeDetection::parse("NAME_SET"), Some(ChangeDetection::NameSet));
        assert_eq!(ChangeDetection::parse("fuzzy"), None);
    }
}
