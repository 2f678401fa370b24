//! 页面操作分发
//!
//! 渲染后不再逐个元素重新绑定事件：容器只绑定一次，
//! 由 `(data-action, data-filename)` 两个属性解码出操作

use phf::phf_map;

use crate::models::{MoveDirection, RotateDirection};
use crate::ordering::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionKind {
    MoveUp,
    MoveDown,
    MoveToFirst,
    RotateLeft,
    RotateRight,
    Delete,
}

static ACTION_KINDS: phf::Map<&'static str, ActionKind> = phf_map! {
    "move-up" => ActionKind::MoveUp,
    "move-down" => ActionKind::MoveDown,
    "move-to-first" => ActionKind::MoveToFirst,
    "rotate-left" => ActionKind::RotateLeft,
    "rotate-right" => ActionKind::RotateRight,
    "delete" => ActionKind::Delete,
};

/// 针对单页的操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    MoveUp(String),
    MoveDown(String),
    MoveToFirst(String),
    RotateLeft(String),
    RotateRight(String),
    Delete(String),
}

impl PageAction {
    /// 从数据属性解码，未知操作或空文件名返回 None
    pub fn from_data_attrs(action: &str, filename: &str) -> Option<Self> {
        let filename = filename.trim();
        if filename.is_empty() {
            return None;
        }
        let kind = ACTION_KINDS.get(action.trim())?;
        let filename = filename.to_string();
        Some(match kind {
            ActionKind::MoveUp => PageAction::MoveUp(filename),
            ActionKind::MoveDown => PageAction::MoveDown(filename),
            ActionKind::MoveToFirst => PageAction::MoveToFirst(filename),
            ActionKind::RotateLeft => PageAction::RotateLeft(filename),
            ActionKind::RotateRight => PageAction::RotateRight(filename),
            ActionKind::Delete => PageAction::Delete(filename),
        })
    }

    /// 是否为已知的操作名
    pub fn is_action_name(action: &str) -> bool {
        ACTION_KINDS.contains_key(action)
    }

    pub fn filename(&self) -> &str {
        match self {
            PageAction::MoveUp(f)
            | PageAction::MoveDown(f)
            | PageAction::MoveToFirst(f)
            | PageAction::RotateLeft(f)
            | PageAction::RotateRight(f)
            | PageAction::Delete(f) => f,
        }
    }

    /// 本地相邻移动方向
    pub fn adjacent_direction(&self) -> Option<Direction> {
        match self {
            PageAction::MoveUp(_) => Some(Direction::Previous),
            PageAction::MoveDown(_) => Some(Direction::Next),
            _ => None,
        }
    }

    /// 对应的服务器端移动方向
    pub fn move_direction(&self) -> Option<MoveDirection> {
        match self {
            PageAction::MoveUp(_) => Some(MoveDirection::Up),
            PageAction::MoveDown(_) => Some(MoveDirection::Down),
            PageAction::MoveToFirst(_) => Some(MoveDirection::First),
            _ => None,
        }
    }

    pub fn rotate_direction(&self) -> Option<RotateDirection> {
        match self {
            PageAction::RotateLeft(_) => Some(RotateDirection::Left),
            PageAction::RotateRight(_) => Some(RotateDirection::Right),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_actions() {
        assert_eq!(
            PageAction::from_data_attrs("move-to-first", "003.jpg"),
            Some(PageAction::MoveToFirst("003.jpg".to_string()))
        );
        assert_eq!(
            PageAction::from_data_attrs("rotate-left", " 001.jpg "),
            Some(PageAction::RotateLeft("001.jpg".to_string()))
        );
    }

    #[test]
    fn test_decode_rejects_unknown_or_empty() {
        assert_eq!(PageAction::from_data_attrs("explode", "001.jpg"), None);
        assert_eq!(PageAction::from_data_attrs("delete", "  "), None);
        assert!(!PageAction::is_action_name("refresh"));
    }

    #[test]
    fn test_directions() {
        let up = PageAction::MoveUp("a.jpg".into());
        assert_eq!(up.adjacent_direction(), Some(Direction::Previous));
        assert_eq!(up.move_direction(), Some(MoveDirection::Up));
        assert_eq!(up.rotate_direction(), None);

        let first = PageAction::MoveToFirst("a.jpg".into());
        assert_eq!(first.adjacent_direction(), None);
        assert_eq!(first.move_direction(), Some(MoveDirection::First));

        let right = PageAction::RotateRight("a.jpg".into());
        assert_eq!(right.rotate_direction(), Some(RotateDirection::Right));
        assert_eq!(right.filename(), "a.jpg");
    }
}
