//! 搜索引擎：按标签子串（忽略大小写）收集匹配节点，并维护可循环的当前匹配游标

use crate::model::display_tree::{DisplayNode, NodeId};
use crate::model::notify::NodeObserver;

/// 导航方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    /// 按钮/回调传入的整数步长：负数为上一个，其它为下一个
    pub fn from_step(step: i32) -> Self {
        if step < 0 {
            Direction::Previous
        } else {
            Direction::Next
        }
    }
}

/// matches 与 cursor 总是一起更新：cursor 为 Some 当且仅当 matches 非空
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchState {
    query: String,
    matches: Vec<NodeId>,
    cursor: Option<usize>,
}

impl SearchState {
    /// 对整片森林重新计算匹配集，整体覆盖所有节点的匹配标志。返回当前匹配
    pub fn run_search(
        &mut self,
        forest: &mut [DisplayNode],
        query: &str,
        observer: &mut dyn NodeObserver,
    ) -> Option<NodeId> {
        self.matches.clear();
        self.cursor = None;

        if query.trim().is_empty() {
            self.query.clear();
            for root in forest.iter_mut() {
                root.walk_mut(&mut |node| {
                    node.set_match(false, observer);
                });
            }
            return None;
        }

        self.query = query.to_lowercase();
        let needle = self.query.as_str();
        let matches = &mut self.matches;
        for root in forest.iter_mut() {
            root.walk_mut(&mut |node| {
                let hit = node.label().to_lowercase().contains(needle);
                if hit {
                    matches.push(node.id());
                }
                node.set_match(hit, observer);
            });
        }

        if !self.matches.is_empty() {
            self.cursor = Some(0);
        }
        self.current()
    }

    /// 循环移动游标；没有匹配时不做任何事
    pub fn advance(&mut self, direction: Direction) -> Option<NodeId> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        let cur = self.cursor.unwrap_or(0);
        let next = match direction {
            Direction::Next => (cur + 1) % len,
            Direction::Previous => (cur + len - 1) % len,
        };
        self.cursor = Some(next);
        self.current()
    }

    /// 清空查询与匹配（不触碰节点标志，用于整棵树被替换时）
    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.cursor = None;
    }

    pub fn current(&self) -> Option<NodeId> {
        self.cursor.and_then(|i| self.matches.get(i).copied())
    }

    pub fn is_current(&self, id: NodeId) -> bool {
        self.current() == Some(id)
    }

    pub fn matches(&self) -> &[NodeId] {
        &self.matches
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// 外部约定的游标表示：无匹配时为 -1
    pub fn cursor_index(&self) -> isize {
        self.cursor.map_or(-1, |c| c as isize)
    }

    /// 规范化（小写）后的查询
    pub fn query(&self) -> &str {
        &self.query
    }

    /// "位置/总数"，位置从 1 开始；无匹配为 "0/0"
    pub fn status(&self) -> String {
        match self.cursor {
            Some(c) => format!("{}/{}", c + 1, self.matches.len()),
            None => "0/0".to_string(),
        }
    }
}
