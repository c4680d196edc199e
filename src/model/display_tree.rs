//! 显示树（Display Tree）：把 JSON 值投影成带标签、可展开的节点树

use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::notify::{NodeEvent, NodeObserver};
use crate::model::source::SourceValue;

/// 顶层节点固定使用的属性名
pub const ROOT_PROPERTY_NAME: &str = "Root";

/// JSON 节点类型（与 UI 展示解耦）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

impl NodeKind {
    pub fn of(v: &SourceValue) -> Self {
        match v {
            SourceValue::Object { .. } => NodeKind::Object,
            SourceValue::Array { .. } => NodeKind::Array,
            SourceValue::String(_) => NodeKind::String,
            SourceValue::Number(_) => NodeKind::Number,
            SourceValue::Bool(_) => NodeKind::Bool,
            SourceValue::Null => NodeKind::Null,
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Object | NodeKind::Array)
    }
}

/// 节点身份：`tree` 在每次投影时全局唯一，`index` 为先序编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    tree: u64,
    index: usize,
}

impl NodeId {
    pub fn tree(&self) -> u64 {
        self.tree
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

static NEXT_TREE: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub struct DisplayNode {
    id: NodeId,
    /// 构造时计算，之后不再变化
    label: String,
    kind: NodeKind,
    /// RFC 9535 JSONPath（用于复制子树）
    path: String,
    /// 标量为 None；对象/数组为 Some（可能为空）
    children: Option<Vec<DisplayNode>>,
    expanded: bool,
    matched: bool,
}

impl DisplayNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn children(&self) -> Option<&[DisplayNode]> {
        self.children.as_deref()
    }

    pub fn children_mut(&mut self) -> Option<&mut [DisplayNode]> {
        self.children.as_deref_mut()
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_match(&self) -> bool {
        self.matched
    }

    /// 有可展开的子节点
    pub fn is_expandable(&self) -> bool {
        self.children.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// 设置展开状态；值变化时通知观察者。返回是否发生变化
    pub fn set_expanded(&mut self, expanded: bool, observer: &mut dyn NodeObserver) -> bool {
        if self.expanded == expanded {
            return false;
        }
        self.expanded = expanded;
        observer.notify(NodeEvent::Expanded { id: self.id, expanded });
        true
    }

    /// 设置匹配状态；值变化时通知观察者。返回是否发生变化
    pub fn set_match(&mut self, matched: bool, observer: &mut dyn NodeObserver) -> bool {
        if self.matched == matched {
            return false;
        }
        self.matched = matched;
        observer.notify(NodeEvent::Matched { id: self.id, matched });
        true
    }

    /// 子树节点总数（含自身）
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(DisplayNode::subtree_len)
            .sum::<usize>()
    }

    /// 先序遍历
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a DisplayNode)) {
        f(self);
        for child in self.children.iter().flatten() {
            child.walk(f);
        }
    }

    /// 先序遍历（可变）
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut DisplayNode)) {
        f(self);
        for child in self.children.iter_mut().flatten() {
            child.walk_mut(f);
        }
    }

    /// 按身份查找子树中的节点
    pub fn find(&self, id: NodeId) -> Option<&DisplayNode> {
        if self.id.tree != id.tree {
            return None;
        }
        if self.id == id {
            return Some(self);
        }
        self.children.iter().flatten().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut DisplayNode> {
        if self.id.tree != id.tree {
            return None;
        }
        if self.id == id {
            return Some(self);
        }
        self.children
            .iter_mut()
            .flatten()
            .find_map(|c| c.find_mut(id))
    }
}

/// 节点值摘要（不含属性名）
pub fn display_value(v: &SourceValue) -> String {
    match v {
        SourceValue::Object { .. } => {
            if let Some(id) = v.get("id") {
                format!("(id: {})", raw_text(id))
            } else if let Some(name) = v.get("name") {
                format!("(name: {})", raw_text(name))
            } else {
                "{ }".to_string()
            }
        }
        SourceValue::Array { items, .. } => format!("[{}]", items.len()),
        // 直接加引号，不做 JSON 转义
        SourceValue::String(s) => format!("\"{}\"", s),
        SourceValue::Number(n) => n.to_string(),
        SourceValue::Bool(b) => b.to_string(),
        SourceValue::Null => "null".to_string(),
    }
}

/// `id`/`name` 属性的原文：字符串为解码内容，数字与容器为源文本，
/// 布尔为 `True`/`False`，null 为空
pub fn raw_text(v: &SourceValue) -> String {
    match v {
        SourceValue::String(s) => s.clone(),
        SourceValue::Number(n) => n.to_string(),
        SourceValue::Object { raw, .. } | SourceValue::Array { raw, .. } => raw.to_string(),
        SourceValue::Bool(true) => "True".to_string(),
        SourceValue::Bool(false) => "False".to_string(),
        SourceValue::Null => String::new(),
    }
}

/// 节点标签：属性名为空时只显示值；容器用空格分隔，标量用冒号分隔
pub fn label_for(property_name: &str, v: &SourceValue) -> String {
    let display = display_value(v);
    if property_name.is_empty() {
        display
    } else if NodeKind::of(v).is_container() {
        format!("{} {}", property_name, display)
    } else {
        format!("{}: {}", property_name, display)
    }
}

struct Projector {
    tree: u64,
    next: usize,
}

impl Projector {
    fn node(&mut self, property_name: &str, path: String, v: &SourceValue) -> DisplayNode {
        let id = NodeId { tree: self.tree, index: self.next };
        self.next += 1;
        let label = label_for(property_name, v);
        let children: Option<Vec<DisplayNode>> = match v {
            SourceValue::Object { entries, .. } => Some(
                entries
                    .iter()
                    .map(|(k, child)| self.node(k, field_path(&path, k), child))
                    .collect(),
            ),
            SourceValue::Array { items, .. } => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, child)| {
                        self.node(&format!("[{}]", idx), format!("{}[{}]", path, idx), child)
                    })
                    .collect(),
            ),
            _ => None,
        };
        DisplayNode {
            id,
            label,
            kind: NodeKind::of(v),
            path,
            children,
            expanded: false,
            matched: false,
        }
    }
}

// JSONPath 字段含特殊字符时使用 bracket-notation
fn field_path(parent: &str, key: &str) -> String {
    let shorthand = key.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if shorthand {
        format!("{}.{}", parent, key)
    } else {
        format!("{}['{}']", parent, key.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

/// 把一个 JSON 值投影为显示树。每次调用都会分配新的树身份
pub fn project(property_name: &str, v: &SourceValue) -> DisplayNode {
    let mut projector = Projector {
        tree: NEXT_TREE.fetch_add(1, Ordering::Relaxed),
        next: 0,
    };
    projector.node(property_name, "$".to_string(), v)
}

/// 文档顶层投影
pub fn project_root(v: &SourceValue) -> DisplayNode {
    project(ROOT_PROPERTY_NAME, v)
}

/// 列表式树控件的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub id: NodeId,
    pub label: String,
    pub depth: usize,
    pub expandable: bool,
    pub expanded: bool,
    pub matched: bool,
}

/// 按展开状态展平森林：先序，只有父节点展开时才包含子节点
pub fn visible_rows(forest: &[DisplayNode]) -> Vec<TreeRow> {
    fn push(out: &mut Vec<TreeRow>, node: &DisplayNode, depth: usize) {
        out.push(TreeRow {
            id: node.id,
            label: node.label.clone(),
            depth,
            expandable: node.is_expandable(),
            expanded: node.expanded,
            matched: node.matched,
        });
        if node.expanded {
            for child in node.children.iter().flatten() {
                push(out, child, depth + 1);
            }
        }
    }

    let mut out = Vec::new();
    for root in forest {
        push(&mut out, root, 0);
    }
    out
}
