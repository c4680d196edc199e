//! 节点状态变更通知：展开/匹配标志只是普通字段，变更通过观察者广播给UI层

use std::fmt;

use crate::model::display_tree::NodeId;

/// 单个节点的UI状态变更
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEvent {
    Expanded { id: NodeId, expanded: bool },
    Matched { id: NodeId, matched: bool },
}

impl NodeEvent {
    pub fn id(&self) -> NodeId {
        match *self {
            NodeEvent::Expanded { id, .. } | NodeEvent::Matched { id, .. } => id,
        }
    }
}

/// 接收节点状态变更。只有值真正改变时才会被调用
pub trait NodeObserver {
    fn notify(&mut self, event: NodeEvent);
}

/// 不关心变更
impl NodeObserver for () {
    fn notify(&mut self, _event: NodeEvent) {}
}

/// 记录全部变更（测试与批量刷新使用）
impl NodeObserver for Vec<NodeEvent> {
    fn notify(&mut self, event: NodeEvent) {
        self.push(event);
    }
}

/// 回调列表：AppState 持有，UI 通过 subscribe 注册
#[derive(Default)]
pub struct Observers {
    callbacks: Vec<Box<dyn FnMut(&NodeEvent)>>,
}

impl Observers {
    pub fn subscribe(&mut self, callback: impl FnMut(&NodeEvent) + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl NodeObserver for Observers {
    fn notify(&mut self, event: NodeEvent) {
        for callback in &mut self.callbacks {
            callback(&event);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}
