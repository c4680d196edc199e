//! JSON树查看器库
//!
//! 提供JSON文件加载、显示树投影、增量搜索与匹配跳转（路径展开）
//! 遵循MVVM架构模式：model 不依赖任何UI框架，UI 通过观察者接收节点状态变更

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::data_core::{load_document, AppError, AppState, LoadOutcome, LoadTicket, LoadedDocument};
pub use model::display_tree::{project, project_root, DisplayNode, NodeId, NodeKind, TreeRow};
pub use model::notify::{NodeEvent, NodeObserver};
pub use model::reveal::{reveal_in_forest, reveal_path};
pub use model::search::{Direction, SearchState};
pub use model::source::SourceValue;
