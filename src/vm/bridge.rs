//! VM桥接层：连接Slint UI与AppState数据模型
//!
//! 注意：回调绑定在main.rs中，因为依赖于Slint生成的类型
//! 这里只提供公共常量与纯文本格式化

use std::time::Duration;

// === 常量定义（消除魔法值） ===
pub const STATUS_READY: &str = "就绪";
pub const STATUS_NO_FILE: &str = "未选择文件";
pub const STATUS_LOADING: &str = "正在加载文件...";
pub const STATUS_LOADED: &str = "文件加载完成";
pub const STATUS_COPIED: &str = "已复制到剪贴板";
pub const STATUS_NOTHING_SELECTED: &str = "错误: 没有选中的节点";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";

/// 展开祖先后，等待布局刷新再滚动的默认时长（毫秒）
pub const REVEAL_SCROLL_DELAY_MS: u64 = 30;

/// 加载耗时与节点数
pub fn format_load_info(elapsed: Duration, node_count: usize) -> String {
    format!("加载: {}ms | 节点: {}", elapsed.as_millis(), node_count)
}

/// 搜索结果状态行
pub fn format_search_status(query: &str, match_status: &str) -> String {
    if query.trim().is_empty() {
        "已清除搜索".to_string()
    } else {
        format!("搜索: {} ({})", query, match_status)
    }
}

pub fn format_error(e: &dyn std::error::Error) -> String {
    format!("{}{}", STATUS_ERROR_PREFIX, e)
}
