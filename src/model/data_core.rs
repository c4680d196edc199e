//! AppState：文档会话状态（加载、显示树、搜索游标、路径展开）

use std::path::{Path, PathBuf};

use jsonpath_rust::JsonPath; // 提供 query 扩展
use serde_json::Value;
use thiserror::Error;

use crate::model::display_tree::{project_root, visible_rows, DisplayNode, NodeId, TreeRow};
use crate::model::notify::{NodeEvent, Observers};
use crate::model::reveal::reveal_in_forest;
use crate::model::search::{Direction, SearchState};
use crate::model::source::SourceValue;
use crate::utils::fs::{parse_json_slice, read_json_bytes};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("JSONPath错误: {0}")]
    JsonPath(String),
    #[error("状态错误: {0}")]
    State(String),
}

/// 一次完整加载的结果，整体移交给UI线程（不会暴露半棵树）
#[derive(Debug)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub dom: Value,
    pub forest: Vec<DisplayNode>,
}

impl LoadedDocument {
    pub fn node_count(&self) -> usize {
        self.forest.iter().map(DisplayNode::subtree_len).sum()
    }
}

/// 读取、解析并投影文档。可在任意线程调用
pub fn load_document(p: &Path) -> Result<LoadedDocument, AppError> {
    let bytes = read_json_bytes(p)?;
    // 显示树取自源文本（数字、重复键原样保留），DOM 只用于 JSONPath 复制
    let forest = vec![project_root(&SourceValue::from_slice(&bytes)?)];
    let dom = parse_json_slice(&bytes)?;
    Ok(LoadedDocument {
        path: p.to_path_buf(),
        dom,
        forest,
    })
}

/// 加载序号：只有最后一次发起的加载可以落地
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Installed { node_count: usize },
    /// 之后又发起了新的加载，本次结果被丢弃
    Superseded,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub source_path: Option<PathBuf>,
    pub dom: Option<Value>,
    forest: Vec<DisplayNode>,
    search: SearchState,
    observers: Observers,
    load_seq: u64,
}

impl AppState {
    /// 同步加载JSON文件并替换显示树。失败时保留之前的文档与搜索状态
    pub fn load_file(&mut self, p: &Path) -> Result<usize, AppError> {
        let ticket = self.begin_load();
        match self.complete_load(ticket, load_document(p))? {
            LoadOutcome::Installed { node_count } => Ok(node_count),
            LoadOutcome::Superseded => Err(AppError::State("加载已被新的请求取代".into())),
        }
    }

    /// 登记一次新的加载，之前未完成的加载随之作废
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_seq += 1;
        LoadTicket(self.load_seq)
    }

    /// 在UI线程上落地后台加载的结果
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<LoadedDocument, AppError>,
    ) -> Result<LoadOutcome, AppError> {
        if ticket.0 != self.load_seq {
            tracing::info!("丢弃过期的加载结果 #{} (最新 #{})", ticket.0, self.load_seq);
            return Ok(LoadOutcome::Superseded);
        }
        let doc = result?;
        let node_count = doc.node_count();
        self.install(doc);
        Ok(LoadOutcome::Installed { node_count })
    }

    fn install(&mut self, doc: LoadedDocument) {
        // 搜索状态与树一起替换，旧节点身份不会残留在匹配列表中
        self.search.clear();
        self.forest = doc.forest;
        self.dom = Some(doc.dom);
        self.source_path = Some(doc.path);
    }

    pub fn is_loaded(&self) -> bool {
        !self.forest.is_empty()
    }

    pub fn forest(&self) -> &[DisplayNode] {
        &self.forest
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    /// 注册节点状态变更回调（UI 据此刷新行）
    pub fn subscribe(&mut self, callback: impl FnMut(&NodeEvent) + 'static) {
        self.observers.subscribe(callback);
    }

    /// 搜索框每次编辑：重新搜索，有匹配时展开并返回当前匹配
    pub fn on_query_changed(&mut self, text: &str) -> Option<NodeId> {
        let current = self
            .search
            .run_search(&mut self.forest, text, &mut self.observers);
        tracing::debug!("搜索 {:?}: {} 个匹配", text, self.search.matches().len());
        self.reveal_current(current)
    }

    /// 上一个/下一个：循环移动游标并展开目标
    pub fn on_search_step(&mut self, direction: Direction) -> Option<NodeId> {
        let current = self.search.advance(direction);
        self.reveal_current(current)
    }

    fn reveal_current(&mut self, current: Option<NodeId>) -> Option<NodeId> {
        let target = current?;
        self.reveal(target).then_some(target)
    }

    /// 展开目标节点的全部祖先；目标不在当前树中时返回 false
    pub fn reveal(&mut self, target: NodeId) -> bool {
        reveal_in_forest(&mut self.forest, target, &mut self.observers)
    }

    /// 用户手动切换展开状态，返回新的状态
    pub fn toggle_node_expanded(&mut self, id: NodeId) -> Option<bool> {
        let node = self.forest.iter_mut().find_map(|r| r.find_mut(id))?;
        let expanded = !node.is_expanded();
        node.set_expanded(expanded, &mut self.observers);
        Some(expanded)
    }

    pub fn node(&self, id: NodeId) -> Option<&DisplayNode> {
        self.forest.iter().find_map(|r| r.find(id))
    }

    pub fn node_count(&self) -> usize {
        self.forest.iter().map(DisplayNode::subtree_len).sum()
    }

    /// "位置/总数"
    pub fn search_status(&self) -> String {
        self.search.status()
    }

    pub fn visible_rows(&self) -> Vec<TreeRow> {
        visible_rows(&self.forest)
    }

    /// 按 JSONPath 提取第一个匹配节点的 pretty 字符串
    pub fn extract_subtree_pretty(&self, json_path: &str) -> Result<String, AppError> {
        let dom = self
            .dom
            .as_ref()
            .ok_or_else(|| AppError::State("DOM尚未加载".into()))?;
        let hits: Vec<&Value> = dom
            .query(json_path)
            .map_err(|e| AppError::JsonPath(e.to_string()))?;
        let first = hits
            .into_iter()
            .next()
            .ok_or_else(|| AppError::JsonPath("未匹配到任何节点".into()))?;
        Ok(serde_json::to_string_pretty(first)?)
    }

    /// 提取显示节点对应的JSON子树
    pub fn extract_node_pretty(&self, id: NodeId) -> Result<String, AppError> {
        let node = self
            .node(id)
            .ok_or_else(|| AppError::State("节点不在当前文档中".into()))?;
        self.extract_subtree_pretty(node.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, io::Write, rc::Rc};
    use tempfile::NamedTempFile;

    /// 创建临时JSON文件用于测试
    fn create_test_json_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("创建临时文件失败");
        file.write_all(content.as_bytes()).expect("写入临时文件失败");
        file
    }

    const SAMPLE: &str = r#"{"id": 7, "items": [1, "a", null]}"#;

    fn loaded(content: &str) -> (AppState, NamedTempFile) {
        let file = create_test_json_file(content);
        let mut state = AppState::default();
        state.load_file(file.path()).expect("加载文件失败");
        (state, file)
    }

    fn child_labels(node: &DisplayNode) -> Vec<&str> {
        node.children()
            .unwrap_or_default()
            .iter()
            .map(DisplayNode::label)
            .collect()
    }

    #[test]
    fn test_load_end_to_end() {
        let (state, file) = loaded(SAMPLE);

        assert_eq!(state.forest().len(), 1);
        let root = &state.forest()[0];
        assert_eq!(root.label(), "Root (id: 7)");
        assert_eq!(child_labels(root), vec!["id: 7", "items [3]"]);
        assert_eq!(
            child_labels(&root.children().unwrap()[1]),
            vec!["[0]: 1", "[1]: \"a\"", "[2]: null"]
        );
        assert_eq!(state.node_count(), 6);
        assert_eq!(state.source_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_load_keeps_source_text() {
        let (state, _file) = loaded("\u{feff}{\"id\": {\"k\": 1E5}, \"n\": 1.5E+2, \"n\": true}");

        let root = &state.forest()[0];
        assert_eq!(root.label(), "Root (id: {\"k\": 1E5})");
        assert_eq!(child_labels(root), vec!["id { }", "n: 1.5E+2", "n: true"]);
    }

    #[test]
    fn test_non_utf8_file_is_parse_error() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"[\"\xff\"]").unwrap();
        let mut state = AppState::default();
        assert!(matches!(state.load_file(file.path()), Err(AppError::Parse(_))));
        assert!(!state.is_loaded());
    }

    #[test]
    fn test_search_reveals_match() {
        let (mut state, _file) = loaded(SAMPLE);

        let target = state.on_query_changed("a").expect("应该有匹配");

        assert_eq!(state.node(target).map(DisplayNode::label), Some("[1]: \"a\""));
        assert_eq!(state.search_status(), "1/1");
        let labels: Vec<_> = state.visible_rows().into_iter().map(|r| r.label).collect();
        assert!(labels.contains(&"[1]: \"a\"".to_string()), "匹配节点应可见: {labels:?}");
    }

    #[test]
    fn test_search_step_cycles() {
        let (mut state, _file) = loaded(SAMPLE);
        let first = state.on_query_changed("[").unwrap();
        assert_eq!(state.search_status(), "1/4");

        let last = state.on_search_step(Direction::Previous).unwrap();
        assert_eq!(state.search_status(), "4/4");
        assert_eq!(state.node(last).map(DisplayNode::label), Some("[2]: null"));

        assert_eq!(state.on_search_step(Direction::Next), Some(first));
        assert_eq!(state.search_status(), "1/4");
    }

    #[test]
    fn test_clearing_query() {
        let (mut state, _file) = loaded(SAMPLE);
        state.on_query_changed("i");
        assert_eq!(state.on_query_changed(""), None);
        assert_eq!(state.search_status(), "0/0");
        assert_eq!(state.search().cursor_index(), -1);
        assert!(state.visible_rows().iter().all(|r| !r.matched));
    }

    #[test]
    fn test_failed_load_keeps_previous_state() {
        let (mut state, _file) = loaded(SAMPLE);
        let target = state.on_query_changed("a").unwrap();
        let before_rows = state.visible_rows();
        let before_search = state.search().clone();

        let dir = tempfile::tempdir().unwrap();
        let err = state.load_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));

        let bad = create_test_json_file("{not json");
        let err = state.load_file(bad.path()).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));

        assert_eq!(state.visible_rows(), before_rows);
        assert_eq!(state.search(), &before_search);
        assert_eq!(state.search().current(), Some(target));
    }

    #[test]
    fn test_reload_resets_search_state() {
        let (mut state, _file) = loaded(SAMPLE);
        let stale = state.on_query_changed("a").unwrap();

        let other = create_test_json_file(r#"{"name": "b"}"#);
        state.load_file(other.path()).unwrap();

        assert!(state.search().matches().is_empty());
        assert_eq!(state.search_status(), "0/0");
        assert_eq!(state.on_search_step(Direction::Next), None);
        assert!(!state.reveal(stale));
        assert_eq!(state.forest()[0].label(), "Root (name: b)");
    }

    #[test]
    fn test_superseded_load_is_discarded() {
        let (mut state, _file) = loaded(SAMPLE);
        let first = create_test_json_file("[1]");
        let second = create_test_json_file("[1, 2]");

        let t1 = state.begin_load();
        let t2 = state.begin_load();

        let outcome = state.complete_load(t2, load_document(second.path())).unwrap();
        assert_eq!(outcome, LoadOutcome::Installed { node_count: 3 });

        let outcome = state.complete_load(t1, load_document(first.path())).unwrap();
        assert_eq!(outcome, LoadOutcome::Superseded);
        assert_eq!(state.forest()[0].label(), "Root [2]");
    }

    #[test]
    fn test_superseded_error_is_ignored() {
        let (mut state, _file) = loaded(SAMPLE);
        let t1 = state.begin_load();
        let _t2 = state.begin_load();

        let dir = tempfile::tempdir().unwrap();
        let outcome = state.complete_load(t1, load_document(&dir.path().join("x.json")));
        assert!(matches!(outcome, Ok(LoadOutcome::Superseded)));
        assert_eq!(state.forest()[0].label(), "Root (id: 7)");
    }

    #[test]
    fn test_observers_see_match_and_expand_events() {
        let (mut state, _file) = loaded(SAMPLE);
        let events = Rc::new(RefCell::new(Vec::new()));
        {
            let events = events.clone();
            state.subscribe(move |e| events.borrow_mut().push(*e));
        }

        let target = state.on_query_changed("a").unwrap();

        let events = events.borrow();
        assert!(events.contains(&NodeEvent::Matched { id: target, matched: true }));
        let expanded = events
            .iter()
            .filter(|e| matches!(e, NodeEvent::Expanded { expanded: true, .. }))
            .count();
        assert_eq!(expanded, 2, "Root 与 items 应被展开");
    }

    #[test]
    fn test_toggle_node_expanded() {
        let (mut state, _file) = loaded(SAMPLE);
        let root = state.forest()[0].id();

        assert_eq!(state.toggle_node_expanded(root), Some(true));
        assert_eq!(state.visible_rows().len(), 3);
        assert_eq!(state.toggle_node_expanded(root), Some(false));
        assert_eq!(state.visible_rows().len(), 1);
    }

    #[test]
    fn test_extract_subtree() {
        let (state, _file) = loaded(r#"{"user": {"name": "张三", "age": 30}}"#);

        assert!(state.extract_subtree_pretty("$").is_ok(), "提取根节点应该成功");
        let name = state.extract_subtree_pretty("$.user.name").expect("提取用户名应该成功");
        assert!(name.contains("张三"));

        let user = state.forest()[0].children().unwrap()[0].id();
        let pretty = state.extract_node_pretty(user).unwrap();
        assert!(pretty.contains("\"age\": 30"));
    }

    #[test]
    fn test_extract_without_document() {
        let state = AppState::default();
        assert!(matches!(state.extract_subtree_pretty("$"), Err(AppError::State(_))));
    }

    #[test]
    fn test_extract_missing_path() {
        let (state, _file) = loaded(SAMPLE);
        assert!(matches!(state.extract_subtree_pretty("$.nope"), Err(AppError::JsonPath(_))));
    }
}
