//! 程序入口：解析命令行、初始化日志、加载 Slint UI，并完成 VM 绑定

use std::{
    cell::RefCell,
    collections::HashMap,
    path::PathBuf,
    rc::Rc,
    time::{Duration, Instant},
};

use anyhow::Context;
use clap::Parser;
use slint::{ComponentHandle, Model, ModelRc, VecModel};
use tracing_subscriber::fmt::SubscriberBuilder;

use json_vis::model::data_core::{load_document, AppError, AppState, LoadOutcome, LoadTicket, LoadedDocument};
use json_vis::model::display_tree::{NodeId, TreeRow};
use json_vis::model::notify::NodeEvent;
use json_vis::model::search::Direction;
use json_vis::utils::clipboard::copy_to_clipboard;
use json_vis::vm::bridge::*;

slint::include_modules!();

/// 以可展开树的形式浏览 JSON 文档，支持增量搜索与匹配跳转
#[derive(Parser, Debug)]
#[command(name = "json_vis", version, about)]
struct Cli {
    /// 启动时自动加载的 JSON 文件
    file: Option<PathBuf>,

    /// 日志级别：error / warn / info / debug / trace
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// 展开祖先后等待多久再滚动到目标行（毫秒）
    #[arg(long, default_value_t = REVEAL_SCROLL_DELAY_MS)]
    reveal_delay_ms: u64,
}

fn to_row_data(row: &TreeRow, current: Option<NodeId>) -> TreeNodeData {
    TreeNodeData {
        label: row.label.as_str().into(),
        depth: row.depth as i32,
        expandable: row.expandable,
        expanded: row.expanded,
        matched: row.matched,
        current: current == Some(row.id),
    }
}

/// UI 行模型与显示树之间的绑定：匹配变化就地更新行，展开变化则整体重排
struct RowBinding {
    model: Rc<VecModel<TreeNodeData>>,
    rows: Vec<TreeRow>,
    index: HashMap<NodeId, usize>,
    structure_dirty: bool,
    current: Option<NodeId>,
    selected: Option<NodeId>,
}

impl RowBinding {
    fn new(model: Rc<VecModel<TreeNodeData>>) -> Self {
        Self {
            model,
            rows: Vec::new(),
            index: HashMap::new(),
            structure_dirty: false,
            current: None,
            selected: None,
        }
    }

    /// 观察者回调：在 AppState 修改节点时同步调用
    fn apply(&mut self, event: &NodeEvent) {
        match *event {
            NodeEvent::Matched { id, matched } => {
                if let Some(&row) = self.index.get(&id) {
                    self.rows[row].matched = matched;
                    if let Some(mut data) = self.model.row_data(row) {
                        data.matched = matched;
                        self.model.set_row_data(row, data);
                    }
                }
            }
            NodeEvent::Expanded { .. } => self.structure_dirty = true,
        }
    }

    fn rebuild(&mut self, state: &AppState) {
        self.current = state.search().current();
        self.rows = state.visible_rows();
        self.index = self.rows.iter().enumerate().map(|(i, r)| (r.id, i)).collect();
        let data: Vec<TreeNodeData> = self.rows.iter().map(|r| to_row_data(r, self.current)).collect();
        self.model.set_vec(data);
        self.structure_dirty = false;
    }

    /// 事件处理结束后调用：必要时重排，否则只更新当前匹配的高亮
    fn flush(&mut self, state: &AppState) {
        if self.structure_dirty {
            self.rebuild(state);
            return;
        }
        let current = state.search().current();
        if current == self.current {
            return;
        }
        for id in [self.current, current].into_iter().flatten() {
            if let Some(&row) = self.index.get(&id) {
                if let Some(mut data) = self.model.row_data(row) {
                    data.current = current == Some(id);
                    self.model.set_row_data(row, data);
                }
            }
        }
        self.current = current;
    }

    fn row_of(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    fn id_at(&self, row: i32) -> Option<NodeId> {
        usize::try_from(row).ok().and_then(|r| self.rows.get(r)).map(|r| r.id)
    }

    fn selected_row(&self) -> i32 {
        self.selected
            .and_then(|id| self.row_of(id))
            .map_or(-1, |r| r as i32)
    }
}

/// VM桥接器：管理UI与数据层的交互
#[derive(Clone)]
struct ViewModelBridge {
    app_state: Rc<RefCell<AppState>>,
    rows: Rc<RefCell<RowBinding>>,
    reveal_delay: Duration,
}

impl ViewModelBridge {
    /// 创建新的VM桥接器并绑定所有回调
    fn new(app_window: &AppWindow, app_state: Rc<RefCell<AppState>>, reveal_delay: Duration) -> Self {
        let model = Rc::new(VecModel::<TreeNodeData>::default());
        app_window.set_tree_model(ModelRc::from(model.clone()));

        let rows = Rc::new(RefCell::new(RowBinding::new(model)));
        {
            let rows = rows.clone();
            app_state
                .borrow_mut()
                .subscribe(move |event| rows.borrow_mut().apply(event));
        }

        let bridge = Self { app_state, rows, reveal_delay };
        bridge.setup_callbacks(app_window);
        bridge
    }

    /// 设置所有UI回调函数
    fn setup_callbacks(&self, app_window: &AppWindow) {
        // === 打开文件 ===
        {
            let bridge = self.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_load_file(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    bridge.handle_load_file(&app_window);
                }
            });
        }

        // === 搜索框编辑 ===
        {
            let bridge = self.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_search_changed(move |text| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    bridge.handle_search_changed(&app_window, text.as_str());
                }
            });
        }

        // === 上一个/下一个/回车 ===
        {
            let bridge = self.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_search_step(move |step| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    bridge.handle_search_step(&app_window, Direction::from_step(step));
                }
            });
        }

        // === 行选择 ===
        {
            let bridge = self.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_row_selected(move |row| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    bridge.handle_row_selected(&app_window, row);
                }
            });
        }

        // === 节点展开/折叠 ===
        {
            let bridge = self.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_toggle_node_expanded(move |row| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    bridge.handle_toggle_node_expanded(&app_window, row);
                }
            });
        }

        // === 复制选中子树 ===
        {
            let bridge = self.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_copy_pressed(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    bridge.handle_copy_pressed(&app_window);
                }
            });
        }
    }

    /// 初始化UI状态
    fn initialize_ui(&self, app_window: &AppWindow) {
        app_window.set_status_message(STATUS_READY.into());
        app_window.set_current_path("".into());
        app_window.set_selected_json_path("".into());
        app_window.set_performance_info("".into());
        app_window.set_match_status("0/0".into());
        app_window.set_selected_row(-1);
        app_window.set_document_loaded(false);
    }

    /// 显示文件选择对话框
    fn show_file_dialog() -> Option<PathBuf> {
        use rfd::FileDialog;

        let file_path = FileDialog::new()
            .add_filter("JSON文件", &["json"])
            .add_filter("所有文件", &["*"])
            .set_title("打开 JSON 文件")
            .pick_file();

        match file_path {
            Some(path) => {
                tracing::info!("用户选择了文件: {}", path.display());
                Some(path)
            }
            None => {
                tracing::info!("用户取消了文件选择");
                None
            }
        }
    }

    fn handle_load_file(&self, app_window: &AppWindow) {
        match Self::show_file_dialog() {
            Some(path) => self.start_load(app_window, path),
            None => app_window.set_status_message(STATUS_NO_FILE.into()),
        }
    }

    /// 在后台线程读取、解析并投影文档，完成后回到UI线程落地
    fn start_load(&self, app_window: &AppWindow, path: PathBuf) {
        let ticket = self.app_state.borrow_mut().begin_load();
        app_window.set_status_message(STATUS_LOADING.into());
        tracing::info!("开始加载: {}", path.display());

        let (tx, rx) = tokio::sync::oneshot::channel();
        std::thread::spawn(move || {
            let start_time = Instant::now();
            let result = load_document(&path);
            // 接收端已丢弃说明窗口已关闭
            let _ = tx.send((result, start_time.elapsed()));
        });

        let bridge = self.clone();
        let app_window_weak = app_window.as_weak();
        let spawned = slint::spawn_local(async move {
            let Ok((result, elapsed)) = rx.await else {
                tracing::error!("加载线程意外退出");
                return;
            };
            if let Some(app_window) = app_window_weak.upgrade() {
                bridge.finish_load(&app_window, ticket, result, elapsed);
            }
        });
        if let Err(e) = spawned {
            tracing::error!("无法调度加载任务: {}", e);
            app_window.set_status_message(format!("{}{}", STATUS_ERROR_PREFIX, e).into());
        }
    }

    fn finish_load(
        &self,
        app_window: &AppWindow,
        ticket: LoadTicket,
        result: Result<LoadedDocument, AppError>,
        elapsed: Duration,
    ) {
        let outcome = self.app_state.borrow_mut().complete_load(ticket, result);
        match outcome {
            Ok(LoadOutcome::Installed { node_count }) => {
                {
                    let state = self.app_state.borrow();
                    let mut rows = self.rows.borrow_mut();
                    rows.selected = None;
                    rows.rebuild(&state);

                    let path_str = state
                        .source_path
                        .as_ref()
                        .map(|p| p.to_string_lossy().to_string())
                        .unwrap_or_default();
                    app_window.set_current_path(path_str.into());
                    app_window.set_match_status(state.search_status().into());
                }
                app_window.set_search_text("".into());
                app_window.set_selected_row(-1);
                app_window.set_selected_json_path("".into());
                app_window.set_document_loaded(true);
                app_window.set_performance_info(format_load_info(elapsed, node_count).into());
                app_window.set_status_message(STATUS_LOADED.into());
                tracing::info!("文件加载成功: {} 个节点，耗时: {}ms", node_count, elapsed.as_millis());
            }
            Ok(LoadOutcome::Superseded) => {
                tracing::debug!("加载结果已被更新的请求取代");
            }
            Err(e) => {
                // 保留之前显示的树与搜索状态
                app_window.set_status_message(format_error(&e).into());
                tracing::error!("文件加载失败: {}", e);
            }
        }
    }

    fn handle_search_changed(&self, app_window: &AppWindow, text: &str) {
        let start_time = Instant::now();
        let target = self.app_state.borrow_mut().on_query_changed(text);
        self.sync_view(app_window, target);

        let match_status = self.app_state.borrow().search_status();
        app_window.set_status_message(format_search_status(text, &match_status).into());
        tracing::info!("搜索: {:?} -> {}，耗时: {}ms", text, match_status, start_time.elapsed().as_millis());
    }

    fn handle_search_step(&self, app_window: &AppWindow, direction: Direction) {
        let target = self.app_state.borrow_mut().on_search_step(direction);
        self.sync_view(app_window, target);
    }

    /// 刷新行模型；若有目标则选中并在布局完成后滚动到它
    fn sync_view(&self, app_window: &AppWindow, target: Option<NodeId>) {
        {
            let state = self.app_state.borrow();
            let mut rows = self.rows.borrow_mut();
            if target.is_some() {
                rows.selected = target;
            }
            rows.flush(&state);
            app_window.set_match_status(state.search_status().into());
            app_window.set_selected_row(rows.selected_row());
        }
        if let Some(target) = target {
            self.show_selection_path(app_window, target);
            self.scroll_into_view(app_window, target);
        }
    }

    fn scroll_into_view(&self, app_window: &AppWindow, target: NodeId) {
        let Some(row) = self.rows.borrow().row_of(target) else {
            return;
        };
        let app_window_weak = app_window.as_weak();
        slint::Timer::single_shot(self.reveal_delay, move || {
            if let Some(app_window) = app_window_weak.upgrade() {
                app_window.invoke_scroll_to_row(row as i32);
            }
        });
    }

    fn show_selection_path(&self, app_window: &AppWindow, id: NodeId) {
        let path = self
            .app_state
            .borrow()
            .node(id)
            .map(|n| n.path().to_string())
            .unwrap_or_default();
        app_window.set_selected_json_path(path.into());
    }

    fn handle_row_selected(&self, app_window: &AppWindow, row: i32) {
        let Some(id) = self.rows.borrow().id_at(row) else {
            return;
        };
        self.rows.borrow_mut().selected = Some(id);
        app_window.set_selected_row(row);
        self.show_selection_path(app_window, id);
    }

    fn handle_toggle_node_expanded(&self, app_window: &AppWindow, row: i32) {
        let Some(id) = self.rows.borrow().id_at(row) else {
            return;
        };
        let expanded = self.app_state.borrow_mut().toggle_node_expanded(id);
        self.sync_view(app_window, None);
        tracing::debug!("节点 {:?} 展开状态: {:?}", id, expanded);
    }

    /// 复制选中节点的完整 JSON
    fn handle_copy_pressed(&self, app_window: &AppWindow) {
        let Some(id) = self.rows.borrow().selected else {
            app_window.set_status_message(STATUS_NOTHING_SELECTED.into());
            return;
        };

        let extracted = self.app_state.borrow().extract_node_pretty(id);
        let text = match extracted {
            Ok(text) => text,
            Err(e) => {
                app_window.set_status_message(format_error(&e).into());
                tracing::error!("提取子树失败: {}", e);
                return;
            }
        };

        match copy_to_clipboard(&text) {
            Ok(()) => {
                app_window.set_status_message(STATUS_COPIED.into());
                tracing::info!("内容已复制到剪贴板，长度: {} 字符", text.len());
            }
            Err(e) => {
                app_window.set_status_message(format_error(&e).into());
                tracing::error!("复制失败: {}", e);
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志输出
    let _ = SubscriberBuilder::default()
        .with_max_level(cli.log_level)
        .try_init();

    let app = AppWindow::new().context("UI 初始化失败")?;
    let state = Rc::new(RefCell::new(AppState::default()));

    // 创建VM桥接器并绑定UI回调
    let bridge = ViewModelBridge::new(&app, state, Duration::from_millis(cli.reveal_delay_ms));
    bridge.initialize_ui(&app);

    if let Some(path) = cli.file {
        bridge.start_load(&app, path);
    }

    tracing::info!("应用启动成功，UI已初始化");
    app.run().context("事件循环异常退出")?;
    Ok(())
}
