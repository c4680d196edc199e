//! 性能基准测试模块
//!
//! 测量大文档的解析、显示树投影、搜索与路径展开耗时

use std::time::Instant;

use serde::Serialize;
use serde_json::{json, Value};

use crate::model::display_tree::project_root;
use crate::model::reveal::reveal_in_forest;
use crate::model::search::{Direction, SearchState};
use crate::model::source::SourceValue;

/// 性能测试结果
#[derive(Debug, Serialize)]
pub struct PerformanceResult {
    pub operation: String,
    pub duration_ms: u128,
    pub success: bool,
    pub details: String,
}

impl PerformanceResult {
    pub fn new(operation: &str, duration_ms: u128, success: bool, details: &str) -> Self {
        Self {
            operation: operation.to_string(),
            duration_ms,
            success,
            details: details.to_string(),
        }
    }
}

/// 生成大型测试JSON数据
pub fn generate_large_json(depth: usize, width: usize) -> Value {
    fn create_nested_object(current_depth: usize, max_depth: usize, width: usize) -> Value {
        if current_depth >= max_depth {
            return json!("leaf");
        }

        let mut obj = serde_json::Map::new();
        for i in 0..width {
            let key = format!("field_{}", i);
            let value = match i % 5 {
                0 => json!(format!("value_{}", i)),
                1 => json!(i as i64),
                2 => json!(i % 2 == 0),
                3 => json!([1, 2, 3, i]),
                _ => create_nested_object(current_depth + 1, max_depth, width / 2),
            };
            obj.insert(key, value);
        }
        Value::Object(obj)
    }

    let mut root = serde_json::Map::new();
    root.insert("metadata".to_string(), json!({
        "depth": depth,
        "width": width,
        "description": "synthetic document"
    }));
    root.insert("data".to_string(), create_nested_object(0, depth, width));

    let items: Vec<Value> = (0..width * 10)
        .map(|i| json!({
            "id": i,
            "name": format!("item_{}", i),
            "value": i * 2,
            "active": i % 3 == 0
        }))
        .collect();
    root.insert("items".to_string(), json!(items));

    Value::Object(root)
}

/// 测试JSON解析性能
pub fn benchmark_json_parsing(json_str: &str) -> PerformanceResult {
    let start = Instant::now();
    let parse_result = serde_json::from_str::<Value>(json_str);
    let duration = start.elapsed();

    match parse_result {
        Ok(_) => PerformanceResult::new(
            "JSON解析",
            duration.as_millis(),
            true,
            &format!("解析了 {} 字节的JSON", json_str.len()),
        ),
        Err(e) => PerformanceResult::new(
            "JSON解析",
            duration.as_millis(),
            false,
            &format!("解析失败: {}", e),
        ),
    }
}

/// 测试源文本解析 + 显示树投影性能
pub fn benchmark_projection(json_str: &str) -> PerformanceResult {
    let start = Instant::now();
    let root = SourceValue::parse(json_str).map(|v| project_root(&v));
    let duration = start.elapsed();

    match root {
        Ok(root) => PerformanceResult::new(
            "显示树投影",
            duration.as_millis(),
            true,
            &format!("构建了 {} 个节点", root.subtree_len()),
        ),
        Err(e) => PerformanceResult::new(
            "显示树投影",
            duration.as_millis(),
            false,
            &format!("解析失败: {}", e),
        ),
    }
}

/// 测试搜索 + 逐个展开全部匹配的性能
pub fn benchmark_search(json_str: &str, query: &str) -> PerformanceResult {
    let source = match SourceValue::parse(json_str) {
        Ok(source) => source,
        Err(e) => {
            return PerformanceResult::new(
                &format!("搜索: {}", query),
                0,
                false,
                &format!("解析失败: {}", e),
            )
        }
    };
    let mut forest = vec![project_root(&source)];
    let mut search = SearchState::default();

    let start = Instant::now();
    let first = search.run_search(&mut forest, query, &mut ());
    let mut revealed = 0usize;
    if let Some(first) = first {
        let mut target = first;
        loop {
            if reveal_in_forest(&mut forest, target, &mut ()) {
                revealed += 1;
            }
            match search.advance(Direction::Next) {
                Some(next) if next != first => target = next,
                _ => break,
            }
        }
    }
    let duration = start.elapsed();

    PerformanceResult::new(
        &format!("搜索: {}", query),
        duration.as_millis(),
        revealed == search.matches().len(),
        &format!("匹配 {} 个，展开 {} 个", search.matches().len(), revealed),
    )
}

/// 运行综合性能测试
pub fn run_performance_suite() -> Vec<PerformanceResult> {
    let mut results = Vec::new();

    let test_cases = [
        (3, 10), // 小型：深度3，宽度10
        (4, 20), // 中型：深度4，宽度20
        (5, 30), // 大型：深度5，宽度30
    ];

    for (depth, width) in test_cases {
        tracing::info!("测试规模：深度{}，宽度{}", depth, width);

        let json_data = generate_large_json(depth, width);
        let json_str = match serde_json::to_string(&json_data) {
            Ok(json_str) => json_str,
            Err(e) => {
                results.push(PerformanceResult::new(
                    "JSON序列化",
                    0,
                    false,
                    &format!("序列化失败: {}", e),
                ));
                continue;
            }
        };
        results.push(benchmark_json_parsing(&json_str));
        results.push(benchmark_projection(&json_str));
        results.push(benchmark_search(&json_str, "item_1"));
        results.push(benchmark_search(&json_str, "[4]"));
    }

    results
}
