//! 路径展开：把目标节点的所有祖先标记为展开，使其在树控件中可见

use crate::model::display_tree::{DisplayNode, NodeId};
use crate::model::notify::NodeObserver;

/// 在 `root` 子树中按身份查找 `target`。
/// 目标就是 `root` 本身时不做任何修改；目标在某个子节点下时展开 `root`；
/// 找不到时返回 false 且不改动任何展开状态。
pub fn reveal_path(root: &mut DisplayNode, target: NodeId, observer: &mut dyn NodeObserver) -> bool {
    // 不同投影产生的节点不可能相同
    if root.id().tree() != target.tree() {
        return false;
    }
    if root.id() == target {
        return true;
    }
    let found = match root.children_mut() {
        Some(children) => children
            .iter_mut()
            .any(|child| reveal_path(child, target, observer)),
        None => false,
    };
    if found {
        root.set_expanded(true, observer);
    }
    found
}

/// 对森林中的每个根各调用一次 reveal_path
pub fn reveal_in_forest(
    forest: &mut [DisplayNode],
    target: NodeId,
    observer: &mut dyn NodeObserver,
) -> bool {
    let mut found = false;
    for root in forest.iter_mut() {
        found |= reveal_path(root, target, observer);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::display_tree::project_root;
    use crate::model::notify::NodeEvent;
    use crate::model::source::SourceValue;

    fn expanded_labels(root: &DisplayNode) -> Vec<String> {
        let mut out = Vec::new();
        root.walk(&mut |n| {
            if n.is_expanded() {
                out.push(n.label().to_string());
            }
        });
        out
    }

    fn deep_tree() -> DisplayNode {
        project_root(&SourceValue::parse(r#"{"a": {"b": {"c": 1}}, "d": [true]}"#).unwrap())
    }

    fn id_at(root: &DisplayNode, index: usize) -> NodeId {
        let mut found = None;
        root.walk(&mut |n| {
            if n.id().index() == index {
                found = Some(n.id());
            }
        });
        found.unwrap()
    }

    #[test]
    fn test_reveal_expands_every_ancestor() {
        let mut root = deep_tree();
        // 先序：0 Root, 1 a, 2 b, 3 c, 4 d, 5 [0]
        let c = id_at(&root, 3);

        assert!(reveal_path(&mut root, c, &mut ()));
        assert_eq!(expanded_labels(&root), vec!["Root { }", "a { }", "b { }"]);
    }

    #[test]
    fn test_reveal_root_itself_has_no_side_effects() {
        let mut root = deep_tree();
        let id = root.id();
        let mut log: Vec<NodeEvent> = Vec::new();

        assert!(reveal_path(&mut root, id, &mut log));
        assert!(log.is_empty());
        assert!(expanded_labels(&root).is_empty());
    }

    #[test]
    fn test_reveal_leaves_siblings_untouched() {
        let mut root = deep_tree();
        let leaf = id_at(&root, 5);

        assert!(reveal_path(&mut root, leaf, &mut ()));
        assert_eq!(expanded_labels(&root), vec!["Root { }", "d [1]"]);
    }

    #[test]
    fn test_stale_reference_is_not_found() {
        let old = deep_tree();
        let stale = id_at(&old, 3);
        let mut fresh = deep_tree();

        let mut log: Vec<NodeEvent> = Vec::new();
        assert!(!reveal_path(&mut fresh, stale, &mut log));
        assert!(log.is_empty());
        assert!(expanded_labels(&fresh).is_empty());
    }

    #[test]
    fn test_reveal_in_forest_only_touches_owning_root() {
        let mut forest = vec![deep_tree(), deep_tree()];
        let target = id_at(&forest[1], 2);

        let mut log: Vec<NodeEvent> = Vec::new();
        assert!(reveal_in_forest(&mut forest, target, &mut log));

        assert!(expanded_labels(&forest[0]).is_empty());
        assert_eq!(expanded_labels(&forest[1]), vec!["Root { }", "a { }"]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_already_expanded_ancestors_do_not_renotify() {
        let mut root = deep_tree();
        let c = id_at(&root, 3);
        reveal_path(&mut root, c, &mut ());

        let mut log: Vec<NodeEvent> = Vec::new();
        assert!(reveal_path(&mut root, c, &mut log));
        assert!(log.is_empty());
    }
}
