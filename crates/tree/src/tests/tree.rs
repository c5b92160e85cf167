#![allow(non_snake_case)]

use claims::{assert_err, assert_ok};

use super::*;

const POST: TreeId = TreeId::new(100);

fn payload(created_at: u64) -> Payload {
    Payload::new("tester", format!("comment at {created_at}"), created_at)
}

fn add(tree: &mut Tree, parent: Option<u64>, id: u64) -> NodeId {
    let _pos = tree
        .insert_child(
            parent.map(NodeId::new),
            NodeId::new(id),
            payload(id),
            ChildPosition::Last,
        )
        .unwrap();
    NodeId::new(id)
}

fn add_at(tree: &mut Tree, parent: Option<u64>, id: u64, created_at: u64) {
    let _pos = tree
        .insert_child(
            parent.map(NodeId::new),
            NodeId::new(id),
            payload(created_at),
            ChildPosition::Ordered,
        )
        .unwrap();
}

/// `(id, left, right, depth)` in pre-order.
fn layout(tree: &Tree) -> Vec<(u64, u64, u64, u32)> {
    tree.nodes()
        .iter()
        .map(|node| (node.id.get(), node.left, node.right, node.depth))
        .collect()
}

fn ids(nodes: &[Node]) -> Vec<u64> {
    nodes.iter().map(|node| node.id.get()).collect()
}

/// a(1) { b(2), c(3) }, d(4)
fn sample() -> Tree {
    let mut tree = Tree::new(POST);
    let _a = add(&mut tree, None, 1);
    let _b = add(&mut tree, Some(1), 2);
    let _c = add(&mut tree, Some(1), 3);
    let _d = add(&mut tree, None, 4);
    tree
}

#[cfg(test)]
mod insert {
    use super::*;

    #[test]
    fn first_root__takes_one_two() {
        let mut tree = Tree::new(POST);
        let _a = add(&mut tree, None, 1);

        assert_eq!(layout(&tree), vec![(1, 1, 2, 0)]);
        assert_ok!(tree.verify());
    }

    #[test]
    fn last_child__opens_gap_at_parent_right() {
        let tree = sample();

        assert_eq!(
            layout(&tree),
            vec![(1, 1, 6, 0), (2, 2, 3, 1), (3, 4, 5, 1), (4, 7, 8, 0)]
        );
        assert_ok!(tree.verify());
    }

    #[test]
    fn last_child__shifts_later_roots() {
        let mut tree = sample();
        let _e = add(&mut tree, Some(2), 5);

        assert_eq!(
            layout(&tree),
            vec![
                (1, 1, 8, 0),
                (2, 2, 5, 1),
                (5, 3, 4, 2),
                (3, 6, 7, 1),
                (4, 9, 10, 0)
            ]
        );
        assert_ok!(tree.verify());
    }

    #[test]
    fn child_inherits_post_and_parent() {
        let tree = sample();
        let b = tree.get(NodeId::new(2)).unwrap();

        assert_eq!(b.parent_id, Some(NodeId::new(1)));
        assert_eq!(b.post_id, POST);
        assert_eq!(b.tree_id, POST);
    }

    #[test]
    fn unknown_parent__leaves_tree_untouched() {
        let mut tree = sample();
        let before = layout(&tree);

        let err = assert_err!(tree.insert_child(
            Some(NodeId::new(42)),
            NodeId::new(5),
            payload(5),
            ChildPosition::Last,
        ));

        assert_eq!(err, TreeError::NotFound(NodeId::new(42)));
        assert_eq!(layout(&tree), before);
    }

    #[test]
    fn ordered__sorts_siblings_by_creation_time() {
        let mut tree = Tree::new(POST);
        let _a = add(&mut tree, None, 1);
        add_at(&mut tree, Some(1), 2, 30);
        add_at(&mut tree, Some(1), 3, 10);
        add_at(&mut tree, Some(1), 4, 20);

        assert_eq!(ids(&tree.children(NodeId::new(1)).unwrap()), vec![3, 4, 2]);
        assert_ok!(tree.verify());
    }

    #[test]
    fn ordered__ties_break_by_id() {
        let mut tree = Tree::new(POST);
        add_at(&mut tree, None, 9, 5);
        add_at(&mut tree, None, 8, 5);
        add_at(&mut tree, None, 10, 5);

        assert_eq!(ids(tree.nodes()), vec![8, 9, 10]);
        assert_ok!(tree.verify());
    }

    #[test]
    fn ordered__earlier_sibling_goes_before_its_subtree() {
        let mut tree = Tree::new(POST);
        add_at(&mut tree, None, 1, 10);
        add_at(&mut tree, Some(1), 2, 11);
        add_at(&mut tree, None, 3, 5);

        assert_eq!(ids(tree.nodes()), vec![3, 1, 2]);
        assert_eq!(layout(&tree)[0], (3, 1, 2, 0));
        assert_ok!(tree.verify());
    }
}

#[cfg(test)]
mod remove {
    use super::*;

    #[test]
    fn subtree__drops_descendants_and_compacts() {
        let mut tree = sample();

        let removed = tree.remove_subtree(NodeId::new(1)).unwrap();

        assert_eq!(ids(&removed), vec![1, 2, 3]);
        assert_eq!(layout(&tree), vec![(4, 1, 2, 0)]);
        assert_ok!(tree.verify());
    }

    #[test]
    fn subtree__shrinks_ancestors() {
        let mut tree = sample();

        let removed = tree.remove_subtree(NodeId::new(2)).unwrap();

        assert_eq!(ids(&removed), vec![2]);
        assert_eq!(layout(&tree), vec![(1, 1, 4, 0), (3, 2, 3, 1), (4, 5, 6, 0)]);
        assert!(tree.get(NodeId::new(2)).is_none());
        assert_ok!(tree.verify());
    }

    #[test]
    fn subtree__unknown_node() {
        let mut tree = sample();

        assert_eq!(
            tree.remove_subtree(NodeId::new(9)),
            Err(TreeError::NotFound(NodeId::new(9)))
        );
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn reparenting__root_children_become_roots() {
        let mut tree = sample();

        let removed = tree.remove_reparenting(NodeId::new(1)).unwrap();

        assert_eq!(removed.id, NodeId::new(1));
        assert_eq!(
            layout(&tree),
            vec![(2, 1, 2, 0), (3, 3, 4, 0), (4, 5, 6, 0)]
        );
        assert!(tree.nodes().iter().all(|node| node.parent_id.is_none()));
        assert_ok!(tree.verify());
    }

    #[test]
    fn reparenting__grandchildren_move_up_one_level() {
        // a(1) { b(2) { c(3) { e(5) }, d(4) } }, f(6)
        let mut tree = Tree::new(POST);
        let _a = add(&mut tree, None, 1);
        let _b = add(&mut tree, Some(1), 2);
        let _c = add(&mut tree, Some(2), 3);
        let _d = add(&mut tree, Some(2), 4);
        let _e = add(&mut tree, Some(3), 5);
        let _f = add(&mut tree, None, 6);

        let _removed = tree.remove_reparenting(NodeId::new(2)).unwrap();

        assert_eq!(
            layout(&tree),
            vec![
                (1, 1, 8, 0),
                (3, 2, 5, 1),
                (5, 3, 4, 2),
                (4, 6, 7, 1),
                (6, 9, 10, 0)
            ]
        );
        assert_eq!(tree.get(NodeId::new(3)).unwrap().parent_id, Some(NodeId::new(1)));
        assert_eq!(tree.get(NodeId::new(4)).unwrap().parent_id, Some(NodeId::new(1)));
        assert_eq!(tree.get(NodeId::new(5)).unwrap().parent_id, Some(NodeId::new(3)));
        assert_ok!(tree.verify());
    }

    #[test]
    fn reparenting__leaf() {
        let mut tree = sample();

        let _removed = tree.remove_reparenting(NodeId::new(3)).unwrap();

        assert_eq!(layout(&tree), vec![(1, 1, 4, 0), (2, 2, 3, 1), (4, 5, 6, 0)]);
        assert_ok!(tree.verify());
    }
}

#[cfg(test)]
mod queries {
    use super::*;

    /// a(1) { b(2) { c(3) { d(4) } } }, e(5)
    fn chain() -> Tree {
        let mut tree = Tree::new(POST);
        let _a = add(&mut tree, None, 1);
        let _b = add(&mut tree, Some(1), 2);
        let _c = add(&mut tree, Some(2), 3);
        let _d = add(&mut tree, Some(3), 4);
        let _e = add(&mut tree, None, 5);
        tree
    }

    #[test]
    fn subtree__unbounded() {
        let tree = chain();

        assert_eq!(ids(&tree.subtree(NodeId::new(1), None, false).unwrap()), vec![2, 3, 4]);
        assert_eq!(ids(&tree.subtree(NodeId::new(1), None, true).unwrap()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn subtree__depth_bound_is_relative() {
        let tree = chain();

        assert_eq!(ids(&tree.subtree(NodeId::new(2), Some(1), false).unwrap()), vec![3]);
        assert_eq!(ids(&tree.subtree(NodeId::new(1), Some(2), false).unwrap()), vec![2, 3]);
    }

    #[test]
    fn subtree__zero_depth() {
        let tree = chain();

        assert!(tree.subtree(NodeId::new(1), Some(0), false).unwrap().is_empty());
        assert_eq!(ids(&tree.subtree(NodeId::new(1), Some(0), true).unwrap()), vec![1]);
    }

    #[test]
    fn listing__bounded_by_absolute_depth() {
        let tree = chain();

        assert_eq!(ids(&tree.listing(None)), vec![1, 2, 3, 4, 5]);
        assert_eq!(ids(&tree.listing(Some(1))), vec![1, 2, 5]);
    }

    #[test]
    fn ancestors__root_first() {
        let tree = chain();

        assert_eq!(ids(&tree.ancestors(NodeId::new(4), false).unwrap()), vec![1, 2, 3]);
        assert_eq!(ids(&tree.ancestors(NodeId::new(4), true).unwrap()), vec![1, 2, 3, 4]);
        assert!(tree.ancestors(NodeId::new(5), false).unwrap().is_empty());
    }

    #[test]
    fn children__direct_only() {
        let tree = sample();

        assert_eq!(ids(&tree.children(NodeId::new(1)).unwrap()), vec![2, 3]);
        assert!(tree.children(NodeId::new(4)).unwrap().is_empty());
    }

    #[test]
    fn max_depth() {
        assert_eq!(chain().max_depth(), Some(3));
        assert_eq!(Tree::new(POST).max_depth(), None);
    }
}

#[cfg(test)]
mod verify {
    use super::*;

    #[test]
    fn empty_tree_is_consistent() {
        assert_ok!(Tree::new(POST).verify());
    }

    #[test]
    fn detects_gap() {
        let mut tree = sample();
        tree.nodes[3].left = 8;
        tree.nodes[3].right = 9;

        assert_matches_corrupt(&tree);
    }

    #[test]
    fn detects_overlap() {
        let mut tree = sample();
        tree.nodes[2].right = 7;

        assert_matches_corrupt(&tree);
    }

    #[test]
    fn detects_wrong_depth() {
        let mut tree = sample();
        tree.nodes[1].depth = 0;

        assert_matches_corrupt(&tree);
    }

    #[test]
    fn detects_stale_parent_link() {
        let mut tree = sample();
        tree.nodes[1].parent_id = Some(NodeId::new(4));

        assert_matches_corrupt(&tree);
    }

    #[test]
    fn detects_foreign_post() {
        let mut tree = sample();
        tree.nodes[0].post_id = TreeId::new(1);

        assert_matches_corrupt(&tree);
    }

    fn assert_matches_corrupt(tree: &Tree) {
        let err = assert_err!(tree.verify());
        assert!(
            matches!(err, TreeError::Corrupt { tree: id, .. } if id == POST),
            "unexpected error: {err:?}"
        );
    }
}

#[cfg(test)]
mod rebuild {
    use super::*;

    #[test]
    fn restores_scrambled_boundaries() {
        let mut tree = sample();
        let _e = add(&mut tree, Some(3), 5);
        let expected = layout(&tree);

        for node in &mut tree.nodes {
            node.left = 0;
            node.right = 0;
            node.depth = 7;
        }
        assert_err!(tree.verify());

        assert_ok!(tree.rebuild());
        assert_eq!(layout(&tree), expected);
        assert_ok!(tree.verify());
    }

    #[test]
    fn orders_siblings_by_creation_time() {
        let mut tree = Tree::new(POST);
        let _a = add(&mut tree, None, 1);
        add_at(&mut tree, Some(1), 2, 50);
        add_at(&mut tree, Some(1), 3, 40);
        tree.nodes.swap(1, 2);
        tree.positions.clear();
        tree.reindex_from(0);

        assert_ok!(tree.rebuild());

        assert_eq!(ids(tree.nodes()), vec![1, 3, 2]);
        assert_ok!(tree.verify());
    }

    #[test]
    fn rejects_missing_parent() {
        let mut tree = sample();
        tree.nodes[1].parent_id = Some(NodeId::new(77));
        let before = layout(&tree);

        let _err = assert_err!(tree.rebuild());
        assert_eq!(layout(&tree), before);
    }

    #[test]
    fn rejects_cycle() {
        let node = |id: u64, parent: u64, left: u64| Node {
            id: NodeId::new(id),
            tree_id: POST,
            post_id: POST,
            parent_id: Some(NodeId::new(parent)),
            left,
            right: left + 1,
            depth: 0,
            payload: payload(id),
        };
        let mut tree = Tree::from_nodes(POST, vec![node(1, 2, 1), node(2, 1, 3)]);

        let err = assert_err!(tree.rebuild());
        assert!(
            matches!(err, TreeError::Corrupt { .. }),
            "unexpected error: {err:?}"
        );
        assert_eq!(tree.len(), 2);
    }
}
