//! Randomized operation sequences against the public engine API.
//!
//! After every step the forest must still satisfy the nested-set invariants,
//! and each operation must have had exactly the effect it reports.

use claims::assert_ok;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use threadline_tree::{Forest, ForestConfig, Node, NodeId, Payload, TreeId};

const POSTS: u64 = 3;
const STEPS: usize = 400;

fn live_nodes(forest: &Forest) -> Vec<Node> {
    forest
        .trees()
        .into_iter()
        .flat_map(|tree| forest.tree_listing(tree))
        .collect()
}

fn check_structure(forest: &Forest) {
    assert_ok!(forest.verify());

    for tree in forest.trees() {
        let listing = forest.tree_listing(tree);
        assert!(!listing.is_empty(), "empty tree {tree} still listed");
        assert!(listing.windows(2).all(|w| w[0].left() < w[1].left()));

        for node in &listing {
            let expected: Vec<NodeId> = listing
                .iter()
                .filter(|other| node.contains(other))
                .map(Node::id)
                .collect();
            let got: Vec<NodeId> = forest
                .subtree(node.id(), None, false)
                .unwrap()
                .iter()
                .map(Node::id)
                .collect();
            assert_eq!(got, expected);
            assert_eq!(node.descendant_count(), expected.len());

            let bounded = forest.subtree(node.id(), Some(1), true).unwrap();
            assert!(bounded.iter().all(|n| n.depth() <= node.depth() + 1));
            assert_eq!(bounded[0].id(), node.id());
        }
    }
}

fn pick<'a>(rng: &mut StdRng, nodes: &'a [Node]) -> Option<&'a Node> {
    if nodes.is_empty() {
        None
    } else {
        Some(&nodes[rng.gen_range(0..nodes.len())])
    }
}

fn run(seed: u64, config: ForestConfig) {
    let mut rng = StdRng::seed_from_u64(seed);
    let forest = Forest::new(config);

    for step in 0..STEPS {
        let nodes = live_nodes(&forest);
        let payload = Payload::new("prop", format!("step {step}"), rng.gen_range(0..1_000));

        match rng.gen_range(0..10) {
            0..=1 => {
                let tree = TreeId::new(rng.gen_range(1..=POSTS));
                let id = forest.append_child(None, tree, payload).unwrap();
                assert_eq!(forest.get(id).unwrap().depth(), 0);
            }
            2..=5 => {
                let Some(parent) = pick(&mut rng, &nodes) else {
                    continue;
                };
                let ordered = rng.gen_bool(0.3);
                let id = if ordered {
                    forest.insert_child_ordered(Some(parent.id()), parent.post_id(), payload)
                } else {
                    forest.append_child(Some(parent.id()), parent.post_id(), payload)
                }
                .unwrap();

                let node = forest.get(id).unwrap();
                assert_eq!(node.parent_id(), Some(parent.id()));
                assert_eq!(node.depth(), parent.depth() + 1);
                assert_eq!(node.post_id(), parent.post_id());
                if !ordered {
                    let children = forest.children(parent.id()).unwrap();
                    assert_eq!(children.last().map(Node::id), Some(id));
                }
            }
            6..=7 => {
                let Some(target) = pick(&mut rng, &nodes) else {
                    continue;
                };
                let doomed: Vec<NodeId> = forest
                    .subtree(target.id(), None, true)
                    .unwrap()
                    .iter()
                    .map(Node::id)
                    .collect();

                let removed = forest.delete_subtree(target.id()).unwrap();

                assert_eq!(removed, doomed.len());
                assert!(doomed.iter().all(|&id| forest.get(id).is_err()));
            }
            _ => {
                let Some(target) = pick(&mut rng, &nodes) else {
                    continue;
                };
                let descendants = forest.subtree(target.id(), None, false).unwrap();
                let children = forest.children(target.id()).unwrap();

                assert_eq!(forest.delete_node_reparent_children(target.id()).unwrap(), 1);

                assert!(forest.get(target.id()).is_err());
                for child in &children {
                    assert_eq!(
                        forest.get(child.id()).unwrap().parent_id(),
                        target.parent_id()
                    );
                }
                for before in &descendants {
                    let after = forest.get(before.id()).unwrap();
                    assert_eq!(after.depth(), before.depth() - 1);
                }
            }
        }

        check_structure(&forest);
    }
}

#[test]
fn test_random_sequences_keep_invariants() {
    for seed in 0..8 {
        run(seed, ForestConfig::default());
    }
}

#[test]
fn test_random_sequences_with_verified_mutations() {
    for seed in 100..104 {
        run(seed, ForestConfig::new(true));
    }
}

#[test]
fn test_random_forest_survives_snapshot() {
    let mut rng = StdRng::seed_from_u64(7);
    let forest = Forest::default();

    for step in 0..200_u64 {
        let nodes = live_nodes(&forest);
        let payload = Payload::new("snap", "body", step);
        match pick(&mut rng, &nodes) {
            Some(parent) if rng.gen_bool(0.7) => {
                let _id = forest
                    .append_child(Some(parent.id()), parent.post_id(), payload)
                    .unwrap();
            }
            _ => {
                let tree = TreeId::new(rng.gen_range(1..=POSTS));
                let _id = forest.append_child(None, tree, payload).unwrap();
            }
        }
    }

    let restored = Forest::restore(forest.snapshot(), ForestConfig::default()).unwrap();

    check_structure(&restored);
    assert_eq!(restored.stats(), forest.stats());
    assert_eq!(live_nodes(&restored), live_nodes(&forest));
}
