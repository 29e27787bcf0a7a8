//! Structural properties of the standard command graph

use awsnet::graph::{check_tree, CommandGraph};
use proptest::prelude::*;

/// Every node's path extends its parent's, and the tree checks clean
#[test]
fn test_standard_graph_is_a_tree() {
    let graph = CommandGraph::standard().unwrap();
    assert!(check_tree(&graph).is_empty());
    assert_eq!(graph.dfs().len(), graph.len());

    for node in graph.nodes() {
        if let Some(parent) = node.parent {
            let parent = graph.node(parent);
            assert!(node.path.starts_with(&format!("{}.", parent.path)));
            assert!(parent.kind.is_scope());
        }
    }
}

/// Typing a node's phrase in any letter case, followed by arguments, resolves to that
/// node from its parent scope with the arguments left over
#[test]
fn test_phrases_resolve_regardless_of_case() {
    let graph = CommandGraph::standard().unwrap();
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                1..graph.len(),
                prop::collection::vec(any::<bool>(), 64),
                prop::collection::vec("[0-9]{1,4}", 0..3),
            ),
            |(id, upper, args)| {
                let node = graph.node(id);
                let parent = node.parent.expect("non-root node has a parent");
                let phrase: String = node
                    .phrase()
                    .chars()
                    .zip(upper.iter().cycle())
                    .map(|(c, up)| if *up { c.to_ascii_uppercase() } else { c })
                    .collect();
                let tokens: Vec<String> = phrase
                    .split_whitespace()
                    .map(str::to_string)
                    .chain(args.iter().cloned())
                    .collect();

                let resolution = graph.resolve_at(parent, &tokens).unwrap();
                prop_assert_eq!(resolution.node, id);
                prop_assert_eq!(resolution.args, args);
                Ok(())
            },
        )
        .unwrap();
}
