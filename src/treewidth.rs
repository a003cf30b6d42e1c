//! Graph -> elimination ordering -> tree decomposition -> rooted tree.
//! Independent of the MSO compiler proper; its output feeds
//! [`crate::eval`]'s tree case by providing a canonical ranked-tree
//! shape derived from a graph instance, via a caller-supplied labelling
//! function from bag to base symbol.

use tracing::trace;

use crate::core::alphabet::{Bits, Letter};
use crate::core::math::OrderedSet;
use crate::core::tree::EncodedTree;
use crate::error::{Error, Result, TreewidthError};

/// An undirected graph on vertices `0..labels.len()`. Labels are kept
/// only for display/debugging; all algorithms operate on the integer
/// ids.
#[derive(Clone, Debug)]
pub struct Graph {
    labels: Vec<String>,
    edges: OrderedSet<(usize, usize)>,
}

fn normalize(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Graph {
    pub fn new(labels: Vec<String>, edges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let edges = edges
            .into_iter()
            .filter(|&(a, b)| a != b)
            .map(|(a, b)| normalize(a, b))
            .collect();
        Self { labels, edges }
    }

    pub fn num_vertices(&self) -> usize {
        self.labels.len()
    }

    pub fn label(&self, v: usize) -> &str {
        &self.labels[v]
    }

    pub fn vertices(&self) -> impl Iterator<Item = usize> {
        0..self.labels.len()
    }

    pub fn adjacent(&self, a: usize, b: usize) -> bool {
        self.edges.contains(&normalize(a, b))
    }

    pub fn neighbors(&self, present: &OrderedSet<usize>, v: usize) -> OrderedSet<usize> {
        present
            .iter()
            .copied()
            .filter(|&u| u != v && self.adjacent(u, v))
            .collect()
    }

    pub fn degree(&self, present: &OrderedSet<usize>, v: usize) -> usize {
        self.neighbors(present, v).len()
    }

    fn make_neighborhood_clique(&mut self, present: &OrderedSet<usize>, v: usize) {
        let neighbors: Vec<usize> = self.neighbors(present, v).into_iter().collect();
        for (i, &u) in neighbors.iter().enumerate() {
            for &w in &neighbors[i + 1..] {
                self.edges.insert(normalize(u, w));
            }
        }
    }
}

/// A labelled subset of graph vertices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bag {
    /// The eliminated vertex that created this bag; doubles as a stable
    /// bag id.
    pub owner: usize,
    pub vertices: OrderedSet<usize>,
}

/// A tree decomposition: one bag per eliminated vertex, with undirected
/// edges between bags.
#[derive(Clone, Debug)]
pub struct TreeDecomposition {
    pub bags: Vec<Bag>,
    pub edges: OrderedSet<(usize, usize)>,
}

impl TreeDecomposition {
    fn bag(&self, owner: usize) -> &Bag {
        self.bags.iter().find(|b| b.owner == owner).expect("bag for owner must exist")
    }

    fn neighbor_bags(&self, owner: usize) -> Vec<usize> {
        self.edges
            .iter()
            .filter_map(|&(a, b)| {
                if a == owner {
                    Some(b)
                } else if b == owner {
                    Some(a)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Checks the three tree-decomposition properties:
    /// vertex cover (every graph vertex appears in some bag), edge cover
    /// (every graph edge's endpoints co-occur in some bag), and running
    /// intersection (the bags containing any fixed vertex form a
    /// connected subtree).
    pub fn check_invariants(&self, graph: &Graph) -> Result<()> {
        for v in graph.vertices() {
            if !self.bags.iter().any(|b| b.vertices.contains(&v)) {
                return Err(Error::Treewidth(TreewidthError {
                    message: format!("vertex {} is covered by no bag", v),
                }));
            }
        }
        for &(a, b) in &graph.edges {
            if !self.bags.iter().any(|bag| bag.vertices.contains(&a) && bag.vertices.contains(&b)) {
                return Err(Error::Treewidth(TreewidthError {
                    message: format!("edge ({}, {}) is covered by no bag", a, b),
                }));
            }
        }
        for v in graph.vertices() {
            let owners: Vec<usize> = self
                .bags
                .iter()
                .filter(|b| b.vertices.contains(&v))
                .map(|b| b.owner)
                .collect();
            if owners.is_empty() {
                continue;
            }
            if !self.is_connected_subset(&owners) {
                return Err(Error::Treewidth(TreewidthError {
                    message: format!("bags containing vertex {} do not form a connected subtree", v),
                }));
            }
        }
        Ok(())
    }

    fn is_connected_subset(&self, owners: &[usize]) -> bool {
        let set: OrderedSet<usize> = owners.iter().copied().collect();
        let start = owners[0];
        let mut visited = OrderedSet::new();
        let mut stack = vec![start];
        while let Some(o) = stack.pop() {
            if !visited.insert(o) {
                continue;
            }
            for n in self.neighbor_bags(o) {
                if set.contains(&n) && !visited.contains(&n) {
                    stack.push(n);
                }
            }
        }
        set.iter().all(|o| visited.contains(o))
    }
}

/// Iteratively pick the remaining vertex of minimum degree, clique its
/// neighborhood, and remove it. Ties break by ascending vertex id.
pub fn min_degree_ordering(graph: &Graph) -> Vec<usize> {
    let mut working = graph.clone();
    let mut present: OrderedSet<usize> = graph.vertices().collect();
    let mut ordering = Vec::with_capacity(graph.num_vertices());

    while present.len() > 1 {
        let next = present
            .iter()
            .copied()
            .min_by_key(|&v| (working.degree(&present, v), v))
            .expect("present is non-empty");
        trace!(vertex = next, degree = working.degree(&present, next), "eliminating vertex");
        ordering.push(next);
        working.make_neighborhood_clique(&present, next);
        present.remove(&next);
    }
    if let Some(&last) = present.iter().next() {
        ordering.push(last);
    }
    ordering
}

/// Build bags by walking the elimination ordering: `B_v = {v} union
/// (remaining neighbours of v)`, then clique the neighborhood and
/// eliminate `v`. The final vertex gets a singleton bag.
fn build_bags(graph: &Graph, ordering: &[usize]) -> Vec<Bag> {
    let mut working = graph.clone();
    let mut present: OrderedSet<usize> = graph.vertices().collect();
    let mut bags = Vec::with_capacity(ordering.len());

    for (i, &v) in ordering.iter().enumerate() {
        if i == ordering.len() - 1 {
            bags.push(Bag {
                owner: v,
                vertices: std::iter::once(v).collect(),
            });
            break;
        }
        let mut vertices: OrderedSet<usize> = std::iter::once(v).collect();
        vertices.extend(working.neighbors(&present, v));
        bags.push(Bag { owner: v, vertices });
        working.make_neighborhood_clique(&present, v);
        present.remove(&v);
    }
    bags
}

/// Connect each bag to the bag of the first later vertex in the
/// ordering still contained in its own vertex set.
pub fn permutation_to_tree_decomposition(graph: &Graph, ordering: &[usize]) -> TreeDecomposition {
    let bags = build_bags(graph, ordering);
    let mut edges = OrderedSet::new();
    for i in 0..ordering.len() {
        let bag_i = &bags[i];
        for &later in &ordering[i + 1..] {
            if bag_i.vertices.contains(&later) {
                edges.insert(normalize(bag_i.owner, later));
                break;
            }
        }
    }
    TreeDecomposition { bags, edges }
}

/// Convenience: run the min-degree heuristic and build its
/// decomposition in one call.
pub fn decompose(graph: &Graph) -> TreeDecomposition {
    let ordering = min_degree_ordering(graph);
    permutation_to_tree_decomposition(graph, &ordering)
}

/// A tree decomposition rooted at a chosen bag, built by DFS.
#[derive(Clone, Debug)]
pub struct RootedBagTree {
    pub bag: Bag,
    pub children: Vec<RootedBagTree>,
}

pub fn root_at(decomp: &TreeDecomposition, root_owner: usize) -> Result<RootedBagTree> {
    if !decomp.bags.iter().any(|b| b.owner == root_owner) {
        return Err(Error::Treewidth(TreewidthError {
            message: format!("no bag owned by vertex {}", root_owner),
        }));
    }
    let mut visited = OrderedSet::new();
    Ok(build_subtree(decomp, root_owner, &mut visited))
}

fn build_subtree(decomp: &TreeDecomposition, owner: usize, visited: &mut OrderedSet<usize>) -> RootedBagTree {
    visited.insert(owner);
    let mut children = Vec::new();
    for neighbor in decomp.neighbor_bags(owner) {
        if !visited.contains(&neighbor) {
            children.push(build_subtree(decomp, neighbor, visited));
        }
    }
    RootedBagTree {
        bag: decomp.bag(owner).clone(),
        children,
    }
}

/// Turn a rooted bag-tree into an `EncodedTree` the NTA evaluator can
/// run, via a caller-supplied labelling function. Node arity is always
/// `children.len()`, so the labelling function only needs to pick a
/// base symbol per bag.
pub fn to_encoded_tree(root: &RootedBagTree, label: &impl Fn(&Bag) -> char) -> EncodedTree {
    let mut next_id = 0u32;
    build_encoded(root, label, &mut next_id)
}

fn build_encoded(node: &RootedBagTree, label: &impl Fn(&Bag) -> char, next_id: &mut u32) -> EncodedTree {
    let children: Vec<EncodedTree> = node
        .children
        .iter()
        .map(|c| build_encoded(c, label, next_id))
        .collect();
    let id = *next_id;
    *next_id += 1;
    let letter = Letter::new(label(&node.bag), Bits::zeros(0));
    EncodedTree::node(id, letter, children)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Graph {
        Graph::new(
            vec!["a".into(), "b".into(), "c".into()],
            [(0, 1), (1, 2), (0, 2)],
        )
    }

    #[test_log::test]
    fn s6_triangle_decomposition_has_three_bags_satisfying_invariants() {
        let graph = triangle();
        let decomp = decompose(&graph);
        assert_eq!(decomp.bags.len(), 3);
        for bag in &decomp.bags {
            assert!(bag.vertices.len() <= 3);
        }
        decomp.check_invariants(&graph).unwrap();
    }

    #[test_log::test]
    fn min_degree_ordering_covers_every_vertex_exactly_once() {
        let graph = triangle();
        let ordering = min_degree_ordering(&graph);
        let mut sorted = ordering.clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1, 2]);
    }

    #[test_log::test]
    fn rooted_tree_visits_every_bag_exactly_once() {
        let graph = Graph::new(
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            [(0, 1), (1, 2), (2, 3)],
        );
        let decomp = decompose(&graph);
        let root_owner = decomp.bags[0].owner;
        let rooted = root_at(&decomp, root_owner).unwrap();

        fn count(node: &RootedBagTree) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        assert_eq!(count(&rooted), decomp.bags.len());
    }

    #[test_log::test]
    fn to_encoded_tree_preserves_arity_from_child_count() {
        let graph = triangle();
        let decomp = decompose(&graph);
        let root_owner = decomp.bags[0].owner;
        let rooted = root_at(&decomp, root_owner).unwrap();
        let encoded = to_encoded_tree(&rooted, &|_bag| 'n');

        fn check(node: &EncodedTree) {
            assert_eq!(node.arity(), node.children.len());
            for c in &node.children {
                check(c);
            }
        }
        check(&encoded);
    }

    #[test_log::test]
    fn root_at_rejects_unknown_owner() {
        let graph = triangle();
        let decomp = decompose(&graph);
        assert!(root_at(&decomp, 999).is_err());
    }
}
