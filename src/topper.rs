//! Directed-graph algorithms used for stratification: strongly connected
//! components, generation numbering, roots, and transitive reduction.
//!
//! Nodes are small copyable handles. Every algorithm visits nodes in
//! sorted order, so results are reproducible for a fixed edge set.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::hash::Hash;

/// Requirements on graph nodes.
pub trait Node: Copy + Eq + Hash + Ord {}

impl<T: Copy + Eq + Hash + Ord> Node for T {}

/// Adjacency-set digraph. Edge targets are always nodes too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digraph<N: Node> {
    edges: FxHashMap<N, FxHashSet<N>>,
}

impl<N: Node> Default for Digraph<N> {
    fn default() -> Self {
        Self {
            edges: FxHashMap::default(),
        }
    }
}

impl<N: Node> Digraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges(edges: impl IntoIterator<Item = (N, N)>) -> Self {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    pub fn add_node(&mut self, node: N) {
        self.edges.entry(node).or_default();
    }

    /// Returns false if the edge was already present.
    pub fn add_edge(&mut self, from: N, to: N) -> bool {
        self.add_node(to);
        self.edges.entry(from).or_default().insert(to)
    }

    pub fn contains_node(&self, node: N) -> bool {
        self.edges.contains_key(&node)
    }

    pub fn contains_edge(&self, from: N, to: N) -> bool {
        self.edges.get(&from).is_some_and(|s| s.contains(&to))
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(FxHashSet::len).sum()
    }

    /// Nodes in ascending order.
    pub fn nodes(&self) -> Vec<N> {
        let mut nodes: Vec<N> = self.edges.keys().copied().collect();
        nodes.sort_unstable();
        nodes
    }

    /// Successors of `node` in ascending order.
    pub fn successors(&self, node: N) -> Vec<N> {
        let mut succ: Vec<N> = self
            .edges
            .get(&node)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        succ.sort_unstable();
        succ
    }

    /// Every edge, sorted.
    pub fn edges(&self) -> Vec<(N, N)> {
        let mut out: Vec<(N, N)> = self
            .edges
            .iter()
            .flat_map(|(&from, tos)| tos.iter().map(move |&to| (from, to)))
            .collect();
        out.sort_unstable();
        out
    }

    /// The same nodes with every edge flipped.
    pub fn reversed(&self) -> Self {
        let mut rev = Self::new();
        for (&from, tos) in &self.edges {
            rev.add_node(from);
            for &to in tos {
                rev.add_edge(to, from);
            }
        }
        rev
    }

    /// The sub-graph induced by `keep`.
    pub fn induced(&self, keep: &FxHashSet<N>) -> Self {
        let mut sub = Self::new();
        for (&from, tos) in &self.edges {
            if !keep.contains(&from) {
                continue;
            }
            sub.add_node(from);
            for &to in tos {
                if keep.contains(&to) {
                    sub.add_edge(from, to);
                }
            }
        }
        sub
    }

    /// Nodes reachable from `starts`, including the starts that are nodes.
    pub fn reachable_from(&self, starts: impl IntoIterator<Item = N>) -> FxHashSet<N> {
        let mut seen = FxHashSet::default();
        let mut queue: VecDeque<N> = VecDeque::new();
        for s in starts {
            if self.contains_node(s) && seen.insert(s) {
                queue.push_back(s);
            }
        }
        while let Some(n) = queue.pop_front() {
            if let Some(tos) = self.edges.get(&n) {
                for &to in tos {
                    if seen.insert(to) {
                        queue.push_back(to);
                    }
                }
            }
        }
        seen
    }
}

/// Nodes with no incoming edge.
pub fn find_roots<N: Node>(graph: &Digraph<N>) -> FxHashSet<N> {
    let targets: FxHashSet<N> = graph.edges.values().flatten().copied().collect();
    graph
        .edges
        .keys()
        .copied()
        .filter(|n| !targets.contains(n))
        .collect()
}

/// Partition of the nodes into maximal strongly connected components,
/// singletons included. Members of each component are sorted.
///
/// Iterative Tarjan; components come out in reverse topological order of
/// the condensation (sinks first).
pub fn strongly_connected<N: Node>(graph: &Digraph<N>) -> Vec<Vec<N>> {
    let mut tarjan = Tarjan::new(graph);
    for node in graph.nodes() {
        if !tarjan.index.contains_key(&node) {
            tarjan.run(node);
        }
    }
    tarjan.components
}

struct Tarjan<'g, N: Node> {
    graph: &'g Digraph<N>,
    counter: usize,
    index: FxHashMap<N, usize>,
    low: FxHashMap<N, usize>,
    on_stack: FxHashSet<N>,
    stack: Vec<N>,
    components: Vec<Vec<N>>,
}

struct Visit<N> {
    node: N,
    succ: Vec<N>,
    pos: usize,
}

impl<'g, N: Node> Tarjan<'g, N> {
    fn new(graph: &'g Digraph<N>) -> Self {
        Self {
            graph,
            counter: 0,
            index: FxHashMap::default(),
            low: FxHashMap::default(),
            on_stack: FxHashSet::default(),
            stack: Vec::new(),
            components: Vec::new(),
        }
    }

    fn enter(&mut self, node: N, calls: &mut Vec<Visit<N>>) {
        self.index.insert(node, self.counter);
        self.low.insert(node, self.counter);
        self.counter += 1;
        self.stack.push(node);
        self.on_stack.insert(node);
        calls.push(Visit {
            node,
            succ: self.graph.successors(node),
            pos: 0,
        });
    }

    fn lower(&mut self, node: N, to: usize) {
        if let Some(l) = self.low.get_mut(&node) {
            *l = (*l).min(to);
        }
    }

    fn run(&mut self, start: N) {
        let mut calls: Vec<Visit<N>> = Vec::new();
        self.enter(start, &mut calls);

        while let Some(top) = calls.last_mut() {
            let v = top.node;
            if let Some(&w) = top.succ.get(top.pos) {
                top.pos += 1;
                match self.index.get(&w) {
                    None => self.enter(w, &mut calls),
                    Some(&wi) if self.on_stack.contains(&w) => self.lower(v, wi),
                    Some(_) => {}
                }
                continue;
            }

            calls.pop();
            let v_low = self.low[&v];
            if let Some(parent) = calls.last() {
                let p = parent.node;
                self.lower(p, v_low);
            }
            if v_low == self.index[&v] {
                let mut component = Vec::new();
                while let Some(w) = self.stack.pop() {
                    self.on_stack.remove(&w);
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                component.sort_unstable();
                self.components.push(component);
            }
        }
    }
}

/// Component index of every node.
fn component_index<N: Node>(components: &[Vec<N>]) -> FxHashMap<N, usize> {
    components
        .iter()
        .enumerate()
        .flat_map(|(i, c)| c.iter().map(move |&n| (n, i)))
        .collect()
}

/// Edges between distinct components, deduplicated.
fn condensation<N: Node>(graph: &Digraph<N>, comp: &FxHashMap<N, usize>) -> Digraph<usize> {
    let mut dag = Digraph::new();
    for (&from, tos) in &graph.edges {
        let a = comp[&from];
        dag.add_node(a);
        for to in tos {
            let b = comp[to];
            if a != b {
                dag.add_edge(a, b);
            }
        }
    }
    dag
}

/// Generation numbers for every node reachable from `roots`.
///
/// Members of one strongly connected component share a generation. Every
/// other node gets the smallest generation strictly greater than that of
/// all its predecessors; components with no reachable predecessor get 0.
pub fn general_top_sort<N: Node>(
    graph: &Digraph<N>,
    roots: impl IntoIterator<Item = N>,
) -> FxHashMap<N, usize> {
    let reachable = graph.reachable_from(roots);
    let sub = graph.induced(&reachable);
    let components = strongly_connected(&sub);
    let comp = component_index(&components);
    let dag = condensation(&sub, &comp);

    // Kahn's algorithm over the condensation, longest path from a source.
    let rev = dag.reversed();
    let mut pending: FxHashMap<usize, usize> = dag
        .nodes()
        .into_iter()
        .map(|c| (c, rev.successors(c).len()))
        .collect();
    let mut generation: FxHashMap<usize, usize> = FxHashMap::default();
    let mut sources: Vec<usize> = pending
        .iter()
        .filter(|&(_, &n)| n == 0)
        .map(|(&c, _)| c)
        .collect();
    sources.sort_unstable();
    let mut ready: VecDeque<usize> = sources.into();

    while let Some(c) = ready.pop_front() {
        let g = rev
            .successors(c)
            .iter()
            .filter_map(|p| generation.get(p))
            .map(|&pg| pg + 1)
            .max()
            .unwrap_or(0);
        generation.insert(c, g);
        for next in dag.successors(c) {
            if let Some(n) = pending.get_mut(&next) {
                *n -= 1;
                if *n == 0 {
                    ready.push_back(next);
                }
            }
        }
    }

    comp.into_iter()
        .filter_map(|(node, c)| generation.get(&c).map(|&g| (node, g)))
        .collect()
}

/// Transitive reduction: the smallest graph over the same nodes with the
/// same reachability.
///
/// Each multi-node component becomes a single cycle through its sorted
/// members; a singleton keeps its self-loop. Edges between components are
/// reduced on the condensation and reattached between the smallest members.
pub fn reduce_directed<N: Node>(graph: &Digraph<N>) -> Digraph<N> {
    let components = strongly_connected(graph);
    let comp = component_index(&components);
    let dag = condensation(graph, &comp);

    let mut reduced = Digraph::new();
    for component in &components {
        for &n in component {
            reduced.add_node(n);
        }
        match component.as_slice() {
            [single] => {
                if graph.contains_edge(*single, *single) {
                    reduced.add_edge(*single, *single);
                }
            }
            members => {
                for (i, &n) in members.iter().enumerate() {
                    reduced.add_edge(n, members[(i + 1) % members.len()]);
                }
            }
        }
    }

    for a in dag.nodes() {
        let succ = dag.successors(a);
        for &b in &succ {
            let implied = succ
                .iter()
                .filter(|&&c| c != b)
                .any(|&c| dag.reachable_from([c]).contains(&b));
            if !implied {
                reduced.add_edge(components[a][0], components[b][0]);
            }
        }
    }
    reduced
}

#[cfg(test)]
#[path = "tests/topper.rs"]
mod tests;
