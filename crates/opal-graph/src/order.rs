//! Strongly connected components and topological sorting
//!
//! Classic Tarjan bookkeeping: a visitation index and low-link per node, a
//! component stack, one depth-first pass. An edge `u -> v` means "v must be
//! ordered before u"; components are emitted dependencies-first, so
//! flattening singleton components yields a valid preparation order.
//!
//! Determinism: the output order depends only on the order of `nodes` and
//! the order in which the edge function yields neighbors. No hash-map
//! iteration order leaks into the result.

use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

/// Errors produced by [`topological_sort`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError<N: fmt::Debug> {
    /// The graph contains a dependency cycle among the named nodes
    #[error("dependency cycle detected among {0:?}")]
    CycleDetected(Vec<N>),
}

struct TarjanState<N> {
    index: FxHashMap<N, u32>,
    low_link: FxHashMap<N, u32>,
    on_stack: FxHashMap<N, bool>,
    stack: Vec<N>,
    next_index: u32,
    components: Vec<Vec<N>>,
}

/// Compute the strongly connected components of the graph spanned by
/// `nodes` and `edges`
///
/// `edges(n)` yields the dependencies of `n`, i.e. the nodes that must be
/// ordered before it. Edges leading outside `nodes` are ignored. Components
/// are returned such that every component's dependencies lie in components
/// emitted earlier.
pub fn strongly_connected_components<N, E, I>(nodes: &[N], mut edges: E) -> Vec<Vec<N>>
where
    N: Copy + Eq + Hash,
    E: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
{
    let mut state = TarjanState {
        index: FxHashMap::default(),
        low_link: FxHashMap::default(),
        on_stack: FxHashMap::default(),
        stack: Vec::new(),
        next_index: 0,
        components: Vec::new(),
    };
    let in_graph: FxHashMap<N, ()> = nodes.iter().map(|&n| (n, ())).collect();

    for &node in nodes {
        if !state.index.contains_key(&node) {
            visit(node, &mut state, &mut edges, &in_graph);
        }
    }

    state.components
}

fn visit<N, E, I>(node: N, state: &mut TarjanState<N>, edges: &mut E, in_graph: &FxHashMap<N, ()>)
where
    N: Copy + Eq + Hash,
    E: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
{
    let index = state.next_index;
    state.next_index += 1;
    state.index.insert(node, index);
    state.low_link.insert(node, index);
    state.stack.push(node);
    state.on_stack.insert(node, true);

    for dep in edges(node) {
        if !in_graph.contains_key(&dep) {
            continue;
        }
        if !state.index.contains_key(&dep) {
            visit(dep, state, edges, in_graph);
            let dep_low = state.low_link[&dep];
            let low = state.low_link[&node].min(dep_low);
            state.low_link.insert(node, low);
        } else if state.on_stack.get(&dep).copied().unwrap_or(false) {
            let dep_index = state.index[&dep];
            let low = state.low_link[&node].min(dep_index);
            state.low_link.insert(node, low);
        }
    }

    if state.low_link[&node] == state.index[&node] {
        let mut component = Vec::new();
        loop {
            let member = match state.stack.pop() {
                Some(m) => m,
                None => break,
            };
            state.on_stack.insert(member, false);
            component.push(member);
            if member == node {
                break;
            }
        }
        component.reverse();
        state.components.push(component);
    }
}

/// Order `nodes` so that every node follows all of its dependencies
///
/// Fails with [`GraphError::CycleDetected`] naming the participating nodes
/// if any component contains more than one node, or a node depends on
/// itself. A failed sort produces no partial output.
pub fn topological_sort<N, E, I>(nodes: &[N], mut edges: E) -> Result<Vec<N>, GraphError<N>>
where
    N: Copy + Eq + Hash + fmt::Debug,
    E: FnMut(N) -> I,
    I: IntoIterator<Item = N>,
{
    let components = strongly_connected_components(nodes, &mut edges);
    let mut order = Vec::with_capacity(nodes.len());
    for component in components {
        if component.len() > 1 {
            return Err(GraphError::CycleDetected(component));
        }
        let node = component[0];
        if edges(node).into_iter().any(|dep| dep == node) {
            return Err(GraphError::CycleDetected(vec![node]));
        }
        order.push(node);
    }
    Ok(order)
}
