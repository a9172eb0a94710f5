//! Dependency-ordered sorting of schema actions.
//!
//! Every distinct qualified name is one graph node; all actions sharing a node
//! keep their input order inside it. Grants live in their own node namespace
//! so a grant named after its target never merges with the target. Nodes are
//! ordered with Kahn's algorithm, ties broken by input order.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::ddl::SchemaAction;
use crate::error::CyclicDependencyError;
use crate::tracing::trace_sort;
use crate::traits::QueryType;
use crate::utils::unqualified;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NodeKey {
    Object(String),
    Grant(String),
}

struct Node {
    name: String,
    object_name: Option<String>,
    is_grant: bool,
    /// Indices into the input slice, in input order
    members: Vec<usize>,
}

/// Order `actions` so every resolvable dependency comes strictly earlier.
///
/// Actions without an object name are appended last in input order and never
/// take part in cycle detection.
pub fn sort_actions(actions: &[SchemaAction]) -> Result<Vec<&SchemaAction>, CyclicDependencyError> {
    Ok(sort_order(actions)?
        .into_iter()
        .map(|idx| &actions[idx])
        .collect())
}

/// Owned variant of [`sort_actions`]
pub fn sort_owned(actions: Vec<SchemaAction>) -> Result<Vec<SchemaAction>, CyclicDependencyError> {
    let order = sort_order(&actions)?;
    let mut slots: Vec<Option<SchemaAction>> = actions.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect())
}

/// Input indices in dependency order
fn sort_order(actions: &[SchemaAction]) -> Result<Vec<usize>, CyclicDependencyError> {
    let mut nodes: Vec<Node> = Vec::new();
    let mut index: HashMap<NodeKey, usize> = HashMap::new();
    let mut unnamed: Vec<usize> = Vec::new();

    for (idx, action) in actions.iter().enumerate() {
        let Some(name) = action.qualified_name() else {
            unnamed.push(idx);
            continue;
        };
        let is_grant = action.query_type == QueryType::Grant;
        let key = if is_grant {
            NodeKey::Grant(name.clone())
        } else {
            NodeKey::Object(name.clone())
        };
        let node = *index.entry(key).or_insert_with(|| {
            nodes.push(Node {
                name,
                object_name: action.object_name.clone(),
                is_grant,
                members: Vec::new(),
            });
            nodes.len() - 1
        });
        nodes[node].members.push(idx);
    }

    // Dependencies resolve against object nodes by qualified name first, then
    // by bare object name (first node wins)
    let mut by_qualified: HashMap<&str, usize> = HashMap::new();
    let mut by_object: HashMap<&str, usize> = HashMap::new();
    for (id, node) in nodes.iter().enumerate().filter(|(_, node)| !node.is_grant) {
        by_qualified.entry(node.name.as_str()).or_insert(id);
        if let Some(object) = node.object_name.as_deref() {
            by_object.entry(object).or_insert(id);
        }
    }
    let resolve = |dep: &str| {
        by_qualified
            .get(dep)
            .or_else(|| by_object.get(dep))
            .copied()
    };

    let mut graph = Graph::new(nodes.len());
    let mut grant_tokens: Vec<(&str, usize)> = Vec::new();

    for (id, node) in nodes.iter().enumerate() {
        for &member in &node.members {
            for dep in &actions[member].dependencies {
                match resolve(dep) {
                    Some(target) => graph.add_edge(target, id),
                    None if node.is_grant => grant_tokens.push((dep.as_str(), id)),
                    None => {}
                }
            }
        }
    }

    // A grant dependency that failed to resolve directly still orders the
    // grant after any object it names, compared with and without qualifiers
    for (token, grant) in grant_tokens {
        let tokens = [token, unqualified(token)];
        for (id, node) in nodes.iter().enumerate().filter(|(_, node)| !node.is_grant) {
            let candidates = [
                Some(node.name.as_str()),
                node.object_name.as_deref(),
                Some(unqualified(&node.name)),
            ];
            let matches = candidates
                .iter()
                .flatten()
                .any(|candidate| tokens.contains(candidate));
            if matches {
                graph.add_edge(id, grant);
            }
        }
    }

    // Kahn's algorithm, seeded in input order
    let mut queue: VecDeque<usize> = (0..nodes.len())
        .filter(|&id| graph.in_degree[id] == 0)
        .collect();
    let mut order: Vec<usize> = Vec::with_capacity(actions.len());
    let mut emitted = 0;

    while let Some(id) = queue.pop_front() {
        emitted += 1;
        order.extend(&nodes[id].members);
        for &dependent in &graph.dependents[id] {
            graph.in_degree[dependent] -= 1;
            if graph.in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if emitted < nodes.len() {
        return Err(CyclicDependencyError {
            nodes: nodes
                .iter()
                .enumerate()
                .filter(|&(id, _)| graph.in_degree[id] > 0)
                .map(|(_, node)| node.name.clone())
                .collect(),
        });
    }

    trace_sort!(nodes.len(), graph.edges.len(), unnamed.len());

    order.extend(unnamed);
    Ok(order)
}

/// Adjacency with deduplicated edges; self edges are dropped.
struct Graph {
    in_degree: Vec<usize>,
    /// Dependents per node, in edge insertion order
    dependents: Vec<Vec<usize>>,
    edges: HashSet<(usize, usize)>,
}

impl Graph {
    fn new(nodes: usize) -> Self {
        Self {
            in_degree: vec![0; nodes],
            dependents: vec![Vec::new(); nodes],
            edges: HashSet::new(),
        }
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        if from == to || !self.edges.insert((from, to)) {
            return;
        }
        self.dependents[from].push(to);
        self.in_degree[to] += 1;
    }
}
