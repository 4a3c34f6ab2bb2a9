use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

use crate::error::{BizSeedError, Result};
use crate::graph::dag::DependencyGraph;
use crate::schema::types::TableSpec;

/// Compute the generation order for a domain's tables (parents before
/// children).
///
/// Tables are ranked by dependency depth: a table without foreign keys has
/// depth 0, any other table sits one level below its deepest parent. Tables
/// of equal depth keep their catalog declaration order, so the result is
/// stable across runs.
///
/// Fails with `CyclicSchema` if the foreign keys form a cycle; that is a
/// catalog defect and generation must not proceed.
pub fn order<'a>(
    domain: &str,
    tables: &'a IndexMap<String, TableSpec>,
) -> Result<Vec<&'a TableSpec>> {
    let graph = DependencyGraph::from_tables(tables);

    if let Some(cycle) = graph.find_cycle() {
        return Err(BizSeedError::CyclicSchema {
            domain: domain.to_string(),
            tables: cycle.join(" -> "),
        });
    }

    let mut depths: HashMap<NodeIndex, usize> = HashMap::new();
    let mut ranked: Vec<(usize, usize, &TableSpec)> = tables
        .values()
        .enumerate()
        .map(|(position, table)| {
            let depth = graph
                .node_index(&table.name)
                .map(|idx| depth_of(&graph, idx, &mut depths))
                .unwrap_or(0);
            (depth, position, table)
        })
        .collect();

    ranked.sort_by_key(|(depth, position, _)| (*depth, *position));

    Ok(ranked.into_iter().map(|(_, _, table)| table).collect())
}

/// Table names in generation order.
pub fn order_names(domain: &str, tables: &IndexMap<String, TableSpec>) -> Result<Vec<String>> {
    Ok(order(domain, tables)?
        .into_iter()
        .map(|t| t.name.clone())
        .collect())
}

/// Longest path from `idx` to a table without outgoing FK edges.
/// Only called on acyclic graphs.
fn depth_of(
    graph: &DependencyGraph,
    idx: NodeIndex,
    memo: &mut HashMap<NodeIndex, usize>,
) -> usize {
    if let Some(&depth) = memo.get(&idx) {
        return depth;
    }

    let parents: Vec<NodeIndex> = graph.graph.neighbors(idx).collect();
    let depth = parents
        .into_iter()
        .map(|parent| depth_of(graph, parent, memo) + 1)
        .max()
        .unwrap_or(0);

    memo.insert(idx, depth);
    depth
}
