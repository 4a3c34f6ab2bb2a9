use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::schema::types::TableSpec;

/// A directed graph representing table dependencies via foreign keys.
/// Edges point from dependent table to referenced table (child → parent).
///
/// Nodes are added in catalog declaration order, so a node's index doubles
/// as its declaration position.
pub struct DependencyGraph {
    pub graph: DiGraph<String, EdgeInfo>,
    pub node_indices: HashMap<String, NodeIndex>,
}

/// Information about an edge (foreign key relationship).
#[derive(Debug, Clone)]
pub struct EdgeInfo {
    /// FK column in the dependent table
    pub column: String,
    /// Referenced column in the parent table
    pub referenced_column: String,
    /// Whether the FK column is nullable
    pub is_nullable: bool,
}

impl DependencyGraph {
    /// Build a dependency graph from a domain's tables.
    /// Each table becomes a node, each FK becomes a directed edge from child to parent.
    /// Foreign keys naming a table outside `tables` are ignored here; catalog
    /// validation reports them.
    pub fn from_tables(tables: &IndexMap<String, TableSpec>) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for table_name in tables.keys() {
            let idx = graph.add_node(table_name.clone());
            node_indices.insert(table_name.clone(), idx);
        }

        for (table_name, table) in tables {
            for fk in &table.foreign_keys {
                if let (Some(&from_idx), Some(&to_idx)) = (
                    node_indices.get(table_name),
                    node_indices.get(&fk.references),
                ) {
                    let is_nullable = table
                        .column_spec(&fk.column)
                        .map(|c| c.nullable)
                        .unwrap_or(false);

                    graph.add_edge(
                        from_idx,
                        to_idx,
                        EdgeInfo {
                            column: fk.column.clone(),
                            referenced_column: fk.referenced_column.clone(),
                            is_nullable,
                        },
                    );
                }
            }
        }

        Self {
            graph,
            node_indices,
        }
    }

    /// Get the table name for a node index.
    pub fn table_name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    /// Get node index for a table name.
    pub fn node_index(&self, table_name: &str) -> Option<NodeIndex> {
        self.node_indices.get(table_name).copied()
    }

    /// Get the number of tables.
    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of FK edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Find one dependency cycle, if any.
    ///
    /// Uses Tarjan's SCC algorithm: any component with more than one node,
    /// or a single node with an edge to itself, is a cycle. Returns the
    /// table names of the first such component in declaration order.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut cycles: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || (scc.len() == 1 && self.graph.contains_edge(scc[0], scc[0]))
            })
            .collect();

        for scc in &mut cycles {
            scc.sort();
        }
        cycles.sort();

        cycles.into_iter().next().map(|scc| {
            scc.into_iter()
                .map(|idx| self.table_name(idx).to_string())
                .collect()
        })
    }
}
