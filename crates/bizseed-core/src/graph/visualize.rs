use crate::graph::dag::DependencyGraph;
use petgraph::visit::EdgeRef;

/// Output format for graph visualization.
pub enum GraphFormat {
    Mermaid,
    Dot,
}

/// Render a domain's dependency graph. Edges run child → parent and are
/// labelled with the FK column; nullable FKs are drawn dashed.
pub fn visualize(graph: &DependencyGraph, format: GraphFormat) -> String {
    match format {
        GraphFormat::Mermaid => generate_mermaid(graph),
        GraphFormat::Dot => generate_dot(graph),
    }
}

fn generate_mermaid(graph: &DependencyGraph) -> String {
    let mut output = String::from("graph TD\n");

    for node in graph.graph.node_indices() {
        let name = graph.table_name(node);
        output.push_str(&format!("    {}[{}]\n", name, name));
    }

    output.push('\n');

    for edge in graph.graph.edge_references() {
        let from = graph.table_name(edge.source());
        let to = graph.table_name(edge.target());
        let info = edge.weight();
        if info.is_nullable {
            output.push_str(&format!("    {} -.->|{}| {}\n", from, info.column, to));
        } else {
            output.push_str(&format!("    {} -->|{}| {}\n", from, info.column, to));
        }
    }

    output
}

fn generate_dot(graph: &DependencyGraph) -> String {
    let mut output = String::from("digraph dependencies {\n");
    output.push_str("    rankdir=BT;\n");
    output.push_str("    node [shape=box, style=rounded];\n\n");

    for node in graph.graph.node_indices() {
        output.push_str(&format!("    \"{}\";\n", graph.table_name(node)));
    }

    output.push('\n');

    for edge in graph.graph.edge_references() {
        let from = graph.table_name(edge.source());
        let to = graph.table_name(edge.target());
        let info = edge.weight();
        let style = if info.is_nullable { ", style=dashed" } else { "" };
        output.push_str(&format!(
            "    \"{}\" -> \"{}\" [label=\"{}\"{}];\n",
            from, to, info.column, style
        ));
    }

    output.push_str("}\n");
    output
}
