use archfuse_core::IntermediateGraph;

use crate::ParsedFile;

/// Concatenate per-file results into one graph, in input order.
///
/// Ids are not reconciled across files: two files that both produce `orders`
/// contribute two nodes. Disagreements are for the fusion stage to surface.
pub fn build_intermediate<I>(files: I) -> IntermediateGraph
where
    I: IntoIterator<Item = ParsedFile>,
{
    let mut graph = IntermediateGraph::default();
    for file in files {
        graph.nodes.extend(file.nodes);
        graph.edges.extend(file.edges);
        graph.notes.extend(file.notes);
    }
    graph
}
