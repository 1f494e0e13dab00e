//! Sample multi-hop paths from the live graph
//!
//! One read-only query collects a spread of real paths that the generation
//! prompt uses as grounding: real entity names, real property values, and the
//! label/relationship signatures the graph actually contains.
//!
//! Diversity comes from two choices inside the query:
//! - start nodes are one sample per distinct label set, largest sets first
//! - each start node contributes short undirected paths (2..3 hops) and longer
//!   incoming paths (3..4 hops), two of each

use serde_json::Value;

use super::sanitizer::sanitize_rows;
use crate::graph_db::{GraphDatabase, GraphDbError};

/// Default number of paths returned by one sampling query
pub const DEFAULT_PATH_SAMPLE_CAP: usize = 25;

/// Start nodes considered per sampling query
const MAX_START_NODES: usize = 15;

/// Build the sampling query returning at most `cap` paths.
///
/// Output columns: `pathLength`, `nodesInfo` (labels + props per node),
/// `relsInfo` (type + props per relationship) and `pathSignature`, e.g.
/// `(:Person)-[:ACTED_IN]->(:Movie)`.
pub fn sampling_query(cap: usize) -> String {
    format!(
        r#"// One sample node per distinct label set
MATCH (n)
WITH labels(n) AS labelSet, collect(n)[0] AS sampleNode
ORDER BY size(labelSet) DESC, rand()
WITH collect(sampleNode) AS sampleNodes

UNWIND sampleNodes[0..{start_nodes}] AS startNode
CALL (startNode) {{
    MATCH p1 = (startNode)-[*2..3]-()
    RETURN p1 AS p
    LIMIT 2
    UNION ALL
    WITH startNode
    MATCH p2 = ()-[*3..4]->(startNode)
    RETURN p2 AS p
    LIMIT 2
}}
WITH DISTINCT p
WITH p, nodes(p) AS pathNodes, relationships(p) AS pathRels, length(p) AS pathLength
RETURN
    pathLength,
    [node IN pathNodes | {{labels: labels(node), props: properties(node)}}] AS nodesInfo,
    [rel IN pathRels | {{type: type(rel), props: properties(rel)}}] AS relsInfo,
    reduce(s = "", i IN range(0, length(p) + 1) |
        s +
        CASE
            WHEN i % 2 = 0
            THEN "(:" + labels(nodes(p)[i / 2])[0] + ")"
            ELSE "-[:" + type(relationships(p)[(i - 1) / 2]) + "]->"
        END
    ) + "(:" + labels(nodes(p)[-1])[0] + ")" AS pathSignature
ORDER BY pathLength DESC, rand()
LIMIT {cap}"#,
        start_nodes = MAX_START_NODES,
        cap = cap,
    )
}

/// Run the sampling query and return the sanitized paths as a JSON array.
pub async fn sample_paths(
    db: &dyn GraphDatabase,
    database: &str,
    cap: usize,
    max_list_len: usize,
) -> Result<Value, GraphDbError> {
    let rows = db.query(database, &sampling_query(cap)).await?;
    log::debug!("[{}] sampled {} paths", database, rows.len());
    Ok(sanitize_rows(rows, max_list_len))
}
