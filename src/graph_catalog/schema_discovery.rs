//! Schema discovery for a live Neo4j database
//!
//! Read-only introspection queries build a [`GraphSchema`]: node label
//! properties, relationship type properties, then per relationship type the
//! distinct `(:A)-[:R]->(:B)` label patterns seen in a bounded sample.

use serde_json::Value;

use super::errors::GraphCatalogError;
use super::graph_schema::{display_type, GraphSchema};
use crate::graph_db::{GraphDatabase, Row};

const NODE_PROPERTIES_QUERY: &str = "CALL db.schema.nodeTypeProperties() \
     YIELD nodeLabels, propertyName, propertyTypes \
     RETURN nodeLabels, propertyName, propertyTypes";

const REL_PROPERTIES_QUERY: &str = "CALL db.schema.relTypeProperties() \
     YIELD relType, propertyName, propertyTypes \
     RETURN relType, propertyName, propertyTypes";

/// Relationships inspected per type when collecting label patterns
const PATTERN_SAMPLE_PER_TYPE: usize = 1000;

/// Label patterns for one relationship type, from a bounded sample so that
/// dense types cannot run into the query timeout.
fn patterns_query(rel_type: &str) -> String {
    format!(
        "MATCH (a)-[:`{}`]->(b) \
         WITH a, b LIMIT {} \
         UNWIND labels(a) AS fromLabel \
         UNWIND labels(b) AS toLabel \
         RETURN DISTINCT fromLabel, toLabel",
        rel_type.replace('`', "``"),
        PATTERN_SAMPLE_PER_TYPE
    )
}

/// Introspect `database` and build its schema.
pub async fn discover_schema(
    db: &dyn GraphDatabase,
    database: &str,
) -> Result<GraphSchema, GraphCatalogError> {
    let introspect = |source| GraphCatalogError::Introspection {
        database: database.to_string(),
        source,
    };

    let mut schema = GraphSchema::new();

    let node_rows = db
        .query(database, NODE_PROPERTIES_QUERY)
        .await
        .map_err(introspect)?;
    for row in &node_rows {
        apply_node_row(&mut schema, row);
    }

    let rel_rows = db
        .query(database, REL_PROPERTIES_QUERY)
        .await
        .map_err(introspect)?;
    for row in &rel_rows {
        apply_rel_row(&mut schema, row);
    }

    let rel_types: Vec<String> = schema.relationship_properties.keys().cloned().collect();
    for rel_type in &rel_types {
        let pattern_rows = db
            .query(database, &patterns_query(rel_type))
            .await
            .map_err(introspect)?;
        for row in &pattern_rows {
            if let (Some(from), Some(to)) = (str_field(row, "fromLabel"), str_field(row, "toLabel")) {
                schema.add_pattern(from, rel_type, to);
            }
        }
    }

    if schema.is_empty() {
        return Err(GraphCatalogError::EmptySchema {
            database: database.to_string(),
        });
    }

    log::info!(
        "[{}] discovered {} labels, {} relationship types, {} patterns",
        database,
        schema.node_properties.len(),
        schema.relationship_properties.len(),
        schema.patterns.len()
    );
    Ok(schema)
}

fn apply_node_row(schema: &mut GraphSchema, row: &Row) {
    let labels: Vec<&str> = row
        .get("nodeLabels")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    for label in labels {
        match (str_field(row, "propertyName"), first_type(row)) {
            (Some(property), Some(data_type)) => {
                schema.add_node_property(label, property, &display_type(data_type))
            }
            _ => schema.add_label(label),
        }
    }
}

fn apply_rel_row(schema: &mut GraphSchema, row: &Row) {
    let Some(raw_type) = str_field(row, "relType") else {
        return;
    };
    let rel_type = unwrap_rel_type(raw_type);

    match (str_field(row, "propertyName"), first_type(row)) {
        (Some(property), Some(data_type)) => {
            schema.add_rel_property(&rel_type, property, &display_type(data_type))
        }
        _ => schema.add_rel_type(&rel_type),
    }
}

/// `db.schema.relTypeProperties` reports types as ``:`ACTED_IN` ``
fn unwrap_rel_type(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(':')
        .trim_matches('`')
        .to_string()
}

fn str_field<'a>(row: &'a Row, key: &str) -> Option<&'a str> {
    row.get(key).and_then(Value::as_str)
}

fn first_type(row: &Row) -> Option<&str> {
    row.get("propertyTypes")
        .and_then(Value::as_array)
        .and_then(|types| types.first())
        .and_then(Value::as_str)
}
