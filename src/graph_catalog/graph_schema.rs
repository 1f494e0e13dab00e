use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Property name -> display type (e.g. `STRING`, `INTEGER`, `LIST`)
pub type PropertyTypes = BTreeMap<String, String>;

/// A `(:From)-[:TYPE]->(:To)` connection observed in the data
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaPattern {
    pub from_label: String,
    pub rel_type: String,
    pub to_label: String,
}

impl fmt::Display for SchemaPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(:{})-[:{}]->(:{})",
            self.from_label, self.rel_type, self.to_label
        )
    }
}

/// Declared schema of one graph database
///
/// Ordered maps keep the rendered description stable between runs, which keeps
/// prompts reproducible for the same database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSchema {
    pub node_properties: BTreeMap<String, PropertyTypes>,
    pub relationship_properties: BTreeMap<String, PropertyTypes>,
    pub patterns: BTreeSet<SchemaPattern>,
}

impl GraphSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style node declaration, mostly for fixtures
    pub fn with_node(mut self, label: &str, properties: &[(&str, &str)]) -> Self {
        self.add_label(label);
        for (name, data_type) in properties {
            self.add_node_property(label, name, data_type);
        }
        self
    }

    /// Builder-style relationship declaration, mostly for fixtures
    pub fn with_relationship(mut self, rel_type: &str, properties: &[(&str, &str)]) -> Self {
        self.add_rel_type(rel_type);
        for (name, data_type) in properties {
            self.add_rel_property(rel_type, name, data_type);
        }
        self
    }

    pub fn with_pattern(mut self, from_label: &str, rel_type: &str, to_label: &str) -> Self {
        self.add_pattern(from_label, rel_type, to_label);
        self
    }

    pub fn add_label(&mut self, label: &str) {
        self.node_properties.entry(label.to_string()).or_default();
    }

    pub fn add_rel_type(&mut self, rel_type: &str) {
        self.relationship_properties
            .entry(rel_type.to_string())
            .or_default();
    }

    pub fn add_node_property(&mut self, label: &str, name: &str, data_type: &str) {
        self.node_properties
            .entry(label.to_string())
            .or_default()
            .insert(name.to_string(), data_type.to_string());
    }

    pub fn add_rel_property(&mut self, rel_type: &str, name: &str, data_type: &str) {
        self.relationship_properties
            .entry(rel_type.to_string())
            .or_default()
            .insert(name.to_string(), data_type.to_string());
    }

    pub fn add_pattern(&mut self, from_label: &str, rel_type: &str, to_label: &str) {
        self.add_label(from_label);
        self.add_label(to_label);
        self.add_rel_type(rel_type);
        self.patterns.insert(SchemaPattern {
            from_label: from_label.to_string(),
            rel_type: rel_type.to_string(),
            to_label: to_label.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.node_properties.is_empty()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.node_properties.contains_key(label)
    }

    pub fn has_rel_type(&self, rel_type: &str) -> bool {
        self.relationship_properties.contains_key(rel_type)
    }

    pub fn label_has_property(&self, label: &str, property: &str) -> bool {
        self.node_properties
            .get(label)
            .is_some_and(|props| props.contains_key(property))
    }

    pub fn rel_has_property(&self, rel_type: &str, property: &str) -> bool {
        self.relationship_properties
            .get(rel_type)
            .is_some_and(|props| props.contains_key(property))
    }

    pub fn any_node_has_property(&self, property: &str) -> bool {
        self.node_properties
            .values()
            .any(|props| props.contains_key(property))
    }

    pub fn any_rel_has_property(&self, property: &str) -> bool {
        self.relationship_properties
            .values()
            .any(|props| props.contains_key(property))
    }

    pub fn has_pattern(&self, from_label: &str, rel_type: &str, to_label: &str) -> bool {
        self.patterns.iter().any(|p| {
            p.from_label == from_label && p.rel_type == rel_type && p.to_label == to_label
        })
    }

    /// Render the schema as the text block handed to the generation prompt.
    ///
    /// ```text
    /// Node properties:
    /// Person {name: STRING, born: INTEGER}
    /// Relationship properties:
    /// ACTED_IN {roles: LIST}
    /// The relationships:
    /// (:Person)-[:ACTED_IN]->(:Movie)
    /// ```
    pub fn describe(&self) -> String {
        let mut out = String::from("Node properties:\n");
        for (label, props) in &self.node_properties {
            out.push_str(&format!("{} {}\n", label, render_properties(props)));
        }

        out.push_str("Relationship properties:\n");
        for (rel_type, props) in &self.relationship_properties {
            if props.is_empty() {
                continue;
            }
            out.push_str(&format!("{} {}\n", rel_type, render_properties(props)));
        }

        out.push_str("The relationships:\n");
        for pattern in &self.patterns {
            out.push_str(&format!("{}\n", pattern));
        }
        out
    }
}

fn render_properties(props: &PropertyTypes) -> String {
    let fields = props
        .iter()
        .map(|(name, data_type)| format!("{}: {}", name, data_type))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", fields)
}

/// Map a Neo4j property type name (`String`, `Long`, `StringArray`, ...) to the
/// display type used in the schema description.
pub fn display_type(neo4j_type: &str) -> String {
    let trimmed = neo4j_type.trim();
    if trimmed.ends_with("Array") || trimmed.starts_with("LIST") {
        return "LIST".to_string();
    }
    match trimmed {
        "Long" | "Integer" | "INTEGER" => "INTEGER".to_string(),
        "Double" | "Float" | "FLOAT" => "FLOAT".to_string(),
        "String" | "STRING" => "STRING".to_string(),
        "Boolean" | "BOOLEAN" => "BOOLEAN".to_string(),
        "DateTime" | "ZonedDateTime" => "DATE_TIME".to_string(),
        "LocalDateTime" => "LOCAL_DATE_TIME".to_string(),
        "Point" => "POINT".to_string(),
        other => other.to_uppercase(),
    }
}
