//! Schema references in Cypher text
//!
//! A pattern scanner over normalized query text (string literals blanked, comments
//! removed). It finds the labels, relationship types and property keys a query
//! depends on, plus the `(:A)-[:R]->(:B)` triples its patterns assume. This is not a
//! Cypher parser: anything it cannot attribute to a bound variable is left unchecked.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::graph_schema::GraphSchema;

lazy_static! {
    // Whichever starts first wins, so a quote inside a comment or a `//` inside
    // a literal is consumed by the enclosing token.
    static ref LITERAL_OR_COMMENT: Regex = Regex::new(
        r#"(?s)`[^`]*`|'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*"|/\*.*?\*/|//[^\n]*"#
    )
    .unwrap();

    // (var:Label:Other {key: value})
    static ref NODE_PATTERN: Regex = Regex::new(
        r"\(\s*(?P<var>[A-Za-z_][A-Za-z0-9_]*|`[^`]+`)?\s*(?P<labels>:\s*(?:[A-Za-z_][A-Za-z0-9_]*|`[^`]+`)(?:\s*[:|&]\s*(?:[A-Za-z_][A-Za-z0-9_]*|`[^`]+`))*)?\s*(?P<props>\{[^{}]*\})?\s*\)"
    )
    .unwrap();

    // Text between two adjacent node patterns that makes them one relationship hop
    static ref CONNECTOR: Regex =
        Regex::new(r"^\s*(?P<left><)?\s*-\s*(?:\[(?P<body>[^\]]*)\])?\s*-\s*(?P<right>>)?\s*$")
            .unwrap();

    // [var:TYPE|OTHER*1..3 {key: value}]
    static ref REL_BODY: Regex = Regex::new(
        r"^\s*(?P<var>[A-Za-z_][A-Za-z0-9_]*|`[^`]+`)?\s*(?::\s*(?P<types>(?:[A-Za-z_][A-Za-z0-9_]*|`[^`]+`)(?:\s*\|\s*:?\s*(?:[A-Za-z_][A-Za-z0-9_]*|`[^`]+`))*))?\s*(?P<len>\*[0-9.\s]*)?\s*(?P<props>\{[^{}]*\})?\s*$"
    )
    .unwrap();

    static ref IDENTIFIER: Regex = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*|`[^`]+`").unwrap();
    static ref MAP_KEY: Regex =
        Regex::new(r"(?:^|[{,])\s*(?P<key>[A-Za-z_][A-Za-z0-9_]*|`[^`]+`)\s*:").unwrap();
    static ref PROPERTY_ACCESS: Regex = Regex::new(
        r"(?P<var>\b[A-Za-z_][A-Za-z0-9_]*|`[^`]+`)\s*\.\s*(?P<prop>[A-Za-z_][A-Za-z0-9_]*|`[^`]+`)"
    )
    .unwrap();
    static ref LABEL_PREDICATE: Regex = Regex::new(
        r"(?i)\b(?:where|and|or|xor|not)\s+\(?\s*(?P<var>[A-Za-z_][A-Za-z0-9_]*)\s*(?P<labels>(?::\s*(?:[A-Za-z_][A-Za-z0-9_]*|`[^`]+`))+)"
    )
    .unwrap();
}

/// Blank string literals and remove comments.
///
/// Literal contents never name schema elements, and a `(`, `-` or `.` inside a
/// literal must not be mistaken for pattern syntax.
pub fn normalize(cypher: &str) -> String {
    LITERAL_OR_COMMENT
        .replace_all(cypher, |caps: &Captures| {
            let token = &caps[0];
            if token.starts_with('`') {
                token.to_string()
            } else if token.starts_with('\'') || token.starts_with('"') {
                "''".to_string()
            } else {
                " ".to_string()
            }
        })
        .into_owned()
}

/// Number of relationship patterns (`-[...]->`, `<--`, `--`, ...) linking node
/// patterns in `cypher`, regardless of direction. A variable-length segment counts
/// once.
pub fn count_relationship_hops(cypher: &str) -> usize {
    let normalized = normalize(cypher);
    let nodes = node_patterns(&normalized);
    nodes
        .windows(2)
        .filter(|pair| CONNECTOR.is_match(&normalized[pair[0].end..pair[1].start]))
        .count()
}

/// One schema element a query depends on
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaReference {
    Label(String),
    RelType(String),
    /// Property on a node whose labels are known: must exist on one of them
    NodeProperty {
        labels: Vec<String>,
        property: String,
    },
    /// Property on an unlabeled node variable: must exist on some label
    AnyNodeProperty(String),
    RelProperty {
        rel_types: Vec<String>,
        property: String,
    },
    AnyRelProperty(String),
    /// A single-hop pattern between labeled endpoints
    Pattern {
        from: Vec<String>,
        rel_types: Vec<String>,
        to: Vec<String>,
        directed: bool,
    },
}

impl SchemaReference {
    pub fn exists_in(&self, schema: &GraphSchema) -> bool {
        match self {
            SchemaReference::Label(label) => schema.has_label(label),
            SchemaReference::RelType(rel_type) => schema.has_rel_type(rel_type),
            SchemaReference::NodeProperty { labels, property } => labels
                .iter()
                .any(|label| schema.label_has_property(label, property)),
            SchemaReference::AnyNodeProperty(property) => schema.any_node_has_property(property),
            SchemaReference::RelProperty {
                rel_types,
                property,
            } => rel_types
                .iter()
                .any(|rel_type| schema.rel_has_property(rel_type, property)),
            SchemaReference::AnyRelProperty(property) => schema.any_rel_has_property(property),
            SchemaReference::Pattern {
                from,
                rel_types,
                to,
                directed,
            } => from.iter().any(|f| {
                to.iter().any(|t| {
                    rel_types.iter().any(|r| {
                        schema.has_pattern(f, r, t) || (!directed && schema.has_pattern(t, r, f))
                    })
                })
            }),
        }
    }
}

impl fmt::Display for SchemaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaReference::Label(label) => write!(f, "label :{}", label),
            SchemaReference::RelType(rel_type) => write!(f, "relationship type :{}", rel_type),
            SchemaReference::NodeProperty { labels, property } => {
                write!(f, "property {} on :{}", property, labels.join("|"))
            }
            SchemaReference::AnyNodeProperty(property) => {
                write!(f, "node property {}", property)
            }
            SchemaReference::RelProperty {
                rel_types,
                property,
            } => write!(f, "property {} on [:{}]", property, rel_types.join("|")),
            SchemaReference::AnyRelProperty(property) => {
                write!(f, "relationship property {}", property)
            }
            SchemaReference::Pattern {
                from,
                rel_types,
                to,
                directed,
            } => write!(
                f,
                "pattern (:{})-[:{}]-{}(:{})",
                from.join("|"),
                rel_types.join("|"),
                if *directed { ">" } else { "" },
                to.join("|")
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VariableKind {
    Node,
    Relationship,
}

#[derive(Debug)]
struct Binding {
    kind: VariableKind,
    names: Vec<String>,
}

#[derive(Debug)]
struct NodeMatch {
    start: usize,
    end: usize,
    var: Option<String>,
    labels: Vec<String>,
    props: Vec<String>,
}

/// Collect every schema reference in `cypher`, deduplicated.
pub fn extract_references(cypher: &str) -> Vec<SchemaReference> {
    let normalized = normalize(cypher);
    let nodes = node_patterns(&normalized);

    let mut refs = BTreeSet::new();
    let mut bindings: HashMap<String, Binding> = HashMap::new();

    for node in &nodes {
        for label in &node.labels {
            refs.insert(SchemaReference::Label(label.clone()));
        }
        if let Some(var) = &node.var {
            bind(&mut bindings, var, VariableKind::Node, &node.labels);
        }
    }

    for caps in LABEL_PREDICATE.captures_iter(&normalized) {
        let labels = split_names(&caps["labels"]);
        for label in &labels {
            refs.insert(SchemaReference::Label(label.clone()));
        }
        bind(&mut bindings, &caps["var"], VariableKind::Node, &labels);
    }

    // Relationship hops and their bindings; endpoint labels are resolved after
    // every binding is known so `MATCH (p:Person) ... (p)-[:R]->(m)` still checks
    let mut hops = Vec::new();
    for pair in nodes.windows(2) {
        let gap = &normalized[pair[0].end..pair[1].start];
        let Some(connector) = CONNECTOR.captures(gap) else {
            continue;
        };
        let body = connector.name("body").map(|m| m.as_str()).unwrap_or("");
        let Some(rel) = REL_BODY.captures(body) else {
            continue;
        };

        let rel_types = rel.name("types").map(|m| split_names(m.as_str())).unwrap_or_default();
        for rel_type in &rel_types {
            refs.insert(SchemaReference::RelType(rel_type.clone()));
        }
        if let Some(var) = rel.name("var") {
            bind(&mut bindings, &unquote(var.as_str()), VariableKind::Relationship, &rel_types);
        }
        if let Some(props) = rel.name("props") {
            for key in map_keys(props.as_str()) {
                refs.insert(property_reference(VariableKind::Relationship, &rel_types, key));
            }
        }

        let left = connector.name("left").is_some();
        let right = connector.name("right").is_some();
        let variable_length = rel.name("len").is_some();
        hops.push((&pair[0], &pair[1], rel_types, left, right, variable_length));
    }

    for node in &nodes {
        let labels = resolved_labels(node, &bindings);
        for key in &node.props {
            refs.insert(property_reference(VariableKind::Node, &labels, key.clone()));
        }
    }

    for (from, to, rel_types, left, right, variable_length) in hops {
        if variable_length || rel_types.is_empty() {
            continue;
        }
        let from_labels = resolved_labels(from, &bindings);
        let to_labels = resolved_labels(to, &bindings);
        if from_labels.is_empty() || to_labels.is_empty() {
            continue;
        }
        let (from_labels, to_labels, directed) = match (left, right) {
            (true, false) => (to_labels, from_labels, true),
            (false, true) => (from_labels, to_labels, true),
            _ => (from_labels, to_labels, false),
        };
        refs.insert(SchemaReference::Pattern {
            from: from_labels,
            rel_types,
            to: to_labels,
            directed,
        });
    }

    for caps in PROPERTY_ACCESS.captures_iter(&normalized) {
        let var = unquote(&caps["var"]);
        let Some(binding) = bindings.get(&var) else {
            continue;
        };
        refs.insert(property_reference(
            binding.kind,
            &binding.names,
            unquote(&caps["prop"]),
        ));
    }

    refs.into_iter().collect()
}

fn node_patterns(normalized: &str) -> Vec<NodeMatch> {
    NODE_PATTERN
        .captures_iter(normalized)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if is_call_argument(&normalized[..whole.start()]) {
                return None;
            }
            Some(NodeMatch {
                start: whole.start(),
                end: whole.end(),
                var: caps.name("var").map(|m| unquote(m.as_str())),
                labels: caps
                    .name("labels")
                    .map(|m| split_names(m.as_str()))
                    .unwrap_or_default(),
                props: caps
                    .name("props")
                    .map(|m| map_keys(m.as_str()).collect())
                    .unwrap_or_default(),
            })
        })
        .collect()
}

/// Words that may sit directly before a pattern's `(` without making it a call
const PATTERN_KEYWORDS: &[&str] = &[
    "MATCH", "OPTIONAL", "MERGE", "CREATE", "WHERE", "AND", "OR", "XOR", "NOT", "WITH",
    "UNWIND", "RETURN", "DISTINCT", "DELETE", "DETACH", "SET", "REMOVE", "ON", "IN", "IS",
    "CASE", "WHEN", "THEN", "ELSE", "YIELD", "UNION", "ORDER", "BY", "SKIP", "LIMIT",
];

/// `count(n)` and friends: a function name right before `(` makes it a call.
/// Clause keywords (`MATCH(n)`, `WHERE(n)`) do not.
fn is_call_argument(before: &str) -> bool {
    let word_len = before
        .chars()
        .rev()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .map(char::len_utf8)
        .sum::<usize>();
    if word_len == 0 {
        return before.ends_with('`');
    }
    let word = &before[before.len() - word_len..];
    !PATTERN_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(word))
}

fn bind(bindings: &mut HashMap<String, Binding>, var: &str, kind: VariableKind, names: &[String]) {
    let binding = bindings.entry(var.to_string()).or_insert_with(|| Binding {
        kind,
        names: Vec::new(),
    });
    for name in names {
        if !binding.names.contains(name) {
            binding.names.push(name.clone());
        }
    }
}

fn resolved_labels(node: &NodeMatch, bindings: &HashMap<String, Binding>) -> Vec<String> {
    if !node.labels.is_empty() {
        return node.labels.clone();
    }
    node.var
        .as_ref()
        .and_then(|var| bindings.get(var))
        .filter(|binding| binding.kind == VariableKind::Node)
        .map(|binding| binding.names.clone())
        .unwrap_or_default()
}

fn property_reference(kind: VariableKind, names: &[String], property: String) -> SchemaReference {
    match (kind, names.is_empty()) {
        (VariableKind::Node, true) => SchemaReference::AnyNodeProperty(property),
        (VariableKind::Node, false) => SchemaReference::NodeProperty {
            labels: names.to_vec(),
            property,
        },
        (VariableKind::Relationship, true) => SchemaReference::AnyRelProperty(property),
        (VariableKind::Relationship, false) => SchemaReference::RelProperty {
            rel_types: names.to_vec(),
            property,
        },
    }
}

fn split_names(text: &str) -> Vec<String> {
    IDENTIFIER
        .find_iter(text)
        .map(|m| unquote(m.as_str()))
        .collect()
}

fn map_keys(map: &str) -> impl Iterator<Item = String> + '_ {
    MAP_KEY
        .captures_iter(map)
        .map(|caps| unquote(&caps["key"]))
}

fn unquote(name: &str) -> String {
    name.trim_matches('`').to_string()
}
