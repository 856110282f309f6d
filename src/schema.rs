//! JSON Schema types, loading, and reference resolution.
//!
//! Extension schemas are JSON Schema documents whose `definitions` table
//! holds one entry per extension. Before classification the document is
//! flattened: local `$ref`s that do not name a definition are inlined, and
//! `allOf` compositions are merged into the schema that owns them.
//! References to `#/definitions/...` are kept, since they become message
//! type references in the generated proto.

use std::fmt;
use std::path::Path;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Prefix of a reference that names an entry of the definitions table.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// A resolved schema document, ready for classification.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    /// Top-level `title`, if any.
    pub title: Option<String>,

    /// Definitions in declared order.
    pub definitions: Vec<SchemaDefinition>,
}

impl ResolvedSchema {
    /// Look up a definition by its table key.
    pub fn definition(&self, name: &str) -> Option<&SchemaDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }
}

/// One named entry of the definitions table.
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    /// The key under which the definition appears.
    pub name: String,

    /// The flattened schema of the definition.
    pub schema: SchemaNode,
}

impl SchemaDefinition {
    /// The declared extension identifier, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.schema.id.as_deref().filter(|id| !id.is_empty())
    }

    /// The declared `type`, if any.
    pub fn type_tag(&self) -> Option<&TypeTag> {
        self.schema.type_tag.as_ref()
    }
}

/// A JSON Schema node, reduced to the keywords the generator reads.
///
/// Unknown keywords are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaNode {
    /// Extension identifier (`id`, or `$id` in newer drafts).
    #[serde(default, alias = "$id")]
    pub id: Option<String>,

    #[serde(rename = "type", default)]
    pub type_tag: Option<TypeTag>,

    /// A remaining `#/definitions/...` reference.
    #[serde(rename = "$ref", default)]
    pub reference: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Object properties in declared order.
    #[serde(default, deserialize_with = "ordered_nodes")]
    pub properties: Vec<(String, SchemaNode)>,

    #[serde(default)]
    pub required: Vec<String>,

    #[serde(default)]
    pub items: Option<Items>,

    /// `additionalProperties`: a boolean or a schema.
    #[serde(rename = "additionalProperties", default)]
    pub additional_properties: Option<Value>,
}

impl SchemaNode {
    /// The single type name, when `type` is a plain string.
    pub fn single_type(&self) -> Option<&str> {
        match &self.type_tag {
            Some(TypeTag::Single(name)) => Some(name),
            _ => None,
        }
    }

    /// The definition name a remaining reference points at.
    pub fn referenced_definition(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|r| r.strip_prefix(DEFINITIONS_PREFIX))
    }

    /// Whether properties beyond the declared ones are allowed.
    pub fn allows_additional_properties(&self) -> bool {
        !matches!(self.additional_properties, Some(Value::Bool(false)))
    }
}

/// The `type` keyword: a single name or a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TypeTag {
    Single(String),
    Multiple(Vec<String>),
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Single(name) => f.write_str(name),
            TypeTag::Multiple(names) => write!(f, "[{}]", names.join(", ")),
        }
    }
}

/// The `items` keyword: one schema for every element, or a tuple.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Single(Box<SchemaNode>),
    Tuple(Vec<SchemaNode>),
}

fn ordered_nodes<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, SchemaNode)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedNodes;

    impl<'de> Visitor<'de> for OrderedNodes {
        type Value = Vec<(String, SchemaNode)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of property schemas")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, node)) = map.next_entry::<String, SchemaNode>()? {
                out.push((name, node));
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(OrderedNodes)
}

/// Load a schema document from disk.
///
/// Key order is preserved, so definitions keep their declared order.
pub fn load_schema(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let document: Value = serde_json::from_str(&content)?;
    Ok(document)
}

/// Load and resolve a schema file in one step.
pub fn load_and_resolve(path: &Path) -> Result<ResolvedSchema> {
    resolve(load_schema(path)?)
}

/// Flatten a schema document and extract its definitions.
pub fn resolve(document: Value) -> Result<ResolvedSchema> {
    let mut root = document;
    if !root.is_object() {
        return Err(Error::Schema("schema root must be an object".to_string()));
    }

    resolve_refs(&mut root)?;
    let snapshot = root.clone();
    flatten_all_of(&mut root, &snapshot, &mut Vec::new())?;

    let title = root
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut definitions = Vec::new();
    if let Some(table) = root.get("definitions") {
        let Value::Object(table) = table else {
            return Err(Error::Schema("'definitions' must be an object".to_string()));
        };
        for (name, value) in table {
            let schema: SchemaNode = serde_json::from_value(value.clone())
                .map_err(|e| Error::Schema(format!("definition '{name}': {e}")))?;
            definitions.push(SchemaDefinition {
                name: name.clone(),
                schema,
            });
        }
    }

    Ok(ResolvedSchema { title, definitions })
}

// ── $ref inlining ──────────────────────────────────────────────────────

/// Inline every local reference that does not name a definition.
///
/// References are expanded depth-first against the unmodified document. A
/// reference met again while its own target is still being expanded is a
/// cycle.
fn resolve_refs(root: &mut Value) -> Result<()> {
    let snapshot = root.clone();
    inline_refs(root, &snapshot, &mut Vec::new())
}

/// `expanding` holds the references whose targets are being inlined.
fn inline_refs(node: &mut Value, root: &Value, expanding: &mut Vec<String>) -> Result<()> {
    if let Some(reference) = node.get("$ref").and_then(Value::as_str).map(str::to_string) {
        let target = lookup_reference(root, &reference)?;
        if !reference.starts_with(DEFINITIONS_PREFIX) {
            if expanding.contains(&reference) {
                return Err(Error::Schema(format!(
                    "reference cycle through '{reference}'"
                )));
            }
            let mut target = target.clone();
            expanding.push(reference);
            inline_refs(&mut target, root, expanding)?;
            expanding.pop();
            *node = target;
            return Ok(());
        }
    }

    match node {
        Value::Object(map) => {
            for value in map.values_mut() {
                inline_refs(value, root, expanding)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                inline_refs(item, root, expanding)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Resolve a local `#/...` reference against the document root.
fn lookup_reference<'a>(root: &'a Value, reference: &str) -> Result<&'a Value> {
    let Some(pointer) = reference.strip_prefix('#') else {
        return Err(Error::Schema(format!(
            "unsupported non-local reference '{reference}'"
        )));
    };
    if pointer.is_empty() {
        return Err(Error::Schema(
            "reference cycle: '#' refers to the whole document".to_string(),
        ));
    }
    root.pointer(pointer)
        .ok_or_else(|| Error::Schema(format!("unresolved reference '{reference}'")))
}

// ── allOf flattening ───────────────────────────────────────────────────

/// `expanding` holds the definition references whose `allOf` members are
/// being merged.
fn flatten_all_of(node: &mut Value, root: &Value, expanding: &mut Vec<String>) -> Result<()> {
    match node {
        Value::Object(map) => {
            let members = map.remove("allOf");
            for value in map.values_mut() {
                flatten_all_of(value, root, expanding)?;
            }
            let Some(members) = members else {
                return Ok(());
            };
            let Value::Array(members) = members else {
                return Err(Error::Schema("'allOf' must be an array".to_string()));
            };
            for member in members {
                let member = flatten_member(member, root, expanding)?;
                let Value::Object(member) = member else {
                    return Err(Error::Schema(
                        "'allOf' members must be schemas".to_string(),
                    ));
                };
                merge_schema(map, member);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_all_of(item, root, expanding)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Flatten one `allOf` member, replacing a bare definition reference with
/// a flattened copy of the definition.
fn flatten_member(member: Value, root: &Value, expanding: &mut Vec<String>) -> Result<Value> {
    let Some(reference) = member.get("$ref").and_then(Value::as_str).map(str::to_string) else {
        let mut member = member;
        flatten_all_of(&mut member, root, expanding)?;
        return Ok(member);
    };

    if expanding.contains(&reference) {
        return Err(Error::Schema(format!(
            "allOf reference cycle through '{reference}'"
        )));
    }
    let mut target = lookup_reference(root, &reference)?.clone();
    expanding.push(reference);
    flatten_all_of(&mut target, root, expanding)?;
    expanding.pop();
    Ok(target)
}

/// Merge `member` into `target`. Keywords already present in `target` win;
/// `properties` are merged per key and `required` lists are unioned.
fn merge_schema(target: &mut Map<String, Value>, member: Map<String, Value>) {
    for (key, value) in member {
        match value {
            Value::Object(props) if key == "properties" => {
                let entry = target
                    .entry("properties")
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(existing) = entry {
                    for (name, schema) in props {
                        existing.entry(name).or_insert(schema);
                    }
                }
            }
            Value::Array(names) if key == "required" => {
                let entry = target
                    .entry("required")
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(existing) = entry {
                    for name in names {
                        if !existing.contains(&name) {
                            existing.push(name);
                        }
                    }
                }
            }
            value => {
                target.entry(key).or_insert(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn definitions_keep_declared_order() {
        let resolved = resolve(json!({
            "definitions": {
                "Zeta": {"id": "x-zeta"},
                "Alpha": {"id": "x-alpha", "type": "string"},
                "Mid": {"id": "x-mid"}
            }
        }))
        .unwrap();

        let names: Vec<&str> = resolved.definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(resolved.definitions[1].id(), Some("x-alpha"));
        assert_eq!(
            resolved.definitions[1].type_tag(),
            Some(&TypeTag::Single("string".to_string()))
        );
    }

    #[test]
    fn properties_keep_declared_order() {
        let resolved = resolve(json!({
            "definitions": {
                "Trace": {
                    "id": "x-trace",
                    "properties": {
                        "spanId": {"type": "string"},
                        "attempt": {"type": "integer"},
                        "baggage": {"type": "object"}
                    }
                }
            }
        }))
        .unwrap();

        let props: Vec<&str> = resolved.definitions[0]
            .schema
            .properties
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(props, vec!["spanId", "attempt", "baggage"]);
    }

    #[test]
    fn empty_id_reads_as_missing() {
        let resolved = resolve(json!({"definitions": {"Trace": {"id": ""}}})).unwrap();
        assert_eq!(resolved.definitions[0].id(), None);
    }

    #[test]
    fn document_without_definitions_is_empty() {
        let resolved = resolve(json!({"title": "nothing here"})).unwrap();
        assert!(resolved.definitions.is_empty());
        assert_eq!(resolved.title.as_deref(), Some("nothing here"));
    }

    #[test]
    fn inlines_non_definition_refs() {
        let resolved = resolve(json!({
            "shared": {"label": {"type": "string", "description": "A label."}},
            "definitions": {
                "Trace": {
                    "id": "x-trace",
                    "properties": {"name": {"$ref": "#/shared/label"}}
                }
            }
        }))
        .unwrap();

        let (_, name) = &resolved.definitions[0].schema.properties[0];
        assert_eq!(name.single_type(), Some("string"));
        assert_eq!(name.description.as_deref(), Some("A label."));
        assert!(name.reference.is_none());
    }

    #[test]
    fn keeps_definition_refs() {
        let resolved = resolve(json!({
            "definitions": {
                "Span": {"id": "x-span"},
                "Trace": {
                    "id": "x-trace",
                    "properties": {"root": {"$ref": "#/definitions/Span"}}
                }
            }
        }))
        .unwrap();

        let (_, root) = &resolved.definitions[1].schema.properties[0];
        assert_eq!(root.referenced_definition(), Some("Span"));
    }

    #[test]
    fn flattens_all_of() {
        let resolved = resolve(json!({
            "definitions": {
                "Base": {
                    "properties": {"name": {"type": "string"}, "size": {"type": "integer"}},
                    "required": ["name"]
                },
                "Cost": {
                    "id": "x-cost",
                    "properties": {"size": {"type": "number"}},
                    "allOf": [
                        {"$ref": "#/definitions/Base"},
                        {"required": ["size", "name"], "description": "Cost info."}
                    ]
                }
            }
        }))
        .unwrap();

        let cost = resolved.definition("Cost").unwrap();
        let props: Vec<(&str, Option<&str>)> = cost
            .schema
            .properties
            .iter()
            .map(|(name, node)| (name.as_str(), node.single_type()))
            .collect();
        // The definition's own `size` wins over the inherited one.
        assert_eq!(props, vec![("size", Some("number")), ("name", Some("string"))]);
        assert_eq!(cost.schema.required, vec!["name", "size"]);
        assert_eq!(cost.schema.description.as_deref(), Some("Cost info."));
        assert_eq!(cost.id(), Some("x-cost"));
    }

    #[test]
    fn ref_cycle_is_an_error() {
        let err = resolve(json!({
            "a": {"$ref": "#/b"},
            "b": {"$ref": "#/a"},
            "definitions": {}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("cycle"), "{err}");
    }

    #[test]
    fn all_of_cycle_is_an_error() {
        let err = resolve(json!({
            "definitions": {
                "A": {"id": "x-a", "allOf": [{"$ref": "#/definitions/B"}]},
                "B": {"id": "x-b", "allOf": [{"$ref": "#/definitions/A"}]}
            }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("allOf"), "{err}");
    }

    #[test]
    fn self_referencing_shared_node_is_a_cycle() {
        let err = resolve(json!({
            "shared": {
                "node": {
                    "type": "object",
                    "properties": {
                        "left": {"$ref": "#/shared/node"},
                        "right": {"$ref": "#/shared/node"}
                    }
                }
            },
            "definitions": {
                "Tree": {"id": "x-tree", "properties": {"root": {"$ref": "#/shared/node"}}}
            }
        }))
        .unwrap_err();
        assert!(
            err.to_string().contains("reference cycle through '#/shared/node'"),
            "{err}"
        );
    }

    #[test]
    fn repeated_all_of_self_reference_is_a_cycle() {
        let err = resolve(json!({
            "definitions": {
                "A": {
                    "id": "x-a",
                    "allOf": [{"$ref": "#/definitions/A"}, {"$ref": "#/definitions/A"}]
                }
            }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("allOf reference cycle"), "{err}");
    }

    #[test]
    fn shared_node_used_twice_is_inlined_at_both_sites() {
        let resolved = resolve(json!({
            "shared": {
                "point": {"type": "object", "properties": {"x": {"$ref": "#/shared/coord"}}},
                "coord": {"type": "number"}
            },
            "definitions": {
                "Line": {
                    "id": "x-line",
                    "properties": {
                        "from": {"$ref": "#/shared/point"},
                        "to": {"$ref": "#/shared/point"}
                    }
                }
            }
        }))
        .unwrap();

        for (_, end) in &resolved.definitions[0].schema.properties {
            assert!(end.reference.is_none());
            let (_, x) = &end.properties[0];
            assert_eq!(x.single_type(), Some("number"));
        }
    }

    #[test]
    fn remote_ref_is_an_error() {
        let err = resolve(json!({
            "definitions": {
                "Trace": {"id": "x-trace", "properties": {"a": {"$ref": "common.json#/x"}}}
            }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("non-local reference"), "{err}");
    }

    #[test]
    fn dangling_definition_ref_is_an_error() {
        let err = resolve(json!({
            "definitions": {
                "Trace": {"id": "x-trace", "properties": {"a": {"$ref": "#/definitions/Nope"}}}
            }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("#/definitions/Nope"), "{err}");
    }

    #[test]
    fn multiple_types_parse() {
        let resolved = resolve(json!({
            "definitions": {"Odd": {"id": "x-odd", "type": ["string", "null"]}}
        }))
        .unwrap();
        let tag = resolved.definitions[0].type_tag().unwrap();
        assert_eq!(tag.to_string(), "[string, null]");
    }
}
