//! The structural type model handed to the emitters.
//!
//! Each object extension definition becomes one [`TypeModel`], with one
//! [`FieldModel`] per property in declared order. Scalar wrapper
//! definitions need no message of their own.

use crate::classify::{GeneratedTypeInfo, classify};
use crate::codegen::GenerationStats;
use crate::naming::{field_name, message_name, rust_ident};
use crate::schema::{Items, ResolvedSchema, SchemaNode};
use crate::type_map::{PrimitiveTypeInfo, lookup_primitive};

/// A generated message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeModel {
    /// PascalCase message and struct name.
    pub name: String,

    /// The definition this message was built from.
    pub schema_name: String,

    pub description: Option<String>,

    /// Whether properties beyond the declared ones are accepted.
    pub open: bool,

    pub fields: Vec<FieldModel>,
}

/// One message field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldModel {
    /// The property name as it appears in the payload.
    pub json_name: String,

    /// snake_case field name.
    pub name: String,

    /// Proto field number, starting at 1.
    pub number: u32,

    pub kind: FieldKind,
    pub repeated: bool,
    pub required: bool,
    pub description: Option<String>,
}

/// The value type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(&'static PrimitiveTypeInfo),

    /// Another generated message, by name.
    Message(String),

    /// Free-form data, carried as JSON text in the proto.
    Any,
}

/// Build a message model for every object definition of `schema`.
pub fn build_models(schema: &ResolvedSchema, stats: &mut GenerationStats) -> Vec<TypeModel> {
    let mut models = Vec::new();
    for def in &schema.definitions {
        let Ok(GeneratedTypeInfo::Object { schema_name }) = classify(def) else {
            continue;
        };
        let model = build_model(&schema_name, &def.schema, schema, stats);
        tracing::debug!(type_name = %model.name, fields = model.fields.len(), "built type model");
        models.push(model);
    }
    models
}

fn build_model(
    schema_name: &str,
    node: &SchemaNode,
    schema: &ResolvedSchema,
    stats: &mut GenerationStats,
) -> TypeModel {
    let name = message_name(schema_name);
    let mut fields: Vec<FieldModel> = Vec::with_capacity(node.properties.len());

    for (json_name, property) in &node.properties {
        let snake_name = field_name(json_name);
        if snake_name.is_empty() {
            tracing::warn!(type_name = %name, property = %json_name, "skipping property with no usable field name");
            continue;
        }
        let taken = fields
            .iter()
            .any(|f| f.name == snake_name || rust_ident(&f.name) == rust_ident(&snake_name));
        if taken {
            tracing::warn!(type_name = %name, property = %json_name, field = %snake_name, "skipping property whose field name is already taken");
            continue;
        }

        let (repeated, kind) = resolve_field_kind(property, schema).unwrap_or_else(|| {
            tracing::warn!(type_name = %name, property = %json_name, "unsupported property type, defaulting to free-form");
            stats.unknown_types_defaulted += 1;
            (property.single_type() == Some("array"), FieldKind::Any)
        });

        fields.push(FieldModel {
            json_name: json_name.clone(),
            name: snake_name,
            number: fields.len() as u32 + 1,
            kind,
            repeated,
            required: node.required.iter().any(|r| r == json_name),
            description: property.description.clone(),
        });
    }

    TypeModel {
        name,
        schema_name: schema_name.to_string(),
        description: node.description.clone(),
        open: node.allows_additional_properties(),
        fields,
    }
}

/// Resolve a property to `(repeated, kind)`.
///
/// Returns `None` for shapes the generator cannot express, which the
/// caller defaults to [`FieldKind::Any`].
fn resolve_field_kind(property: &SchemaNode, schema: &ResolvedSchema) -> Option<(bool, FieldKind)> {
    if property.single_type() == Some("array") {
        let kind = match &property.items {
            None => FieldKind::Any,
            Some(Items::Tuple(_)) => return None,
            Some(Items::Single(items)) => {
                // No nested repeated fields in proto3.
                if items.single_type() == Some("array") {
                    return None;
                }
                resolve_value_kind(items, schema)?
            }
        };
        return Some((true, kind));
    }
    Some((false, resolve_value_kind(property, schema)?))
}

fn resolve_value_kind(node: &SchemaNode, schema: &ResolvedSchema) -> Option<FieldKind> {
    if let Some(target) = node.referenced_definition() {
        let def = schema.definition(target)?;
        return match def.schema.single_type() {
            None | Some("object") => Some(FieldKind::Message(message_name(target))),
            Some(tag) => lookup_primitive(tag).map(FieldKind::Scalar),
        };
    }

    match node.single_type() {
        Some("object") if !node.properties.is_empty() => None,
        Some("object") => Some(FieldKind::Any),
        Some(tag) => lookup_primitive(tag).map(FieldKind::Scalar),
        None if node.type_tag.is_some() => None,
        None if !node.properties.is_empty() => None,
        None => Some(FieldKind::Any),
    }
}
