//! Classification of extension definitions into object or scalar wrapper types.

use crate::error::ValidationError;
use crate::schema::{SchemaDefinition, TypeTag};
use crate::type_map::{PrimitiveTypeInfo, lookup_primitive, supported_primitive_names};

/// What a single extension definition generates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedTypeInfo {
    /// A message built from the definition's properties.
    Object { schema_name: String },

    /// A bare scalar carried in a well-known wrapper message.
    Primitive {
        schema_name: String,
        primitive: &'static PrimitiveTypeInfo,
    },
}

impl GeneratedTypeInfo {
    /// The definition this type was classified from.
    pub fn schema_name(&self) -> &str {
        match self {
            GeneratedTypeInfo::Object { schema_name }
            | GeneratedTypeInfo::Primitive { schema_name, .. } => schema_name,
        }
    }

    /// The scalar kind for wrapper types, `None` for objects.
    pub fn primitive(&self) -> Option<&'static PrimitiveTypeInfo> {
        match self {
            GeneratedTypeInfo::Object { .. } => None,
            GeneratedTypeInfo::Primitive { primitive, .. } => Some(*primitive),
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive().is_some()
    }
}

/// Classify one definition.
///
/// A missing or empty `id` is an error. An absent `type` or `"object"`
/// yields an object type; a supported scalar type name yields a wrapper
/// type; anything else is unsupported.
pub fn classify(def: &SchemaDefinition) -> Result<GeneratedTypeInfo, ValidationError> {
    if def.id().is_none() {
        return Err(ValidationError::MissingId {
            name: def.name.clone(),
        });
    }

    let tag = match def.type_tag() {
        None => {
            return Ok(GeneratedTypeInfo::Object {
                schema_name: def.name.clone(),
            });
        }
        Some(TypeTag::Single(tag)) if tag == "object" => {
            return Ok(GeneratedTypeInfo::Object {
                schema_name: def.name.clone(),
            });
        }
        Some(tag) => tag,
    };

    let primitive = match tag {
        TypeTag::Single(name) => lookup_primitive(name),
        TypeTag::Multiple(_) => None,
    };

    match primitive {
        Some(primitive) => Ok(GeneratedTypeInfo::Primitive {
            schema_name: def.name.clone(),
            primitive,
        }),
        None => Err(ValidationError::UnsupportedType {
            name: def.name.clone(),
            type_tag: tag.to_string(),
            supported: supported_primitive_names(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaNode;

    fn def(name: &str, id: Option<&str>, type_tag: Option<&str>) -> SchemaDefinition {
        SchemaDefinition {
            name: name.to_string(),
            schema: SchemaNode {
                id: id.map(str::to_string),
                type_tag: type_tag.map(|t| TypeTag::Single(t.to_string())),
                ..SchemaNode::default()
            },
        }
    }

    #[test]
    fn untyped_definition_is_object() {
        let info = classify(&def("Trace", Some("x-trace"), None)).unwrap();
        assert_eq!(
            info,
            GeneratedTypeInfo::Object {
                schema_name: "Trace".to_string()
            }
        );
        assert!(!info.is_primitive());
    }

    #[test]
    fn explicit_object_is_object() {
        let info = classify(&def("Trace", Some("x-trace"), Some("object"))).unwrap();
        assert_eq!(info.schema_name(), "Trace");
        assert!(info.primitive().is_none());
    }

    #[test]
    fn scalar_definition_is_primitive() {
        let info = classify(&def("Weight", Some("x-weight"), Some("number"))).unwrap();
        assert_eq!(info.schema_name(), "Weight");
        let primitive = info.primitive().unwrap();
        assert_eq!(primitive.wrapper, "DoubleValue");
        assert_eq!(primitive.native_type, "f64");
    }

    #[test]
    fn missing_and_empty_ids_are_rejected() {
        for id in [None, Some("")] {
            let err = classify(&def("Trace", id, None)).unwrap_err();
            assert_eq!(
                err,
                ValidationError::MissingId {
                    name: "Trace".to_string()
                }
            );
        }
    }

    #[test]
    fn missing_id_wins_over_bad_type() {
        let err = classify(&def("Tags", None, Some("array"))).unwrap_err();
        assert!(matches!(err, ValidationError::MissingId { .. }));
    }

    #[test]
    fn unsupported_type_lists_sorted_kinds() {
        let err = classify(&def("Tags", Some("x-tags"), Some("array"))).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedType {
                name: "Tags".to_string(),
                type_tag: "array".to_string(),
                supported: vec!["boolean", "integer", "number", "string"],
            }
        );
    }

    #[test]
    fn multiple_types_are_unsupported() {
        let mut odd = def("Odd", Some("x-odd"), None);
        odd.schema.type_tag = Some(TypeTag::Multiple(vec![
            "string".to_string(),
            "null".to_string(),
        ]));
        let err = classify(&odd).unwrap_err();
        assert!(
            matches!(err, ValidationError::UnsupportedType { ref type_tag, .. } if type_tag == "[string, null]")
        );
    }
}
