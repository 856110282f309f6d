//! Building the extension registry from a schema's definitions.
//!
//! Every definition is visited, in declared order, and every problem is
//! recorded. The registry is handed back even when problems were found so
//! callers can report on it, but a non-empty error list fails the batch.

use std::collections::HashMap;

use crate::classify::{GeneratedTypeInfo, classify};
use crate::error::{ValidationError, ValidationErrors};
use crate::naming::message_name;
use crate::schema::SchemaDefinition;

/// Extension identifiers mapped to their classified types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionRegistry {
    entries: HashMap<String, GeneratedTypeInfo>,
}

impl ExtensionRegistry {
    pub fn get(&self, id: &str) -> Option<&GeneratedTypeInfo> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &GeneratedTypeInfo)> {
        self.entries.iter().map(|(id, info)| (id.as_str(), info))
    }

    /// Whether any entry is a scalar wrapper type.
    pub fn has_primitives(&self) -> bool {
        self.entries.values().any(GeneratedTypeInfo::is_primitive)
    }
}

/// Classify every definition and collect the registry plus all problems.
///
/// The first definition to claim an id keeps it; later claimants are
/// reported as [`ValidationError::DuplicateId`] naming both definitions.
/// A colliding definition reports the collision even if its type is also
/// unsupported.
///
/// Object definitions must also generate distinct, non-empty message names;
/// `trace_info` and `TraceInfo` both generate `TraceInfo` and collide.
pub fn build(defs: &[SchemaDefinition]) -> (ExtensionRegistry, Vec<ValidationError>) {
    let mut registry = ExtensionRegistry::default();
    let mut errors = Vec::new();
    // Message name -> the definition that generates it.
    let mut messages: HashMap<String, &str> = HashMap::new();

    for def in defs {
        let Some(id) = def.id() else {
            errors.push(ValidationError::MissingId {
                name: def.name.clone(),
            });
            continue;
        };

        if let Some(first) = registry.entries.get(id) {
            errors.push(ValidationError::DuplicateId {
                name: def.name.clone(),
                first: first.schema_name().to_string(),
                id: id.to_string(),
            });
            continue;
        }

        let info = match classify(def) {
            Ok(info) => info,
            Err(err) => {
                errors.push(err);
                continue;
            }
        };

        if let GeneratedTypeInfo::Object { .. } = info {
            let type_name = message_name(&def.name);
            if type_name.is_empty() {
                errors.push(ValidationError::InvalidTypeName {
                    name: def.name.clone(),
                });
                continue;
            }
            if let Some(first) = messages.get(type_name.as_str()) {
                errors.push(ValidationError::DuplicateTypeName {
                    name: def.name.clone(),
                    first: first.to_string(),
                    type_name,
                });
                continue;
            }
            messages.insert(type_name, def.name.as_str());
        }

        tracing::debug!(id, schema = %def.name, primitive = info.is_primitive(), "registered extension");
        registry.entries.insert(id.to_string(), info);
    }

    (registry, errors)
}

/// Gate a build result: the registry only if no problems were found.
pub fn into_result(
    (registry, errors): (ExtensionRegistry, Vec<ValidationError>),
) -> Result<ExtensionRegistry, ValidationErrors> {
    match ValidationErrors::new(errors) {
        None => Ok(registry),
        Some(errors) => Err(errors),
    }
}
