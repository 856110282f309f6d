//! Maps JSON Schema scalar types to their Rust, proto and wrapper forms.
//!
//! # Type Mapping Table
//!
//! | JSON Schema type | Rust type | Proto scalar | Wrapper message |
//! |------------------|-----------|--------------|-----------------|
//! | `boolean`        | `bool`    | `bool`       | `BoolValue`     |
//! | `integer`        | `i64`     | `int64`      | `Int64Value`    |
//! | `number`         | `f64`     | `double`     | `DoubleValue`   |
//! | `string`         | `String`  | `string`     | `StringValue`   |
//!
//! `object` is not in the table; object definitions become messages.

/// One supported scalar kind.
#[derive(Debug, PartialEq, Eq)]
pub struct PrimitiveTypeInfo {
    /// JSON Schema type name (e.g., `"number"`).
    pub kind: &'static str,

    /// Native Rust type a decoded value is held in (e.g., `"f64"`).
    pub native_type: &'static str,

    /// Well-known wrapper message for a bare value (e.g., `"DoubleValue"`).
    pub wrapper: &'static str,

    /// Proto3 scalar used for message fields of this kind.
    pub proto_scalar: &'static str,
}

/// The supported scalar kinds, sorted by `kind`.
pub static PRIMITIVE_TYPES: [PrimitiveTypeInfo; 4] = [
    PrimitiveTypeInfo {
        kind: "boolean",
        native_type: "bool",
        wrapper: "BoolValue",
        proto_scalar: "bool",
    },
    PrimitiveTypeInfo {
        kind: "integer",
        native_type: "i64",
        wrapper: "Int64Value",
        proto_scalar: "int64",
    },
    PrimitiveTypeInfo {
        kind: "number",
        native_type: "f64",
        wrapper: "DoubleValue",
        proto_scalar: "double",
    },
    PrimitiveTypeInfo {
        kind: "string",
        native_type: "String",
        wrapper: "StringValue",
        proto_scalar: "string",
    },
];

/// Look up a JSON Schema type name in the scalar table.
///
/// Returns `None` for `object`, `array`, `null` and anything unrecognized.
pub fn lookup_primitive(type_tag: &str) -> Option<&'static PrimitiveTypeInfo> {
    PRIMITIVE_TYPES.iter().find(|info| info.kind == type_tag)
}

/// The supported scalar kind names in sorted order, for error messages.
pub fn supported_primitive_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = PRIMITIVE_TYPES.iter().map(|info| info.kind).collect();
    names.sort_unstable();
    names
}
