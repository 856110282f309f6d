//! Rendering of the generated proto, decoder and main sources.
//!
//! All three emitters are pure string builders over an [`ArtifactPlan`]
//! and the type model; they never touch the filesystem. Output depends only
//! on their inputs, in the order the plan and model give.

use std::fmt::Write;

use crate::model::{FieldKind, FieldModel, TypeModel};
use crate::naming::rust_ident;
use crate::plan::{ArtifactPlan, DispatchShape};

/// Context string handed to top-level decoders.
const ROOT_CONTEXT: &str = "$root";

/// Render the header every generated file starts with.
///
/// License lines that are not already `//` comments are commented out.
pub fn file_header(license: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(license) = license {
        for line in license.lines() {
            let line = line.trim_end();
            if line.starts_with("//") {
                writeln!(out, "{line}").unwrap();
            } else if line.is_empty() {
                writeln!(out, "//").unwrap();
            } else {
                writeln!(out, "// {line}").unwrap();
            }
        }
        writeln!(out).unwrap();
    }
    writeln!(out, "// THIS FILE IS AUTOMATICALLY GENERATED.").unwrap();
    out
}

// ── Proto ──────────────────────────────────────────────────────────────

/// Render the `.proto` file for the extension package.
pub fn emit_proto(plan: &ArtifactPlan, models: &[TypeModel], header: &str) -> String {
    let mut out = String::from(header);

    writeln!(out).unwrap();
    writeln!(out, "syntax = \"proto3\";").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "package {};", plan.package_name).unwrap();

    for option in &plan.proto_options {
        writeln!(out).unwrap();
        writeln!(out, "{}", option.comment).unwrap();
        writeln!(
            out,
            "option {} = {};",
            option.name,
            proto_option_value(&option.value)
        )
        .unwrap();
    }

    for model in models {
        writeln!(out).unwrap();
        write_comment(&mut out, "", model.description.as_deref());
        writeln!(out, "message {} {{", model.name).unwrap();
        for field in &model.fields {
            write_comment(&mut out, "\t", field.description.as_deref());
            let repeated_kw = if field.repeated { "repeated " } else { "" };
            let suffix = match field.kind {
                FieldKind::Any => " // JSON-encoded",
                _ => "",
            };
            writeln!(
                out,
                "\t{repeated_kw}{} {} = {};{suffix}",
                proto_field_type(&field.kind),
                field.name,
                field.number
            )
            .unwrap();
        }
        writeln!(out, "}}").unwrap();
    }

    out
}

fn proto_option_value(value: &str) -> String {
    match value {
        "true" | "false" => value.to_string(),
        _ => format!("{value:?}"),
    }
}

fn proto_field_type(kind: &FieldKind) -> &str {
    match kind {
        FieldKind::Scalar(primitive) => primitive.proto_scalar,
        FieldKind::Message(name) => name,
        FieldKind::Any => "string",
    }
}

// ── Decoder module ─────────────────────────────────────────────────────

/// Render the Rust decoder module holding one struct per message.
pub fn emit_decoder(plan: &ArtifactPlan, models: &[TypeModel], header: &str) -> String {
    let mut out = String::from(header);

    writeln!(out).unwrap();
    writeln!(
        out,
        "//! Decoders for the `{}` extension messages.",
        plan.package_name
    )
    .unwrap();
    writeln!(out).unwrap();
    writeln!(out, "use serde::Deserialize;").unwrap();
    writeln!(out).unwrap();
    out.push_str(DECODE_ERROR_SOURCE);

    for model in models {
        writeln!(out).unwrap();
        write_doc(&mut out, "", model.description.as_deref());
        writeln!(out, "#[derive(Debug, Clone, PartialEq, Deserialize)]").unwrap();
        if !model.open {
            writeln!(out, "#[serde(deny_unknown_fields)]").unwrap();
        }
        writeln!(out, "pub struct {} {{", model.name).unwrap();
        for field in &model.fields {
            write_doc(&mut out, "    ", field.description.as_deref());
            let (rust_type, defaulted) = rust_field_type(field);
            if defaulted {
                writeln!(out, "    #[serde(rename = {:?}, default)]", field.json_name).unwrap();
            } else {
                writeln!(out, "    #[serde(rename = {:?})]", field.json_name).unwrap();
            }
            writeln!(out, "    pub {}: {rust_type},", rust_ident(&field.name)).unwrap();
        }
        writeln!(out, "}}").unwrap();

        writeln!(out).unwrap();
        writeln!(out, "impl {} {{", model.name).unwrap();
        writeln!(
            out,
            "    /// Decode from a parsed YAML value; `context` locates it in error messages."
        )
        .unwrap();
        writeln!(
            out,
            "    pub fn new(input: &serde_yaml::Value, context: &str) -> Result<Self, DecodeError> {{"
        )
        .unwrap();
        writeln!(
            out,
            "        Self::deserialize(input.clone()).map_err(|source| DecodeError {{"
        )
        .unwrap();
        writeln!(out, "            context: context.to_string(),").unwrap();
        writeln!(out, "            source,").unwrap();
        writeln!(out, "        }})").unwrap();
        writeln!(out, "    }}").unwrap();
        writeln!(out, "}}").unwrap();
    }

    out
}

const DECODE_ERROR_SOURCE: &str = "\
/// A payload that does not match its message type.
#[derive(Debug)]
pub struct DecodeError {
    pub context: String,
    pub source: serde_yaml::Error,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, \"{}: {}\", self.context, self.source)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
";

/// The Rust type of a field and whether a missing value falls back to
/// its default.
fn rust_field_type(field: &FieldModel) -> (String, bool) {
    let element = match &field.kind {
        FieldKind::Scalar(primitive) => primitive.native_type.to_string(),
        FieldKind::Message(name) => name.clone(),
        FieldKind::Any => "serde_yaml::Value".to_string(),
    };

    if field.repeated {
        return (format!("Vec<{element}>"), !field.required);
    }

    // Messages may refer to each other, so single message fields are boxed.
    let element = match field.kind {
        FieldKind::Message(_) => format!("Box<{element}>"),
        _ => element,
    };
    if field.required {
        (element, false)
    } else {
        (format!("Option<{element}>"), true)
    }
}

// ── Main module ────────────────────────────────────────────────────────

/// Render the main module: imports, the decoder module, the dispatch
/// function and `main`.
///
/// `decoder_path` is the decoder file relative to the main module.
pub fn emit_main(plan: &ArtifactPlan, decoder_path: &str, header: &str) -> String {
    let mut out = String::from(header);
    let module = rust_ident(&plan.package_name);

    writeln!(out).unwrap();
    for import in plan.imports() {
        writeln!(out, "use {import};").unwrap();
    }
    writeln!(out).unwrap();
    writeln!(out, "#[path = {decoder_path:?}]").unwrap();
    writeln!(out, "mod {module};").unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "fn handle_extension(extension_name: &str, yaml_input: &str) -> ExtensionResult {{"
    )
    .unwrap();
    writeln!(out, "    match extension_name {{").unwrap();
    writeln!(out, "        // All supported extensions").unwrap();

    for entry in &plan.dispatch {
        writeln!(out, "        {:?} => {{", entry.extension_id).unwrap();
        match &entry.shape {
            DispatchShape::DecodeObject { type_name } => {
                writeln!(
                    out,
                    "            let info: serde_yaml::Value = serde_yaml::from_str(yaml_input)?;"
                )
                .unwrap();
                writeln!(
                    out,
                    "            let new_object = {module}::{type_name}::new(&info, {ROOT_CONTEXT:?})?;"
                )
                .unwrap();
                writeln!(out, "            Ok(Some(Box::new(new_object)))").unwrap();
            }
            DispatchShape::WrapScalar {
                native_type,
                wrapper,
            } => {
                writeln!(
                    out,
                    "            let info: {native_type} = serde_yaml::from_str(yaml_input)?;"
                )
                .unwrap();
                writeln!(
                    out,
                    "            Ok(Some(Box::new(wrappers::{wrapper} {{ value: info }})))"
                )
                .unwrap();
            }
        }
        writeln!(out, "        }}").unwrap();
    }

    writeln!(out, "        _ => Ok(None),").unwrap();
    writeln!(out, "    }}").unwrap();
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "fn main() {{").unwrap();
    writeln!(out, "    process_extension(handle_extension);").unwrap();
    writeln!(out, "}}").unwrap();

    out
}

// ── Shared helpers ─────────────────────────────────────────────────────

fn write_comment(out: &mut String, indent: &str, text: Option<&str>) {
    write_prefixed(out, indent, "//", text);
}

fn write_doc(out: &mut String, indent: &str, text: Option<&str>) {
    write_prefixed(out, indent, "///", text);
}

fn write_prefixed(out: &mut String, indent: &str, marker: &str, text: Option<&str>) {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return;
    };
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            writeln!(out, "{indent}{marker}").unwrap();
        } else {
            writeln!(out, "{indent}{marker} {line}").unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GenerationStats;
    use crate::model::build_models;
    use crate::plan::plan;
    use crate::registry::{build, into_result};
    use crate::schema::{ResolvedSchema, resolve};
    use serde_json::json;

    fn sample() -> (ArtifactPlan, Vec<TypeModel>) {
        let schema: ResolvedSchema = resolve(json!({
            "definitions": {
                "Trace": {
                    "id": "x-trace",
                    "description": "Tracing metadata.",
                    "additionalProperties": false,
                    "required": ["spanId"],
                    "properties": {
                        "spanId": {"type": "string", "description": "Span identifier."},
                        "type": {"type": "string"},
                        "children": {"type": "array", "items": {"$ref": "#/definitions/Trace"}},
                        "parent": {"$ref": "#/definitions/Trace"},
                        "baggage": {"type": "object"}
                    }
                },
                "Weight": {"id": "x-weight", "type": "number"}
            }
        }))
        .unwrap();
        let registry = into_result(build(&schema.definitions)).unwrap();
        let models = build_models(&schema, &mut GenerationStats::default());
        (plan(&registry, "sample"), models)
    }

    #[test]
    fn header_comments_license_lines() {
        let header = file_header(Some("Copyright 2026 Example\n\n// already a comment"));
        assert_eq!(
            header,
            "// Copyright 2026 Example\n//\n// already a comment\n\n// THIS FILE IS AUTOMATICALLY GENERATED.\n"
        );
        assert_eq!(
            file_header(None),
            "// THIS FILE IS AUTOMATICALLY GENERATED.\n"
        );
    }

    #[test]
    fn proto_has_package_options_and_messages() {
        let (plan, models) = sample();
        let proto = emit_proto(&plan, &models, &file_header(None));

        assert!(proto.starts_with("// THIS FILE IS AUTOMATICALLY GENERATED.\n\nsyntax = \"proto3\";"));
        assert!(proto.contains("package sample;"));

        let positions: Vec<usize> = [
            "option java_multiple_files = true;",
            "option java_outer_classname = \"VendorExtensionProto\";",
            "option java_package = \"org.openapi.extension.sample\";",
            "option objc_class_prefix = \"sample\";",
        ]
        .iter()
        .map(|line| proto.find(line).unwrap_or_else(|| panic!("missing {line}")))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(proto.contains("// Tracing metadata.\nmessage Trace {"));
        assert!(proto.contains("\t// Span identifier.\n\tstring span_id = 1;"));
        assert!(proto.contains("\tstring type = 2;"));
        assert!(proto.contains("\trepeated Trace children = 3;"));
        assert!(proto.contains("\tTrace parent = 4;"));
        assert!(proto.contains("\tstring baggage = 5; // JSON-encoded"));
        assert!(!proto.contains("message Weight"));
    }

    #[test]
    fn decoder_structs_follow_field_shapes() {
        let (plan, models) = sample();
        let decoder = emit_decoder(&plan, &models, &file_header(None));

        assert!(decoder.contains("//! Decoders for the `sample` extension messages."));
        assert!(decoder.contains("pub struct DecodeError {"));
        assert!(decoder.contains("/// Tracing metadata.\n#[derive(Debug, Clone, PartialEq, Deserialize)]\n#[serde(deny_unknown_fields)]\npub struct Trace {"));
        assert!(decoder.contains("    #[serde(rename = \"spanId\")]\n    pub span_id: String,"));
        assert!(decoder.contains("    #[serde(rename = \"type\", default)]\n    pub r#type: Option<String>,"));
        assert!(decoder.contains("    pub children: Vec<Trace>,"));
        assert!(decoder.contains("    pub parent: Option<Box<Trace>>,"));
        assert!(decoder.contains("    pub baggage: Option<serde_yaml::Value>,"));
        assert!(decoder.contains(
            "    pub fn new(input: &serde_yaml::Value, context: &str) -> Result<Self, DecodeError> {"
        ));
    }

    #[test]
    fn main_dispatches_in_plan_order() {
        let (plan, _) = sample();
        let main = emit_main(&plan, "proto/x-sample.rs", &file_header(None));

        assert!(main.contains("use openapi_extension::ExtensionResult;"));
        assert!(main.contains("use openapi_extension::process_extension;"));
        assert!(main.contains("use openapi_extension::wrappers;"));
        assert!(main.contains("#[path = \"proto/x-sample.rs\"]\nmod sample;"));
        assert!(main.contains("        // All supported extensions\n        \"x-trace\" => {"));
        assert!(main.contains("let new_object = sample::Trace::new(&info, \"$root\")?;"));
        assert!(main.contains("let info: f64 = serde_yaml::from_str(yaml_input)?;"));
        assert!(main.contains("Ok(Some(Box::new(wrappers::DoubleValue { value: info })))"));
        assert!(main.contains("        _ => Ok(None),"));
        assert!(main.contains("fn main() {\n    process_extension(handle_extension);\n}"));

        let trace = main.find("\"x-trace\" =>").unwrap();
        let weight = main.find("\"x-weight\" =>").unwrap();
        assert!(trace < weight);
    }

    #[test]
    fn main_without_scalars_skips_wrapper_import() {
        let (mut plan, _) = sample();
        plan.dispatch.retain(|e| !e.type_info.is_primitive());
        plan.needs_wrapper_import = false;
        let main = emit_main(&plan, "proto/x-sample.rs", &file_header(None));
        assert!(!main.contains("wrappers"));
    }

    #[test]
    fn reserved_names_get_usable_identifiers() {
        let schema = resolve(json!({
            "definitions": {
                "self": {
                    "id": "x-self",
                    "required": ["2fa"],
                    "properties": {
                        "self": {"type": "string"},
                        "2fa": {"type": "boolean"}
                    }
                }
            }
        }))
        .unwrap();
        let registry = into_result(build(&schema.definitions)).unwrap();
        let models = build_models(&schema, &mut GenerationStats::default());
        let plan = plan(&registry, "self");

        let proto = emit_proto(&plan, &models, &file_header(None));
        assert!(proto.contains("message Self_ {"));
        assert!(proto.contains("\tstring self = 1;"));
        assert!(proto.contains("\tbool _2fa = 2;"));

        let decoder = emit_decoder(&plan, &models, &file_header(None));
        assert!(decoder.contains("pub struct Self_ {"));
        assert!(decoder.contains("    #[serde(rename = \"self\", default)]\n    pub self_: Option<String>,"));
        assert!(decoder.contains("    #[serde(rename = \"2fa\")]\n    pub _2fa: bool,"));

        let main = emit_main(&plan, "proto/x-self.rs", &file_header(None));
        assert!(main.contains("mod self_;"));
        assert!(main.contains("let new_object = self_::Self_::new(&info, \"$root\")?;"));
    }
}
