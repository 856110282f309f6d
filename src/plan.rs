//! Planning the generated artifacts for a validated registry.
//!
//! The plan fixes everything the emitters need that is not part of the
//! type model: the package name, the proto file options, the imports of
//! the main module and the dispatch table. The dispatch table is sorted by
//! extension id so generated code is byte-identical across runs.

use std::path::{Path, PathBuf};

use crate::classify::GeneratedTypeInfo;
use crate::naming::{canonicalize, message_name};
use crate::registry::ExtensionRegistry;

/// Root of the Java package every extension package lives under.
pub const JAVA_PACKAGE_ROOT: &str = "org.openapi.extension";

/// Name of the runtime crate generated dispatch code calls into.
pub const RUNTIME_CRATE: &str = "openapi_extension";

/// One file-level proto compiler option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoOption {
    pub name: String,
    pub value: String,
    pub comment: String,
}

impl ProtoOption {
    fn new(name: &str, value: impl Into<String>, comment: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            comment: comment.to_string(),
        }
    }
}

/// How the dispatch arm for one extension decodes its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchShape {
    /// Decode a YAML mapping, then build the generated message type.
    DecodeObject { type_name: String },

    /// Decode a scalar, then wrap it in a well-known wrapper message.
    WrapScalar {
        native_type: &'static str,
        wrapper: &'static str,
    },
}

/// One arm of the generated dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchEntry {
    pub extension_id: String,
    pub type_info: GeneratedTypeInfo,
    pub shape: DispatchShape,
}

/// Everything the emitters need besides the type model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPlan {
    /// Canonical package name, shared by the proto and Rust packages.
    pub package_name: String,

    /// File-level proto options, in emission order.
    pub proto_options: Vec<ProtoOption>,

    /// Dispatch arms sorted by extension id.
    pub dispatch: Vec<DispatchEntry>,

    /// Set when any dispatch arm wraps a scalar.
    pub needs_wrapper_import: bool,
}

impl ArtifactPlan {
    /// `use` paths for the generated main module.
    pub fn imports(&self) -> Vec<String> {
        let mut imports = vec![
            format!("{RUNTIME_CRATE}::ExtensionResult"),
            format!("{RUNTIME_CRATE}::process_extension"),
        ];
        if self.needs_wrapper_import {
            imports.push(format!("{RUNTIME_CRATE}::wrappers"));
        }
        imports
    }
}

/// Plan the artifacts for `registry`.
///
/// `package_name_seed` is the extension's base name with the `x-` marker
/// already stripped.
pub fn plan(registry: &ExtensionRegistry, package_name_seed: &str) -> ArtifactPlan {
    let package_name = canonicalize(package_name_seed);
    let proto_options = proto_options(&package_name);

    let mut entries: Vec<(&str, &GeneratedTypeInfo)> = registry.iter().collect();
    entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

    let mut needs_wrapper_import = false;
    let mut dispatch = Vec::with_capacity(entries.len());
    for (id, info) in entries {
        let shape = match info {
            GeneratedTypeInfo::Object { schema_name } => DispatchShape::DecodeObject {
                type_name: message_name(schema_name),
            },
            GeneratedTypeInfo::Primitive { primitive, .. } => {
                needs_wrapper_import = true;
                DispatchShape::WrapScalar {
                    native_type: primitive.native_type,
                    wrapper: primitive.wrapper,
                }
            }
        };
        dispatch.push(DispatchEntry {
            extension_id: id.to_string(),
            type_info: info.clone(),
            shape,
        });
    }

    ArtifactPlan {
        package_name,
        proto_options,
        dispatch,
        needs_wrapper_import,
    }
}

/// The proto options for `package_name`, in their fixed order.
fn proto_options(package_name: &str) -> Vec<ProtoOption> {
    vec![
        ProtoOption::new(
            "java_multiple_files",
            "true",
            "// This option lets the proto compiler generate Java code inside the package\n\
             // name (see below) instead of inside an outer class. It creates a simpler\n\
             // developer experience by reducing one-level of name nesting and be\n\
             // consistent with most programming languages that don't support outer classes.",
        ),
        ProtoOption::new(
            "java_outer_classname",
            "VendorExtensionProto",
            "// The Java outer classname should be the filename in UpperCamelCase. This\n\
             // class is only used to hold proto descriptor, so developers don't need to\n\
             // work with it directly.",
        ),
        ProtoOption::new(
            "java_package",
            format!("{JAVA_PACKAGE_ROOT}.{package_name}"),
            "// The Java package name must be proto package name with proper prefix.",
        ),
        ProtoOption::new(
            "objc_class_prefix",
            package_name,
            "// A reasonable prefix for the Objective-C symbols generated from the package.\n\
             // It should at a minimum be 3 characters long, all uppercase, and convention\n\
             // is to use an abbreviation of the package name. Something short, but\n\
             // hopefully unique enough to not conflict with things that may come along in\n\
             // the future. 'GPB' is reserved for the protocol buffer implementation itself.",
        ),
    ]
}

/// Where the generated files for one extension schema go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// `<root>/openapi_extensions_<name>`
    pub extension_dir: PathBuf,
    /// `<extension_dir>/proto`
    pub proto_dir: PathBuf,
    /// `<proto_dir>/<stem>.proto`
    pub proto_file: PathBuf,
    /// `<proto_dir>/<stem>.rs`
    pub decoder_file: PathBuf,
    /// `<extension_dir>/main.rs`
    pub main_file: PathBuf,
}

impl OutputLayout {
    /// Lay out the files for a schema whose file stem is `stem` (e.g.
    /// `x-sample`) and whose extension name is `name` (e.g. `sample`).
    pub fn new(out_root: &Path, stem: &str, name: &str) -> Self {
        let extension_dir = out_root.join(format!("openapi_extensions_{name}"));
        let proto_dir = extension_dir.join("proto");
        Self {
            proto_file: proto_dir.join(format!("{stem}.proto")),
            decoder_file: proto_dir.join(format!("{stem}.rs")),
            main_file: extension_dir.join("main.rs"),
            proto_dir,
            extension_dir,
        }
    }

    /// The decoder's path relative to the main module, for `#[path]`.
    pub fn decoder_path_from_main(&self) -> String {
        let file = self
            .decoder_file
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("proto/{file}")
    }
}
