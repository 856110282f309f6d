//! Extension generation from a JSON Schema file.
//!
//! [`generate_extension`] runs the whole pipeline for one schema file:
//!
//! 1. resolve the schema document,
//! 2. build and validate the extension registry,
//! 3. build the type model and plan the artifacts,
//! 4. emit the proto, decoder and main sources and write them out.
//!
//! Validation problems are reported as one batch and stop the run before
//! anything is written. I/O failures stop the run where they happen; files
//! already written by that run are left in place.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::emit::{emit_decoder, emit_main, emit_proto, file_header};
use crate::error::{Error, Result};
use crate::model::build_models;
use crate::naming::{canonicalize, extension_base_name};
use crate::plan::{OutputLayout, plan};
use crate::registry::{build, into_result};
use crate::schema::load_and_resolve;

/// Settings for one generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Root directory the `openapi_extensions_<name>` directory is created in.
    pub out_dir: PathBuf,

    /// License text placed at the top of every generated file.
    pub license: Option<String>,

    /// Run `rustfmt` over the generated Rust sources.
    pub rustfmt: bool,
}

/// Statistics collected during generation for reporting.
#[derive(Debug, Default)]
pub struct GenerationStats {
    pub extensions: usize,
    pub wrapper_extensions: usize,
    pub messages_generated: usize,
    pub fields_generated: usize,
    pub unknown_types_defaulted: usize,
    pub files_written: Vec<PathBuf>,
}

/// Generate the proto, decoder and main sources for one extension schema.
///
/// The schema file's stem must start with `x-`; the rest of the stem names
/// the extension and seeds the package name.
pub fn generate_extension(schema_file: &Path, options: &GenerateOptions) -> Result<GenerationStats> {
    let stem = schema_file
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::InvalidSchemaFileName {
            path: schema_file.to_path_buf(),
        })?;
    // The package name must be a proto and Rust identifier.
    let name = extension_base_name(stem)
        .filter(|name| {
            let package = canonicalize(name);
            !package.is_empty() && !package.starts_with(|c: char| c.is_ascii_digit())
        })
        .ok_or_else(|| Error::InvalidSchemaFileName {
            path: schema_file.to_path_buf(),
        })?;

    tracing::info!(path = %schema_file.display(), "loading schema");
    let schema = load_and_resolve(schema_file)?;
    tracing::info!(definitions = schema.definitions.len(), "resolved schema");

    let registry = into_result(build(&schema.definitions))?;
    if registry.is_empty() {
        tracing::warn!(path = %schema_file.display(), "schema defines no extensions");
    }

    let mut stats = GenerationStats::default();
    let models = build_models(&schema, &mut stats);
    let plan = plan(&registry, name);
    let layout = OutputLayout::new(&options.out_dir, stem, name);

    stats.extensions = plan.dispatch.len();
    stats.wrapper_extensions = plan
        .dispatch
        .iter()
        .filter(|e| e.type_info.is_primitive())
        .count();
    stats.messages_generated = models.len();
    stats.fields_generated = models.iter().map(|m| m.fields.len()).sum();

    let header = file_header(options.license.as_deref());
    let proto = emit_proto(&plan, &models, &header);
    let decoder = emit_decoder(&plan, &models, &header);
    let main = emit_main(&plan, &layout.decoder_path_from_main(), &header);

    tracing::info!(
        package = %plan.package_name,
        dir = %layout.extension_dir.display(),
        "writing extension sources"
    );
    for (path, content) in [
        (&layout.proto_file, &proto),
        (&layout.decoder_file, &decoder),
        (&layout.main_file, &main),
    ] {
        write_file(path, content)?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "wrote file");
        stats.files_written.push(path.clone());
    }

    if options.rustfmt {
        run_rustfmt(&layout.decoder_file)?;
        run_rustfmt(&layout.main_file)?;
    }

    Ok(stats)
}

/// Write content to a file, creating parent directories as needed.
fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Format a generated Rust file in place.
fn run_rustfmt(path: &Path) -> Result<()> {
    let output = Command::new("rustfmt")
        .arg("--edition")
        .arg("2024")
        .arg(path)
        .output()
        .map_err(|e| Error::Format {
            path: path.to_path_buf(),
            detail: format!("could not run rustfmt: {e}"),
        })?;
    if !output.status.success() {
        return Err(Error::Format {
            path: path.to_path_buf(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
