use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use openapi_extension_gen::codegen::{GenerateOptions, generate_extension};
use openapi_extension_gen::error::Error;
use openapi_extension_gen::naming::EXTENSION_PREFIX;

/// Exit code for usage errors.
const USAGE_EXIT_CODE: i32 = -1;

/// Generate Protocol Buffer messages and Rust decoders for an OpenAPI
/// vendor extension schema.
///
/// The schema file name must start with `x-`; the rest of its name becomes
/// the extension package. Sources are written to
/// <OUT_DIR>/openapi_extensions_<name>/.
#[derive(Parser)]
#[command(name = "openapi-extension-gen", version, about)]
struct Cli {
    /// JSON Schema file describing the extension (e.g., x-sample.json).
    schema_file: PathBuf,

    /// Root directory for the generated sources.
    #[arg(long = "out_dir", value_name = "DIR")]
    out_dir: PathBuf,

    /// File whose text is placed at the top of every generated file.
    #[arg(long, value_name = "FILE", env = "OPENAPI_EXTENSION_LICENSE_FILE")]
    license_file: Option<PathBuf>,

    /// Run rustfmt over the generated Rust sources.
    #[arg(long)]
    rustfmt: bool,

    /// Accepted for compatibility with older invocations; has no effect.
    #[arg(long = "extension", hide = true)]
    _extension: bool,

    /// Suppress non-error output.
    #[arg(long, short)]
    quiet: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            process::exit(USAGE_EXIT_CODE);
        }
    };

    let has_marker = cli
        .schema_file
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.starts_with(EXTENSION_PREFIX));
    if !has_marker {
        eprintln!(
            "Schema file name has to start with '{EXTENSION_PREFIX}'.\n{}",
            Cli::command().render_usage()
        );
        process::exit(USAGE_EXIT_CODE);
    }

    init_tracing(cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");

        // Print cause chain.
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }

        process::exit(1);
    }
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> openapi_extension_gen::error::Result<()> {
    let license = cli
        .license_file
        .as_deref()
        .map(|path| {
            std::fs::read_to_string(path).map_err(|e| Error::Read {
                path: path.to_path_buf(),
                source: e,
            })
        })
        .transpose()?;

    let options = GenerateOptions {
        out_dir: cli.out_dir,
        license,
        rustfmt: cli.rustfmt,
    };

    let stats = generate_extension(&cli.schema_file, &options)?;

    tracing::info!(
        extensions = stats.extensions,
        wrappers = stats.wrapper_extensions,
        messages = stats.messages_generated,
        fields = stats.fields_generated,
        "generated extension"
    );
    if stats.unknown_types_defaulted > 0 {
        tracing::info!(
            count = stats.unknown_types_defaulted,
            "defaulted unsupported property types to free-form values"
        );
    }
    for path in &stats.files_written {
        tracing::info!(path = %path.display(), "wrote");
    }

    Ok(())
}
