//! Generate Protocol Buffer messages and Rust decoders for OpenAPI vendor
//! extensions described by JSON Schema.
//!
//! An extension schema is a JSON Schema document whose `definitions` each
//! describe one vendor extension (`x-...`) by its `id`. Object definitions
//! become proto messages and decoder structs; definitions typed as a
//! `string`, `number`, `integer` or `boolean` are carried in the matching
//! well-known wrapper message. A generated `main` module dispatches an
//! extension name and its YAML payload to the right decoder.
//!
//! # Features
//!
//! - Flattens local `$ref`s and `allOf` compositions before classification
//! - Reports every invalid definition in one pass (missing or duplicate ids,
//!   unsupported types)
//! - Derives one canonical package name for the proto and Rust packages
//! - Deterministic output: byte-identical across runs
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! use openapi_extension_gen::codegen::{GenerateOptions, generate_extension};
//!
//! let options = GenerateOptions {
//!     out_dir: "generated".into(),
//!     ..GenerateOptions::default()
//! };
//! let stats = generate_extension(Path::new("x-sample.json"), &options)?;
//! eprintln!("Generated {} extensions, {} messages", stats.extensions, stats.messages_generated);
//! # Ok::<(), openapi_extension_gen::error::Error>(())
//! ```

pub mod classify;
pub mod codegen;
pub mod emit;
pub mod error;
pub mod model;
pub mod naming;
pub mod plan;
pub mod registry;
pub mod schema;
pub mod type_map;
