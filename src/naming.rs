//! Name conversions shared by the planner, the type model and the emitters.

/// Marker every extension schema file name starts with.
pub const EXTENSION_PREFIX: &str = "x-";

/// Canonicalize an extension identifier into a package name.
///
/// Strips everything except ASCII letters, digits and `_`, then lowercases
/// each uppercase letter, inserting `_` before it unless it starts the name
/// or follows an `_`:
/// - `"sampleOne"` → `"sample_one"`
/// - `"Sample-One"` → `"sample_one"`
/// - `"My_Package"` → `"my_package"`
///
/// The output only contains `[a-z0-9_]`, so canonicalizing twice is the
/// same as canonicalizing once.
pub fn canonicalize(raw: &str) -> String {
    let stripped: Vec<char> = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    let mut out = String::with_capacity(stripped.len() + 4);
    for (index, &c) in stripped.iter().enumerate() {
        if c.is_ascii_uppercase() {
            if index > 0 && stripped[index - 1] != '_' {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a definition name to PascalCase for message and struct names.
///
/// - `"trace_info"` → `"TraceInfo"`
/// - `"sample-one"` → `"SampleOne"`
/// - `"Trace"` → `"Trace"`
pub fn to_pascal_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .map(|part| {
            let mut chars = part.chars().filter(|c| c.is_ascii_alphanumeric());
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_ascii_uppercase().to_string() + &chars.collect::<String>(),
            }
        })
        .collect()
}

/// The message and struct name generated for a definition.
///
/// PascalCase of `schema_name`, with a leading `_` when it would start with
/// a digit; `Self` becomes `Self_`. Empty when the name holds no ASCII
/// letters or digits.
pub fn message_name(schema_name: &str) -> String {
    let name = to_pascal_case(schema_name);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else if name == "Self" {
        "Self_".to_string()
    } else {
        name
    }
}

/// The snake_case field name generated for a property.
///
/// A name that would start with a digit gets a leading `_`.
pub fn field_name(property: &str) -> String {
    let name = canonicalize(property);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    }
}

/// Strip the `x-` marker from a schema file stem.
///
/// Returns `None` when the marker is missing.
pub fn extension_base_name(stem: &str) -> Option<&str> {
    stem.strip_prefix(EXTENSION_PREFIX)
}

/// Turn a snake_case name into a usable Rust identifier.
///
/// Keywords become raw identifiers. Names that cannot be raw (`self`,
/// `super`, `crate`, `_`) get a trailing `_`, and a leading digit gets a
/// leading `_`.
pub fn rust_ident(name: &str) -> String {
    const NOT_RAW: &[&str] = &["_", "crate", "self", "Self", "super"];
    const KEYWORDS: &[&str] = &[
        "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
        "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move",
        "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe",
        "use", "where", "while", "abstract", "become", "box", "do", "final", "macro", "override",
        "priv", "try", "typeof", "unsized", "virtual", "yield",
    ];
    if NOT_RAW.contains(&name) {
        format!("{name}_")
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}
