//! Naming helpers shared by the resolver and the code generator.
//!
//! Every function here is a pure function of its input, so the generated
//! file name and identifiers never depend on anything but the requested
//! type name.

/// Receiver identifier bound by generated code
///
/// This is the lowercase form of the first code point of the type name.
/// A raw identifier prefix is ignored. When the first code point is not
/// alphabetic (e.g. `_Secret`) the receiver falls back to `v`, since `_`
/// cannot be read back as a binding.
///
/// # Examples
/// ```
/// use obfuscate_core::naming::receiver_name;
/// assert_eq!(receiver_name("Token"), "t");
/// assert_eq!(receiver_name("Count"), "c");
/// assert_eq!(receiver_name("r#Match"), "m");
/// assert_eq!(receiver_name("_Secret"), "v");
/// ```
pub fn receiver_name(type_name: &str) -> String {
    let name = type_name.strip_prefix("r#").unwrap_or(type_name);
    match name.chars().next() {
        Some(first) if first.is_alphabetic() => first.to_lowercase().collect(),
        _ => "v".to_string(),
    }
}

/// File name of the generated artifact for a type name
///
/// # Examples
/// ```
/// use obfuscate_core::naming::artifact_file_name;
/// assert_eq!(artifact_file_name("Token"), "gen_token_obfuscated.rs");
/// assert_eq!(artifact_file_name("APIKey"), "gen_apikey_obfuscated.rs");
/// ```
pub fn artifact_file_name(type_name: &str) -> String {
    format!("gen_{}_obfuscated.rs", type_name.to_lowercase())
}

/// Whether `file_name` has the shape of a generated artifact name
///
/// # Examples
/// ```
/// use obfuscate_core::naming::is_artifact_file_name;
/// assert!(is_artifact_file_name("gen_token_obfuscated.rs"));
/// assert!(!is_artifact_file_name("token.rs"));
/// ```
pub fn is_artifact_file_name(file_name: &str) -> bool {
    file_name
        .strip_prefix("gen_")
        .and_then(|rest| rest.strip_suffix("_obfuscated.rs"))
        .is_some_and(|stem| !stem.is_empty())
}

/// Last segment of a possibly module-qualified name
///
/// # Examples
/// ```
/// use obfuscate_core::naming::type_name_of;
/// assert_eq!(type_name_of("crate::auth::Token"), "Token");
/// assert_eq!(type_name_of("Token"), "Token");
/// ```
pub fn type_name_of(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Convert a Cargo package or target name to the identifier used in paths
///
/// # Examples
/// ```
/// use obfuscate_core::naming::crate_ident;
/// assert_eq!(crate_ident("my-sample"), "my_sample");
/// ```
pub fn crate_ident(name: &str) -> String {
    name.replace('-', "_")
}
