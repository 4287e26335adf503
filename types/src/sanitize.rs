//! Filename sanitization for declared user input files.
//!
//! Input filenames arrive inside an untrusted parameter set and are used
//! both as remote lookup keys and as local paths under the component's
//! `inputs/` directory. Reducing them to an allow-listed character set
//! (alphanumeric, dot, underscore, hyphen) removes path separators, so a
//! declared name can never escape the pull directory.

/// Reduce a declared filename to its allow-listed characters.
///
/// Everything outside `[A-Za-z0-9._-]` is dropped, including `/` and
/// `\`. The result may be empty; callers skip empty names rather than
/// issuing a remote lookup for them.
///
/// # Examples
///
/// ```
/// use gantry_types::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("wing_mesh.dat"), "wing_mesh.dat");
/// assert_eq!(sanitize_file_name("../../etc/passwd"), "....etcpasswd");
/// ```
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}
