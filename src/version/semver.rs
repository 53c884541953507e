//! Version parsing and ordering shared by every table lookup

use semver::Version;

use crate::version::error::VersionParseError;

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Only the leading numeric `major.minor.patch` components take part in ordering:
/// missing components are padded with zeros, and a local suffix (`+cu118`),
/// a pre-release suffix (`-rc1`, `0rc1`) or a fourth component are dropped.
///
/// Examples:
/// - "11" -> Version(11, 0, 0)
/// - "11.8" -> Version(11, 8, 0)
/// - "2.1.0+cu118" -> Version(2, 1, 0)
/// - "8.6.0.163" -> Version(8, 6, 0)
pub fn parse_version(version: &str) -> Result<Version, VersionParseError> {
    let core = version.trim().split(['+', '-']).next().unwrap_or_default();

    let mut numbers: Vec<&str> = Vec::with_capacity(3);
    for part in core.split('.').take(3) {
        let digits_end = part
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(part.len());
        numbers.push(&part[..digits_end]);
        if digits_end < part.len() {
            break;
        }
    }
    numbers.resize(3, "0");

    Version::parse(&numbers.join(".")).map_err(|source| VersionParseError {
        input: version.to_string(),
        source,
    })
}

/// Returns whether `a` is strictly greater than `b`
pub fn version_greater(a: &str, b: &str) -> Result<bool, VersionParseError> {
    Ok(parse_version(a)? > parse_version(b)?)
}

/// Pick the greatest version from a list
///
/// The first occurrence wins when two entries compare equal.
/// Returns `Ok(None)` for an empty list; any unparseable entry is an error.
pub fn latest_version<S: AsRef<str>>(versions: &[S]) -> Result<Option<&str>, VersionParseError> {
    let mut latest: Option<(&str, Version)> = None;

    for candidate in versions {
        let candidate = candidate.as_ref();
        let parsed = parse_version(candidate)?;
        match &latest {
            Some((_, current)) if parsed <= *current => {}
            _ => latest = Some((candidate, parsed)),
        }
    }

    Ok(latest.map(|(original, _)| original))
}
