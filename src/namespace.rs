//! Proto package derivation from XML namespaces
//!
//! Namespaces arrive as URLs (`http://www.example.org/membership/v1`), URNs
//! (`urn:example:membership`) or free-form strings. All three forms are
//! folded into a dotted, lowercase proto package: URL hosts are reversed,
//! path and URN segments are appended in order, and every segment is
//! sanitized into a valid proto identifier (leading digits get a `v`
//! prefix). The XML Schema namespace itself never becomes a package.

use crate::xsd::XSD_NAMESPACE;

/// Derive a proto package name from a namespace URI.
///
/// Returns `None` for the XML Schema namespace and for namespaces that
/// yield no usable segments.
pub fn package_from_namespace(namespace: &str) -> Option<String> {
    let namespace = namespace.trim();
    if namespace.is_empty() || namespace == XSD_NAMESPACE {
        return None;
    }

    let segments = if let Some(rest) = namespace.strip_prefix("urn:") {
        rest.split(':').map(str::to_string).collect()
    } else if let Some((host, path)) = split_url(namespace) {
        let mut parts: Vec<String> = host.split('.').rev().map(str::to_string).collect();
        parts.extend(path.split('/').filter(|s| !s.is_empty()).map(str::to_string));
        parts
    } else {
        // Not a URL, not a URN. Split on the usual separators and keep
        // whatever identifies itself.
        namespace
            .split(['/', ':', '#'])
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };

    let cleaned: Vec<String> = segments.iter().filter_map(|s| sanitize_segment(s)).collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.join("."))
    }
}

/// Split `scheme://host/path` into host and path. Returns `None` when the
/// string has no scheme separator.
fn split_url(namespace: &str) -> Option<(&str, &str)> {
    let rest = namespace.split_once("://")?.1;
    match rest.split_once('/') {
        Some((host, path)) => Some((host, path)),
        None => Some((rest, "")),
    }
}

/// Lowercase a segment and squeeze it into identifier characters. A segment
/// starting with a digit is prefixed with `v` so `2009` becomes `v2009`.
fn sanitize_segment(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c.is_ascii_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    let out = out.trim_matches('_').to_string();
    if out.is_empty() {
        return None;
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        Some(format!("v{}", out))
    } else {
        Some(out)
    }
}
