//! Classification and resolution of glTF `uri` strings.
//!
//! A uri is either an RFC 2397 `data:` uri carrying its payload inline, or a
//! path. Paths may be relative to the document, `file:` urls, or resource
//! paths (`qrc:/x`, `qrc:///x`, `:/x`) which resolve against an optional
//! resource root.

use std::fs;
use std::path::{Path, PathBuf};

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use log::warn;

use crate::error::{GltfError, Result};

const DATA_PREFIX: &str = "data:";
const RESOURCE_PREFIX: &str = ":/";
const OCTET_STREAM_PREFIX: &str = "data:application/octet-stream;base64,";

// Exporters in the wild drop the trailing padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriKind {
    Data,
    Path,
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        s.get(prefix.len()..)
    } else {
        None
    }
}

pub fn kind(uri: &str) -> UriKind {
    if strip_prefix_ignore_case(uri, DATA_PREFIX).is_some() {
        UriKind::Data
    } else {
        UriKind::Path
    }
}

/// True for `:/x` resource paths.
pub fn is_resource_path(path: &Path) -> bool {
    path.to_str()
        .map(|p| p.starts_with(RESOURCE_PREFIX))
        .unwrap_or(false)
}

/// Maps a path-kind uri to a local path.
///
/// Resource uris come back as `:/x`; everything else is joined to
/// `base_dir` unless already absolute.
pub fn local_file(uri: &str, base_dir: &Path) -> PathBuf {
    if let Some(rest) = strip_prefix_ignore_case(uri, "qrc:///") {
        return PathBuf::from(format!("{}{}", RESOURCE_PREFIX, rest));
    }
    if let Some(rest) = strip_prefix_ignore_case(uri, "qrc:/") {
        return PathBuf::from(format!("{}{}", RESOURCE_PREFIX, rest));
    }
    if uri.starts_with(RESOURCE_PREFIX) {
        return PathBuf::from(uri);
    }
    if let Some(rest) = strip_prefix_ignore_case(uri, "file:") {
        return base_dir.join(file_url_path(rest));
    }
    match percent_decode(uri.as_bytes()) {
        Some(decoded) => base_dir.join(String::from_utf8_lossy(&decoded).as_ref()),
        None => base_dir.join(uri),
    }
}

// `file:///a/b`, `file://host/a/b` and `file:a/b` forms.
fn file_url_path(rest: &str) -> PathBuf {
    let path = match rest.strip_prefix("//") {
        Some(authority_and_path) => match authority_and_path.find('/') {
            Some(slash) => &authority_and_path[slash..],
            None => "",
        },
        None => rest,
    };
    let decoded = percent_decode(path.as_bytes()).unwrap_or_else(|| path.as_bytes().to_vec());
    PathBuf::from(String::from_utf8_lossy(&decoded).into_owned())
}

/// Resolves a `:/x` resource path against `resource_root`.
pub fn resolve_resource(path: &Path, resource_root: Option<&Path>) -> PathBuf {
    match (path.to_str(), resource_root) {
        (Some(p), Some(root)) if p.starts_with(RESOURCE_PREFIX) => {
            root.join(&p[RESOURCE_PREFIX.len()..])
        }
        _ => path.to_path_buf(),
    }
}

fn percent_decode(input: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(input[i]);
            i += 1;
        }
    }
    Some(out)
}

/// Decodes the payload of a `data:` uri.
pub fn parse_embedded_data(uri: &str) -> Result<Vec<u8>> {
    let body = strip_prefix_ignore_case(uri, DATA_PREFIX)
        .ok_or_else(|| GltfError::InvalidUri(format!("not a data uri: {:.32}", uri)))?;
    let separator = body
        .find(',')
        .ok_or_else(|| GltfError::InvalidUri(format!("missing ',' in data uri: {:.32}", uri)))?;
    let (header, payload) = (&body[..separator], &body[separator + 1..]);

    if header.to_ascii_lowercase().ends_with(";base64") {
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        LENIENT_BASE64
            .decode(compact.as_bytes())
            .map_err(|e| GltfError::InvalidUri(format!("bad base64 payload: {}", e)))
    } else {
        warn!("Embedded data uri is not base64 encoded, decoding it as percent-encoded text");
        percent_decode(payload.as_bytes())
            .ok_or_else(|| GltfError::InvalidUri("bad percent-encoding in data uri".into()))
    }
}

pub fn to_base64_uri(data: &[u8]) -> String {
    let mut uri = String::with_capacity(OCTET_STREAM_PREFIX.len() + data.len() * 4 / 3 + 4);
    uri.push_str(OCTET_STREAM_PREFIX);
    STANDARD.encode_string(data, &mut uri);
    uri
}

/// Base64 data uri with an explicit media type.
pub fn to_data_uri(mime_type: &str, data: &[u8]) -> String {
    let mut uri = format!("{}{};base64,", DATA_PREFIX, mime_type);
    STANDARD.encode_string(data, &mut uri);
    uri
}

/// Returns the bytes referenced by `uri`.
pub fn fetch_data(uri: &str, base_dir: &Path) -> Result<Vec<u8>> {
    fetch_data_with_root(uri, base_dir, None)
}

/// Like [`fetch_data`], resolving resource paths against `resource_root`.
pub fn fetch_data_with_root(
    uri: &str,
    base_dir: &Path,
    resource_root: Option<&Path>,
) -> Result<Vec<u8>> {
    match kind(uri) {
        UriKind::Data => parse_embedded_data(uri),
        UriKind::Path => {
            let path = resolve_resource(&local_file(uri, base_dir), resource_root);
            fs::read(&path).map_err(|e| {
                warn!("Failed to open {}: {}", path.display(), e);
                GltfError::CannotOpen(path.display().to_string())
            })
        }
    }
}
