//! glTF version detection.
//!
//! Only the JSON header is inspected. The byte buffer itself is left alone
//! because the selected loader parses it again in its own way.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::FormatError;

const BINARY_MAGIC: &[u8; 4] = b"glTF";
const GLB_JSON_CHUNK: u32 = 0x4E4F_534A;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// glTF 1.x
    Legacy,
    /// glTF 2.0 and later
    Current,
}

impl FormatVersion {
    pub fn from_major(major: u32) -> Self {
        if major < 2 {
            FormatVersion::Legacy
        } else {
            FormatVersion::Current
        }
    }

    pub fn major(self) -> u32 {
        match self {
            FormatVersion::Legacy => 1,
            FormatVersion::Current => 2,
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "glTF v.{}", self.major())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Json,
    /// KHR_binary_glTF, the glTF 1.0 binary container.
    BinaryV1,
    Glb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelHeader {
    pub version: FormatVersion,
    pub container: Container,
    pub asset_version: Option<String>,
    pub generator: Option<String>,
    pub extensions_required: Vec<String>,
}

impl ModelHeader {
    pub fn requires_extension(&self, name: &str) -> bool {
        self.extensions_required.iter().any(|ext| ext == name)
    }
}

#[derive(Deserialize)]
struct HeaderJson {
    asset: Option<AssetJson>,
    #[serde(rename = "extensionsRequired", default)]
    extensions_required: Vec<String>,
}

#[derive(Deserialize)]
struct AssetJson {
    version: Option<Value>,
    generator: Option<String>,
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, FormatError> {
    bytes
        .get(offset..offset + 4)
        .and_then(|slice| slice.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(FormatError::Container("truncated header"))
}

/// Locates the JSON document inside `bytes`, unwrapping binary containers.
pub fn json_content(bytes: &[u8]) -> Result<(Container, &[u8]), FormatError> {
    if !bytes.starts_with(BINARY_MAGIC) {
        return Ok((Container::Json, bytes));
    }

    match read_u32(bytes, 4)? {
        1 => {
            let content_length = read_u32(bytes, 12)? as usize;
            let content_format = read_u32(bytes, 16)?;
            if content_format != 0 {
                return Err(FormatError::Container("content is not JSON"));
            }
            let content = bytes
                .get(20..20 + content_length)
                .ok_or(FormatError::Container("content runs past end of file"))?;
            Ok((Container::BinaryV1, content))
        }
        _ => {
            let chunk_length = read_u32(bytes, 12)? as usize;
            if read_u32(bytes, 16)? != GLB_JSON_CHUNK {
                return Err(FormatError::Container("first chunk is not JSON"));
            }
            let content = bytes
                .get(20..20 + chunk_length)
                .ok_or(FormatError::Container("JSON chunk runs past end of file"))?;
            Ok((Container::Glb, content))
        }
    }
}

/// Leading integer of a version such as `"2.0"`.
fn major_version(version: &Value) -> Result<u32, FormatError> {
    let text = match version {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Array(items) => match items.first() {
            Some(first) => return major_version(first),
            None => return Err(FormatError::UnsupportedVersion(version.to_string())),
        },
        other => return Err(FormatError::UnsupportedVersion(other.to_string())),
    };

    let major = text
        .trim()
        .split('.')
        .next()
        .and_then(|major| major.parse().ok());
    major.ok_or(FormatError::UnsupportedVersion(text))
}

fn version_text(version: &Value) -> String {
    match version {
        Value::String(text) => text.clone(),
        Value::Array(items) => items.first().map(version_text).unwrap_or_default(),
        other => other.to_string(),
    }
}

pub fn inspect_header(bytes: &[u8]) -> Result<ModelHeader, FormatError> {
    let (container, content) = json_content(bytes)?;
    let text = std::str::from_utf8(content)?;
    let header: HeaderJson = serde_json::from_str(text)?;

    let asset = header.asset;
    let version_value = asset.as_ref().and_then(|asset| asset.version.as_ref());

    let version = match version_value {
        Some(value) => FormatVersion::from_major(major_version(value)?),
        None => FormatVersion::Legacy,
    };

    Ok(ModelHeader {
        version,
        container,
        asset_version: version_value.map(version_text),
        generator: asset.and_then(|asset| asset.generator),
        extensions_required: header.extensions_required,
    })
}
