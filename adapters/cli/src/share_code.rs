//! Single-line share codes for levels.
//!
//! A code looks like `laser:v1:6x6:<payload>` where the payload is the level's
//! JSON encoded as unpadded base64. The dimensions are repeated in the header
//! so a truncated or edited code is caught before the level is loaded.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use laser_maze_core::LevelDescriptor;
use thiserror::Error;

const CODE_DOMAIN: &str = "laser";
const CODE_VERSION: &str = "v1";

/// Identifier prefix emitted before the grid dimensions and payload.
pub(crate) const SHARE_CODE_HEADER: &str = "laser:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Errors that can occur while converting share codes.
#[derive(Debug, Error)]
pub(crate) enum ShareCodeError {
    /// The provided string was empty or contained only whitespace.
    #[error("share code was empty")]
    EmptyPayload,
    /// The version segment was missing.
    #[error("share code is missing the version")]
    MissingVersion,
    /// The grid dimensions were missing.
    #[error("share code is missing the grid dimensions")]
    MissingDimensions,
    /// The payload segment was missing.
    #[error("share code is missing the payload")]
    MissingPayload,
    /// The code used an unexpected prefix.
    #[error("share code prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The code used an unsupported version identifier.
    #[error("share code version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The header disagrees with the grid stored in the payload.
    #[error("header declares {header_width}x{header_height} but the level is {width}x{height}")]
    DimensionMismatch {
        /// Width declared in the header.
        header_width: u32,
        /// Height declared in the header.
        header_height: u32,
        /// Width stored in the payload.
        width: u32,
        /// Height stored in the payload.
        height: u32,
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode share code payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload is not a level.
    #[error("could not parse share code payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// The level could not be serialised.
    #[error("could not serialise level: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Encodes the level into a single-line share code.
pub(crate) fn encode(level: &LevelDescriptor) -> Result<String, ShareCodeError> {
    let json = serde_json::to_vec(level).map_err(ShareCodeError::Serialize)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{SHARE_CODE_HEADER}:{}x{}:{encoded}",
        level.grid.width, level.grid.height
    ))
}

/// Decodes a level from a share code.
pub(crate) fn decode(value: &str) -> Result<LevelDescriptor, ShareCodeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ShareCodeError::EmptyPayload);
    }

    let mut parts = trimmed.splitn(4, FIELD_DELIMITER);
    // splitn always yields a first segment for non-empty input.
    let domain = parts.next().unwrap_or_default();
    let version = parts.next().ok_or(ShareCodeError::MissingVersion)?;
    let dimensions = parts.next().ok_or(ShareCodeError::MissingDimensions)?;
    let payload = parts.next().ok_or(ShareCodeError::MissingPayload)?;

    if domain != CODE_DOMAIN {
        return Err(ShareCodeError::InvalidPrefix(domain.to_owned()));
    }
    if version != CODE_VERSION {
        return Err(ShareCodeError::UnsupportedVersion(version.to_owned()));
    }

    let (header_width, header_height) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(ShareCodeError::InvalidEncoding)?;
    let level: LevelDescriptor =
        serde_json::from_slice(&bytes).map_err(ShareCodeError::InvalidPayload)?;

    if (level.grid.width, level.grid.height) != (header_width, header_height) {
        return Err(ShareCodeError::DimensionMismatch {
            header_width,
            header_height,
            width: level.grid.width,
            height: level.grid.height,
        });
    }
    Ok(level)
}

/// Reports whether the text looks like a share code rather than JSON or a
/// file path: the domain must be followed by the field delimiter.
pub(crate) fn is_share_code(value: &str) -> bool {
    value
        .trim_start()
        .strip_prefix(CODE_DOMAIN)
        .is_some_and(|rest| rest.starts_with(FIELD_DELIMITER))
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), ShareCodeError> {
    let (width, height) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| ShareCodeError::InvalidDimensions(dimensions.to_owned()))?;

    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|_| ShareCodeError::InvalidDimensions(dimensions.to_owned()))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|_| ShareCodeError::InvalidDimensions(dimensions.to_owned()))?;

    if width == 0 || height == 0 {
        return Err(ShareCodeError::InvalidDimensions(dimensions.to_owned()));
    }

    Ok((width, height))
}
