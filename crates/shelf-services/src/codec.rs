//! Opaque file identifiers.
//!
//! An identifier is the URL-safe, unpadded base64 encoding of a
//! workspace-relative path. It survives a URL path segment untouched (no `/`,
//! `+` or `=`), and decoding it is a pure string transform: validation of the
//! resulting path happens in [`crate::resolver`].

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::{FileError, FileResult};

/// Encode a workspace-relative path into an identifier.
pub fn encode(relative_path: &str) -> String {
    URL_SAFE_NO_PAD.encode(relative_path.as_bytes())
}

/// Decode an identifier back into a workspace-relative path.
///
/// Trailing `=` padding from clients that use a padded encoder is tolerated.
pub fn decode(identifier: &str) -> FileResult<String> {
    let unpadded = identifier.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(unpadded.as_bytes())
        .map_err(|e| FileError::MalformedIdentifier(e.to_string()))?;

    String::from_utf8(bytes)
        .map_err(|_| FileError::MalformedIdentifier("identifier is not UTF-8 text".into()))
}
