//! Audit event fields
//!
//! A [`Field`] is a named byte value tagged with an [`Encoding`]. Field
//! content is often confidential (account names, before/after images), so
//! the backing buffer is zeroed on [`Field::clear`] and again on drop, and
//! every accessor that crosses the API boundary hands out an independent
//! copy of the bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{AuditError, Result};

/// How a field value's bytes are represented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Raw bytes, no transport encoding
    #[default]
    Plain,
    /// Lowercase hex
    Hex,
    /// Standard base64 with padding
    Base64,
    /// URL-safe base64 without padding
    Base64Url,
}

impl Encoding {
    /// Render a byte buffer in this representation
    ///
    /// `Plain` interprets the bytes as UTF-8 text (lossy on invalid
    /// sequences, matching how values are rendered into JSON).
    pub fn encode(&self, value: &[u8]) -> String {
        use base64::Engine;
        match self {
            Encoding::Plain => String::from_utf8_lossy(value).into_owned(),
            Encoding::Hex => hex::encode(value),
            Encoding::Base64 => base64::engine::general_purpose::STANDARD.encode(value),
            Encoding::Base64Url => base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(value),
        }
    }

    /// Parse a string in this representation back into bytes
    pub fn decode(&self, value: &str) -> Result<Vec<u8>> {
        use base64::Engine;
        match self {
            Encoding::Plain => Ok(value.as_bytes().to_vec()),
            Encoding::Hex => hex::decode(value)
                .map_err(|e| AuditError::invalid_argument("value", format!("invalid hex: {e}"))),
            Encoding::Base64 => base64::engine::general_purpose::STANDARD
                .decode(value)
                .map_err(|e| AuditError::invalid_argument("value", format!("invalid base64: {e}"))),
            Encoding::Base64Url => base64::engine::general_purpose::URL_SAFE_NO_PAD
                .decode(value)
                .map_err(|e| {
                    AuditError::invalid_argument("value", format!("invalid base64url: {e}"))
                }),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Plain => write!(f, "plain"),
            Encoding::Hex => write!(f, "hex"),
            Encoding::Base64 => write!(f, "base64"),
            Encoding::Base64Url => write!(f, "base64url"),
        }
    }
}

impl FromStr for Encoding {
    type Err = AuditError;

    /// Parse a configuration spelling, case-insensitive
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(Encoding::Plain),
            "hex" => Ok(Encoding::Hex),
            "base64" => Ok(Encoding::Base64),
            "base64url" => Ok(Encoding::Base64Url),
            other => Err(AuditError::invalid_argument(
                "encoding",
                format!("unknown encoding `{other}`"),
            )),
        }
    }
}

/// Resolve a caller-named text charset ("UTF-8", "ISO-8859-1", ...)
pub(crate) fn resolve_charset(label: &str) -> Result<&'static encoding_rs::Encoding> {
    if label.trim().is_empty() {
        return Err(AuditError::invalid_argument(
            "encoding",
            "must not be blank",
        ));
    }
    encoding_rs::Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
        AuditError::invalid_argument("encoding", format!("unknown charset `{label}`"))
    })
}

/// A named, encoding-tagged byte value within an [`Event`](crate::Event)
///
/// Cloning a `Field` allocates a fresh buffer; no two fields ever share a
/// backing array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    value: Vec<u8>,
    encoding: Encoding,
}

impl Field {
    /// Create a field with [`Encoding::Plain`]
    ///
    /// Fails if `name` is blank.
    pub fn new(name: impl Into<String>, value: &[u8]) -> Result<Self> {
        Self::with_encoding(name, value, Encoding::Plain)
    }

    /// Create a field with an explicit encoding tag
    pub fn with_encoding(
        name: impl Into<String>,
        value: &[u8],
        encoding: Encoding,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AuditError::invalid_argument("name", "must not be blank"));
        }
        Ok(Self {
            name,
            value: value.to_vec(),
            encoding,
        })
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Independent copy of the value bytes
    pub fn value(&self) -> Vec<u8> {
        self.value.clone()
    }

    /// Value length in bytes
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Whether the value is empty
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Encoding tag
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Replace the value, keeping the current encoding tag
    ///
    /// The previous buffer is zeroed before it is released.
    pub fn set_value(&mut self, value: &[u8]) {
        self.value.zeroize();
        self.value = value.to_vec();
    }

    /// Replace the value and the encoding tag
    pub fn set_value_with_encoding(&mut self, value: &[u8], encoding: Encoding) {
        self.set_value(value);
        self.encoding = encoding;
    }

    /// Decode the raw bytes with a caller-named text charset
    pub fn char_value(&self, charset: &str) -> Result<String> {
        let enc = resolve_charset(charset)?;
        let (text, _, _) = enc.decode(&self.value);
        Ok(text.into_owned())
    }

    /// Render the value in its tagged representation (hex, base64, ...)
    pub fn encoded_value(&self) -> String {
        self.encoding.encode(&self.value)
    }

    /// Independent clone (content-equal, separately allocated)
    pub fn get_copy(&self) -> Self {
        self.clone()
    }

    /// Zero the backing bytes in place
    ///
    /// The buffer keeps its length; only the content is destroyed.
    pub fn clear(&mut self) {
        self.value.as_mut_slice().zeroize();
    }
}

impl Drop for Field {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}
