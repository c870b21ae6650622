//! Content digests
//!
//! Registry content is addressed by digest strings of the form
//! `algorithm:hex`, e.g. `sha256:e3b0c4...`. [`Digest`] parses, renders and
//! computes them; tag records deserialize their digest fields through it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

/// The digest string did not have the `algorithm:hex` shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid digest: {0}")]
pub struct InvalidDigest(String);

/// Digest algorithms the registry emits. Enumerated values are used in
/// digest string representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha256,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
        }
    }

    /// Expected length of the hex payload, in characters.
    fn hex_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 64,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed content digest: algorithm plus lowercase hex payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: DigestAlgorithm,
    hex: String,
}

impl Digest {
    /// Parse an `algorithm:hex` digest string.
    pub fn parse(text: &str) -> Result<Self, InvalidDigest> {
        let Some((algorithm_name, hex_data)) = text.split_once(':') else {
            return Err(InvalidDigest(format!(
                "digest must include separator: {:?}",
                text
            )));
        };

        let algorithm = match algorithm_name {
            "sha256" => DigestAlgorithm::Sha256,
            _ => {
                return Err(InvalidDigest(format!(
                    "unknown digest algorithm {:?} in digest {:?}",
                    algorithm_name, text
                )));
            }
        };

        if hex_data.len() != algorithm.hex_len()
            || !hex_data.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(InvalidDigest(format!(
                "invalid hexadecimal data {:?} in digest {:?}",
                hex_data, text
            )));
        }

        Ok(Self {
            algorithm,
            // The registry produces lowercase hex; normalize on input.
            hex: hex_data.to_ascii_lowercase(),
        })
    }

    /// Compute the sha256 digest of a byte slice.
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self {
            algorithm: DigestAlgorithm::Sha256,
            hex: format!("{:x}", hasher.finalize()),
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.as_str(), self.hex)
    }
}

impl FromStr for Digest {
    type Err = InvalidDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Digest::parse(&text).map_err(serde::de::Error::custom)
    }
}
