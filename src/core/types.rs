//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Oid`] - Git object identifier (20-byte SHA-1 content hash)
//! - [`RefName`] - Validated Git reference name
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs. The one
//! deliberate exception is [`Oid::parse_lossy`], which maps malformed
//! input to the zero OID for callers that treat "unparseable" and
//! "absent" the same way.
//!
//! # Examples
//!
//! ```
//! use gitgraph::core::types::{Oid, RefName};
//!
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! let refname = RefName::new("refs/heads/main").unwrap();
//! assert_eq!(refname.shorthand(), "main");
//!
//! // Invalid constructions fail at creation time
//! assert!(Oid::new("not-a-sha").is_err());
//! assert!(RefName::new("refs/heads/bad..name").is_err());
//! # let _ = oid;
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),
}

/// A Git object identifier: the 20-byte SHA-1 hash of an object's content.
///
/// Equality is byte-wise. The all-zero value is the "absent/unresolved"
/// sentinel: it never names a real object.
///
/// # Example
///
/// ```
/// use gitgraph::core::types::Oid;
///
/// // Parsing is case-insensitive, display is always lowercase
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.to_string(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
///
/// let zero = Oid::zero();
/// assert!(zero.is_zero());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid([u8; Oid::LEN]);

impl Oid {
    /// Length of the raw hash in bytes.
    pub const LEN: usize = 20;

    /// Length of the canonical hex encoding.
    pub const HEX_LEN: usize = Self::LEN * 2;

    /// Create a new validated object id from its hex encoding.
    ///
    /// Accepts exactly 40 hex characters in either case.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(hex: impl AsRef<str>) -> Result<Self, TypeError> {
        let hex = hex.as_ref();
        if hex.len() != Self::HEX_LEN {
            return Err(TypeError::InvalidOid(format!(
                "expected {} hex characters, got {}",
                Self::HEX_LEN,
                hex.len()
            )));
        }

        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(hex, &mut bytes)
            .map_err(|_| TypeError::InvalidOid("object id must be hexadecimal".into()))?;
        Ok(Self(bytes))
    }

    /// Parse a hex string, mapping malformed input to the zero OID.
    ///
    /// This is the lenient counterpart of [`Oid::new`]. Any input that
    /// `Oid::new` rejects (wrong length, non-hex characters) produces
    /// [`Oid::zero`], so the result of a failed parse is always
    /// recognizable through [`Oid::is_zero`].
    ///
    /// # Example
    ///
    /// ```
    /// use gitgraph::core::types::Oid;
    ///
    /// assert!(Oid::parse_lossy("nope").is_zero());
    /// assert!(!Oid::parse_lossy("55245d63089b55144010e408895a4350e163b49e").is_zero());
    /// ```
    pub fn parse_lossy(hex: &str) -> Self {
        Self::new(hex).unwrap_or_else(|_| Self::zero())
    }

    /// Create an OID from raw bytes.
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Create an OID by copying a byte slice.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the slice is not exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        let bytes: [u8; Self::LEN] = bytes.try_into().map_err(|_| {
            TypeError::InvalidOid(format!(
                "expected {} bytes, got {}",
                Self::LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Create the zero/null OID.
    pub const fn zero() -> Self {
        Self([0u8; Self::LEN])
    }

    /// Check if this is the zero/null OID.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Canonical lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get an abbreviated form of the OID.
    ///
    /// Returns the first `len` hex characters. If `len` exceeds the OID
    /// length, returns the full OID.
    pub fn short(&self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len.min(Self::HEX_LEN));
        hex
    }
}

impl Default for Oid {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for Oid {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.to_hex()
    }
}

impl From<[u8; Oid::LEN]> for Oid {
    fn from(bytes: [u8; Oid::LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.to_hex())
    }
}

/// A validated Git reference name.
///
/// Reference names must conform to Git's refname rules (see
/// `git check-ref-format`). Pseudo-refs such as `HEAD` are accepted.
///
/// # Example
///
/// ```
/// use gitgraph::core::types::RefName;
///
/// let refname = RefName::branch("feature/foo").unwrap();
/// assert_eq!(refname.as_str(), "refs/heads/feature/foo");
/// assert!(refname.is_branch());
/// assert_eq!(refname.shorthand(), "feature/foo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    const HEADS: &'static str = "refs/heads/";
    const TAGS: &'static str = "refs/tags/";
    const REMOTES: &'static str = "refs/remotes/";

    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// The `HEAD` pseudo-ref.
    pub fn head() -> Self {
        Self("HEAD".to_string())
    }

    /// Create a ref name for a branch (`refs/heads/<branch>`).
    pub fn branch(name: &str) -> Result<Self, TypeError> {
        Self::new(format!("{}{}", Self::HEADS, name))
    }

    /// Create a ref name for a tag (`refs/tags/<tag>`).
    pub fn tag(name: &str) -> Result<Self, TypeError> {
        Self::new(format!("{}{}", Self::TAGS, name))
    }

    /// Full names a short name may refer to, in lookup order.
    ///
    /// Mirrors Git's rev-parse rules: the name itself, then `refs/`,
    /// tags, branches, remote-tracking refs, and a remote's `HEAD`.
    ///
    /// # Example
    ///
    /// ```
    /// use gitgraph::core::types::RefName;
    ///
    /// let candidates = RefName::expansions("main");
    /// assert_eq!(candidates[0], "main");
    /// assert!(candidates.contains(&"refs/heads/main".to_string()));
    /// ```
    pub fn expansions(short: &str) -> Vec<String> {
        vec![
            short.to_string(),
            format!("refs/{short}"),
            format!("{}{short}", Self::TAGS),
            format!("{}{short}", Self::HEADS),
            format!("{}{short}", Self::REMOTES),
            format!("{}{short}/HEAD", Self::REMOTES),
        ]
    }

    /// Human-friendly name with the namespace prefix removed.
    pub fn shorthand(&self) -> &str {
        [Self::HEADS, Self::TAGS, Self::REMOTES]
            .iter()
            .find_map(|prefix| self.0.strip_prefix(*prefix))
            .unwrap_or(&self.0)
    }

    /// Strip a prefix from the ref name and return the remainder.
    ///
    /// Returns `None` if the ref doesn't start with the given prefix.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.strip_prefix(prefix)
    }

    /// Check if this ref is a branch ref.
    pub fn is_branch(&self) -> bool {
        self.0.starts_with(Self::HEADS)
    }

    /// Check if this ref is a tag ref.
    pub fn is_tag(&self) -> bool {
        self.0.starts_with(Self::TAGS)
    }

    /// Check if this ref is a remote-tracking ref.
    pub fn is_remote(&self) -> bool {
        self.0.starts_with(Self::REMOTES)
    }

    /// Validate a ref name against Git's refname rules.
    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidRefName("ref name cannot be empty".into()));
        }

        if name == "@" {
            return Err(TypeError::InvalidRefName(
                "ref name cannot be '@' (reserved)".into(),
            ));
        }

        if name.starts_with('/') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot start with '/'".into(),
            ));
        }

        if name.ends_with('/') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '/'".into(),
            ));
        }
        if name.ends_with('.') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '.'".into(),
            ));
        }

        for forbidden in ["..", "@{", "//"] {
            if name.contains(forbidden) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{forbidden}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(TypeError::InvalidRefName(format!(
                "ref name cannot contain '{c}'"
            )));
        }

        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidRefName(
                "ref name cannot contain control characters".into(),
            ));
        }

        for component in name.split('/') {
            if component.starts_with('.') {
                return Err(TypeError::InvalidRefName(
                    "path component cannot start with '.'".into(),
                ));
            }
            if component.ends_with(".lock") {
                return Err(TypeError::InvalidRefName(
                    "path component cannot end with '.lock'".into(),
                ));
            }
        }

        Ok(())
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
