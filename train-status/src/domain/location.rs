//! Location code types.

use std::fmt;

/// Error returned when parsing an invalid location code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid location code: {reason}")]
pub struct InvalidLocationCode {
    reason: &'static str,
}

/// Longest code we accept (a TIPLOC is at most 7 characters).
const MAX_LEN: usize = 7;

/// A station or timing-point code as used by the timetable API.
///
/// Covers both 3-letter CRS codes (`KGX`) and TIPLOCs (`KNGX`, `CAMBDGE`).
/// Codes are stored uppercase and are 1 to 7 ASCII letters or digits.
///
/// # Examples
///
/// ```
/// use train_status::domain::LocationCode;
///
/// let cbg = LocationCode::parse("CBG").unwrap();
/// assert_eq!(cbg.as_str(), "CBG");
///
/// // Lowercase input is normalized
/// assert_eq!(LocationCode::parse("cambdge").unwrap().as_str(), "CAMBDGE");
///
/// assert!(LocationCode::parse("").is_err());
/// assert!(LocationCode::parse("TOOLONGX").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationCode {
    bytes: [u8; MAX_LEN],
    len: u8,
}

impl LocationCode {
    /// Parse a location code, normalizing to uppercase.
    pub fn parse(s: &str) -> Result<Self, InvalidLocationCode> {
        let raw = s.trim().as_bytes();

        if raw.is_empty() {
            return Err(InvalidLocationCode {
                reason: "must not be empty",
            });
        }

        if raw.len() > MAX_LEN {
            return Err(InvalidLocationCode {
                reason: "must be at most 7 characters",
            });
        }

        let mut bytes = [0u8; MAX_LEN];
        for (slot, &b) in bytes.iter_mut().zip(raw) {
            if !b.is_ascii_alphanumeric() {
                return Err(InvalidLocationCode {
                    reason: "must be ASCII letters or digits",
                });
            }
            *slot = b.to_ascii_uppercase();
        }

        Ok(Self {
            bytes,
            len: raw.len() as u8,
        })
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII alphanumerics are ever stored.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }

    /// Whether `other` names this location, ignoring case and surrounding whitespace.
    pub fn matches(&self, other: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Debug for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocationCode({})", self.as_str())
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LocationCode {
    type Err = InvalidLocationCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_crs_and_tiploc() {
        assert_eq!(LocationCode::parse("KGX").unwrap().as_str(), "KGX");
        assert_eq!(LocationCode::parse("CAMBDGE").unwrap().as_str(), "CAMBDGE");
        assert_eq!(LocationCode::parse("STPX").unwrap().as_str(), "STPX");
        assert_eq!(LocationCode::parse("KNGX2").unwrap().as_str(), "KNGX2");
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(LocationCode::parse(" kgx ").unwrap().as_str(), "KGX");
    }

    #[test]
    fn reject_invalid() {
        assert!(LocationCode::parse("").is_err());
        assert!(LocationCode::parse("   ").is_err());
        assert!(LocationCode::parse("K-X").is_err());
        assert!(LocationCode::parse("K X").is_err());
        assert!(LocationCode::parse("KÖX").is_err());
        assert!(LocationCode::parse("ABCDEFGH").is_err());
    }

    #[test]
    fn matches_ignores_case() {
        let code = LocationCode::parse("CBG").unwrap();
        assert!(code.matches("cbg"));
        assert!(code.matches("CBG"));
        assert!(!code.matches("CBE"));
        assert!(!code.matches("CBGX"));
    }

    #[test]
    fn display_and_debug() {
        let code = LocationCode::parse("PAD").unwrap();
        assert_eq!(format!("{}", code), "PAD");
        assert_eq!(format!("{:?}", code), "LocationCode(PAD)");
    }

    #[test]
    fn equality_and_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(LocationCode::parse("kgx").unwrap());
        assert!(set.contains(&LocationCode::parse("KGX").unwrap()));
        assert!(!set.contains(&LocationCode::parse("PAD").unwrap()));
    }
}
