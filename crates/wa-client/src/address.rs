//! Destination address normalization

use std::fmt;

/// Suffix WhatsApp Web uses for individual chats
pub const CANONICAL_SUFFIX: &str = "@c.us";

/// A destination in canonical `<id>@c.us` form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Normalize a caller-supplied destination.
    ///
    /// Appends [`CANONICAL_SUFFIX`] unless the input already ends with it, so
    /// normalizing twice gives the same result as normalizing once.
    pub fn normalize(raw: &str) -> Self {
        if raw.ends_with(CANONICAL_SUFFIX) {
            Self(raw.to_string())
        } else {
            Self(format!("{}{}", raw, CANONICAL_SUFFIX))
        }
    }

    /// The full address, suffix included
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the suffix (the phone number for individual chats)
    pub fn user(&self) -> &str {
        self.0.strip_suffix(CANONICAL_SUFFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_number_gets_suffix() {
        let addr = Address::normalize("6281234567890");
        assert_eq!(addr.as_str(), "6281234567890@c.us");
        assert_eq!(addr.user(), "6281234567890");
    }

    #[test]
    fn test_suffixed_number_unchanged() {
        let addr = Address::normalize("6281234567890@c.us");
        assert_eq!(addr.as_str(), "6281234567890@c.us");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["6281234567890", "6281234567890@c.us", "abc", "12@g.us", "@c.us", "x@c.us@c.us"] {
            let once = Address::normalize(raw);
            let twice = Address::normalize(once.as_str());
            assert_eq!(once, twice, "input: {}", raw);
            assert!(once.as_str().ends_with(CANONICAL_SUFFIX));
        }
    }

    #[test]
    fn test_other_domains_get_suffix_appended() {
        // Only the exact canonical suffix counts as already normalized
        let addr = Address::normalize("120363@g.us");
        assert_eq!(addr.as_str(), "120363@g.us@c.us");
    }

    #[test]
    fn test_display() {
        assert_eq!(Address::normalize("62").to_string(), "62@c.us");
    }
}
