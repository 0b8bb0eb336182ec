//! Customer contact details: email addresses and phone numbers.
//!
//! Both types normalize on parse so that lookups by contact (order tracking,
//! customer de-duplication at checkout) compare like with like.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing contact details.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// The input is empty after trimming.
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    /// The email is longer than allowed.
    #[error("email must be at most {max} characters")]
    EmailTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The email is not of the form `local@domain.tld`.
    #[error("email must look like name@domain.tld")]
    MalformedEmail,
    /// The phone number contains characters other than digits and separators.
    #[error("phone number may only contain digits, spaces, dashes, dots, parentheses and a leading +")]
    InvalidPhoneCharacter,
    /// The phone number has too few or too many digits.
    #[error("phone number must have between {min} and {max} digits")]
    PhoneLength {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count.
        max: usize,
    },
}

/// A normalized (trimmed, lowercased) email address.
///
/// ```
/// use bloom_core::Email;
///
/// let email = Email::parse("  Flora@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "flora@example.com");
///
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("user@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize an email address.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or does not have a
    /// non-empty local part and a dotted domain separated by a single `@`.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::Empty("email"));
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ContactError::EmailTooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = s.split_once('@').ok_or(ContactError::MalformedEmail)?;
        let domain_ok = !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.');
        if local.is_empty() || !domain_ok || s.contains(char::is_whitespace) {
            return Err(ContactError::MalformedEmail);
        }

        Ok(Self(s.to_lowercase()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part of the email (after the @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = ContactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl std::str::FromStr for Email {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A phone number reduced to its digits (with an optional leading `+`).
///
/// ```
/// use bloom_core::Phone;
///
/// let phone = Phone::parse("(555) 010-4477").unwrap();
/// assert_eq!(phone.as_str(), "5550104477");
///
/// let intl = Phone::parse("+44 20 7946 0958").unwrap();
/// assert_eq!(intl.as_str(), "+442079460958");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Fewest digits accepted.
    pub const MIN_DIGITS: usize = 8;
    /// Most digits accepted (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains letters or other
    /// symbols, or has a digit count outside `8..=15`.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::Empty("phone number"));
        }

        let (plus, rest) = s
            .strip_prefix('+')
            .map_or((false, s), |rest| (true, rest));

        let mut digits = String::with_capacity(rest.len() + 1);
        if plus {
            digits.push('+');
        }
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return Err(ContactError::InvalidPhoneCharacter),
            }
        }

        let count = digits.trim_start_matches('+').len();
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&count) {
            return Err(ContactError::PhoneLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(digits))
    }

    /// Returns the normalized number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = ContactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalizes_case_and_whitespace() {
        let email = Email::parse("  Rose.Garden+tag@Blooms.CO.uk ").unwrap();
        assert_eq!(email.as_str(), "rose.garden+tag@blooms.co.uk");
        assert_eq!(email.domain(), "blooms.co.uk");
    }

    #[test]
    fn test_email_rejects_malformed() {
        assert_eq!(Email::parse(""), Err(ContactError::Empty("email")));
        assert_eq!(Email::parse("@x.com"), Err(ContactError::MalformedEmail));
        assert_eq!(Email::parse("a@b"), Err(ContactError::MalformedEmail));
        assert_eq!(Email::parse("a@b@c.com"), Err(ContactError::MalformedEmail));
        assert_eq!(Email::parse("a b@c.com"), Err(ContactError::MalformedEmail));
        assert_eq!(Email::parse("a@.com"), Err(ContactError::MalformedEmail));
    }

    #[test]
    fn test_email_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(ContactError::EmailTooLong { .. })
        ));
    }

    #[test]
    fn test_email_deserialize_validates() {
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
        let email: Email = serde_json::from_str("\"A@B.io\"").unwrap();
        assert_eq!(email.as_str(), "a@b.io");
    }

    #[test]
    fn test_phone_strips_separators() {
        assert_eq!(Phone::parse("090.123.4567").unwrap().as_str(), "0901234567");
        assert_eq!(Phone::parse("+1 (555) 010-9999").unwrap().as_str(), "+15550109999");
    }

    #[test]
    fn test_phone_rejects_letters_and_bad_lengths() {
        assert_eq!(
            Phone::parse("555-FLOWERS"),
            Err(ContactError::InvalidPhoneCharacter)
        );
        assert!(matches!(
            Phone::parse("12345"),
            Err(ContactError::PhoneLength { .. })
        ));
        assert!(matches!(
            Phone::parse("1234567890123456"),
            Err(ContactError::PhoneLength { .. })
        ));
        assert_eq!(Phone::parse("   "), Err(ContactError::Empty("phone number")));
    }
}
