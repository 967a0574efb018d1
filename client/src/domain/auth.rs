//! Authentication inputs such as login credentials and signup details.
//!
//! Validation happens before the session manager talks to the gateway, so a
//! blank form never costs a network round trip.

use std::fmt;

use zeroize::Zeroizing;

/// Domain error returned when credential values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Username was missing or blank once trimmed.
    EmptyUsername,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

fn normalise_username(username: &str) -> Result<String, CredentialsValidationError> {
    let normalized = username.trim();
    if normalized.is_empty() {
        return Err(CredentialsValidationError::EmptyUsername);
    }
    Ok(normalized.to_owned())
}

fn require_password(password: &str) -> Result<Zeroizing<String>, CredentialsValidationError> {
    if password.is_empty() {
        return Err(CredentialsValidationError::EmptyPassword);
    }
    Ok(Zeroizing::new(password.to_owned()))
}

/// Validated login credentials.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use dedup_client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" alice ", "secret").unwrap();
/// assert_eq!(creds.username(), "alice");
/// assert_eq!(creds.password(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        Ok(Self {
            username: normalise_username(username)?,
            password: require_password(password)?,
        })
    }

    /// Username sent to the login endpoint.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated signup details.
///
/// The email is optional; a blank email is treated as absent so the signup
/// payload omits the field entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupDetails {
    username: String,
    email: Option<String>,
    password: Zeroizing<String>,
}

impl SignupDetails {
    /// Construct signup details from raw form inputs.
    pub fn try_from_parts(
        username: &str,
        email: Option<&str>,
        password: &str,
    ) -> Result<Self, CredentialsValidationError> {
        let email = email
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);
        Ok(Self {
            username: normalise_username(username)?,
            email,
            password: require_password(password)?,
        })
    }

    /// Username to register.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Optional contact email.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", CredentialsValidationError::EmptyUsername)]
    #[case("   ", "pw", CredentialsValidationError::EmptyUsername)]
    #[case("user", "", CredentialsValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: CredentialsValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(username, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("  admin  ", "secret")]
    #[case("alice", "correct horse battery staple")]
    fn valid_credentials_trim_username(#[case] username: &str, #[case] password: &str) {
        let creds = LoginCredentials::try_from_parts(username, password)
            .expect("valid inputs should succeed");
        assert_eq!(creds.username(), username.trim());
        assert_eq!(creds.password(), password);
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("   "), None)]
    #[case(Some(" bob@example.com "), Some("bob@example.com"))]
    fn signup_email_is_optional(#[case] email: Option<&str>, #[case] expected: Option<&str>) {
        let details =
            SignupDetails::try_from_parts("bob", email, "pw").expect("valid signup details");
        assert_eq!(details.email(), expected);
    }

    #[test]
    fn signup_rejects_blank_username() {
        let err = SignupDetails::try_from_parts(" ", Some("a@b.c"), "pw")
            .expect_err("blank username must fail");
        assert_eq!(err, CredentialsValidationError::EmptyUsername);
    }
}
