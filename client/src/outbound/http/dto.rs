//! Wire shapes that need translation before reaching the domain.

use serde::Deserialize;

use crate::domain::{Role, Session};

/// Profile as returned by `/api/me`.
#[derive(Debug, Deserialize)]
pub(super) struct ProfileDto {
    id: i64,
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// `/api/me` answers with either a bare profile or `{user: profile}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum MeResponseDto {
    Wrapped { user: ProfileDto },
    Bare(ProfileDto),
}

impl MeResponseDto {
    pub(super) fn into_session(self) -> Session {
        let profile = match self {
            Self::Wrapped { user } => user,
            Self::Bare(profile) => profile,
        };
        Session {
            id: profile.id,
            username: profile.username,
            email: profile.email.filter(|email| !email.trim().is_empty()),
            role: profile
                .role
                .as_deref()
                .map_or(Role::User, Role::from_server),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Profile normalisation coverage.
    use super::*;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[case::bare(json!({ "id": 4, "username": "root", "email": "r@x.io", "role": "admin" }))]
    #[case::wrapped(json!({ "user": { "id": 4, "username": "root", "email": "r@x.io", "role": "admin" } }))]
    fn accepts_both_profile_shapes(#[case] body: Value) {
        let session = serde_json::from_value::<MeResponseDto>(body)
            .expect("profile decodes")
            .into_session();
        assert_eq!(
            session,
            Session {
                id: 4,
                username: "root".to_owned(),
                email: Some("r@x.io".to_owned()),
                role: Role::Admin,
            }
        );
    }

    #[test]
    fn missing_role_and_blank_email_normalise() {
        let session = serde_json::from_value::<MeResponseDto>(json!({
            "id": 9, "username": "bob", "email": ""
        }))
        .expect("profile decodes")
        .into_session();
        assert_eq!(session.role, Role::User);
        assert!(session.email.is_none());
    }

    #[test]
    fn rejects_bodies_without_a_profile() {
        assert!(serde_json::from_value::<MeResponseDto>(json!({ "ok": true })).is_err());
    }
}
