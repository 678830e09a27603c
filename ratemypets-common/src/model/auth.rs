use crate::model::{
    Id,
    post::Post,
    user::{Role, User, UserMarker, Username},
};
use base64::{
    DecodeError, Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error as _, Unexpected},
};
use std::fmt::{Debug, Formatter};
use thiserror::Error;

/// base64url as used in JWT segments, tolerating producers that keep the padding.
const TOKEN_SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("A credential must not be empty")]
pub struct EmptyCredentialError;

#[derive(Debug, Error)]
pub enum IdentityDecodeError {
    #[error("Token is not made of three '.'-separated parts")]
    NotEnoughParts,
    #[error("Decoding base64 failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("Token claims were invalid: {0}")]
    Claims(#[from] serde_json::Error),
}

/// Opaque bearer token presented to the remote on mutating calls.
#[derive(Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: String) -> Result<Self, EmptyCredentialError> {
        if token.trim().is_empty() {
            Err(EmptyCredentialError)
        } else {
            Ok(Self(token))
        }
    }

    #[must_use]
    pub fn bearer(&self) -> &str {
        &self.0
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential").field(&"[redacted]").finish()
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Credential::new(inner)
            .map_err(|_| D::Error::invalid_value(Unexpected::Str(""), &"a non-empty credential"))
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Id<UserMarker>,
    pub username: Username,
    pub role: Role,
}

#[derive(Deserialize)]
struct TokenClaims {
    id: Id<UserMarker>,
    username: Username,
    #[serde(default)]
    role: Role,
}

impl Identity {
    /// Reads the identity claims out of a JWT-shaped credential.
    ///
    /// The signature is not checked. The server verifies it on every call, this is only used to
    /// know who the client is acting as.
    pub fn from_token(credential: &Credential) -> Result<Self, IdentityDecodeError> {
        let mut parts = credential.bearer().split('.');

        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(IdentityDecodeError::NotEnoughParts);
        };

        let claims: TokenClaims = serde_json::from_slice(&TOKEN_SEGMENT_ENGINE.decode(payload)?)?;

        Ok(Self {
            user_id: claims.id,
            username: claims.username,
            role: claims.role,
        })
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    #[must_use]
    pub fn as_user(&self) -> User {
        User {
            id: self.user_id.clone(),
            username: self.username.clone(),
        }
    }
}

/// Whether `identity` may edit or delete `post`: admins may touch any post, everyone else only
/// their own.
#[must_use]
pub fn can_mutate(identity: &Identity, post: &Post) -> bool {
    identity.is_admin() || identity.user_id == post.author.id
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated {
        identity: Identity,
        credential: Credential,
    },
}

impl Session {
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { identity, .. } => Some(identity),
        }
    }

    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { credential, .. } => Some(credential),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }
}
