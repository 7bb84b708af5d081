//! Identities bound to generated keys.

use crate::crypto::error::{PgpError, Result};

/// Longest accepted identity name, in characters.
pub const NAME_MAX_LEN: usize = 256;

const FORBIDDEN_CHARS: [char; 5] = ['(', ')', '<', '>', '\0'];

/// Name, comment and email a key pair is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
    comment: String,
    email: String,
}

impl Identity {
    /// Build an identity, validating field lengths and characters.
    pub fn new(
        name: impl Into<String>,
        comment: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self> {
        let identity = Self {
            name: name.into(),
            comment: comment.into(),
            email: email.into(),
        };

        let name_len = identity.name.chars().count();
        if name_len > NAME_MAX_LEN {
            return Err(PgpError::Validation(format!(
                "name must be at most {} characters, got {}",
                NAME_MAX_LEN, name_len
            )));
        }

        for (field, value) in [
            ("name", &identity.name),
            ("comment", &identity.comment),
            ("email", &identity.email),
        ] {
            if let Some(c) = value.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
                return Err(PgpError::Validation(format!(
                    "{} contains forbidden character {:?}",
                    field, c
                )));
            }
        }

        Ok(identity)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// OpenPGP user id string: `name (comment) <email>`.
    ///
    /// Empty comment or email parts are left out together with their
    /// delimiters.
    pub fn user_id(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if !self.name.is_empty() {
            parts.push(self.name.clone());
        }
        if !self.comment.is_empty() {
            parts.push(format!("({})", self.comment));
        }
        if !self.email.is_empty() {
            parts.push(format!("<{}>", self.email));
        }
        parts.join(" ")
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.user_id())
    }
}
