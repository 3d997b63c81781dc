//! Bearer token used for authenticated catalog endpoints (media uploads).

use std::fmt;

use zeroize::Zeroize;

/// Api token sent as `Authorization: Bearer <token>`.
/// Debug output is masked and the token is zeroized on drop.
#[derive(Clone, Default)]
pub struct BearerToken {
    token: String,
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = if self.token.is_empty() {
            "None"
        } else {
            "Some(MASKED)"
        };
        f.debug_struct("BearerToken")
            .field("token", &masked)
            .finish()
    }
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Returns true if the token is non-empty.
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    pub(crate) fn set_auth_header(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.bearer_auth(&self.token)
    }
}

impl Zeroize for BearerToken {
    fn zeroize(&mut self) {
        self.token.zeroize();
    }
}

impl Drop for BearerToken {
    fn drop(&mut self) {
        self.zeroize();
    }
}
