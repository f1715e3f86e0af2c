use std::fmt;

/// Bearer token for the completion endpoint. An empty credential is a valid
/// state meaning no token has been configured.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn new(token: &str) -> Credential {
        return Credential {
            token: token.trim().to_string(),
        };
    }

    pub fn is_empty(&self) -> bool {
        return self.token.is_empty();
    }

    pub fn expose(&self) -> &str {
        return &self.token;
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Credential(<empty>)");
        }

        return write!(f, "Credential(***)");
    }
}
