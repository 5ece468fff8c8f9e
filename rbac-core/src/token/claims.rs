use serde_json::{Map, Value};

/// Legacy namespaced role claim emitted by ASP.NET Identity style issuers.
pub const ROLE_URI: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

/// Legacy namespaced user id claim.
pub const NAME_IDENTIFIER_URI: &str =
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";

/// Role claim candidates, highest priority first.
pub const ROLE_KEYS: &[&str] = &["role", ROLE_URI];

/// User id claim candidates, highest priority first.
pub const USER_ID_KEYS: &[&str] = &["uid", NAME_IDENTIFIER_URI, "sub"];

pub const EXPIRY_KEY: &str = "exp";
pub const EMAIL_KEY: &str = "email";

/// Decoded token payload.
///
/// Claims are never persisted; they are recomputed from the token string
/// whenever they are needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Value of the first candidate key that is present and not null.
    pub fn first_of(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .find_map(|key| self.0.get(*key).filter(|value| !value.is_null()))
    }

    /// Roles carried by the payload, in claim order.
    ///
    /// A lone string is a single role; arrays keep their string elements.
    pub fn roles(&self) -> Vec<String> {
        match self.first_of(ROLE_KEYS) {
            Some(Value::String(role)) if !role.is_empty() => vec![role.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn user_id(&self) -> Option<String> {
        match self.first_of(USER_ID_KEYS)? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Expiry in seconds since the epoch.
    ///
    /// Fractional values are truncated; a zero expiry counts as absent.
    pub fn expires_at(&self) -> Option<i64> {
        let exp = self.0.get(EXPIRY_KEY)?;
        let seconds = exp
            .as_i64()
            .or_else(|| exp.as_f64().map(|value| value.trunc() as i64))?;
        (seconds != 0).then_some(seconds)
    }

    pub fn email(&self) -> Option<&str> {
        self.0.get(EMAIL_KEY).and_then(Value::as_str)
    }
}
