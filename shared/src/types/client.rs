use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A client shown in the logo showcase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub logo: String,
    pub website: Option<String>,
    pub order: i64,
    pub active: bool,
}

/// Body of `POST /api/clients` and `PUT /api/clients/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    /// Admin forms send this either as a number or as a numeric string.
    #[serde(default)]
    pub order: Option<Value>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Fully-resolved values for an insert or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFields {
    pub name: String,
    pub logo: String,
    pub website: Option<String>,
    pub order: i64,
    pub active: bool,
}

impl ClientInput {
    /// Resolve the payload. `None` when name or logo is missing or empty.
    ///
    /// `active` defaults to `true`, so newly created clients are shown and
    /// an update that omits the flag re-activates the client.
    pub fn into_fields(self) -> Option<ClientFields> {
        let name = self.name.filter(|n| !n.is_empty())?;
        let logo = self.logo.filter(|l| !l.is_empty())?;
        let order = self.order.as_ref().map(parse_order).unwrap_or(0);

        Some(ClientFields {
            name,
            logo,
            website: self.website.filter(|w| !w.is_empty()),
            order,
            active: self.active.unwrap_or(true),
        })
    }
}

/// Lenient integer parse: numbers are truncated, strings contribute their
/// leading (optionally signed) digits, anything else is 0.
pub fn parse_order(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let trimmed = s.trim();
            let (sign, digits) = match trimmed.strip_prefix('-') {
                Some(rest) => (-1, rest),
                None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
            };
            let leading: String = digits.chars().take_while(|c| c.is_ascii_digit()).collect();
            leading.parse::<i64>().map(|n| sign * n).unwrap_or(0)
        }
        _ => 0,
    }
}
