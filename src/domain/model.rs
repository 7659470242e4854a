use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 三個非負整數 (A, B, C)，由 presenter 維持總和等於 total。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Triple {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Triple {
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    pub fn get(&self, field: FieldId) -> u32 {
        match field {
            FieldId::First => self.a,
            FieldId::Second => self.b,
            FieldId::Third => self.c,
        }
    }

    pub fn with(mut self, field: FieldId, value: u32) -> Self {
        match field {
            FieldId::First => self.a = value,
            FieldId::Second => self.b = value,
            FieldId::Third => self.c = value,
        }
        self
    }

    pub fn sum(&self) -> u64 {
        u64::from(self.a) + u64::from(self.b) + u64::from(self.c)
    }
}

impl From<[u32; 3]> for Triple {
    fn from([a, b, c]: [u32; 3]) -> Self {
        Self { a, b, c }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.a, self.b, self.c)
    }
}

/// Which component of the triple a user edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldId {
    First,
    Second,
    Third,
}

impl FieldId {
    pub const ALL: [FieldId; 3] = [FieldId::First, FieldId::Second, FieldId::Third];

    /// The component adjusted when this one is edited.
    pub fn successor(self) -> Self {
        match self {
            FieldId::First => FieldId::Second,
            FieldId::Second => FieldId::Third,
            FieldId::Third => FieldId::First,
        }
    }

    /// The component kept when this one is edited.
    pub fn predecessor(self) -> Self {
        match self {
            FieldId::First => FieldId::Third,
            FieldId::Second => FieldId::First,
            FieldId::Third => FieldId::Second,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldId::First => "A",
            FieldId::Second => "B",
            FieldId::Third => "C",
        }
    }

    /// 解析 shell 指令中的欄位名稱 (a/b/c 或 first/second/third)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "a" | "first" => Some(FieldId::First),
            "b" | "second" => Some(FieldId::Second),
            "c" | "third" => Some(FieldId::Third),
            _ => None,
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Input fields of the send panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Identifier,
    Amount,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Identifier => "identifier",
            Field::Amount => "amount",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const DEFAULT_CURRENCY: &str = "USD";

/// 每次 submit 重新建立的資料，送出後不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub identifier: String,
    pub amount: u32,
    pub currency: String,
}

impl Payload {
    pub fn new(identifier: impl Into<String>, amount: u32) -> Self {
        Self {
            identifier: identifier.into(),
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// Key/value view handed to transports.
    pub fn to_map(&self) -> BTreeMap<String, serde_json::Value> {
        let mut data = BTreeMap::new();
        data.insert(
            "identifier".to_string(),
            serde_json::Value::String(self.identifier.clone()),
        );
        data.insert(
            "amount".to_string(),
            serde_json::Value::Number(self.amount.into()),
        );
        data.insert(
            "currency".to_string(),
            serde_json::Value::String(self.currency.clone()),
        );
        data
    }
}

/// Result of a remote call as reported by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Option<String>),
    Failure(Option<String>),
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Outcome::Success(Some(message.into()))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Outcome::Failure(Some(message.into()))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Success(m) | Outcome::Failure(m) => m.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_cycle() {
        for field in FieldId::ALL {
            assert_eq!(field.successor().predecessor(), field);
            assert_ne!(field.successor(), field.predecessor());
        }
        assert_eq!(FieldId::First.successor(), FieldId::Second);
        assert_eq!(FieldId::First.predecessor(), FieldId::Third);
    }

    #[test]
    fn test_field_parse() {
        assert_eq!(FieldId::parse("A"), Some(FieldId::First));
        assert_eq!(FieldId::parse(" second "), Some(FieldId::Second));
        assert_eq!(FieldId::parse("d"), None);
    }

    #[test]
    fn test_payload_map() {
        let payload = Payload::new("alice", 42);
        let map = payload.to_map();
        assert_eq!(map.len(), 3);
        assert_eq!(map["identifier"], serde_json::json!("alice"));
        assert_eq!(map["amount"], serde_json::json!(42));
        assert_eq!(map["currency"], serde_json::json!("USD"));
    }
}
