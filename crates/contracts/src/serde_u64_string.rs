//! Serialize u64 identifiers as decimal strings so big-integer ledger ids
//! survive JSON clients that truncate past 2^53.

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum U64Input {
        String(String),
        Number(u64),
    }

    match U64Input::deserialize(deserializer)? {
        U64Input::String(raw) => raw.parse::<u64>().map_err(D::Error::custom),
        U64Input::Number(value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Wrapper {
        #[serde(with = "super")]
        product_id: u64,
    }

    #[test]
    fn deserialize_accepts_string() {
        let parsed: Wrapper = serde_json::from_str(r#"{"product_id":"4821"}"#).expect("string id");
        assert_eq!(parsed.product_id, 4821);
    }

    #[test]
    fn deserialize_accepts_number() {
        let parsed: Wrapper = serde_json::from_str(r#"{"product_id":4821}"#).expect("numeric id");
        assert_eq!(parsed.product_id, 4821);
    }

    #[test]
    fn serialize_emits_string() {
        let json = serde_json::to_string(&Wrapper { product_id: 9 }).expect("serialize");
        assert_eq!(json, r#"{"product_id":"9"}"#);
    }
}
