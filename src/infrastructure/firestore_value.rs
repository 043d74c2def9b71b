//! Firestore REST 的类型化值编码
//!
//! REST 接口中每个值都包在一个单键对象里，例如 `{"stringValue": "a"}`，
//! 整数以字符串形式传输。这里负责与普通 JSON 互转。

use serde_json::{json, Value as JsonValue};

use crate::error::{AppResult, PersistenceError};
use crate::infrastructure::JsonMap;

pub fn encode_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Null => json!({ "nullValue": null }),
        JsonValue::Bool(b) => json!({ "booleanValue": b }),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or_default() })
            }
        }
        JsonValue::String(s) => json!({ "stringValue": s }),
        JsonValue::Array(items) => {
            let values: Vec<JsonValue> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        JsonValue::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(fields: &JsonMap) -> JsonMap {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

pub fn decode_value(value: &JsonValue) -> AppResult<JsonValue> {
    let obj = value
        .as_object()
        .filter(|o| o.len() == 1)
        .ok_or_else(|| decode_error(format!("无法识别的值: {}", value)))?;

    // filter 保证恰好一个键
    let Some((kind, inner)) = obj.iter().next() else {
        return Err(decode_error("空值对象".to_string()));
    };

    let decoded = match kind.as_str() {
        "nullValue" => JsonValue::Null,
        "booleanValue" => JsonValue::Bool(inner.as_bool().unwrap_or(false)),
        "integerValue" => {
            let n = match inner {
                JsonValue::String(s) => s
                    .parse::<i64>()
                    .map_err(|e| decode_error(format!("整数解析失败 '{}': {}", s, e)))?,
                JsonValue::Number(n) => n
                    .as_i64()
                    .ok_or_else(|| decode_error(format!("整数超出范围: {}", n)))?,
                other => return Err(decode_error(format!("整数格式错误: {}", other))),
            };
            json!(n)
        }
        "doubleValue" => inner.clone(),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(|v| v.as_array())
                .map(|vs| vs.iter().map(decode_value).collect::<AppResult<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            JsonValue::Array(values)
        }
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(|v| v.as_object())
                .map(decode_fields)
                .transpose()?
                .unwrap_or_default();
            JsonValue::Object(fields)
        }
        other => return Err(decode_error(format!("未知的值类型: {}", other))),
    };

    Ok(decoded)
}

pub fn decode_fields(fields: &JsonMap) -> AppResult<JsonMap> {
    fields
        .iter()
        .map(|(k, v)| decode_value(v).map(|d| (k.clone(), d)))
        .collect()
}

fn decode_error(message: String) -> crate::error::AppError {
    PersistenceError::DecodeFailed {
        source: message.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_quiz_shape() {
        let value = json!({
            "title": "安全培训",
            "responseCount": 2,
            "items": [{"question": "Q1", "options": ["A", "B"], "answer": "A"}]
        });
        let encoded = encode_fields(value.as_object().unwrap());

        assert_eq!(encoded["title"], json!({"stringValue": "安全培训"}));
        assert_eq!(encoded["responseCount"], json!({"integerValue": "2"}));
        let first = &encoded["items"]["arrayValue"]["values"][0]["mapValue"]["fields"];
        assert_eq!(
            first["options"]["arrayValue"]["values"][1],
            json!({"stringValue": "B"})
        );
    }

    #[test]
    fn test_decode_server_document() {
        let fields = json!({
            "type": {"stringValue": "バグ"},
            "createdAt": {"timestampValue": "2024-06-01T08:00:00.123456Z"},
            "count": {"integerValue": "41"},
            "tags": {"arrayValue": {}},
            "meta": {"mapValue": {}}
        });
        let decoded = decode_fields(fields.as_object().unwrap()).unwrap();

        assert_eq!(decoded["type"], "バグ");
        assert_eq!(decoded["createdAt"], "2024-06-01T08:00:00.123456Z");
        assert_eq!(decoded["count"], 41);
        assert_eq!(decoded["tags"], json!([]));
        assert_eq!(decoded["meta"], json!({}));
    }

    #[test]
    fn test_decode_rejects_unknown() {
        assert!(decode_value(&json!({"fancyValue": 1})).is_err());
        assert!(decode_value(&json!("bare")).is_err());
        assert!(decode_value(&json!({"integerValue": "x1"})).is_err());
    }
}
