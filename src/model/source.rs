//! 源文本值：解析时保留数字原文、容器原文与重复键
//!
//! `serde_json::Value` 会规范化数字、合并重复键，这里借助 `RawValue` 直接切片源文本

use std::{fmt, marker::PhantomData};

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::value::RawValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceValue<'a> {
    /// 属性按源顺序排列，重复键全部保留
    Object {
        entries: Vec<(String, SourceValue<'a>)>,
        raw: &'a str,
    },
    Array {
        items: Vec<SourceValue<'a>>,
        raw: &'a str,
    },
    /// 已解码的字符串内容
    String(String),
    /// 数字的源文本
    Number(&'a str),
    Bool(bool),
    Null,
}

impl<'a> SourceValue<'a> {
    pub fn parse(text: &'a str) -> Result<Self, serde_json::Error> {
        let raw: &RawValue = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    /// 解析字节：非 UTF-8 内容同样报告为解析错误
    pub fn from_slice(bytes: &'a [u8]) -> Result<Self, serde_json::Error> {
        let raw: &RawValue = serde_json::from_slice(bytes)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: &'a RawValue) -> Result<Self, serde_json::Error> {
        let text = raw.get().trim();
        let value = match text.as_bytes().first() {
            Some(b'{') => {
                let RawEntries(entries) = serde_json::from_str(text)?;
                let entries = entries
                    .into_iter()
                    .map(|(key, child)| Self::from_raw(child).map(|v| (key, v)))
                    .collect::<Result<Vec<_>, _>>()?;
                SourceValue::Object { entries, raw: text }
            }
            Some(b'[') => {
                let items: Vec<&RawValue> = serde_json::from_str(text)?;
                let items = items
                    .into_iter()
                    .map(Self::from_raw)
                    .collect::<Result<Vec<_>, _>>()?;
                SourceValue::Array { items, raw: text }
            }
            Some(b'"') => SourceValue::String(serde_json::from_str(text)?),
            Some(b't') => SourceValue::Bool(true),
            Some(b'f') => SourceValue::Bool(false),
            Some(b'n') => SourceValue::Null,
            _ => SourceValue::Number(text),
        };
        Ok(value)
    }

    /// 按属性名取值；同名属性出现多次时取最后一个
    pub fn get(&self, key: &str) -> Option<&SourceValue<'a>> {
        match self {
            SourceValue::Object { entries, .. } => {
                entries.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }
}

/// 对象的一层属性，值保持未解析的原文
struct RawEntries<'a>(Vec<(String, &'a RawValue)>);

impl<'de> Deserialize<'de> for RawEntries<'de> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<'de>(PhantomData<&'de ()>);

        impl<'de> Visitor<'de> for EntriesVisitor<'de> {
            type Value = RawEntries<'de>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, &'de RawValue>()? {
                    entries.push(entry);
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_keep_source_spelling() {
        let v = SourceValue::parse("[1e5, 1E5, 1.5E+2, -0, 0.000]").unwrap();
        let SourceValue::Array { items, .. } = v else { panic!("应为数组") };
        assert_eq!(
            items,
            vec![
                SourceValue::Number("1e5"),
                SourceValue::Number("1E5"),
                SourceValue::Number("1.5E+2"),
                SourceValue::Number("-0"),
                SourceValue::Number("0.000"),
            ]
        );
    }

    #[test]
    fn test_container_raw_text_keeps_whitespace() {
        let v = SourceValue::parse(r#"{"id": {"a": 1,  "b": [1, 2]}}"#).unwrap();
        match v.get("id") {
            Some(SourceValue::Object { raw, .. }) => assert_eq!(*raw, r#"{"a": 1,  "b": [1, 2]}"#),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_not_part_of_raw() {
        let v = SourceValue::parse(" \n[ 1 ] \n").unwrap();
        assert!(matches!(v, SourceValue::Array { raw: "[ 1 ]", .. }));
    }

    #[test]
    fn test_duplicate_keys_are_kept() {
        let v = SourceValue::parse(r#"{"a":1,"b":2,"a":3}"#).unwrap();
        let SourceValue::Object { entries, .. } = &v else { panic!("应为对象") };
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "a"]);
        assert_eq!(v.get("a"), Some(&SourceValue::Number("3")));
    }

    #[test]
    fn test_strings_and_keys_are_decoded() {
        let v = SourceValue::parse(r#"{"key": "say \"hi\""}"#).unwrap();
        assert_eq!(v.get("key"), Some(&SourceValue::String("say \"hi\"".into())));
    }

    #[test]
    fn test_literals() {
        let v = SourceValue::parse("[true, false, null]").unwrap();
        let SourceValue::Array { items, .. } = v else { panic!("应为数组") };
        assert_eq!(items, vec![SourceValue::Bool(true), SourceValue::Bool(false), SourceValue::Null]);
    }

    #[test]
    fn test_invalid_input_is_error() {
        assert!(SourceValue::parse("{\"a\": }").is_err());
        assert!(SourceValue::parse("").is_err());
        assert!(SourceValue::from_slice(b"\"\xff\"").is_err());
    }
}
