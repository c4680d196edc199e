//! IO helper: read a JSON document from disk

use std::{fs, path::Path};

use serde_json::Value;
use crate::model::data_core::AppError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 读取文件原始字节，去掉开头的 UTF-8 BOM。编码问题留给解析阶段报告
pub fn read_json_bytes(p: &Path) -> Result<Vec<u8>, AppError> {
    let mut bytes = fs::read(p)?;
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    Ok(bytes)
}

/// 解析为JSON DOM（对象键保持源顺序）
pub fn parse_json_slice(bytes: &[u8]) -> Result<Value, AppError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("创建临时文件失败");
        file.write_all(bytes).expect("写入临时文件失败");
        file
    }

    #[test]
    fn test_read_valid_file() {
        let file = temp_file(br#"{"b": 1, "a": 2}"#);

        let bytes = read_json_bytes(file.path()).expect("读取应该成功");
        let v = parse_json_slice(&bytes).expect("解析应该成功");
        let keys: Vec<_> = v.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_bom_is_stripped() {
        let file = temp_file(b"\xEF\xBB\xBF{\"id\": 7}");

        let bytes = read_json_bytes(file.path()).unwrap();
        assert_eq!(bytes, br#"{"id": 7}"#);
        assert!(parse_json_slice(&bytes).is_ok());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_json_bytes(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let file = temp_file(b"{\"a\": \"\xff\"}");

        let bytes = read_json_bytes(file.path()).expect("读取不检查编码");
        assert!(matches!(parse_json_slice(&bytes), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_malformed_text_is_parse_error() {
        assert!(matches!(parse_json_slice(b"{\"a\": }"), Err(AppError::Parse(_))));
        assert!(matches!(parse_json_slice(b""), Err(AppError::Parse(_))));
    }
}
