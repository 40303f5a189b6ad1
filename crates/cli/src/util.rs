use typed_path::Utf8NativePathBuf;

/// Path arguments for argp's `from_str_fn`.
pub fn native_path(value: &str) -> Result<Utf8NativePathBuf, String> {
    if value.trim().is_empty() {
        return Err("Expected a path".to_string());
    }
    Ok(Utf8NativePathBuf::from(value))
}
