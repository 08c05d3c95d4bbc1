#[macro_export]
macro_rules! print_result_err {
    ($context:expr, $result:expr $(,)?) => {{
        if let Err(err) = $result {
            log::error!("[{}:{}] Error {}: {:?}", ::std::file!(), ::std::line!(), $context, err);
        }
    }};
}

/// Parse a `key=value` command line argument.
pub fn parse_key_value(s: &str) -> anyhow::Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("arguments must be in the shape `key=value`, but got: {}", s))?;
    Ok((key.to_owned(), value.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(("category".to_owned(), "email".to_owned()), parse_key_value("category=email").unwrap());
        assert_eq!(("a".to_owned(), "b=c".to_owned()), parse_key_value("a=b=c").unwrap());
        assert!(parse_key_value("category").is_err());
    }
}
