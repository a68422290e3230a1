use std::collections::HashMap;

use buildd_core::error::CliError;

/// Parses repeated `KEY=VALUE` flags. Later occurrences win.
pub fn parse_env_pairs(pairs: &[String]) -> Result<HashMap<String, String>, CliError> {
    let mut out = HashMap::new();
    for kv in pairs {
        let (k, v) = kv
            .split_once('=')
            .ok_or_else(|| CliError::Command(format!("invalid --env '{kv}' (expected KEY=VALUE)")))?;
        let key = k.trim();
        if key.is_empty() {
            return Err(CliError::Command(format!("invalid --env '{kv}' (empty key)")));
        }
        out.insert(key.to_string(), v.to_string());
    }
    Ok(out)
}

/// Reads a dotenv-style file. Blank lines and `#` comments are skipped;
/// values may be single or double quoted.
pub fn parse_env_file(path: &str) -> Result<Vec<(String, String)>, CliError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::Command(format!("failed to read env file: {e}")))?;
    let mut out = Vec::new();

    for (idx, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (k, v) = line.split_once('=').ok_or_else(|| {
            CliError::Command(format!(
                "invalid env line at {} (expected KEY=VALUE)",
                idx + 1
            ))
        })?;
        let key = k.trim();
        if key.is_empty() {
            return Err(CliError::Command(format!(
                "invalid env line at {} (empty key)",
                idx + 1
            )));
        }
        out.push((key.to_string(), unquote(v.trim()).to_string()));
    }

    Ok(out)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_pairs_keep_equals_in_values() {
        let env = parse_env_pairs(&["A=1".into(), "OPTS=-Dx=y".into(), "A=2".into()]).unwrap();
        assert_eq!(env["A"], "2");
        assert_eq!(env["OPTS"], "-Dx=y");
    }

    #[test]
    fn env_pairs_reject_missing_separator() {
        assert!(parse_env_pairs(&["NOPE".into()]).is_err());
        assert!(parse_env_pairs(&["=x".into()]).is_err());
    }

    #[test]
    fn env_file_skips_comments_and_unquotes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "# build env\nGRADLE_OPTS=\"-Xmx1g\"\n\nCI='true'\n").unwrap();
        let env = parse_env_file(path.to_str().unwrap()).unwrap();
        assert_eq!(
            env,
            vec![
                ("GRADLE_OPTS".to_string(), "-Xmx1g".to_string()),
                ("CI".to_string(), "true".to_string()),
            ]
        );
    }
}
