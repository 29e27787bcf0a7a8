//! Splitting an input line into tokens.

use crate::error::ShellError;

/// Whitespace-separated tokens; single or double quotes group words.
pub fn split_line(line: &str) -> Result<Vec<String>, ShellError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if quote.is_some() {
        return Err(ShellError::invalid_argument("unterminated quote", line));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Positional arguments and `--flag [value]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    pub positional: Vec<String>,
    pub flags: Vec<(String, Option<String>)>,
}

impl ParsedArgs {
    /// `value_flags` name the flags that consume the following token.
    pub fn parse(args: &[String], value_flags: &[&str]) -> Result<Self, ShellError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if let Some(name) = arg.strip_prefix("--") {
                let name = name.to_ascii_lowercase();
                if value_flags.contains(&name.as_str()) {
                    let value = iter.next().ok_or_else(|| {
                        ShellError::invalid_argument(format!("--{} needs a value", name), arg)
                    })?;
                    parsed.flags.push((name, Some(value.clone())));
                } else {
                    parsed.flags.push((name, None));
                }
            } else {
                parsed.positional.push(arg.clone());
            }
        }
        Ok(parsed)
    }

    pub fn has(&self, flag: &str) -> bool {
        self.flags.iter().any(|(name, _)| name == flag)
    }

    pub fn value(&self, flag: &str) -> Option<&str> {
        self.flags
            .iter()
            .find(|(name, _)| name == flag)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Reject flags outside `known`.
    pub fn only(&self, known: &[&str], input: &str) -> Result<(), ShellError> {
        match self.flags.iter().find(|(name, _)| !known.contains(&name.as_str())) {
            Some((name, _)) => Err(ShellError::invalid_argument(
                format!("unknown flag --{}", name),
                input,
            )),
            None => Ok(()),
        }
    }
}
