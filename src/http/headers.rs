use std::collections::HashMap;

use crate::http::error::HttpError;

pub(crate) const CRLF: &[u8] = b"\r\n";

/// Case-insensitive collection of header fields.
///
/// Names are stored lower-cased. Setting a name that is already present
/// folds the new value onto the old one with `", "`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a field by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&name.to_ascii_lowercase())
    }

    /// Adds a field, folding onto an existing value of the same name.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.get_mut(&name.to_ascii_lowercase()) {
            Some(existing) if !existing.is_empty() => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            _ => {
                self.fields.insert(name.to_ascii_lowercase(), value);
            }
        }
    }

    /// Overwrites a field unconditionally.
    pub fn replace(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.remove(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses at most one header line from the front of `data`.
    ///
    /// Returns the number of bytes consumed and whether the blank line that
    /// ends the header section was reached. Consumes nothing when no full
    /// line is buffered yet, and nothing on error.
    pub fn parse(&mut self, data: &[u8]) -> Result<(usize, bool), HttpError> {
        let Some(line_end) = find_crlf(data) else {
            return Ok((0, false));
        };
        let consumed = line_end + CRLF.len();

        if line_end == 0 {
            return Ok((consumed, true));
        }

        let line = std::str::from_utf8(&data[..line_end])
            .map_err(|_| HttpError::MalformedHeaderLine("field line is not valid UTF-8".into()))?;

        let (raw_name, raw_value) = line.split_once(": ").ok_or_else(|| {
            HttpError::MalformedHeaderLine(format!(
                "field line is missing ':' or a space after ':' {line:?}"
            ))
        })?;

        let mut tokens = raw_name.split_whitespace();
        let name = match (tokens.next(), tokens.next()) {
            (Some(name), None) if !raw_name.ends_with(char::is_whitespace) => name,
            _ => {
                return Err(HttpError::MalformedHeaderLine(format!(
                    "invalid field name {raw_name:?}"
                )));
            }
        };

        if !is_token(name) {
            return Err(HttpError::MalformedHeaderLine(format!(
                "field name contains invalid characters {name:?}"
            )));
        }

        self.set(name, raw_value.trim());
        Ok((consumed, false))
    }
}

pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|w| w == CRLF)
}

/// `token` from RFC 9110: visible ASCII letters, digits and ``!#$%&'*+-.^_`|~``.
fn is_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}
