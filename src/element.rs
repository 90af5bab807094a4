//! Tokenizer for the `keyword key=value ...` lines of the text format and the
//! `<keyword key="value" .../>` lines of the XML format.
//!
//! Fields are looked up by key, so their order on the line does not matter.

use std::borrow::Cow;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::format::{Block, Format};

/// One parsed line.
#[derive(Debug)]
pub(crate) struct Element<'a> {
    /// First token of the line, `/name` for XML closing tags.
    pub(crate) keyword: &'a str,
    fields: Vec<(&'a str, Cow<'a, str>)>,
    block: Block,
}

impl<'a> Element<'a> {
    /// Splits `line` into its keyword and fields. Errors are attributed to `block`.
    pub(crate) fn parse(line: &'a str, format: Format, block: Block) -> Result<Self> {
        let body = match format {
            Format::Xml => strip_tag(line),
            _ => line.trim(),
        };
        let (keyword, mut rest) = split_keyword(body);

        let mut fields = Vec::new();
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            let key_end = rest
                .find(|c: char| c == '=' || c.is_whitespace())
                .unwrap_or(rest.len());
            let key = &rest[..key_end];
            rest = &rest[key_end..];
            let Some(after_eq) = rest.strip_prefix('=') else {
                // A bare token carries no value; nothing in any block uses one.
                continue;
            };

            let (value, tail) = if let Some(quoted) = after_eq.strip_prefix('"') {
                let end = quoted.find('"').ok_or_else(|| Error::UnexpectedElement {
                    block,
                    expected: format!("closing quote after `{key}=`"),
                    found: line.trim().to_owned(),
                })?;
                (&quoted[..end], &quoted[end + 1..])
            } else {
                let end = after_eq
                    .find(char::is_whitespace)
                    .unwrap_or(after_eq.len());
                (&after_eq[..end], &after_eq[end..])
            };
            let value = match format {
                Format::Xml => unescape(value),
                _ => Cow::Borrowed(value),
            };
            fields.push((key, value));
            rest = tail;
        }

        Ok(Self { keyword, fields, block })
    }

    /// Fails unless the line's keyword is `expected`.
    pub(crate) fn expect(self, expected: &str, line: &str) -> Result<Self> {
        if self.keyword == expected {
            Ok(self)
        } else {
            Err(Error::UnexpectedElement {
                block: self.block,
                expected: expected.to_owned(),
                found: line.trim().to_owned(),
            })
        }
    }

    /// Raw value of `key`.
    pub(crate) fn str(&self, key: &'static str) -> Result<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_ref())
            .ok_or(Error::MissingField {
                block: self.block,
                field: key,
            })
    }

    /// Value of `key` parsed as an integer of the field's width.
    pub(crate) fn int<T: FromStr>(&self, key: &'static str) -> Result<T> {
        let value = self.str(key)?;
        value.trim().parse().map_err(|_| self.invalid(key, value))
    }

    /// Value of `key` as a `0`/`1` flag.
    pub(crate) fn flag(&self, key: &'static str) -> Result<bool> {
        match self.str(key)?.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            value => Err(self.invalid(key, value)),
        }
    }

    /// Value of `key` as a comma-separated list of exactly `N` bytes.
    pub(crate) fn list<const N: usize>(&self, key: &'static str) -> Result<[u8; N]> {
        let value = self.str(key)?;
        let mut out = [0; N];
        let mut items = value.split(',');
        for slot in &mut out {
            *slot = items
                .next()
                .and_then(|item| item.trim().parse().ok())
                .ok_or_else(|| self.invalid(key, value))?;
        }
        if items.next().is_some() {
            return Err(self.invalid(key, value));
        }
        Ok(out)
    }

    fn invalid(&self, field: &'static str, value: &str) -> Error {
        Error::InvalidField {
            block: self.block,
            field,
            value: value.to_owned(),
        }
    }
}

/// Returns the keyword of `line` without tokenizing the rest of it.
pub(crate) fn keyword(line: &str, format: Format) -> &str {
    let body = match format {
        Format::Xml => strip_tag(line),
        _ => line.trim(),
    };
    split_keyword(body).0
}

/// Whether an XML line closes itself, as in `<chars count="0"/>`.
pub(crate) fn is_self_closing(line: &str) -> bool {
    line.trim_end().ends_with("/>")
}

fn strip_tag(line: &str) -> &str {
    let line = line.trim();
    let line = line.strip_prefix('<').unwrap_or(line);
    let line = line
        .strip_suffix("/>")
        .or_else(|| line.strip_suffix('>'))
        .unwrap_or(line);
    line.trim_end()
}

fn split_keyword(body: &str) -> (&str, &str) {
    let end = body.find(char::is_whitespace).unwrap_or(body.len());
    body.split_at(end)
}

/// Escapes a string for use inside a double-quoted XML attribute.
pub(crate) fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(&['&', '<', '>', '"'][..]) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn unescape(value: &str) -> Cow<'_, str> {
    if !value.contains('&') {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        let entity = [
            ("&amp;", '&'),
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&quot;", '"'),
            ("&apos;", '\''),
        ]
        .into_iter()
        .find(|(name, _)| rest.starts_with(name));
        match entity {
            Some((name, c)) => {
                out.push(c);
                rest = &rest[name.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
