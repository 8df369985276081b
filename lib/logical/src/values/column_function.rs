use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// Characters kept as-is by `application/x-www-form-urlencoded` encoding.
const FORM_URL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'*')
    .remove(b'_');

/// ASCII characters that may not appear unescaped in an IRI.
const IRI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@');

/// A function applied to a column value before it is inserted into a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnFunction {
    #[default]
    Identity,
    /// Form URL encoding. Spaces become `+`.
    UrlEncode,
    /// Like [`ColumnFunction::UrlEncode`], but spaces become `_`.
    Urlify,
    /// Percent-encodes the ASCII characters that are not allowed in IRIs.
    Encode,
}

impl ColumnFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "urlencode" => Some(ColumnFunction::UrlEncode),
            "urlify" => Some(ColumnFunction::Urlify),
            "encode" => Some(ColumnFunction::Encode),
            _ => None,
        }
    }

    pub fn encode(self, value: &str) -> String {
        match self {
            ColumnFunction::Identity => value.to_owned(),
            ColumnFunction::UrlEncode => form_url_encode(value),
            ColumnFunction::Urlify => form_url_encode(value)
                .replace('_', "%5F")
                .replace('+', "_"),
            ColumnFunction::Encode => iri_encode(value),
        }
    }

    /// Reverses [`ColumnFunction::encode`]. Returns `None` for values that the function can
    /// never produce.
    pub fn decode(self, value: &str) -> Option<String> {
        match self {
            ColumnFunction::Identity => Some(value.to_owned()),
            ColumnFunction::UrlEncode => form_url_decode(value),
            ColumnFunction::Urlify => form_url_decode(&value.replace('_', "+")),
            ColumnFunction::Encode => percent_decode(value),
        }
    }
}

fn form_url_encode(value: &str) -> String {
    utf8_percent_encode(value, FORM_URL_ENCODE_SET)
        .to_string()
        .replace("%20", "+")
}

fn form_url_decode(value: &str) -> Option<String> {
    percent_decode(&value.replace('+', " "))
}

fn iri_encode(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut buffer = [0; 4];
    for c in value.chars() {
        if c.is_ascii() {
            result.extend(utf8_percent_encode(c.encode_utf8(&mut buffer), IRI_ENCODE_SET));
        } else {
            result.push(c);
        }
    }
    result
}

fn percent_decode(value: &str) -> Option<String> {
    if !is_well_formed(value) {
        return None;
    }
    percent_decode_str(value)
        .decode_utf8()
        .ok()
        .map(Cow::into_owned)
}

/// Checks that every `%` starts an escape sequence.
fn is_well_formed(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.iter().enumerate().all(|(i, b)| {
        *b != b'%'
            || bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    })
}

impl Display for ColumnFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnFunction::Identity => Ok(()),
            ColumnFunction::UrlEncode => f.write_str("urlencode"),
            ColumnFunction::Urlify => f.write_str("urlify"),
            ColumnFunction::Encode => f.write_str("encode"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encode() {
        assert_eq!(ColumnFunction::UrlEncode.encode("a b/c_d"), "a+b%2Fc_d");
        assert_eq!(
            ColumnFunction::UrlEncode.decode("a+b%2Fc_d").as_deref(),
            Some("a b/c_d")
        );
        assert_eq!(ColumnFunction::UrlEncode.decode("100%"), None);
    }

    #[test]
    fn test_urlify() {
        assert_eq!(ColumnFunction::Urlify.encode("a b_c"), "a_b%5Fc");
        assert_eq!(
            ColumnFunction::Urlify.decode("a_b%5Fc").as_deref(),
            Some("a b_c")
        );
    }

    #[test]
    fn test_iri_encode() {
        assert_eq!(
            ColumnFunction::Encode.encode("M\u{fc}ller & S\u{f6}hne"),
            "M\u{fc}ller%20&%20S\u{f6}hne"
        );
        assert_eq!(
            ColumnFunction::Encode.decode("M\u{fc}ller%20&%20S\u{f6}hne").as_deref(),
            Some("M\u{fc}ller & S\u{f6}hne")
        );
    }
}
