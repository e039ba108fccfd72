//! Charset detection for text responses

use encoding_rs::{Encoding, UTF_8};

/// Body decoded to UTF-8
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    /// Name of the encoding actually used
    pub encoding: &'static str,
    /// True if malformed sequences were replaced with U+FFFD
    pub had_errors: bool,
}

/// Decodes raw bytes using: BOM -> Content-Type charset -> XML declaration -> UTF-8
///
/// Never fails. Unknown labels fall through to the next source.
pub fn decode_text(bytes: &[u8], content_type: Option<&str>) -> DecodedText {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(encoding) = content_type
        .and_then(extract_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return decode_with(bytes, encoding);
    }

    if let Some(encoding) = xml_declared_encoding(bytes)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return decode_with(bytes, encoding);
    }

    decode_with(bytes, UTF_8)
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> DecodedText {
    let (text, used, had_errors) = encoding.decode(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding: used.name(),
        had_errors,
    }
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches(['"', '\''].as_ref()).to_string())
        })
        .find(|label| !label.is_empty())
}

/// Reads `encoding="..."` from a leading `<?xml ...?>` declaration
fn xml_declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let decl = head.trim_start().strip_prefix("<?xml")?;
    let decl = &decl[..decl.find("?>")?];

    let rest = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    Some(value[..value.find(quote)?].to_string())
}
