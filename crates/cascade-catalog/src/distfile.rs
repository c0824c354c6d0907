//! Vendor distribution-file metadata parsing.
//!
//! Vendor installer description documents are markup files carrying a
//! `<localization>` block whose `<strings>` element holds installer script
//! statements of the form:
//!
//! ```text
//! // a comment
//! "SU_TITLE" = "Security Update";
//! "SU_DESCRIPTION" = 'Multi-line
//! text is fine, and may quote "the other" style.';
//! ```
//!
//! Keys are word characters; values are delimited by matching double or
//! single quotes and terminated by the quote plus `;` at end of line. A
//! malformed statement is skipped and scanning resumes at the next line,
//! which can silently drop later keys — that is long-standing, documented
//! parser behavior that downstream tooling depends on, and it is covered
//! by tests rather than "fixed". Duplicate keys: the last occurrence wins.

use std::collections::BTreeMap;

use crate::error::{CatalogError, Result};

/// A parsed vendor distribution document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistFileDocument {
    installer_script: BTreeMap<String, String>,
}

impl DistFileDocument {
    /// Parses a distribution document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DocumentFormat`] if the document is not
    /// well-formed markup or lacks the `<localization>`/`<strings>` text
    /// region. Per-statement faults inside the region never fail the
    /// document as a whole.
    pub fn parse(document: &str) -> Result<Self> {
        let region = extract_strings_region(document)?;
        Ok(Self {
            installer_script: parse_installer_script(&region),
        })
    }

    /// Returns the parsed installer script key/value pairs.
    #[must_use]
    pub fn installer_script(&self) -> &BTreeMap<String, String> {
        &self.installer_script
    }

    /// Returns a single installer script value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.installer_script.get(key).map(String::as_str)
    }
}

/// Human-readable metadata projected from a distribution document.
///
/// Every field is optional: vendors omit keys freely and consumers treat
/// absence as "unknown", never as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistSummary {
    /// `SU_TITLE`.
    pub title: Option<String>,
    /// `SU_VERS`, falling back to `SU_VERSION` when absent.
    pub version: Option<String>,
    /// `SU_SERVERCOMMENT`.
    pub servercomment: Option<String>,
    /// `SU_DESCRIPTION`.
    pub description: Option<String>,
}

/// Parses a distribution document and projects the summary keys.
///
/// # Errors
///
/// Returns [`CatalogError::DocumentFormat`] under the same conditions as
/// [`DistFileDocument::parse`].
pub fn summarize(document: &str) -> Result<DistSummary> {
    let parsed = DistFileDocument::parse(document)?;
    let field = |key: &str| parsed.get(key).map(ToOwned::to_owned);
    Ok(DistSummary {
        title: field("SU_TITLE"),
        version: field("SU_VERS").or_else(|| field("SU_VERSION")),
        servercomment: field("SU_SERVERCOMMENT"),
        description: field("SU_DESCRIPTION"),
    })
}

/// Extracts the concatenated text of the `<strings>` element.
fn extract_strings_region(document: &str) -> Result<String> {
    if !document.contains("<localization") {
        return Err(CatalogError::document_format(
            "document has no localization element",
        ));
    }

    let open_start = document
        .find("<strings")
        .ok_or_else(|| CatalogError::document_format("document has no strings element"))?;
    let after_open = &document[open_start..];
    let open_end = after_open
        .find('>')
        .ok_or_else(|| CatalogError::document_format("unterminated strings start tag"))?;
    let body_start = open_start + open_end + 1;
    let body_end = document[body_start..]
        .find("</strings>")
        .map(|i| body_start + i)
        .ok_or_else(|| CatalogError::document_format("unterminated strings element"))?;

    Ok(decode_text(&document[body_start..body_end]))
}

/// Concatenates the text content of a markup region, resolving CDATA
/// sections and the predefined character entities.
fn decode_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("<![CDATA[") {
        out.push_str(&unescape_entities(&rest[..start]));
        let cdata = &rest[start + "<![CDATA[".len()..];
        match cdata.find("]]>") {
            Some(end) => {
                out.push_str(&cdata[..end]);
                rest = &cdata[end + "]]>".len()..];
            }
            None => {
                out.push_str(cdata);
                rest = "";
            }
        }
    }
    out.push_str(&unescape_entities(rest));
    out
}

fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Scans the text region for installer script statements.
fn parse_installer_script(region: &str) -> BTreeMap<String, String> {
    let mut script = BTreeMap::new();
    let mut pos = 0;

    while pos < region.len() {
        let rest = &region[pos..];
        let trimmed = rest.trim_start_matches([' ', '\t']);

        if trimmed.starts_with("//") {
            pos = next_line(region, pos);
            continue;
        }

        if let Some((key, value, consumed)) = match_statement(trimmed) {
            script.insert(key, value);
            pos += (rest.len() - trimmed.len()) + consumed;
            pos = next_line(region, pos);
            continue;
        }

        // Malformed or blank line: resynchronize at the next line. Any
        // statement swallowed by a bad multi-line value stays lost.
        pos = next_line(region, pos);
    }

    script
}

/// Matches one `"KEY" = Q VALUE Q;` statement at the start of `input`.
///
/// Returns the key, the value, and the number of bytes consumed through
/// the terminating `;`.
fn match_statement(input: &str) -> Option<(String, String, usize)> {
    let after_quote = input.strip_prefix('"')?;
    let key_len = after_quote.find('"')?;
    let key = &after_quote[..key_len];
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    // Cursor past the closing key quote.
    let mut idx = 1 + key_len + 1;
    idx += count_blanks(&input[idx..]);
    if !input[idx..].starts_with('=') {
        return None;
    }
    idx += 1;
    idx += count_blanks(&input[idx..]);

    let quote = match input[idx..].chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return None,
    };
    let value_start = idx + 1;

    // The value runs to the first matching quote; an embedded unescaped
    // quote therefore breaks the statement unless it is the terminator.
    let quote_off = input[value_start..].find(quote)?;
    let value_end = value_start + quote_off;
    let after_value = &input[value_end + 1..];
    if !after_value.starts_with(';') {
        return None;
    }
    match after_value[1..].chars().next() {
        None | Some('\n' | '\r') => {}
        Some(_) => return None,
    }

    Some((
        key.to_string(),
        input[value_start..value_end].to_string(),
        value_end + 2,
    ))
}

fn count_blanks(input: &str) -> usize {
    input.len() - input.trim_start_matches([' ', '\t']).len()
}

/// Byte offset of the line following the one containing `pos`.
fn next_line(region: &str, pos: usize) -> usize {
    region[pos..]
        .find('\n')
        .map_or(region.len(), |i| pos + i + 1)
}
