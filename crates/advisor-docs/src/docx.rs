//! DOCX paragraph extraction.
//!
//! A DOCX file is a ZIP archive; the body lives in `word/document.xml`. Only
//! paragraphs that are direct children of `w:body` count (paragraphs inside
//! tables, content controls or text boxes are skipped). A paragraph's text is
//! built from its runs, including runs wrapped in hyperlinks.

use std::io::{Cursor, Read};

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract body paragraphs from DOCX bytes, joined with newlines.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("invalid archive: {e}"))?;

    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| format!("no {DOCUMENT_PART} in archive"))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| format!("failed to read {DOCUMENT_PART}: {e}"))?;

    let paragraphs = body_paragraphs(&xml);
    tracing::debug!("Extracted {} DOCX paragraphs", paragraphs.len());
    Ok(paragraphs.join("\n"))
}

/// Walk `document.xml` and return the text of each body-level paragraph.
pub fn body_paragraphs(xml: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut stack: Vec<&str> = Vec::new();
    // Stack index of the body paragraph currently being collected.
    let mut para_at: Option<usize> = None;
    let mut current = String::new();
    let mut in_text = false;

    let mut rest = xml;
    while let Some(lt) = rest.find('<') {
        if in_text && lt > 0 {
            current.push_str(&decode_entities(&rest[..lt]));
        }
        rest = &rest[lt..];

        if let Some(after) = rest.strip_prefix("<!--") {
            rest = after.find("-->").map_or("", |i| &after[i + 3..]);
            continue;
        }
        if let Some(after) = rest.strip_prefix("<![CDATA[") {
            let end = after.find("]]>").unwrap_or(after.len());
            if in_text {
                current.push_str(&after[..end]);
            }
            rest = after.get(end + 3..).unwrap_or("");
            continue;
        }
        if rest.starts_with("<?") || rest.starts_with("<!") {
            rest = rest.find('>').map_or("", |i| &rest[i + 1..]);
            continue;
        }

        let Some(end) = tag_end(rest) else { break };
        let tag = &rest[1..end];
        rest = &rest[end + 1..];

        if let Some(name) = tag.strip_prefix('/') {
            let name = name.trim();
            if let Some(pos) = stack.iter().rposition(|open| *open == name) {
                stack.truncate(pos);
            }
            if name == "w:t" {
                in_text = false;
            }
            if para_at.is_some_and(|at| stack.len() <= at) {
                paragraphs.push(std::mem::take(&mut current));
                para_at = None;
                in_text = false;
            }
            continue;
        }

        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_end_matches('/')
            .split(|c: char| c.is_whitespace())
            .next()
            .unwrap_or("");

        if name == "w:p" && para_at.is_none() && stack.last() == Some(&"w:body") {
            if self_closing {
                paragraphs.push(String::new());
                continue;
            }
            para_at = Some(stack.len());
        } else if let Some(at) = para_at {
            if is_run_child(&stack, at) {
                match name {
                    "w:t" if !self_closing => in_text = true,
                    "w:tab" => current.push('\t'),
                    "w:br" | "w:cr" => current.push('\n'),
                    "w:noBreakHyphen" => current.push('-'),
                    _ => {}
                }
            }
        }

        if !self_closing {
            stack.push(name);
        }
    }

    paragraphs
}

/// True when an element opened now would be a direct child of a run that
/// belongs to the paragraph at stack index `at` (optionally via a hyperlink).
fn is_run_child(stack: &[&str], at: usize) -> bool {
    match &stack[at + 1..] {
        ["w:r"] => true,
        ["w:hyperlink", "w:r"] => true,
        _ => false,
    }
}

/// Index of the `>` closing the tag that starts at `s[0] == '<'`, skipping
/// quoted attribute values.
fn tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

/// Decode the predefined XML entities and numeric character references.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => {
                    let code = if let Some(hex) = entity.strip_prefix("#x") {
                        u32::from_str_radix(hex, 16).ok()
                    } else if let Some(dec) = entity.strip_prefix('#') {
                        dec.parse().ok()
                    } else {
                        None
                    };
                    code.and_then(char::from_u32)
                }
            };
            c.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
