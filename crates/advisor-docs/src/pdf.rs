//! PDF page-text extraction.

use lopdf::Document;

/// Extract the text of every page, in page order, joined with newlines.
///
/// A page whose text cannot be extracted contributes an empty string; a
/// document that cannot be parsed at all is an error.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, String> {
    let doc = Document::load_mem(bytes).map_err(|e| e.to_string())?;

    let pages: Vec<String> = doc
        .get_pages()
        .into_keys()
        .map(|page_num| match doc.extract_text(&[page_num]) {
            Ok(text) => text.trim_end_matches(['\n', '\r']).to_string(),
            Err(e) => {
                tracing::debug!("No text on PDF page {page_num}: {e}");
                String::new()
            }
        })
        .collect();

    tracing::debug!("Extracted {} PDF pages", pages.len());
    Ok(pages.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// Build a PDF with one page per entry; `None` makes a page with no text.
    fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let operations = match text {
                Some(text) => vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
                None => vec![],
            };
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn pages_are_joined_in_order() {
        let bytes = build_pdf(&[Some("Receita anual"), Some("Despesas fixas")]);
        let text = extract_pdf_text(&bytes).unwrap();

        let first = text.find("Receita").expect("first page text");
        let second = text.find("Despesas").expect("second page text");
        assert!(first < second, "pages out of order: {text:?}");
        assert!(text.contains('\n'));
    }

    #[test]
    fn page_without_text_contributes_empty_string() {
        let bytes = build_pdf(&[None, Some("Meta")]);
        let text = extract_pdf_text(&bytes).unwrap();
        assert!(text.trim_start().starts_with("Meta"), "got {text:?}");
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(extract_pdf_text(b"%PDF-1.4 definitely broken").is_err());
        assert!(extract_pdf_text(b"").is_err());
    }
}
