#![allow(dead_code)]

pub mod pdf_server;

use lopdf::{dictionary, Document, Object, Stream};

/// A small, structurally valid one-page PDF.
pub fn sample_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET".to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("serialize sample pdf");
    out
}

/// `%PDF-` header followed by bytes no parser accepts.
pub fn corrupt_pdf() -> Vec<u8> {
    let mut body = b"%PDF-1.4\n".to_vec();
    body.extend((0u8..=255).cycle().take(4096));
    body
}

/// An HTML page large enough to fill the signature window.
pub fn html_page() -> Vec<u8> {
    let mut body = b"<!DOCTYPE html><html><body>".to_vec();
    body.extend(std::iter::repeat(b'x').take(3000));
    body.extend_from_slice(b"</body></html>");
    body
}
