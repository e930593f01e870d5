//! Shared test helpers

/// Build a minimal valid PDF with `pages` empty pages, entirely in
/// memory. Object offsets in the xref table are computed while
/// writing, so the result parses without relying on engine repair.
#[must_use]
pub fn sample_pdf(pages: usize) -> Vec<u8> {
    assert!(pages > 0, "a PDF needs at least one page");

    let kids = (0..pages)
        .map(|i| format!("{} 0 R", 3 + i))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_string(),
        format!(
            "2 0 obj\n<< /Type /Pages /Kids [{kids}] /Count {pages} /MediaBox [0 0 200 200] >>\nendobj\n"
        ),
    ];
    for i in 0..pages {
        objects.push(format!(
            "{} 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n",
            3 + i
        ));
    }

    let mut buf: Vec<u8> = Vec::new();
    buf.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for object in &objects {
        offsets.push(buf.len());
        buf.extend_from_slice(object.as_bytes());
    }

    let xref_at = buf.len();
    let entries = objects.len() + 1;
    buf.extend_from_slice(format!("xref\n0 {entries}\n").as_bytes());
    buf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        buf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    buf.extend_from_slice(
        format!("trailer\n<< /Size {entries} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n")
            .as_bytes(),
    );

    buf
}
