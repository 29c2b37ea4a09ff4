//! Renders layout draw-ops into a self-contained PDF 1.4 byte stream.
//!
//! A4 pages, Helvetica / Helvetica-Bold base fonts, no compression. The
//! layout engine works in top-left millimetres; this module owns the
//! conversion into PDF's bottom-left point space.

use crate::core::layout::{Document, DrawOp, Rgb, PAGE_HEIGHT, PAGE_WIDTH};

/// Millimetres to points.
const MM_TO_PT: f64 = 72.0 / 25.4;

fn x_pt(x_mm: f64) -> f64 {
    x_mm * MM_TO_PT
}

fn y_pt(y_mm: f64) -> f64 {
    (PAGE_HEIGHT - y_mm) * MM_TO_PT
}

fn color(c: Rgb) -> String {
    format!(
        "{:.3} {:.3} {:.3}",
        c.0 as f64 / 255.0,
        c.1 as f64 / 255.0,
        c.2 as f64 / 255.0
    )
}

/// Literal-string escaping per the PDF spec; glyphs outside WinAnsi-safe
/// ASCII are replaced rather than mis-encoded.
fn escape_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\\' => "\\\\".to_string(),
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            c if (' '..='~').contains(&c) => c.to_string(),
            _ => "?".to_string(),
        })
        .collect()
}

fn content_stream(ops: &[DrawOp]) -> String {
    let mut out = String::new();
    for op in ops {
        match op {
            DrawOp::FillRect { x, y, w, h, color: c } => {
                out.push_str(&format!(
                    "{} rg {:.2} {:.2} {:.2} {:.2} re f\n",
                    color(*c),
                    x_pt(*x),
                    y_pt(*y + *h),
                    w * MM_TO_PT,
                    h * MM_TO_PT,
                ));
            }
            DrawOp::StrokeRect { x, y, w, h, color: c } => {
                out.push_str(&format!(
                    "{} RG 0.5 w {:.2} {:.2} {:.2} {:.2} re S\n",
                    color(*c),
                    x_pt(*x),
                    y_pt(*y + *h),
                    w * MM_TO_PT,
                    h * MM_TO_PT,
                ));
            }
            DrawOp::Text {
                x,
                y,
                content,
                size,
                bold,
                color: c,
            } => {
                let font = if *bold { "F2" } else { "F1" };
                out.push_str(&format!(
                    "BT /{} {:.1} Tf {} rg {:.2} {:.2} Td ({}) Tj ET\n",
                    font,
                    size,
                    color(*c),
                    x_pt(*x),
                    y_pt(*y),
                    escape_text(content),
                ));
            }
        }
    }
    out
}

/// Serialize the document. Object layout: catalog, page tree, two fonts,
/// then a page/content pair per page.
pub fn render(document: &Document) -> Vec<u8> {
    let page_count = document.pages.len().max(1);
    let media_w = PAGE_WIDTH * MM_TO_PT;
    let media_h = PAGE_HEIGHT * MM_TO_PT;

    // Object ids: 1 catalog, 2 pages, 3/4 fonts, then 5+2i page, 6+2i content.
    let page_obj_id = |i: usize| 5 + 2 * i;
    let content_obj_id = |i: usize| 6 + 2 * i;
    let total_objects = 4 + 2 * page_count;

    let mut objects: Vec<String> = Vec::with_capacity(total_objects);
    objects.push("1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_string());

    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", page_obj_id(i)))
        .collect();
    objects.push(format!(
        "2 0 obj\n<< /Type /Pages /Kids [ {} ] /Count {} >>\nendobj\n",
        kids.join(" "),
        page_count
    ));
    objects.push(
        "3 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>\nendobj\n".to_string(),
    );
    objects.push(
        "4 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold >>\nendobj\n"
            .to_string(),
    );

    for i in 0..page_count {
        objects.push(format!(
            "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>\nendobj\n",
            page_obj_id(i),
            media_w,
            media_h,
            content_obj_id(i)
        ));
        let stream = document
            .pages
            .get(i)
            .map(|p| content_stream(&p.ops))
            .unwrap_or_default();
        objects.push(format!(
            "{} 0 obj\n<< /Length {} >>\nstream\n{}endstream\nendobj\n",
            content_obj_id(i),
            stream.len(),
            stream
        ));
    }

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets: Vec<usize> = Vec::with_capacity(total_objects);
    for obj in &objects {
        offsets.push(out.len());
        out.extend_from_slice(obj.as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", total_objects + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            total_objects + 1,
            xref_offset
        )
        .as_bytes(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layout::DocumentBuilder;

    #[test]
    fn test_render_produces_valid_pdf_skeleton() {
        let mut b = DocumentBuilder::new();
        b.title("Property Report", "Harbor Tower");
        b.info_row("Status", "active", false);
        let bytes = render(&b.finish());

        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Type /Catalog"));
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
        assert!(text.contains("(Property Report) Tj"));
    }

    #[test]
    fn test_render_one_page_object_per_page() {
        let mut b = DocumentBuilder::new();
        for _ in 0..100 {
            b.info_row("Field", "value", false);
        }
        let doc = b.finish();
        let pages = doc.pages.len();
        assert!(pages > 1);

        let text = String::from_utf8_lossy(&render(&doc)).to_string();
        let page_objects = text.matches("/Type /Page /Parent").count();
        assert_eq!(page_objects, pages);
        assert!(text.contains(&format!("/Count {}", pages)));
    }

    #[test]
    fn test_escape_parentheses_and_non_ascii() {
        assert_eq!(escape_text("a(b)c"), "a\\(b\\)c");
        assert_eq!(escape_text("back\\slash"), "back\\\\slash");
        assert_eq!(escape_text("café"), "caf?");
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut b = DocumentBuilder::new();
        b.info_row("Status", "active", false);
        let bytes = render(&b.finish());
        let text = String::from_utf8_lossy(&bytes).to_string();

        let xref_pos = text.find("xref\n").unwrap();
        let first_entry = text[xref_pos..]
            .lines()
            .nth(3)
            .unwrap()
            .split(' ')
            .next()
            .unwrap();
        let offset: usize = first_entry.parse().unwrap();
        assert!(text[offset..].starts_with("1 0 obj"));
    }
}
