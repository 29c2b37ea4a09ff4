use crate::domain::model::ReportSection;
use chrono::{DateTime, Utc};

// Page geometry in millimetres (A4 portrait).
pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
pub const MARGIN_LEFT: f64 = 15.0;
pub const CONTENT_WIDTH: f64 = 180.0;
pub const TOP_MARGIN: f64 = 20.0;
/// Page-break threshold: a row starting below this line moves to a new page.
/// A row may begin exactly at the threshold, so threshold + ROW_HEIGHT must
/// not reach the footer band at `FOOTER_Y - 2`.
pub const PAGE_BREAK_Y: f64 = 277.0;
pub const ROW_HEIGHT: f64 = 8.0;
pub const FOOTER_Y: f64 = 287.0;
/// Hard cap per table; anything beyond collapses into one summary row so a
/// large collection cannot balloon the document.
pub const MAX_TABLE_ROWS: usize = 20;

/// Fixed x offset of the value column in label/value info rows.
const VALUE_COLUMN_X: f64 = MARGIN_LEFT + 90.0;
const CELL_PADDING: f64 = 2.0;
const BODY_FONT_SIZE: f64 = 9.0;
const TITLE_FONT_SIZE: f64 = 16.0;
/// Text baseline offset from the top of an 8mm row.
const BASELINE_OFFSET: f64 = 5.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const COLOR_TEXT: Rgb = Rgb(33, 33, 33);
pub const COLOR_MUTED: Rgb = Rgb(120, 120, 120);
pub const COLOR_ACCENT: Rgb = Rgb(30, 64, 175);
pub const COLOR_BORDER: Rgb = Rgb(200, 200, 200);
pub const COLOR_SHADE: Rgb = Rgb(245, 245, 245);
pub const COLOR_BAND: Rgb = Rgb(226, 232, 240);

/// One primitive drawing instruction. Coordinates are top-left based
/// millimetres; the rendering backend converts to its own space.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: Rgb,
    },
    StrokeRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: Rgb,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        size: f64,
        bold: bool,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    /// Phase 2 of assembly: the page count is only known once all content is
    /// drawn, so footers are stamped retroactively across every page.
    pub fn stamp_footers(&mut self, generated_at: DateTime<Utc>) {
        let total = self.pages.len();
        let stamp = format!("Generated {}", generated_at.format("%Y-%m-%d %H:%M UTC"));
        for (index, page) in self.pages.iter_mut().enumerate() {
            page.ops.push(DrawOp::FillRect {
                x: 0.0,
                y: FOOTER_Y - 2.0,
                w: PAGE_WIDTH,
                h: PAGE_HEIGHT - (FOOTER_Y - 2.0),
                color: COLOR_SHADE,
            });
            page.ops.push(DrawOp::Text {
                x: MARGIN_LEFT,
                y: FOOTER_Y + 3.0,
                content: format!("Page {} of {}", index + 1, total),
                size: 8.0,
                bold: false,
                color: COLOR_MUTED,
            });
            let width = approx_text_width(&stamp, 8.0);
            page.ops.push(DrawOp::Text {
                x: MARGIN_LEFT + CONTENT_WIDTH - width,
                y: FOOTER_Y + 3.0,
                content: stamp.clone(),
                size: 8.0,
                bold: false,
                color: COLOR_MUTED,
            });
        }
    }
}

/// Helvetica averages roughly half an em per glyph; close enough for
/// right-aligning short footer strings.
fn approx_text_width(text: &str, size_pt: f64) -> f64 {
    text.chars().count() as f64 * size_pt * 0.5 * 0.3528
}

/// Owned builder threading the vertical cursor through every draw call.
/// Page-break decisions live here and nowhere else.
pub struct DocumentBuilder {
    pages: Vec<Page>,
    cursor_y: f64,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            cursor_y: TOP_MARGIN,
        }
    }

    pub fn cursor(&self) -> f64 {
        self.cursor_y
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_mut(&mut self) -> &mut Page {
        self.pages.last_mut().expect("builder always has a page")
    }

    fn break_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor_y = TOP_MARGIN;
    }

    /// Returns true when the cursor crossed the threshold and a new page was
    /// started.
    fn ensure_room(&mut self) -> bool {
        if self.cursor_y > PAGE_BREAK_Y {
            self.break_page();
            true
        } else {
            false
        }
    }

    pub fn title(&mut self, text: &str, subtitle: &str) {
        let y = self.cursor_y;
        self.page_mut().ops.push(DrawOp::Text {
            x: MARGIN_LEFT,
            y: y + 6.0,
            content: text.to_string(),
            size: TITLE_FONT_SIZE,
            bold: true,
            color: COLOR_ACCENT,
        });
        self.page_mut().ops.push(DrawOp::Text {
            x: MARGIN_LEFT,
            y: y + 12.0,
            content: subtitle.to_string(),
            size: 10.0,
            bold: false,
            color: COLOR_MUTED,
        });
        self.page_mut().ops.push(DrawOp::FillRect {
            x: MARGIN_LEFT,
            y: y + 14.0,
            w: CONTENT_WIDTH,
            h: 0.8,
            color: COLOR_ACCENT,
        });
        self.cursor_y = y + 18.0;
    }

    pub fn spacer(&mut self, height: f64) {
        self.cursor_y += height;
    }

    pub fn section_header(&mut self, title: &str) {
        self.ensure_room();
        let y = self.cursor_y;
        self.page_mut().ops.push(DrawOp::FillRect {
            x: MARGIN_LEFT,
            y,
            w: CONTENT_WIDTH,
            h: ROW_HEIGHT,
            color: COLOR_BAND,
        });
        self.page_mut().ops.push(DrawOp::Text {
            x: MARGIN_LEFT + CELL_PADDING,
            y: y + BASELINE_OFFSET,
            content: title.to_string(),
            size: 10.0,
            bold: true,
            color: COLOR_ACCENT,
        });
        self.cursor_y = y + ROW_HEIGHT;
    }

    /// Label/value row used by the info and summary blocks: optional shading
    /// band, border rect, bold label, value at the fixed right column.
    pub fn info_row(&mut self, label: &str, value: &str, shaded: bool) {
        self.ensure_room();
        let y = self.cursor_y;
        if shaded {
            self.page_mut().ops.push(DrawOp::FillRect {
                x: MARGIN_LEFT,
                y,
                w: CONTENT_WIDTH,
                h: ROW_HEIGHT,
                color: COLOR_SHADE,
            });
        }
        self.page_mut().ops.push(DrawOp::StrokeRect {
            x: MARGIN_LEFT,
            y,
            w: CONTENT_WIDTH,
            h: ROW_HEIGHT,
            color: COLOR_BORDER,
        });
        self.page_mut().ops.push(DrawOp::Text {
            x: MARGIN_LEFT + CELL_PADDING,
            y: y + BASELINE_OFFSET,
            content: label.to_string(),
            size: BODY_FONT_SIZE,
            bold: true,
            color: COLOR_TEXT,
        });
        self.page_mut().ops.push(DrawOp::Text {
            x: VALUE_COLUMN_X,
            y: y + BASELINE_OFFSET,
            content: value.to_string(),
            size: BODY_FONT_SIZE,
            bold: false,
            color: COLOR_TEXT,
        });
        self.cursor_y = y + ROW_HEIGHT;
    }

    fn column_header_row(&mut self, columns: &[String]) {
        let y = self.cursor_y;
        self.page_mut().ops.push(DrawOp::FillRect {
            x: MARGIN_LEFT,
            y,
            w: CONTENT_WIDTH,
            h: ROW_HEIGHT,
            color: COLOR_BAND,
        });
        let col_width = CONTENT_WIDTH / columns.len().max(1) as f64;
        for (i, column) in columns.iter().enumerate() {
            self.page_mut().ops.push(DrawOp::Text {
                x: MARGIN_LEFT + i as f64 * col_width + CELL_PADDING,
                y: y + BASELINE_OFFSET,
                content: column.clone(),
                size: BODY_FONT_SIZE,
                bold: true,
                color: COLOR_TEXT,
            });
        }
        self.cursor_y = y + ROW_HEIGHT;
    }

    fn data_row(&mut self, cells: &[String], columns: usize, shaded: bool) {
        let y = self.cursor_y;
        if shaded {
            self.page_mut().ops.push(DrawOp::FillRect {
                x: MARGIN_LEFT,
                y,
                w: CONTENT_WIDTH,
                h: ROW_HEIGHT,
                color: COLOR_SHADE,
            });
        }
        self.page_mut().ops.push(DrawOp::StrokeRect {
            x: MARGIN_LEFT,
            y,
            w: CONTENT_WIDTH,
            h: ROW_HEIGHT,
            color: COLOR_BORDER,
        });
        let col_width = CONTENT_WIDTH / columns.max(1) as f64;
        for (i, cell) in cells.iter().take(columns).enumerate() {
            self.page_mut().ops.push(DrawOp::Text {
                x: MARGIN_LEFT + i as f64 * col_width + CELL_PADDING,
                y: y + BASELINE_OFFSET,
                content: cell.clone(),
                size: BODY_FONT_SIZE,
                bold: false,
                color: COLOR_TEXT,
            });
        }
        self.cursor_y = y + ROW_HEIGHT;
    }

    /// Section header + column headers + capped data rows. The threshold is
    /// checked before every data row; after a break the column-header row is
    /// re-drawn so each page of a long table is self-describing.
    pub fn table(&mut self, section: &ReportSection) {
        self.section_header(&section.title);
        self.ensure_room();
        self.column_header_row(&section.columns);

        for (i, row) in section.rows.iter().take(MAX_TABLE_ROWS).enumerate() {
            if self.cursor_y > PAGE_BREAK_Y {
                self.break_page();
                self.column_header_row(&section.columns);
            }
            self.data_row(row, section.columns.len(), i % 2 == 1);
        }

        if section.rows.len() > MAX_TABLE_ROWS {
            self.ensure_room();
            let y = self.cursor_y;
            self.page_mut().ops.push(DrawOp::Text {
                x: MARGIN_LEFT + CELL_PADDING,
                y: y + BASELINE_OFFSET,
                content: format!(
                    "... and {} more {}",
                    section.rows.len() - MAX_TABLE_ROWS,
                    section.overflow_noun
                ),
                size: BODY_FONT_SIZE,
                bold: false,
                color: COLOR_MUTED,
            });
            self.cursor_y = y + ROW_HEIGHT;
        }
    }

    pub fn finish(self) -> Document {
        Document { pages: self.pages }
    }
}
