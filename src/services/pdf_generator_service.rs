use crate::errors::AppError;
use crate::models::{
    DistributionBucket, DiversificationLevel, PortfolioStatus, Priority, ReportData, RiskLevel,
    ValuedPosition,
};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerIndex, PdfLayerReference, PdfPageIndex, Point, Rect, Rgb,
};
use tracing::warn;

// A4 geometry in millimetres. All layout constants are absolute: there is no
// reflow, so column offsets and row heights must not drift or cells start
// overlapping.
const PAGE_W: f64 = 210.0;
const PAGE_H: f64 = 297.0;
const MARGIN: f64 = 18.0;
const CONTENT_W: f64 = PAGE_W - 2.0 * MARGIN;
const FOOTER_Y: f64 = 285.0;

// Asset detail table: fixed column offsets (mm from left edge) and row pitch.
const COL_TICKER: f64 = 20.0;
const COL_NAME: f64 = 38.0;
const COL_QTY: f64 = 72.0;
const COL_BUY: f64 = 94.0;
const COL_NOW: f64 = 120.0;
const COL_VALUE: f64 = 146.0;
const COL_GAIN: f64 = 172.0;
const DETAIL_ROW_H: f64 = 6.5;
const DETAIL_PAGE_LIMIT: f64 = 258.0;
const DETAIL_GROUP_START_LIMIT: f64 = 230.0;

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        (r as f64 / 255.0) as _,
        (g as f64 / 255.0) as _,
        (b as f64 / 255.0) as _,
        None,
    ))
}

fn blue() -> Color {
    rgb(0x25, 0x63, 0xeb)
}
fn green() -> Color {
    rgb(0x10, 0xb9, 0x81)
}
fn red() -> Color {
    rgb(0xef, 0x44, 0x44)
}
fn amber() -> Color {
    rgb(0xf5, 0x9e, 0x0b)
}
fn black() -> Color {
    rgb(0, 0, 0)
}
fn white() -> Color {
    rgb(0xff, 0xff, 0xff)
}
fn gray() -> Color {
    rgb(0x88, 0x88, 0x88)
}
fn light_blue_bg() -> Color {
    rgb(0xf0, 0xf9, 0xff)
}
fn light_gray_bg() -> Color {
    rgb(0xf3, 0xf4, 0xf6)
}
fn light_green_bg() -> Color {
    rgb(0xf0, 0xfd, 0xf4)
}
fn light_red_bg() -> Color {
    rgb(0xfe, 0xf2, 0xf2)
}
fn light_amber_bg() -> Color {
    rgb(0xfe, 0xf3, 0xc7)
}

fn gain_color(value: f64) -> Color {
    if value >= 0.0 {
        green()
    } else {
        red()
    }
}

/// Glyph substitutions applied before layout. The builtin Helvetica fonts are
/// WinAnsi encoded; leaking symbolic glyphs through corrupts the content
/// stream, so everything outside that set is replaced or stripped.
const SYMBOL_REPLACEMENTS: &[(&str, &str)] = &[
    ("\u{1F947}", "*1."),
    ("\u{1F948}", "*2."),
    ("\u{1F949}", "*3."),
    ("4\u{FE0F}\u{20E3}", "*4."),
    ("5\u{FE0F}\u{20E3}", "*5."),
    ("\u{1F4CA}", "[DIV]"),
    ("\u{26A0}\u{FE0F}", "[!]"),
    ("\u{26A0}", "[!]"),
    ("\u{1F3AF}", "[*]"),
    ("\u{1F4B0}", "[$]"),
    ("\u{1F4C9}", "[v]"),
    ("\u{1F4C8}", "[^]"),
    ("\u{2705}", "[OK]"),
    ("\u{274C}", "[X]"),
    ("\u{1F4A1}", "[i]"),
    ("\u{1F534}", "[HIGH]"),
    ("\u{1F7E1}", "[MED]"),
    ("\u{1F7E2}", "[LOW]"),
    ("\u{1F6A8}", "[!!]"),
    ("\u{1F525}", ">>>"),
    ("\u{2B50}", "*"),
];

pub fn sanitize_text(text: &str) -> String {
    let mut out = text.to_string();
    for (glyph, replacement) in SYMBOL_REPLACEMENTS {
        if out.contains(glyph) {
            out = out.replace(glyph, replacement);
        }
    }

    out.chars()
        .filter(|c| {
            let cp = *c as u32;
            !matches!(cp,
                0x1F300..=0x1F5FF   // symbols and pictographs
                | 0x1F600..=0x1F64F // emoticons
                | 0x1F680..=0x1F6FF // transport
                | 0x1F7E0..=0x1F7FF // colored shapes
                | 0x1F900..=0x1F9FF // supplemental symbols
                | 0x2600..=0x26FF   // miscellaneous symbols
                | 0x2700..=0x27BF   // dingbats
                | 0xFE0E..=0xFE0F   // variation selectors
                | 0x20E3)           // combining keycap
        })
        .collect()
}

/// Upstream values can arrive as NaN/infinity after degraded lookups. They
/// must render as 0, never as literal "NaN" text.
fn safe_number(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// 2 decimal places with thousands grouping, e.g. 1234567.8 -> "1,234,567.80".
pub fn format_currency(value: f64) -> String {
    let v = safe_number(value);
    let negative = v < 0.0;
    let mut whole = v.abs().trunc() as i64;
    let mut cents = ((v.abs() - v.abs().trunc()) * 100.0).round() as i64;
    if cents >= 100 {
        whole += 1;
        cents = 0;
    }

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}{}.{:02}", if negative { "-" } else { "" }, grouped, cents)
}

/// Fixed-width cell text: truncated, never wrapped, so the fixed row pitch
/// holds.
fn clip(text: &str, max_chars: usize) -> String {
    let text = sanitize_text(text);
    if text.chars().count() <= max_chars {
        text
    } else {
        let mut cut: String = text.chars().take(max_chars.saturating_sub(2)).collect();
        cut.push_str("..");
        cut
    }
}

fn mm(v: f64) -> Mm {
    Mm(v as _)
}

/// One page of the report. Coordinates are given from the top-left corner
/// (the layout was designed top-down) and converted to PDF space here.
struct Page {
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Page {
    fn text(&self, text: &str, size: f64, x: f64, y_top: f64, color: Color) {
        self.layer.set_fill_color(color);
        self.layer
            .use_text(sanitize_text(text), size as _, mm(x), mm(PAGE_H - y_top), &self.regular);
    }

    fn text_bold(&self, text: &str, size: f64, x: f64, y_top: f64, color: Color) {
        self.layer.set_fill_color(color);
        self.layer
            .use_text(sanitize_text(text), size as _, mm(x), mm(PAGE_H - y_top), &self.bold);
    }

    /// Filled rectangle; `y_top` is the top edge.
    fn rect(&self, x: f64, y_top: f64, w: f64, h: f64, color: Color) {
        self.layer.set_fill_color(color);
        let shape = Rect::new(
            mm(x),
            mm(PAGE_H - y_top - h),
            mm(x + w),
            mm(PAGE_H - y_top),
        )
        .with_mode(PaintMode::Fill);
        self.layer.add_rect(shape);
    }

    fn hline(&self, x1: f64, x2: f64, y_top: f64, color: Color) {
        self.layer.set_outline_color(color);
        self.layer.set_outline_thickness(0.8);
        let line = Line {
            points: vec![
                (Point::new(mm(x1), mm(PAGE_H - y_top)), false),
                (Point::new(mm(x2), mm(PAGE_H - y_top)), false),
            ],
            is_closed: false,
        };
        self.layer.add_line(line);
    }

    fn section_header(&self, title: &str) {
        self.text_bold(title, 16.0, MARGIN, 22.0, blue());
        self.hline(MARGIN, PAGE_W - MARGIN, 27.0, black());
    }
}

struct DocBuilder {
    doc: PdfDocumentReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
}

impl DocBuilder {
    fn new(title: &str) -> Result<Self, String> {
        let (doc, page, layer) = PdfDocument::new(title, mm(PAGE_W), mm(PAGE_H), "content");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| e.to_string())?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| e.to_string())?;

        Ok(Self {
            doc,
            regular,
            bold,
            pages: vec![(page, layer)],
        })
    }

    /// Writer for the most recently added page.
    fn current(&self) -> Page {
        let (page, layer) = self.pages[self.pages.len() - 1];
        Page {
            layer: self.doc.get_page(page).get_layer(layer),
            regular: self.regular.clone(),
            bold: self.bold.clone(),
        }
    }

    fn new_page(&mut self) -> Page {
        let (page, layer) = self.doc.add_page(mm(PAGE_W), mm(PAGE_H), "content");
        self.pages.push((page, layer));
        self.current()
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Footers go in last, once the total page count is known.
    fn write_footers(&self) {
        let total = self.page_count();
        for (i, (page, layer)) in self.pages.iter().enumerate() {
            let writer = Page {
                layer: self.doc.get_page(*page).get_layer(*layer),
                regular: self.regular.clone(),
                bold: self.bold.clone(),
            };
            writer.text(
                &format!("Page {} of {}", i + 1, total),
                8.0,
                PAGE_W / 2.0 - 10.0,
                FOOTER_Y,
                gray(),
            );
        }
    }
}

/// Renders the full report into PDF bytes. The page sequence is fixed:
/// cover+summary, distribution, asset detail (1+), top performers,
/// diversification, risk, recommendations (1+), charts, disclaimer.
pub fn render_report(data: &ReportData) -> Result<Vec<u8>, AppError> {
    let builder = build_document(data).map_err(AppError::Render)?;
    builder
        .doc
        .save_to_bytes()
        .map_err(|e| AppError::Render(e.to_string()))
}

fn build_document(data: &ReportData) -> Result<DocBuilder, String> {
    let mut builder = DocBuilder::new("FINANCEPR Portfolio Report")?;

    render_cover_page(&builder.current(), data);
    render_distribution_page(&builder.new_page(), data);
    render_asset_detail_pages(&mut builder, data);
    render_top_performers_page(&builder.new_page(), data);
    render_diversification_page(&builder.new_page(), data);
    render_risk_page(&builder.new_page(), data);
    render_recommendation_pages(&mut builder, data);
    render_charts_page(&builder.new_page(), data);
    render_disclaimer_page(&builder.new_page(), data);

    builder.write_footers();
    Ok(builder)
}

fn render_cover_page(page: &Page, data: &ReportData) {
    let summary = &data.summary;

    page.rect(0.0, 0.0, PAGE_W, 35.0, blue());
    page.text_bold("FINANCIAL REPORT", 24.0, 55.0, 16.0, white());
    page.text(&format!("FINANCEPR v{}", data.version), 12.0, 83.0, 28.0, white());

    page.text(&format!("User: {}", data.user_email), 10.0, MARGIN, 46.0, black());
    page.text(
        &format!("Date: {}", data.generated_at.format("%B %e, %Y %H:%M UTC")),
        10.0,
        MARGIN,
        52.0,
        black(),
    );
    page.text(&format!("Report ID: {}", data.report_id), 10.0, MARGIN, 58.0, black());

    page.hline(MARGIN, PAGE_W - MARGIN, 66.0, black());

    page.text_bold("EXECUTIVE SUMMARY", 15.0, MARGIN, 76.0, blue());

    let left = MARGIN;
    let left_val = 62.0;
    let y0 = 86.0;
    let step = 9.0;

    page.text_bold("Total Value:", 10.0, left, y0, black());
    page.text(&format!("${}", format_currency(summary.total_value)), 10.0, left_val, y0, black());

    page.text_bold("Total Invested:", 10.0, left, y0 + step, black());
    page.text(
        &format!("${}", format_currency(summary.total_invested)),
        10.0,
        left_val,
        y0 + step,
        black(),
    );

    page.text_bold("Gain/Loss:", 10.0, left, y0 + 2.0 * step, black());
    page.text(
        &format!(
            "{}${} ({:.2}%)",
            if summary.total_gain_loss >= 0.0 { "+" } else { "-" },
            format_currency(summary.total_gain_loss.abs()),
            summary.total_gain_loss_percentage
        ),
        10.0,
        left_val,
        y0 + 2.0 * step,
        gain_color(summary.total_gain_loss),
    );

    page.text_bold("Positions:", 10.0, left, y0 + 3.0 * step, black());
    page.text(
        &format!("{} positions", summary.total_positions),
        10.0,
        left_val,
        y0 + 3.0 * step,
        black(),
    );

    page.text_bold("Status:", 10.0, left, y0 + 4.0 * step, black());
    let (status_text, status_color) = match summary.status {
        PortfolioStatus::Positive => ("POSITIVE", green()),
        PortfolioStatus::Negative => ("NEGATIVE", red()),
    };
    page.text(status_text, 10.0, left_val, y0 + 4.0 * step, status_color);

    let right = 110.0;
    let right_val = 158.0;
    page.text_bold("KEY INDICATORS:", 10.0, right, y0, black());
    page.text_bold("Diversification:", 10.0, right, y0 + step, black());
    page.text(
        &format!("{}/100", summary.diversification_score),
        10.0,
        right_val,
        y0 + step,
        black(),
    );
    page.text_bold("Risk Level:", 10.0, right, y0 + 2.0 * step, black());
    page.text(summary.risk_level.label(), 10.0, right_val, y0 + 2.0 * step, black());
    page.text_bold("Concentration:", 10.0, right, y0 + 3.0 * step, black());
    page.text(
        &format!("{:.1}%", safe_number(summary.max_concentration)),
        10.0,
        right_val,
        y0 + 3.0 * step,
        black(),
    );
    page.text_bold("Best Asset:", 10.0, right, y0 + 4.0 * step, black());
    page.text(&clip(&summary.best_asset, 20), 10.0, right_val, y0 + 4.0 * step, green());
    page.text_bold("Worst Asset:", 10.0, right, y0 + 5.0 * step, black());
    page.text(&clip(&summary.worst_asset, 20), 10.0, right_val, y0 + 5.0 * step, red());

    page.rect(MARGIN, 160.0, CONTENT_W, 30.0, light_blue_bg());
    page.text_bold("OVERALL PORTFOLIO STATUS", 12.0, MARGIN + 4.0, 168.0, blue());
    let status_line = match summary.status {
        PortfolioStatus::Positive => format!(
            "Your portfolio is up ${} ({:.2}%). Keep your strategy and review the recommendations to optimize further.",
            format_currency(summary.total_gain_loss),
            summary.total_gain_loss_percentage
        ),
        PortfolioStatus::Negative => format!(
            "Your portfolio is down ${} ({:.2}%). Review the recommendations to improve the situation.",
            format_currency(summary.total_gain_loss.abs()),
            summary.total_gain_loss_percentage.abs()
        ),
    };
    page.text(&clip(&status_line, 110), 9.0, MARGIN + 4.0, 176.0, black());
}

fn render_distribution_page(page: &Page, data: &ReportData) {
    page.section_header("DISTRIBUTION BY ASSET TYPE");

    page.text_bold("Investment distribution:", 11.0, MARGIN, 36.0, black());

    let palette = [blue(), green(), amber(), red(), rgb(0x8b, 0x5c, 0xf6)];
    let mut y = 44.0;
    for (i, bucket) in data.distribution.iter().enumerate() {
        let color = palette[i % palette.len()].clone();
        let bar_w = safe_number(bucket.percentage) / 100.0 * 140.0;
        page.rect(MARGIN, y, bar_w.max(1.0), 9.0, color);
        page.text_bold(&clip(&bucket.asset_type, 18), 9.0, MARGIN + 2.0, y + 6.0, white());
        page.text(
            &format!(
                "${} ({:.1}%) - {} positions",
                format_currency(bucket.total_value),
                safe_number(bucket.percentage),
                bucket.position_count
            ),
            8.0,
            165.0,
            y + 6.0,
            black(),
        );
        y += 14.0;
    }

    y += 8.0;
    page.text_bold("Detailed summary:", 12.0, MARGIN, y, blue());
    y += 8.0;

    page.rect(MARGIN, y, CONTENT_W, 9.0, blue());
    page.text_bold("Type", 9.0, MARGIN + 3.0, y + 6.0, white());
    page.text_bold("Count", 9.0, 80.0, y + 6.0, white());
    page.text_bold("Value", 9.0, 118.0, y + 6.0, white());
    page.text_bold("Share", 9.0, 168.0, y + 6.0, white());
    y += 9.0;

    for (i, bucket) in data.distribution.iter().enumerate() {
        if i % 2 == 0 {
            page.rect(MARGIN, y, CONTENT_W, 8.0, light_gray_bg());
        }
        page.text(&clip(&bucket.asset_type, 22), 9.0, MARGIN + 3.0, y + 5.5, black());
        page.text(&bucket.position_count.to_string(), 9.0, 80.0, y + 5.5, black());
        page.text(
            &format!("${}", format_currency(bucket.total_value)),
            9.0,
            118.0,
            y + 5.5,
            black(),
        );
        page.text(&format!("{:.1}%", safe_number(bucket.percentage)), 9.0, 168.0, y + 5.5, black());
        y += 8.0;
    }

    if let Some(largest) = data
        .distribution
        .iter()
        .max_by(|a, b| a.total_value.partial_cmp(&b.total_value).unwrap_or(std::cmp::Ordering::Equal))
    {
        y += 10.0;
        page.text_bold("Distribution analysis:", 11.0, MARGIN, y, blue());
        let note = format!(
            "Your largest allocation is {} at ${} ({:.1}%). {}",
            largest.asset_type,
            format_currency(largest.total_value),
            safe_number(largest.percentage),
            if data.distribution.len() < 3 {
                "Consider diversifying into more asset types to reduce risk."
            } else {
                "You have a good spread across asset types."
            }
        );
        page.text(&clip(&note, 110), 9.0, MARGIN, y + 7.0, black());
    }
}

/// Groups positions by distribution order and renders fixed-pitch table rows,
/// breaking to a fresh page whenever the vertical space runs out.
fn render_asset_detail_pages(builder: &mut DocBuilder, data: &ReportData) {
    let mut page = builder.new_page();
    page.section_header("COMPLETE ASSET DETAIL");
    let mut y = 36.0;

    for bucket in &data.distribution {
        let group: Vec<&ValuedPosition> = data
            .positions
            .iter()
            .filter(|p| p.asset_type == bucket.asset_type)
            .collect();
        if group.is_empty() {
            continue;
        }

        if y > DETAIL_GROUP_START_LIMIT {
            page = builder.new_page();
            page.section_header("COMPLETE ASSET DETAIL (CONT.)");
            y = 36.0;
        }

        page.text_bold(
            &format!("--- {} ---", bucket.asset_type.to_uppercase()),
            11.0,
            MARGIN,
            y,
            blue(),
        );
        y += 8.0;
        y = render_detail_table_header(&page, y);

        let mut subtotal_invested = 0.0;
        let mut subtotal_current = 0.0;

        for (i, position) in group.iter().enumerate() {
            if y > DETAIL_PAGE_LIMIT {
                page = builder.new_page();
                page.section_header("COMPLETE ASSET DETAIL (CONT.)");
                y = 36.0;
                y = render_detail_table_header(&page, y);
            }

            subtotal_invested += position.invested_value;
            subtotal_current += position.current_value;

            if i % 2 == 1 {
                page.rect(MARGIN, y, CONTENT_W, DETAIL_ROW_H, light_gray_bg());
            }

            let row_y = y + 4.5;
            page.text(&clip(&position.ticker, 7), 7.0, COL_TICKER, row_y, black());
            page.text(&clip(&position.name, 16), 7.0, COL_NAME, row_y, black());
            page.text(
                &format!("{:.2}", safe_number(position.quantity)),
                7.0,
                COL_QTY,
                row_y,
                black(),
            );
            page.text(
                &format!("${}", format_currency(position.purchase_price)),
                7.0,
                COL_BUY,
                row_y,
                black(),
            );
            match position.current_price {
                Some(price) => {
                    page.text(&format!("${}", format_currency(price)), 7.0, COL_NOW, row_y, black())
                }
                None => page.text("n/a", 7.0, COL_NOW, row_y, gray()),
            }
            page.text(
                &format!("${}", format_currency(position.current_value)),
                7.0,
                COL_VALUE,
                row_y,
                black(),
            );
            page.text(
                &format!("{:+.1}%", safe_number(position.gain_loss_percentage)),
                7.0,
                COL_GAIN,
                row_y,
                gain_color(position.gain_loss),
            );
            y += DETAIL_ROW_H;
        }

        // Per-type subtotal row.
        y += 1.5;
        page.rect(MARGIN, y, CONTENT_W, 7.0, rgb(0xdb, 0xea, 0xfe));
        let sub_y = y + 5.0;
        page.text_bold("SUBTOTAL:", 8.0, COL_TICKER, sub_y, black());
        page.text_bold(
            &format!("${}", format_currency(subtotal_invested)),
            8.0,
            COL_BUY,
            sub_y,
            black(),
        );
        page.text_bold(
            &format!("${}", format_currency(subtotal_current)),
            8.0,
            COL_VALUE,
            sub_y,
            black(),
        );
        let subtotal_gain = subtotal_current - subtotal_invested;
        let subtotal_pct = if subtotal_invested > 0.0 {
            subtotal_gain / subtotal_invested * 100.0
        } else {
            0.0
        };
        page.text_bold(
            &format!("{:+.1}%", subtotal_pct),
            8.0,
            COL_GAIN,
            sub_y,
            gain_color(subtotal_gain),
        );
        y += 12.0;
    }
}

fn render_detail_table_header(page: &Page, y: f64) -> f64 {
    page.rect(MARGIN, y, CONTENT_W, 7.0, rgb(0xe5, 0xe7, 0xeb));
    let header_y = y + 5.0;
    page.text_bold("Ticker", 8.0, COL_TICKER, header_y, black());
    page.text_bold("Name", 8.0, COL_NAME, header_y, black());
    page.text_bold("Qty", 8.0, COL_QTY, header_y, black());
    page.text_bold("Buy", 8.0, COL_BUY, header_y, black());
    page.text_bold("Now", 8.0, COL_NOW, header_y, black());
    page.text_bold("Value", 8.0, COL_VALUE, header_y, black());
    page.text_bold("G/L", 8.0, COL_GAIN, header_y, black());
    y + 9.0
}

fn render_top_performers_page(page: &Page, data: &ReportData) {
    page.section_header("TOP PERFORMERS");

    page.text_bold("Top 5 winning positions", 12.0, MARGIN, 36.0, green());

    let medals = ["*1.", "*2.", "*3.", "*4.", "*5."];
    let mut y = 42.0;
    for (i, performer) in data.top_performers.iter().take(5).enumerate() {
        page.rect(MARGIN, y, CONTENT_W, 13.0, light_green_bg());
        page.text_bold(
            &clip(&format!("{} {} - {}", medals[i], performer.ticker, performer.name), 42),
            10.0,
            MARGIN + 3.0,
            y + 5.5,
            black(),
        );
        page.text(
            &format!(
                "{}${} ({:+.1}%)",
                if performer.gain_loss >= 0.0 { "+" } else { "-" },
                format_currency(performer.gain_loss.abs()),
                safe_number(performer.gain_loss_percentage)
            ),
            9.0,
            MARGIN + 3.0,
            y + 11.0,
            gain_color(performer.gain_loss),
        );
        page.text(
            &format!("Value: ${}", format_currency(performer.current_value)),
            8.0,
            145.0,
            y + 8.0,
            gray(),
        );
        y += 16.0;
    }

    y += 6.0;
    page.text_bold("Losing positions", 12.0, MARGIN, y, red());
    y += 6.0;

    let losers: Vec<_> = data
        .bottom_performers
        .iter()
        .filter(|p| p.gain_loss < 0.0)
        .take(5)
        .collect();

    if losers.is_empty() {
        page.text(
            "Excellent! All your positions are in profit.",
            10.0,
            MARGIN + 3.0,
            y + 5.0,
            green(),
        );
        y += 12.0;
    } else {
        for loser in losers {
            page.rect(MARGIN, y, CONTENT_W, 11.0, light_red_bg());
            page.text_bold(
                &clip(&format!("{} - {}", loser.ticker, loser.name), 42),
                9.0,
                MARGIN + 3.0,
                y + 4.5,
                black(),
            );
            page.text(
                &format!(
                    "-${} ({:.1}%)",
                    format_currency(loser.gain_loss.abs()),
                    safe_number(loser.gain_loss_percentage)
                ),
                8.0,
                MARGIN + 3.0,
                y + 9.0,
                red(),
            );
            y += 14.0;
        }
    }

    y += 6.0;
    let stats = &data.performance_stats;
    page.rect(MARGIN, y, CONTENT_W, 30.0, light_blue_bg());
    page.text_bold("OVERALL STATISTICS", 11.0, MARGIN + 3.0, y + 7.0, blue());
    page.text(
        &format!(
            "Winning positions: {} ({:.1}%)",
            stats.winners_count,
            safe_number(stats.winners_percentage)
        ),
        9.0,
        MARGIN + 3.0,
        y + 15.0,
        black(),
    );
    page.text(
        &format!("Losing positions: {}", stats.losers_count),
        9.0,
        MARGIN + 3.0,
        y + 22.0,
        black(),
    );
    page.text(
        &format!("Average gain: ${}", format_currency(stats.average_gain)),
        9.0,
        110.0,
        y + 15.0,
        black(),
    );
    page.text(
        &format!("Best gain: {:.1}%", safe_number(stats.best_gain_percentage)),
        9.0,
        110.0,
        y + 22.0,
        black(),
    );
}

fn render_diversification_page(page: &Page, data: &ReportData) {
    let analysis = &data.diversification;
    page.section_header("DIVERSIFICATION ANALYSIS");

    page.rect(MARGIN, 34.0, CONTENT_W, 28.0, light_blue_bg());
    page.text_bold("DIVERSIFICATION SCORE", 13.0, MARGIN + 4.0, 42.0, blue());
    page.text_bold(&format!("{}/100", analysis.score), 30.0, MARGIN + 4.0, 57.0, black());

    let level_color = match analysis.level {
        DiversificationLevel::Excellent => green(),
        DiversificationLevel::Good => blue(),
        DiversificationLevel::Medium => amber(),
        DiversificationLevel::Low => red(),
    };
    page.text_bold(
        &analysis.level.label().to_uppercase(),
        15.0,
        105.0,
        54.0,
        level_color.clone(),
    );

    // Score bar.
    let bar_y = 68.0;
    page.rect(MARGIN, bar_y, CONTENT_W, 10.0, rgb(0xe5, 0xe7, 0xeb));
    let score_w = analysis.score as f64 / 100.0 * CONTENT_W;
    page.rect(MARGIN, bar_y, score_w.max(1.0), 10.0, level_color);
    page.text_bold(
        &format!("{}%", analysis.score),
        9.0,
        if score_w > 18.0 { MARGIN + 2.0 } else { MARGIN + score_w + 3.0 },
        bar_y + 7.0,
        if score_w > 18.0 { white() } else { black() },
    );

    let mut y = 88.0;
    page.text_bold("Top 10 positions by size:", 12.0, MARGIN, y, black());
    y += 8.0;

    const ROW_H: f64 = 7.5;
    for (i, position) in analysis.top_positions.iter().take(10).enumerate() {
        if i % 2 == 0 {
            page.rect(MARGIN, y - 1.0, CONTENT_W, ROW_H, light_gray_bg());
        }
        page.text(&format!("{}. {}", i + 1, clip(&position.ticker, 8)), 9.0, MARGIN + 2.0, y + 4.0, black());
        page.text(&clip(&position.name, 20), 9.0, 48.0, y + 4.0, black());
        page.text(
            &format!("${}", format_currency(position.value)),
            9.0,
            92.0,
            y + 4.0,
            black(),
        );
        page.text(&format!("{:.1}%", safe_number(position.percentage)), 9.0, 128.0, y + 4.0, black());

        let bar_w = (safe_number(position.percentage) / 100.0 * 40.0).min(40.0);
        page.rect(148.0, y + 1.0, bar_w.max(0.5), 3.0, blue());
        y += ROW_H;
    }

    y += 8.0;
    page.rect(MARGIN, y, CONTENT_W, 26.0, light_amber_bg());
    page.text_bold("RECOMMENDATION", 11.0, MARGIN + 4.0, y + 7.0, rgb(0x92, 0x40, 0x0e));
    page.text(&clip(&analysis.recommendation, 110), 9.0, MARGIN + 4.0, y + 15.0, black());
}

fn render_risk_page(page: &Page, data: &ReportData) {
    let risk = &data.risk;
    page.section_header("RISK ANALYSIS");

    page.rect(MARGIN, 34.0, CONTENT_W, 28.0, light_red_bg());
    page.text_bold("RISK SCORE", 13.0, MARGIN + 4.0, 42.0, red());
    page.text_bold(&format!("{}/100", risk.score), 30.0, MARGIN + 4.0, 57.0, black());

    let level_color = match risk.level {
        RiskLevel::VeryHigh => rgb(0xdc, 0x26, 0x26),
        RiskLevel::High => amber(),
        RiskLevel::Medium => blue(),
        RiskLevel::Low => green(),
    };
    page.text_bold(
        &format!("{} RISK", risk.level.label().to_uppercase()),
        15.0,
        105.0,
        54.0,
        level_color,
    );

    let mut y = 70.0;
    page.rect(MARGIN, y, 82.0, 20.0, light_gray_bg());
    page.text_bold("Volatility:", 10.0, MARGIN + 4.0, y + 7.0, black());
    page.text(risk.volatility.label(), 11.0, MARGIN + 4.0, y + 15.0, black());

    page.rect(110.0, y, 82.0, 20.0, light_gray_bg());
    page.text_bold("Crypto exposure:", 10.0, 114.0, y + 7.0, black());
    page.text(&format!("{:.1}%", safe_number(risk.crypto_exposure)), 11.0, 114.0, y + 15.0, black());

    y += 30.0;
    page.text_bold("Identified risk factors:", 12.0, MARGIN, y, blue());
    y += 8.0;
    for factor in &risk.factors {
        page.text(&clip(&format!("- {}", factor), 95), 10.0, MARGIN + 4.0, y, black());
        y += 8.0;
    }

    y += 6.0;
    page.text_bold("Warnings:", 12.0, MARGIN, y, red());
    y += 8.0;
    for warning in &risk.warnings {
        page.rect(MARGIN, y, CONTENT_W, 11.0, rgb(0xfe, 0xe2, 0xe2));
        page.text(&clip(warning, 100), 9.0, MARGIN + 4.0, y + 7.0, black());
        y += 14.0;
    }
}

fn render_recommendation_pages(builder: &mut DocBuilder, data: &ReportData) {
    let mut page = builder.new_page();
    page.section_header("PERSONALIZED RECOMMENDATIONS");
    let mut y = 36.0;

    for priority in [Priority::High, Priority::Medium, Priority::Low] {
        let tier: Vec<_> = data
            .recommendations
            .iter()
            .filter(|r| r.priority == priority)
            .collect();
        if tier.is_empty() {
            continue;
        }

        let (tier_color, tier_bg) = match priority {
            Priority::High => (rgb(0xdc, 0x26, 0x26), rgb(0xfe, 0xe2, 0xe2)),
            Priority::Medium => (rgb(0xd9, 0x77, 0x06), light_amber_bg()),
            Priority::Low => (rgb(0x16, 0xa3, 0x4a), rgb(0xdc, 0xfc, 0xe7)),
        };

        if y > 230.0 {
            page = builder.new_page();
            page.section_header("PERSONALIZED RECOMMENDATIONS (CONT.)");
            y = 36.0;
        }
        page.text_bold(
            &format!("{} PRIORITY", priority.label().to_uppercase()),
            12.0,
            MARGIN,
            y,
            tier_color.clone(),
        );
        y += 8.0;

        for (i, rec) in tier.iter().enumerate() {
            if y > 220.0 {
                page = builder.new_page();
                page.section_header("PERSONALIZED RECOMMENDATIONS (CONT.)");
                y = 36.0;
            }

            page.rect(MARGIN, y, CONTENT_W, 36.0, tier_bg.clone());
            page.text_bold(
                &clip(&format!("{}. {} {}", i + 1, rec.icon, rec.title), 60),
                10.0,
                MARGIN + 3.0,
                y + 7.0,
                black(),
            );
            page.text(&clip(&rec.description, 105), 9.0, MARGIN + 3.0, y + 15.0, black());
            page.text_bold("Suggested action:", 9.0, MARGIN + 3.0, y + 23.0, tier_color.clone());
            page.text(&clip(&rec.action, 110), 8.0, MARGIN + 3.0, y + 30.0, black());
            y += 40.0;
        }
        y += 4.0;
    }
}

fn render_charts_page(page: &Page, data: &ReportData) {
    page.section_header("CHARTS AND VISUALIZATIONS");

    page.text_bold("Distribution by asset type", 12.0, MARGIN, 36.0, black());
    if let Err(e) = draw_distribution_chart(page, &data.distribution, 44.0) {
        warn!("distribution chart unavailable: {}", e);
        page.text("(chart unavailable)", 9.0, 80.0, 70.0, gray());
    }

    page.text_bold("Top 5 positions by gain", 12.0, MARGIN, 140.0, black());
    let mut y = 148.0;
    for performer in data.top_performers.iter().take(5) {
        let pct = safe_number(performer.gain_loss_percentage);
        let bar_w = (pct.abs() * 1.2).clamp(0.5, 90.0);
        page.rect(55.0, y, bar_w, 7.0, gain_color(performer.gain_loss));
        page.text(&clip(&performer.ticker, 8), 8.0, MARGIN, y + 5.0, black());
        page.text(&format!("{:+.1}%", pct), 8.0, 58.0 + bar_w, y + 5.0, black());
        y += 10.0;
    }
}

/// Horizontal bar rendition of the distribution. Kept fallible so a degenerate
/// distribution degrades to a placeholder note instead of a broken page.
fn draw_distribution_chart(
    page: &Page,
    distribution: &[DistributionBucket],
    y_start: f64,
) -> Result<(), String> {
    if distribution.is_empty() {
        return Err("no distribution buckets".to_string());
    }
    if distribution.iter().any(|b| !b.percentage.is_finite()) {
        return Err("non-finite bucket percentage".to_string());
    }

    let palette = [blue(), green(), amber(), red(), rgb(0x8b, 0x5c, 0xf6)];
    let mut y = y_start;
    for (i, bucket) in distribution.iter().enumerate() {
        let bar_w = (bucket.percentage / 100.0 * 120.0).max(0.5);
        page.rect(55.0, y, bar_w, 8.0, palette[i % palette.len()].clone());
        page.text(&clip(&bucket.asset_type, 12), 8.0, MARGIN, y + 5.5, black());
        page.text(&format!("{:.1}%", bucket.percentage), 8.0, 58.0 + bar_w, y + 5.5, black());
        y += 12.0;
    }
    Ok(())
}

fn render_disclaimer_page(page: &Page, data: &ReportData) {
    page.section_header("FINAL NOTES");

    page.text_bold("Suggested next steps:", 12.0, MARGIN, 36.0, blue());
    let steps = [
        "1. Review the HIGH priority recommendations",
        "2. Analyze positions with significant losses",
        "3. Consider rebalancing your portfolio quarterly",
        "4. Keep tracking your investments regularly",
        "5. Consult a certified financial advisor for major decisions",
    ];
    let mut y = 44.0;
    for step in steps {
        page.text(step, 9.0, MARGIN + 4.0, y, black());
        y += 7.0;
    }

    page.text_bold("Contact:", 12.0, MARGIN, 92.0, blue());
    page.text("Email: support@financepr.com", 9.0, MARGIN + 4.0, 100.0, black());
    page.text("Web: www.financepr.com", 9.0, MARGIN + 4.0, 107.0, black());

    page.text_bold("LEGAL DISCLAIMER", 12.0, MARGIN, 125.0, red());
    page.rect(MARGIN, 130.0, CONTENT_W, 60.0, light_gray_bg());
    let disclaimer = [
        "This report is generated automatically by FINANCEPR for informational",
        "purposes only. It does not constitute financial, investment, legal or tax",
        "advice. Recommendations are produced by algorithmic analysis and must",
        "not be taken as personalized counsel.",
        "",
        "Asset values shown may not reflect real-time market prices. Investing in",
        "financial instruments carries risk, including the possible loss of the",
        "invested capital. Past performance does not guarantee future results.",
        "",
        "We strongly recommend consulting a certified financial advisor before",
        "making investment decisions. FINANCEPR accepts no liability for losses",
        "or damages arising from the use of this report.",
    ];
    let mut y = 137.0;
    for line in disclaimer {
        if !line.is_empty() {
            page.text(line, 8.0, MARGIN + 4.0, y, black());
        }
        y += 4.5;
    }

    page.text(&format!("Report ID: {}", data.report_id), 7.0, MARGIN, 205.0, gray());
    page.text(
        &format!("Generated: {}", data.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        7.0,
        MARGIN,
        210.0,
        gray(),
    );
    page.text(&format!("Version: FINANCEPR {}", data.version), 7.0, MARGIN, 215.0, gray());

    page.rect(0.0, 255.0, PAGE_W, 25.0, blue());
    page.text_bold("Thank you for using FINANCEPR", 13.0, 62.0, 265.0, white());
    page.text("Your investment management platform", 9.0, 72.0, 272.0, white());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValuedPosition;
    use crate::services::report_analysis_service::compile_report;
    use uuid::Uuid;

    fn position(ticker: &str, asset_type: &str, invested: f64, current: f64) -> ValuedPosition {
        ValuedPosition {
            ticker: ticker.to_string(),
            name: format!("{} Inc", ticker),
            asset_type: asset_type.to_string(),
            quantity: 1.0,
            purchase_price: invested,
            current_price: Some(current),
            invested_value: invested,
            current_value: current,
            gain_loss: current - invested,
            gain_loss_percentage: if invested > 0.0 {
                (current - invested) / invested * 100.0
            } else {
                0.0
            },
            days_held: 10,
        }
    }

    fn report_with_positions(count: usize) -> crate::models::ReportData {
        let positions: Vec<ValuedPosition> = (0..count)
            .map(|i| {
                position(
                    &format!("T{:03}", i),
                    ["Stock", "Crypto", "Bond"][i % 3],
                    100.0,
                    100.0 + i as f64,
                )
            })
            .collect();
        compile_report("user@example.com".to_string(), Uuid::nil(), positions)
    }

    #[test]
    fn test_sanitize_replaces_known_glyphs() {
        assert_eq!(sanitize_text("⚠️ careful"), "[!] careful");
        assert_eq!(sanitize_text("📊 stats 💰"), "[DIV] stats [$]");
        assert_eq!(sanitize_text("🥇 first"), "*1. first");
    }

    #[test]
    fn test_sanitize_strips_unknown_symbols() {
        assert_eq!(sanitize_text("rocket 🚀 gone"), "rocket  gone");
        assert_eq!(sanitize_text("plain ascii"), "plain ascii");
    }

    #[test]
    fn test_format_currency_grouping() {
        assert_eq!(format_currency(1234567.8), "1,234,567.80");
        assert_eq!(format_currency(0.0), "0.00");
        assert_eq!(format_currency(999.999), "1,000.00");
        assert_eq!(format_currency(-1500.5), "-1,500.50");
    }

    #[test]
    fn test_format_currency_coerces_non_finite() {
        assert_eq!(format_currency(f64::NAN), "0.00");
        assert_eq!(format_currency(f64::INFINITY), "0.00");
    }

    #[test]
    fn test_clip_truncates_without_wrapping() {
        assert_eq!(clip("short", 10), "short");
        let clipped = clip("a very long position name indeed", 12);
        assert_eq!(clipped.chars().count(), 12);
        assert!(clipped.ends_with(".."));
    }

    #[test]
    fn test_document_has_all_sections_for_small_portfolio() {
        let report = report_with_positions(4);
        let builder = build_document(&report).unwrap();
        // Cover, distribution, detail, performers, diversification, risk,
        // recommendations, charts, disclaimer.
        assert_eq!(builder.page_count(), 9);
    }

    #[test]
    fn test_page_count_grows_with_position_count() {
        let small = build_document(&report_with_positions(5)).unwrap().page_count();
        let medium = build_document(&report_with_positions(60)).unwrap().page_count();
        let large = build_document(&report_with_positions(150)).unwrap().page_count();

        assert!(medium > small);
        assert!(large > medium);
    }

    // Lines carrying document metadata stamped at save time. Everything else
    // must be byte-identical across renders of the same input.
    const VOLATILE_MARKERS: &[&str] = &[
        "/CreationDate",
        "/ModDate",
        "CreateDate",
        "ModifyDate",
        "MetadataDate",
        "DocumentID",
        "InstanceID",
        "/ID[",
    ];

    fn stable_lines(bytes: &[u8]) -> Vec<&[u8]> {
        bytes
            .split(|b| *b == b'\n')
            .filter(|line| {
                let text = String::from_utf8_lossy(line);
                !VOLATILE_MARKERS.iter().any(|marker| text.contains(marker))
            })
            .collect()
    }

    #[test]
    fn test_render_is_deterministic_for_same_input() {
        let report = report_with_positions(12);
        let a = render_report(&report).unwrap();
        let b = render_report(&report).unwrap();

        let a_lines = stable_lines(&a);
        let b_lines = stable_lines(&b);
        assert_eq!(a_lines.len(), b_lines.len());
        for (left, right) in a_lines.iter().zip(&b_lines) {
            assert_eq!(left, right);
        }
    }

    #[test]
    fn test_diversification_page_renders_at_every_level() {
        // 1, 5, 10 and 25 positions land in the Low, Medium, Good and
        // Excellent bands respectively; each picks a different level color.
        for count in [1, 5, 10, 25] {
            let report = report_with_positions(count);
            let bytes = render_report(&report).unwrap();
            assert!(!bytes.is_empty());
        }
    }

    #[test]
    fn test_render_survives_degenerate_numbers() {
        let mut report = report_with_positions(3);
        report.positions[0].gain_loss_percentage = f64::NAN;
        report.positions[1].current_value = f64::INFINITY;

        let bytes = render_report(&report).unwrap();
        assert!(!bytes.is_empty());
    }
}
