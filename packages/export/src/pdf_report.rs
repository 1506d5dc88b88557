//! One-page PDF summary of an analysis.

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use solar_map_analytics_models::AnalysisReport;

use crate::ExportError;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const LINE_HEIGHT: f32 = 7.0;
const TABLE_ROWS: usize = 10;

/// Table column offsets from the left margin, in millimeters.
const COLUMNS: [f32; 4] = [0.0, 80.0, 110.0, 140.0];

struct Cursor<'a> {
    layer: PdfLayerReference,
    regular: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
    y: f32,
}

impl Cursor<'_> {
    fn line(&mut self, text: &str, size: f32, bold: bool) {
        let font = if bold { self.bold } else { self.regular };
        self.layer
            .use_text(text, size, Mm(MARGIN), Mm(self.y), font);
        self.y -= LINE_HEIGHT;
    }

    fn row(&mut self, cells: [&str; 4], bold: bool) {
        let font = if bold { self.bold } else { self.regular };
        for (cell, offset) in cells.iter().zip(COLUMNS) {
            self.layer
                .use_text(*cell, 10.0, Mm(MARGIN + offset), Mm(self.y), font);
        }
        self.y -= LINE_HEIGHT;
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT / 2.0;
    }
}

/// Renders the report as a PDF stamped with the current time.
///
/// # Errors
///
/// Returns [`ExportError::Pdf`] if the document cannot be built.
pub fn to_pdf(report: &AnalysisReport) -> Result<Vec<u8>, ExportError> {
    to_pdf_at(report, Utc::now())
}

/// Renders the report as a PDF stamped with `generated_at`.
///
/// The page holds the title, the generation time, the dataset summary and
/// the top growth predictions.
///
/// # Errors
///
/// Returns [`ExportError::Pdf`] if the document cannot be built.
pub fn to_pdf_at(
    report: &AnalysisReport,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, ExportError> {
    let title = "Reporte de Análisis de Energía Solar";
    let (doc, page, layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut cursor = Cursor {
        layer: doc.get_page(page).get_layer(layer),
        regular: &regular,
        bold: &bold,
        y: PAGE_HEIGHT - MARGIN,
    };

    cursor.line(title, 18.0, true);
    cursor.line(
        &format!("Generado: {}", generated_at.format("%Y-%m-%d %H:%M UTC")),
        10.0,
        false,
    );
    cursor.gap();

    let summary = &report.summary;
    cursor.line("Resumen", 14.0, true);
    cursor.line(
        &format!("Total de municipios: {}", summary.total_municipalities),
        11.0,
        false,
    );
    cursor.line(
        &format!("Total de clientes: {}", summary.total_customers),
        11.0,
        false,
    );
    cursor.line(
        &format!("Penetración promedio: {:.2}%", summary.avg_penetration),
        11.0,
        false,
    );
    cursor.line(
        &format!("Ingreso promedio: ${:.0}", summary.avg_income),
        11.0,
        false,
    );
    cursor.gap();

    cursor.line("Predicciones de crecimiento", 14.0, true);
    cursor.row(["Municipio", "Actual", "Predicción", "Potencial"], true);
    for prediction in report.predictions.iter().take(TABLE_ROWS) {
        let actual = prediction.customers.to_string();
        let predicted = format!("{:.0}", prediction.predicted_customers);
        let potential = format!("+{:.0}", prediction.growth_potential);
        cursor.row([&prediction.name, &actual, &predicted, &potential], false);
    }

    let bytes = doc.save_to_bytes()?;
    log::debug!("Rendered {} byte PDF report", bytes.len());
    Ok(bytes)
}
