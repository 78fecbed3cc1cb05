/*!
 * Export of scores and feedback.
 *
 * - Scores: CSV with header `Student Name,Criterion,Score`, one row per rubric row
 * - Feedback: DOCX with a heading and a single feedback paragraph
 */

use std::path::Path;

use log::info;

use crate::document::feedback_document;
use crate::errors::ExportError;
use crate::file_utils::FileManager;
use crate::scores::ScoreSheet;

/// Header row of the scores CSV
pub const SCORES_HEADER: [&str; 3] = ["Student Name", "Criterion", "Score"];

/// Heading written above the feedback paragraph
pub fn feedback_heading(student_name: &str) -> String {
    format!("Assessment Feedback for {}", student_name)
}

/// Render a score sheet as CSV
///
/// Records end with `\n` and fields are quoted only when they need to be.
pub fn scores_csv(sheet: &ScoreSheet) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(SCORES_HEADER)?;
    for entry in sheet.entries() {
        let score = entry.score.to_string();
        writer.write_record([sheet.student_name(), entry.criterion.as_str(), score.as_str()])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;

    // Every field came in as &str
    String::from_utf8(bytes).map_err(|e| {
        ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// Build the feedback document for a student
///
/// Blank feedback is rejected; otherwise the text is written verbatim.
pub fn feedback_docx(student_name: &str, feedback: &str) -> Result<Vec<u8>, ExportError> {
    if feedback.trim().is_empty() {
        return Err(ExportError::EmptyFeedback);
    }
    Ok(feedback_document(&feedback_heading(student_name), feedback)?)
}

/// Write the scores CSV to `path`
pub fn write_scores_csv<P: AsRef<Path>>(path: P, sheet: &ScoreSheet) -> Result<(), ExportError> {
    let path = path.as_ref();
    let csv = scores_csv(sheet)?;
    FileManager::write_bytes(path, csv.as_bytes())?;
    info!("Scores exported to {}", path.display());
    Ok(())
}

/// Write the feedback DOCX to `path`
pub fn write_feedback_docx<P: AsRef<Path>>(
    path: P,
    student_name: &str,
    feedback: &str,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    let bytes = feedback_docx(student_name, feedback)?;
    FileManager::write_bytes(path, &bytes)?;
    info!("Feedback exported to {}", path.display());
    Ok(())
}
