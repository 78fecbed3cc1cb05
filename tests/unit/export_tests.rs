/*!
 * Tests for scores CSV and feedback DOCX export
 */

use markwai::document::{extract_text, paragraphs, DocumentKind};
use markwai::errors::ExportError;
use markwai::export::{feedback_docx, feedback_heading, scores_csv, write_feedback_docx, write_scores_csv};
use markwai::rubric::{Rubric, RubricSchema};
use markwai::scores::{Score, ScoreSheet};

use crate::common::{create_temp_dir, SCENARIO_RUBRIC};

fn scenario_sheet() -> ScoreSheet {
    let rubric = Rubric::from_csv_bytes(SCENARIO_RUBRIC.as_bytes(), &RubricSchema::default()).unwrap();
    ScoreSheet::from_rubric("Jane", &rubric, Score::new(5).unwrap())
}

#[test]
fn test_scoresCsv_withScenarioDefaults_shouldMatchExpectedExport() {
    let csv = scores_csv(&scenario_sheet()).unwrap();
    assert_eq!(csv, "Student Name,Criterion,Score\nJane,Clarity,5\nJane,Evidence,5\n");
}

#[test]
fn test_scoresCsv_shouldHaveOneRowPerRubricRowInOrder() {
    let rubric = Rubric::from_csv_bytes(
        b"Criterion,Notes\nZeta,a\nAlpha,b\nZeta,c\n\"Quote \"\"x\"\"\",d\n",
        &RubricSchema::default(),
    )
    .unwrap();
    let mut sheet = ScoreSheet::from_rubric("Sam Lee", &rubric, Score::new(0).unwrap());
    sheet.set_score_at(1, Score::new(10).unwrap()).unwrap();

    let csv = scores_csv(&sheet).unwrap();

    assert_eq!(
        csv,
        "Student Name,Criterion,Score\nSam Lee,Zeta,0\nSam Lee,Alpha,10\nSam Lee,Zeta,0\nSam Lee,\"Quote \"\"x\"\"\",0\n"
    );
}

#[test]
fn test_scoresCsv_withHeaderOnlyRubric_shouldWriteHeaderOnly() {
    let rubric = Rubric::from_csv_bytes(b"Criterion\n", &RubricSchema::default()).unwrap();
    let sheet = ScoreSheet::from_rubric("Jane", &rubric, Score::new(5).unwrap());

    assert_eq!(scores_csv(&sheet).unwrap(), "Student Name,Criterion,Score\n");
}

#[test]
fn test_feedbackDocx_roundTrip_shouldReturnHeadingThenFeedbackVerbatim() {
    let feedback = "Clarity: 8/10 ...\nEvidence: 7/10 ...\n\nSummary:\tgood & \"clear\"";

    let bytes = feedback_docx("Jane", feedback).unwrap();
    let paras = paragraphs(&bytes).unwrap();

    assert_eq!(paras, vec![feedback_heading("Jane"), feedback.to_string()]);
    assert_eq!(paras[0], "Assessment Feedback for Jane");
}

#[test]
fn test_feedbackDocx_withCrLf_shouldNormalizeToLf() {
    let bytes = feedback_docx("Jane", "line one\r\nline two").unwrap();
    let text = extract_text(&bytes, DocumentKind::Docx).unwrap();
    assert_eq!(text, "Assessment Feedback for Jane\nline one\nline two");
}

#[test]
fn test_feedbackDocx_withEmptyFeedback_shouldFail() {
    assert!(matches!(feedback_docx("Jane", ""), Err(ExportError::EmptyFeedback)));
}

#[test]
fn test_writeExports_shouldCreateParentDirectories() {
    let dir = create_temp_dir().unwrap();
    let csv_path = dir.path().join("nested/out/Jane_scores.csv");
    let docx_path = dir.path().join("nested/out/Jane_feedback.docx");

    write_scores_csv(&csv_path, &scenario_sheet()).unwrap();
    write_feedback_docx(&docx_path, "Jane", "Well done").unwrap();

    assert_eq!(
        std::fs::read_to_string(&csv_path).unwrap(),
        "Student Name,Criterion,Score\nJane,Clarity,5\nJane,Evidence,5\n"
    );
    let bytes = std::fs::read(&docx_path).unwrap();
    assert_eq!(paragraphs(&bytes).unwrap()[1], "Well done");
}

#[test]
fn test_feedbackDocx_withVerticalTab_shouldReportDocumentError() {
    let result = feedback_docx("Jane", "Clarity\u{b}good");
    assert!(matches!(result, Err(ExportError::Docx(_))));
}

#[test]
fn test_scoresCsv_withSeparatorOnlyRubricRow_shouldKeepOneRowPerRubricRow() {
    let rubric = Rubric::from_csv_bytes(b"Criterion,MaxMarks\nClarity,10\n,\nEvidence,10", &RubricSchema::default()).unwrap();
    let sheet = ScoreSheet::from_rubric("Jane", &rubric, Score::new(5).unwrap());

    assert_eq!(
        scores_csv(&sheet).unwrap(),
        "Student Name,Criterion,Score\nJane,Clarity,5\nJane,,5\nJane,Evidence,5\n"
    );
}
