/*!
 * Tests for manual scores
 */

use markwai::errors::ScoreError;
use markwai::rubric::{Rubric, RubricSchema};
use markwai::scores::{Score, ScoreOverride, ScoreSheet, MAX_SCORE};

fn rubric(csv: &str) -> Rubric {
    Rubric::from_csv_bytes(csv.as_bytes(), &RubricSchema::default()).unwrap()
}

#[test]
fn test_score_new_shouldAcceptOnlyZeroToTen() {
    assert_eq!(Score::new(0).unwrap().value(), 0);
    assert_eq!(Score::new(i64::from(MAX_SCORE)).unwrap().value(), 10);
    assert_eq!(Score::new(11), Err(ScoreError::OutOfRange(11)));
    assert_eq!(Score::new(-1), Err(ScoreError::OutOfRange(-1)));
}

#[test]
fn test_scoreSheet_fromRubric_shouldHaveOneEntryPerRowInOrder() {
    let rubric = rubric("Criterion,MaxMarks\nClarity,10\nEvidence,10\nClarity,5\n");

    let sheet = ScoreSheet::from_rubric("Jane", &rubric, Score::new(5).unwrap());

    let labels: Vec<&str> = sheet.entries().iter().map(|e| e.criterion.as_str()).collect();
    assert_eq!(labels, vec!["Clarity", "Evidence", "Clarity"]);
    assert!(sheet.entries().iter().all(|e| e.score.value() == 5));
    assert_eq!(sheet.student_name(), "Jane");
}

#[test]
fn test_setScore_withDuplicateLabel_shouldUpdateEveryMatchingRow() {
    let rubric = rubric("Criterion\nClarity\nEvidence\n Clarity \n");
    let mut sheet = ScoreSheet::from_rubric("Jane", &rubric, Score::new(5).unwrap());

    let updated = sheet.set_score("Clarity", Score::new(9).unwrap()).unwrap();

    assert_eq!(updated, 2);
    let values: Vec<u8> = sheet.entries().iter().map(|e| e.score.value()).collect();
    assert_eq!(values, vec![9, 5, 9]);
    // The label itself is never rewritten
    assert_eq!(sheet.entries()[2].criterion, " Clarity ");
}

#[test]
fn test_setScore_withUnknownCriterion_shouldFail() {
    let rubric = rubric("Criterion\nClarity\n");
    let mut sheet = ScoreSheet::from_rubric("Jane", &rubric, Score::new(5).unwrap());

    assert_eq!(
        sheet.set_score("Style", Score::new(3).unwrap()),
        Err(ScoreError::UnknownCriterion("Style".to_string()))
    );
}

#[test]
fn test_setScoreAt_withOutOfBoundsIndex_shouldFail() {
    let rubric = rubric("Criterion\nClarity\n");
    let mut sheet = ScoreSheet::from_rubric("Jane", &rubric, Score::new(5).unwrap());

    assert!(sheet.set_score_at(0, Score::new(1).unwrap()).is_ok());
    assert!(sheet.set_score_at(1, Score::new(1).unwrap()).is_err());
    assert_eq!(sheet.entries()[0].score.value(), 1);
}

#[test]
fn test_scoreOverride_parse_shouldTrimCriterionAndScore() {
    let parsed: ScoreOverride = " Clarity = 8 ".parse().unwrap();
    assert_eq!(parsed.criterion, "Clarity");
    assert_eq!(parsed.score, Score::new(8).unwrap());
}

#[test]
fn test_scoreOverride_parse_withoutEquals_shouldFail() {
    assert!(matches!(
        "Clarity 8".parse::<ScoreOverride>(),
        Err(ScoreError::InvalidOverride(_))
    ));
    assert!(matches!(
        "=8".parse::<ScoreOverride>(),
        Err(ScoreError::InvalidOverride(_))
    ));
}

#[test]
fn test_applyOverrides_withUnknownCriterion_shouldReportIt() {
    let rubric = rubric("Criterion\nClarity\nEvidence\n");
    let mut sheet = ScoreSheet::from_rubric("Jane", &rubric, Score::new(5).unwrap());
    let overrides: Vec<ScoreOverride> = vec!["Evidence=7".parse().unwrap(), "Style=2".parse().unwrap()];

    let result = sheet.apply_overrides(&overrides);

    assert_eq!(result, Err(ScoreError::UnknownCriterion("Style".to_string())));
    assert_eq!(sheet.entries()[1].score.value(), 7);
}
