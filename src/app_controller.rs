use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};

use crate::app_config::Config;
use crate::document::read_document;
use crate::errors::{AppError, ExportError, FeedbackError};
use crate::export::{write_feedback_docx, write_scores_csv};
use crate::file_utils::FileManager;
use crate::marking::{Feedback, FeedbackGenerator, MarkingContext, SampleLevel};
use crate::rubric::Rubric;
use crate::scores::{Score, ScoreOverride, ScoreSheet};

// @module: Application controller for marking workflows

/// Everything `mark` needs; required inputs are checked before any file is touched
#[derive(Debug, Clone, Default)]
pub struct MarkingInputs {
    // @field: Submission file, or a folder of submissions
    pub submission: Option<PathBuf>,
    pub rubric: Option<PathBuf>,
    // @field: Required for a single submission, derived from file stems for folders
    pub student_name: Option<String>,
    pub sample_level: SampleLevel,
    pub descriptor: Option<PathBuf>,
    pub minimum_requirements: Option<String>,
    pub low_sample: Option<PathBuf>,
    pub medium_sample: Option<PathBuf>,
    pub high_sample: Option<PathBuf>,
    pub output_dir: PathBuf,
    // @field: Also write scores CSV and feedback DOCX
    pub export: bool,
    pub score_overrides: Vec<ScoreOverride>,
    pub force_overwrite: bool,
}

impl MarkingInputs {
    /// Whether the submission path is a folder of submissions
    pub fn is_folder(&self) -> bool {
        self.submission.as_deref().is_some_and(Path::is_dir)
    }

    /// Names of the required inputs that were not supplied
    ///
    /// A student name is only required for a single submission.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.submission.is_none() {
            missing.push("submission");
        }
        if self.rubric.is_none() {
            missing.push("rubric");
        }
        if !self.is_folder() && non_blank(self.student_name.as_deref()).is_none() {
            missing.push("student name");
        }
        missing
    }
}

/// Inputs of a standalone export of an (edited) feedback draft
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub rubric: Option<PathBuf>,
    pub student_name: Option<String>,
    pub feedback: Option<PathBuf>,
    pub score_overrides: Vec<ScoreOverride>,
    pub output_dir: PathBuf,
    pub force_overwrite: bool,
}

/// Result of marking one submission
#[derive(Debug, Clone)]
pub struct MarkingOutcome {
    pub student_name: String,
    pub feedback: Feedback,
    pub scores: ScoreSheet,
    // @field: None when the file already existed and was skipped
    pub draft_path: Option<PathBuf>,
    pub scores_path: Option<PathBuf>,
    pub feedback_path: Option<PathBuf>,
}

/// Paths written by an export; None when a file was skipped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportOutcome {
    pub scores_path: Option<PathBuf>,
    pub feedback_path: Option<PathBuf>,
}

/// Counts from marking a folder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub marked: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: None for workflows that never call the provider
    generator: Option<FeedbackGenerator>,
}

impl Controller {
    // @method: Create a controller without a provider (export and preview only)
    pub fn new(config: Config) -> Self {
        Self {
            config,
            generator: None,
        }
    }

    // @method: Create a controller whose generator is built from the configuration
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let generator = FeedbackGenerator::from_config(&config)?;
        Ok(Self::with_generator(config, generator))
    }

    // @method: Create a controller around an existing generator
    pub fn with_generator(config: Config, generator: FeedbackGenerator) -> Self {
        Self {
            config,
            generator: Some(generator),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn generator(&self) -> Result<&FeedbackGenerator, AppError> {
        self.generator.as_ref().ok_or_else(|| {
            FeedbackError::MissingApiKey(self.config.marking.provider.display_name().to_string())
                .into()
        })
    }

    /// Check the provider credential and endpoint
    pub async fn test_connection(&self) -> Result<(), AppError> {
        let generator = self.generator()?;
        info!(
            "Testing connection to {} with model {}",
            generator.provider_name(),
            generator.model()
        );
        generator.test_connection().await?;
        info!("Connection OK");
        Ok(())
    }

    /// Render a rubric as an aligned table
    pub fn preview_rubric<P: AsRef<Path>>(&self, path: P) -> Result<String, AppError> {
        let rubric = Rubric::load(path, &self.config.rubric)?;
        Ok(rubric.render_table())
    }

    /// Mark a single submission
    ///
    /// The feedback draft is written only when generation succeeds. With
    /// `export` set, the scores CSV and feedback DOCX are written as well.
    pub async fn mark(&self, inputs: &MarkingInputs) -> Result<MarkingOutcome, AppError> {
        let (submission, rubric_path, student_name) = required_marking_inputs(inputs)?;

        let rubric = Rubric::load(rubric_path, &self.config.rubric)?;
        let context = load_context(inputs)?;

        self.mark_with(submission, &rubric, student_name, &context, inputs)
            .await
    }

    /// Mark every submission document in a folder
    ///
    /// Student names come from file stems. A failed submission is logged and
    /// counted; the remaining ones are still marked.
    pub async fn mark_folder(&self, inputs: &MarkingInputs) -> Result<FolderSummary, AppError> {
        let (Some(dir), Some(rubric_path)) = (&inputs.submission, &inputs.rubric) else {
            return Err(AppError::MissingInput(inputs.missing()));
        };

        if !FileManager::dir_exists(dir) {
            return Err(AppError::File(format!("Submission folder does not exist: {}", dir.display())));
        }

        let rubric = Rubric::load(rubric_path, &self.config.rubric)?;
        let context = load_context(inputs)?;

        let submissions = FileManager::find_submissions(dir)?;
        if submissions.is_empty() {
            return Err(AppError::File(format!(
                "No .docx or .txt submissions found in {}",
                dir.display()
            )));
        }

        let start_time = Instant::now();
        let progress = ProgressBar::new(submissions.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} submissions ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style.progress_chars("#>-"));

        let mut summary = FolderSummary::default();

        for path in &submissions {
            let student_name = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            progress.set_message(student_name.clone());

            let draft = FileManager::output_path(&inputs.output_dir, &student_name, "feedback", "txt");
            if draft.exists() && !inputs.force_overwrite {
                warn!(
                    "Skipping {}, feedback draft already exists (use --force-overwrite to replace)",
                    student_name
                );
                summary.skipped += 1;
                progress.inc(1);
                continue;
            }

            match self
                .mark_with(path, &rubric, &student_name, &context, inputs)
                .await
            {
                Ok(_) => summary.marked += 1,
                Err(e) => {
                    error!("Error marking {}: {}", path.display(), e);
                    summary.failed += 1;
                }
            }
            progress.inc(1);
        }

        progress.finish_with_message("done");
        info!(
            "Folder marking completed in {:.1}s: {} marked, {} skipped, {} errors",
            start_time.elapsed().as_secs_f64(),
            summary.marked,
            summary.skipped,
            summary.failed
        );

        Ok(summary)
    }

    /// Export scores and an (edited) feedback draft without calling the provider
    pub fn export(&self, request: &ExportRequest) -> Result<ExportOutcome, AppError> {
        let mut missing = Vec::new();
        if request.rubric.is_none() {
            missing.push("rubric");
        }
        let student_name = non_blank(request.student_name.as_deref());
        if student_name.is_none() {
            missing.push("student name");
        }
        if request.feedback.is_none() {
            missing.push("feedback");
        }
        let (Some(rubric_path), Some(student_name), Some(feedback_path)) =
            (&request.rubric, student_name, &request.feedback)
        else {
            return Err(AppError::MissingInput(missing));
        };

        let rubric = Rubric::load(rubric_path, &self.config.rubric)?;
        let sheet = self.score_sheet(student_name, &rubric, &request.score_overrides)?;
        let feedback = FileManager::read_to_string(feedback_path)?;

        self.write_exports(
            &request.output_dir,
            &sheet,
            &feedback,
            request.force_overwrite,
        )
    }

    async fn mark_with(
        &self,
        submission: &Path,
        rubric: &Rubric,
        student_name: &str,
        context: &MarkingContext,
        inputs: &MarkingInputs,
    ) -> Result<MarkingOutcome, AppError> {
        // Overrides are validated before spending a request
        let sheet = self.score_sheet(student_name, rubric, &inputs.score_overrides)?;
        let text = read_document(submission)?;

        let generator = self.generator()?;

        info!("Marking {} ({})", student_name, submission.display());
        let feedback = generator
            .generate_with_context(&text, rubric, inputs.sample_level, context)
            .await?;

        let draft = FileManager::output_path(&inputs.output_dir, student_name, "feedback", "txt");
        let draft_path = if should_write(&draft, inputs.force_overwrite) {
            FileManager::write_to_file(&draft, &feedback.text)?;
            info!("Feedback draft written to {}", draft.display());
            Some(draft)
        } else {
            None
        };

        let exported = if inputs.export {
            self.write_exports(&inputs.output_dir, &sheet, &feedback.text, inputs.force_overwrite)?
        } else {
            ExportOutcome::default()
        };

        Ok(MarkingOutcome {
            student_name: student_name.to_string(),
            feedback,
            scores: sheet,
            draft_path,
            scores_path: exported.scores_path,
            feedback_path: exported.feedback_path,
        })
    }

    fn score_sheet(
        &self,
        student_name: &str,
        rubric: &Rubric,
        overrides: &[ScoreOverride],
    ) -> Result<ScoreSheet, AppError> {
        let default_score = Score::new(i64::from(self.config.scoring.default_score))?;
        let mut sheet = ScoreSheet::from_rubric(student_name, rubric, default_score);
        sheet.apply_overrides(overrides)?;
        debug!("Score sheet for {}: {:?}", student_name, sheet.entries());
        Ok(sheet)
    }

    fn write_exports(
        &self,
        output_dir: &Path,
        sheet: &ScoreSheet,
        feedback: &str,
        force_overwrite: bool,
    ) -> Result<ExportOutcome, AppError> {
        let student_name = sheet.student_name();
        let scores = FileManager::output_path(output_dir, student_name, "scores", "csv");
        let document = FileManager::output_path(output_dir, student_name, "feedback", "docx");

        // Blank feedback exports nothing, scores included
        if feedback.trim().is_empty() {
            return Err(ExportError::EmptyFeedback.into());
        }

        let mut outcome = ExportOutcome::default();
        if should_write(&scores, force_overwrite) {
            write_scores_csv(&scores, sheet)?;
            outcome.scores_path = Some(scores);
        }
        if should_write(&document, force_overwrite) {
            write_feedback_docx(&document, student_name, feedback)?;
            outcome.feedback_path = Some(document);
        }
        Ok(outcome)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required_marking_inputs(inputs: &MarkingInputs) -> Result<(&Path, &Path, &str), AppError> {
    match (
        &inputs.submission,
        &inputs.rubric,
        non_blank(inputs.student_name.as_deref()),
    ) {
        (Some(submission), Some(rubric), Some(student_name)) => {
            Ok((submission.as_path(), rubric.as_path(), student_name))
        }
        _ => {
            let mut missing = Vec::new();
            if inputs.submission.is_none() {
                missing.push("submission");
            }
            if inputs.rubric.is_none() {
                missing.push("rubric");
            }
            if non_blank(inputs.student_name.as_deref()).is_none() {
                missing.push("student name");
            }
            Err(AppError::MissingInput(missing))
        }
    }
}

fn load_context(inputs: &MarkingInputs) -> Result<MarkingContext, AppError> {
    let read = |path: &Option<PathBuf>| -> Result<Option<String>, AppError> {
        path.as_ref()
            .map(|p| read_document(p).map_err(AppError::from))
            .transpose()
    };

    Ok(MarkingContext {
        descriptor: read(&inputs.descriptor)?,
        minimum_requirements: inputs.minimum_requirements.clone(),
        low_sample: read(&inputs.low_sample)?,
        medium_sample: read(&inputs.medium_sample)?,
        high_sample: read(&inputs.high_sample)?,
    })
}

// Existing outputs are kept unless overwriting was asked for
fn should_write(path: &Path, force_overwrite: bool) -> bool {
    if path.exists() && !force_overwrite {
        warn!(
            "Skipping {}, file already exists (use --force-overwrite to replace)",
            path.display()
        );
        return false;
    }
    true
}
