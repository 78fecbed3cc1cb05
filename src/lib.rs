/*!
 * # MarkWAI - AI-assisted marking of student work
 *
 * A Rust library for marking student submissions against a rubric with a
 * chat-completion model.
 *
 * ## Features
 *
 * - Read submissions from Word (.docx) or plain text files
 * - Load rubrics from CSV or spreadsheets (.xlsx, .xls, .xlsm, .ods)
 * - Generate per-criterion feedback using:
 *   - OpenAI Chat Completions API (or any compatible server)
 *   - Anthropic Messages API
 * - Manual 0-10 scores per criterion
 * - Export scores as CSV and feedback as a Word document
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: Submission text extraction and DOCX writing
 * - `rubric`: Rubric table loading and rendering
 * - `marking`: Prompt construction and feedback generation
 * - `scores`: Manual per-criterion scores
 * - `export`: Scores CSV and feedback DOCX export
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `providers`: Client implementations for the LLM providers:
 *   - `providers::openai`: OpenAI API client
 *   - `providers::anthropic`: Anthropic API client
 *   - `providers::mock`: Scripted provider for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod export;
pub mod file_utils;
pub mod marking;
pub mod providers;
pub mod rubric;
pub mod scores;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use document::{extract_text, read_document, DocumentKind};
pub use errors::{AppError, DocumentError, ExportError, FeedbackError, ProviderError, RubricError, ScoreError};
pub use marking::{Feedback, FeedbackGenerator, MarkingContext, SampleLevel};
pub use rubric::{Rubric, RubricSchema};
pub use scores::{Score, ScoreOverride, ScoreSheet};
