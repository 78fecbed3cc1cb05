/*!
 * Prompt construction for marking a submission.
 *
 * The base template interpolates the sample level, the rendered rubric and the
 * submission text. Optional assessment context (descriptor, minimum
 * requirements, benchmark sample) is inserted just before the closing list of
 * instructions.
 */

use crate::marking::SampleLevel;
use crate::rubric::Rubric;

/// Default system instruction sent with every marking request
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful academic marking assistant.";

const PROMPT_TAIL: &str = "Please provide:\n1. A mark for each criterion (mention the criterion).\n2. Constructive comments per criterion.\n3. An overall summary of the student's performance.\n";

/// Extra material about the assessment, all optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkingContext {
    /// Assessment brief given to students
    pub descriptor: Option<String>,
    /// Minimum requirements a pass must meet
    pub minimum_requirements: Option<String>,
    pub low_sample: Option<String>,
    pub medium_sample: Option<String>,
    pub high_sample: Option<String>,
}

impl MarkingContext {
    /// The benchmark sample for `level`, if one was supplied
    pub fn sample_for(&self, level: SampleLevel) -> Option<&str> {
        match level {
            SampleLevel::Low => self.low_sample.as_deref(),
            SampleLevel::Medium => self.medium_sample.as_deref(),
            SampleLevel::High => self.high_sample.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Builder for the marking prompt
#[derive(Debug, Clone)]
pub struct MarkingPromptBuilder<'a> {
    rubric: &'a Rubric,
    submission: &'a str,
    sample_level: SampleLevel,
    context: Option<&'a MarkingContext>,
}

impl<'a> MarkingPromptBuilder<'a> {
    pub fn new(submission: &'a str, rubric: &'a Rubric) -> Self {
        Self {
            rubric,
            submission,
            sample_level: SampleLevel::default(),
            context: None,
        }
    }

    pub fn with_sample_level(mut self, level: SampleLevel) -> Self {
        self.sample_level = level;
        self
    }

    pub fn with_context(mut self, context: &'a MarkingContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Render the full user message
    pub fn build(&self) -> String {
        let mut prompt = format!(
            "\nYou are an experienced academic marker. Based on the following rubric and sample level ({}), mark the student's work below.\nRubric:\n{}\n\nStudent Work:\n{}\n\n",
            self.sample_level,
            self.rubric.render_table(),
            self.submission,
        );

        if let Some(context) = self.context {
            push_section(&mut prompt, "Assessment Descriptor:", context.descriptor.as_deref());
            push_section(
                &mut prompt,
                "Minimum Requirements:",
                context.minimum_requirements.as_deref(),
            );
            push_section(
                &mut prompt,
                &format!("Benchmark Sample ({}):", self.sample_level),
                context.sample_for(self.sample_level),
            );
        }

        prompt.push_str(PROMPT_TAIL);
        prompt
    }
}

fn push_section(prompt: &mut String, title: &str, body: Option<&str>) {
    let Some(body) = body.map(str::trim).filter(|b| !b.is_empty()) else {
        return;
    };
    prompt.push_str(title);
    prompt.push('\n');
    prompt.push_str(body);
    prompt.push_str("\n\n");
}
