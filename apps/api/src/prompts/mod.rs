//! Prompt Assembler: turns a task kind plus its input texts into a role-tagged request.
//!
//! Pure: no I/O, and identical inputs always produce identical requests.

pub mod templates;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::TaskError;
use self::templates::*;

/// Bumped whenever any template text changes.
pub const TEMPLATE_VERSION: u32 = 1;

/// One of the four task slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Parse,
    GenerateQuestions,
    GiveFeedback,
    ScoreMatch,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [
        TaskKind::Parse,
        TaskKind::GenerateQuestions,
        TaskKind::GiveFeedback,
        TaskKind::ScoreMatch,
    ];

    pub fn template(self) -> &'static TaskTemplate {
        match self {
            TaskKind::Parse => &PARSE,
            TaskKind::GenerateQuestions => &QUESTIONS,
            TaskKind::GiveFeedback => &FEEDBACK,
            TaskKind::ScoreMatch => &MATCH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Parse => "parse",
            TaskKind::GenerateQuestions => "generate_questions",
            TaskKind::GiveFeedback => "give_feedback",
            TaskKind::ScoreMatch => "score_match",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parse" => Ok(TaskKind::Parse),
            "generate_questions" | "questions" => Ok(TaskKind::GenerateQuestions),
            "give_feedback" | "feedback" => Ok(TaskKind::GiveFeedback),
            "score_match" | "match" => Ok(TaskKind::ScoreMatch),
            other => Err(format!("unknown task '{other}'")),
        }
    }
}

/// A named interpolation slot in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSlot {
    Resume,
    JobDescription,
    Answer,
}

impl InputSlot {
    fn placeholder(self) -> &'static str {
        match self {
            InputSlot::Resume => "resume",
            InputSlot::JobDescription => "job_description",
            InputSlot::Answer => "answer",
        }
    }

    fn from_placeholder(name: &str) -> Option<Self> {
        [InputSlot::Resume, InputSlot::JobDescription, InputSlot::Answer]
            .into_iter()
            .find(|slot| slot.placeholder() == name)
    }
}

impl fmt::Display for InputSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSlot::Resume => f.write_str("resume text"),
            InputSlot::JobDescription => f.write_str("job description text"),
            InputSlot::Answer => f.write_str("candidate answer"),
        }
    }
}

/// Fixed definition of a task: instruction, content template and the slots it needs.
#[derive(Debug, Serialize)]
pub struct TaskTemplate {
    pub title: &'static str,
    pub purpose: &'static str,
    #[serde(skip)]
    pub system: &'static str,
    #[serde(skip)]
    pub user: &'static str,
    pub slots: &'static [InputSlot],
}

static PARSE: TaskTemplate = TaskTemplate {
    title: "Resume & JD Parsing",
    purpose: PARSE_PURPOSE,
    system: PARSE_SYSTEM,
    user: PARSE_PROMPT,
    slots: &[InputSlot::Resume, InputSlot::JobDescription],
};

static QUESTIONS: TaskTemplate = TaskTemplate {
    title: "Interview Question Generator",
    purpose: QUESTIONS_PURPOSE,
    system: QUESTIONS_SYSTEM,
    user: QUESTIONS_PROMPT,
    slots: &[InputSlot::Resume, InputSlot::JobDescription],
};

static FEEDBACK: TaskTemplate = TaskTemplate {
    title: "Mock Interview Feedback",
    purpose: FEEDBACK_PURPOSE,
    system: FEEDBACK_SYSTEM,
    user: FEEDBACK_PROMPT,
    slots: &[InputSlot::Answer],
};

static MATCH: TaskTemplate = TaskTemplate {
    title: "Job Suitability Score",
    purpose: MATCH_PURPOSE,
    system: MATCH_SYSTEM,
    user: MATCH_PROMPT,
    slots: &[InputSlot::Resume, InputSlot::JobDescription],
};

/// Texts available to the assembler. `None` means absent (nothing uploaded or
/// typed); `Some("")` is a present, empty input.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptInputs<'a> {
    pub resume: Option<&'a str>,
    pub job_description: Option<&'a str>,
    pub answer: Option<&'a str>,
}

impl<'a> PromptInputs<'a> {
    fn get(&self, slot: InputSlot) -> Option<&'a str> {
        match slot {
            InputSlot::Resume => self.resume,
            InputSlot::JobDescription => self.job_description,
            InputSlot::Answer => self.answer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Instruction followed by content. The order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredRequest {
    pub task: Option<TaskKind>,
    pub template_version: u32,
    pub messages: Vec<ChatMessage>,
}

impl StructuredRequest {
    /// The opening greeting, which is not one of the four task slots.
    pub fn greeting() -> Self {
        Self {
            task: None,
            template_version: TEMPLATE_VERSION,
            messages: vec![
                ChatMessage::system(GREETING_SYSTEM),
                ChatMessage::user(GREETING_PROMPT),
            ],
        }
    }
}

/// Builds the request for `task`, failing with `MissingInput` on the first
/// required slot that is absent.
pub fn assemble(task: TaskKind, inputs: &PromptInputs<'_>) -> Result<StructuredRequest, TaskError> {
    let template = task.template();
    if let Some(&slot) = template.slots.iter().find(|s| inputs.get(**s).is_none()) {
        return Err(TaskError::MissingInput { slot });
    }

    Ok(StructuredRequest {
        task: Some(task),
        template_version: TEMPLATE_VERSION,
        messages: vec![
            ChatMessage::system(template.system),
            ChatMessage::user(interpolate(template.user, inputs)),
        ],
    })
}

/// Single-pass substitution of `{slot}` placeholders. Inserted text is never
/// re-scanned, so a resume containing `{job_description}` stays literal.
/// Unknown or absent placeholders are left as written.
fn interpolate(template: &str, inputs: &PromptInputs<'_>) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let value = InputSlot::from_placeholder(&after[..close]).and_then(|s| inputs.get(s))?;
            Some((value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "Python developer, 3 years, built REST APIs";
    const JD: &str = "Looking for backend engineer with Python and SQL experience";

    fn both_docs() -> PromptInputs<'static> {
        PromptInputs {
            resume: Some(RESUME),
            job_description: Some(JD),
            answer: None,
        }
    }

    #[test]
    fn test_parse_request_has_system_then_user() {
        let request = assemble(TaskKind::Parse, &both_docs()).unwrap();
        assert_eq!(request.task, Some(TaskKind::Parse));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, PARSE_SYSTEM);
        assert_eq!(request.messages[1].role, Role::User);
        assert!(request.messages[1].content.contains(RESUME));
        assert!(request.messages[1].content.contains(JD));
    }

    #[test]
    fn test_assemble_is_deterministic() {
        for task in [TaskKind::Parse, TaskKind::GenerateQuestions, TaskKind::ScoreMatch] {
            let a = assemble(task, &both_docs()).unwrap();
            let b = assemble(task, &both_docs()).unwrap();
            assert_eq!(a, b);
            assert_eq!(
                serde_json::to_vec(&a).unwrap(),
                serde_json::to_vec(&b).unwrap()
            );
        }
    }

    #[test]
    fn test_absent_document_is_missing_input() {
        let inputs = PromptInputs {
            resume: Some(RESUME),
            ..Default::default()
        };
        let err = assemble(TaskKind::ScoreMatch, &inputs).unwrap_err();
        assert_eq!(
            err,
            TaskError::MissingInput {
                slot: InputSlot::JobDescription
            }
        );
    }

    #[test]
    fn test_empty_document_is_not_missing() {
        let inputs = PromptInputs {
            resume: Some(RESUME),
            job_description: Some(""),
            answer: None,
        };
        let request = assemble(TaskKind::Parse, &inputs).unwrap();
        assert!(request.messages[1]
            .content
            .contains("Job Description:\n\nYour Task:"));
    }

    #[test]
    fn test_feedback_needs_only_the_answer() {
        let err = assemble(TaskKind::GiveFeedback, &both_docs()).unwrap_err();
        assert_eq!(err, TaskError::MissingInput { slot: InputSlot::Answer });

        let inputs = PromptInputs {
            answer: Some("I led the migration to Postgres."),
            ..Default::default()
        };
        let request = assemble(TaskKind::GiveFeedback, &inputs).unwrap();
        assert_eq!(request.messages[0].content, FEEDBACK_SYSTEM);
        assert!(request.messages[1]
            .content
            .starts_with("Candidate's Answer:\nI led the migration to Postgres.\n"));
    }

    #[test]
    fn test_empty_answer_is_accepted() {
        let inputs = PromptInputs {
            answer: Some(""),
            ..Default::default()
        };
        assert!(assemble(TaskKind::GiveFeedback, &inputs).is_ok());
    }

    #[test]
    fn test_inserted_text_is_not_rescanned() {
        let inputs = PromptInputs {
            resume: Some("I write {job_description} templates"),
            job_description: Some("JD"),
            answer: None,
        };
        let request = assemble(TaskKind::Parse, &inputs).unwrap();
        assert!(request.messages[1]
            .content
            .contains("I write {job_description} templates"));
    }

    #[test]
    fn test_interpolate_leaves_unknown_braces() {
        let inputs = PromptInputs {
            answer: Some("yes"),
            ..Default::default()
        };
        assert_eq!(
            interpolate("{a} {answer} {unclosed", &inputs),
            "{a} yes {unclosed"
        );
    }

    #[test]
    fn test_every_template_mentions_its_slots() {
        for task in TaskKind::ALL {
            let template = task.template();
            for slot in template.slots {
                let placeholder = format!("{{{}}}", slot.placeholder());
                assert!(
                    template.user.contains(&placeholder),
                    "{task} template lacks {placeholder}"
                );
            }
        }
    }

    #[test]
    fn test_task_kind_parses_short_and_long_names() {
        for task in TaskKind::ALL {
            assert_eq!(task.as_str().parse::<TaskKind>(), Ok(task));
        }
        assert_eq!("match".parse::<TaskKind>(), Ok(TaskKind::ScoreMatch));
        assert_eq!("feedback".parse::<TaskKind>(), Ok(TaskKind::GiveFeedback));
        assert!("summarize".parse::<TaskKind>().is_err());
    }

    #[test]
    fn test_greeting_request() {
        let request = StructuredRequest::greeting();
        assert_eq!(request.task, None);
        assert_eq!(request.messages[1].content, "Say Hello to me");
    }
}
