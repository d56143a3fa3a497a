// Prompt templates for the four interview tasks.
// Placeholders: {resume}, {job_description}, {answer}.

pub const PARSE_SYSTEM: &str =
    "You are a Resume & JD Parsing Agent. Extract structured information.";

pub const PARSE_PROMPT: &str = "Resume:
{resume}
Job Description:
{job_description}
Your Task:
1. Extract 5–7 core skills from the resume.
2. Mention 3 key job experiences.
3. From the JD, extract 5 required competencies or qualifications.
4. Output everything in bullet points.";

pub const PARSE_PURPOSE: &str = "Extracts 5–7 key skills and 3 major experiences from the \
    resume, and 5 required competencies from the job description, as bullet points.";

pub const QUESTIONS_SYSTEM: &str = "You are an Interview Question Generator Agent.";

pub const QUESTIONS_PROMPT: &str = "Based on the resume and job description below, generate 10 interview questions.
- Include a mix of technical, behavioral, and situational questions.
- Tag each question like this: [Technical], [Behavioral], [Situational].
- Make the questions relevant to the candidate’s profile and job role.
Resume:
{resume}
Job Description:
{job_description}";

pub const QUESTIONS_PURPOSE: &str = "Generates 10 job-relevant interview questions, each \
    tagged as technical, behavioral or situational.";

pub const FEEDBACK_SYSTEM: &str = "You are an Interview Feedback Agent.";

pub const FEEDBACK_PROMPT: &str = "Candidate's Answer:
{answer}
Your Task:
1. Score the answer out of 10.
2. Explain what was good and what can be improved.
3. Rewrite the answer using the STAR method (Situation, Task, Action, Result).
4. Make your feedback clear and easy to follow.";

pub const FEEDBACK_PURPOSE: &str = "Scores an answer to one of the generated questions out \
    of 10, lists strengths and weaknesses, and rewrites it in STAR format.";

pub const MATCH_SYSTEM: &str = "You are a Job Match Evaluation Agent.";

pub const MATCH_PROMPT: &str = "Your task is to evaluate how suitable the candidate is for the given job.
Resume:
{resume}
Job Description:
{job_description}
Instructions:
1. Give a job match score out of 100%.
2. Mention 2–3 strong match points.
3. Mention 2–3 gaps or mismatches.
4. End with a short overall recommendation (e.g. Good match, Moderate fit, Needs improvement).
Format everything clearly.";

pub const MATCH_PURPOSE: &str = "Rates how well the resume fits the job out of 100%, with \
    2–3 strengths, 2–3 gaps and a short recommendation.";

/// Opening exchange shown when the page loads.
pub const GREETING_SYSTEM: &str = "You are a helpful assistant.";
pub const GREETING_PROMPT: &str = "Say Hello to me";
