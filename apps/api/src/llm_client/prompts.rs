// Prompt fragments shared by every template that goes through the completion client.
// Task-specific templates live in generation/prompts.rs.

/// Appended to every generation prompt so the model stays within what the resume supports.
pub const GROUNDING_INSTRUCTION: &str = "\
    Use only facts that appear in the resume. Do NOT invent employers, job titles, \
    dates, degrees or metrics. Where a detail is missing, write around it instead \
    of guessing.";

/// Keeps responses usable as a plain-text download.
pub const PLAIN_TEXT_INSTRUCTION: &str = "\
    Respond with the finished text only. Do not add a preamble, closing remarks \
    or commentary about the task.";
