use crate::llm_client::prompts::JSON_ONLY_PREAMBLE;

pub const RESUME_PARSE_INSTRUCTIONS: &str = "Extract structured fields from the following resume text. \
    Return ONLY a valid JSON object. \
    Keys required: name (string), email (string), phone (string), skills (array of strings), \
    education (array of strings), experience (array of objects with keys: role, company, years), \
    summary (string).";

pub fn resume_parse_prompt(extracted_text: &str) -> String {
    format!("{JSON_ONLY_PREAMBLE} {RESUME_PARSE_INSTRUCTIONS}\n\nResume Text:\n{extracted_text}")
}
