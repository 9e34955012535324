//! 提示词模板

/// 页面分析默认提示词，`{page_num}` 会被替换为页码
pub const PAGE_ANALYSIS_PROMPT: &str = r#"You are a senior QA engineer reviewing page {page_num} of a Business Requirements Document.

Read every requirement, table, diagram and annotation visible on this page and write test cases that cover them.
For each test case provide:
- Test Case ID (TC-{page_num}-<n>)
- Requirement covered
- Preconditions
- Test steps
- Expected result
- Priority (High / Medium / Low)

Include negative and boundary cases where the requirement allows them.
If the page contains no testable requirements (cover page, table of contents, revision history), say so in one sentence."#;

/// 简历分析的系统提示词
pub const RESUME_SYSTEM_PROMPT: &str =
    "You are an experienced technical recruiter. You always answer with a single valid JSON object.";

/// 简历分析响应的 token 上限
pub const RESUME_MAX_TOKENS: u32 = 500;

/// 页面分析响应的 token 上限
pub const PAGE_MAX_TOKENS: u32 = 1000;

/// 渲染页面提示词
pub fn render_page_prompt(template: &str, page_number: u32) -> String {
    template.replace("{page_num}", &page_number.to_string())
}

/// 构建简历分析提示词
///
/// 有预先计算的相似度时要求模型原样返回，否则由模型估计。
pub fn build_resume_prompt(job_description: &str, resume_text: &str, similarity: Option<f64>) -> String {
    let percentage_instruction = match similarity {
        Some(value) => format!("- Return matched percentage: {:.2}%.", value),
        None => "- Estimate how well the resume matches the job description as a percentage (for example \"72.50%\").".to_string(),
    };

    format!(
        r#"You are analyzing resumes for a job description. Given the job description and resume content below, perform the following:
{percentage_instruction}
- Provide a reason for the match or mismatch.
- Suggest skills to improve based on missing skills in the resume.
- Identify any irrelevant experience or skills in the resume.
- Provide a list of keywords that are matched between the resume and the job description.

IMPORTANT: Your response MUST be a valid JSON object with exactly these keys:
"Matched Percentage", "Reason", "Skills To Improve", "Irrelevant", "Keywords".

Job Description:
{job_description}

Resume:
{resume_text}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_page_prompt_replaces_all() {
        let prompt = render_page_prompt(PAGE_ANALYSIS_PROMPT, 7);
        assert!(prompt.contains("page 7 of"));
        assert!(prompt.contains("TC-7-<n>"));
        assert!(!prompt.contains("{page_num}"));
    }

    #[test]
    fn test_resume_prompt_with_similarity() {
        let prompt = build_resume_prompt("Rust dev", "Alice", Some(81.2));
        assert!(prompt.contains("Return matched percentage: 81.20%."));
        assert!(prompt.contains("Job Description:\nRust dev"));
    }

    #[test]
    fn test_resume_prompt_without_similarity() {
        let prompt = build_resume_prompt("Rust dev", "Alice", None);
        assert!(prompt.contains("Estimate how well"));
    }
}
