//! Prompt construction.

use crate::content::request::GenerationRequest;

/// Human-readable form of a content-type tag (`blog_post` → `blog post`).
pub fn describe_content_type(tag: &str) -> String {
    tag.trim().replace('_', " ")
}

pub fn build_prompt(request: &GenerationRequest) -> String {
    let mut prompt = format!(
        "Write a {} about '{}'",
        describe_content_type(&request.content_type),
        request.topic.trim()
    );

    let tone = request.tone.trim();
    if !tone.is_empty() {
        prompt.push_str(&format!(" in a {} tone", tone));
    }

    if let Some(length) = request.length.filter(|&l| l > 0) {
        prompt.push_str(&format!(". Aim for approximately {} words", length));
    }

    let context = request.additional_context.trim();
    if !context.is_empty() {
        prompt.push_str(&format!(". Additional context: {}", context));
    }

    prompt
}
