//! Unwrapping model replies into core payloads.

use essaymark_core::{AnnotationPayload, PayloadError, RevisionAudit, Rubric};

/// Strip a Markdown code fence around a reply, if there is one.
///
/// Handles ```` ```json ```` headers, bare fences, single-line fences and a
/// sentence of prose before the fence. Text without a fence is only trimmed.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let after = &trimmed[open + 3..];

    let body = match after.find('\n') {
        Some(i) if after[..i].trim().chars().all(|c| c.is_ascii_alphanumeric()) => &after[i + 1..],
        _ => after.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    match body.rfind("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

pub fn parse_annotation(reply: &str, rubric: &Rubric) -> Result<AnnotationPayload, PayloadError> {
    AnnotationPayload::from_json(strip_code_fence(reply), rubric)
}

pub fn parse_audit(reply: &str, rubric: &Rubric) -> Result<RevisionAudit, PayloadError> {
    RevisionAudit::from_json(strip_code_fence(reply), rubric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_reply_is_trimmed() {
        assert_eq!(strip_code_fence("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn json_fence_removed() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn bare_fence_removed() {
        assert_eq!(strip_code_fence("```\n{\"a\": 1}\n```\n"), "{\"a\": 1}");
    }

    #[test]
    fn single_line_fence_removed() {
        assert_eq!(strip_code_fence("```json {\"a\": 1}```"), "{\"a\": 1}");
    }

    #[test]
    fn prose_before_fence_dropped() {
        let reply = "Here is the assessment:\n```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fence(reply), "{\"a\": 1}");
    }

    #[test]
    fn unclosed_fence_tolerated() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn fenced_audit_parses() {
        let reply = "```json\n{\"summary\": \"Better.\", \"errors\": {}, \"new_errors\": []}\n```";
        let audit = parse_audit(reply, &Rubric::standard()).unwrap();
        assert_eq!(audit.summary, "Better.");
    }

    #[test]
    fn prose_reply_is_malformed() {
        let err = parse_annotation("Well done! FINAL MARK: 7/10", &Rubric::standard()).unwrap_err();
        assert!(matches!(err, PayloadError::Json(_)));
    }
}
