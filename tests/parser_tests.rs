use issue_pilot::models::github::{Comment, Issue, Label};
use issue_pilot::parser::IssueParser;

fn issue(number: u64, title: &str, body: Option<&str>, labels: &[&str]) -> Issue {
    Issue {
        number,
        title: title.to_string(),
        body: body.map(str::to_string),
        html_url: format!("https://github.com/owner/repo/issues/{}", number),
        labels: labels
            .iter()
            .map(|name| Label {
                name: name.to_string(),
            })
            .collect(),
        state: Some("open".to_string()),
    }
}

fn comment(body: &str) -> Comment {
    Comment {
        id: 1,
        body: body.to_string(),
    }
}

#[test]
fn test_extract_code_blocks_simple() {
    let parser = IssueParser::new();
    let content = "Here's some code:\n```python\ndef test():\n    pass\n```\n";

    let refs = parser.extract_code_blocks(content);

    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].language, "python");
    assert!(refs[0].content.contains("def test():"));
    assert!(refs[0].filename.is_none());
    assert!(refs[0].start_line.is_none());
}

#[test]
fn test_extract_code_blocks_language_defaults_to_text() {
    let parser = IssueParser::new();
    let content = "```\nplain contents\n```";

    let refs = parser.extract_code_blocks(content);

    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].language, "text");
    assert_eq!(refs[0].content, "plain contents");
}

#[test]
fn test_extract_code_blocks_with_file_ref() {
    let parser = IssueParser::new();
    let content = "In file.py:10-15:\n```python\ndef test():\n    pass\n```\n";

    let refs = parser.extract_code_blocks(content);

    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].filename.as_deref(), Some("file.py"));
    assert_eq!(refs[0].start_line, Some(10));
    assert_eq!(refs[0].end_line, Some(15));
}

#[test]
fn test_extract_code_blocks_no_end_line() {
    let parser = IssueParser::new();
    let content = "at file.py:10:\n```python\npass\n```";

    let refs = parser.extract_code_blocks(content);

    assert_eq!(refs[0].filename.as_deref(), Some("file.py"));
    assert_eq!(refs[0].start_line, Some(10));
    assert_eq!(refs[0].end_line, None);
}

#[test]
fn test_extract_code_blocks_reference_formats() {
    let parser = IssueParser::new();
    let cases = [
        "in file.py:10:",
        "at file.py:10-15:",
        "file: file.py:10:",
        "in `file.py`:10-15:",
    ];

    for case in cases {
        let content = format!("{}\n```python\ndef test():\n    pass\n```", case);
        let refs = parser.extract_code_blocks(&content);
        assert_eq!(refs.len(), 1, "no block extracted for {:?}", case);
        assert_eq!(
            refs[0].filename.as_deref(),
            Some("file.py"),
            "wrong filename for {:?}",
            case
        );
        assert!(refs[0].start_line.is_some(), "no start line for {:?}", case);
    }
}

#[test]
fn test_extract_code_blocks_nearest_reference_wins() {
    let parser = IssueParser::new();
    let content = "in old.py:1:\nin new.py:2:\n```python\npass\n```";

    let refs = parser.extract_code_blocks(content);

    assert_eq!(refs[0].filename.as_deref(), Some("new.py"));
    assert_eq!(refs[0].start_line, Some(2));
}

#[test]
fn test_extract_code_blocks_reference_outside_window_ignored() {
    let parser = IssueParser::new();
    let content = "in far.py:1:\nline\nline\nline\n```python\npass\n```";

    let refs = parser.extract_code_blocks(content);
    assert!(refs[0].filename.is_none());
}

#[test]
fn test_extract_success_criteria_bullet_styles() {
    let parser = IssueParser::new();
    let content = "Success Criteria:\n- First criteria\n* Second criteria\n\u{2022} Third criteria\n";

    let criteria = parser.extract_success_criteria(content);

    assert_eq!(
        criteria,
        vec!["First criteria", "Second criteria", "Third criteria"]
    );
}

#[test]
fn test_extract_success_criteria_section_headers() {
    let parser = IssueParser::new();
    let headers = [
        "Success Criteria:",
        "Definition of Done:",
        "Acceptance Criteria:",
        "Expected Outcome:",
        "Expected Result:",
    ];

    for header in headers {
        let content = format!("{}\n- Test criteria", header);
        let criteria = parser.extract_success_criteria(&content);
        assert_eq!(criteria, vec!["Test criteria"], "failed for {:?}", header);
    }
}

#[test]
fn test_extract_success_criteria_stops_at_non_bullet() {
    let parser = IssueParser::new();
    let content = "Acceptance criteria:\n- one\n\n- two\nTrailing prose here\n- three";

    let criteria = parser.extract_success_criteria(content);

    // Blank lines are skipped; the prose line ends collection
    assert_eq!(criteria, vec!["one", "two"]);
}

#[test]
fn test_extract_success_criteria_missing_section() {
    let parser = IssueParser::new();
    assert!(parser.extract_success_criteria("No markers here").is_empty());
    assert!(parser.extract_success_criteria("").is_empty());
}

#[test]
fn test_extract_context_sections() {
    let parser = IssueParser::new();
    let content = "Context:\nImportant background info.\n\nCurrent Behavior:\nNot working properly.";
    let comments = vec![
        comment("Additional context: More details here."),
        comment("Not relevant."),
        comment("To clarify: Extra info."),
    ];

    let context = parser.extract_context(content, &comments);

    assert_eq!(context["context"], "Important background info.");
    assert_eq!(context["current behavior"], "Not working properly.");
    let additional = &context["additional_info"];
    assert!(additional.contains("More details"));
    assert!(additional.contains("Extra info"));
    // Matching comments accumulate newline-joined
    assert_eq!(additional.lines().count(), 2);
}

#[test]
fn test_extract_context_label_with_unicode_casing() {
    let parser = IssueParser::new();
    // U+212A (Kelvin sign) lowercases to a plain ASCII 'k' and shrinks
    // the byte length, so the key/value split cannot assume the label's
    // byte offsets hold on the original-case text.
    let content = "Bac\u{212A}ground:\nUses a mainframe charset.";
    let context = parser.extract_context(content, &[]);
    assert_eq!(context["background"], "Uses a mainframe charset.");
}

#[test]
fn test_extract_context_empty_input() {
    let parser = IssueParser::new();
    let context = parser.extract_context("", &[]);
    assert!(context.is_empty());
}

#[test]
fn test_parse_complete_issue() {
    let parser = IssueParser::new();
    let body = "We need to implement feature X.\n\n\
                Context:\nThis is important for improving performance.\n\n\
                ```python\ndef example():\n    pass\n```\n\n\
                In file.py:10-15:\n```python\ndef another_example():\n    return True\n```\n\n\
                Success Criteria:\n\
                - Feature X works correctly\n\
                - All tests pass\n\
                - Performance improved by 20%\n";
    let issue = issue(
        123,
        "Add feature X",
        Some(body),
        &["enhancement", "priority-high"],
    );
    let comments = vec![
        comment("Additional context: Feature X should handle edge cases."),
        comment("Just a regular comment."),
    ];

    let problem = parser.parse(&issue, &comments);

    assert_eq!(problem.title, "Add feature X");
    assert_eq!(problem.issue_number, 123);
    assert_eq!(problem.code_references.len(), 2);
    assert_eq!(problem.labels, vec!["enhancement", "priority-high"]);
    assert_eq!(problem.success_criteria.len(), 3);
    assert!(problem
        .success_criteria
        .contains(&"Feature X works correctly".to_string()));
    assert!(problem.context.contains_key("context"));
    assert!(problem.context.contains_key("additional_info"));

    // Second block carries the file reference
    assert_eq!(
        problem.code_references[1].filename.as_deref(),
        Some("file.py")
    );
    assert_eq!(problem.code_references[1].start_line, Some(10));
    assert_eq!(problem.code_references[1].end_line, Some(15));
}

#[test]
fn test_parse_small_issue_with_all_sections() {
    let parser = IssueParser::new();
    let body = "Context:\nBg info\n\n```python\ndef f(): pass\n```\n\n\
                Success Criteria:\n- works\n- fast";
    let issue = issue(7, "Add feature X", Some(body), &["enhancement"]);

    let problem = parser.parse(&issue, &[]);

    assert_eq!(problem.context.len(), 1);
    assert_eq!(problem.context["context"], "Bg info");
    assert_eq!(problem.code_references.len(), 1);
    assert_eq!(problem.code_references[0].language, "python");
    assert_eq!(problem.success_criteria, vec!["works", "fast"]);
    assert_eq!(problem.labels, vec!["enhancement"]);
}

#[test]
fn test_parse_minimal_issue() {
    let parser = IssueParser::new();
    let issue = issue(456, "Simple issue", Some("Just a description"), &[]);

    let problem = parser.parse(&issue, &[]);

    assert_eq!(problem.title, "Simple issue");
    assert_eq!(problem.description, "Just a description");
    assert!(problem.code_references.is_empty());
    assert!(problem.labels.is_empty());
    assert!(problem.success_criteria.is_empty());
    assert!(problem.context.is_empty());
}

#[test]
fn test_parse_null_body() {
    let parser = IssueParser::new();
    let issue = issue(789, "Empty issue", None, &[]);

    let problem = parser.parse(&issue, &[]);

    assert_eq!(problem.description, "");
    assert!(problem.code_references.is_empty());
    assert!(problem.success_criteria.is_empty());
}
