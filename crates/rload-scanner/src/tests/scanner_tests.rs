//! Tests for scanner.rs

use crate::region::{MaskKind, MaskedRegion};
use crate::scanner::*;

fn spans(source: &str) -> Vec<(MaskKind, usize, usize)> {
    scan(source)
        .unwrap_or_else(|err| panic!("scan failed: {err}"))
        .into_iter()
        .map(|r| (r.kind, r.start, r.end))
        .collect()
}

fn outer_texts(source: &str) -> Vec<String> {
    scan(source)
        .unwrap()
        .iter()
        .map(|r| r.outer_text(source).to_string())
        .collect()
}

// =============================================================================
// Strings and comments
// =============================================================================

#[test]
fn test_scan_empty() {
    assert!(spans("").is_empty());
    assert!(spans("var a = b + c;").is_empty());
}

#[test]
fn test_scan_strings() {
    let source = r#"var s = "a'b"; var t = 'c';"#;
    assert_eq!(
        spans(source),
        vec![
            (MaskKind::StringLiteral, 8, 13),
            (MaskKind::StringLiteral, 23, 26),
        ]
    );
    let regions = scan(source).unwrap();
    assert_eq!(regions[0].inner_text(source), "a'b");
}

#[test]
fn test_scan_escaped_quote() {
    assert_eq!(outer_texts(r"x = 'it\'s' + y"), vec![r"'it\'s'"]);
    assert_eq!(outer_texts(r#"x = "\\" + '\\'"#), vec![r#""\\""#, r"'\\'"]);
}

#[test]
fn test_scan_line_comment() {
    let source = "a // hi\nb";
    let regions = scan(source).unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].kind, MaskKind::LineComment);
    assert_eq!((regions[0].start, regions[0].end), (2, 7));
    assert_eq!(regions[0].inner_text(source), " hi");
}

#[test]
fn test_scan_line_comment_at_end_of_input() {
    assert_eq!(spans("a // hi"), vec![(MaskKind::LineComment, 2, 7)]);
}

#[test]
fn test_scan_block_comment() {
    let source = "a /* x * y */ b";
    let regions = scan(source).unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].kind, MaskKind::BlockComment);
    assert_eq!((regions[0].start, regions[0].end), (2, 13));
    assert_eq!(regions[0].inner_text(source), " x * y ");
}

#[test]
fn test_scan_block_comment_with_stars() {
    assert_eq!(outer_texts("/***/ a /**\n * doc\n **/"), vec!["/***/", "/**\n * doc\n **/"]);
}

#[test]
fn test_scan_unterminated_string_extends_to_end() {
    assert_eq!(spans("x = 'abc"), vec![(MaskKind::StringLiteral, 4, 8)]);
}

// =============================================================================
// Regex literals and division
// =============================================================================

#[test]
fn test_scan_regex_after_assignment() {
    let source = "x = /ab+c/g;";
    let regions = scan(source).unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].kind, MaskKind::Regex);
    assert_eq!(regions[0].outer_text(source), "/ab+c/");
    assert_eq!(regions[0].inner_text(source), "ab+c");
}

#[test]
fn test_scan_regex_character_class() {
    assert_eq!(spans("r = /[/]/;"), vec![(MaskKind::Regex, 4, 9)]);
    assert_eq!(outer_texts(r"r = /[\]/]+/;"), vec![r"/[\]/]+/"]);
}

#[test]
fn test_scan_regex_starting_with_escape() {
    assert_eq!(outer_texts(r"r = /\//;"), vec![r"/\//"]);
}

#[test]
fn test_scan_division() {
    assert!(spans("a = b / c / d;").is_empty());
    assert!(spans("total/count").is_empty());
}

#[test]
fn test_scan_regex_after_if_condition() {
    assert_eq!(spans("if (a) /x/.test(b)"), vec![(MaskKind::Regex, 7, 10)]);
    assert_eq!(spans("if(a) /x/"), vec![(MaskKind::Regex, 6, 9)]);
    assert_eq!(spans("while (x) /y/.exec(s)"), vec![(MaskKind::Regex, 10, 13)]);
}

#[test]
fn test_scan_division_after_parenthesized_expression() {
    assert!(spans("(a+b) /x/ 2").is_empty());
    assert!(spans("fn(a) /x/ 2").is_empty());
    assert!(spans("elif (a) /x/ 2").is_empty());
}

#[test]
fn test_scan_if_condition_with_paren_in_string() {
    let source = r#"if (a === ")") /x/.test(b)"#;
    assert_eq!(
        spans(source),
        vec![(MaskKind::StringLiteral, 10, 13), (MaskKind::Regex, 15, 18)]
    );
}

#[test]
fn test_scan_regex_after_keyword() {
    assert_eq!(spans("return /x/"), vec![(MaskKind::Regex, 7, 10)]);
    assert_eq!(spans("typeof /x/"), vec![(MaskKind::Regex, 7, 10)]);
    // `do` inside an identifier is not the keyword
    assert!(spans("undo / 2 / 3").is_empty());
}

#[test]
fn test_scan_keyword_property_is_not_keyword() {
    assert!(spans("x = y.in / 2").is_empty());
    assert!(spans("a.return / b / c").is_empty());
    assert_eq!(spans("if (a.delete) / 2 /"), vec![(MaskKind::Regex, 14, 19)]);
    assert!(!slash_starts_regex("x = y.typeof ", &[]));
    assert!(!slash_starts_regex("x = y .void ", &[]));
    assert!(slash_starts_regex("[...void ", &[]));
}

#[test]
fn test_scan_regex_inside_block() {
    assert_eq!(
        spans("function f() { return /a/; }"),
        vec![(MaskKind::Regex, 22, 25)]
    );
}

#[test]
fn test_scan_division_after_increment() {
    assert!(spans("a++ / 2").is_empty());
    assert!(spans("a-- / 2 / b").is_empty());
}

#[test]
fn test_scan_regex_after_comment_following_condition() {
    assert_eq!(
        spans("if (a) // check\n/x/.test(b)"),
        vec![(MaskKind::LineComment, 7, 15), (MaskKind::Regex, 16, 19)]
    );
}

#[test]
fn test_slash_starts_regex() {
    assert!(slash_starts_regex("", &[]));
    assert!(slash_starts_regex("a = ", &[]));
    assert!(slash_starts_regex("foo(", &[]));
    assert!(slash_starts_regex("[1, ", &[]));
    assert!(slash_starts_regex("x ? ", &[]));
    assert!(slash_starts_regex("while (ok) ", &[]));
    assert!(!slash_starts_regex("a ", &[]));
    assert!(!slash_starts_regex("foo(bar) ", &[]));
    assert!(!slash_starts_regex("}", &[]));
    assert!(!slash_starts_regex("x]", &[]));
}

#[test]
fn test_slash_after_unbalanced_paren_is_division() {
    assert!(!slash_starts_regex("a) ", &[]));
}

// =============================================================================
// Template literals
// =============================================================================

#[test]
fn test_scan_template_chunks() {
    let source = "`a${b}c`";
    let regions = scan(source).unwrap();
    assert_eq!(
        regions
            .iter()
            .map(|r| (r.kind, r.start, r.end))
            .collect::<Vec<_>>(),
        vec![(MaskKind::TemplateChunk, 0, 4), (MaskKind::TemplateEnd, 5, 8)]
    );
    assert_eq!(regions[0].inner_text(source), "a");
    assert_eq!(regions[1].inner_text(source), "c");
}

#[test]
fn test_scan_template_substitution_with_braces() {
    assert_eq!(
        spans("`${ {a:1}.a }`"),
        vec![(MaskKind::TemplateChunk, 0, 3), (MaskKind::TemplateEnd, 12, 14)]
    );
}

#[test]
fn test_scan_template_dollar_without_brace() {
    assert_eq!(spans("`a$b`"), vec![(MaskKind::TemplateEnd, 0, 5)]);
    assert_eq!(spans("`a$`"), vec![(MaskKind::TemplateEnd, 0, 4)]);
}

#[test]
fn test_scan_nested_template() {
    assert_eq!(
        spans("`x${`y`}z`"),
        vec![
            (MaskKind::TemplateChunk, 0, 4),
            (MaskKind::TemplateEnd, 4, 7),
            (MaskKind::TemplateEnd, 7, 10),
        ]
    );
}

#[test]
fn test_scan_string_inside_substitution() {
    assert_eq!(
        spans("`${ '}' }`"),
        vec![
            (MaskKind::TemplateChunk, 0, 3),
            (MaskKind::StringLiteral, 4, 7),
            (MaskKind::TemplateEnd, 8, 10),
        ]
    );
}

// =============================================================================
// Errors and invariants
// =============================================================================

#[test]
fn test_unbalanced_brace_is_lex_error() {
    let err = scan("a }\nb").unwrap_err();
    assert_eq!(err.line, 1);
    assert_eq!(err.column, 2);
    assert_eq!(err.offset, 2);
    assert_eq!(err.character, '}');
    assert_eq!(err.snippet, "a }\n  ^");
}

#[test]
fn test_lex_error_on_later_line() {
    let err = scan("x;\n  }").unwrap_err();
    assert_eq!((err.line, err.column), (2, 2));
    assert_eq!(err.snippet, "  }\n  ^");
    let message = err.to_string();
    assert!(message.starts_with("Unexpected character '}' (2:2)"), "{message}");
}

#[test]
fn test_scanner_step_by_step() {
    let source = "'a'";
    let mut scanner = MaskScanner::new(source);
    scanner.step('\'', 0).unwrap();
    assert_eq!(scanner.state(), ScanState::StringLiteral('\''));
    scanner.step('a', 1).unwrap();
    scanner.step('\'', 2).unwrap();
    assert_eq!(scanner.state(), ScanState::Base);
    assert_eq!(scanner.regions().len(), 1);
}

#[test]
fn test_regions_are_sorted_and_disjoint() {
    let source = r#"
        var re = /[a-z]+\//g; // trailing
        var s = 'it\'s' + "a/b" + `t${ x / 2 }u${ `n${1}` }v`;
        /* block
           comment */
        if (ok) /y/.test(s); else { z = a / b; }
        function f() { return typeof /q/ === 'object'; }
    "#;
    let regions: Vec<MaskedRegion> = scan(source).unwrap();
    assert!(regions.len() > 8);
    for pair in regions.windows(2) {
        assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
    }
    for region in &regions {
        assert!(region.start < region.end);
        assert!(region.inner_start <= region.inner_end);
    }
}
