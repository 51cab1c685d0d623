use serde_teff::tree::{parse, render, TextNode};
use serde_teff::{tokenize, Error, RenderOptions, ScanOptions, Scanner, Token, TokenKind};

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|token| token.kind).collect()
}

#[test]
fn test_single_dedent_from_two_levels() {
    let mut scanner = Scanner::from_str("a\n  b\n    c\n  d\n");
    let mut seen = Vec::new();
    while scanner.advance() {
        let token = scanner.current().clone();
        if token.text == "d" {
            assert_eq!(scanner.indents(), ["", "  "]);
        }
        seen.push(token);
    }
    assert_eq!(
        seen,
        vec![
            Token::line("a"),
            Token::indent(),
            Token::line("b"),
            Token::indent(),
            Token::line("c"),
            Token::unindent(),
            Token::line("d"),
            Token::unindent(),
            Token::end_of_input(),
        ]
    );
    assert_eq!(scanner.indents(), [""]);
}

#[test]
fn test_dedent_burst_closes_every_level() {
    let tokens = tokenize("a\n b\n  c\n   d\ne\n").unwrap();
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::LineContent,
            TokenKind::Indent,
            TokenKind::LineContent,
            TokenKind::Indent,
            TokenKind::LineContent,
            TokenKind::Indent,
            TokenKind::LineContent,
            TokenKind::Unindent,
            TokenKind::Unindent,
            TokenKind::Unindent,
            TokenKind::LineContent,
            TokenKind::EndOfInput,
        ]
    );
}

#[test]
fn test_dedent_to_unopened_level_fails() {
    let mut scanner = Scanner::from_str("a\n  b\n c\n");
    let mut count = 0;
    while scanner.advance() {
        count += 1;
    }
    assert_eq!(count, 3);
    assert_eq!(scanner.error(), Some(&Error::mismatched_indent(3, " ")));
    assert!(!scanner.advance());
}

#[test]
fn test_tab_and_space_do_not_mix() {
    assert!(matches!(
        tokenize("a\n\tb\n  c\n"),
        Err(Error::MismatchedIndent { line: 3, .. })
    ));
}

#[test]
fn test_control_character_stops_the_scan() {
    let mut scanner = Scanner::from_str("first\nsec\u{1}ond\nthird\n");
    let mut texts = Vec::new();
    while scanner.advance() {
        texts.push(scanner.current().text.clone());
    }
    assert_eq!(texts, vec!["first"]);
    assert_eq!(
        scanner.error(),
        Some(&Error::invalid_code_point(2, 4, '\u{1}'))
    );
}

#[test]
fn test_replacement_character_is_rejected() {
    assert!(matches!(
        tokenize("ok \u{fffd}"),
        Err(Error::InvalidCodePoint { ch: '\u{fffd}', .. })
    ));
}

#[test]
fn test_blank_lines_and_crlf() {
    let tokens = tokenize("a\r\n\r\n  \t\r\n  b\r\n").unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::line("a"),
            Token::indent(),
            Token::line("b"),
            Token::unindent(),
            Token::end_of_input(),
        ]
    );
}

#[test]
fn test_custom_annotation_marker() {
    let options = ScanOptions::new().with_annotation_marker(';');
    let tokens = serde_teff::tokenize_with_options(";; comment\n# content\n", &options).unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::annotation("; comment"),
            Token::line("# content"),
            Token::end_of_input(),
        ]
    );
}

#[test]
fn test_empty_input() {
    assert_eq!(tokenize("").unwrap(), vec![Token::end_of_input()]);
    assert_eq!(tokenize("\n\n   \n").unwrap(), vec![Token::end_of_input()]);
}

#[test]
fn test_tree_round_trip() {
    let text = "config\n\tname\n\t\tdemo\n\tports\n\t\t80\n\t\t443\nend\n";
    let list = parse(text).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].children[1].children, vec![TextNode::new("80"), TextNode::new("443")]);
    assert_eq!(render(&list, &RenderOptions::default()), text);
}

#[test]
fn test_tree_keeps_children_around_outdented_annotation() {
    let list = parse("ports\n\t80\n\t443\n# tls below\n\t8443\nend\n").unwrap();
    assert_eq!(
        list,
        vec![
            TextNode::with_children(
                "ports",
                vec![TextNode::new("80"), TextNode::new("443"), TextNode::new("8443")]
            ),
            TextNode::new("end"),
        ]
    );
    assert_eq!(
        render(&list, &RenderOptions::default()),
        "ports\n\t80\n\t443\n\t8443\nend\n"
    );
}

#[test]
fn test_tree_json_snapshot() {
    let list = parse("a\n  b\nc\n").unwrap();
    let json = serde_json::to_string(&list).unwrap();
    assert_eq!(
        json,
        r#"[{"value":"a","children":[{"value":"b"}]},{"value":"c"}]"#
    );
}
