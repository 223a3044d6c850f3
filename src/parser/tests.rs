//! Unit tests for the parser module.
//!
//! This module contains tests for parsing:
//! - Let and return statements
//! - Identifier, integer and boolean literals
//! - Prefix and infix operators
//! - Operator precedence through canonical rendering
//! - Call and grouped expressions
//! - Error collection and recovery

use crate::{
    ast::ast::{Expr, Program, Stmt},
    errors::errors::{Error, ErrorImpl},
    lexer::{
        lexer::{tokenize, Lexer, TokenBuffer},
        tokens::TokenKind,
    },
};

use super::{
    lookups::BindingPower,
    parser::{parse, Parser, MAX_NESTING_DEPTH},
};

fn parse_source(source: &str) -> (Program, Vec<Error>) {
    parse(Lexer::new(source.to_string(), Some("test.lang".to_string())))
}

fn parse_ok(source: &str) -> Program {
    let (program, errors) = parse_source(source);
    let messages = errors.iter().map(|error| error.to_string()).collect::<Vec<_>>();
    assert!(errors.is_empty(), "parser errors for {:?}: {:?}", source, messages);
    program
}

fn single_expression(program: &Program) -> &Expr {
    assert_eq!(program.statements.len(), 1, "program: {}", program);
    match &program.statements[0] {
        Stmt::Expression(stmt) => &stmt.expression,
        other => panic!("Expected expression statement, got {:?}", other),
    }
}

fn assert_integer(expr: &Expr, expected: i64) {
    match expr {
        Expr::Integer(integer) => {
            assert_eq!(integer.value, expected);
            assert_eq!(integer.token.literal, expected.to_string());
        }
        other => panic!("Expected integer literal, got {:?}", other),
    }
}

fn assert_identifier(expr: &Expr, expected: &str) {
    match expr {
        Expr::Identifier(ident) => {
            assert_eq!(ident.value, expected);
            assert_eq!(expr.token_literal(), expected);
        }
        other => panic!("Expected identifier, got {:?}", other),
    }
}

#[test]
fn test_let_statements() {
    let program = parse_ok("
        let x = 5;
        let y = 10;
        let foobar = 838383;
    ");

    assert_eq!(program.statements.len(), 3);

    let expected = [("x", 5), ("y", 10), ("foobar", 838383)];
    for (stmt, (name, value)) in program.statements.iter().zip(expected) {
        assert_eq!(stmt.token_literal(), "let");
        match stmt {
            Stmt::Let(let_stmt) => {
                assert_eq!(let_stmt.name.value, name);
                assert_eq!(let_stmt.name.token.literal, name);
                assert_integer(&let_stmt.value, value);
            }
            other => panic!("Expected let statement, got {:?}", other),
        }
    }
}

#[test]
fn test_let_statement_attaches_value_expression() {
    let program = parse_ok("let total = a + b * 2;");

    match &program.statements[0] {
        Stmt::Let(let_stmt) => assert_eq!(let_stmt.value.to_string(), "(a + (b * 2))"),
        other => panic!("Expected let statement, got {:?}", other),
    }
    assert_eq!(program.to_string(), "let total = (a + (b * 2));");
}

#[test]
fn test_return_statements() {
    let program = parse_ok("
        return 5;
        return x;
        return add(x+y);
    ");

    assert_eq!(program.statements.len(), 3);

    for stmt in program.iter() {
        assert_eq!(stmt.token_literal(), "return");
        assert!(matches!(stmt, Stmt::Return(_)));
    }

    assert_eq!(program.to_string(), "return 5;return x;return add((x + y));");
}

#[test]
fn test_identifier_expression() {
    let program = parse_ok("foobar;");
    assert_identifier(single_expression(&program), "foobar");
    assert_eq!(program.statements[0].token_literal(), "foobar");
}

#[test]
fn test_integer_literal_expression() {
    let program = parse_ok("5;");
    let expr = single_expression(&program);

    assert_integer(expr, 5);
    assert_eq!(expr.token_literal(), "5");
}

#[test]
fn test_boolean_expression() {
    for (source, expected) in [("true;", true), ("false", false)] {
        let program = parse_ok(source);
        match single_expression(&program) {
            Expr::Boolean(boolean) => assert_eq!(boolean.value, expected),
            other => panic!("Expected boolean, got {:?}", other),
        }
    }
}

#[test]
fn test_prefix_expressions() {
    let tests = [("!5", "!", 5), ("-10", "-", 10), ("-15;", "-", 15)];

    for (source, operator, value) in tests {
        let program = parse_ok(source);
        match single_expression(&program) {
            Expr::Prefix(prefix) => {
                assert_eq!(prefix.operator, operator);
                assert_eq!(prefix.token.literal, operator);
                assert_integer(&prefix.right, value);
            }
            other => panic!("Expected prefix expression, got {:?}", other),
        }
    }
}

#[test]
fn test_infix_expressions() {
    let tests = [
        ("5 + 5;", 5, "+", 5),
        ("5 - 5;", 5, "-", 5),
        ("5 * 5;", 5, "*", 5),
        ("5 / 5;", 5, "/", 5),
        ("5 > 5;", 5, ">", 5),
        ("5 < 5;", 5, "<", 5),
        ("5 == 5;", 5, "==", 5),
        ("5 != 5;", 5, "!=", 5),
    ];

    for (source, left, operator, right) in tests {
        let program = parse_ok(source);
        match single_expression(&program) {
            Expr::Infix(infix) => {
                assert_integer(&infix.left, left);
                assert_eq!(infix.operator, operator);
                assert_integer(&infix.right, right);
            }
            other => panic!("Expected infix expression, got {:?}", other),
        }
    }
}

#[test]
fn test_operator_precedence() {
    let tests = [
        ("-a * b;", "((-a) * b)"),
        ("!-a;", "(!(-a))"),
        ("a + b + c;", "((a + b) + c)"),
        ("a + b - c;", "((a + b) - c)"),
        ("a * b * c;", "((a * b) * c)"),
        ("a * b / c;", "((a * b) / c)"),
        ("a + b / c;", "(a + (b / c))"),
        ("a + b * c + d / e - f;", "(((a + (b * c)) + (d / e)) - f)"),
        ("3 + 4; -5 * 5;", "(3 + 4)((-5) * 5)"),
        ("5 > 4 == 3 < 4;", "((5 > 4) == (3 < 4))"),
        ("5 < 4 != 3 > 4;", "((5 < 4) != (3 > 4))"),
        ("3 + 4 * 5 == 3 * 1 + 4 * 5;", "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))"),
        ("true == !false", "(true == (!false))"),
        ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)"),
        ("(5 + 5) * 2", "((5 + 5) * 2)"),
        ("-(5 + 5)", "(-(5 + 5))"),
        ("a + add(b * c) + d", "((a + add((b * c))) + d)"),
        ("add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))", "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))"),
        ("add(a + b + c * d / f + g)", "add((((a + b) + ((c * d) / f)) + g))"),
    ];

    for (source, expected) in tests {
        let program = parse_ok(source);
        assert_eq!(program.to_string(), expected, "source: {:?}", source);
    }
}

#[test]
fn test_call_expression() {
    let program = parse_ok("add(1, 2 * 3, 4 + 5);");

    match single_expression(&program) {
        Expr::Call(call) => {
            assert_identifier(&call.function, "add");
            assert_eq!(call.token.literal, "(");
            assert_eq!(call.arguments.len(), 3);
            assert_integer(&call.arguments[0], 1);
            assert_eq!(call.arguments[1].to_string(), "(2 * 3)");
            assert_eq!(call.arguments[2].to_string(), "(4 + 5)");
        }
        other => panic!("Expected call expression, got {:?}", other),
    }
}

#[test]
fn test_call_without_arguments() {
    let program = parse_ok("tick();");

    match single_expression(&program) {
        Expr::Call(call) => assert!(call.arguments.is_empty()),
        other => panic!("Expected call expression, got {:?}", other),
    }
    assert_eq!(program.to_string(), "tick()");
}

#[test]
fn test_statements_without_semicolons() {
    let program = parse_ok("let a = 1\nreturn a\na + 1");

    assert_eq!(program.statements.len(), 3);
    assert_eq!(program.to_string(), "let a = 1;return a;(a + 1)");
}

#[test]
fn test_empty_program() {
    let program = parse_ok("");
    assert!(program.is_empty());
    assert_eq!(program.token_literal(), "");
    assert_eq!(program.to_string(), "");
}

#[test]
fn test_let_missing_identifier() {
    let (program, errors) = parse_source("let = 5;");

    assert_eq!(
        errors[0].get_error(),
        &ErrorImpl::UnexpectedToken {
            expected: TokenKind::Identifier,
            actual: TokenKind::Assign,
        }
    );
    assert_eq!(errors[0].to_string(), "expected next token to be Identifier, got Assign instead");
    // `=` cannot start an expression; the trailing `5;` still parses
    assert_eq!(errors[1].to_string(), "no prefix parse function for Assign found");
    assert_eq!(errors.len(), 2);
    assert_eq!(program.to_string(), "5");
}

#[test]
fn test_let_missing_assign() {
    let (_, errors) = parse_source("let x 5;");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "expected next token to be Assign, got Int instead");
    assert_eq!(errors[0].get_position().0, 6);
}

#[test]
fn test_no_prefix_parse_function() {
    let (program, errors) = parse_source("* 5;");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "no prefix parse function for Asterisk found");
    assert_eq!(program.statements.len(), 1);
}

#[test]
fn test_integer_overflow() {
    let (program, errors) = parse_source("let big = 92233720368547758070;");

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].get_error(),
        &ErrorImpl::IntegerParseError {
            literal: "92233720368547758070".to_string(),
        }
    );
    assert!(errors[0].to_string().contains("92233720368547758070"));
    assert!(program.is_empty());
}

#[test]
fn test_largest_integer() {
    let program = parse_ok("9223372036854775807");
    assert_integer(single_expression(&program), i64::MAX);
}

#[test]
fn test_unclosed_group() {
    let (_, errors) = parse_source("(1 + 2");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "expected next token to be CloseParen, got EOF instead");
}

#[test]
fn test_deep_prefix_nesting_is_rejected() {
    let source = format!("{}1;", "-".repeat(1_000));
    let (_, errors) = parse_source(&source);

    assert!(!errors.is_empty());
    assert_eq!(
        errors[0].get_error(),
        &ErrorImpl::NestingTooDeep {
            limit: MAX_NESTING_DEPTH
        }
    );
    assert_eq!(errors[0].get_position().0, MAX_NESTING_DEPTH as u32);
    assert_eq!(errors[0].to_string(), "expression nested deeper than 100 levels");
}

#[test]
fn test_deep_grouping_is_rejected() {
    let source = format!("{}1{}", "(".repeat(1_000), ")".repeat(1_000));
    let (_, errors) = parse_source(&source);

    assert_eq!(errors[0].get_error_name(), "NestingTooDeep");
    assert_eq!(errors[0].get_position().0, MAX_NESTING_DEPTH as u32);
}

#[test]
fn test_nesting_below_limit_parses() {
    let source = format!("{}1", "-".repeat(MAX_NESTING_DEPTH - 1));
    let program = parse_ok(&source);

    let rendered = program.to_string();
    assert!(rendered.starts_with("(-(-"));
    assert!(rendered.ends_with("1))"));

    let chain = vec!["1"; 50].join(" + ");
    assert_eq!(parse_ok(&chain).statements.len(), 1);
}

#[test]
fn test_long_operator_chain_is_rejected() {
    // "1 + 1 + ..." folds into a left-deep tree as tall as the chain
    let chain = vec!["1"; 1_000].join(" + ");
    let (_, errors) = parse_source(&chain);

    assert_eq!(errors[0].get_error_name(), "NestingTooDeep");
    assert_eq!(errors[0].to_string(), "expression nested deeper than 100 levels");
}

#[test]
fn test_parsing_recovers_after_deep_nesting() {
    let source = format!("{}1; let ok = 1;", "-".repeat(1_000));
    let (program, errors) = parse_source(&source);

    assert!(errors.iter().all(|error| error.get_error_name() == "NestingTooDeep"));
    assert_eq!(
        program.statements.last().map(|stmt| stmt.to_string()),
        Some("let ok = 1;".to_string())
    );
}

#[test]
fn test_illegal_token_in_stream() {
    let (_, errors) = parse_source("let a = @;");

    assert_eq!(errors[0].to_string(), "no prefix parse function for Illegal found");
}

#[test]
fn test_errors_accumulate_in_order() {
    let (program, errors) = parse_source("
        let = 1;
        let y 2;
        let 838383;
        let ok = 3;
    ");

    assert!(errors.len() >= 3);
    assert_eq!(errors[0].to_string(), "expected next token to be Identifier, got Assign instead");
    assert_eq!(errors[2].to_string(), "expected next token to be Assign, got Int instead");

    let positions = errors.iter().map(|error| error.get_position().0).collect::<Vec<_>>();
    let mut sorted = positions.clone();
    sorted.sort();
    assert_eq!(positions, sorted);

    assert!(program.iter().any(|stmt| stmt.to_string() == "let ok = 3;"));
}

#[test]
fn test_parsing_reaches_eof_after_errors() {
    let (program, errors) = parse_source("+ + + 1; let x = 2;");

    assert_eq!(errors.len(), 3);
    assert_eq!(program.to_string(), "1let x = 2;");
}

#[test]
fn test_parser_errors_accessor() {
    let mut parser = Parser::new(Lexer::new("let = 1; )".to_string(), None));
    let program = parser.parse_program();

    assert_eq!(
        parser.error_messages(),
        vec![
            "expected next token to be Identifier, got Assign instead".to_string(),
            "no prefix parse function for Assign found".to_string(),
            "no prefix parse function for CloseParen found".to_string(),
        ]
    );
    // Reading errors does not clear them
    assert_eq!(parser.errors().len(), 3);
    assert_eq!(parser.errors().len(), 3);
    assert_eq!(program.to_string(), "1");
}

#[test]
fn test_parse_from_token_buffer() {
    let tokens = tokenize("let a = 1 + 2;".to_string(), None).unwrap();
    let (program, errors) = parse(TokenBuffer::from(tokens));

    assert!(errors.is_empty());
    assert_eq!(program.to_string(), "let a = (1 + 2);");
}

#[test]
fn test_token_buffer_without_eof() {
    let mut tokens = tokenize("a * b".to_string(), None).unwrap();
    tokens.pop();
    let (program, errors) = parse(TokenBuffer::from(tokens));

    assert!(errors.is_empty());
    assert_eq!(program.to_string(), "(a * b)");
}

#[test]
fn test_lookahead_is_primed() {
    let parser = Parser::new(Lexer::new("let x".to_string(), None));

    assert_eq!(parser.current_token_kind(), TokenKind::Let);
    assert_eq!(parser.peek_token_kind(), TokenKind::Identifier);
    assert_eq!(parser.peek_token().literal, "x");
}

#[test]
fn test_expect_peek_does_not_advance_on_mismatch() {
    let mut parser = Parser::new(Lexer::new("let 5".to_string(), None));

    assert!(parser.expect_peek(TokenKind::Identifier).is_err());
    assert_eq!(parser.current_token_kind(), TokenKind::Let);

    let token = parser.expect_peek(TokenKind::Int).unwrap();
    assert_eq!(token.literal, "5");
    assert_eq!(parser.current_token_kind(), TokenKind::Int);
    assert_eq!(parser.peek_token_kind(), TokenKind::EOF);
}

#[test]
fn test_precedence_table() {
    let parser = Parser::new(Lexer::new(String::new(), None));
    let bp = |kind: TokenKind| parser.get_bp_lookup().get(&kind).copied();

    assert_eq!(bp(TokenKind::Equals), Some(BindingPower::Equals));
    assert_eq!(bp(TokenKind::NotEquals), Some(BindingPower::Equals));
    assert_eq!(bp(TokenKind::LessThan), Some(BindingPower::LessGreater));
    assert_eq!(bp(TokenKind::Plus), Some(BindingPower::Sum));
    assert_eq!(bp(TokenKind::Minus), Some(BindingPower::Sum));
    assert_eq!(bp(TokenKind::Slash), Some(BindingPower::Product));
    assert_eq!(bp(TokenKind::OpenParen), Some(BindingPower::Call));
    assert_eq!(bp(TokenKind::Semicolon), None);

    assert!(BindingPower::Lowest < BindingPower::Equals);
    assert!(BindingPower::Equals < BindingPower::LessGreater);
    assert!(BindingPower::Product < BindingPower::Prefix);
    assert!(BindingPower::Prefix < BindingPower::Call);

    // Unknown kinds fall back to Lowest when used as lookahead
    assert_eq!(parser.peek_precedence(), BindingPower::Lowest);
}
