#[cfg(test)]
mod expression_tests {
    use haw_script as haw;

    use haw::ast::*;
    use haw::ast_printer::AstPrinter;
    use haw::error::{Result, ScriptError};
    use haw::expression::*;
    use haw::scanner::Scanner;
    use haw::token::{parse_number, unescape};
    use haw::token_buffer::TokenBuffer;
    use haw::token_range::TokenRange;

    fn lex(source: &str) -> TokenBuffer {
        let mut tokens = TokenBuffer::new();
        Scanner::new(source).get_statement(&mut tokens).unwrap();
        tokens
    }

    fn parse(source: &str) -> Result<Expression> {
        let tokens = lex(source);
        parse_expression(TokenRange::new(&tokens), NameFlags::BY_VALUE)
    }

    fn assert_prefix(source: &str, expected: &str) {
        let expr = parse(source).unwrap();
        assert_eq!(AstPrinter::print(&expr), expected, "source: {:?}", source);
    }

    fn name(identifier: &str, flags: NameFlags) -> Expression {
        Expression::Name {
            identifier: identifier.into(),
            flags,
        }
    }

    fn number(n: f64) -> Expression {
        Expression::Constant(Constant::Number(n))
    }

    // ── operator selection ──────────────────────────────────────────────

    #[test]
    fn test_lowest_operator_single_token() {
        let tokens = lex("x");
        assert!(find_lowest_operator(TokenRange::new(&tokens)).unwrap().is_none());

        let tokens = lex("(a + b)");
        assert!(find_lowest_operator(TokenRange::new(&tokens)).unwrap().is_none());
    }

    #[test]
    fn test_lowest_operator_splits_operands() {
        let tokens = lex("a * b + c");
        let split = find_lowest_operator(TokenRange::new(&tokens))
            .unwrap()
            .unwrap();

        assert_eq!(split.op, Operator::Plus);
        assert_eq!(split.left.as_text(), "a * b");
        assert_eq!(split.right.as_text(), "c");
    }

    #[test]
    fn test_left_associative_chain() {
        assert_prefix("a - b - c", "(- (- a b) c)");
        assert_prefix("a / b * c", "(* (/ a b) c)");
        assert_prefix("a.b.c", "(. (. a b) c)");
    }

    #[test]
    fn test_precedence() {
        assert_prefix("a + b * c", "(+ a (* b c))");
        assert_prefix("(a + b) * c", "(* (+ a b) c)");
        assert_prefix("a < b == c", "(== (< a b) c)");
        assert_prefix("not a and b or c", "(or (and (not a) b) c)");
        assert_prefix("x in [1, 2]", "(in x (array 1 2))");
    }

    #[test]
    fn test_unary_operators() {
        assert_prefix("-a + b", "(+ (- a) b)");
        assert_prefix("a - -b", "(- a (- b))");
        assert_prefix("- - a", "(- (- a))");
        assert_prefix("-a * b", "(* (- a) b)");
        assert_prefix("-f(x)", "(- (call f x))");
        assert_prefix("not not a", "(not (not a))");
    }

    #[test]
    fn test_compound_assignment_binds_right() {
        assert_prefix("a += b += 1", "(+= a (+= b 1))");

        match parse("a += 1").unwrap() {
            Expression::Operator {
                op: Operator::PlusAssign,
                left: Some(left),
                ..
            } => assert_eq!(*left, name("a", NameFlags::BY_REFERENCE)),
            other => panic!("unexpected {:?}", other),
        }
    }

    // ── postfix forms ───────────────────────────────────────────────────

    #[test]
    fn test_index_and_slice() {
        assert_prefix("a[1][2]", "(index (index a 1) 2)");
        assert_prefix("a[1:2]", "(slice a (array 1 2))");
        assert_prefix("a[:]", "(slice a (array None None))");
        assert_prefix("a[b[0:1]]", "(index a (slice b (array 0 1)))");
    }

    #[test]
    fn test_call_arguments() {
        let expr = parse("f(1, x=2)").unwrap();

        assert_eq!(
            expr,
            Expression::Call {
                callee: Box::new(name("f", NameFlags::BY_REFERENCE)),
                arguments: vec![
                    Expression::Dictionary(vec![(Expression::text("x"), number(2.0))]),
                    number(1.0),
                ],
            }
        );

        assert_prefix("f()", "(call f)");
        assert_prefix("obj.method(a)(b)", "(. obj (call (call method a) b))");
    }

    #[test]
    fn test_builtin_calls() {
        assert_prefix("len(a) + 1", "(+ (len a) 1)");

        match parse("dictkeys(d)").unwrap() {
            Expression::BuiltIn { kind, arguments } => {
                assert_eq!(kind, BuiltIn::DictionaryKeys);
                assert_eq!(arguments.len(), 2);
                assert_eq!(arguments[0], Expression::Dictionary(Vec::new()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_containers() {
        assert_prefix("[1, 'two', [3]]", "(array 1 \"two\" (array 3))");
        assert_prefix("{'a': 1, 'b': x + 1}", "(dict (: \"a\" 1) (: \"b\" (+ x 1)))");
        assert_prefix("[]", "(array)");
        assert_prefix("[1, ]", "(array 1 None)");
    }

    // ── literals ────────────────────────────────────────────────────────

    #[test]
    fn test_literals() {
        assert_eq!(parse("True").unwrap(), Expression::Constant(Constant::True));
        assert_eq!(parse("None").unwrap(), Expression::none());
        assert_eq!(parse("0x1F").unwrap(), number(31.0));
        assert_eq!(parse("2.5").unwrap(), number(2.5));
        assert_eq!(parse(r"'a\nb'").unwrap(), Expression::text("a\nb"));
        assert_eq!(parse(r#""\x41""#).unwrap(), Expression::text("A"));
        assert_eq!(parse("'''multi\nline'''").unwrap(), Expression::text("multi\nline"));
        assert_eq!(parse("x").unwrap(), name("x", NameFlags::BY_VALUE));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"tab\tquote\'"), "tab\tquote'");
        assert_eq!(unescape(r"\xZZ"), r"\xZZ");
        assert_eq!(unescape(r"\q"), r"\q");
        assert_eq!(unescape("end\\"), "end\\");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("12"), Some(12.0));
        assert_eq!(parse_number("0xff"), Some(255.0));
        assert_eq!(parse_number("1.25"), Some(1.25));
        assert_eq!(parse_number("0x"), None);
    }

    #[test]
    fn test_empty_range_is_none() {
        let tokens = TokenBuffer::new();
        let expr = parse_expression(TokenRange::new(&tokens), NameFlags::BY_VALUE).unwrap();

        assert_eq!(expr, Expression::none());
    }

    // ── errors ──────────────────────────────────────────────────────────

    #[test]
    fn test_adjacent_operands_are_rejected() {
        assert!(matches!(parse("f(1 2)"), Err(ScriptError::Syntax { .. })));
        assert!(matches!(parse("a b"), Err(ScriptError::Syntax { .. })));
    }

    #[test]
    fn test_missing_operand() {
        assert!(matches!(parse("a +"), Err(ScriptError::MissingToken { .. })));
        assert!(matches!(parse("* a"), Err(ScriptError::Syntax { .. })));
        assert!(matches!(parse("a not b"), Err(ScriptError::UnexpectedToken { .. })));
    }

    #[test]
    fn test_malformed_containers() {
        assert!(matches!(parse("{1: 2, 3}"), Err(ScriptError::MissingToken { .. })));
        assert!(matches!(parse("f(1 = 2)"), Err(ScriptError::UnexpectedToken { .. })));
    }

    #[test]
    fn test_keyword_is_not_an_operand() {
        let error = parse("a + while").unwrap_err();

        assert!(matches!(error, ScriptError::UnexpectedToken { .. }));
        assert!(error.to_string().contains("KEYWORD"));
    }

    #[test]
    fn test_name_expression() {
        let tokens = lex("a.b");
        let target = parse_name_expression(TokenRange::new(&tokens), NameFlags::BY_REFERENCE);
        assert!(target.is_ok());

        let tokens = lex("a + b");
        let target = parse_name_expression(TokenRange::new(&tokens), NameFlags::BY_REFERENCE);
        assert!(matches!(target, Err(ScriptError::Syntax { .. })));
    }
}
