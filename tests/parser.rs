#[cfg(test)]
mod parser_tests {
    use haw_script as haw;

    use haw::ast::*;
    use haw::ast_printer::AstPrinter;
    use haw::error::{Result, ScriptError};
    use haw::parser::Parser;

    fn parse(source: &str) -> Result<Compound> {
        Parser::new().parse(source)
    }

    fn only_statement(source: &str) -> Statement {
        let script = parse(source).unwrap();
        assert_eq!(script.len(), 1, "expected one statement in {:?}", source);
        script.statements()[0].clone()
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

    #[test]
    fn test_empty_script() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("# nothing here\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_simple_statements() {
        let script = parse("a = 1; print a, 'x'\nf(a)\n").unwrap();

        assert_eq!(script.len(), 3);
        assert!(matches!(script.statements()[0], Statement::Assign { .. }));
        assert!(matches!(&script.statements()[1], Statement::Print(args) if args.len() == 2));
        assert!(matches!(
            script.statements()[2],
            Statement::Expression(Expression::Call { .. })
        ));
    }

    #[test]
    fn test_inline_for() {
        let statement = only_statement("for x in [1,2,3]: print(x)\n");

        let Statement::For {
            iterator,
            iterable,
            compound,
        } = statement
        else {
            panic!("expected a for statement");
        };

        assert_eq!(
            iterator,
            name(
                "x",
                NameFlags::BY_REFERENCE | NameFlags::NEW_VARIABLE | NameFlags::LOCAL_ONLY
            )
        );
        assert_eq!(
            iterable,
            Expression::Array(vec![number(1.0), number(2.0), number(3.0)])
        );
        assert_eq!(compound.len(), 1);
        assert_eq!(
            compound.statements()[0],
            Statement::Print(vec![name("x", NameFlags::BY_VALUE)])
        );
    }

    #[test]
    fn test_block_if_elif_else() {
        let source = "\
if a == 1
  print 'one'
elif a == 2
  print 'two'
  print 'again'
else
  print 'many'
end
print 'after'
";
        let script = parse(source).unwrap();
        assert_eq!(script.len(), 2);

        let Statement::If {
            branches,
            else_compound,
        } = &script.statements()[0]
        else {
            panic!("expected an if statement");
        };

        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].compound.len(), 1);
        assert_eq!(branches[1].compound.len(), 2);
        assert_eq!(else_compound.as_ref().map(Compound::len), Some(1));
        assert!(matches!(branches[1].condition, Expression::Operator { op: Operator::Equal, .. }));
    }

    #[test]
    fn test_inline_if_branches() {
        let script =
            parse("if a: print a\nelif b: print b\nelse: print c\nend\nprint d\n").unwrap();

        assert_eq!(script.len(), 2);
        assert!(matches!(
            &script.statements()[0],
            Statement::If { branches, else_compound: Some(_) } if branches.len() == 2
        ));
    }

    #[test]
    fn test_if_without_end() {
        assert!(matches!(parse("if True"), Err(ScriptError::MissingToken { .. })));
        assert!(matches!(parse("if a:\n  b\n"), Err(ScriptError::MissingToken { .. })));
    }

    #[test]
    fn test_inline_if_needs_end() {
        assert!(parse("if a: b\nend\n").is_ok());
        assert!(matches!(
            parse("if a: b\nc\n"),
            Err(ScriptError::UnexpectedToken { .. })
        ));
        assert!(matches!(parse("if a: b"), Err(ScriptError::MissingToken { .. })));
    }

    #[test]
    fn test_if_without_condition() {
        assert!(matches!(parse("if: a"), Err(ScriptError::MissingToken { .. })));
    }

    #[test]
    fn test_while_block() {
        let statement = only_statement("while x < 3\n  x += 1\nend\n");

        let Statement::While {
            condition,
            compound,
        } = statement
        else {
            panic!("expected a while statement");
        };

        assert!(matches!(condition, Expression::Operator { op: Operator::Less, .. }));
        assert!(matches!(
            compound.statements()[0],
            Statement::Expression(Expression::Operator {
                op: Operator::PlusAssign,
                ..
            })
        ));
    }

    #[test]
    fn test_block_terminated_by_wrong_keyword() {
        assert!(matches!(
            parse("while x\n  print x\nelse\n"),
            Err(ScriptError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse("for x in y\n  print x\nend now\n"),
            Err(ScriptError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_stray_terminators() {
        assert!(matches!(parse("end"), Err(ScriptError::UnexpectedToken { .. })));
        assert!(matches!(parse("a = 1\nelse"), Err(ScriptError::UnexpectedToken { .. })));
    }

    #[test]
    fn test_nested_blocks() {
        let source = "\
for i in range
  if i: break
  end
  while i
    i -= 1
  end
end
";
        let Statement::For { compound, .. } = only_statement(source) else {
            panic!("expected a for statement");
        };

        assert_eq!(compound.len(), 2);
        assert!(matches!(compound.statements()[0], Statement::If { .. }));
        assert!(matches!(compound.statements()[1], Statement::While { .. }));
    }

    #[test]
    fn test_for_without_in() {
        assert!(matches!(parse("for x\nend"), Err(ScriptError::MissingToken { .. })));
        assert!(matches!(parse("for x in: a"), Err(ScriptError::MissingToken { .. })));
        assert!(matches!(parse("for 1 in y: a"), Err(ScriptError::Syntax { .. })));
    }

    #[test]
    fn test_function_definition() {
        let statement = only_statement("def add(a, b = 2)\n  return a + b\nend\n");

        let Statement::Function {
            name: function,
            arguments,
            compound,
        } = statement
        else {
            panic!("expected a function definition");
        };

        assert_eq!(
            function,
            name(
                "add",
                NameFlags::LOCAL_ONLY | NameFlags::BY_REFERENCE | NameFlags::NOT_IN_SCOPE
            )
        );
        assert_eq!(
            arguments,
            vec![
                Argument {
                    name: "a".into(),
                    default: None
                },
                Argument {
                    name: "b".into(),
                    default: Some(number(2.0))
                },
            ]
        );
        assert!(matches!(
            compound.statements()[0],
            Statement::Jump {
                kind: JumpKind::Return,
                value: Some(_)
            }
        ));
    }

    #[test]
    fn test_function_argument_errors() {
        assert!(matches!(
            parse("def f(1,2):\nend"),
            Err(ScriptError::UnexpectedToken { .. })
        ));
        assert!(matches!(parse("def f\nend"), Err(ScriptError::MissingToken { .. })));
        assert!(matches!(parse("def (a): b"), Err(ScriptError::Syntax { .. })));
    }

    #[test]
    fn test_assignment_with_indices() {
        let statement = only_statement("a[1][i + 1] = 3");

        assert_eq!(
            statement,
            Statement::Assign {
                target: name(
                    "a",
                    NameFlags::NEW_VARIABLE | NameFlags::BY_REFERENCE | NameFlags::LOCAL_ONLY
                ),
                indices: vec![
                    number(1.0),
                    Expression::binary(
                        Operator::Plus,
                        name("i", NameFlags::BY_VALUE),
                        number(1.0)
                    ),
                ],
                value: number(3.0),
            }
        );
    }

    #[test]
    fn test_global_assignment() {
        let Statement::Assign { target, .. } = only_statement("b := f(x = 1)") else {
            panic!("expected an assignment");
        };

        assert_eq!(
            target,
            name("b", NameFlags::NEW_VARIABLE | NameFlags::BY_REFERENCE)
        );
    }

    #[test]
    fn test_assignment_errors() {
        assert!(matches!(parse("x ="), Err(ScriptError::MissingToken { .. })));
        assert!(matches!(parse("1 = 2"), Err(ScriptError::Syntax { .. })));
        assert!(matches!(parse("= 2"), Err(ScriptError::Syntax { .. })));
    }

    #[test]
    fn test_jump_statements() {
        let script = parse("break\nbreak 2\nreturn\ncontinue\n").unwrap();

        assert_eq!(
            script.statements(),
            &[
                Statement::Jump {
                    kind: JumpKind::Break,
                    value: None
                },
                Statement::Jump {
                    kind: JumpKind::Break,
                    value: Some(number(2.0))
                },
                Statement::Jump {
                    kind: JumpKind::Return,
                    value: None
                },
                Statement::Jump {
                    kind: JumpKind::Continue,
                    value: None
                },
            ]
        );

        assert!(matches!(parse("continue 1"), Err(ScriptError::UnexpectedToken { .. })));
    }

    #[test]
    fn test_call_with_adjacent_arguments() {
        assert!(matches!(parse("f(1 2)"), Err(ScriptError::Syntax { .. })));
    }

    #[test]
    fn test_lex_errors_propagate() {
        assert!(matches!(
            parse("a = 1\nprint 'abc"),
            Err(ScriptError::Lex { line: 2, .. })
        ));
    }

    #[test]
    fn test_error_reports_line() {
        let error = parse("a = 1\nb = 2\nwhile\n").unwrap_err();

        assert_eq!(error.line(), Some(3));
    }

    #[test]
    fn test_parser_is_reusable() {
        let source = "for i in [1, 2]\n  print i * 2\nend\nx = {'k': i}\n";
        let mut parser = Parser::new();

        let first = parser.parse(source).unwrap();
        assert!(parser.tokens().is_empty());

        assert!(parser.parse("if True").is_err());
        assert!(parser.tokens().is_empty());

        let second = parser.parse(source).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_printed_tree() {
        let script = parse("for x in [1, 2, 3]: print x\nif a\n  b := -a\nend\n").unwrap();

        assert_eq!(
            AstPrinter::print_compound(&script),
            "\
for x in (array 1 2 3):
  (print x)
end
if a:
  (:= b (- a))
end
"
        );
    }

    #[test]
    fn test_json_tree() {
        let script = parse("print 1").unwrap();
        let json = serde_json::to_value(&script).unwrap();

        assert_eq!(
            json,
            serde_json::json!([{ "Print": [{ "Constant": { "Number": 1.0 } }] }])
        );
    }
}
