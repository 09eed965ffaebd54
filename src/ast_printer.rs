use crate::ast::{Compound, Constant, Expression, JumpKind, NameFlags, Operator, Statement};

use std::fmt::Write;

/// Largest magnitude printed through the integer path.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

const INDENT: &str = "  ";

/// Renders expressions in parenthesised prefix form, e.g. `(- (- a b) c)`,
/// and statements as indented blocks closed by `end`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expression) -> String {
        match expr {
            // ── constants ───────────────────────────────────────────────
            Expression::Constant(constant) => match constant {
                Constant::None => "None".into(),

                Constant::True => "True".into(),

                Constant::False => "False".into(),

                Constant::Text(s) => format!("{:?}", s),

                Constant::Number(n) => Self::print_number(*n),
            },

            // ── names ───────────────────────────────────────────────────
            Expression::Name { identifier, .. } => identifier.clone(),

            // ── containers ──────────────────────────────────────────────
            Expression::Array(items) => Self::parenthesize("array", items.iter()),

            Expression::Dictionary(entries) => {
                let mut s = String::from("(dict");
                for (key, value) in entries {
                    let _ = write!(s, " (: {} {})", Self::print(key), Self::print(value));
                }
                s.push(')');
                s
            }

            // ── operators ───────────────────────────────────────────────
            Expression::Operator {
                op,
                left: None,
                right,
            } => format!("({} {})", op.as_str(), Self::print(right)),

            Expression::Operator {
                op,
                left: Some(left),
                right,
            } => format!(
                "({} {} {})",
                op.as_str(),
                Self::print(left),
                Self::print(right)
            ),

            // ── calls ───────────────────────────────────────────────────
            Expression::Call { callee, arguments } => {
                let mut s = format!("(call {}", Self::print(callee));
                Self::push_arguments(&mut s, arguments);
                s.push(')');
                s
            }

            Expression::BuiltIn { kind, arguments } => {
                let mut s = format!("({}", kind.as_str());
                Self::push_arguments(&mut s, arguments);
                s.push(')');
                s
            }
        }
    }

    /// One statement per line; nested compounds are indented.
    pub fn print_compound(compound: &Compound) -> String {
        let mut out = String::new();
        Self::write_compound(&mut out, compound, 0);
        out
    }

    pub fn print_statement(statement: &Statement) -> String {
        let mut out = String::new();
        Self::write_statement(&mut out, statement, 0);
        out
    }

    fn print_number(n: f64) -> String {
        if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER {
            // 3.0 → 3
            itoa::Buffer::new().format(n as i64).to_owned()
        } else {
            n.to_string()
        }
    }

    fn parenthesize<'e>(name: &str, exprs: impl Iterator<Item = &'e Expression>) -> String {
        let mut s = format!("({}", name);
        for expr in exprs {
            s.push(' ');
            s.push_str(&Self::print(expr));
        }
        s.push(')');
        s
    }

    /// Named arguments are shown only when present.
    fn push_arguments(s: &mut String, arguments: &[Expression]) {
        for (i, arg) in arguments.iter().enumerate() {
            if i == 0 && matches!(arg, Expression::Dictionary(entries) if entries.is_empty()) {
                continue;
            }
            s.push(' ');
            s.push_str(&Self::print(arg));
        }
    }

    fn write_compound(out: &mut String, compound: &Compound, depth: usize) {
        for statement in compound {
            Self::write_statement(out, statement, depth);
        }
    }

    fn write_line(out: &mut String, depth: usize, line: &str) {
        for _ in 0..depth {
            out.push_str(INDENT);
        }
        out.push_str(line);
        out.push('\n');
    }

    fn write_statement(out: &mut String, statement: &Statement, depth: usize) {
        match statement {
            Statement::Expression(expr) => Self::write_line(out, depth, &Self::print(expr)),

            Statement::Print(args) => {
                Self::write_line(out, depth, &Self::parenthesize("print", args.iter()))
            }

            Statement::If {
                branches,
                else_compound,
            } => {
                for (i, branch) in branches.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { "elif" };
                    Self::write_line(
                        out,
                        depth,
                        &format!("{} {}:", keyword, Self::print(&branch.condition)),
                    );
                    Self::write_compound(out, &branch.compound, depth + 1);
                }
                if let Some(compound) = else_compound {
                    Self::write_line(out, depth, "else:");
                    Self::write_compound(out, compound, depth + 1);
                }
                Self::write_line(out, depth, "end");
            }

            Statement::While {
                condition,
                compound,
            } => {
                Self::write_line(out, depth, &format!("while {}:", Self::print(condition)));
                Self::write_compound(out, compound, depth + 1);
                Self::write_line(out, depth, "end");
            }

            Statement::For {
                iterator,
                iterable,
                compound,
            } => {
                Self::write_line(
                    out,
                    depth,
                    &format!("for {} in {}:", Self::print(iterator), Self::print(iterable)),
                );
                Self::write_compound(out, compound, depth + 1);
                Self::write_line(out, depth, "end");
            }

            Statement::Jump { kind, value } => {
                let keyword = match kind {
                    JumpKind::Continue => "continue",
                    JumpKind::Break => "break",
                    JumpKind::Return => "return",
                };
                let line = match value {
                    Some(value) => format!("({} {})", keyword, Self::print(value)),
                    None => format!("({})", keyword),
                };
                Self::write_line(out, depth, &line);
            }

            Statement::Assign {
                target,
                indices,
                value,
            } => {
                // `:=` is the only form that may reach beyond the local scope.
                let bound = match target {
                    Expression::Operator {
                        op: Operator::Member,
                        right,
                        ..
                    } => right.as_ref(),
                    _ => target,
                };
                let op = match bound {
                    Expression::Name { flags, .. } if !flags.contains(NameFlags::LOCAL_ONLY) => ":=",
                    _ => "=",
                };
                let mut lvalue = Self::print(target);
                for index in indices {
                    let _ = write!(lvalue, "[{}]", Self::print(index));
                }
                Self::write_line(
                    out,
                    depth,
                    &format!("({} {} {})", op, lvalue, Self::print(value)),
                );
            }

            Statement::Function {
                name,
                arguments,
                compound,
            } => {
                let params: Vec<String> = arguments
                    .iter()
                    .map(|arg| match &arg.default {
                        Some(default) => format!("{}={}", arg.name, Self::print(default)),
                        None => arg.name.clone(),
                    })
                    .collect();
                Self::write_line(
                    out,
                    depth,
                    &format!("def {}({}):", Self::print(name), params.join(", ")),
                );
                Self::write_compound(out, compound, depth + 1);
                Self::write_line(out, depth, "end");
            }
        }
    }
}
