/*!
Expression parsing by **lowest-operator splitting**
===================================================

Instead of consuming tokens left to right, every expression is parsed from a
complete [`TokenRange`]:

1. Strip parentheses that enclose the whole range.
2. [`find_lowest_operator`] scans the range once and picks the operator that
   binds *last* (lowest rank; ties broken by associativity).
3. The range is split around that operator and both sides are parsed
   recursively.  With no operator left, the range is a single literal or name.

### Ranks (ascending)

| Rank | Operators                      | Direction      |
|-----:|--------------------------------|----------------|
| 0    | `+= -= *= /= %=`               | right‑to‑left  |
| 1    | `or`                           | left‑to‑right  |
| 2    | `and`                          | left‑to‑right  |
| 3    | `not`                          | right‑to‑left  |
| 4    | `in`                           | left‑to‑right  |
| 5    | `== !=`                        | left‑to‑right  |
| 6    | `< > <= >=`                    | left‑to‑right  |
| 9    | `+ -`                          | left‑to‑right  |
| 10   | `* / %`                        | left‑to‑right  |
| 11   | unary `+ -`                    | right‑to‑left  |
| 13   | `.` member                     | left‑to‑right  |
| 14   | call `f(..)`, index, slice     | left‑to‑right  |
| max  | array `[..]`, dictionary `{..}`| left‑to‑right  |

For left‑to‑right operators the *rightmost* of equal rank wins, so `a - b - c`
splits as `(a - b) - c`.  For right‑to‑left operators the *leftmost* wins.

### Logging Policy

| Location                       | Level   |
|--------------------------------|---------|
| operator chosen for a range    | `debug` |
| per‑token scan decisions       | `trace` |
*/

use crate::ast::{BuiltIn, Constant, Expression, NameFlags, Operator};
use crate::error::{Result, ScriptError};
use crate::token::{self, TokenType};
use crate::token_range::TokenRange;

use log::{debug, trace};
use phf::phf_map;

const MAX_RANK: i32 = i32::MAX;
const RANK_MEMBER: i32 = 13;
const RANK_CALL: i32 = 14;
const RANK_INDEX: i32 = 14;
const RANK_SLICE: i32 = 14;
const RANK_ARRAY: i32 = MAX_RANK - 1;
const RANK_DICTIONARY: i32 = RANK_ARRAY;

/// Added to `+`/`-` when they have no left operand: above `* / %`, below
/// member access and calls.
const UNARY_RANK_BOOST: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    LeftToRight,
    RightToLeft,
}

static RANKINGS: phf::Map<&'static str, (Operator, i32, Direction)> = phf_map! {
    "+="  => (Operator::PlusAssign, 0, Direction::RightToLeft),
    "-="  => (Operator::MinusAssign, 0, Direction::RightToLeft),
    "*="  => (Operator::MultiplyAssign, 0, Direction::RightToLeft),
    "/="  => (Operator::DivideAssign, 0, Direction::RightToLeft),
    "%="  => (Operator::ModuloAssign, 0, Direction::RightToLeft),
    "or"  => (Operator::Or, 1, Direction::LeftToRight),
    "and" => (Operator::And, 2, Direction::LeftToRight),
    "not" => (Operator::Not, 3, Direction::RightToLeft),
    "in"  => (Operator::In, 4, Direction::LeftToRight),
    "=="  => (Operator::Equal, 5, Direction::LeftToRight),
    "!="  => (Operator::NotEqual, 5, Direction::LeftToRight),
    "<"   => (Operator::Less, 6, Direction::LeftToRight),
    ">"   => (Operator::Greater, 6, Direction::LeftToRight),
    "<="  => (Operator::Leq, 6, Direction::LeftToRight),
    ">="  => (Operator::Geq, 6, Direction::LeftToRight),
    "+"   => (Operator::Plus, 9, Direction::LeftToRight),
    "-"   => (Operator::Minus, 9, Direction::LeftToRight),
    "*"   => (Operator::Multiply, 10, Direction::LeftToRight),
    "/"   => (Operator::Divide, 10, Direction::LeftToRight),
    "%"   => (Operator::Modulo, 10, Direction::LeftToRight),
    "."   => (Operator::Member, RANK_MEMBER, Direction::LeftToRight),
};

/// Does a token classified as `previous` complete an operand?  `None` stands
/// for a plain operand token (name, literal).
fn ends_operand(previous: Option<Operator>) -> bool {
    match previous {
        None => true,
        Some(op) => matches!(
            op,
            Operator::Parenthesis
                | Operator::Call
                | Operator::Index
                | Operator::Slice
                | Operator::Array
                | Operator::Dictionary
        ),
    }
}

/// The operator that binds last in a range, with the ranges of its operands.
///
/// `left` is empty for unary operators.  For [`Operator::Index`] and
/// [`Operator::Slice`] `right` is the bracket interior; for
/// [`Operator::Call`] it is the parenthesised argument list; for
/// [`Operator::Array`] and [`Operator::Dictionary`] it starts at the bracket.
#[derive(Debug, Clone, Copy)]
pub struct Split<'a> {
    pub op: Operator,
    pub left: TokenRange<'a>,
    pub right: TokenRange<'a>,
}

/// Locate the lowest‑ranking operator of `range` in a single scan.
///
/// Returns `None` when the range holds no operator outside parentheses.
pub fn find_lowest_operator<'a>(range: TokenRange<'a>) -> Result<Option<Split<'a>>> {
    let mut previous: Option<Operator> = None;
    let mut lowest: Option<Split<'a>> = None;
    let mut lowest_rank: i32 = MAX_RANK;

    let mut i: usize = 0;

    while i < range.size() {
        let mut continue_from: usize = i + 1;
        let follows_operand: bool = i > 0 && ends_operand(previous);
        let text: &str = range.text(i);

        // (operator, rank, direction, may be chosen)
        let (op, rank, direction, candidate) = match text {
            "(" => {
                continue_from = range.closing_bracket(i)? + 1;

                if follows_operand {
                    (Some(Operator::Call), RANK_CALL, Direction::LeftToRight, true)
                } else {
                    // Grouping parentheses are skipped as a whole.
                    (Some(Operator::Parenthesis), MAX_RANK, Direction::LeftToRight, false)
                }
            }

            "[" => {
                continue_from = range.closing_bracket(i)? + 1;

                if follows_operand {
                    if range.between(i + 1, continue_from - 1).has_bracketless(":") {
                        (Some(Operator::Slice), RANK_SLICE, Direction::LeftToRight, true)
                    } else {
                        (Some(Operator::Index), RANK_INDEX, Direction::LeftToRight, true)
                    }
                } else {
                    (Some(Operator::Array), RANK_ARRAY, Direction::LeftToRight, true)
                }
            }

            "{" => {
                continue_from = range.closing_bracket(i)? + 1;

                (Some(Operator::Dictionary), RANK_DICTIONARY, Direction::LeftToRight, true)
            }

            _ => match ranking_of(range, i) {
                Some((op, rank, _)) if matches!(op, Operator::Plus | Operator::Minus) && !follows_operand => {
                    trace!("Unary '{}' at {}", text, i);

                    (Some(op), rank + UNARY_RANK_BOOST, Direction::RightToLeft, true)
                }
                Some((op, rank, direction)) => (Some(op), rank, direction, true),
                None => (None, MAX_RANK, Direction::LeftToRight, false),
            },
        };

        if let Some(op) = op.filter(|_| candidate) {
            let better: bool = match direction {
                Direction::LeftToRight => rank <= lowest_rank,
                Direction::RightToLeft => rank < lowest_rank,
            };

            if better {
                lowest_rank = rank;

                let right: TokenRange<'a> = match op {
                    Operator::Index | Operator::Slice => range.between(i + 1, continue_from - 1),
                    Operator::Call | Operator::Array | Operator::Dictionary => {
                        range.starting_from(i)
                    }
                    _ => range.starting_from(i + 1),
                };

                lowest = Some(Split {
                    op,
                    left: range.ending_to(i),
                    right,
                });
            }
        }

        previous = op;
        i = continue_from;
    }

    if let Some(split) = &lowest {
        debug!(
            "Lowest operator in '{}' is {:?} (rank {})",
            range, split.op, lowest_rank
        );
    }

    Ok(lowest)
}

/// Table entry for an operator or keyword token.
fn ranking_of(range: TokenRange<'_>, pos: usize) -> Option<(Operator, i32, Direction)> {
    match range.token(pos).token_type() {
        TokenType::OPERATOR | TokenType::KEYWORD => RANKINGS.get(range.text(pos)).copied(),
        _ => None,
    }
}

/// Parse a complete expression.  An empty range is the constant `None`.
///
/// `flags` apply to a bare name and are inherited by the right operand of
/// binary operators.
pub fn parse_expression(range: TokenRange<'_>, flags: NameFlags) -> Result<Expression> {
    if range.is_empty() {
        return Ok(Expression::none());
    }

    let mut range: TokenRange<'_> = range;

    // Extra parentheses around the whole range can be ignored.
    while range.begins_with("(") && range.closing_bracket(0)? == range.size() - 1 {
        range = range.shrink(1);
    }

    match find_lowest_operator(range)? {
        None => parse_token_expression(range, flags),
        Some(split) => match split.op {
            Operator::Array => parse_array_expression(range),
            Operator::Dictionary => parse_dictionary_expression(range),
            Operator::Call => parse_call_expression(split.left, split.right),
            op => parse_operator_expression(op, split.left, split.right, flags),
        },
    }
}

/// Parse each `separator`‑delimited segment of `range` as an expression.
pub fn parse_array(range: TokenRange<'_>, separator: &str) -> Result<Vec<Expression>> {
    range
        .split_delimited(separator)
        .map(|segment| parse_expression(segment, NameFlags::BY_VALUE))
        .collect()
}

/// Parse `range` as a name to be bound or assigned: a plain identifier, or a
/// member access ending in one.
pub fn parse_name_expression(range: TokenRange<'_>, flags: NameFlags) -> Result<Expression> {
    let expression: Expression = parse_expression(range, flags)?;

    match expression {
        Expression::Name { .. }
        | Expression::Operator {
            op: Operator::Member,
            ..
        } => Ok(expression),
        _ => Err(ScriptError::syntax(
            "parse_name_expression",
            range.line(),
            format!("'{}' is not a name", range),
        )),
    }
}

fn expect_enclosed(range: TokenRange<'_>, open: &str, context: &'static str, what: &str) -> Result<()> {
    if !range.begins_with(open) || range.closing_bracket(0)? != range.size() - 1 {
        return Err(ScriptError::missing_token(
            context,
            range.line(),
            format!(
                "Expected brackets for the {} beginning at {}",
                what,
                range.describe(0)
            ),
        ));
    }

    Ok(())
}

fn parse_array_expression(range: TokenRange<'_>) -> Result<Expression> {
    expect_enclosed(range, "[", "parse_array_expression", "array expression")?;

    Ok(Expression::Array(parse_array(range.shrink(1), ",")?))
}

fn parse_dictionary_expression(range: TokenRange<'_>) -> Result<Expression> {
    expect_enclosed(range, "{", "parse_dictionary_expression", "dictionary expression")?;

    let mut entries: Vec<(Expression, Expression)> = Vec::new();

    for pair in range.shrink(1).split_delimited(",") {
        let Some(colon) = pair.find_bracketless(":") else {
            return Err(ScriptError::missing_token(
                "parse_dictionary_expression",
                pair.line(),
                format!("Colon is missing from '{}' at {}", pair, pair.describe(0)),
            ));
        };

        let key: Expression = parse_expression(pair.ending_to(colon), NameFlags::BY_VALUE)?;
        let value: Expression = parse_expression(pair.starting_from(colon + 1), NameFlags::BY_VALUE)?;

        entries.push((key, value));
    }

    Ok(Expression::Dictionary(entries))
}

fn parse_call_expression(name: TokenRange<'_>, arguments: TokenRange<'_>) -> Result<Expression> {
    if !arguments.begins_with("(") || arguments.closing_bracket(0)? != arguments.size() - 1 {
        return Err(ScriptError::syntax(
            "parse_call_expression",
            arguments.line(),
            format!(
                "Call arguments must be enclosed in parenthesis for {}",
                arguments.describe(0)
            ),
        ));
    }

    // Named arguments are collected into a dictionary that is always the
    // first argument.
    let mut named: Vec<(Expression, Expression)> = Vec::new();
    let mut positional: Vec<Expression> = Vec::new();

    for clause in arguments.shrink(1).split_delimited(",") {
        if clause.has_bracketless("=") {
            if clause.size() < 3
                || clause.token(0).token_type() != TokenType::IDENTIFIER
                || !clause.equals(1, "=")
            {
                return Err(ScriptError::unexpected_token(
                    "parse_call_expression",
                    clause.line(),
                    format!("Labeled argument '{}' is malformed", clause),
                ));
            }

            let value: Expression = parse_expression(clause.starting_from(2), NameFlags::BY_VALUE)?;

            named.push((Expression::text(clause.text(0)), value));
        } else {
            positional.push(parse_expression(clause, NameFlags::BY_VALUE)?);
        }
    }

    let mut argument_list: Vec<Expression> = Vec::with_capacity(positional.len() + 1);
    argument_list.push(Expression::Dictionary(named));
    argument_list.extend(positional);

    // Built‑ins are usable everywhere and bypass name lookup.
    if name.size() == 1 {
        if let Some(kind) = BuiltIn::from_name(name.text(0)) {
            debug!("Built-in call {}()", kind.as_str());

            return Ok(Expression::BuiltIn {
                kind,
                arguments: argument_list,
            });
        }
    }

    let callee: Expression = parse_expression(name, NameFlags::BY_REFERENCE)?;

    Ok(Expression::Call {
        callee: Box::new(callee),
        arguments: argument_list,
    })
}

fn parse_operator_expression(
    op: Operator,
    left: TokenRange<'_>,
    right: TokenRange<'_>,
    flags: NameFlags,
) -> Result<Expression> {
    if right.is_empty() {
        return Err(ScriptError::missing_token(
            "parse_operator_expression",
            left.line_at(left.size()),
            format!("Expected an operand after '{}'", op.as_str()),
        ));
    }

    if left.is_empty() {
        if !matches!(op, Operator::Plus | Operator::Minus | Operator::Not) {
            return Err(ScriptError::syntax(
                "parse_operator_expression",
                right.line(),
                format!("'{}' needs a left operand", op.as_str()),
            ));
        }

        let operand: Expression = parse_expression(right, NameFlags::BY_VALUE)?;

        return Ok(Expression::unary(op, operand));
    }

    if op == Operator::Not {
        return Err(ScriptError::unexpected_token(
            "parse_operator_expression",
            right.line(),
            format!("'not' cannot follow '{}'", left),
        ));
    }

    let left_flags: NameFlags = if op.left_operand_by_reference() {
        NameFlags::BY_REFERENCE
    } else {
        NameFlags::BY_VALUE
    };

    let left_operand: Expression = parse_expression(left, left_flags)?;
    let right_operand: Expression = if op == Operator::Slice {
        Expression::Array(parse_array(right, ":")?)
    } else {
        parse_expression(right, flags)?
    };

    Ok(Expression::binary(op, left_operand, right_operand))
}

/// A single literal, keyword constant or identifier.
fn parse_token_expression(range: TokenRange<'_>, flags: NameFlags) -> Result<Expression> {
    if range.is_empty() {
        return Err(ScriptError::missing_token(
            "parse_token_expression",
            range.line(),
            format!("Expected tokens, but got nothing -- near line {}", range.line()),
        ));
    }

    if range.size() > 1 {
        return Err(ScriptError::syntax(
            "parse_token_expression",
            range.line_at(1),
            format!(
                "{} cannot follow {} without an operator or ','",
                range.describe(1),
                range.describe(0)
            ),
        ));
    }

    let token_type: TokenType = range.token(0).token_type();
    let text: &str = range.text(0);

    let constant: Constant = match token_type {
        TokenType::KEYWORD if text == "True" => Constant::True,
        TokenType::KEYWORD if text == "False" => Constant::False,
        TokenType::KEYWORD if text == "None" => Constant::None,

        TokenType::IDENTIFIER => {
            return Ok(Expression::Name {
                identifier: text.to_owned(),
                flags,
            });
        }

        TokenType::LITERAL_STRING_APOSTROPHE
        | TokenType::LITERAL_STRING_QUOTED
        | TokenType::LITERAL_STRING_LONG => {
            Constant::Text(token::unescape_string_literal(token_type, text))
        }

        TokenType::LITERAL_NUMBER => match token::parse_number(text) {
            Some(n) => Constant::Number(n),
            None => {
                return Err(ScriptError::syntax(
                    "parse_token_expression",
                    range.line(),
                    format!("Malformed number {}", range.describe(0)),
                ));
            }
        },

        _ => {
            return Err(ScriptError::unexpected_token(
                "parse_token_expression",
                range.line(),
                format!(
                    "{} which was identified as {} was unexpected",
                    range.describe(0),
                    token_type
                ),
            ));
        }
    };

    Ok(Expression::Constant(constant))
}
