/*!
Statement parser
================

The [`Parser`] pulls one statement at a time from the [`Scanner`] into its
[`TokenBuffer`] and turns it into a [`Statement`].  Expressions inside a
statement are handed to [`crate::expression`].

Grammar (one statement per line or `;`):

```text
compound       → statement* ;
statement      → ifStmt | whileStmt | forStmt | defStmt
               | "continue" | "break" expr? | "return" expr?
               | "print" args | assignStmt | expr ;
ifStmt         → "if" expr body ( "elif" expr body )* ( "else" body )? "end" ;
whileStmt      → "while" expr body ;
forStmt        → "for" name "in" expr body ;
defStmt        → "def" name "(" ( IDENT ( "=" expr )? ),* ")" body ;
assignStmt     → name ( "[" expr "]" )* ( "=" | ":=" ) expr ;
body           → ":" statement                    (inline form)
               | ":"? NEWLINE compound "end"       (block form)
```

An `if` is always closed by `end`, whichever form its branches use;
`elif`, `else` and `end` terminate the compound before them and are left for
the enclosing statement to inspect.

### Logging Policy

| Location                   | Level   |
|----------------------------|---------|
| `Parser::new`, `parse`     | `info`  |
| statement dispatch         | `debug` |
| statement boundaries       | `debug` |
*/

use crate::ast::{Argument, Branch, Compound, Expression, JumpKind, NameFlags, Statement};
use crate::error::{Result, ScriptError};
use crate::expression::{parse_array, parse_expression, parse_name_expression};
use crate::scanner::Scanner;
use crate::token::TokenType;
use crate::token_buffer::TokenBuffer;
use crate::token_range::TokenRange;

use bitflags::bitflags;
use log::{debug, info};
use std::collections::VecDeque;

bitflags! {
    /// Options for [`Parser::parse_conditional_compound`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct CompoundFlags: u8 {
        /// The keyword is followed by a condition expression.
        const HAS_CONDITION = 1 << 0;
        /// Tokens between the keyword and the colon were already parsed.
        const IGNORE_EXTRA_BEFORE_COLON = 1 << 1;
    }
}

/// How a conditional compound's body was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    /// `kw expr: statement` on one line.
    Inline,
    /// Following lines up to a terminator.
    Block,
}

#[derive(Debug, Clone, Copy)]
enum Dispatch {
    If,
    While,
    For,
    Continue,
    Break,
    Return,
    Print,
    Def,
    Assign,
    Expression,
}

/// Recursive‑descent parser for Haw scripts.
///
/// The parser owns its token buffer; pools are reused across calls to
/// [`Parser::parse`].
#[derive(Debug, Default)]
pub struct Parser {
    analyzer: Scanner,
    tokens: TokenBuffer,

    /// Absolute token bounds of the statement being parsed.
    statement_start: usize,
    statement_end: usize,
}

impl Parser {
    pub fn new() -> Self {
        info!("Parser created");

        Self::default()
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse a whole script into its root compound.
    pub fn parse(&mut self, input: &str) -> Result<Compound> {
        info!("Beginning parse of {} bytes", input.len());

        self.analyzer = Scanner::new(input);

        let result: Result<Compound> = self.parse_script();

        // We're done, free the remaining tokens.
        self.tokens.clear();
        self.statement_start = 0;
        self.statement_end = 0;

        match &result {
            Ok(script) => info!("Parsed {} top-level statement(s)", script.len()),
            Err(e) => info!("Parse failed: {}", e),
        }

        result
    }

    /// The token buffer (empty between parses).
    pub fn tokens(&self) -> &TokenBuffer {
        &self.tokens
    }

    // ─────────────────────── statement plumbing ───────────────────

    fn parse_script(&mut self) -> Result<Compound> {
        let mut script = Compound::new();

        if self.next_statement()? > 0 {
            self.parse_compound(&mut script)?;

            let range: TokenRange<'_> = self.statement();

            if !range.is_empty() {
                return Err(ScriptError::unexpected_token(
                    "Parser::parse",
                    range.line(),
                    format!("{} has no matching block", range.describe(0)),
                ));
            }
        }

        Ok(script)
    }

    /// Fetch the next statement's tokens and make them the current range.
    fn next_statement(&mut self) -> Result<usize> {
        let count: usize = self.analyzer.get_statement(&mut self.tokens)?;

        self.statement_start = 0;
        self.statement_end = self.tokens.len();

        debug!("Next statement: '{}'", self.statement());

        Ok(count)
    }

    fn statement(&self) -> TokenRange<'_> {
        TokenRange::with_bounds(&self.tokens, self.statement_start, self.statement_end)
    }

    /// Line for diagnostics about the current statement.
    fn current_line(&self) -> usize {
        let range: TokenRange<'_> = self.statement();

        if range.is_empty() {
            self.analyzer.line()
        } else {
            range.line()
        }
    }

    fn is_terminator(range: TokenRange<'_>) -> bool {
        range.is_empty()
            || range.begins_with("elif")
            || range.begins_with("else")
            || range.begins_with("end")
    }

    /// Parse statements into `compound` until the input ends or a statement
    /// beginning with `elif`, `else` or `end` is reached.  The terminator is
    /// not consumed.
    fn parse_compound(&mut self, compound: &mut Compound) -> Result<()> {
        while !Self::is_terminator(self.statement()) {
            self.parse_statement(compound)?;
        }

        Ok(())
    }

    /// Parse the current statement into `compound` and advance past it.
    fn parse_statement(&mut self, compound: &mut Compound) -> Result<()> {
        let range: TokenRange<'_> = self.statement();

        let dispatch: Dispatch = match range.first_text() {
            "if" => Dispatch::If,
            "while" => Dispatch::While,
            "for" => Dispatch::For,
            "continue" => Dispatch::Continue,
            "break" => Dispatch::Break,
            "return" => Dispatch::Return,
            "print" => Dispatch::Print,
            "def" => Dispatch::Def,
            _ if range.has_bracketless("=") || range.has_bracketless(":=") => Dispatch::Assign,
            _ => Dispatch::Expression,
        };

        debug!("Parsing {:?} statement on line {}", dispatch, range.line());

        let statement: Statement = match dispatch {
            Dispatch::If => self.parse_if_statement()?,
            Dispatch::While => self.parse_while_statement()?,
            Dispatch::For => self.parse_for_statement()?,
            Dispatch::Def => self.parse_function_statement()?,
            Dispatch::Continue => self.parse_jump_statement(JumpKind::Continue)?,
            Dispatch::Break => self.parse_jump_statement(JumpKind::Break)?,
            Dispatch::Return => self.parse_jump_statement(JumpKind::Return)?,
            Dispatch::Print => self.parse_print_statement()?,
            Dispatch::Assign => self.parse_assign_statement()?,
            Dispatch::Expression => self.parse_expression_statement()?,
        };

        compound.add(statement);

        Ok(())
    }

    /// Require a lone `end` and step past it.
    fn expect_end(&mut self, context: &'static str) -> Result<()> {
        let range: TokenRange<'_> = self.statement();

        if range.is_empty() {
            return Err(ScriptError::missing_token(
                context,
                self.current_line(),
                "Expected 'end', but reached the end of the script",
            ));
        }

        if !range.is_single("end") {
            return Err(ScriptError::unexpected_token(
                context,
                range.line(),
                format!("Expected 'end', but got {}", range.describe(0)),
            ));
        }

        self.next_statement()?;

        Ok(())
    }

    /// `keyword [expr] ":" statement` or `keyword [expr] NEWLINE compound`.
    ///
    /// Returns the condition when `HAS_CONDITION` is set.
    fn parse_conditional_compound(
        &mut self,
        compound: &mut Compound,
        flags: CompoundFlags,
    ) -> Result<(Option<Expression>, Form)> {
        let range: TokenRange<'_> = self.statement();

        // See if there is a colon on this line.
        let colon: Option<usize> = range.find_bracketless(":");
        let header_end: usize = colon.unwrap_or(range.size());

        let mut condition: Option<Expression> = None;

        if flags.contains(CompoundFlags::HAS_CONDITION) {
            let condition_range: TokenRange<'_> = range.between(1, header_end);

            if condition_range.is_empty() {
                return Err(ScriptError::missing_token(
                    "Parser::parse_conditional_compound",
                    range.line(),
                    format!(
                        "A condition expression was expected after {}",
                        range.describe(0)
                    ),
                ));
            }

            condition = Some(parse_expression(condition_range, NameFlags::BY_VALUE)?);
        } else if header_end > 1 && !flags.contains(CompoundFlags::IGNORE_EXTRA_BEFORE_COLON) {
            return Err(ScriptError::unexpected_token(
                "Parser::parse_conditional_compound",
                range.line_at(1),
                format!("{} was unexpected", range.describe(1)),
            ));
        }

        let (start, end) = (range.start(), range.end());

        match colon {
            Some(colon) if colon + 1 < range.size() => {
                // The rest of the line is the body.
                self.statement_start = start + colon + 1;
                self.statement_end = end;

                self.parse_statement(compound)?;

                Ok((condition, Form::Inline))
            }
            _ => {
                self.next_statement()?;
                self.parse_compound(compound)?;

                Ok((condition, Form::Block))
            }
        }
    }

    /// A branch that must have a condition.
    fn parse_branch(&mut self) -> Result<(Branch, Form)> {
        let mut compound = Compound::new();
        let line: usize = self.current_line();

        let (condition, form) =
            self.parse_conditional_compound(&mut compound, CompoundFlags::HAS_CONDITION)?;

        let condition: Expression = condition.ok_or_else(|| {
            ScriptError::missing_token("Parser::parse_branch", line, "Missing branch condition")
        })?;

        Ok((
            Branch {
                condition,
                compound,
            },
            form,
        ))
    }

    // ───────────────────────── statement rules ────────────────────

    fn parse_if_statement(&mut self) -> Result<Statement> {
        let mut branches: Vec<Branch> = Vec::new();

        let (branch, _) = self.parse_branch()?;
        branches.push(branch);

        while self.statement().begins_with("elif") {
            let (branch, _) = self.parse_branch()?;
            branches.push(branch);
        }

        let mut else_compound: Option<Compound> = None;

        if self.statement().begins_with("else") {
            let mut compound = Compound::new();
            self.parse_conditional_compound(&mut compound, CompoundFlags::empty())?;

            else_compound = Some(compound);
        }

        // Inline or not, the whole `if` is closed by a lone `end`.
        self.expect_end("Parser::parse_if_statement")?;

        Ok(Statement::If {
            branches,
            else_compound,
        })
    }

    fn parse_while_statement(&mut self) -> Result<Statement> {
        let (branch, form) = self.parse_branch()?;

        if form == Form::Block {
            self.expect_end("Parser::parse_while_statement")?;
        }

        Ok(Statement::While {
            condition: branch.condition,
            compound: branch.compound,
        })
    }

    fn parse_for_statement(&mut self) -> Result<Statement> {
        let range: TokenRange<'_> = self.statement();

        let colon: Option<usize> = range.find_bracketless(":");
        let header: TokenRange<'_> = range.ending_to(colon.unwrap_or(range.size()));

        let Some(in_pos) = header.find_bracketless("in") else {
            return Err(ScriptError::missing_token(
                "Parser::parse_for_statement",
                range.line(),
                format!("Expected 'in' to follow {}", range.describe(0)),
            ));
        };

        let iterable_range: TokenRange<'_> = header.starting_from(in_pos + 1);

        if iterable_range.is_empty() {
            return Err(ScriptError::missing_token(
                "Parser::parse_for_statement",
                range.line(),
                format!("Expected an iterable after {}", range.describe(in_pos)),
            ));
        }

        let iterator: Expression = parse_name_expression(
            header.between(1, in_pos),
            NameFlags::BY_REFERENCE | NameFlags::NEW_VARIABLE | NameFlags::LOCAL_ONLY,
        )?;
        let iterable: Expression = parse_expression(iterable_range, NameFlags::BY_VALUE)?;

        let mut compound = Compound::new();
        let (_, form) = self
            .parse_conditional_compound(&mut compound, CompoundFlags::IGNORE_EXTRA_BEFORE_COLON)?;

        if form == Form::Block {
            self.expect_end("Parser::parse_for_statement")?;
        }

        Ok(Statement::For {
            iterator,
            iterable,
            compound,
        })
    }

    fn parse_function_statement(&mut self) -> Result<Statement> {
        let range: TokenRange<'_> = self.statement();

        let Some(pos) = range.find_bracketless("(") else {
            return Err(ScriptError::missing_token(
                "Parser::parse_function_statement",
                range.line(),
                format!("Expected arguments for {}", range.describe(0)),
            ));
        };

        // The function must have a name that is not already in use in the scope.
        let name: Expression = parse_name_expression(
            range.between(1, pos),
            NameFlags::LOCAL_ONLY | NameFlags::BY_REFERENCE | NameFlags::NOT_IN_SCOPE,
        )?;

        if name.as_name().is_none() {
            return Err(ScriptError::syntax(
                "Parser::parse_function_statement",
                range.line(),
                format!("'{}' is not a valid function name", range.between(1, pos)),
            ));
        }

        let argument_range: TokenRange<'_> = range.between(pos + 1, range.closing_bracket(pos)?);
        let mut arguments: Vec<Argument> = Vec::new();

        for delim in argument_range.split_delimited(",") {
            let is_identifier: bool =
                !delim.is_empty() && delim.token(0).token_type() == TokenType::IDENTIFIER;

            if is_identifier && delim.size() == 1 {
                // Just the name of the argument.
                arguments.push(Argument {
                    name: delim.text(0).to_owned(),
                    default: None,
                });
            } else if is_identifier && delim.size() >= 3 && delim.equals(1, "=") {
                // Argument with a default value.
                arguments.push(Argument {
                    name: delim.text(0).to_owned(),
                    default: Some(parse_expression(delim.starting_from(2), NameFlags::BY_VALUE)?),
                });
            } else {
                return Err(ScriptError::unexpected_token(
                    "Parser::parse_function_statement",
                    argument_range.line(),
                    format!(
                        "'{}' was unexpected in argument definition at {}",
                        delim,
                        argument_range.describe(0)
                    ),
                ));
            }
        }

        let mut compound = Compound::new();
        let (_, form) = self
            .parse_conditional_compound(&mut compound, CompoundFlags::IGNORE_EXTRA_BEFORE_COLON)?;

        if form == Form::Block {
            self.expect_end("Parser::parse_function_statement")?;
        }

        Ok(Statement::Function {
            name,
            arguments,
            compound,
        })
    }

    fn parse_jump_statement(&mut self, kind: JumpKind) -> Result<Statement> {
        let range: TokenRange<'_> = self.statement();
        let argument: TokenRange<'_> = range.starting_from(1);

        let value: Option<Expression> = match kind {
            JumpKind::Continue if !argument.is_empty() => {
                return Err(ScriptError::unexpected_token(
                    "Parser::parse_jump_statement",
                    range.line(),
                    format!("{} was unexpected after 'continue'", argument.describe(0)),
                ));
            }
            // Break may be given how many nested compounds to break out of.
            _ if !argument.is_empty() => Some(parse_expression(argument, NameFlags::BY_VALUE)?),
            _ => None,
        };

        self.next_statement()?;

        Ok(Statement::Jump { kind, value })
    }

    fn parse_print_statement(&mut self) -> Result<Statement> {
        let arguments: Vec<Expression> = parse_array(self.statement().starting_from(1), ",")?;

        self.next_statement()?;

        Ok(Statement::Print(arguments))
    }

    fn parse_assign_statement(&mut self) -> Result<Statement> {
        let range: TokenRange<'_> = self.statement();
        let mut flags: NameFlags =
            NameFlags::NEW_VARIABLE | NameFlags::BY_REFERENCE | NameFlags::LOCAL_ONLY;

        let pos: usize = match range.find_bracketless("=") {
            Some(pos) => pos,
            None => {
                // `:=` may rebind a variable outside the local scope.
                flags.remove(NameFlags::LOCAL_ONLY);

                range.find_bracketless(":=").ok_or_else(|| {
                    ScriptError::missing_token(
                        "Parser::parse_assign_statement",
                        range.line(),
                        format!("Expected '=' or ':=' in '{}'", range),
                    )
                })?
            }
        };

        let value_range: TokenRange<'_> = range.starting_from(pos + 1);

        if value_range.is_empty() {
            return Err(ScriptError::missing_token(
                "Parser::parse_assign_statement",
                range.line(),
                format!("Expected a value after {}", range.describe(pos)),
            ));
        }

        // Trailing `[...]` groups before the delimiter are indices, found
        // right to left.  An error drops the ones already parsed.
        let mut indices: VecDeque<Expression> = VecDeque::new();
        let mut name_end: usize = pos;

        while name_end > 0 && range.equals(name_end - 1, "]") {
            let open: usize = range.opening_bracket(name_end - 1)?;

            indices.push_front(parse_expression(
                range.between(open + 1, name_end - 1),
                NameFlags::BY_VALUE,
            )?);

            name_end = open;
        }

        let target: Expression = parse_name_expression(range.ending_to(name_end), flags)?;
        let value: Expression = parse_expression(value_range, NameFlags::BY_VALUE)?;

        self.next_statement()?;

        Ok(Statement::Assign {
            target,
            indices: indices.into(),
            value,
        })
    }

    fn parse_expression_statement(&mut self) -> Result<Statement> {
        let expression: Expression = parse_expression(self.statement(), NameFlags::BY_VALUE)?;

        self.next_statement()?;

        Ok(Statement::Expression(expression))
    }
}
