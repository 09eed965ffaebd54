//! Abstract syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Statements and expressions are closed sum types.  Every node owns its
//! children and its text (identifiers and string constants are copied out of
//! the token buffer), so a tree outlives the buffer it was parsed from.

use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// How a [`Expression::Name`] resolves its identifier at run time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    #[serde(transparent)]
    pub struct NameFlags: u32 {
        /// Evaluates to the variable's value.
        const BY_VALUE = 1 << 0;
        /// Evaluates to a reference to the variable.
        const BY_REFERENCE = 1 << 1;
        /// Look in the local namespace only.
        const LOCAL_ONLY = 1 << 2;
        /// Create the variable if it does not exist.
        const NEW_VARIABLE = 1 << 3;
        /// The variable must not exist yet.
        const NOT_IN_SCOPE = 1 << 4;
    }
}

impl Default for NameFlags {
    fn default() -> Self {
        NameFlags::BY_VALUE
    }
}

/// Operator tags.
///
/// `Call`, `Array`, `Dictionary` and `Parenthesis` only occur while locating
/// the outermost operator of a token range; they never appear inside an
/// [`Expression::Operator`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    PlusAssign,
    MinusAssign,
    MultiplyAssign,
    DivideAssign,
    ModuloAssign,
    Or,
    And,
    Not,
    In,
    Equal,
    NotEqual,
    Less,
    Greater,
    Leq,
    Geq,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Member,
    Call,
    Index,
    Slice,
    Array,
    Dictionary,
    Parenthesis,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::PlusAssign => "+=",
            Operator::MinusAssign => "-=",
            Operator::MultiplyAssign => "*=",
            Operator::DivideAssign => "/=",
            Operator::ModuloAssign => "%=",
            Operator::Or => "or",
            Operator::And => "and",
            Operator::Not => "not",
            Operator::In => "in",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::Leq => "<=",
            Operator::Geq => ">=",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Member => ".",
            Operator::Call => "call",
            Operator::Index => "index",
            Operator::Slice => "slice",
            Operator::Array => "array",
            Operator::Dictionary => "dict",
            Operator::Parenthesis => "()",
        }
    }

    /// The left operand is assigned to, so it must evaluate to a reference.
    pub fn left_operand_by_reference(self) -> bool {
        matches!(
            self,
            Operator::PlusAssign
                | Operator::MinusAssign
                | Operator::MultiplyAssign
                | Operator::DivideAssign
                | Operator::ModuloAssign
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BuiltIn {
    /// `len(x)`
    Length,
    /// `dictkeys(d)`
    DictionaryKeys,
    /// `dictvalues(d)`
    DictionaryValues,
}

impl BuiltIn {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "len" => Some(BuiltIn::Length),
            "dictkeys" => Some(BuiltIn::DictionaryKeys),
            "dictvalues" => Some(BuiltIn::DictionaryValues),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltIn::Length => "len",
            BuiltIn::DictionaryKeys => "dictkeys",
            BuiltIn::DictionaryValues => "dictvalues",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constant {
    None,
    True,
    False,
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    Constant(Constant),

    /// Variable reference.
    Name { identifier: String, flags: NameFlags },

    Array(Vec<Expression>),

    /// Ordered `key: value` pairs.
    Dictionary(Vec<(Expression, Expression)>),

    /// Unary operators have no `left` operand.
    Operator {
        op: Operator,
        left: Option<Box<Expression>>,
        right: Box<Expression>,
    },

    /// `arguments[0]` is always the [`Expression::Dictionary`] of named
    /// arguments (possibly empty); positional arguments follow in order.
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },

    /// Same argument layout as [`Expression::Call`].
    BuiltIn {
        kind: BuiltIn,
        arguments: Vec<Expression>,
    },
}

impl Expression {
    pub fn none() -> Self {
        Expression::Constant(Constant::None)
    }

    pub fn text<S: Into<String>>(text: S) -> Self {
        Expression::Constant(Constant::Text(text.into()))
    }

    pub fn unary(op: Operator, operand: Expression) -> Self {
        Expression::Operator {
            op,
            left: None,
            right: Box::new(operand),
        }
    }

    pub fn binary(op: Operator, left: Expression, right: Expression) -> Self {
        Expression::Operator {
            op,
            left: Some(Box::new(left)),
            right: Box::new(right),
        }
    }

    /// The identifier, if this is a plain name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Expression::Name { identifier, .. } => Some(identifier),
            _ => None,
        }
    }
}

/// An ordered sequence of statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Compound {
    statements: Vec<Statement>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }
}

impl<'a> IntoIterator for &'a Compound {
    type Item = &'a Statement;
    type IntoIter = std::slice::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JumpKind {
    Continue,
    Break,
    Return,
}

/// One `if`/`elif` branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    pub condition: Expression,
    pub compound: Compound,
}

/// A `def` argument, with its optional default value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Argument {
    pub name: String,
    pub default: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    Expression(Expression),

    Print(Vec<Expression>),

    If {
        branches: Vec<Branch>,
        else_compound: Option<Compound>,
    },

    While {
        condition: Expression,
        compound: Compound,
    },

    For {
        iterator: Expression,
        iterable: Expression,
        compound: Compound,
    },

    /// `continue`, `break [count]`, `return [value]`.
    Jump {
        kind: JumpKind,
        value: Option<Expression>,
    },

    /// `target[i]...[j] = value` or `target := value`.
    Assign {
        target: Expression,
        indices: Vec<Expression>,
        value: Expression,
    },

    Function {
        name: Expression,
        arguments: Vec<Argument>,
        compound: Compound,
    },
}
