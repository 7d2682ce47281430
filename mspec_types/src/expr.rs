use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub trait ConstantExpression {
    fn is_constant(&self) -> bool;
}

impl ConstantExpression for Term {
    fn is_constant(&self) -> bool {
        match self {
            Term::Literal(_) => true,
            Term::Variable(_) => false, // Variable references are never constant
            Term::Unary(term) => term.a.is_constant(),
            Term::Binary(term) => term.a.is_constant() && term.b.is_constant(),
            Term::Ternary(term) => {
                term.a.is_constant() && term.b.is_constant() && term.c.is_constant()
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum Term {
    Literal(Literal),
    Variable(VariableLiteral),
    Unary(UnaryTerm),
    Binary(BinaryTerm),
    Ternary(TernaryTerm),
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum Literal {
    Null,
    Bool(bool),
    Numeric(Number),
    /// Hexadecimal literal, kept in its source spelling (`0x0B`).
    Hex(String),
    /// String literal without the surrounding quotes.
    String(String),
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
#[serde(untagged)]
#[serde(expecting = "expected an integer or floating point number")]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{}", v),
            Number::Float(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{:.1}", v),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

/// A (possibly dotted) name reference: `header.messageType`, `items[2]`,
/// or a call-like built-in such as `COUNT(items)`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct VariableLiteral {
    pub name: String,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub args: Option<Vec<Term>>,
    #[serde(default)]
    pub child: Option<Box<VariableLiteral>>,
}

impl VariableLiteral {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
            args: None,
            child: None,
        }
    }

    /// Builds `a.b.c` from its segments.
    pub fn path(segments: &[&str]) -> Self {
        let Some((last, parents)) = segments.split_last() else {
            return VariableLiteral::new("");
        };
        parents
            .iter()
            .rev()
            .fold(VariableLiteral::new(*last), |child, segment| {
                VariableLiteral::new(*segment).with_child(child)
            })
    }

    pub fn with_child(mut self, child: VariableLiteral) -> Self {
        self.child = Some(Box::new(child));
        self
    }

    pub fn with_args(mut self, args: Vec<Term>) -> Self {
        self.args = Some(args);
        self
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    pub fn arg_count(&self) -> usize {
        self.args.as_ref().map(Vec::len).unwrap_or(0)
    }

    /// Dotted rendering of the reference, used in diagnostics.
    pub fn dotted(&self) -> String {
        let mut out = self.name.clone();
        if let Some(index) = self.index {
            out.push_str(&format!("[{}]", index));
        }
        if let Some(child) = &self.child {
            out.push('.');
            out.push_str(&child.dotted());
        }
        out
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOp {
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "()")]
    Parens,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "^")]
    Pow,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "<<")]
    Shl,
    #[serde(rename = ">>")]
    Shr,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }

    /// Shift and bitwise operators.
    pub fn is_bitwise(&self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::Shl | BinaryOp::Shr
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum TernaryOp {
    If,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct UnaryTerm {
    pub op: UnaryOp,
    pub a: Box<Term>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct BinaryTerm {
    pub op: BinaryOp,
    pub a: Box<Term>,
    pub b: Box<Term>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct TernaryTerm {
    pub op: TernaryOp,
    pub a: Box<Term>,
    pub b: Box<Term>,
    pub c: Box<Term>,
}

impl Term {
    pub fn null() -> Self {
        Term::Literal(Literal::Null)
    }

    pub fn boolean(value: bool) -> Self {
        Term::Literal(Literal::Bool(value))
    }

    pub fn int(value: i64) -> Self {
        Term::Literal(Literal::Numeric(Number::Int(value)))
    }

    pub fn float(value: f64) -> Self {
        Term::Literal(Literal::Numeric(Number::Float(value)))
    }

    pub fn hex(text: impl Into<String>) -> Self {
        Term::Literal(Literal::Hex(text.into()))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Term::Literal(Literal::String(value.into()))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(VariableLiteral::new(name))
    }

    pub fn path(segments: &[&str]) -> Self {
        Term::Variable(VariableLiteral::path(segments))
    }

    pub fn call(name: impl Into<String>, args: Vec<Term>) -> Self {
        Term::Variable(VariableLiteral::new(name).with_args(args))
    }

    pub fn unary(op: UnaryOp, a: Term) -> Self {
        Term::Unary(UnaryTerm { op, a: Box::new(a) })
    }

    pub fn binary(op: BinaryOp, a: Term, b: Term) -> Self {
        Term::Binary(BinaryTerm {
            op,
            a: Box::new(a),
            b: Box::new(b),
        })
    }

    pub fn ternary(condition: Term, then: Term, otherwise: Term) -> Self {
        Term::Ternary(TernaryTerm {
            op: TernaryOp::If,
            a: Box::new(condition),
            b: Box::new(then),
            c: Box::new(otherwise),
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Term::Literal(Literal::Null))
    }

    /// Root names of every variable reference in the term, including the
    /// arguments of call-like references.
    pub fn referenced_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut BTreeSet<String>) {
        match self {
            Term::Literal(_) => {}
            Term::Variable(variable) => {
                names.insert(variable.name.clone());
                for arg in variable.args.iter().flatten() {
                    arg.collect_names(names);
                }
            }
            Term::Unary(term) => term.a.collect_names(names),
            Term::Binary(term) => {
                term.a.collect_names(names);
                term.b.collect_names(names);
            }
            Term::Ternary(term) => {
                term.a.collect_names(names);
                term.b.collect_names(names);
                term.c.collect_names(names);
            }
        }
    }
}
