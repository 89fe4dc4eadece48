//! Declarative template metadata.
//!
//! A template is described by its signal counts, input arity, child blocks and a
//! body of statements over a small expression language. The calculator
//! interprets bodies directly, so one engine serves every circuit.

use std::ops::{Add, BitAnd, Div, Mul, Shr, Sub};

use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::field;

/// Index of a template in the circuit's template table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub usize);

/// Affine index formula `offset + Σ stride · local`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub offset: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<(usize, usize)>,
}

impl Address {
    pub fn fixed(offset: usize) -> Self {
        Self {
            offset,
            terms: Vec::new(),
        }
    }

    /// Adds `stride · local` to the formula.
    pub fn plus(mut self, stride: usize, local: usize) -> Self {
        self.terms.push((stride, local));
        self
    }

    pub fn resolve<F: PrimeField>(&self, locals: &[F]) -> Result<usize, FieldError> {
        self.terms.iter().try_fold(self.offset, |acc, &(stride, local)| {
            let index = field::to_index(&locals[local])?;
            stride
                .checked_mul(index)
                .and_then(|step| acc.checked_add(step))
                .ok_or(FieldError::IndexOverflow {
                    offset: acc,
                    stride,
                    index,
                })
        })
    }

    pub(crate) fn locals(&self) -> impl Iterator<Item = usize> + '_ {
        self.terms.iter().map(|&(_, local)| local)
    }
}

impl From<usize> for Address {
    fn from(offset: usize) -> Self {
        Address::fixed(offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Shr,
    BitAnd,
    Eq,
    Lt,
    Pow,
}

impl BinOp {
    pub fn apply<F: PrimeField>(self, a: &F, b: &F) -> Result<F, FieldError> {
        match self {
            BinOp::Add => Ok(field::add(a, b)),
            BinOp::Sub => Ok(field::sub(a, b)),
            BinOp::Mul => Ok(field::mul(a, b)),
            BinOp::Div => field::div(a, b),
            BinOp::Shr => field::shr(a, b),
            BinOp::BitAnd => Ok(field::band(a, b)),
            BinOp::Eq => Ok(field::eq(a, b)),
            BinOp::Lt => Ok(field::lt(a, b)),
            BinOp::Pow => Ok(field::pow(a, b)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Constant(usize),
    /// Signal of the executing component's own window.
    Signal(Address),
    Local(usize),
    /// Signal of a child component that has already completed.
    ChildSignal { child: Address, signal: Address },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn constant(index: usize) -> Self {
        Expr::Constant(index)
    }

    pub fn signal(address: impl Into<Address>) -> Self {
        Expr::Signal(address.into())
    }

    pub fn local(index: usize) -> Self {
        Expr::Local(index)
    }

    pub fn child_signal(child: impl Into<Address>, signal: impl Into<Address>) -> Self {
        Expr::ChildSignal {
            child: child.into(),
            signal: signal.into(),
        }
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn equals(self, rhs: Expr) -> Self {
        Expr::binary(BinOp::Eq, self, rhs)
    }

    pub fn less_than(self, rhs: Expr) -> Self {
        Expr::binary(BinOp::Lt, self, rhs)
    }

    pub fn pow(self, rhs: Expr) -> Self {
        Expr::binary(BinOp::Pow, self, rhs)
    }

    /// Visits every node of the expression tree.
    pub(crate) fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);
        if let Expr::Binary { lhs, rhs, .. } = self {
            lhs.walk(visit);
            rhs.walk(visit);
        }
    }
}

macro_rules! expr_binop {
    ($trait:ident, $method:ident, $op:expr) => {
        impl $trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }
    };
}

expr_binop!(Add, add, BinOp::Add);
expr_binop!(Sub, sub, BinOp::Sub);
expr_binop!(Mul, mul, BinOp::Mul);
expr_binop!(Div, div, BinOp::Div);
expr_binop!(Shr, shr, BinOp::Shr);
expr_binop!(BitAnd, bitand, BinOp::BitAnd);

/// One body statement. `line` tags identify the statement in failure reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    SetLocal {
        local: usize,
        value: Expr,
        line: u32,
    },
    SetSignal {
        signal: Address,
        value: Expr,
        line: u32,
    },
    /// Writes an input of a child and triggers it once its last input arrives.
    SetChildInput {
        child: Address,
        signal: Address,
        value: Expr,
        line: u32,
    },
    /// Instantiates every component of the given child block.
    CreateChildren { block: usize },
    Loop {
        cond: Expr,
        body: Vec<Stmt>,
        line: u32,
    },
    Branch {
        cond: Expr,
        then: Vec<Stmt>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        otherwise: Vec<Stmt>,
        line: u32,
    },
    Assert { cond: Expr, line: u32 },
}

impl Stmt {
    pub fn set_local(local: usize, value: Expr, line: u32) -> Self {
        Stmt::SetLocal { local, value, line }
    }

    pub fn set_signal(signal: impl Into<Address>, value: Expr, line: u32) -> Self {
        Stmt::SetSignal {
            signal: signal.into(),
            value,
            line,
        }
    }

    pub fn set_child_input(
        child: impl Into<Address>,
        signal: impl Into<Address>,
        value: Expr,
        line: u32,
    ) -> Self {
        Stmt::SetChildInput {
            child: child.into(),
            signal: signal.into(),
            value,
            line,
        }
    }

    pub fn assert(cond: Expr, line: u32) -> Self {
        Stmt::Assert { cond, line }
    }

    /// Lowers `for (local = start; local < bound; local += step) body` to
    /// an initialisation followed by a while loop.
    pub fn for_loop(
        local: usize,
        start: Expr,
        bound: Expr,
        step: Expr,
        mut body: Vec<Stmt>,
        line: u32,
    ) -> Vec<Stmt> {
        body.push(Stmt::set_local(local, Expr::local(local) + step, line));
        vec![
            Stmt::set_local(local, start, line),
            Stmt::Loop {
                cond: Expr::local(local).less_than(bound),
                body,
                line,
            },
        ]
    }
}

/// A named array of components of one template, created together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildBlock {
    pub template: TemplateId,
    pub name: String,
    /// Array dimensions; empty for a single component.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dims: Vec<usize>,
    /// Row-major positions to instantiate; `None` instantiates every position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<usize>>,
}

impl ChildBlock {
    pub fn single(template: TemplateId, name: impl Into<String>) -> Self {
        Self {
            template,
            name: name.into(),
            dims: Vec::new(),
            positions: None,
        }
    }

    pub fn array(template: TemplateId, name: impl Into<String>, dims: Vec<usize>) -> Self {
        Self {
            template,
            name: name.into(),
            dims,
            positions: None,
        }
    }

    pub fn sparse(mut self, positions: Vec<usize>) -> Self {
        self.positions = Some(positions);
        self
    }

    /// Number of child slots the block reserves.
    pub fn slots(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn instances(&self) -> Vec<usize> {
        match &self.positions {
            Some(positions) => positions.clone(),
            None => (0..self.slots()).collect(),
        }
    }

    /// Display name of the component at `position`, e.g. `nonEqual[1][0]`.
    pub fn display_name(&self, position: usize) -> String {
        let mut name = self.name.clone();
        let mut suffix = Vec::with_capacity(self.dims.len());
        let mut rest = position;
        for &dim in self.dims.iter().rev() {
            suffix.push(rest % dim);
            rest /= dim;
        }
        for index in suffix.iter().rev() {
            name.push_str(&format!("[{index}]"));
        }
        name
    }
}

/// A main-component input signal (possibly an array).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSignal {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dims: Vec<usize>,
}

impl InputSignal {
    pub fn new(name: impl Into<String>, dims: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            dims,
        }
    }

    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Static description of one template kind.
///
/// Own signals are laid out as outputs, then inputs, then intermediates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDef {
    pub name: String,
    #[serde(default)]
    pub outputs: usize,
    pub inputs: usize,
    pub signals: usize,
    #[serde(default)]
    pub locals: usize,
    /// Named input layout, used when the template is the main component.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_signals: Vec<InputSignal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChildBlock>,
    pub body: Vec<Stmt>,
}

impl TemplateDef {
    pub fn new(name: impl Into<String>, inputs: usize, signals: usize) -> Self {
        Self {
            name: name.into(),
            outputs: 0,
            inputs,
            signals,
            locals: 0,
            input_signals: Vec::new(),
            children: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_outputs(mut self, outputs: usize) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_locals(mut self, locals: usize) -> Self {
        self.locals = locals;
        self
    }

    pub fn with_input_signals(mut self, input_signals: Vec<InputSignal>) -> Self {
        self.input_signals = input_signals;
        self
    }

    /// Registers a child block and returns its index for [`Stmt::CreateChildren`].
    pub fn add_children(&mut self, block: ChildBlock) -> usize {
        self.children.push(block);
        self.children.len() - 1
    }

    pub fn push(&mut self, stmt: Stmt) -> &mut Self {
        self.body.push(stmt);
        self
    }

    pub fn extend(&mut self, stmts: impl IntoIterator<Item = Stmt>) -> &mut Self {
        self.body.extend(stmts);
        self
    }

    /// Local index of the first input signal.
    pub fn first_input(&self) -> usize {
        self.outputs
    }
}
