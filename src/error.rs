//! Error types for circuit description, input assignment and witness evaluation.

use thiserror::Error;

use crate::component::ComponentState;

/// Domain violations of the field operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("field element {value} is not a small non-negative integer")]
    NotSmallInteger { value: String },
    #[error("invalid decimal field element {0:?}")]
    InvalidDecimal(String),
    #[error("index {offset} + {stride} * {index} overflows")]
    IndexOverflow {
        offset: usize,
        stride: usize,
        index: usize,
    },
}

/// Problems found while building or validating a circuit graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    #[error("unknown template id {0}")]
    UnknownTemplate(usize),
    #[error("template {0} includes itself")]
    RecursiveTemplate(String),
    #[error("template {template} references constant {index}, pool holds {len}")]
    ConstantOutOfRange {
        template: String,
        index: usize,
        len: usize,
    },
    #[error("template {template} references local {index}, declares {len}")]
    LocalOutOfRange {
        template: String,
        index: usize,
        len: usize,
    },
    #[error("template {template} references child block {index}, declares {len}")]
    ChildBlockOutOfRange {
        template: String,
        index: usize,
        len: usize,
    },
    #[error("child block {block} of template {template} lists position {position} outside its array of {size}")]
    PositionOutOfRange {
        template: String,
        block: String,
        position: usize,
        size: usize,
    },
    #[error("block {block} of template {template} lists position {position} twice")]
    DuplicatePosition {
        template: String,
        block: String,
        position: usize,
    },
    #[error("template {template} declares {inputs} inputs after {outputs} outputs but only {signals} own signals")]
    InputsExceedSignals {
        template: String,
        outputs: usize,
        inputs: usize,
        signals: usize,
    },
    #[error("template {template} declares input {name} of {len} signals, arity is {arity}")]
    InputLayoutMismatch {
        template: String,
        name: String,
        len: usize,
        arity: usize,
    },
    #[error(transparent)]
    Constant(#[from] FieldError),
    #[error("malformed circuit description: {0}")]
    Json(String),
}

/// Problems with the values supplied for the main component's inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown input signal {0}")]
    UnknownSignal(String),
    #[error("input signal {0} was not assigned")]
    MissingSignal(String),
    #[error("input signal {name} expects {expected} values, got {actual}")]
    WrongLength {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("input signal {name}: {reason}")]
    InvalidValue { name: String, reason: String },
    #[error("malformed input document: {0}")]
    Json(String),
}

/// Fatal outcomes of a witness evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WitnessError {
    #[error("{source} in template {template} line {line}. Followed trace of components: {trace}")]
    Arithmetic {
        source: FieldError,
        template: String,
        line: u32,
        trace: String,
    },
    #[error("Failed assert in template {template} line {line}. Followed trace of components: {trace}")]
    AssertionFailed {
        template: String,
        line: u32,
        trace: String,
    },
    #[error("component {trace} received more inputs than its arity {arity}")]
    InputOverflow { trace: String, arity: usize },
    #[error("component {trace} does not accept inputs in state {state:?}")]
    NotAccepting {
        trace: String,
        state: ComponentState,
    },
    #[error("component {trace} cannot run with {remaining} inputs outstanding")]
    NotReady { trace: String, remaining: usize },
    #[error("component {trace} was already started (state {state:?})")]
    AlreadyStarted {
        trace: String,
        state: ComponentState,
    },
    #[error("component {trace} released in state {state:?}")]
    PrematureRelease {
        trace: String,
        state: ComponentState,
    },
    #[error("child {child} of {trace} read before completion (state {state:?})")]
    ChildNotCompleted {
        trace: String,
        child: String,
        state: ComponentState,
    },
    #[error("component {trace} addressed empty child slot {slot}")]
    EmptyChildSlot { trace: String, slot: usize },
    #[error("component {trace} addressed child slot {slot}, has {len}")]
    ChildSlotOutOfRange {
        trace: String,
        slot: usize,
        len: usize,
    },
    #[error("component id {0} already exists")]
    DuplicateComponent(usize),
    #[error("component id {id} exceeds circuit capacity {capacity}")]
    ComponentCapacity { id: usize, capacity: usize },
    #[error("unknown component id {0}")]
    UnknownComponent(usize),
    #[error("unknown template id {0}")]
    UnknownTemplate(usize),
    #[error("could not reserve a {size}-byte evaluation stack: {reason}")]
    StackUnavailable { size: usize, reason: String },
    #[error("signal {index} outside storage of {len} signals")]
    SignalOutOfRange { index: usize, len: usize },
    #[error("component {trace} addressed local signal {index}, window holds {len}")]
    WindowOutOfRange {
        trace: String,
        index: usize,
        len: usize,
    },
    #[error("constant {index} outside pool of {len}")]
    ConstantOutOfRange { index: usize, len: usize },
    #[error("component nesting exceeded the limit of {limit}")]
    ResourceExhausted { limit: usize },
    #[error("main component expects {expected} inputs, got {actual}")]
    InputCount { expected: usize, actual: usize },
    #[error(transparent)]
    Input(#[from] InputError),
}

/// Failures of the multi-exponentiation entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MsmError {
    #[error("scalar width must be non-zero")]
    ZeroScalarWidth,
    #[error("{count} terms requested but only {bases} bases and {scalars} scalars supplied")]
    NotEnoughTerms {
        count: usize,
        bases: usize,
        scalars: usize,
    },
}

impl WitnessError {
    /// Whether this error is a template-level failure (assertion or arithmetic domain)
    /// rather than an engine consistency violation.
    pub fn is_constraint_failure(&self) -> bool {
        matches!(
            self,
            WitnessError::Arithmetic { .. } | WitnessError::AssertionFailed { .. }
        )
    }
}
