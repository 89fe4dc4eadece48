//! Witness calculation: evaluation context, template interpreter and driver.
//!
//! Components are activated by arity. Every input write decrements the
//! receiving component's counter, and the write that brings it to zero runs
//! the component inline, before control returns to the writer. A parent can
//! therefore read a child's outputs right after the statement that supplied
//! the child's last input. Once a parent's body finishes, it releases every
//! child it populated; a child that never ran makes the release fail.

use std::panic;
use std::thread;

use ark_ff::PrimeField;
use tracing::{Span, debug, error, info, trace};

use crate::circuit::{Circuit, TemplateLayout};
use crate::component::{ComponentDescriptor, ComponentId, ComponentState, ComponentTable, NewComponent};
use crate::config::EvalConfig;
use crate::error::{FieldError, WitnessError};
use crate::field;
use crate::input::InputAssignment;
use crate::signals::{SignalStorage, SignalWindow};
use crate::template::{Address, Expr, Stmt, TemplateDef, TemplateId};
use crate::witness::Witness;

/// Stack reserved for the evaluation thread besides the per-level share.
const BASE_STACK_BYTES: usize = 1 << 20;
/// Stack reserved per level of component nesting.
const STACK_BYTES_PER_LEVEL: usize = 64 << 10;

/// Counters collected during one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalStats {
    pub created: usize,
    pub run: usize,
    pub released: usize,
    pub max_depth: usize,
}

/// Execution state of one component body.
struct Frame<'c, F> {
    id: ComponentId,
    template: &'c TemplateDef,
    layout: &'c TemplateLayout,
    window: SignalWindow,
    locals: Vec<F>,
}

/// Evaluation context of a single pass over a circuit.
pub struct WitnessCalculator<'c, F> {
    circuit: &'c Circuit<F>,
    signals: SignalStorage<F>,
    components: ComponentTable,
    config: EvalConfig,
    depth: usize,
    stats: EvalStats,
}

impl<'c, F: PrimeField> WitnessCalculator<'c, F> {
    pub fn new(circuit: &'c Circuit<F>) -> Self {
        Self::with_config(circuit, EvalConfig::default())
    }

    pub fn with_config(circuit: &'c Circuit<F>, config: EvalConfig) -> Self {
        Self {
            circuit,
            signals: SignalStorage::new(circuit.total_signals()),
            components: ComponentTable::new(
                circuit.total_components(),
                config.trace_separator.clone(),
            ),
            config,
            depth: 0,
            stats: EvalStats::default(),
        }
    }

    pub fn stats(&self) -> EvalStats {
        self.stats
    }

    pub fn component(&self, id: ComponentId) -> Result<&ComponentDescriptor, WitnessError> {
        self.components.get(id)
    }

    pub fn components(&self) -> &ComponentTable {
        &self.components
    }

    pub fn signal(&self, index: usize) -> Result<F, WitnessError> {
        self.signals.get(index)
    }

    pub fn trace(&self, id: ComponentId) -> String {
        self.components.trace(id)
    }

    /// Evaluates the whole circuit on the main inputs, in declaration order.
    pub fn evaluate(mut self, inputs: &[F]) -> Result<Witness<F>, WitnessError> {
        let circuit = self.circuit;
        let main = circuit.template(circuit.main());
        let _span = tracing::debug_span!("evaluate", template = %main.name).entered();

        if let Err(err) = self.execute(inputs) {
            error!(%err, "witness evaluation halted");
            return Err(err);
        }
        info!(
            signals = self.signals.len(),
            components = self.stats.created,
            max_depth = self.stats.max_depth,
            "witness evaluation complete"
        );
        Ok(self.into_witness())
    }

    pub fn evaluate_assignment(
        self,
        inputs: &InputAssignment<F>,
    ) -> Result<Witness<F>, WitnessError> {
        let signals = inputs.to_signals(self.circuit)?;
        self.evaluate(&signals)
    }

    /// Creates the main component, feeds it `inputs` and releases it.
    ///
    /// Runs on a scoped thread whose stack is sized for `config.max_depth`
    /// levels of nesting, so hitting the limit is reported as
    /// [`WitnessError::ResourceExhausted`] instead of overflowing the stack.
    /// The pass cannot be resumed after an error; the table and storage are left
    /// as they were at the failure for inspection.
    pub fn execute(&mut self, inputs: &[F]) -> Result<(), WitnessError> {
        let size = self
            .config
            .max_depth
            .saturating_mul(STACK_BYTES_PER_LEVEL)
            .saturating_add(BASE_STACK_BYTES);
        let span = Span::current();
        thread::scope(|scope| {
            let worker = thread::Builder::new()
                .name("calcwit-eval".to_string())
                .stack_size(size)
                .spawn_scoped(scope, move || {
                    let _entered = span.enter();
                    self.drive(inputs)
                })
                .map_err(|e| WitnessError::StackUnavailable {
                    size,
                    reason: e.to_string(),
                })?;
            worker.join().unwrap_or_else(|payload| panic::resume_unwind(payload))
        })
    }

    fn drive(&mut self, inputs: &[F]) -> Result<(), WitnessError> {
        let expected = self.circuit.main_input_count();
        if inputs.len() != expected {
            return Err(WitnessError::InputCount {
                expected,
                actual: inputs.len(),
            });
        }
        let main = self.circuit.main();
        self.create_component(main, 1, ComponentId::MAIN, "main".to_string(), None)?;
        if expected == 0 {
            self.run(ComponentId::MAIN)?;
        }
        let first = self.circuit.template(main).first_input();
        for (i, value) in inputs.iter().enumerate() {
            self.write_input(ComponentId::MAIN, first + i, *value)?;
        }
        self.release(ComponentId::MAIN)
    }

    pub fn into_witness(self) -> Witness<F> {
        Witness::new(self.signals.into_vec())
    }

    /// Reserves the descriptor `id` for a component of `template` whose window starts at `base`.
    pub fn create_component(
        &mut self,
        template: TemplateId,
        base: usize,
        id: ComponentId,
        name: String,
        parent: Option<ComponentId>,
    ) -> Result<(), WitnessError> {
        let circuit = self.circuit;
        if template.0 >= circuit.templates().len() {
            return Err(WitnessError::UnknownTemplate(template.0));
        }
        let def = circuit.template(template);
        let layout = circuit.layout(template);
        let window = SignalWindow::new(base, layout.window);
        if window.end() > self.signals.len() {
            return Err(WitnessError::SignalOutOfRange {
                index: window.end() - 1,
                len: self.signals.len(),
            });
        }
        debug!(id = id.0, template = %def.name, %name, base, "create component");
        self.components.create(
            id,
            NewComponent {
                template,
                window,
                arity: def.inputs,
                max_children: layout.max_children,
                name,
                parent,
            },
        )?;
        self.stats.created += 1;
        Ok(())
    }

    /// Writes input `local_index` of component `id`; runs the component if this was
    /// its last outstanding input.
    pub fn write_input(
        &mut self,
        id: ComponentId,
        local_index: usize,
        value: F,
    ) -> Result<(), WitnessError> {
        let descriptor = self.components.get(id)?;
        let own = self.circuit.template(descriptor.template).signals;
        let index = match descriptor.window.absolute(local_index) {
            Some(index) if local_index < own => index,
            _ => {
                return Err(WitnessError::WindowOutOfRange {
                    trace: self.components.trace(id),
                    index: local_index,
                    len: own,
                });
            }
        };
        let ready = self.components.consume_input(id)?;
        self.signals.set(index, value)?;
        if ready {
            self.run(id)?;
        }
        Ok(())
    }

    /// Executes the body of component `id`, then releases its children.
    pub fn run(&mut self, id: ComponentId) -> Result<(), WitnessError> {
        if self.depth >= self.config.max_depth {
            return Err(WitnessError::ResourceExhausted {
                limit: self.config.max_depth,
            });
        }
        self.components.begin_run(id)?;
        self.depth += 1;
        self.stats.run += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.depth);
        if self.config.log_component_runs {
            trace!(component = %self.components.trace(id), "run");
        }

        let circuit = self.circuit;
        let descriptor = self.components.get(id)?;
        let template = circuit.template(descriptor.template);
        let mut frame = Frame {
            id,
            template,
            layout: circuit.layout(descriptor.template),
            window: descriptor.window,
            locals: vec![F::zero(); template.locals],
        };
        self.exec_block(&mut frame, &template.body)?;

        for child in self.components.children(id)? {
            self.release(child)?;
        }
        self.components.complete(id)?;
        self.depth -= 1;
        Ok(())
    }

    /// Drops the auxiliary buffers of a completed component.
    pub fn release(&mut self, id: ComponentId) -> Result<(), WitnessError> {
        self.components.release(id)?;
        self.stats.released += 1;
        Ok(())
    }

    fn exec_block(&mut self, frame: &mut Frame<'c, F>, stmts: &'c [Stmt]) -> Result<(), WitnessError> {
        for stmt in stmts {
            self.exec(frame, stmt)?;
        }
        Ok(())
    }

    fn exec(&mut self, frame: &mut Frame<'c, F>, stmt: &'c Stmt) -> Result<(), WitnessError> {
        match stmt {
            Stmt::SetLocal { local, value, line } => {
                frame.locals[*local] = self.eval(frame, value, *line)?;
            }
            Stmt::SetSignal {
                signal,
                value,
                line,
            } => {
                let value = self.eval(frame, value, *line)?;
                let index = self.own_signal(frame, signal, *line)?;
                self.signals.set(index, value)?;
            }
            Stmt::SetChildInput {
                child,
                signal,
                value,
                line,
            } => {
                let value = self.eval(frame, value, *line)?;
                let slot = self.resolve(frame, child, *line)?;
                let child = self.components.child(frame.id, slot)?;
                let signal = self.resolve(frame, signal, *line)?;
                self.write_input(child, signal, value)?;
            }
            Stmt::CreateChildren { block } => self.create_block(frame, *block)?,
            Stmt::Loop { cond, body, line } => {
                while self.condition(frame, cond, *line)? {
                    self.exec_block(frame, body)?;
                }
            }
            Stmt::Branch {
                cond,
                then,
                otherwise,
                line,
            } => {
                if self.condition(frame, cond, *line)? {
                    self.exec_block(frame, then)?;
                } else {
                    self.exec_block(frame, otherwise)?;
                }
            }
            Stmt::Assert { cond, line } => {
                if !self.condition(frame, cond, *line)? {
                    return Err(WitnessError::AssertionFailed {
                        template: frame.template.name.clone(),
                        line: *line,
                        trace: self.components.trace(frame.id),
                    });
                }
            }
        }
        Ok(())
    }

    fn create_block(&mut self, frame: &Frame<'c, F>, index: usize) -> Result<(), WitnessError> {
        let block = &frame.template.children[index];
        let placement = frame.layout.blocks[index];
        let arity = self.circuit.template(block.template).inputs;
        for (n, position) in block.instances().into_iter().enumerate() {
            let id = ComponentId(frame.id.0 + 1 + placement.id_offset + n * placement.id_stride);
            let base = frame.window.base + placement.signal_offset + n * placement.signal_stride;
            self.create_component(
                block.template,
                base,
                id,
                block.display_name(position),
                Some(frame.id),
            )?;
            self.components
                .set_child(frame.id, placement.slot_start + position, id)?;
            // nothing will ever write to a component without inputs
            if arity == 0 {
                self.run(id)?;
            }
        }
        Ok(())
    }

    fn condition(&self, frame: &Frame<'c, F>, cond: &Expr, line: u32) -> Result<bool, WitnessError> {
        Ok(field::is_true(&self.eval(frame, cond, line)?))
    }

    fn eval(&self, frame: &Frame<'c, F>, expr: &Expr, line: u32) -> Result<F, WitnessError> {
        match expr {
            Expr::Constant(index) => {
                let pool = self.circuit.constants();
                pool.get(*index)
                    .copied()
                    .ok_or(WitnessError::ConstantOutOfRange {
                        index: *index,
                        len: pool.len(),
                    })
            }
            Expr::Signal(address) => {
                let index = self.own_signal(frame, address, line)?;
                self.signals.get(index)
            }
            Expr::Local(index) => Ok(frame.locals[*index]),
            Expr::ChildSignal { child, signal } => {
                let slot = self.resolve(frame, child, line)?;
                let child = self.components.child(frame.id, slot)?;
                let descriptor = self.components.get(child)?;
                if descriptor.state != ComponentState::Completed {
                    return Err(WitnessError::ChildNotCompleted {
                        trace: self.components.trace(frame.id),
                        child: descriptor.name.clone(),
                        state: descriptor.state,
                    });
                }
                let local = self.resolve(frame, signal, line)?;
                let own = self.circuit.template(descriptor.template).signals;
                match descriptor.window.absolute(local) {
                    Some(index) if local < own => self.signals.get(index),
                    _ => Err(WitnessError::WindowOutOfRange {
                        trace: self.components.trace(child),
                        index: local,
                        len: own,
                    }),
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let a = self.eval(frame, lhs, line)?;
                let b = self.eval(frame, rhs, line)?;
                op.apply(&a, &b)
                    .map_err(|source| self.arithmetic(frame, source, line))
            }
        }
    }

    fn resolve(&self, frame: &Frame<'c, F>, address: &Address, line: u32) -> Result<usize, WitnessError> {
        address
            .resolve(&frame.locals)
            .map_err(|source| self.arithmetic(frame, source, line))
    }

    fn own_signal(&self, frame: &Frame<'c, F>, address: &Address, line: u32) -> Result<usize, WitnessError> {
        let local = self.resolve(frame, address, line)?;
        match frame.window.absolute(local) {
            Some(index) if local < frame.template.signals => Ok(index),
            _ => Err(WitnessError::WindowOutOfRange {
                trace: self.components.trace(frame.id),
                index: local,
                len: frame.template.signals,
            }),
        }
    }

    fn arithmetic(&self, frame: &Frame<'c, F>, source: FieldError, line: u32) -> WitnessError {
        WitnessError::Arithmetic {
            source,
            template: frame.template.name.clone(),
            line,
            trace: self.components.trace(frame.id),
        }
    }
}

/// Evaluates `circuit` on its main inputs with the default configuration.
pub fn calculate_witness<F: PrimeField>(
    circuit: &Circuit<F>,
    inputs: &[F],
) -> Result<Witness<F>, WitnessError> {
    WitnessCalculator::new(circuit).evaluate(inputs)
}
