//! Circuit graph: template table, constant pool and static layout.
//!
//! The layout pass runs once when a circuit is built. It fixes, for every
//! template, the size of its signal window, the number of components in its
//! subtree and where each child block lands in the window and the id space.
//! Nothing about the graph changes during evaluation.

use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};

use crate::error::CircuitError;
use crate::field;
use crate::template::{Address, ChildBlock, Expr, InputSignal, Stmt, TemplateDef, TemplateId};

/// Immutable, indexed constants shared by every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool<F> {
    values: Vec<F>,
}

impl<F: PrimeField> ConstantPool<F> {
    pub fn new(values: Vec<F>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&F> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[F] {
        &self.values
    }
}

/// Placement of one child block inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    /// First child slot of the block in the parent's slot array.
    pub slot_start: usize,
    /// Offset of the first child window from the parent's window base.
    pub signal_offset: usize,
    /// Offset of the first child id from the parent's id, minus one.
    pub id_offset: usize,
    /// Window size of one child.
    pub signal_stride: usize,
    /// Subtree component count of one child.
    pub id_stride: usize,
}

/// Derived sizes of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLayout {
    /// Own signals plus the windows of all descendants.
    pub window: usize,
    /// This component plus all descendants.
    pub components: usize,
    pub max_children: usize,
    pub blocks: Vec<BlockLayout>,
}

/// Serializable form of a circuit, with constants as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitDescription {
    pub templates: Vec<TemplateDef>,
    pub constants: Vec<String>,
    pub main: TemplateId,
}

#[derive(Debug, Clone)]
pub struct Circuit<F> {
    templates: Vec<TemplateDef>,
    layouts: Vec<TemplateLayout>,
    constants: ConstantPool<F>,
    main: TemplateId,
}

impl<F: PrimeField> Circuit<F> {
    pub fn new(
        templates: Vec<TemplateDef>,
        constants: Vec<F>,
        main: TemplateId,
    ) -> Result<Self, CircuitError> {
        if main.0 >= templates.len() {
            return Err(CircuitError::UnknownTemplate(main.0));
        }
        for template in &templates {
            validate_template(template, &templates, constants.len())?;
        }
        let layouts = compute_layouts(&templates)?;
        Ok(Self {
            templates,
            layouts,
            constants: ConstantPool::new(constants),
            main,
        })
    }

    pub fn from_description(description: CircuitDescription) -> Result<Self, CircuitError> {
        let constants = description
            .constants
            .iter()
            .map(|c| field::from_decimal(c))
            .collect::<Result<Vec<F>, _>>()?;
        Self::new(description.templates, constants, description.main)
    }

    pub fn from_json(json: &str) -> Result<Self, CircuitError> {
        let description: CircuitDescription =
            serde_json::from_str(json).map_err(|e| CircuitError::Json(e.to_string()))?;
        Self::from_description(description)
    }

    pub fn description(&self) -> CircuitDescription {
        CircuitDescription {
            templates: self.templates.clone(),
            constants: self.constants.as_slice().iter().map(field::to_decimal).collect(),
            main: self.main,
        }
    }

    pub fn to_json(&self) -> Result<String, CircuitError> {
        serde_json::to_string_pretty(&self.description()).map_err(|e| CircuitError::Json(e.to_string()))
    }

    pub fn template(&self, id: TemplateId) -> &TemplateDef {
        &self.templates[id.0]
    }

    pub fn layout(&self, id: TemplateId) -> &TemplateLayout {
        &self.layouts[id.0]
    }

    pub fn templates(&self) -> &[TemplateDef] {
        &self.templates
    }

    pub fn constants(&self) -> &ConstantPool<F> {
        &self.constants
    }

    pub fn main(&self) -> TemplateId {
        self.main
    }

    /// Signal count including the constant-one signal at index 0.
    pub fn total_signals(&self) -> usize {
        1 + self.layout(self.main).window
    }

    pub fn total_components(&self) -> usize {
        self.layout(self.main).components
    }

    /// Storage index of the first main input; the main window starts at 1.
    pub fn main_input_start(&self) -> usize {
        1 + self.template(self.main).first_input()
    }

    pub fn main_input_count(&self) -> usize {
        self.template(self.main).inputs
    }

    /// Declared input signals of the main template. A template without a named
    /// layout exposes its inputs as a single array `in`.
    pub fn inputs(&self) -> Vec<InputSignal> {
        let main = self.template(self.main);
        if main.input_signals.is_empty() && main.inputs > 0 {
            vec![InputSignal::new("in", vec![main.inputs])]
        } else {
            main.input_signals.clone()
        }
    }
}

fn validate_template(
    template: &TemplateDef,
    templates: &[TemplateDef],
    constants: usize,
) -> Result<(), CircuitError> {
    if template.outputs + template.inputs > template.signals {
        return Err(CircuitError::InputsExceedSignals {
            template: template.name.clone(),
            outputs: template.outputs,
            inputs: template.inputs,
            signals: template.signals,
        });
    }
    if !template.input_signals.is_empty() {
        let len: usize = template.input_signals.iter().map(InputSignal::len).sum();
        if len != template.inputs {
            let first = &template.input_signals[0];
            return Err(CircuitError::InputLayoutMismatch {
                template: template.name.clone(),
                name: first.name.clone(),
                len,
                arity: template.inputs,
            });
        }
    }
    for block in &template.children {
        validate_block(template, block, templates.len())?;
    }
    let checker = BodyChecker {
        template,
        constants,
    };
    checker.stmts(&template.body)
}

fn validate_block(
    template: &TemplateDef,
    block: &ChildBlock,
    template_count: usize,
) -> Result<(), CircuitError> {
    if block.template.0 >= template_count {
        return Err(CircuitError::UnknownTemplate(block.template.0));
    }
    let size = block.slots();
    let mut seen = vec![false; size];
    for position in block.instances() {
        if position >= size {
            return Err(CircuitError::PositionOutOfRange {
                template: template.name.clone(),
                block: block.name.clone(),
                position,
                size,
            });
        }
        if std::mem::replace(&mut seen[position], true) {
            return Err(CircuitError::DuplicatePosition {
                template: template.name.clone(),
                block: block.name.clone(),
                position,
            });
        }
    }
    Ok(())
}

struct BodyChecker<'a> {
    template: &'a TemplateDef,
    constants: usize,
}

impl BodyChecker<'_> {
    fn stmts(&self, stmts: &[Stmt]) -> Result<(), CircuitError> {
        stmts.iter().try_for_each(|stmt| self.stmt(stmt))
    }

    fn stmt(&self, stmt: &Stmt) -> Result<(), CircuitError> {
        match stmt {
            Stmt::SetLocal { local, value, .. } => {
                self.local(*local)?;
                self.expr(value)
            }
            Stmt::SetSignal { signal, value, .. } => {
                self.address(signal)?;
                self.expr(value)
            }
            Stmt::SetChildInput {
                child,
                signal,
                value,
                ..
            } => {
                self.address(child)?;
                self.address(signal)?;
                self.expr(value)
            }
            Stmt::CreateChildren { block } => {
                if *block >= self.template.children.len() {
                    return Err(CircuitError::ChildBlockOutOfRange {
                        template: self.template.name.clone(),
                        index: *block,
                        len: self.template.children.len(),
                    });
                }
                Ok(())
            }
            Stmt::Loop { cond, body, .. } => {
                self.expr(cond)?;
                self.stmts(body)
            }
            Stmt::Branch {
                cond,
                then,
                otherwise,
                ..
            } => {
                self.expr(cond)?;
                self.stmts(then)?;
                self.stmts(otherwise)
            }
            Stmt::Assert { cond, .. } => self.expr(cond),
        }
    }

    fn expr(&self, expr: &Expr) -> Result<(), CircuitError> {
        let mut result = Ok(());
        expr.walk(&mut |node| {
            if result.is_err() {
                return;
            }
            result = match node {
                Expr::Constant(index) if *index >= self.constants => {
                    Err(CircuitError::ConstantOutOfRange {
                        template: self.template.name.clone(),
                        index: *index,
                        len: self.constants,
                    })
                }
                Expr::Local(index) => self.local(*index),
                Expr::Signal(address) => self.address(address),
                Expr::ChildSignal { child, signal } => {
                    self.address(child).and_then(|_| self.address(signal))
                }
                _ => Ok(()),
            };
        });
        result
    }

    fn address(&self, address: &Address) -> Result<(), CircuitError> {
        address.locals().try_for_each(|local| self.local(local))
    }

    fn local(&self, index: usize) -> Result<(), CircuitError> {
        if index >= self.template.locals {
            return Err(CircuitError::LocalOutOfRange {
                template: self.template.name.clone(),
                index,
                len: self.template.locals,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Pending,
    InProgress,
    Done,
}

fn compute_layouts(templates: &[TemplateDef]) -> Result<Vec<TemplateLayout>, CircuitError> {
    let mut visits = vec![Visit::Pending; templates.len()];
    let mut layouts: Vec<Option<TemplateLayout>> = vec![None; templates.len()];
    for id in 0..templates.len() {
        layout_of(id, templates, &mut visits, &mut layouts)?;
    }
    Ok(layouts.into_iter().flatten().collect())
}

fn layout_of(
    id: usize,
    templates: &[TemplateDef],
    visits: &mut [Visit],
    layouts: &mut [Option<TemplateLayout>],
) -> Result<(), CircuitError> {
    match visits[id] {
        Visit::Done => return Ok(()),
        Visit::InProgress => {
            return Err(CircuitError::RecursiveTemplate(templates[id].name.clone()));
        }
        Visit::Pending => {}
    }
    visits[id] = Visit::InProgress;

    let template = &templates[id];
    let mut window = template.signals;
    let mut components = 1;
    let mut max_children = 0;
    let mut blocks = Vec::with_capacity(template.children.len());
    for block in &template.children {
        let child = block.template.0;
        layout_of(child, templates, visits, layouts)?;
        let Some(child_layout) = layouts[child].as_ref() else {
            return Err(CircuitError::UnknownTemplate(child));
        };
        let count = block.instances().len();
        blocks.push(BlockLayout {
            slot_start: max_children,
            signal_offset: window,
            id_offset: components - 1,
            signal_stride: child_layout.window,
            id_stride: child_layout.components,
        });
        window += count * child_layout.window;
        components += count * child_layout.components;
        max_children += block.slots();
    }

    layouts[id] = Some(TemplateLayout {
        window,
        components,
        max_children,
        blocks,
    });
    visits[id] = Visit::Done;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Fr;
    use crate::template::{ChildBlock, Expr, Stmt};

    fn leaf() -> TemplateDef {
        let mut def = TemplateDef::new("Leaf", 1, 2);
        def.push(Stmt::set_signal(1, Expr::signal(0), 1));
        def
    }

    #[test]
    fn test_layout_of_nested_blocks() {
        let mut parent = TemplateDef::new("Parent", 2, 2);
        parent.add_children(ChildBlock::array(TemplateId(0), "a", vec![3]));
        parent.add_children(ChildBlock::single(TemplateId(0), "b"));
        parent.push(Stmt::CreateChildren { block: 0 });
        parent.push(Stmt::CreateChildren { block: 1 });

        let circuit = Circuit::<Fr>::new(vec![leaf(), parent], vec![], TemplateId(1)).unwrap();
        let layout = circuit.layout(TemplateId(1));
        assert_eq!(layout.window, 2 + 4 * 2);
        assert_eq!(layout.components, 5);
        assert_eq!(layout.max_children, 4);
        assert_eq!(
            layout.blocks[1],
            BlockLayout {
                slot_start: 3,
                signal_offset: 8,
                id_offset: 3,
                signal_stride: 2,
                id_stride: 1,
            }
        );
        assert_eq!(circuit.total_signals(), 11);
        assert_eq!(circuit.main_input_start(), 1);
        assert_eq!(circuit.inputs(), vec![InputSignal::new("in", vec![2])]);
    }

    #[test]
    fn test_sparse_blocks_reserve_all_slots() {
        let mut parent = TemplateDef::new("Parent", 0, 0);
        parent.add_children(ChildBlock::array(TemplateId(0), "x", vec![2, 2]).sparse(vec![2]));
        let circuit = Circuit::<Fr>::new(vec![leaf(), parent], vec![], TemplateId(1)).unwrap();
        let layout = circuit.layout(TemplateId(1));
        assert_eq!(layout.max_children, 4);
        assert_eq!(layout.components, 2);
        assert_eq!(layout.window, 2);
    }

    #[test]
    fn test_rejects_recursion() {
        let mut looping = TemplateDef::new("Loop", 0, 0);
        looping.add_children(ChildBlock::single(TemplateId(0), "again"));
        assert_eq!(
            Circuit::<Fr>::new(vec![looping], vec![], TemplateId(0)).unwrap_err(),
            CircuitError::RecursiveTemplate("Loop".to_string())
        );
    }

    #[test]
    fn test_rejects_bad_references() {
        let mut def = TemplateDef::new("Bad", 0, 1);
        def.push(Stmt::set_signal(0, Expr::constant(3), 1));
        assert!(matches!(
            Circuit::<Fr>::new(vec![def], vec![Fr::from(1u64)], TemplateId(0)),
            Err(CircuitError::ConstantOutOfRange { index: 3, .. })
        ));

        let mut def = TemplateDef::new("Bad", 0, 1);
        def.push(Stmt::set_signal(Address::fixed(0).plus(1, 2), Expr::local(0), 1));
        assert!(matches!(
            Circuit::<Fr>::new(vec![def], vec![], TemplateId(0)),
            Err(CircuitError::LocalOutOfRange { .. })
        ));

        let mut def = TemplateDef::new("Bad", 0, 0);
        def.push(Stmt::CreateChildren { block: 0 });
        assert!(matches!(
            Circuit::<Fr>::new(vec![def], vec![], TemplateId(0)),
            Err(CircuitError::ChildBlockOutOfRange { .. })
        ));

        let mut def = TemplateDef::new("Bad", 0, 0);
        def.add_children(ChildBlock::array(TemplateId(0), "x", vec![2]).sparse(vec![2]));
        assert!(matches!(
            Circuit::<Fr>::new(vec![leaf(), def], vec![], TemplateId(1)),
            Err(CircuitError::PositionOutOfRange { position: 2, .. })
        ));

        let mut def = TemplateDef::new("Bad", 0, 0);
        def.add_children(ChildBlock::array(TemplateId(0), "x", vec![1]).sparse(vec![0, 0]));
        assert_eq!(
            Circuit::<Fr>::new(vec![leaf(), def], vec![], TemplateId(1)).unwrap_err(),
            CircuitError::DuplicatePosition {
                template: "Bad".to_string(),
                block: "x".to_string(),
                position: 0,
            }
        );

        assert!(matches!(
            Circuit::<Fr>::new(vec![TemplateDef::new("Bad", 3, 2)], vec![], TemplateId(0)),
            Err(CircuitError::InputsExceedSignals { .. })
        ));
        assert!(matches!(
            Circuit::<Fr>::new(vec![leaf()], vec![], TemplateId(4)),
            Err(CircuitError::UnknownTemplate(4))
        ));
    }

    #[test]
    fn test_description_round_trip() {
        let constants = vec![Fr::from(1u64), -Fr::from(1u64)];
        let circuit = Circuit::new(vec![leaf()], constants.clone(), TemplateId(0)).unwrap();
        let json = circuit.to_json().unwrap();
        let parsed = Circuit::<Fr>::from_json(&json).unwrap();
        assert_eq!(parsed.constants().as_slice(), constants.as_slice());
        assert_eq!(parsed.templates(), circuit.templates());
        assert!(matches!(
            Circuit::<Fr>::from_json("{\"templates\": 3}"),
            Err(CircuitError::Json(_))
        ));
    }
}
