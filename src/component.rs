//! Component descriptor table.
//!
//! The table is an arena indexed by [`ComponentId`]. Ids are handed out by the
//! static layout of the circuit, so a slot is populated at most once per pass
//! and never reused. Releasing a component only drops its auxiliary buffers;
//! the descriptor itself stays in the arena until the pass is discarded.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::WitnessError;
use crate::signals::SignalWindow;
use crate::template::TemplateId;

/// Index of a component in the descriptor table. The main component is id 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub usize);

impl ComponentId {
    pub const MAIN: ComponentId = ComponentId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a component within one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentState {
    /// Waiting for inputs.
    Created,
    /// Body executing.
    Running,
    /// Body finished, outputs readable by the parent.
    Completed,
    /// Auxiliary buffers dropped by the parent.
    Released,
}

/// One instantiated template node.
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    pub template: TemplateId,
    pub window: SignalWindow,
    pub arity: usize,
    pub remaining_inputs: usize,
    pub parent: Option<ComponentId>,
    /// Child slots; `None` marks a slot that was never populated.
    pub children: Vec<Option<ComponentId>>,
    pub name: String,
    pub state: ComponentState,
}

/// Everything needed to reserve a descriptor.
#[derive(Debug, Clone)]
pub struct NewComponent {
    pub template: TemplateId,
    pub window: SignalWindow,
    pub arity: usize,
    pub max_children: usize,
    pub name: String,
    pub parent: Option<ComponentId>,
}

/// Arena of component descriptors, growing monotonically up to a fixed capacity.
#[derive(Debug)]
pub struct ComponentTable {
    slots: Vec<Option<ComponentDescriptor>>,
    capacity: usize,
    separator: String,
}

impl ComponentTable {
    pub fn new(capacity: usize, separator: impl Into<String>) -> Self {
        Self {
            slots: Vec::new(),
            capacity,
            separator: separator.into(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of descriptors created so far.
    pub fn created(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn create(&mut self, id: ComponentId, spec: NewComponent) -> Result<(), WitnessError> {
        if id.0 >= self.capacity {
            return Err(WitnessError::ComponentCapacity {
                id: id.0,
                capacity: self.capacity,
            });
        }
        if self.slots.len() <= id.0 {
            self.slots.resize_with(id.0 + 1, || None);
        }
        if self.slots[id.0].is_some() {
            return Err(WitnessError::DuplicateComponent(id.0));
        }
        self.slots[id.0] = Some(ComponentDescriptor {
            template: spec.template,
            window: spec.window,
            arity: spec.arity,
            remaining_inputs: spec.arity,
            parent: spec.parent,
            children: vec![None; spec.max_children],
            name: spec.name,
            state: ComponentState::Created,
        });
        Ok(())
    }

    pub fn get(&self, id: ComponentId) -> Result<&ComponentDescriptor, WitnessError> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(WitnessError::UnknownComponent(id.0))
    }

    fn get_mut(&mut self, id: ComponentId) -> Result<&mut ComponentDescriptor, WitnessError> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(WitnessError::UnknownComponent(id.0))
    }

    pub fn state(&self, id: ComponentId) -> Result<ComponentState, WitnessError> {
        Ok(self.get(id)?.state)
    }

    /// Records one input write. Returns `true` when the last outstanding input arrived.
    pub fn consume_input(&mut self, id: ComponentId) -> Result<bool, WitnessError> {
        let descriptor = self.get(id)?;
        if descriptor.state != ComponentState::Created {
            return Err(WitnessError::NotAccepting {
                trace: self.trace(id),
                state: descriptor.state,
            });
        }
        if descriptor.remaining_inputs == 0 {
            return Err(WitnessError::InputOverflow {
                trace: self.trace(id),
                arity: descriptor.arity,
            });
        }
        let descriptor = self.get_mut(id)?;
        descriptor.remaining_inputs -= 1;
        Ok(descriptor.remaining_inputs == 0)
    }

    /// `Created` with no outstanding inputs -> `Running`.
    pub fn begin_run(&mut self, id: ComponentId) -> Result<(), WitnessError> {
        let descriptor = self.get(id)?;
        if descriptor.state != ComponentState::Created {
            return Err(WitnessError::AlreadyStarted {
                trace: self.trace(id),
                state: descriptor.state,
            });
        }
        if descriptor.remaining_inputs > 0 {
            return Err(WitnessError::NotReady {
                trace: self.trace(id),
                remaining: descriptor.remaining_inputs,
            });
        }
        self.get_mut(id)?.state = ComponentState::Running;
        Ok(())
    }

    pub fn complete(&mut self, id: ComponentId) -> Result<(), WitnessError> {
        let descriptor = self.get_mut(id)?;
        debug_assert_eq!(descriptor.state, ComponentState::Running);
        descriptor.state = ComponentState::Completed;
        Ok(())
    }

    /// `Completed` -> `Released`, dropping the child list.
    pub fn release(&mut self, id: ComponentId) -> Result<(), WitnessError> {
        let descriptor = self.get(id)?;
        if descriptor.state != ComponentState::Completed {
            return Err(WitnessError::PrematureRelease {
                trace: self.trace(id),
                state: descriptor.state,
            });
        }
        let descriptor = self.get_mut(id)?;
        descriptor.children = Vec::new();
        descriptor.state = ComponentState::Released;
        Ok(())
    }

    pub fn set_child(
        &mut self,
        parent: ComponentId,
        slot: usize,
        child: ComponentId,
    ) -> Result<(), WitnessError> {
        let len = self.get(parent)?.children.len();
        if slot >= len {
            return Err(WitnessError::ChildSlotOutOfRange {
                trace: self.trace(parent),
                slot,
                len,
            });
        }
        self.get_mut(parent)?.children[slot] = Some(child);
        Ok(())
    }

    pub fn child(&self, parent: ComponentId, slot: usize) -> Result<ComponentId, WitnessError> {
        let descriptor = self.get(parent)?;
        match descriptor.children.get(slot) {
            Some(Some(child)) => Ok(*child),
            Some(None) => Err(WitnessError::EmptyChildSlot {
                trace: self.trace(parent),
                slot,
            }),
            None => Err(WitnessError::ChildSlotOutOfRange {
                trace: self.trace(parent),
                slot,
                len: descriptor.children.len(),
            }),
        }
    }

    /// Populated child slots, in slot order.
    pub fn children(&self, parent: ComponentId) -> Result<Vec<ComponentId>, WitnessError> {
        Ok(self.get(parent)?.children.iter().flatten().copied().collect())
    }

    /// Display names from the root down to `id`, joined by the trace separator.
    pub fn trace(&self, id: ComponentId) -> String {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.slots.get(current.0).and_then(Option::as_ref) {
                Some(descriptor) => {
                    names.push(descriptor.name.as_str());
                    cursor = descriptor.parent;
                }
                None => break,
            }
        }
        names.reverse();
        names.join(&self.separator)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &ComponentDescriptor)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|d| (ComponentId(i), d)))
    }
}
