//! Assignment of the main component's input signals by name.

use std::collections::HashMap;

use ark_ff::PrimeField;
use serde_json::Value;

use crate::circuit::Circuit;
use crate::error::InputError;
use crate::field;

#[derive(Debug, Clone, Default)]
pub struct InputAssignment<F> {
    values: HashMap<String, Vec<F>>,
}

impl<F: PrimeField> InputAssignment<F> {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Assigns a (flattened, row-major) input array.
    pub fn set(&mut self, name: impl Into<String>, values: Vec<F>) -> &mut Self {
        self.values.insert(name.into(), values);
        self
    }

    pub fn set_scalar(&mut self, name: impl Into<String>, value: F) -> &mut Self {
        self.set(name, vec![value])
    }

    /// Parses `{ "name": value, ... }` where each value is a decimal string, an
    /// integer, or a nested array of those.
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        let document: Value =
            serde_json::from_str(json).map_err(|e| InputError::Json(e.to_string()))?;
        let Value::Object(entries) = document else {
            return Err(InputError::Json("expected an object of input signals".to_string()));
        };
        let mut assignment = Self::new();
        for (name, value) in entries {
            let mut flat = Vec::new();
            flatten(&name, &value, &mut flat)?;
            assignment.set(name, flat);
        }
        Ok(assignment)
    }

    /// Orders the assigned values as the circuit's main inputs.
    pub fn to_signals(&self, circuit: &Circuit<F>) -> Result<Vec<F>, InputError> {
        let declared = circuit.inputs();
        if let Some(unknown) = self
            .values
            .keys()
            .find(|name| !declared.iter().any(|input| &input.name == *name))
        {
            return Err(InputError::UnknownSignal(unknown.clone()));
        }
        let mut signals = Vec::with_capacity(circuit.main_input_count());
        for input in &declared {
            let values = self
                .values
                .get(&input.name)
                .ok_or_else(|| InputError::MissingSignal(input.name.clone()))?;
            if values.len() != input.len() {
                return Err(InputError::WrongLength {
                    name: input.name.clone(),
                    expected: input.len(),
                    actual: values.len(),
                });
            }
            signals.extend_from_slice(values);
        }
        Ok(signals)
    }
}

fn flatten<F: PrimeField>(name: &str, value: &Value, out: &mut Vec<F>) -> Result<(), InputError> {
    let invalid = |reason: String| InputError::InvalidValue {
        name: name.to_string(),
        reason,
    };
    match value {
        Value::Array(items) => items.iter().try_for_each(|item| flatten(name, item, out)),
        Value::String(s) => {
            out.push(field::from_decimal(s).map_err(|e| invalid(e.to_string()))?);
            Ok(())
        }
        Value::Number(n) => {
            let element = if let Some(u) = n.as_u64() {
                field::from_int(u)
            } else if let Some(i) = n.as_i64() {
                -field::from_int::<F>(i.unsigned_abs())
            } else {
                return Err(invalid(format!("{n} is not an integer")));
            };
            out.push(element);
            Ok(())
        }
        other => Err(invalid(format!("unsupported value {other}"))),
    }
}
