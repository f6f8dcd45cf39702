use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::lang::value::DataType;

/// Index of a declared variable in the automaton's variable array.
pub type Slot = u32;

/// A declared variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub ty: DataType,
}

/// Variable name → slot binder.
///
/// Slots are dense and handed out in declaration order. Re-declaring a name
/// appends a new slot; lookups see the newest one, the older slot keeps its
/// name for disassembly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolTable {
    vars: Vec<Variable>,
    by_name: HashMap<String, Slot>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next slot for `name`.
    ///
    /// Returns the new slot and the slot it shadows, if any.
    pub fn declare(&mut self, name: &str, ty: DataType) -> (Slot, Option<Slot>) {
        let slot = self.vars.len() as Slot;
        self.vars.push(Variable {
            name: name.to_string(),
            ty,
        });
        let shadowed = self.by_name.insert(name.to_string(), slot);
        (slot, shadowed)
    }

    pub fn lookup(&self, name: &str) -> Option<Slot> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, slot: Slot) -> Option<&str> {
        self.vars.get(slot as usize).map(|v| v.name.as_str())
    }

    pub fn get(&self, slot: Slot) -> Option<&Variable> {
        self.vars.get(slot as usize)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Variables in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &Variable)> {
        self.vars.iter().enumerate().map(|(i, v)| (i as Slot, v))
    }
}

/// Subscription channel → receiving variable slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicTable {
    topics: Vec<(String, Slot)>,
}

impl TopicTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `channel` to `slot`, returning the previous binding.
    pub fn subscribe(&mut self, channel: &str, slot: Slot) -> Option<Slot> {
        match self.topics.iter_mut().find(|(c, _)| c == channel) {
            Some(entry) => Some(std::mem::replace(&mut entry.1, slot)),
            None => {
                self.topics.push((channel.to_string(), slot));
                None
            }
        }
    }

    pub fn lookup(&self, channel: &str) -> Option<Slot> {
        self.topics
            .iter()
            .find(|(c, _)| c == channel)
            .map(|(_, slot)| *slot)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Bindings in subscription order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Slot)> {
        self.topics.iter().map(|(c, s)| (c.as_str(), *s))
    }
}
