use nftkit_wire::{Command, SerializedBatch, WireError};

use crate::context::Context;

/// An ordered, append-only sequence of commands, together with the context at its end.
///
/// Appending consumes the batch and returns the extended one; a batch never changes in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    commands: Vec<Command>,
    context: Context,
}

impl Batch {
    /// An empty batch starting from `context`.
    pub fn new(context: Context) -> Self {
        Self { commands: Vec::new(), context }
    }

    pub fn append(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Replaces the context carried to the next call.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Serializes the commands in append order. This cannot fail.
    pub fn serialize(&self) -> SerializedBatch {
        SerializedBatch::encode(&self.commands)
    }

    /// Reads a serialized batch back. The context of the result is the default one.
    pub fn parse(serialized: &SerializedBatch) -> Result<Self, WireError> {
        Ok(Self { commands: serialized.commands()?, context: Context::default() })
    }
}

impl IntoIterator for Batch {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}
