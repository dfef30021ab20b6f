use nftkit_wire::{Command, Family, Kind, Operation, SerializedBatch, Spec};

use crate::{
    batch::Batch, classify::classify, context::Context, factory, value::FieldBag, Result,
};

/// Options for a [`BatchBuilder`].
#[derive(Debug, Clone)]
pub struct BuilderOptions {
    /// The family used until a call names one together with a table.
    pub default_family: Family,
}

impl BuilderOptions {
    pub fn with_default_family(mut self, family: Family) -> Self {
        self.default_family = family;
        self
    }
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self { default_family: Family::Ip }
    }
}

/// A single-threaded session that accumulates a [`Batch`] and its [`Context`].
///
/// Every call is all-or-nothing: when it fails, neither the commands nor the context change.
///
/// # Example
///
/// ```
/// use nftkit_builder::{expr::{tcp, Expr}, fields, BatchBuilder};
///
/// let mut builder = BatchBuilder::new();
/// builder
///     .add(fields! { "table" => "filter" })?
///     .add(fields! { "chain" => "INPUT", "hook" => "input", "policy" => "drop" })?
///     .add(fields! { "rule" => Expr::new().with(tcp::dport(22)).accept() })?;
///
/// let batch = builder.build();
/// assert_eq!(batch.len(), 3);
/// assert_eq!(batch.commands()[2].get_str("chain"), Some("INPUT"));
/// # Ok::<(), nftkit_builder::BuildError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BatchBuilder {
    options: BuilderOptions,
    batch: Batch,
}

impl Default for BatchBuilder {
    fn default() -> Self {
        Self::with_options(BuilderOptions::default())
    }
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BuilderOptions) -> Self {
        let batch = Batch::new(Context::new(options.default_family));
        Self { options, batch }
    }

    pub fn add(&mut self, fields: FieldBag) -> Result<&mut Self> {
        self.apply(Operation::Add, fields)
    }

    pub fn delete(&mut self, fields: FieldBag) -> Result<&mut Self> {
        self.apply(Operation::Delete, fields)
    }

    pub fn flush(&mut self, fields: FieldBag) -> Result<&mut Self> {
        self.apply(Operation::Flush, fields)
    }

    pub fn insert(&mut self, fields: FieldBag) -> Result<&mut Self> {
        self.apply(Operation::Insert, fields)
    }

    pub fn replace(&mut self, fields: FieldBag) -> Result<&mut Self> {
        self.apply(Operation::Replace, fields)
    }

    pub fn rename(&mut self, fields: FieldBag) -> Result<&mut Self> {
        self.apply(Operation::Rename, fields)
    }

    /// Appends a flush of the whole ruleset, across all families.
    pub fn flush_ruleset(&mut self) -> &mut Self {
        let command = Command::new(Operation::Flush, Kind::Ruleset, Spec::new());
        tracing::debug!(?command, "appended command");
        self.commit(vec![command], None);
        self
    }

    /// Explicitly overwrites or clears context slots. See [`Context::set`].
    pub fn set_context(&mut self, fields: FieldBag) -> Result<&mut Self> {
        let context = self.batch.context().set(&fields, self.options.default_family)?;
        tracing::debug!(?context, "context set");
        self.commit(Vec::new(), Some(context));
        Ok(self)
    }

    pub fn context(&self) -> &Context {
        self.batch.context()
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Shorthand for serializing the current batch.
    pub fn serialize(&self) -> SerializedBatch {
        self.batch.serialize()
    }

    /// Consumes the session, returning the accumulated batch.
    pub fn build(self) -> Batch {
        self.batch
    }

    fn apply(&mut self, operation: Operation, fields: FieldBag) -> Result<&mut Self> {
        let classified = classify(&fields)?;
        let commands = factory::build(operation, &classified, &fields, self.batch.context())
            .map_err(|e| {
                tracing::debug!(%operation, kind = %classified.kind, error = %e, "rejected call");
                e
            })?;

        let update = classified.scope_update(operation, &fields);
        let context = (!update.is_empty()).then(|| self.batch.context().merge(&update));

        for command in &commands {
            tracing::debug!(?command, "appended command");
        }
        if let Some(context) = &context {
            tracing::debug!(?context, "context updated");
        }

        self.commit(commands, context);
        Ok(self)
    }

    fn commit(&mut self, commands: Vec<Command>, context: Option<Context>) {
        let batch = std::mem::take(&mut self.batch);
        let context = context.unwrap_or_else(|| batch.context().clone());
        self.batch = commands.into_iter().fold(batch, Batch::append).with_context(context);
    }
}
