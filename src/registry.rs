//! Pass-scoped schema registry.
//!
//! Deduplicates schema generation per canonical type name and hands out
//! `$ref` schemas pointing at the shared definitions. A type is registered
//! *before* its fields are resolved, so a re-entrant request for the same
//! type (a cycle) finds it already present and receives a reference.

use std::collections::{HashMap, HashSet};

use crate::error::SchemaError;
use crate::model::Schema;
use crate::types::TypeDescriptor;

/// Prefix of every ref handed out by the registry.
pub const REF_PREFIX: &str = "#/components/schemas/";

/// Build the ref for a registered name.
pub fn ref_for_name(name: &str) -> String {
    format!("{}{}", REF_PREFIX, name)
}

/// Registered name a ref points at (the last path segment).
pub fn name_from_ref(schema_ref: &str) -> &str {
    schema_ref.rsplit('/').next().unwrap_or(schema_ref)
}

/// One registered definition.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    /// Canonical type name this entry was registered for.
    pub type_name: String,
    /// Assigned definition name; stable for the rest of the pass.
    pub name: String,
    pub schema: Schema,
}

impl RegistryEntry {
    pub fn schema_ref(&self) -> String {
        ref_for_name(&self.name)
    }
}

/// Definitions registered during one resolution pass.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entries: Vec<RegistryEntry>,
    by_type: HashMap<String, usize>,
    names: HashSet<String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once `ty` has been registered, fully or provisionally.
    pub fn has(&self, ty: &TypeDescriptor) -> bool {
        self.by_type.contains_key(&ty.canonical_name())
    }

    /// Register `schema` for `ty` and return the stored schema with its
    /// assigned name.
    ///
    /// The name comes from the schema's own `name` when set, otherwise from
    /// the type's simple name; a numeric suffix is appended if another type
    /// already holds it. Re-registering a type returns the stored schema and
    /// ignores the argument.
    pub fn register(&mut self, ty: &TypeDescriptor, mut schema: Schema) -> Schema {
        let type_name = ty.canonical_name();
        if let Some(&idx) = self.by_type.get(&type_name) {
            return self.entries[idx].schema.clone();
        }

        let hint = schema
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| ty.simple_name());
        let name = self.unique_name(&hint);
        tracing::debug!(type_name = %type_name, name = %name, "registered schema");

        schema.name = Some(name.clone());
        self.names.insert(name.clone());
        self.by_type.insert(type_name.clone(), self.entries.len());
        self.entries.push(RegistryEntry {
            type_name,
            name,
            schema: schema.clone(),
        });
        schema
    }

    /// Replace the definition for an already registered type, keeping its name.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotRegistered` if `ty` was never registered.
    pub fn complete(&mut self, ty: &TypeDescriptor, mut schema: Schema) -> Result<(), SchemaError> {
        let entry = self.entry_mut(ty)?;
        schema.name = Some(entry.name.clone());
        entry.schema = schema;
        Ok(())
    }

    /// A schema carrying only the `$ref` of `ty`'s definition.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotRegistered` if `ty` was never registered;
    /// callers check [`SchemaRegistry::has`] first.
    pub fn lookup_ref(&self, ty: &TypeDescriptor) -> Result<Schema, SchemaError> {
        Ok(Schema::reference(self.entry(ty)?.schema_ref()))
    }

    /// The registered entry for `ty`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotRegistered` if `ty` was never registered.
    pub fn entry(&self, ty: &TypeDescriptor) -> Result<&RegistryEntry, SchemaError> {
        let type_name = ty.canonical_name();
        self.by_type
            .get(&type_name)
            .map(|&idx| &self.entries[idx])
            .ok_or(SchemaError::NotRegistered { type_name })
    }

    /// Entry by assigned definition name.
    pub fn by_name(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Entries in registration order.
    pub fn definitions(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// End the pass, yielding `(name, schema)` definitions in registration order.
    pub fn into_components(self) -> Vec<(String, Schema)> {
        self.entries
            .into_iter()
            .map(|e| (e.name, e.schema))
            .collect()
    }

    fn entry_mut(&mut self, ty: &TypeDescriptor) -> Result<&mut RegistryEntry, SchemaError> {
        let type_name = ty.canonical_name();
        match self.by_type.get(&type_name) {
            Some(&idx) => Ok(&mut self.entries[idx]),
            None => Err(SchemaError::NotRegistered { type_name }),
        }
    }

    fn unique_name(&self, hint: &str) -> String {
        if !self.names.contains(hint) {
            return hint.to_string();
        }
        (1..)
            .map(|i| format!("{}{}", hint, i))
            .find(|candidate| !self.names.contains(candidate))
            .unwrap_or_else(|| hint.to_string())
    }
}
