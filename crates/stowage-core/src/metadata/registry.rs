//! Class metadata registry
//!
//! Classes are declared up front with an optional parent. Each class owns the
//! descriptors registered on it; lookups walk the ancestor chain so a subclass
//! sees everything its parents declared, and a redeclared field supersedes the
//! parent's record.
//!
//! Merged field lists are memoized the first time a class is bound. Later
//! registration on a class drops the memo of that class and every descendant.

use super::types::{ClassId, FieldDescriptor};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

#[derive(Debug)]
struct ClassEntry {
    name: String,
    parent: Option<ClassId>,
    /// Own fields in registration order
    fields: Vec<String>,
    descriptors: HashMap<String, FieldDescriptor>,
}

/// Store of class descriptions and their field descriptors
#[derive(Debug, Default)]
pub struct Registry {
    classes: Vec<ClassEntry>,
    cache: RwLock<HashMap<ClassId, Arc<[String]>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a class, optionally extending an already declared parent
    pub fn declare_class(
        &mut self,
        name: impl Into<String>,
        parent: Option<ClassId>,
    ) -> Result<ClassId> {
        if let Some(parent) = parent {
            self.entry(parent)?;
        }

        let id = ClassId(self.classes.len());
        let name = name.into();
        debug!(class = %name, id = %id, parent = ?parent, "declared class");
        self.classes.push(ClassEntry {
            name,
            parent,
            fields: Vec::new(),
            descriptors: HashMap::new(),
        });
        Ok(id)
    }

    /// Number of declared classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class_name(&self, class: ClassId) -> Result<&str> {
        Ok(&self.entry(class)?.name)
    }

    pub fn parent(&self, class: ClassId) -> Result<Option<ClassId>> {
        Ok(self.entry(class)?.parent)
    }

    /// Most recently declared class with the given name
    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.classes
            .iter()
            .rposition(|entry| entry.name == name)
            .map(ClassId)
    }

    /// The class itself followed by its ancestors, nearest first
    pub fn ancestry(&self, class: ClassId) -> Result<Vec<ClassId>> {
        let mut chain = vec![class];
        let mut current = self.entry(class)?.parent;
        while let Some(id) = current {
            chain.push(id);
            current = self.entry(id)?.parent;
        }
        Ok(chain)
    }

    /// Whether `class` is `ancestor` or extends it
    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        self.ancestry(class)
            .map(|chain| chain.contains(&ancestor))
            .unwrap_or(false)
    }

    /// Fields registered directly on a class
    pub fn own_fields(&self, class: ClassId) -> Result<&[String]> {
        Ok(&self.entry(class)?.fields)
    }

    /// Merged field list: own fields first, then each ancestor's unseen names
    pub fn field_list(&self, class: ClassId) -> Result<Vec<String>> {
        if let Some(cached) = self.cached(class) {
            return Ok(cached.to_vec());
        }
        self.merge_fields(class)
    }

    /// Append a field to a class's own list; a no-op if already present
    pub fn register_field(&mut self, class: ClassId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let entry = self.entry_mut(class)?;
        if !entry.fields.contains(&name) {
            entry.fields.push(name);
        }
        self.invalidate(class);
        Ok(())
    }

    /// Memoize the merged field list of a class
    pub fn finalize(&self, class: ClassId) -> Result<Arc<[String]>> {
        if let Some(cached) = self.cached(class) {
            return Ok(cached);
        }

        let fields: Arc<[String]> = self.merge_fields(class)?.into();
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(class, Arc::clone(&fields));
        }
        debug!(class = %self.entry(class)?.name, fields = fields.len(), "finalized field list");
        Ok(fields)
    }

    /// Whether the merged field list is currently memoized
    pub fn is_finalized(&self, class: ClassId) -> bool {
        self.cached(class).is_some()
    }

    /// Existing descriptor (own or inherited) or a fresh default
    pub fn get_or_create(&self, class: ClassId, field: &str) -> Result<FieldDescriptor> {
        Ok(self
            .descriptor(class, field)?
            .cloned()
            .unwrap_or_else(|| FieldDescriptor::new(field)))
    }

    /// Store a descriptor on a class and register the field
    pub fn set(
        &mut self,
        class: ClassId,
        field: &str,
        mut descriptor: FieldDescriptor,
    ) -> Result<()> {
        let class_name = self.entry(class)?.name.clone();
        descriptor
            .check_invariants()
            .map_err(|message| Error::configuration(message, Some(&class_name)))?;

        descriptor.name = field.to_string();
        self.entry_mut(class)?
            .descriptors
            .insert(field.to_string(), descriptor);
        self.register_field(class, field)
    }

    /// Descriptor lookup walking the ancestor chain; the lowest record wins
    pub fn descriptor(&self, class: ClassId, field: &str) -> Result<Option<&FieldDescriptor>> {
        let mut current = Some(class);
        while let Some(id) = current {
            let entry = self.entry(id)?;
            if let Some(descriptor) = entry.descriptors.get(field) {
                return Ok(Some(descriptor));
            }
            current = entry.parent;
        }
        Ok(None)
    }

    fn entry(&self, class: ClassId) -> Result<&ClassEntry> {
        self.classes
            .get(class.0)
            .ok_or(Error::UnknownClass { id: class })
    }

    fn entry_mut(&mut self, class: ClassId) -> Result<&mut ClassEntry> {
        self.classes
            .get_mut(class.0)
            .ok_or(Error::UnknownClass { id: class })
    }

    fn cached(&self, class: ClassId) -> Option<Arc<[String]>> {
        self.cache
            .read()
            .ok()
            .and_then(|cache| cache.get(&class).cloned())
    }

    fn merge_fields(&self, class: ClassId) -> Result<Vec<String>> {
        let mut merged: Vec<String> = Vec::new();
        for id in self.ancestry(class)? {
            for name in &self.entry(id)?.fields {
                if !merged.contains(name) {
                    merged.push(name.clone());
                }
            }
        }
        Ok(merged)
    }

    /// Drop memo entries for a class and all of its descendants
    fn invalidate(&mut self, class: ClassId) {
        let stale: Vec<ClassId> = (0..self.classes.len())
            .map(ClassId)
            .filter(|id| self.is_subclass_of(*id, class))
            .collect();

        if let Ok(cache) = self.cache.get_mut() {
            for id in stale {
                cache.remove(&id);
            }
        }
    }
}
