//! Content Class Hierarchy
//!
//! Classes are interned into an arena with a parent index so ancestry is a
//! plain data walk, independent of any object model. A hierarchy may hold
//! several roots; classes it has never seen behave as roots of their own.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a content class ("Texture2D", "/Script/Engine.StaticMesh").
///
/// Cloning shares the underlying string and clones compare by pointer.
/// Paths built from separate strings fall back to a content comparison.
/// Within one [`ClassHierarchy`] each declared class also has a dense
/// [`ClassId`], which rule resolution walks instead of names.
#[derive(Debug, Clone, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassPath(Arc<str>);

impl PartialEq for ClassPath {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

// Hashes as `str` so `Borrow<str>` lookups agree
impl Hash for ClassPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl ClassPath {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ClassPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ClassPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClassPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ClassPath {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl fmt::Display for ClassPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dense index of a class inside one [`ClassHierarchy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(usize);

impl ClassId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Errors raised while building a hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum HierarchyError {
    #[error("class '{class}' declared with parent '{existing}' and again with parent '{requested}'")]
    ConflictingParent {
        class: ClassPath,
        existing: ClassPath,
        requested: ClassPath,
    },

    #[error("class '{class}' is its own ancestor")]
    Cycle { class: ClassPath },
}

/// Immutable arena of classes plus a parent index
#[derive(Debug, Clone, Default)]
pub struct ClassHierarchy {
    names: Vec<ClassPath>,
    parents: Vec<Option<ClassId>>,
    index: HashMap<ClassPath, ClassId>,
}

impl ClassHierarchy {
    pub fn builder() -> ClassHierarchyBuilder {
        ClassHierarchyBuilder::default()
    }

    /// A hierarchy with no declared classes; every class is its own root
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, class: &str) -> bool {
        self.index.contains_key(class)
    }

    pub fn id_of(&self, class: &str) -> Option<ClassId> {
        self.index.get(class).copied()
    }

    pub fn name_of(&self, id: ClassId) -> Option<&ClassPath> {
        self.names.get(id.0)
    }

    /// Declared parent of a class, `None` for roots and unknown classes
    pub fn parent_of(&self, class: &str) -> Option<&ClassPath> {
        let id = self.id_of(class)?;
        let parent = self.parents[id.0]?;
        Some(&self.names[parent.0])
    }

    /// Walks from `class` itself up to its root.
    ///
    /// An unknown class yields only itself.
    pub fn ancestors<'a>(&'a self, class: &'a ClassPath) -> Ancestors<'a> {
        let state = match self.id_of(class.as_str()) {
            Some(id) => WalkState::Known(Some(id)),
            None => WalkState::Unknown(Some(class)),
        };
        Ancestors {
            hierarchy: self,
            state,
        }
    }

    /// Ids from `id` itself up to its root; empty for an id of another hierarchy
    pub fn ancestor_ids(&self, id: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        let start = (id.0 < self.parents.len()).then_some(id);
        std::iter::successors(start, |current| self.parents[current.0])
    }

    /// Number of edges between `class` and its root
    pub fn depth(&self, class: &ClassPath) -> usize {
        self.ancestors(class).count().saturating_sub(1)
    }

    /// True when `class` is `ancestor` or descends from it
    pub fn is_a(&self, class: &ClassPath, ancestor: &str) -> bool {
        self.ancestors(class).any(|c| c.as_str() == ancestor)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassPath> {
        self.names.iter()
    }
}

enum WalkState<'a> {
    Unknown(Option<&'a ClassPath>),
    Known(Option<ClassId>),
}

/// Iterator returned by [`ClassHierarchy::ancestors`]
pub struct Ancestors<'a> {
    hierarchy: &'a ClassHierarchy,
    state: WalkState<'a>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ClassPath;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            WalkState::Unknown(class) => class.take(),
            WalkState::Known(current) => {
                let id = (*current)?;
                *current = self.hierarchy.parents[id.0];
                Some(&self.hierarchy.names[id.0])
            }
        }
    }
}

/// Collects class declarations before freezing them into a [`ClassHierarchy`]
#[derive(Debug, Default)]
pub struct ClassHierarchyBuilder {
    names: Vec<ClassPath>,
    parents: Vec<Option<ClassPath>>,
    index: HashMap<ClassPath, usize>,
    conflict: Option<HierarchyError>,
}

impl ClassHierarchyBuilder {
    /// Declare a class and, optionally, its parent.
    ///
    /// Parents that were never declared become roots. Re-declaring a class
    /// without a parent keeps the parent it already has.
    pub fn declare(&mut self, name: impl Into<ClassPath>, parent: Option<&str>) -> &mut Self {
        let name = name.into();
        let slot = self.intern(name.clone());

        if let Some(parent) = parent {
            self.intern(ClassPath::new(parent));
            match &self.parents[slot] {
                Some(existing) if existing.as_str() != parent => {
                    if self.conflict.is_none() {
                        self.conflict = Some(HierarchyError::ConflictingParent {
                            class: name,
                            existing: existing.clone(),
                            requested: ClassPath::new(parent),
                        });
                    }
                }
                Some(_) => {}
                None => self.parents[slot] = Some(ClassPath::new(parent)),
            }
        }
        self
    }

    fn intern(&mut self, name: ClassPath) -> usize {
        if let Some(&slot) = self.index.get(&name) {
            return slot;
        }
        let slot = self.names.len();
        self.index.insert(name.clone(), slot);
        self.names.push(name);
        self.parents.push(None);
        slot
    }

    pub fn build(self) -> Result<ClassHierarchy, HierarchyError> {
        if let Some(conflict) = self.conflict {
            return Err(conflict);
        }

        let parents: Vec<Option<ClassId>> = self
            .parents
            .iter()
            .map(|parent| {
                parent
                    .as_ref()
                    .and_then(|p| self.index.get(p.as_str()).copied().map(ClassId))
            })
            .collect();

        // A chain longer than the arena must revisit a node.
        let limit = self.names.len();
        for start in 0..self.names.len() {
            let mut current = parents[start];
            let mut steps = 0;
            while let Some(id) = current {
                steps += 1;
                if id.0 == start || steps > limit {
                    return Err(HierarchyError::Cycle {
                        class: self.names[start].clone(),
                    });
                }
                current = parents[id.0];
            }
        }

        let index = self
            .index
            .into_iter()
            .map(|(name, slot)| (name, ClassId(slot)))
            .collect();

        Ok(ClassHierarchy {
            names: self.names,
            parents,
            index,
        })
    }
}
