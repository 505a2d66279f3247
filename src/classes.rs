//! The class-name to id table used for every label of a run.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::ConvertError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    pub id: usize,
    pub name: String,
}

/// Immutable class table, sorted by id.
///
/// Built either from an explicit table ([`ClassTable::fixed`]) or from the
/// class directories of the input root ([`ClassTable::discover`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTable {
    entries: Vec<ClassEntry>,
}

impl ClassTable {
    /// Use an explicit name to id table. Names and ids must be unique.
    pub fn fixed<I, S>(entries: I) -> Result<Self, ConvertError>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut seen_names = HashSet::new();
        let mut seen_ids = HashSet::new();
        let mut table = Vec::new();
        for (name, id) in entries {
            let name = name.into();
            if !seen_names.insert(name.clone()) {
                return Err(ConvertError::DuplicateClass(name));
            }
            if !seen_ids.insert(id) {
                return Err(ConvertError::DuplicateClassId(id));
            }
            table.push(ClassEntry { id, name });
        }
        table.sort_by_key(|entry| entry.id);
        Ok(Self { entries: table })
    }

    /// Ids follow list position.
    pub fn from_list<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Result<Self, ConvertError> {
        Self::fixed(names.into_iter().enumerate().map(|(id, name)| (name, id)))
    }

    /// Sorted names of the subdirectories of `root`, numbered from zero.
    pub fn discover(root: &Path) -> Result<Self, ConvertError> {
        if !root.is_dir() {
            return Err(ConvertError::MissingInputDir(root.to_path_buf()));
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => log::warn!("Skipping class directory with non UTF-8 name: {:?}", name),
            }
        }
        if names.is_empty() {
            return Err(ConvertError::NoClasses(root.to_path_buf()));
        }
        names.sort();
        Self::from_list(names)
    }

    pub fn entries(&self) -> &[ClassEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
