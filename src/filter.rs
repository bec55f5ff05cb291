use crate::{
    gear::{GearGroups, GearTable},
    item::Item,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("no gear selection at index {index} (have {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedGear {
    #[serde(default)]
    pub name: String,
}

impl SelectedGear {
    pub fn new(name: impl Into<String>) -> Self {
        SelectedGear { name: name.into() }
    }

    fn is_wildcard(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// Serializable snapshot of the gear selections in a search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterData {
    #[serde(default)]
    pub gear_types: Vec<SelectedGear>,
}

impl FilterData {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterData {
            gear_types: names.into_iter().map(SelectedGear::new).collect(),
        }
    }

    /// Every non-empty selection must hold. Known group names are looked
    /// up in the item's gear table; anything else is matched as a raw
    /// substring of the property names.
    pub fn matches(&self, item: &Item, groups: &GearGroups) -> bool {
        let mut table: Option<GearTable> = None;
        self.gear_types
            .iter()
            .filter(|selection| !selection.is_wildcard())
            .all(|selection| {
                let name = selection.name.trim();
                if groups.contains(name) {
                    table
                        .get_or_insert_with(|| groups.table_for(item))
                        .contains_key(name)
                } else {
                    item.has_property_containing(name)
                }
            })
    }
}

/// Ordered list of gear selections behind the search form.
#[derive(Debug, Clone, Default)]
pub struct GearTypeFilter {
    selections: Vec<SelectedGear>,
}

impl GearTypeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selections(&self) -> &[SelectedGear] {
        &self.selections
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Appends a blank selection and returns its index.
    pub fn add(&mut self) -> usize {
        self.selections.push(SelectedGear::default());
        self.selections.len() - 1
    }

    pub fn update(&mut self, index: usize, name: impl Into<String>) -> Result<(), FilterError> {
        let len = self.selections.len();
        let selection = self
            .selections
            .get_mut(index)
            .ok_or(FilterError::IndexOutOfRange { index, len })?;
        selection.name = name.into();
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<SelectedGear, FilterError> {
        if index >= self.selections.len() {
            return Err(FilterError::IndexOutOfRange {
                index,
                len: self.selections.len(),
            });
        }
        Ok(self.selections.remove(index))
    }

    pub fn reset(&mut self) {
        self.selections.clear();
    }

    pub fn from_form(&self) -> FilterData {
        FilterData {
            gear_types: self.selections.clone(),
        }
    }

    pub fn to_form(&mut self, data: &FilterData) {
        self.selections = data.gear_types.clone();
    }
}

/// Group names containing `query`, ignoring case, in table order.
pub fn suggest<'a>(groups: &'a GearGroups, query: &str) -> Vec<&'a str> {
    let query = query.to_lowercase();
    groups
        .names()
        .filter(|name| name.to_lowercase().contains(&query))
        .collect()
}
