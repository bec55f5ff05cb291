use crate::item::{extract_number, Item, ItemProperty};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Derived gear sums for one item, keyed by group name. Groups that
/// matched nothing are absent rather than zero.
pub type GearTable = BTreeMap<String, f64>;

/// Pulls a magnitude out of a property's display text.
pub type Extractor = fn(&str) -> Option<f64>;

// Summed as-is; each group's name is its first pattern.
const GEAR_SIMPLE_SUM: &[&[&str]] = &[
    &["Ring"],
    &["Amulet"],
    &["Helmet"],
    &["Chest"],
    &["Belt"],
    &["Gloves"],
    &["Boots"],
    &["Axe"],
    &["Claw"],
    &["Bow"],
    &["Dagger"],
    &["Mace"],
    &["Quiver"],
    &["Sceptre"],
    &["Staff"],
    &["Sword"],
    &["Shield"],
    &["Wand"],
    &["Flask"],
    &["Map"],
    &["QuestItem"],
    &["DivinationCard"],
    &["Jewel"],
    &["Talisman"],
    &["Unknown"],
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("gear group {0:?} has no patterns")]
    NoPatterns(String),
    #[error("gear group {0:?} contains an empty pattern")]
    EmptyPattern(String),
    #[error("duplicate gear group {0:?}")]
    Duplicate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGroup")]
pub struct PropertyGroup {
    name: String,
    patterns: Vec<String>,
}

#[derive(Deserialize)]
struct RawGroup {
    #[serde(default)]
    name: Option<String>,
    patterns: Vec<String>,
}

impl TryFrom<RawGroup> for PropertyGroup {
    type Error = GroupError;

    fn try_from(raw: RawGroup) -> Result<Self, Self::Error> {
        match raw.name {
            Some(name) => PropertyGroup::new(name, raw.patterns),
            None => PropertyGroup::from_patterns(raw.patterns),
        }
    }
}

impl PropertyGroup {
    pub fn new<N, I, P>(name: N, patterns: I) -> Result<Self, GroupError>
    where
        N: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let name = name.into();
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        if patterns.is_empty() {
            return Err(GroupError::NoPatterns(name));
        }
        if patterns.iter().any(|pattern| pattern.is_empty()) {
            return Err(GroupError::EmptyPattern(name));
        }
        Ok(PropertyGroup { name, patterns })
    }

    /// Names the group after its first pattern.
    pub fn from_patterns<I, P>(patterns: I) -> Result<Self, GroupError>
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let name = patterns.first().cloned().unwrap_or_default();
        Self::new(name, patterns)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Sums every pattern match across `properties`. A property matching
    /// several patterns is counted once per pattern. Returns `None` when
    /// nothing matched at all.
    pub fn generate(&self, properties: &[ItemProperty], extract: Extractor) -> Option<f64> {
        let mut present = false;
        let mut total = 0.0;
        for property in properties {
            for pattern in &self.patterns {
                if let Some(value) = match_pattern(pattern, property, extract) {
                    total += value;
                    present = true;
                }
            }
        }
        present.then_some(total)
    }
}

/// Returns the property's magnitude when `pattern` occurs in its name.
/// Text without a parsable number still matches and yields zero.
pub fn match_pattern(pattern: &str, property: &ItemProperty, extract: Extractor) -> Option<f64> {
    if !property.name.contains(pattern) {
        return None;
    }
    Some(extract(&property.display_text()).unwrap_or(0.0))
}

pub fn generate_all(
    groups: &[PropertyGroup],
    properties: &[ItemProperty],
    extract: Extractor,
) -> GearTable {
    groups
        .iter()
        .filter_map(|group| {
            group
                .generate(properties, extract)
                .map(|total| (group.name.clone(), total))
        })
        .collect()
}

/// The immutable group table loaded at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GearGroups {
    groups: Vec<PropertyGroup>,
}

impl Default for GearGroups {
    fn default() -> Self {
        let groups = GEAR_SIMPLE_SUM
            .iter()
            .filter_map(|patterns| PropertyGroup::from_patterns(patterns.iter().copied()).ok())
            .collect();
        GearGroups { groups }
    }
}

impl GearGroups {
    pub fn new(groups: Vec<PropertyGroup>) -> Result<Self, GroupError> {
        for (index, group) in groups.iter().enumerate() {
            if groups[..index].iter().any(|other| other.name == group.name) {
                return Err(GroupError::Duplicate(group.name.clone()));
            }
        }
        Ok(GearGroups { groups })
    }

    pub fn groups(&self) -> &[PropertyGroup] {
        &self.groups
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(PropertyGroup::name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.iter().any(|group| group.name == name)
    }

    pub fn generate_all(&self, properties: &[ItemProperty], extract: Extractor) -> GearTable {
        generate_all(&self.groups, properties, extract)
    }

    pub fn table_for(&self, item: &Item) -> GearTable {
        self.generate_all(&item.properties, extract_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_five(_: &str) -> Option<f64> {
        Some(5.0)
    }

    fn group(patterns: &[&str]) -> PropertyGroup {
        PropertyGroup::from_patterns(patterns.iter().copied()).expect("valid group")
    }

    #[test]
    fn no_match_is_absent() {
        let ring = group(&["Ring"]);
        assert_eq!(ring.generate(&[], extract_number), None);
        let props = vec![ItemProperty::named("Amulet")];
        assert_eq!(ring.generate(&props, extract_number), None);
        assert_eq!(match_pattern("Ring", &props[0], extract_number), None);
    }

    #[test]
    fn unparsable_match_counts_as_zero() {
        let ring = group(&["Ring"]);
        let props = vec![ItemProperty::new("Ring of X", "n/a")];
        assert_eq!(ring.generate(&props, extract_number), Some(0.0));
    }

    #[test]
    fn sums_embedded_number() {
        let sword = group(&["Sword"]);
        let props = vec![ItemProperty::new("12% increased Sword Damage", "—")];
        assert_eq!(sword.generate(&props, extract_number), Some(12.0));
    }

    #[test]
    fn property_matching_two_patterns_counts_twice() {
        let flask = group(&["Flask", "Life"]);
        let props = vec![ItemProperty::named("Life Flask")];
        assert_eq!(flask.generate(&props, always_five), Some(10.0));
    }

    #[test]
    fn sums_across_properties() {
        let life = group(&["maximum Life"]);
        let props = vec![
            ItemProperty::named("+20 to maximum Life"),
            ItemProperty::named("+15 to maximum Life"),
            ItemProperty::named("+10 to maximum Mana"),
        ];
        assert_eq!(life.generate(&props, extract_number), Some(35.0));
    }

    #[test]
    fn match_is_case_sensitive() {
        let props = vec![ItemProperty::named("ring")];
        assert_eq!(match_pattern("Ring", &props[0], extract_number), None);
    }

    #[test]
    fn generate_all_skips_absent_groups() {
        let groups = GearGroups::default();
        let props = vec![ItemProperty::named("Ring"), ItemProperty::named("Jewel 3")];
        let table = groups.generate_all(&props, extract_number);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Ring"), Some(&0.0));
        assert_eq!(table.get("Jewel"), Some(&3.0));
        assert!(!table.contains_key("Amulet"));
    }

    #[test]
    fn generate_all_is_idempotent() {
        let groups = GearGroups::default();
        let props = vec![
            ItemProperty::named("Sword 4"),
            ItemProperty::named("Shield 2"),
        ];
        let first = groups.generate_all(&props, extract_number);
        let second = groups.generate_all(&props, extract_number);
        assert_eq!(first, second);
    }

    #[test]
    fn disjoint_groups_do_not_interact() {
        let groups = vec![group(&["Bow"]), group(&["Quiver"])];
        let props = vec![ItemProperty::named("Bow 7")];
        let table = generate_all(&groups, &props, extract_number);
        assert_eq!(table.get("Bow"), Some(&7.0));
        assert_eq!(table.get("Quiver"), None);
    }

    #[test]
    fn shared_pattern_feeds_both_groups() {
        let groups = vec![
            group(&["Staff"]),
            PropertyGroup::new("Caster", ["Staff", "Wand"]).expect("valid group"),
        ];
        let props = vec![ItemProperty::named("Staff 2")];
        let table = generate_all(&groups, &props, extract_number);
        assert_eq!(table.get("Staff"), Some(&2.0));
        assert_eq!(table.get("Caster"), Some(&2.0));
    }

    #[test]
    fn rejects_bad_groups() {
        assert_eq!(
            PropertyGroup::new("Empty", Vec::<String>::new()),
            Err(GroupError::NoPatterns("Empty".to_string()))
        );
        assert_eq!(
            PropertyGroup::new("Blank", [""]),
            Err(GroupError::EmptyPattern("Blank".to_string()))
        );
        assert_eq!(
            GearGroups::new(vec![group(&["Ring"]), group(&["Ring"])]),
            Err(GroupError::Duplicate("Ring".to_string()))
        );
    }

    #[test]
    fn default_table_lists_every_gear_class() {
        let groups = GearGroups::default();
        assert_eq!(groups.groups().len(), 25);
        assert_eq!(groups.names().next(), Some("Ring"));
        assert!(groups.contains("DivinationCard"));
    }

    #[test]
    fn deserializes_groups_with_and_without_names() {
        let raw = r#"[{"patterns": ["Boots"]}, {"name": "Armour", "patterns": ["Helmet", "Chest"]}]"#;
        let groups: Vec<PropertyGroup> = serde_json::from_str(raw).expect("groups parse");
        assert_eq!(groups[0].name(), "Boots");
        assert_eq!(groups[1].patterns().len(), 2);
        let bad: Result<Vec<PropertyGroup>, _> = serde_json::from_str(r#"[{"patterns": []}]"#);
        assert!(bad.is_err());
    }
}
