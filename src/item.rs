use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// A single modifier line on an item. `value` holds the number-bearing
/// text and may be empty when the name already carries the number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawProperty")]
pub struct ItemProperty {
    pub name: String,
    pub value: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProperty {
    Text(String),
    Named {
        name: String,
        #[serde(default)]
        value: String,
    },
}

impl From<RawProperty> for ItemProperty {
    fn from(raw: RawProperty) -> Self {
        match raw {
            RawProperty::Text(name) => ItemProperty {
                name,
                value: String::new(),
            },
            RawProperty::Named { name, value } => ItemProperty { name, value },
        }
    }
}

impl ItemProperty {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        ItemProperty {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }

    /// Text handed to the number extractor.
    pub fn display_text(&self) -> String {
        let value = self.value.trim();
        if value.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: Vec<ItemProperty>,
}

impl Item {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "(unnamed)"
        } else {
            &self.name
        }
    }

    pub fn has_property_containing(&self, needle: &str) -> bool {
        self.properties
            .iter()
            .any(|property| property.name.contains(needle))
    }
}

pub fn load_items(path: &Path) -> Result<Vec<Item>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read items file {}", path.display()))?;
    parse_items(&raw).with_context(|| format!("parse items file {}", path.display()))
}

/// Accepts either a JSON array of items or a single item object.
pub fn parse_items(raw: &str) -> Result<Vec<Item>> {
    let value: serde_json::Value = serde_json::from_str(raw).context("parse items json")?;
    if value.is_array() {
        return serde_json::from_value(value).context("decode item list");
    }
    let item: Item = serde_json::from_value(value).context("decode item")?;
    Ok(vec![item])
}

/// Averages every decimal number found in `text`, so ranged lines like
/// "Adds 1 to 5 Fire Damage" collapse to a single magnitude.
pub fn extract_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut total = 0.0;
    let mut count = 0usize;
    let mut index = 0usize;

    while index < bytes.len() {
        let start = index;
        let mut cursor = index;
        // A sign right after a digit is a range separator, as in "10-20".
        let after_digit = cursor > 0 && bytes[cursor - 1].is_ascii_digit();
        if !after_digit
            && matches!(bytes[cursor], b'+' | b'-')
            && bytes.get(cursor + 1).is_some_and(u8::is_ascii_digit)
        {
            cursor += 1;
        }
        if !bytes[cursor].is_ascii_digit() {
            index += 1;
            continue;
        }
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        if cursor + 1 < bytes.len()
            && bytes[cursor] == b'.'
            && bytes[cursor + 1].is_ascii_digit()
        {
            cursor += 1;
            while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
                cursor += 1;
            }
        }
        if let Ok(number) = text[start..cursor].parse::<f64>() {
            total += number;
            count += 1;
        }
        index = cursor;
    }

    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_leading_percentage() {
        assert_eq!(extract_number("12% increased Sword Damage"), Some(12.0));
    }

    #[test]
    fn averages_ranges() {
        assert_eq!(extract_number("Adds 1 to 5 Fire Damage"), Some(3.0));
    }

    #[test]
    fn dash_between_numbers_is_a_range() {
        let property = ItemProperty::new("Physical Damage", "10-20");
        assert_eq!(extract_number(&property.display_text()), Some(15.0));
        assert_eq!(extract_number("Chaos Damage 5--3"), Some(1.0));
    }

    #[test]
    fn keeps_sign_and_fraction() {
        assert_eq!(extract_number("-0.5 to Level"), Some(-0.5));
        assert_eq!(extract_number("+20 to maximum Life"), Some(20.0));
    }

    #[test]
    fn missing_number_is_none() {
        assert_eq!(extract_number("Ring of X"), None);
        assert_eq!(extract_number("—"), None);
        assert_eq!(extract_number(""), None);
    }

    #[test]
    fn trailing_dot_is_not_fraction() {
        assert_eq!(extract_number("Level 3."), Some(3.0));
    }

    #[test]
    fn display_text_appends_value() {
        let property = ItemProperty::new("Quality", "+20%");
        assert_eq!(property.display_text(), "Quality +20%");
        assert_eq!(ItemProperty::named("Sword").display_text(), "Sword");
    }

    #[test]
    fn parses_mixed_property_shapes() {
        let raw = r#"[
            {"name": "Vaal Regalia", "properties": ["Chest", {"name": "Energy Shield", "value": "300"}]}
        ]"#;
        let items = parse_items(raw).expect("items parse");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].properties[0], ItemProperty::named("Chest"));
        assert_eq!(items[0].properties[1].value, "300");
    }

    #[test]
    fn parses_single_item_object() {
        let items = parse_items(r#"{"properties": ["Ring"]}"#).expect("item parse");
        assert_eq!(items[0].display_name(), "(unnamed)");
        assert!(items[0].has_property_containing("Rin"));
    }
}
