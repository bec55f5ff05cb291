pub mod cli;
pub mod config;
pub mod filter;
pub mod gear;
pub mod item;
pub mod logging;
pub mod login;

pub use gear::{generate_all, match_pattern, GearGroups, GearTable, PropertyGroup};
pub use item::{extract_number, Item, ItemProperty};
