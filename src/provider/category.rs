use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of player state captured into a snapshot component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Inventory,
    EnderChest,
    Advancements,
    TaggedData,
    Effects,
    Profile,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Inventory,
        Category::EnderChest,
        Category::Advancements,
        Category::TaggedData,
        Category::Effects,
        Category::Profile,
    ];

    /// Rank used when a provider registers without an explicit one.
    ///
    /// Profile outranks tagged data and effects, which may depend on it.
    pub fn default_priority(&self) -> Priority {
        match self {
            Category::Inventory | Category::EnderChest => Priority::Highest,
            Category::Profile => Priority::High,
            Category::Advancements | Category::TaggedData | Category::Effects => Priority::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Inventory => "inventory",
            Category::EnderChest => "ender_chest",
            Category::Advancements => "advancements",
            Category::TaggedData => "tagged_data",
            Category::Effects => "effects",
            Category::Profile => "profile",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider rank. Higher ranks run first during capture and restore.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Lowest,
    Low,
    Normal,
    High,
    Highest,
}
