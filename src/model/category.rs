/// One of the fixed spending classifications. The icon is a presentation
/// hint only; nothing keys off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Stable key referenced by expense records.
    pub value: &'static str,
    /// Display label, also the enumeration the suggestion flow draws from.
    pub label: &'static str,
    pub icon: &'static str,
}

/// The registry: static, ordered, fixed at build time.
pub static CATEGORIES: [Category; 7] = [
    Category { value: "food", label: "Food", icon: "utensils" },
    Category { value: "transport", label: "Transport", icon: "car" },
    Category { value: "utilities", label: "Utilities", icon: "lightbulb" },
    Category { value: "entertainment", label: "Entertainment", icon: "drama" },
    Category { value: "health", label: "Health", icon: "heart-pulse" },
    Category { value: "shopping", label: "Shopping", icon: "shopping-bag" },
    Category { value: "other", label: "Other", icon: "more-horizontal" },
];

/// Label shown for category values no longer in the registry.
pub const FALLBACK_LABEL: &str = "N/A";

pub fn find(value: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.value == value)
}

/// Case-insensitive label lookup, used to map suggestion replies back to
/// registry values.
pub fn find_by_label(label: &str) -> Option<&'static Category> {
    let label = label.trim();
    CATEGORIES.iter().find(|c| c.label.eq_ignore_ascii_case(label))
}

pub fn label_for(value: &str) -> &'static str {
    find(value).map(|c| c.label).unwrap_or(FALLBACK_LABEL)
}

/// Registry position, used to index the chart palette.
pub fn position(value: &str) -> Option<usize> {
    CATEGORIES.iter().position(|c| c.value == value)
}
