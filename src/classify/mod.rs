use std::collections::HashSet;

use serde::Serialize;

const LEVEL_1_MARKER: &str = "一";
const LEVEL_2_MARKER: &str = "二";
const LEVEL_3_MARKER: &str = "三";
const LEVEL_4_MARKER: &str = "四";
const NONE_MARKER: &str = "無";
const COMPOUND_2_3_MARKER: &str = "二至三";

/// Display groups a catalog entry can be filed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Group {
    Level1,
    Level2,
    Level3,
    Level4,
    Level2To3,
    Unclassified,
}

impl Group {
    pub fn label(self) -> &'static str {
        match self {
            Self::Level1 => "第一級毒品",
            Self::Level2 => "第二級毒品",
            Self::Level3 => "第三級毒品",
            Self::Level4 => "第四級毒品",
            Self::Level2To3 => "第二至三級毒品",
            Self::Unclassified => "未分級",
        }
    }
}

const GRADED_ORDER: [Group; 5] = [
    Group::Level1,
    Group::Level2,
    Group::Level3,
    Group::Level4,
    Group::Unclassified,
];

const MERGED_ORDER: [Group; 4] = [
    Group::Level1,
    Group::Level2,
    Group::Level2To3,
    Group::Level4,
];

/// Classification scheme of a dataset.
///
/// `Graded` files entries under each level marker found in the label and
/// keeps an unclassified bucket. `Merged` folds every level-3 marker into a
/// combined level 2-3 bucket and drops entries without a label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Taxonomy {
    #[default]
    Graded,
    Merged,
}

impl Taxonomy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "graded" | "a" => Some(Self::Graded),
            "merged" | "b" => Some(Self::Merged),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Graded => "graded",
            Self::Merged => "merged",
        }
    }

    /// Canonical group order. Bucket iteration and classifier output both
    /// follow this list and never contain a group outside it.
    pub fn groups(self) -> &'static [Group] {
        match self {
            Self::Graded => &GRADED_ORDER,
            Self::Merged => &MERGED_ORDER,
        }
    }

    /// Section a filter level opens when it becomes active.
    pub fn section_for(self, level: FilterLevel) -> Option<Group> {
        match (self, level) {
            (_, FilterLevel::One) => Some(Group::Level1),
            (_, FilterLevel::Two) => Some(Group::Level2),
            (Self::Graded, FilterLevel::Three) => Some(Group::Level3),
            (Self::Merged, FilterLevel::Three) => Some(Group::Level2To3),
            (_, FilterLevel::Four) => Some(Group::Level4),
            (Self::Graded, FilterLevel::Unclassified) => Some(Group::Unclassified),
            (Self::Merged, FilterLevel::Unclassified) => None,
        }
    }
}

/// Filter selection exposed by the viewer's level buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FilterLevel {
    One,
    Two,
    Three,
    Four,
    Unclassified,
}

impl FilterLevel {
    pub const ALL: &'static [FilterLevel] = &[
        FilterLevel::One,
        FilterLevel::Two,
        FilterLevel::Three,
        FilterLevel::Four,
        FilterLevel::Unclassified,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "1" => Some(Self::One),
            "2" => Some(Self::Two),
            "3" => Some(Self::Three),
            "4" => Some(Self::Four),
            "U" => Some(Self::Unclassified),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Unclassified => "U",
        }
    }

    /// Filter buttons offered for a taxonomy.
    pub fn offered(taxonomy: Taxonomy) -> &'static [FilterLevel] {
        match taxonomy {
            Taxonomy::Graded => Self::ALL,
            Taxonomy::Merged => &Self::ALL[..4],
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Markers {
    one: bool,
    two: bool,
    three: bool,
    four: bool,
    compound: bool,
}

impl Markers {
    // Substring containment, not token matching.
    fn scan(label: &str) -> Self {
        Self {
            one: label.contains(LEVEL_1_MARKER),
            two: label.contains(LEVEL_2_MARKER),
            three: label.contains(LEVEL_3_MARKER),
            four: label.contains(LEVEL_4_MARKER),
            compound: label.contains(COMPOUND_2_3_MARKER),
        }
    }

    fn any_level(&self) -> bool {
        self.one || self.two || self.three || self.four
    }
}

fn in_canonical_order(taxonomy: Taxonomy, found: &HashSet<Group>) -> Vec<Group> {
    taxonomy
        .groups()
        .iter()
        .copied()
        .filter(|g| found.contains(g))
        .collect()
}

/// Every group an entry with classification label `raw` belongs to, in the
/// taxonomy's canonical order.
pub fn groups_for_label(taxonomy: Taxonomy, raw: &str) -> Vec<Group> {
    let label = raw.trim();
    let mut found = HashSet::new();

    match taxonomy {
        Taxonomy::Graded => {
            if label.is_empty() || label == NONE_MARKER {
                return vec![Group::Unclassified];
            }
            let m = Markers::scan(label);
            if m.one {
                found.insert(Group::Level1);
            }
            if m.two {
                found.insert(Group::Level2);
            }
            if m.three {
                found.insert(Group::Level3);
            }
            if m.four {
                found.insert(Group::Level4);
            }
            if found.is_empty() {
                found.insert(Group::Unclassified);
            }
        }
        Taxonomy::Merged => {
            if label.is_empty() {
                return Vec::new();
            }
            let m = Markers::scan(label);
            if m.one {
                found.insert(Group::Level1);
            }
            if m.compound {
                found.insert(Group::Level2To3);
            }
            if m.two {
                found.insert(Group::Level2);
            }
            if m.three {
                found.insert(Group::Level2To3);
            }
            if m.four {
                found.insert(Group::Level4);
            }
        }
    }

    in_canonical_order(taxonomy, &found)
}

/// Whether an entry labelled `raw` is highlighted under the active filter.
/// No filter matches everything.
pub fn level_matches(taxonomy: Taxonomy, raw: &str, level: Option<FilterLevel>) -> bool {
    let Some(level) = level else {
        return true;
    };
    let label = raw.trim();
    let m = Markers::scan(label);

    match (taxonomy, level) {
        (_, FilterLevel::One) => m.one,
        (_, FilterLevel::Four) => m.four,
        (Taxonomy::Graded, FilterLevel::Two) => m.two,
        (Taxonomy::Graded, FilterLevel::Three) => m.three,
        (Taxonomy::Graded, FilterLevel::Unclassified) => {
            label.is_empty() || label == NONE_MARKER || !m.any_level()
        }
        (Taxonomy::Merged, FilterLevel::Two) => m.two || m.compound,
        (Taxonomy::Merged, FilterLevel::Three) => m.three || m.compound,
        (Taxonomy::Merged, FilterLevel::Unclassified) => false,
    }
}

/// Token form of [`level_matches`]: an empty token means no filter and an
/// unknown token matches nothing.
pub fn matches_token(taxonomy: Taxonomy, raw: &str, token: &str) -> bool {
    if token.trim().is_empty() {
        return true;
    }
    match FilterLevel::parse(token) {
        Some(level) => level_matches(taxonomy, raw, Some(level)),
        None => false,
    }
}
