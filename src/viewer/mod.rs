use serde::Serialize;

use crate::classify::{level_matches, FilterLevel, Group, Taxonomy};
use crate::dataset::Entry;
use crate::grouper::{flatten, group_entries, GroupBucket};
use crate::image::{parse_image_set, ImageCandidate, ImageSet};
use crate::utils::section_slug;

pub const UNNAMED_TITLE: &str = "(未命名)";
pub const DETAIL_TITLE: &str = "詳細資訊";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    Neutral,
    Highlighted,
    Muted,
}

pub fn section_id(group: Group) -> String {
    format!("sec-{}", section_slug(group.label()))
}

pub fn collapse_id(group: Group) -> String {
    format!("{}-body", section_id(group))
}

#[derive(Clone, Debug)]
pub struct Card<'a> {
    pub entry: &'a Entry,
    pub title: &'a str,
    pub rows: Vec<(&'static str, &'a str)>,
    pub image: ImageSet,
    pub highlight: Highlight,
    /// Filter tokens this card matches, for client-side toggling.
    pub levels: Vec<&'static str>,
}

#[derive(Clone, Debug)]
pub struct Section<'a> {
    pub group: Group,
    pub key: &'static str,
    pub id: String,
    pub expanded: bool,
    pub cards: Vec<Card<'a>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DetailView<'a> {
    pub title: &'a str,
    pub image: Option<ImageCandidate>,
    pub image_src: Option<String>,
    pub image_alt: String,
    pub rows: Vec<(&'static str, &'a str)>,
    pub description: &'a str,
}

/// State of one rendered catalog: grouped buckets plus the active filter.
#[derive(Clone, Debug)]
pub struct ViewerState {
    taxonomy: Taxonomy,
    buckets: Vec<GroupBucket>,
    active: Option<FilterLevel>,
}

impl ViewerState {
    pub fn new(taxonomy: Taxonomy, entries: &[Entry]) -> Self {
        Self {
            taxonomy,
            buckets: group_entries(taxonomy, entries),
            active: None,
        }
    }

    pub fn taxonomy(&self) -> Taxonomy {
        self.taxonomy
    }

    pub fn buckets(&self) -> &[GroupBucket] {
        &self.buckets
    }

    pub fn entries(&self) -> Vec<&Entry> {
        flatten(&self.buckets)
    }

    pub fn active(&self) -> Option<FilterLevel> {
        self.active
    }

    pub fn set_filter(&mut self, level: Option<FilterLevel>) {
        self.active = level;
    }

    /// Selecting the already active level clears the filter.
    pub fn toggle_filter(&mut self, level: FilterLevel) -> Option<FilterLevel> {
        self.active = if self.active == Some(level) {
            None
        } else {
            Some(level)
        };
        self.active
    }

    /// Section opened for the active filter, if it has any cards.
    pub fn focused_section(&self) -> Option<Group> {
        let group = self.taxonomy.section_for(self.active?)?;
        self.buckets
            .iter()
            .any(|b| b.group == group && !b.entries.is_empty())
            .then_some(group)
    }

    pub fn highlight_for(&self, entry: &Entry) -> Highlight {
        match self.active {
            None => Highlight::Neutral,
            Some(level) if level_matches(self.taxonomy, &entry.level, Some(level)) => {
                Highlight::Highlighted
            }
            Some(_) => Highlight::Muted,
        }
    }

    fn card<'a>(&self, entry: &'a Entry) -> Card<'a> {
        let levels = FilterLevel::offered(self.taxonomy)
            .iter()
            .filter(|&&l| level_matches(self.taxonomy, &entry.level, Some(l)))
            .map(|l| l.token())
            .collect();
        Card {
            entry,
            title: if entry.name.is_empty() {
                UNNAMED_TITLE
            } else {
                entry.name.as_str()
            },
            rows: entry.info_rows(),
            image: parse_image_set(&entry.images, &entry.image_captions),
            highlight: self.highlight_for(entry),
            levels,
        }
    }

    /// Non-empty sections in canonical order. With a filter active only the
    /// focused section is expanded; a filter without a section of its own
    /// leaves all of them expanded.
    pub fn sections(&self) -> Vec<Section<'_>> {
        let focused = self.focused_section();
        self.buckets
            .iter()
            .filter(|b| !b.entries.is_empty())
            .map(|b| Section {
                group: b.group,
                key: b.group.label(),
                id: section_id(b.group),
                expanded: focused.map_or(true, |g| g == b.group),
                cards: b.entries.iter().map(|e| self.card(e)).collect(),
            })
            .collect()
    }

    /// Detail view for the first listed entry named `name`.
    pub fn detail(&self, name: &str) -> Option<DetailView<'_>> {
        let wanted = name.trim();
        let entry = self.entries().into_iter().find(|e| e.name.trim() == wanted)?;
        Some(detail_view(entry))
    }
}

pub fn detail_view(entry: &Entry) -> DetailView<'_> {
    let image = parse_image_set(&entry.images, &entry.image_captions)
        .candidates
        .into_iter()
        .next();
    let image_alt = image
        .as_ref()
        .map(|c| c.alt_or(&entry.name).to_string())
        .unwrap_or_default();
    DetailView {
        title: if entry.name.is_empty() {
            DETAIL_TITLE
        } else {
            entry.name.as_str()
        },
        image_src: image.as_ref().map(|c| c.src()),
        image,
        image_alt,
        rows: entry.info_rows(),
        description: entry.description.as_str(),
    }
}
