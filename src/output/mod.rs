pub mod report;

use colored::Colorize;
use serde::Serialize;

use crate::classify::{FilterLevel, Taxonomy};
use crate::dataset::{
    FIELD_ABUSE_METHOD, FIELD_ALIAS, FIELD_CATEGORY, FIELD_LEVEL, FIELD_MEDICAL_USE,
};
use crate::image::ImageCandidate;
use crate::viewer::{collapse_id, DetailView, Highlight, Section};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct CardRecord {
    pub id: usize,
    pub name: String,
    pub title: String,
    pub level: String,
    pub category: String,
    pub medical_use: String,
    pub abuse_method: String,
    pub alias: String,
    pub description: String,
    pub highlight: Highlight,
    pub levels: Vec<String>,
    pub images: Vec<ImageCandidate>,
    pub image_srcs: Vec<String>,
    pub image_fallback: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SectionRecord {
    pub key: String,
    pub id: String,
    pub body_id: String,
    pub expanded: bool,
    pub cards: Vec<CardRecord>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CatalogRecord {
    pub title: String,
    pub taxonomy: Taxonomy,
    pub active_level: Option<String>,
    pub filters: Vec<String>,
    pub total: usize,
    pub sections: Vec<SectionRecord>,
}

pub fn build_records(
    title: &str,
    taxonomy: Taxonomy,
    active: Option<FilterLevel>,
    sections: &[Section<'_>],
) -> CatalogRecord {
    let sections: Vec<SectionRecord> = sections
        .iter()
        .map(|s| SectionRecord {
            key: s.key.to_string(),
            id: s.id.clone(),
            body_id: collapse_id(s.group),
            expanded: s.expanded,
            cards: s
                .cards
                .iter()
                .map(|c| CardRecord {
                    id: c.entry.id,
                    name: c.entry.name.clone(),
                    title: c.title.to_string(),
                    level: c.entry.level.clone(),
                    category: c.entry.category.clone(),
                    medical_use: c.entry.medical_use.clone(),
                    abuse_method: c.entry.abuse_method.clone(),
                    alias: c.entry.alias.clone(),
                    description: c.entry.description.clone(),
                    highlight: c.highlight,
                    levels: c.levels.iter().map(|l| l.to_string()).collect(),
                    images: c.image.candidates.clone(),
                    image_srcs: c.image.candidates.iter().map(|i| i.src()).collect(),
                    image_fallback: c.image.fallback_text(),
                })
                .collect(),
        })
        .collect();
    CatalogRecord {
        title: title.to_string(),
        taxonomy,
        active_level: active.map(|l| l.token().to_string()),
        filters: FilterLevel::offered(taxonomy)
            .iter()
            .map(|l| l.token().to_string())
            .collect(),
        total: sections.iter().map(|s| s.cards.len()).sum(),
        sections,
    }
}

fn card_rows(card: &CardRecord) -> Vec<(&'static str, &str)> {
    [
        (FIELD_LEVEL, card.level.as_str()),
        (FIELD_CATEGORY, card.category.as_str()),
        (FIELD_MEDICAL_USE, card.medical_use.as_str()),
        (FIELD_ABUSE_METHOD, card.abuse_method.as_str()),
        (FIELD_ALIAS, card.alias.as_str()),
    ]
    .into_iter()
    .filter(|(_, v)| !v.is_empty())
    .collect()
}

pub fn render_text(record: &CatalogRecord) -> Vec<u8> {
    let mut out = String::new();
    if let Some(level) = record.active_level.as_deref() {
        out.push_str(&format!(":: filter    : {}\n\n", level.bold()));
    }
    for section in &record.sections {
        let marker = if section.expanded { "▾" } else { "▸" };
        out.push_str(&format!(
            "{} {} ({})\n",
            marker,
            section.key.bold().cyan(),
            section.cards.len()
        ));
        if !section.expanded {
            out.push('\n');
            continue;
        }
        for card in &section.cards {
            let title = match card.highlight {
                Highlight::Neutral => format!("  • {}", card.title.bold()),
                Highlight::Highlighted => format!("  ★ {}", card.title.bold().yellow()),
                Highlight::Muted => format!("  · {}", card.title.dimmed()),
            };
            out.push_str(&title);
            out.push('\n');
            for (label, value) in card_rows(card) {
                let line = format!("      {label}：{value}");
                if card.highlight == Highlight::Muted {
                    out.push_str(&line.dimmed().to_string());
                } else {
                    out.push_str(&line);
                }
                out.push('\n');
            }
            match card.images.first() {
                Some(img) => out.push_str(&format!("      圖片：{}\n", img.url)),
                None => out.push_str(&format!("      圖片：{}\n", card.image_fallback)),
            }
        }
        out.push('\n');
    }
    out.push_str(&format!(":: total     : {}\n", record.total));
    out.into_bytes()
}

pub fn render_json(record: &CatalogRecord) -> Vec<u8> {
    serde_json::to_vec_pretty(record).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_html(record: &CatalogRecord) -> Vec<u8> {
    report::render_html(record)
}

pub fn render_detail_text(detail: &DetailView<'_>) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&format!("{}\n", detail.title.bold().cyan()));
    if let Some(src) = detail.image_src.as_deref() {
        out.push_str(&format!("  圖片：{} ({})\n", src, detail.image_alt));
    }
    for (label, value) in &detail.rows {
        out.push_str(&format!("  {label}：{value}\n"));
    }
    if !detail.description.is_empty() {
        out.push('\n');
        out.push_str(detail.description);
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_detail_json(detail: &DetailView<'_>) -> Vec<u8> {
    serde_json::to_vec_pretty(detail).unwrap_or_else(|_| b"{}\n".to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Entry;
    use crate::viewer::ViewerState;

    fn state() -> ViewerState {
        let data = vec![
            Entry {
                id: 0,
                name: "海洛因".to_string(),
                level: "第一級".to_string(),
                images: "http://img/h.jpg".to_string(),
                ..Entry::default()
            },
            Entry {
                id: 1,
                name: "K他命".to_string(),
                level: "第三級".to_string(),
                image_captions: "白色粉末".to_string(),
                ..Entry::default()
            },
        ];
        ViewerState::new(Taxonomy::Graded, &data)
    }

    fn record(state: &ViewerState) -> CatalogRecord {
        build_records("t", state.taxonomy(), state.active(), &state.sections())
    }

    #[test]
    fn format_parsing_and_inference() {
        assert_eq!(OutputFormat::parse(" HTM "), Some(OutputFormat::Html));
        assert_eq!(OutputFormat::parse("xml"), None);
        assert_eq!(infer_format_from_path("out.JSON"), Some(OutputFormat::Json));
        assert_eq!(infer_format_from_path("out"), None);
    }

    #[test]
    fn records_cover_only_non_empty_sections() {
        let rec = record(&state());
        let keys: Vec<&str> = rec.sections.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["第一級毒品", "第三級毒品"]);
        assert_eq!(rec.total, 2);
        assert_eq!(rec.filters, vec!["1", "2", "3", "4", "U"]);
        assert_eq!(
            rec.sections[0].cards[0].image_srcs,
            vec!["https://img/h.jpg", "http://img/h.jpg"]
        );
    }

    #[test]
    fn text_output_lists_sections_and_fallbacks() {
        colored::control::set_override(false);
        let text = String::from_utf8(render_text(&record(&state()))).unwrap();
        assert!(text.contains("▾ 第一級毒品 (1)"));
        assert!(text.contains("圖片：白色粉末"));
        assert!(!text.contains("未分級"));
    }

    #[test]
    fn collapsed_sections_hide_cards_in_text() {
        colored::control::set_override(false);
        let mut s = state();
        s.set_filter(Some(FilterLevel::One));
        let text = String::from_utf8(render_text(&record(&s))).unwrap();
        assert!(text.contains("▸ 第三級毒品 (1)"));
        assert!(!text.contains("K他命"));
        assert!(text.contains("★ 海洛因"));
    }

    #[test]
    fn json_output_carries_active_level() {
        let mut s = state();
        s.set_filter(Some(FilterLevel::Three));
        let json: serde_json::Value = serde_json::from_slice(&render_json(&record(&s))).unwrap();
        assert_eq!(json["active_level"], "3");
        assert_eq!(json["taxonomy"], "graded");
        assert_eq!(json["sections"][1]["cards"][0]["highlight"], "highlighted");
    }
}
