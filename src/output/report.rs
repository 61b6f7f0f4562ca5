use super::{card_rows, CardRecord, CatalogRecord, SectionRecord};
use crate::classify::FilterLevel;
use crate::utils::{escape_attr, escape_html};
use crate::viewer::{collapse_id, Highlight};

/// `<` only occurs inside JSON strings, so `\u003c` keeps the text valid JSON
/// while no `</script` or `<!--` can reach the HTML parser.
fn json_for_script_tag(value: &str) -> String {
    value.replace('<', "\\u003c")
}

fn filter_label(token: &str) -> &'static str {
    match token {
        "1" => "第一級",
        "2" => "第二級",
        "3" => "第三級",
        "4" => "第四級",
        "U" => "未分級",
        _ => "",
    }
}

fn render_filters(record: &CatalogRecord) -> String {
    let mut out = String::new();
    for token in &record.filters {
        let active = if record.active_level.as_deref() == Some(token.as_str()) {
            " active"
        } else {
            ""
        };
        let target = FilterLevel::parse(token)
            .and_then(|level| record.taxonomy.section_for(level))
            .map(collapse_id)
            .unwrap_or_default();
        out.push_str(&format!(
            r#"        <button type="button" class="btn btn-outline-primary btn-sm filter-btn{active}" data-level="{}" data-section="{}">{}</button>
"#,
            escape_attr(token),
            escape_attr(&target),
            filter_label(token)
        ));
    }
    out
}

fn render_card(card: &CardRecord) -> String {
    let state_class = match card.highlight {
        Highlight::Neutral => "",
        Highlight::Highlighted => " highlight",
        Highlight::Muted => " muted",
    };
    let candidates = serde_json::to_string(&card.image_srcs).unwrap_or_else(|_| "[]".to_string());
    let alts: Vec<String> = card
        .images
        .iter()
        .map(|c| c.alt_or(&card.name).to_string())
        .collect();
    let alts = serde_json::to_string(&alts).unwrap_or_else(|_| "[]".to_string());

    let mut out = String::new();
    out.push_str(r#"        <div class="col">"#);
    out.push('\n');
    out.push_str(&format!(
        r#"          <div class="card h-100 drug-card{state_class}" role="button" data-id="{}" data-levels="{}">"#,
        card.id,
        escape_attr(&card.levels.join(" "))
    ));
    out.push('\n');
    out.push_str(r#"            <div class="card-body d-flex flex-column">"#);
    out.push('\n');
    out.push_str(r#"              <div class="drug-img-wrap mb-3">"#);
    out.push('\n');
    let fallback_hidden = if card.image_srcs.is_empty() {
        " d-flex align-items-center justify-content-center"
    } else {
        " d-none"
    };
    if !card.image_srcs.is_empty() {
        out.push_str(&format!(
            r#"                <img class="img-fluid drug-img" loading="lazy" referrerpolicy="no-referrer" alt="" data-candidates="{}" data-alts="{}"/>"#,
            escape_attr(&candidates),
            escape_attr(&alts)
        ));
        out.push('\n');
    }
    out.push_str(&format!(
        r#"                <div class="img-fallback text-center text-muted border rounded p-3{fallback_hidden}">{}</div>"#,
        escape_html(&card.image_fallback)
    ));
    out.push('\n');
    out.push_str("              </div>\n");
    out.push_str(&format!(
        r#"              <h5 class="card-title">{}</h5>"#,
        escape_html(&card.title)
    ));
    out.push('\n');
    for (label, value) in card_rows(card) {
        out.push_str(&format!(
            r#"              <p class="mb-1"><span class="field-label">{label}：</span>{}</p>"#,
            escape_html(value)
        ));
        out.push('\n');
    }
    out.push_str("            </div>\n");
    out.push_str("          </div>\n");
    out.push_str("        </div>\n");
    out
}

fn render_section(section: &SectionRecord) -> String {
    let (show, icon) = if section.expanded {
        (" show", "▾")
    } else {
        ("", "▸")
    };
    let mut out = String::new();
    out.push_str(&format!(
        r#"    <div class="group-header mt-4 mb-2" id="{}" data-target="{}">
      <h2 class="h4 mb-0">{}</h2>
      <button class="collapse-toggle" type="button" aria-label="收合/展開"><span class="fs-4" aria-hidden="true">{icon}</span></button>
    </div>
    <div class="collapse{show}" id="{}">
      <div class="row row-cols-1 row-cols-sm-2 row-cols-md-3 row-cols-lg-4 g-3">
"#,
        escape_attr(&section.id),
        escape_attr(&section.body_id),
        escape_html(&section.key),
        escape_attr(&section.body_id),
    ));
    for card in &section.cards {
        out.push_str(&render_card(card));
    }
    out.push_str("      </div>\n    </div>\n");
    out
}

/// Self-contained catalog page. Cards are rendered up front; the inline
/// script only drives image retries, filter toggling via each card's
/// precomputed `data-levels`, collapsing and the detail modal.
pub fn render_html(record: &CatalogRecord) -> Vec<u8> {
    let json = serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string());
    let json = json_for_script_tag(&json);
    let title = escape_html(&record.title);
    let filters = render_filters(record);
    let sections: String = record.sections.iter().map(render_section).collect();
    let empty = if record.sections.is_empty() {
        r#"    <div class="alert alert-info">沒有可顯示的資料。</div>
"#
    } else {
        ""
    };

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="zh-Hant">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>{title}</title>
  <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css" rel="stylesheet"/>
  <style>
    .group-header {{ display: flex; align-items: center; justify-content: space-between; cursor: pointer; scroll-margin-top: 80px; }}
    .collapse-toggle {{ border: 0; background: transparent; }}
    .drug-img-wrap {{ min-height: 160px; }}
    .drug-img {{ max-height: 220px; object-fit: contain; }}
    .field-label {{ font-weight: 600; }}
    .drug-card.muted {{ opacity: 0.35; }}
    .drug-card.highlight {{ border-color: #0d6efd; box-shadow: 0 0 0 2px rgba(13, 110, 253, .35); }}
  </style>
</head>
<body>
  <script type="application/json" id="catalog-data">{json}</script>
  <header class="header sticky-top bg-white border-bottom py-3">
    <div class="container">
      <h1 class="h3 mb-2">{title}</h1>
      <div id="filterBar" class="d-flex flex-wrap gap-2">
{filters}      </div>
    </div>
  </header>

  <main class="container pb-5" id="content">
{empty}{sections}  </main>

  <div class="modal fade" id="detailModal" tabindex="-1" aria-labelledby="detailModalLabel" aria-hidden="true">
    <div class="modal-dialog modal-lg modal-dialog-scrollable">
      <div class="modal-content">
        <div class="modal-header">
          <h5 class="modal-title" id="detailModalLabel">詳細資訊</h5>
          <button type="button" class="btn-close" data-bs-dismiss="modal" aria-label="Close"></button>
        </div>
        <div class="modal-body">
          <div id="modalImage" class="mb-3 text-center"></div>
          <div id="modalInfo"></div>
          <p id="modalDesc" class="mt-3 mb-0"></p>
        </div>
      </div>
    </div>
  </div>

  <script src="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/js/bootstrap.bundle.min.js"></script>
  <script>
    (function() {{
      const data = JSON.parse(document.getElementById('catalog-data').textContent);
      const byId = new Map();
      data.sections.forEach(s => s.cards.forEach(c => byId.set(String(c.id), c)));
      let activeLevel = data.active_level;

      document.querySelectorAll('img.drug-img').forEach(img => {{
        const srcs = JSON.parse(img.dataset.candidates || '[]');
        const alts = JSON.parse(img.dataset.alts || '[]');
        const fallback = img.parentElement.querySelector('.img-fallback');
        let idx = 0;
        const tryNext = () => {{
          if (idx >= srcs.length) {{
            img.style.display = 'none';
            fallback.classList.remove('d-none');
            fallback.classList.add('d-flex', 'align-items-center', 'justify-content-center');
            return;
          }}
          img.alt = alts[idx] || '';
          img.src = srcs[idx++];
        }};
        img.onerror = tryNext;
        tryNext();
      }});

      document.querySelectorAll('.group-header').forEach(header => {{
        const body = document.getElementById(header.dataset.target);
        const icon = header.querySelector('span');
        body.addEventListener('shown.bs.collapse', () => {{ icon.textContent = '▾'; }});
        body.addEventListener('hidden.bs.collapse', () => {{ icon.textContent = '▸'; }});
        header.addEventListener('click', ev => {{
          ev.preventDefault();
          bootstrap.Collapse.getOrCreateInstance(body, {{ toggle: false }}).toggle();
        }});
      }});

      const applyFilter = () => {{
        document.querySelectorAll('.drug-card').forEach(card => {{
          card.classList.remove('muted', 'highlight');
          if (!activeLevel) return;
          const levels = (card.dataset.levels || '').split(' ');
          card.classList.add(levels.includes(activeLevel) ? 'highlight' : 'muted');
        }});
      }};

      const openSection = targetId => {{
        const target = targetId && document.getElementById(targetId);
        if (!target) return;
        document.querySelectorAll('main .collapse').forEach(body => {{
          const inst = bootstrap.Collapse.getOrCreateInstance(body, {{ toggle: false }});
          if (body === target) inst.show(); else inst.hide();
        }});
        const header = document.querySelector('.group-header[data-target="' + targetId + '"]');
        if (header) header.scrollIntoView({{ behavior: 'smooth', block: 'start' }});
      }};

      const btns = document.querySelectorAll('.filter-btn');
      btns.forEach(btn => {{
        btn.addEventListener('click', () => {{
          activeLevel = activeLevel === btn.dataset.level ? null : btn.dataset.level;
          btns.forEach(b => b.classList.toggle('active', b.dataset.level === activeLevel));
          applyFilter();
          if (activeLevel) openSection(btn.dataset.section);
        }});
      }});

      const modalEl = document.getElementById('detailModal');
      document.querySelectorAll('.drug-card').forEach(card => {{
        card.addEventListener('click', () => {{
          const item = byId.get(card.dataset.id);
          if (!item) return;
          const img = card.querySelector('img.drug-img');
          document.getElementById('detailModalLabel').textContent = item.name || '詳細資訊';
          const mImg = document.getElementById('modalImage');
          mImg.innerHTML = '';
          if (img && img.src && img.style.display !== 'none') {{
            const big = document.createElement('img');
            big.className = 'img-fluid rounded';
            big.src = img.src;
            big.alt = img.alt;
            big.referrerPolicy = 'no-referrer';
            mImg.appendChild(big);
          }}
          const dl = document.createElement('dl');
          dl.className = 'row mb-0';
          [['分級', item.level], ['類別', item.category], ['醫療用途', item.medical_use], ['濫用方式', item.abuse_method], ['俗名', item.alias]].forEach(([k, v]) => {{
            if (!v) return;
            const dt = document.createElement('dt');
            dt.className = 'col-sm-3 text-muted';
            dt.textContent = k;
            const dd = document.createElement('dd');
            dd.className = 'col-sm-9';
            dd.textContent = v;
            dl.appendChild(dt);
            dl.appendChild(dd);
          }});
          const info = document.getElementById('modalInfo');
          info.innerHTML = '';
          info.appendChild(dl);
          document.getElementById('modalDesc').textContent = item.description || '';
          bootstrap.Modal.getOrCreateInstance(modalEl).show();
        }});
      }});
    }})();
  </script>
</body>
</html>
"####
    );
    html.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{FilterLevel, Taxonomy};
    use crate::dataset::Entry;
    use crate::output::build_records;
    use crate::viewer::ViewerState;

    fn page(entries: &[Entry], level: Option<FilterLevel>) -> String {
        let mut state = ViewerState::new(Taxonomy::Merged, entries);
        state.set_filter(level);
        let record = build_records("管制藥品", state.taxonomy(), state.active(), &state.sections());
        String::from_utf8(render_html(&record)).unwrap()
    }

    #[test]
    fn page_has_one_section_per_non_empty_bucket() {
        let html = page(
            &[Entry {
                name: "<b>x</b>".to_string(),
                level: "第二至三級".to_string(),
                images: "http://img/x.png".to_string(),
                ..Entry::default()
            }],
            None,
        );
        assert!(html.contains(r#"id="sec-第二級毒品""#));
        assert!(html.contains(r#"id="sec-第二至三級毒品""#));
        assert!(!html.contains(r#"id="sec-第一級毒品""#));
        assert!(html.contains(r#"data-levels="2 3""#));
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(html.contains("https://img/x.png"));
        assert!(!html.contains("</b></script>"));
    }

    #[test]
    fn page_marks_active_filter_and_collapses_others() {
        let html = page(
            &[
                Entry {
                    id: 0,
                    name: "a".to_string(),
                    level: "第一級".to_string(),
                    ..Entry::default()
                },
                Entry {
                    id: 1,
                    name: "b".to_string(),
                    level: "第四級".to_string(),
                    ..Entry::default()
                },
            ],
            Some(FilterLevel::Four),
        );
        assert!(html.contains(r#"filter-btn active" data-level="4""#));
        assert!(html.contains(r#"<div class="collapse" id="sec-第一級毒品-body">"#));
        assert!(html.contains(r#"<div class="collapse show" id="sec-第四級毒品-body">"#));
        assert!(html.contains("drug-card muted"));
        assert!(html.contains("drug-card highlight"));
        assert!(!html.contains(r#"data-level="U""#));
    }

    #[test]
    fn filter_buttons_point_at_their_section() {
        let html = page(&[], None);
        assert!(html.contains(r#"data-level="1" data-section="sec-第一級毒品-body""#));
        assert!(html.contains(r#"data-level="3" data-section="sec-第二至三級毒品-body""#));
        assert!(html.contains("openSection(btn.dataset.section)"));
    }

    #[test]
    fn embedded_json_cannot_open_comments_or_close_the_script() {
        let html = page(
            &[Entry {
                name: "<!--<script>x</script>".to_string(),
                level: "第一級".to_string(),
                ..Entry::default()
            }],
            None,
        );
        let start = html.find(r#"id="catalog-data">"#).unwrap();
        let end = start + html[start..].find("</script>").unwrap();
        let block = &html[start..end];
        assert!(!block.contains("<!--"));
        assert!(block.contains(r"\u003c!--\u003cscript>x\u003c/script>"));
    }

    #[test]
    fn empty_catalog_shows_notice() {
        let html = page(&[], None);
        assert!(html.contains("沒有可顯示的資料"));
    }
}
