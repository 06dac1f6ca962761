//! # Rendering
//!
//! Turns core structures into the formats users see: the printable
//! checklist page, the selector page, plain text and CSV.
//!
//! Pages are server-rendered strings; every value taken from the snapshot
//! passes through [`escape_html`].

use agricheck_core::{AgricheckError, Checklist, Section};
use chrono::{Datelike, NaiveDate};

// =============================================================================
// HELPERS
// =============================================================================

/// Escape text for HTML element content and quoted attributes.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const WEEKDAYS_DE: [&str; 7] = [
    "Montag",
    "Dienstag",
    "Mittwoch",
    "Donnerstag",
    "Freitag",
    "Samstag",
    "Sonntag",
];

const MONTHS_DE: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

/// Long Swiss-German date, e.g. `Donnerstag, 1. Mai 2025`.
#[must_use]
pub fn german_long_date(date: NaiveDate) -> String {
    let weekday = WEEKDAYS_DE[date.weekday().num_days_from_monday() as usize];
    let month = MONTHS_DE[date.month0() as usize];
    format!("{}, {}. {} {}", weekday, date.day(), month, date.year())
}

/// Accent colour for a section at `depth` (1 = selected group).
///
/// Hue steps from green towards blue with depth, lightness rises so deeper
/// sections read as subordinate.
#[must_use]
pub fn depth_color(depth: usize) -> String {
    let step = depth.saturating_sub(1).min(5);
    let hue = 140 + step * 20;
    let lightness = 30 + step * 8;
    format!("hsl({hue}, 45%, {lightness}%)")
}

// =============================================================================
// CHECKLIST: HTML
// =============================================================================

const CHECKLIST_CSS: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 60rem; margin: 2rem auto; padding: 0 1rem; }
.toolbar { display: flex; gap: .5rem; margin-bottom: 1rem; }
.toolbar button, .toolbar a { padding: .35rem .8rem; border: 1px solid #888; border-radius: .25rem; background: #fff; color: inherit; text-decoration: none; font-size: .9rem; cursor: pointer; }
.toolbar .copied { background: #198754; color: #fff; border-color: #198754; }
.meta { color: #555; margin-bottom: 1.5rem; }
h1, h2, h3, h4, h5, h6 { border-left: .3rem solid; padding-left: .5rem; }
.section-number { margin-right: .5rem; color: #666; }
ul.checklist { list-style: none; padding-left: 0; }
ul.checklist li { margin: .35rem 0; }
ul.checklist input { margin-right: .5rem; }
.text-danger { color: #b02a37; }
@media print { .toolbar { display: none; } }
"#;

const CHECKLIST_JS: &str = r#"
document.getElementById('printBtn').addEventListener('click', () => window.print());
const copyBtn = document.getElementById('copyLinkBtn');
copyBtn.addEventListener('click', () => {
  navigator.clipboard.writeText(window.location.href).then(() => {
    copyBtn.classList.add('copied');
    copyBtn.textContent = 'Kopiert!';
    setTimeout(() => { copyBtn.classList.remove('copied'); copyBtn.textContent = 'Link kopieren'; }, 2000);
  });
});
"#;

fn render_section(section: &Section, out: &mut String) {
    let level = section.heading_level();
    out.push_str(&format!(
        "<h{level} style=\"border-color: {color}\"><span class=\"section-number\">{number}</span>{title}</h{level}>\n",
        level = level,
        color = depth_color(section.depth()),
        number = escape_html(&section.number_label()),
        title = escape_html(&section.title),
    ));

    if let Some(comment) = &section.comment {
        out.push_str(&format!("<p>{}</p>\n", escape_html(comment)));
    }

    if !section.items.is_empty() {
        out.push_str("<ul class=\"checklist\">\n");
        for item in &section.items {
            out.push_str("<li><label><input type=\"checkbox\"><strong>");
            out.push_str(&escape_html(&item.label));
            out.push_str("</strong>");
            if let Some(comment) = &item.comment {
                out.push_str(" – ");
                out.push_str(&escape_html(comment));
            }
            out.push_str("</label></li>\n");
        }
        out.push_str("</ul>\n");
    }
}

/// The printable checklist page.
///
/// `groups_param` is the raw `groups` value, reused for the CSV link.
#[must_use]
pub fn checklist_html(checklist: &Checklist, date: NaiveDate, groups_param: &str) -> String {
    let mut content = String::new();
    if checklist.is_empty() {
        content.push_str("<p class=\"text-danger\">Keine der angegebenen Gruppen wurde gefunden.</p>\n");
    }
    for section in &checklist.sections {
        render_section(section, &mut content);
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="de">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Kontrollcheckliste</title>
    <style>{css}</style>
</head>
<body>
    <div class="toolbar">
        <button id="printBtn" type="button">Drucken</button>
        <a id="csvBtn" href="/api/checklist.csv?groups={groups}">Excel (CSV)</a>
        <button id="copyLinkBtn" type="button">Link kopieren</button>
        <a href="/">Zurück zur Auswahl</a>
    </div>
    <h1>Kontrollcheckliste</h1>
    <div class="meta">Datum: <span id="metaDate">{date}</span> · {count} Kontrollpunkte</div>
    <div id="content">
{content}    </div>
    <script>{js}</script>
</body>
</html>"#,
        css = CHECKLIST_CSS,
        js = CHECKLIST_JS,
        groups = escape_html(groups_param),
        date = german_long_date(date),
        count = checklist.item_count(),
        content = content,
    )
}

/// A full page carrying only an error message.
#[must_use]
pub fn error_html(title: &str, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="de">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <h1>{title}</h1>
    <p class="text-danger">{message}</p>
    <p><a href="/">Zurück zur Auswahl</a></p>
</body>
</html>"#,
        css = CHECKLIST_CSS,
        title = escape_html(title),
        message = escape_html(message),
    )
}

// =============================================================================
// CHECKLIST: TEXT & CSV
// =============================================================================

/// Plain-text checklist for the terminal.
#[must_use]
pub fn checklist_text(checklist: &Checklist) -> String {
    let mut out = String::new();
    for section in &checklist.sections {
        let indent = "  ".repeat(section.depth().saturating_sub(1));
        out.push_str(&format!("{}{} {}\n", indent, section.number_label(), section.title));
        if let Some(comment) = &section.comment {
            out.push_str(&format!("{}  {}\n", indent, comment));
        }
        for item in &section.items {
            match &item.comment {
                Some(c) => out.push_str(&format!("{}  [ ] {} – {}\n", indent, item.label, c)),
                None => out.push_str(&format!("{}  [ ] {}\n", indent, item.label)),
            }
        }
    }
    out
}

/// CSV export: one line per inspection point.
pub fn checklist_csv(checklist: &Checklist) -> Result<String, AgricheckError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["Abschnitt", "Gruppe", "Kontrollpunkt", "Bemerkung", "ID", "Erledigt"])
        .map_err(|e| AgricheckError::SerializationError(e.to_string()))?;

    for section in &checklist.sections {
        let number = section.number_label();
        for item in &section.items {
            writer
                .write_record([
                    number.as_str(),
                    section.title.as_str(),
                    item.label.as_str(),
                    item.comment.as_deref().unwrap_or(""),
                    item.id.as_str(),
                    "",
                ])
                .map_err(|e| AgricheckError::SerializationError(e.to_string()))?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AgricheckError::SerializationError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AgricheckError::SerializationError(e.to_string()))
}

// =============================================================================
// SELECTOR PAGE
// =============================================================================

const SELECTOR_CSS: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 60rem; margin: 2rem auto; padding: 0 1rem; }
.bar { display: flex; gap: .5rem; margin-bottom: 1rem; }
.bar input { flex: 1; padding: .35rem; }
#tree ul { list-style: none; padding-left: 1.2rem; }
#tree > ul { padding-left: 0; }
#tree li > ul { display: none; }
#tree li.open > ul { display: block; }
.toggle { cursor: pointer; display: inline-block; width: 1rem; }
.hit > label { background: #fff3cd; }
.count { color: #777; font-size: .85rem; margin-left: .3rem; }
.text-danger { color: #b02a37; }
"#;

const SELECTOR_JS: &str = r#"
const treeEl = document.getElementById('tree');
const generateBtn = document.getElementById('generate');
const searchInput = document.getElementById('search');

function updateButton() {
  generateBtn.disabled = treeEl.querySelectorAll('input:checked').length === 0;
}

// A parent is checked only when every child is; partly checked parents are
// shown indeterminate and stay out of the selection.
function syncAncestors(li) {
  for (let up = li.parentElement.closest('li'); up; up = up.parentElement.closest('li')) {
    const boxes = [...up.querySelectorAll(':scope > ul > li > label > input')];
    const all = boxes.every(c => c.checked);
    const some = boxes.some(c => c.checked || c.indeterminate);
    const own = up.querySelector(':scope > label > input');
    own.checked = all;
    own.indeterminate = some && !all;
  }
}

function buildNode(node) {
  const li = document.createElement('li');
  li.dataset.id = node.id;
  const toggle = document.createElement('span');
  toggle.className = 'toggle';
  toggle.textContent = node.children.length ? '▸' : '';
  toggle.addEventListener('click', () => li.classList.toggle('open'));
  const label = document.createElement('label');
  const cb = document.createElement('input');
  cb.type = 'checkbox';
  cb.value = node.id;
  cb.addEventListener('change', () => {
    li.querySelectorAll('input').forEach(c => { c.checked = cb.checked; c.indeterminate = false; });
    if (cb.checked) li.classList.add('open');
    syncAncestors(li);
    updateButton();
  });
  label.append(cb, ' ', node.text);
  const count = document.createElement('span');
  count.className = 'count';
  count.textContent = '(' + node.point_count + ')';
  li.append(toggle, label, count);
  if (node.children.length) {
    const ul = document.createElement('ul');
    node.children.forEach(c => ul.appendChild(buildNode(c)));
    li.appendChild(ul);
  }
  return li;
}

function showError(message) {
  treeEl.innerHTML = '';
  const p = document.createElement('p');
  p.className = 'text-danger';
  p.textContent = message;
  treeEl.appendChild(p);
}

async function load() {
  const res = await fetch('/api/tree');
  const body = await res.json();
  if (!res.ok || !body.success) { showError(body.error || ('Fehler ' + res.status)); return; }
  treeEl.innerHTML = '';
  const ul = document.createElement('ul');
  body.roots.forEach(r => ul.appendChild(buildNode(r)));
  treeEl.appendChild(ul);
}

function clearSearch() {
  treeEl.querySelectorAll('li.hit').forEach(li => li.classList.remove('hit'));
}

async function performSearch() {
  clearSearch();
  treeEl.querySelectorAll('li.open').forEach(li => li.classList.remove('open'));
  const q = searchInput.value.trim();
  if (!q) return;
  const res = await fetch('/api/search?q=' + encodeURIComponent(q));
  const body = await res.json();
  if (!res.ok || !body.success) { showError(body.error || ('Fehler ' + res.status)); return; }
  const byId = id => treeEl.querySelector('li[data-id="' + CSS.escape(id) + '"]');
  body.open.forEach(id => { const li = byId(id); if (li) li.classList.add('open'); });
  body.hits.forEach(id => { const li = byId(id); if (li) li.classList.add('hit', 'open'); });
}

searchInput.addEventListener('keydown', e => { if (e.key === 'Enter') performSearch(); });
document.getElementById('searchBtn').addEventListener('click', performSearch);
document.getElementById('clearFilterBtn').addEventListener('click', clearSearch);
document.getElementById('foldTreeBtn').addEventListener('click', () => {
  treeEl.querySelectorAll('input').forEach(c => { c.checked = false; c.indeterminate = false; });
  treeEl.querySelectorAll('li.open').forEach(li => li.classList.remove('open'));
  updateButton();
});

generateBtn.addEventListener('click', async () => {
  const selected = [...treeEl.querySelectorAll('input:checked')].map(c => c.value);
  if (!selected.length) return;
  const res = await fetch('/api/compress', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ selected })
  });
  const body = await res.json();
  if (!res.ok || !body.success || !body.link) { showError(body.error || ('Fehler ' + res.status)); return; }
  location.href = body.link;
});

load().catch(e => showError('Daten konnten nicht geladen werden: ' + e));
"#;

/// The selector page. Data is loaded by the embedded script.
#[must_use]
pub fn selector_html() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="de">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Kontrollpunkte auswählen</title>
    <style>{css}</style>
</head>
<body>
    <h1>Kontrollpunkte auswählen</h1>
    <div class="bar">
        <input id="search" type="search" placeholder="Suchen…">
        <button id="searchBtn" type="button">Suchen</button>
        <button id="clearFilterBtn" type="button">Filter löschen</button>
        <button id="foldTreeBtn" type="button">Zurücksetzen</button>
        <button id="generate" type="button" disabled>Checkliste erstellen</button>
    </div>
    <div id="tree"><p>Lade Kontrollpunkt-Gruppen…</p></div>
    <script>{js}</script>
</body>
</html>"#,
        css = SELECTOR_CSS,
        js = SELECTOR_JS,
    )
}

// =============================================================================
// TESTS
// =============================================================================
