//! Server-rendered search page.
//!
//! One self-contained HTML document: the UI title and subtitle, one button
//! per category with its row count, a search box, and a short script that
//! calls `/search` and lists the results.

use std::fmt::Write as _;

use isdb_core::config::{CategorySet, UiConfig};
use isdb_db::models::category::CategoryCount;

const DEFAULT_COLOR: &str = "#95a5a6";

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

fn placeholder(ui: &UiConfig) -> &str {
    ui.search
        .get("placeholder")
        .and_then(|v| v.as_str())
        .unwrap_or("キーワードを入力")
}

fn category_buttons(categories: &CategorySet, counts: &[CategoryCount]) -> String {
    let mut html = String::new();
    for count in counts {
        let config = categories.get(&count.key);
        let emoji = config.map_or("", |c| c.emoji_fallback.as_str());
        let color = config
            .map(|c| c.color.as_str())
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_COLOR);

        let _ = write!(
            html,
            "<button class=\"category\" data-category=\"{key}\" data-label=\"{label}\" \
             style=\"border-color: {color}\">{emoji} {label} <span class=\"count\">{n}</span></button>\n",
            key = escape_html(&count.key),
            label = escape_html(&count.display_name),
            color = escape_html(color),
            emoji = escape_html(emoji),
            n = count.count,
        );
    }
    html
}

const SCRIPT: &str = r#"<script>
const input = document.getElementById('q');
const list = document.getElementById('results');

function show(items) {
  list.innerHTML = '';
  for (const item of items) {
    const li = document.createElement('li');
    const name = document.createElement('strong');
    name.textContent = item.name;
    const desc = document.createElement('p');
    desc.textContent = item.description;
    li.append(name, desc);
    list.append(li);
  }
}

async function run(q, category) {
  const params = new URLSearchParams({ q });
  if (category) params.set('category', category);
  const res = await fetch('/search?' + params.toString());
  show(res.ok ? await res.json() : []);
}

input.addEventListener('input', () => run(input.value, ''));
for (const button of document.querySelectorAll('button.category')) {
  button.addEventListener('click', () => run(button.dataset.label, button.dataset.category));
}
</script>"#;

/// Render the search page.
pub fn render_index(ui: &UiConfig, categories: &CategorySet, counts: &[CategoryCount]) -> String {
    let title = escape_html(&ui.title);
    let subtitle = if ui.subtitle.is_empty() {
        String::new()
    } else {
        format!("<p class=\"subtitle\">{}</p>\n", escape_html(&ui.subtitle))
    };

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"ja\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n\
         </head>\n\
         <body>\n\
         <h1>{title}</h1>\n\
         {subtitle}\
         <nav class=\"categories\">\n{buttons}</nav>\n\
         <input id=\"q\" type=\"search\" autocomplete=\"off\" placeholder=\"{placeholder}\">\n\
         <ul id=\"results\"></ul>\n\
         {SCRIPT}\n\
         </body>\n\
         </html>\n",
        buttons = category_buttons(categories, counts),
        placeholder = escape_html(placeholder(ui)),
    )
}
