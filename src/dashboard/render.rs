//! HTML fragments for the dashboard pages.

use crate::domain::model::{AnalyticsOverview, ProgramDetailRead, ProgramRead};
use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};
use url::Url;
use std::fmt::Write;

pub const TOP_N: usize = 20;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; color: #1f2937; }
nav { background: #0f172a; padding: 0.75rem 1.5rem; }
nav a { color: #cbd5e1; margin-right: 1.5rem; text-decoration: none; }
nav a.active { color: #fff; font-weight: 600; }
main { padding: 1.5rem; max-width: 1200px; }
.metrics { display: flex; gap: 1rem; }
.metric { flex: 1; border: 1px solid #e5e7eb; border-radius: 6px; padding: 1rem; }
.metric .label { color: #6b7280; font-size: 0.85rem; }
.metric .value { font-size: 1.8rem; font-weight: 600; }
.error { background: #fee2e2; color: #991b1b; padding: 0.75rem; border-radius: 6px; margin-bottom: 1rem; }
.warning { background: #fef3c7; color: #92400e; padding: 0.75rem; border-radius: 6px; margin-bottom: 1rem; }
.info { background: #dbeafe; color: #1e40af; padding: 0.75rem; border-radius: 6px; }
table { border-collapse: collapse; width: 100%; }
th, td { text-align: left; padding: 0.4rem 0.6rem; border-bottom: 1px solid #e5e7eb; }
form { display: flex; gap: 1rem; align-items: end; margin-bottom: 1rem; }
details { border: 1px solid #e5e7eb; border-radius: 6px; padding: 0.5rem 1rem; margin: 0.5rem 0; }
pre { background: #f3f4f6; padding: 0.75rem; overflow-x: auto; }
"#;

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

const LINK_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// `href` as given when it is safe to emit: relative, or an absolute URL
/// with an http, https or mailto scheme.
pub fn safe_href(href: &str) -> Option<&str> {
    match Url::parse(href) {
        Ok(url) if LINK_SCHEMES.contains(&url.scheme()) => Some(href),
        Ok(_) => None,
        Err(url::ParseError::RelativeUrlWithoutBase) => Some(href),
        Err(_) => None,
    }
}

/// Markdown to HTML. Raw HTML in the source is shown as text, not
/// interpreted; links and images with an unsafe destination keep only their text.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut in_dropped_link = false;
    let mut in_dropped_image = false;

    let parser = Parser::new_ext(
        markdown,
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH,
    )
    .filter_map(move |event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Some(Event::Text(raw)),
        Event::Start(Tag::Link { ref dest_url, .. }) if safe_href(dest_url).is_none() => {
            in_dropped_link = true;
            None
        }
        Event::End(TagEnd::Link) if in_dropped_link => {
            in_dropped_link = false;
            None
        }
        Event::Start(Tag::Image { ref dest_url, .. }) if safe_href(dest_url).is_none() => {
            in_dropped_image = true;
            None
        }
        Event::End(TagEnd::Image) if in_dropped_image => {
            in_dropped_image = false;
            None
        }
        other => Some(other),
    });

    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

pub fn page(title: &str, active: &str, body: &str) -> String {
    let nav_link = |href: &str, label: &str| {
        let class = if label == active { " class=\"active\"" } else { "" };
        format!("<a href=\"{}\"{}>{}</a>", href, class, label)
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} · CaRMS Program Explorer</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <nav>{overview}{explorer}</nav>\n<main>\n<h1>{title}</h1>\n{body}</main>\n</body>\n</html>\n",
        title = escape(title),
        overview = nav_link("/", "Overview"),
        explorer = nav_link("/explorer", "Program Explorer"),
        body = body,
    )
}

pub fn banner(kind: &str, message: &str) -> String {
    format!("<div class=\"{}\">{}</div>\n", kind, escape(message))
}

pub fn metrics(overview: &AnalyticsOverview) -> String {
    let cards = [
        ("Total Programs", overview.total_programs.to_string()),
        ("Total Disciplines", overview.total_disciplines.to_string()),
        ("Total Schools", overview.total_schools.to_string()),
        (
            "Avg Sections/Prog",
            format!("{:.1}", overview.avg_sections_per_program),
        ),
    ];

    let mut out = String::from("<div class=\"metrics\">\n");
    for (label, value) in cards {
        let _ = writeln!(
            out,
            "<div class=\"metric\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>",
            label,
            escape(&value)
        );
    }
    out.push_str("</div>\n");
    out
}

/// Horizontal bar chart of the first [`TOP_N`] items as inline SVG.
/// Empty input renders nothing.
pub fn bar_chart(title: &str, items: &[(String, i64)]) -> String {
    const LABEL_WIDTH: f64 = 320.0;
    const BAR_WIDTH: f64 = 460.0;
    const ROW_HEIGHT: f64 = 24.0;

    let items = &items[..items.len().min(TOP_N)];
    if items.is_empty() {
        return String::new();
    }

    let max = items.iter().map(|(_, count)| *count).max().unwrap_or(0).max(1) as f64;
    let height = ROW_HEIGHT * items.len() as f64 + 8.0;
    let width = LABEL_WIDTH + BAR_WIDTH + 60.0;

    let mut svg = format!(
        "<figure>\n<figcaption>{}</figcaption>\n\
         <svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" role=\"img\">\n",
        escape(title),
        w = width,
        h = height,
    );

    for (i, (label, count)) in items.iter().enumerate() {
        let y = ROW_HEIGHT * i as f64;
        let share = (*count).max(0) as f64 / max;
        let bar = BAR_WIDTH * share;
        let short_label: String = if label.chars().count() > 42 {
            label.chars().take(41).chain(std::iter::once('…')).collect()
        } else {
            label.clone()
        };

        let _ = writeln!(
            svg,
            "<text x=\"{lx}\" y=\"{ty}\" text-anchor=\"end\" font-size=\"12\">{label}</text>\
             <rect x=\"{bx}\" y=\"{ry}\" width=\"{bw:.1}\" height=\"{bh}\" fill=\"#2563eb\" fill-opacity=\"{op:.2}\">\
             <title>{full}: {count}</title></rect>\
             <text x=\"{cx:.1}\" y=\"{ty}\" font-size=\"12\">{count}</text>",
            lx = LABEL_WIDTH - 8.0,
            ty = y + 16.0,
            label = escape(&short_label),
            bx = LABEL_WIDTH,
            ry = y + 4.0,
            bw = bar,
            bh = ROW_HEIGHT - 8.0,
            op = 0.35 + 0.65 * share,
            full = escape(label),
            count = count,
            cx = LABEL_WIDTH + bar + 6.0,
        );
    }

    svg.push_str("</svg>\n</figure>\n");
    svg
}

pub fn select(name: &str, label: &str, options: &[(i64, String)], selected: Option<i64>) -> String {
    let mut out = format!(
        "<label>{}<br><select name=\"{}\">\n<option value=\"\">All</option>\n",
        escape(label),
        name
    );
    for (id, option_label) in options {
        let marker = if Some(*id) == selected { " selected" } else { "" };
        let _ = writeln!(
            out,
            "<option value=\"{}\"{}>{}</option>",
            id,
            marker,
            escape(option_label)
        );
    }
    out.push_str("</select></label>\n");
    out
}

/// Results table; program names link to `detail_href(id)`.
pub fn program_table(programs: &[ProgramRead], detail_href: impl Fn(i64) -> String) -> String {
    let mut out = String::from(
        "<table>\n<thead><tr><th>Name</th><th>Discipline</th><th>School</th><th>CaRMS Profile</th></tr></thead>\n<tbody>\n",
    );
    for program in programs {
        let profile = program
            .url
            .as_deref()
            .map(|url| match safe_href(url) {
                Some(href) => format!("<a href=\"{}\">{}</a>", escape(href), escape(url)),
                None => escape(url),
            })
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "<tr><td><a href=\"{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&detail_href(program.id)),
            escape(&program.name),
            escape(program.discipline_name.as_deref().unwrap_or("")),
            escape(program.school_name.as_deref().unwrap_or("")),
            profile
        );
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

pub fn program_detail(detail: &ProgramDetailRead) -> String {
    let program = &detail.program;
    let mut out = format!(
        "<h3>{}</h3>\n<p><strong>Entity:</strong> {} | <strong>Discipline:</strong> {}</p>\n",
        escape(&program.name),
        escape(program.school_name.as_deref().unwrap_or("None")),
        escape(program.discipline_name.as_deref().unwrap_or("None")),
    );

    if let Some(url) = program.url.as_deref().filter(|u| !u.is_empty()).and_then(safe_href) {
        let _ = writeln!(
            out,
            "<p><a href=\"{}\">External Profile</a></p>",
            escape(url)
        );
    }

    if let Some(extra) = program.extra_data.as_deref().filter(|e| !e.is_empty()) {
        // unparseable metadata is left out
        if let Ok(meta) = serde_json::from_str::<serde_json::Value>(extra) {
            let pretty = serde_json::to_string_pretty(&meta).unwrap_or_default();
            let _ = writeln!(
                out,
                "<details><summary>Technical Metadata</summary><pre>{}</pre></details>",
                escape(&pretty)
            );
        }
    }

    if detail.sections.is_empty() {
        out.push_str(&banner(
            "info",
            "No detailed program documentation available.",
        ));
    } else {
        for section in &detail.sections {
            let _ = writeln!(
                out,
                "<details><summary>{}</summary>\n{}</details>",
                escape(&section.title),
                markdown_to_html(&section.content)
            );
        }
    }

    out
}
