use std::io;
use std::path::Path;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;
use tracing::{debug, info};

use crate::site::Section;

// Initialize syntax highlighting resources once
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const SYNTAX_THEME: &str = "base16-ocean.dark";

/// Convert one markdown document into a section of the final page.
///
/// Reading the file is the only fallible part; conversion itself always
/// produces output. Title and anchor id come from the first line when it
/// is a level-1 heading, otherwise from the file stem.
pub fn convert_document(path: &Path) -> io::Result<Section> {
    info!("converting document: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    debug!("document size: {} bytes", content.len());

    let rendered = render_markdown(&content);
    debug!("rendered fragment size: {} bytes", rendered.len());

    let (title, id) = title_and_id(&content, path);
    info!("document converted: {} -> {}", path.display(), title);

    Ok(Section {
        id,
        title,
        content: rendered,
    })
}

/// Derive the section title and anchor id for a document.
///
/// A `# <text>` first line wins: the title is the remainder verbatim and
/// the id is the title lowercased with spaces turned into hyphens,
/// nothing more. Anything else, including a bare `# `, falls back to the
/// file stem for both.
fn title_and_id(content: &str, path: &Path) -> (String, String) {
    let first_line = content.trim().split('\n').next().unwrap_or("");
    match first_line.strip_prefix("# ") {
        Some(heading) if !heading.is_empty() => {
            debug!("title from content: {heading}");
            let id = heading.to_lowercase().replace(' ', "-");
            (heading.to_string(), id)
        }
        _ => {
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            debug!("title from file name: {stem}");
            (stem.clone(), stem)
        }
    }
}

/// Render markdown source to an HTML fragment.
///
/// Tables, footnotes, definition lists and YAML front matter are enabled
/// in the parser, then the event stream is rewritten before
/// serialization: fenced code blocks become syntect-highlighted HTML,
/// soft breaks become hard breaks so plain newlines render as `<br>`,
/// headings get an `id` attribute slugified from their text, a paragraph
/// holding exactly `[TOC]` is replaced with a linked table of contents,
/// and a leading front-matter block is dropped.
pub fn render_markdown(content: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_DEFINITION_LIST
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS;
    let parser = Parser::new_ext(content, options);

    let events: Vec<Event> = parser.collect();
    let mut processed_events = Vec::new();
    let mut i = 0;

    while i < events.len() {
        match &events[i] {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) => {
                // Collect all text events until the end of the code block
                let mut code_content = String::new();
                i += 1; // Skip the start event

                while i < events.len() {
                    match &events[i] {
                        Event::End(TagEnd::CodeBlock) => break,
                        Event::Text(text) => code_content.push_str(text),
                        _ => {} // Ignore other events inside code blocks
                    }
                    i += 1;
                }

                processed_events.push(Event::Html(highlight_code(lang, &code_content).into()));
            }
            Event::Start(Tag::MetadataBlock(_)) => {
                // Front matter never reaches the page
                let mut metadata = String::new();
                i += 1;

                while i < events.len() {
                    match &events[i] {
                        Event::End(TagEnd::MetadataBlock(_)) => break,
                        Event::Text(text) => metadata.push_str(text),
                        _ => {}
                    }
                    i += 1;
                }

                debug!("dropped front matter: {} bytes", metadata.len());
            }
            Event::Start(Tag::Heading {
                level,
                classes,
                attrs,
                ..
            }) => {
                // Look ahead for the heading text to build the anchor id
                let text = heading_text(&events[i + 1..]);

                processed_events.push(Event::Start(Tag::Heading {
                    level: *level,
                    id: Some(slugify(&text).into()),
                    classes: classes.clone(),
                    attrs: attrs.clone(),
                }));
            }
            Event::Start(Tag::Paragraph) => {
                // A paragraph holding exactly `[TOC]` becomes the contents list
                match toc_marker_end(&events[i..]) {
                    Some(end) => {
                        let headings = collect_headings(&events);
                        debug!("toc marker replaced, {} headings", headings.len());
                        processed_events.push(Event::Html(toc_html(&headings).into()));
                        i += end;
                    }
                    None => processed_events.push(events[i].clone()),
                }
            }
            Event::SoftBreak => {
                processed_events.push(Event::HardBreak);
            }
            event => {
                processed_events.push(event.clone());
            }
        }
        i += 1;
    }

    let mut out = String::new();
    html::push_html(&mut out, processed_events.into_iter());

    out
}

/// Concatenated text of the heading opened just before `events`.
fn heading_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}

/// When `events` opens a paragraph whose sole content is the literal
/// `[TOC]` marker, the offset of the closing paragraph event.
fn toc_marker_end(events: &[Event]) -> Option<usize> {
    let mut text = String::new();
    for (offset, event) in events.iter().enumerate().skip(1) {
        match event {
            Event::Text(t) => text.push_str(t),
            Event::End(TagEnd::Paragraph) if text == "[TOC]" => return Some(offset),
            _ => return None,
        }
    }
    None
}

struct TocEntry {
    depth: usize,
    id: String,
    text: String,
}

/// Gather every heading in order, with the nesting depth its contents
/// entry gets. Depth is relative: a document starting at `##` still
/// produces a top-level entry, and a skipped level nests one step.
fn collect_headings(events: &[Event]) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut open_levels: Vec<usize> = Vec::new();

    for (i, event) in events.iter().enumerate() {
        if let Event::Start(Tag::Heading { level, .. }) = event {
            let level = *level as usize;
            while open_levels.last().is_some_and(|&open| open >= level) {
                open_levels.pop();
            }
            open_levels.push(level);

            let text = heading_text(&events[i + 1..]);
            entries.push(TocEntry {
                depth: open_levels.len(),
                id: slugify(&text),
                text,
            });
        }
    }

    entries
}

/// Nested list of links to every heading, wrapped in `<div class="toc">`.
fn toc_html(entries: &[TocEntry]) -> String {
    if entries.is_empty() {
        return String::from("<div class=\"toc\">\n<ul></ul>\n</div>");
    }

    let mut html = String::from("<div class=\"toc\">");
    let mut depth = 0;

    for entry in entries {
        if entry.depth > depth {
            html.push_str("\n<ul>");
        } else {
            html.push_str("</li>");
            for _ in entry.depth..depth {
                html.push_str("\n</ul>\n</li>");
            }
        }
        html.push_str(&format!(
            "\n<li><a href=\"#{}\">{}</a>",
            entry.id,
            html_escape::encode_text(&entry.text)
        ));
        depth = entry.depth;
    }

    html.push_str("</li>");
    for _ in 1..depth {
        html.push_str("\n</ul>\n</li>");
    }
    html.push_str("\n</ul>\n</div>");

    html
}

fn highlight_code(lang: &str, code: &str) -> String {
    match SYNTAX_SET.find_syntax_by_token(lang) {
        Some(syntax) => {
            let theme = &THEME_SET.themes[SYNTAX_THEME];
            highlighted_html_for_string(code, &SYNTAX_SET, syntax, theme)
                .unwrap_or_else(|_| plain_code_block(code))
        }
        None => plain_code_block(code),
    }
}

fn plain_code_block(code: &str) -> String {
    format!("<pre><code>{}</code></pre>", html_escape::encode_text(code))
}

/// Anchor id for an in-body heading: lowercased alphanumerics with runs
/// of anything else collapsed into single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}
