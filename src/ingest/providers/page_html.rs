//! Post blocks out of a rendered page.
//!
//! The page is parsed once. Walks over the DOM are iterative, so deeply nested
//! markup costs linear time and no stack. `<script>`, `<style>`, `<noscript>`
//! and `<template>` subtrees never contribute text.

use scraper::{ElementRef, Html, Node, Selector};

use crate::ingest::types::RawBlock;

/// Post containers, most specific first; the first selector with any match wins.
pub const POST_SELECTORS: &[&str] = &[
    r#"[data-ad-preview="message"]"#,
    r#"[data-ad-comet-preview="message"]"#,
    r#"div[class*="x1iorvi4"]"#,
    r#"div[role="article"]"#,
];

const POST_LINK_SELECTOR: &str =
    r#"a[href*="/posts/"], a[href*="/permalink/"], a[href*="story_fbid="]"#;

/// Text length bounds (exclusive) for the marker-less fallback.
const FALLBACK_MIN_CHARS: usize = 100;
const FALLBACK_MAX_CHARS: usize = 5000;

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

const LINE_BREAK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "td", "th", "tr", "ul",
];

enum Visit<'a> {
    Open(ElementRef<'a>),
    Close(ElementRef<'a>),
    Text(&'a str),
}

/// Depth-first walk emitting open/close/text events in document order.
fn walk<'a>(root: ElementRef<'a>, mut visit: impl FnMut(Visit<'a>)) {
    let mut stack = vec![(*root, false)];
    while let Some((node, closing)) = stack.pop() {
        match node.value() {
            Node::Text(text) => visit(Visit::Text(text)),
            Node::Element(el) => {
                let Some(el_ref) = ElementRef::wrap(node) else {
                    continue;
                };
                if closing {
                    visit(Visit::Close(el_ref));
                    continue;
                }
                if SKIPPED_TAGS.contains(&el.name()) {
                    continue;
                }
                visit(Visit::Open(el_ref));
                stack.push((node, true));
                let children: Vec<_> = node.children().collect();
                stack.extend(children.into_iter().rev().map(|c| (c, false)));
            }
            _ => {}
        }
    }
}

fn breaks_line(el: &ElementRef<'_>) -> bool {
    LINE_BREAK_TAGS.contains(&el.value().name())
}

/// Chars of `s` once whitespace runs collapse to single spaces.
fn visible_chars(s: &str) -> usize {
    let mut words = 0usize;
    let mut chars = 0usize;
    for w in s.split_whitespace() {
        words += 1;
        chars += w.chars().count();
    }
    chars + words.saturating_sub(1)
}

/// Visible text of an element, one line per block-level element.
pub fn element_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    walk(el, |v| match v {
        Visit::Open(e) | Visit::Close(e) if breaks_line(&e) => raw.push('\n'),
        Visit::Text(t) => raw.push_str(t),
        _ => {}
    });
    raw.lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Absolute, tracking-free post link.
pub fn normalize_link(href: &str, base: &str) -> String {
    // story_fbid lives in the query; other post links carry only tracking there.
    let href = if href.contains("story_fbid=") {
        href
    } else {
        href.split(['?', '#']).next().unwrap_or_default()
    };
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}

/// Enclosing anchor first, then the first post permalink inside the element.
fn post_link(el: ElementRef<'_>, link_sel: &Selector) -> Option<String> {
    let enclosing = std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .find(|a| a.value().name() == "a")
        .and_then(|a| a.value().attr("href"));
    enclosing
        .or_else(|| el.select(link_sel).find_map(|a| a.value().attr("href")))
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// Elements accepted by `is_container`, skipping any nested inside an already
/// taken one. `is_container` sees every element in document order.
fn outermost<'a>(
    root: ElementRef<'a>,
    max_posts: usize,
    mut is_container: impl FnMut(&ElementRef<'a>) -> bool,
) -> Vec<ElementRef<'a>> {
    let mut out = Vec::new();
    let mut inside = 0usize;
    walk(root, |v| match v {
        Visit::Open(el) => {
            let hit = is_container(&el);
            if inside > 0 {
                inside += 1;
            } else if hit && out.len() < max_posts {
                out.push(el);
                inside = 1;
            }
        }
        Visit::Close(_) => inside = inside.saturating_sub(1),
        Visit::Text(_) => {}
    });
    out
}

/// Collapsed text length of every `<div>`, in document order, in one pass.
fn div_text_lengths(root: ElementRef<'_>) -> Vec<usize> {
    let mut lens = Vec::new();
    let mut open: Vec<(usize, usize)> = Vec::new();
    let mut chars = 0usize;
    walk(root, |v| match v {
        Visit::Open(el) if el.value().name() == "div" => {
            open.push((lens.len(), chars));
            lens.push(0);
        }
        Visit::Close(el) if el.value().name() == "div" => {
            if let Some((idx, at)) = open.pop() {
                lens[idx] = chars - at;
            }
        }
        Visit::Text(t) => chars += visible_chars(t),
        _ => {}
    });
    lens
}

/// Split a rendered page into post blocks, at most `max_posts` of them.
///
/// Containers come from the first [`POST_SELECTORS`] entry that matches
/// anything. Without any match, `<div>`s whose collapsed text length lies
/// strictly between 100 and 5000 chars are taken instead. Either way a
/// container nested in one already taken is skipped.
pub fn extract_blocks(html: &str, base: &str, max_posts: usize) -> Vec<RawBlock> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();
    let Ok(link_sel) = Selector::parse(POST_LINK_SELECTOR) else {
        return Vec::new();
    };

    let marker = POST_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find(|sel| doc.select(sel).next().is_some());

    let containers = match marker {
        Some(sel) => outermost(root, max_posts, |el| sel.matches(el)),
        None => {
            let lens = div_text_lengths(root);
            let mut next_div = 0usize;
            outermost(root, max_posts, |el| {
                if el.value().name() != "div" {
                    return false;
                }
                let len = lens.get(next_div).copied().unwrap_or_default();
                next_div += 1;
                len > FALLBACK_MIN_CHARS && len < FALLBACK_MAX_CHARS
            })
        }
    };

    containers
        .into_iter()
        .map(|el| RawBlock {
            text: element_text(el),
            link: post_link(el, &link_sel).map(|h| normalize_link(&h, base)),
        })
        .collect()
}
