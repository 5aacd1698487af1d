// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use scraper::{Html, Node};

/// Elements whose text never renders on the page
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Elements that start on a new line when rendered
const BLOCK_ELEMENTS: [&str; 24] = [
    "address", "article", "aside", "blockquote", "body", "br", "dd", "div", "dl", "dt",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "p", "section", "td",
    "th", "tr",
];

/// Extract visible text from HTML using the scraper crate.
///
/// Parsing is lenient (html5ever), so malformed markup still yields the
/// best-effort text. Text nodes are joined as-is, so inline markup inside a
/// word (`<b>S</b>ale`) does not split it; block elements start a new word.
/// Whitespace runs collapse to a single space.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut text = String::new();
    for node in document.root_element().descendants() {
        let content = match node.value() {
            Node::Text(content) => content,
            Node::Element(element) => {
                if BLOCK_ELEMENTS.contains(&element.name()) {
                    text.push(' ');
                }
                continue;
            }
            _ => continue,
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(element) => HIDDEN_ELEMENTS.contains(&element.name()),
            _ => false,
        });
        if hidden {
            continue;
        }

        text.push_str(content);
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
