//! Thin query layer over `scraper`.
//!
//! A [`Query`] pairs a compiled CSS selector with what to pull out of each
//! match: its full text, only its direct text nodes, or one attribute.
//! Tables the site hides inside HTML comments are reached with
//! [`comment_fragment`], which re-parses the comment body as its own
//! document so the same queries work against it.

use scraper::{ElementRef, Html, Node, Selector};

use crate::error::CrawlError;

#[derive(Debug, Clone, Copy)]
enum Capture {
    Text,
    OwnText,
    Attr(&'static str),
}

#[derive(Debug)]
pub struct Query {
    selector: Selector,
    capture: Capture,
}

impl Query {
    /// Whole text content of every match, trimmed.
    pub fn text(css: &'static str) -> Result<Self, CrawlError> {
        Self::new(css, Capture::Text)
    }

    /// Direct child text nodes of every match, trimmed, blanks skipped.
    /// One match can yield several values.
    pub fn own_text(css: &'static str) -> Result<Self, CrawlError> {
        Self::new(css, Capture::OwnText)
    }

    pub fn attr(css: &'static str, name: &'static str) -> Result<Self, CrawlError> {
        Self::new(css, Capture::Attr(name))
    }

    fn new(css: &'static str, capture: Capture) -> Result<Self, CrawlError> {
        let selector = Selector::parse(css).map_err(|_| CrawlError::Selector(css.to_string()))?;
        Ok(Self { selector, capture })
    }

    pub fn select(&self, root: ElementRef) -> Vec<String> {
        root.select(&self.selector)
            .flat_map(|el| self.capture(el))
            .collect()
    }

    pub fn select_first(&self, root: ElementRef) -> Option<String> {
        root.select(&self.selector)
            .flat_map(|el| self.capture(el))
            .next()
    }

    /// The matched elements themselves, for row-by-row queries.
    pub fn elements<'a>(&self, root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        root.select(&self.selector).collect()
    }

    pub fn select_in(&self, document: &Html) -> Vec<String> {
        self.select(document.root_element())
    }

    pub fn first_in(&self, document: &Html) -> Option<String> {
        self.select_first(document.root_element())
    }

    fn capture(&self, el: ElementRef) -> Vec<String> {
        match self.capture {
            Capture::Text => vec![extract_text(el).trim().to_string()],
            Capture::OwnText => own_text(el),
            Capture::Attr(name) => el.value().attr(name).map(str::to_string).into_iter().collect(),
        }
    }
}

pub fn extract_text(node: ElementRef) -> String {
    node.text().collect::<String>()
}

fn own_text(node: ElementRef) -> Vec<String> {
    node.children()
        .filter_map(|child| child.value().as_text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

/// First text node after `node` among its siblings, skipping elements.
pub fn following_text(node: ElementRef) -> Option<String> {
    node.next_siblings()
        .find_map(|sibling| sibling.value().as_text().map(|text| text.trim().to_string()))
}

/// Finds the first comment containing `needle` and parses its body as a
/// standalone fragment.
pub fn comment_fragment(document: &Html, needle: &str) -> Option<Html> {
    document.tree.root().descendants().find_map(|node| match node.value() {
        Node::Comment(comment) if comment.comment.contains(needle) => {
            Some(Html::parse_fragment(&comment.comment))
        }
        _ => None,
    })
}
