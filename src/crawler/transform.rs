//! HTML page transformation
//!
//! Rewriting a page happens in two passes over the same markup:
//!
//! 1. [`collect_assets`] lists the same-site resources the page embeds, so the
//!    caller can fetch and save them.
//! 2. [`rewrite_page`] re-parses the page, points every saved resource and
//!    every same-site hyperlink at its archive-relative location, injects the
//!    bookmark script and serializes the result.
//!
//! Which element attributes carry resources is plain data, see
//! [`RESOURCE_ATTRIBUTES`] and [`HYPERLINK_ATTRIBUTES`].

use crate::crawler::css::{extract_css_references, rewrite_css_references};
use crate::url::{relativize, resolve_reference, without_fragment, ArchivePath, PathMapper, SiteScope};
use scraper::node::Element;
use scraper::{Html, Node, Selector};
use std::collections::{HashMap, HashSet};
use url::Url;

/// Element/attribute pairs that embed a resource in the page
pub const RESOURCE_ATTRIBUTES: &[(&str, &str)] = &[
    ("img", "src"),
    ("link", "href"),
    ("script", "src"),
    ("video", "src"),
    ("audio", "src"),
    ("source", "src"),
];

/// Element/attribute pairs that navigate to another page
pub const HYPERLINK_ATTRIBUTES: &[(&str, &str)] = &[("a", "href"), ("iframe", "src")];

/// Elements whose `srcset` is reduced to its best candidate
const SRCSET_ELEMENTS: &[&str] = &["img", "source"];

/// `<link rel>` values that describe a relation rather than a resource
const NON_RESOURCE_RELS: &[&str] = &["canonical", "alternate", "next", "prev"];

/// How an embedded resource has to be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Saved byte for byte
    Plain,
    /// Scanned for `url()` and `@import` references before saving
    Stylesheet,
}

/// A same-site resource embedded by a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub url: Url,
    pub kind: AssetKind,
}

/// Everything [`rewrite_page`] needs to know about the page being rewritten
pub struct RewriteContext<'a> {
    /// URL references in the page resolve against (the final URL after redirects)
    pub page_url: &'a Url,

    /// Where the page itself is stored
    pub page_path: &'a ArchivePath,

    pub scope: &'a SiteScope,
    pub mapper: &'a PathMapper,

    /// Assets handled so far this run, by visit key; None when saving failed
    pub assets: &'a HashMap<String, Option<ArchivePath>>,

    /// Script injected at the end of `<body>`, if any
    pub bookmark_script: Option<&'a str>,
}

impl RewriteContext<'_> {
    fn saved_asset(&self, url: &Url) -> Option<&ArchivePath> {
        self.assets
            .get(&self.mapper.visit_key(url))
            .and_then(|path| path.as_ref())
    }

    fn relative_asset(&self, url: &Url) -> Option<String> {
        self.saved_asset(url)
            .map(|path| relativize(self.page_path, path))
    }

    fn relative_page(&self, url: &Url) -> String {
        let target = self.mapper.page_path(url);
        let mut relative = relativize(self.page_path, &target);
        if let Some(fragment) = url.fragment() {
            relative.push('#');
            relative.push_str(fragment);
        }
        relative
    }
}

/// Result of rewriting one page
#[derive(Debug, Clone)]
pub struct TransformedPage {
    /// Serialized document
    pub html: String,

    /// Same-site hyperlink targets, fragments removed, in document order
    pub links: Vec<Url>,

    /// Whether the bookmark script was injected
    pub injected: bool,
}

/// What one element references
#[derive(Default)]
struct ElementRefs {
    /// Attributes holding a single same-site resource
    resources: Vec<(&'static str, Url, AssetKind)>,

    /// Attributes holding a same-site hyperlink
    hyperlinks: Vec<(&'static str, Url)>,

    /// Best `srcset` candidate, if same-site
    srcset: Option<Url>,

    /// Same-site `url()` references in the `style` attribute
    style: Vec<Url>,
}

fn scan_element(element: &Element, page_url: &Url, scope: &SiteScope) -> ElementRefs {
    let name = element.name();
    let mut refs = ElementRefs::default();

    let resolve = |raw: &str| -> Option<Url> {
        resolve_reference(page_url, raw).filter(|url| scope.contains(url))
    };

    for &(tag, attr) in RESOURCE_ATTRIBUTES {
        if tag != name {
            continue;
        }
        let Some(raw) = element.attr(attr) else {
            continue;
        };

        let mut kind = AssetKind::Plain;
        if tag == "link" {
            let rels = link_rels(element);
            if rels.iter().any(|rel| NON_RESOURCE_RELS.contains(&rel.as_str())) {
                continue;
            }
            if rels.iter().any(|rel| rel == "stylesheet") {
                kind = AssetKind::Stylesheet;
            }
        }

        if let Some(url) = resolve(raw) {
            refs.resources.push((attr, url, kind));
        }
    }

    for &(tag, attr) in HYPERLINK_ATTRIBUTES {
        if tag != name {
            continue;
        }
        if let Some(url) = element.attr(attr).and_then(resolve) {
            refs.hyperlinks.push((attr, url));
        }
    }

    if SRCSET_ELEMENTS.contains(&name) {
        refs.srcset = element
            .attr("srcset")
            .and_then(best_srcset_candidate)
            .and_then(resolve);
    }

    if let Some(style) = element.attr("style") {
        refs.style = extract_css_references(style)
            .iter()
            .filter_map(|raw| resolve(raw))
            .collect();
    }

    refs
}

fn link_rels(element: &Element) -> Vec<String> {
    element
        .attr("rel")
        .map(|rel| {
            rel.split_ascii_whitespace()
                .map(|r| r.to_ascii_lowercase())
                .collect()
        })
        .unwrap_or_default()
}

/// Picks the candidate of a `srcset` value with the largest descriptor
///
/// Width descriptors (`640w`) compare by width, density descriptors (`2x`)
/// by density times 1000. A candidate without a descriptor counts as `1x`.
/// Ties keep the earlier candidate.
pub fn best_srcset_candidate(srcset: &str) -> Option<&str> {
    let mut best: Option<(&str, u64)> = None;

    for candidate in srcset.split(',') {
        let mut parts = candidate.split_whitespace();
        let Some(url) = parts.next() else {
            continue;
        };
        let descriptor = parts.next().unwrap_or("1x");

        let value = if let Some(width) = descriptor.strip_suffix('w') {
            match width.parse::<u64>() {
                Ok(width) => width,
                Err(_) => continue,
            }
        } else if let Some(density) = descriptor.strip_suffix('x') {
            match density.parse::<f64>() {
                Ok(density) if density.is_finite() && density >= 0.0 => (density * 1000.0) as u64,
                _ => continue,
            }
        } else {
            0
        };

        if best.map_or(true, |(_, current)| value > current) {
            best = Some((url, value));
        }
    }

    best.map(|(url, _)| url)
}

/// Lists the same-site resources a page embeds, deduplicated, in document order
///
/// A resource referenced both as a stylesheet and as something else is
/// reported once, as a stylesheet.
pub fn collect_assets(html: &str, page_url: &Url, scope: &SiteScope, mapper: &PathMapper) -> Vec<AssetRef> {
    let document = Html::parse_document(html);
    let Ok(all) = Selector::parse("*") else {
        return Vec::new();
    };

    let mut assets: Vec<AssetRef> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut add = |url: Url, kind: AssetKind| {
        let key = mapper.visit_key(&url);
        match positions.get(&key) {
            Some(&index) => {
                if kind == AssetKind::Stylesheet {
                    assets[index].kind = AssetKind::Stylesheet;
                }
            }
            None => {
                positions.insert(key, assets.len());
                assets.push(AssetRef { url, kind });
            }
        }
    };

    for element in document.select(&all) {
        let refs = scan_element(element.value(), page_url, scope);
        for (_, url, kind) in refs.resources {
            add(url, kind);
        }
        if let Some(url) = refs.srcset {
            add(url, AssetKind::Plain);
        }
        for url in refs.style {
            add(url, AssetKind::Plain);
        }
    }

    assets
}

/// Rewrites a page so it can be browsed from the archive
///
/// - Resource attributes whose target was saved point at the saved copy;
///   failed, cross-site and unparsable references are left untouched.
/// - Same-site hyperlinks point at the page-role path of their target,
///   whether or not that page has been fetched yet, keeping any fragment.
/// - The bookmark script is appended to `<body>` when both exist.
///
/// The parser is permissive, so malformed markup never fails the page.
pub fn rewrite_page(html: &str, ctx: &RewriteContext<'_>) -> TransformedPage {
    let mut document = Html::parse_document(html);
    let mut edits = Vec::new();
    let mut links = Vec::new();
    let mut seen_links = HashSet::new();

    if let Ok(all) = Selector::parse("*") {
        for element in document.select(&all) {
            let value = element.value();
            let refs = scan_element(value, ctx.page_url, ctx.scope);

            for (attr, url, _) in &refs.resources {
                if let Some(relative) = ctx.relative_asset(url) {
                    edits.push((element.id(), *attr, relative));
                }
            }

            for (attr, url) in &refs.hyperlinks {
                edits.push((element.id(), *attr, ctx.relative_page(url)));

                let target = without_fragment(url);
                if seen_links.insert(ctx.mapper.visit_key(&target)) {
                    links.push(target);
                }
            }

            if let Some(relative) = refs.srcset.as_ref().and_then(|url| ctx.relative_asset(url)) {
                edits.push((element.id(), "srcset", relative.clone()));
                if value.name() == "img" && value.attr("src").is_some() {
                    edits.push((element.id(), "src", relative));
                }
            }

            if !refs.style.is_empty() {
                if let Some(style) = value.attr("style") {
                    let rewritten = rewrite_css_references(style, |raw| {
                        resolve_reference(ctx.page_url, raw)
                            .filter(|url| ctx.scope.contains(url))
                            .and_then(|url| ctx.relative_asset(&url))
                    });
                    if rewritten != style {
                        edits.push((element.id(), "style", rewritten));
                    }
                }
            }
        }
    }

    for (id, attr, new_value) in edits {
        if let Some(mut node) = document.tree.get_mut(id) {
            if let Node::Element(element) = node.value() {
                for (name, slot) in element.attrs.iter_mut() {
                    if &*name.local == attr {
                        *slot = new_value.as_str().into();
                    }
                }
            }
        }
    }

    let injected = match ctx.bookmark_script {
        Some(script) => inject_script(&mut document, script),
        None => false,
    };

    TransformedPage {
        html: document.html(),
        links,
        injected,
    }
}

/// Appends a `<script>` element holding `script` to the document body
///
/// Returns false, leaving the document unchanged, when there is no body.
fn inject_script(document: &mut Html, script: &str) -> bool {
    let Ok(body_selector) = Selector::parse("body") else {
        return false;
    };
    let Some(body_id) = document.select(&body_selector).next().map(|body| body.id()) else {
        return false;
    };

    let Ok(script_selector) = Selector::parse("script") else {
        return false;
    };
    let fragment = Html::parse_fragment(&format!("<script>{}</script>", script));
    let Some(parsed) = fragment.select(&script_selector).next() else {
        return false;
    };
    let script_element = parsed.value().clone();
    let script_text = parsed.first_child().map(|text| text.value().clone());

    let Some(mut body) = document.tree.get_mut(body_id) else {
        return false;
    };
    let mut script_node = body.append(Node::Element(script_element));
    if let Some(text) = script_text {
        script_node.append(text);
    }

    true
}
