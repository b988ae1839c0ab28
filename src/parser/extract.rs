use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

static CONTAINER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[data-id="9f8d33b"]"#).unwrap());
static HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2.elementor-heading-title").unwrap());
static PARAGRAPH_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"div[data-widget_type="text-editor.default"] p"#).unwrap());
static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// One extracted-but-unnormalized store entry. `paragraph_texts` keeps the
/// page's positional layout (0-1 address, 2 phone, 4-6 hours); the meaning of
/// each slot is assigned by the normalizer.
#[derive(Debug, Clone)]
pub struct RawBlock {
    pub name_text: Option<String>,
    pub paragraph_texts: Vec<String>,
    pub map_link: Option<String>,
}

/// Walk the locator page: the store container is the element carrying the
/// stable data-id attribute, and each direct element child is one store
/// block. Missing heading or directions link is non-fatal; a block is always
/// emitted, however sparse.
pub fn extract(html: &str) -> Vec<RawBlock> {
    let doc = Html::parse_document(html);

    let Some(container) = doc.select(&CONTAINER_SEL).next() else {
        warn!("store container not found in page; layout may have changed");
        return Vec::new();
    };

    let mut blocks = Vec::new();
    for child in container.children().filter_map(ElementRef::wrap) {
        let name_text = child
            .select(&HEADING_SEL)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty());

        let paragraph_texts: Vec<String> =
            child.select(&PARAGRAPH_SEL).map(element_text).collect();

        let map_link = child.select(&ANCHOR_SEL).find_map(|a| {
            a.value()
                .attr("href")
                .filter(|href| href.contains("maps"))
                .map(str::to_string)
        });

        if paragraph_texts.is_empty() {
            warn!("store block without detail paragraphs; emitting sparse record");
        }

        blocks.push(RawBlock {
            name_text,
            paragraph_texts,
            map_link,
        });
    }

    blocks
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/locations.html").unwrap()
    }

    #[test]
    fn one_block_per_container_child() {
        let blocks = extract(&fixture());
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn first_block_fields() {
        let blocks = extract(&fixture());
        let b = &blocks[0];
        assert_eq!(b.name_text.as_deref(), Some("GTM Store #1 – Santee"));
        assert_eq!(b.paragraph_texts.len(), 7);
        assert_eq!(b.paragraph_texts[0], "1234 Mission Gorge Rd");
        assert_eq!(b.paragraph_texts[2], "(619) 448-1000");
        assert!(b
            .map_link
            .as_deref()
            .unwrap()
            .starts_with("https://www.google.com/maps/"));
    }

    #[test]
    fn missing_optionals_do_not_drop_block() {
        let blocks = extract(&fixture());
        let b = &blocks[1];
        assert!(b.name_text.is_none());
        assert!(b.map_link.is_none());
        assert!(!b.paragraph_texts.is_empty());
    }

    #[test]
    fn missing_container_yields_no_blocks() {
        let blocks = extract("<html><body><div>no stores here</div></body></html>");
        assert!(blocks.is_empty());
    }

    #[test]
    fn non_maps_anchors_are_ignored() {
        let html = r#"
            <div data-id="9f8d33b">
              <div>
                <h2 class="elementor-heading-title">Store</h2>
                <div data-widget_type="text-editor.default"><p>1 A St</p></div>
                <a href="https://example.com/about">About</a>
              </div>
            </div>"#;
        let blocks = extract(html);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].map_link.is_none());
    }
}
