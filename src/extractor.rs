//! Raw record extraction from a loaded profile page
//!
//! Profile pages come in two layouts:
//! - multi-researcher pages carry a full list of researcher and section entries
//!   plus a subset list holding only the researchers
//! - single-researcher pages carry just a heading (the name) and a labelled
//!   section block
//!
//! The layout is chosen by checking which containers exist in the parsed DOM,
//! so a genuine read failure is never mistaken for "wrong layout".

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::browser::PageSession;
use crate::config::{LayoutAnchors, RetryPolicy};
use crate::error::ScrapeError;
use crate::models::ProfileRecord;

/// Which of the two known page structures a profile page uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLayout {
    MultiResearcher,
    SingleResearcher,
}

/// Records pulled from one page, plus the page heading for branch assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub layout: PageLayout,
    pub records: Vec<ProfileRecord>,
    pub heading: Option<String>,
}

/// Parsed form of [`LayoutAnchors`]
pub struct LayoutSelectors {
    full_list: Selector,
    subset_list: Selector,
    heading: Selector,
    single_section: Selector,
    item: Selector,
}

impl LayoutSelectors {
    pub fn compile(anchors: &LayoutAnchors) -> Result<Self, ScrapeError> {
        Ok(Self {
            full_list: parse_selector(&anchors.full_list)?,
            subset_list: parse_selector(&anchors.subset_list)?,
            heading: parse_selector(&anchors.heading)?,
            single_section: parse_selector(&anchors.single_section)?,
            item: parse_selector("li")?,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css)
        .map_err(|e| ScrapeError::ExtractionError(format!("invalid selector {:?}: {:?}", css, e)))
}

/// Wait for either layout to appear, then extract the page's raw records.
///
/// Browser failures and pages where neither layout is complete yet are
/// retried up to `policy.max_attempts` times.
pub fn extract<S: PageSession>(
    session: &mut S,
    anchors: &LayoutAnchors,
    policy: &RetryPolicy,
) -> Result<ExtractedPage, ScrapeError> {
    let selectors = LayoutSelectors::compile(anchors)?;
    let either_layout = format!("{}, {}", anchors.full_list, anchors.single_section);

    let mut attempt = 1;
    loop {
        let outcome = session
            .wait_present(&either_layout, policy.timeout())
            .and_then(|_| session.html());

        let failure = match outcome {
            Ok(html) => match parse_page(&html, &selectors) {
                Some(page) => return Ok(page),
                None => "no recognizable page layout".to_string(),
            },
            Err(e) => e.to_string(),
        };

        if attempt >= policy.max_attempts {
            return Err(ScrapeError::ExtractionError(format!(
                "{} after {} attempts",
                failure, attempt
            )));
        }

        attempt += 1;
        log::warn!("Unsuccessful read of page ({}), trying again. Attempt: {}", failure, attempt);
    }
}

/// Decide the layout of a parsed page, if it matches either one
pub fn detect_layout(document: &Html, selectors: &LayoutSelectors) -> Option<PageLayout> {
    let has = |selector: &Selector| document.select(selector).next().is_some();

    if has(&selectors.full_list) && has(&selectors.subset_list) {
        Some(PageLayout::MultiResearcher)
    } else if has(&selectors.heading) && has(&selectors.single_section) {
        Some(PageLayout::SingleResearcher)
    } else {
        None
    }
}

/// Extract records from page HTML. `None` when neither layout is present.
pub fn parse_page(html: &str, selectors: &LayoutSelectors) -> Option<ExtractedPage> {
    let document = Html::parse_document(html);
    let layout = detect_layout(&document, selectors)?;

    let heading = document
        .select(&selectors.heading)
        .next()
        .map(|h| rendered_text(h).replace('\n', " "))
        .filter(|h| !h.is_empty());

    let records = match layout {
        PageLayout::MultiResearcher => extract_multi(&document, selectors),
        PageLayout::SingleResearcher => {
            let section = document
                .select(&selectors.single_section)
                .next()
                .map(|s| rendered_text(s).replace('\n', " "))
                .unwrap_or_default();

            match &heading {
                Some(name) if !section.is_empty() => vec![ProfileRecord::new(name.clone(), section)],
                _ => return None,
            }
        }
    };

    Some(ExtractedPage {
        layout,
        records,
        heading,
    })
}

fn extract_multi(document: &Html, selectors: &LayoutSelectors) -> Vec<ProfileRecord> {
    let full = item_texts(document, &selectors.full_list, &selectors.item);
    let subset = item_texts(document, &selectors.subset_list, &selectors.item);

    let mut records = Vec::with_capacity(full.len());

    // Entries past the researcher count in the full list are section entries,
    // written "section\nname"
    for text in full.iter().skip(subset.len()) {
        match split_fields(text) {
            Ok(fields) => records.push(ProfileRecord::new(fields[1].clone(), fields[0].clone())),
            Err(e) => log::warn!("Skipping section entry: {}", e),
        }
    }

    // Researcher entries are "name\nsection"; more fields than that is ambiguous
    for text in &subset {
        match split_fields(text) {
            Ok(fields) if fields.len() == 2 => {
                let mut fields = fields.into_iter();
                if let (Some(name), Some(section)) = (fields.next(), fields.next()) {
                    records.push(ProfileRecord::new(name, section));
                }
            }
            Ok(fields) => log::debug!("Dropping ambiguous entry with {} fields: {:?}", fields.len(), text),
            Err(e) => log::warn!("Skipping researcher entry: {}", e),
        }
    }

    records
}

/// Rendered text of every `li` under the first container, keeping only
/// multi-line entries
fn item_texts(document: &Html, container: &Selector, item: &Selector) -> Vec<String> {
    document
        .select(container)
        .next()
        .map(|c| {
            c.select(item)
                .map(rendered_text)
                .filter(|t| t.contains('\n'))
                .collect()
        })
        .unwrap_or_default()
}

/// Split a multi-line entry into its non-empty lines
pub fn split_fields(text: &str) -> Result<Vec<String>, ScrapeError> {
    let fields: Vec<String> = text
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if fields.len() < 2 {
        return Err(ScrapeError::SplitError {
            text: text.to_string(),
            reason: format!("expected at least 2 lines, found {}", fields.len()),
        });
    }

    Ok(fields)
}

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "ol", "p", "section", "table",
    "tr", "ul",
];

/// Approximate the browser's rendered text: `<br>` and block elements start a
/// new line, whitespace runs collapse to one space, blank lines are dropped.
pub fn rendered_text(element: ElementRef<'_>) -> String {
    let mut lines = Vec::new();
    let mut current = String::new();
    collect_lines(element, &mut lines, &mut current);
    flush_line(&mut lines, &mut current);
    lines.join("\n")
}

fn collect_lines(element: ElementRef<'_>, lines: &mut Vec<String>, current: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                if text.starts_with(char::is_whitespace) {
                    push_space(current);
                }
                let mut words = text.split_whitespace();
                if let Some(first) = words.next() {
                    current.push_str(first);
                    for word in words {
                        current.push(' ');
                        current.push_str(word);
                    }
                    if text.ends_with(char::is_whitespace) {
                        push_space(current);
                    }
                }
            }
            Node::Element(el) => {
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                match el.name() {
                    "br" => flush_line(lines, current),
                    "script" | "style" => {}
                    name if BLOCK_TAGS.contains(&name) => {
                        flush_line(lines, current);
                        collect_lines(child_ref, lines, current);
                        flush_line(lines, current);
                    }
                    _ => collect_lines(child_ref, lines, current),
                }
            }
            _ => {}
        }
    }
}

fn push_space(current: &mut String) {
    if !current.is_empty() && !current.ends_with(' ') {
        current.push(' ');
    }
}

fn flush_line(lines: &mut Vec<String>, current: &mut String) {
    let line = current.trim();
    if !line.is_empty() {
        lines.push(line.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors() -> LayoutSelectors {
        LayoutSelectors::compile(&LayoutAnchors::default()).unwrap()
    }

    const MULTI_PAGE: &str = r#"
        <html><body>
        <h1>Laboratory of Immunoregulation</h1>
        <div class="block block-layout-builder block-field-blocknodedivisionfield-subtopic-division">
          <div class="clearfix text-formatted field field--name-field-body field--type-text-long field--label-hidden field__item">
            <ul>
              <li><a href="/a">Jane Doe, MD, PhD</a><br>Clinical Unit</li>
              <li><a href="/b">John Roe, PhD</a><br>Cellular Section</li>
              <li><a href="/c">Ann Poe</a><br>Cellular Section<br>Acting Chief</li>
            </ul>
          </div>
          <ul>
            <li><a href="/s1">Molecular Section</a><br>Mary Major, PhD</li>
            <li>Just a label</li>
          </ul>
        </div>
        </body></html>
    "#;

    const SINGLE_PAGE: &str = r#"
        <html><body>
        <h1>Sam Single,   MD</h1>
        <div id="anch_346"><p>Vaccine Research Unit</p></div>
        </body></html>
    "#;

    #[test]
    fn test_detect_multi_layout() {
        let doc = Html::parse_document(MULTI_PAGE);
        assert_eq!(detect_layout(&doc, &selectors()), Some(PageLayout::MultiResearcher));
    }

    #[test]
    fn test_detect_single_layout() {
        let doc = Html::parse_document(SINGLE_PAGE);
        assert_eq!(detect_layout(&doc, &selectors()), Some(PageLayout::SingleResearcher));
    }

    #[test]
    fn test_detect_unknown_layout() {
        let doc = Html::parse_document("<html><body><p>Nothing here</p></body></html>");
        assert_eq!(detect_layout(&doc, &selectors()), None);
        assert!(parse_page("<p>Nothing</p>", &selectors()).is_none());
    }

    #[test]
    fn test_multi_page_records() {
        let page = parse_page(MULTI_PAGE, &selectors()).unwrap();

        assert_eq!(page.heading.as_deref(), Some("Laboratory of Immunoregulation"));
        // the full list holds 4 multi-line items (3 researchers + 1 section entry);
        // the three-line researcher entry is dropped
        assert_eq!(
            page.records,
            vec![
                ProfileRecord::new("Mary Major, PhD", "Molecular Section"),
                ProfileRecord::new("Jane Doe, MD, PhD", "Clinical Unit"),
                ProfileRecord::new("John Roe, PhD", "Cellular Section"),
            ]
        );
    }

    #[test]
    fn test_single_page_record() {
        let page = parse_page(SINGLE_PAGE, &selectors()).unwrap();
        assert_eq!(page.layout, PageLayout::SingleResearcher);
        assert_eq!(
            page.records,
            vec![ProfileRecord::new("Sam Single, MD", "Vaccine Research Unit")]
        );
    }

    #[test]
    fn test_rendered_text_breaks_and_inline() {
        let doc = Html::parse_fragment("<li><strong>Jane</strong> Doe<br/>  Unit <em>A</em> </li>");
        let li = doc.select(&Selector::parse("li").unwrap()).next().unwrap();
        assert_eq!(rendered_text(li), "Jane Doe\nUnit A");
    }

    #[test]
    fn test_split_fields_requires_two_lines() {
        assert_eq!(split_fields("a\n b \n\n").map(|f| f.len()).ok(), Some(2));
        assert!(matches!(split_fields("only\n  \n"), Err(ScrapeError::SplitError { .. })));
    }
}
