use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::data_models::SearchResult;
use crate::error::{Result, SearchError};

static TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("`table` is a valid selector"));

static DDG_LITE: Lazy<TableLayout> = Lazy::new(|| {
    TableLayout::with_rules(&LayoutRules::default()).expect("built-in layout rules are valid")
});

/// Turns a raw search-results page into unified results.
///
/// Implementations never fail: markup that does not look like what they
/// expect yields fewer (or zero) results.
pub trait ExtractionStrategy: Send + Sync {
    fn extract(&self, html: &str, num_results: usize) -> Vec<SearchResult>;
}

/// Extract up to `num_results` results from a DuckDuckGo lite results page.
pub fn html_to_search_results(html: &str, num_results: usize) -> Vec<SearchResult> {
    TableLayout::ddg_lite().extract(html, num_results)
}

/// CSS rules for a table based results page. Each rule is evaluated inside
/// one table, picked by position among all tables in document order:
///
/// * `zero_click_link` in the second-to-last table,
/// * `summary_row` in the second table (the second match is the summary body),
/// * `web_link` and `web_snippet` in the last table.
#[derive(Debug, Clone)]
pub struct LayoutRules {
    pub zero_click_link: String,
    pub summary_row: String,
    pub web_link: String,
    pub web_snippet: String,
}

impl Default for LayoutRules {
    fn default() -> Self {
        Self {
            zero_click_link: r#"tr td a[rel~="nofollow"]"#.to_string(),
            summary_row: "tr".to_string(),
            web_link: "tr:not(.result-sponsored) .result-link".to_string(),
            web_snippet: "tr:not(.result-sponsored) .result-snippet".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct TableLayout {
    zero_click_link: Selector,
    summary_row: Selector,
    web_link: Selector,
    web_snippet: Selector,
}

impl TableLayout {
    /// The layout served by `lite.duckduckgo.com`.
    pub fn ddg_lite() -> &'static TableLayout {
        &DDG_LITE
    }

    pub fn with_rules(rules: &LayoutRules) -> Result<Self> {
        Ok(Self {
            zero_click_link: compile(&rules.zero_click_link)?,
            summary_row: compile(&rules.summary_row)?,
            web_link: compile(&rules.web_link)?,
            web_snippet: compile(&rules.web_snippet)?,
        })
    }

    fn zero_click(&self, tables: &[ElementRef]) -> Option<SearchResult> {
        let holder = tables.len().checked_sub(2).map(|i| tables[i])?;
        let link = holder.select(&self.zero_click_link).next()?;

        let body = tables
            .get(1)
            .and_then(|t| t.select(&self.summary_row).nth(1))
            .map(|row| text_of(row).trim().to_string())
            .unwrap_or_default();

        Some(SearchResult::new(text_of(link), body, href_of(link)))
    }

    fn web_results(&self, table: ElementRef, limit: usize) -> Vec<SearchResult> {
        let snippets = table
            .select(&self.web_snippet)
            .take(limit)
            .map(|s| text_of(s).trim().to_string())
            .collect::<Vec<String>>();

        table
            .select(&self.web_link)
            .take(limit)
            .enumerate()
            .map(|(i, link)| {
                let body = snippets.get(i).cloned().unwrap_or_default();
                SearchResult::new(text_of(link), body, href_of(link))
            })
            .collect()
    }
}

impl ExtractionStrategy for TableLayout {
    fn extract(&self, html: &str, num_results: usize) -> Vec<SearchResult> {
        let mut results = Vec::new();
        if num_results == 0 {
            return results;
        }

        let document = Html::parse_document(html);
        let tables = document.select(&TABLE).collect::<Vec<ElementRef>>();
        let Some(last) = tables.last().copied() else {
            return results;
        };

        let limit = match self.zero_click(&tables) {
            Some(zero_click) => {
                results.push(zero_click);
                num_results - 1
            }
            None => num_results,
        };
        results.extend(self.web_results(last, limit));

        log::trace!(
            "extracted {} results from {} tables (limit {num_results})",
            results.len(),
            tables.len()
        );
        results
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| SearchError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn text_of(element: ElementRef) -> String {
    element.text().collect()
}

fn href_of(element: ElementRef) -> String {
    element.value().attr("href").unwrap_or_default().to_string()
}

#[test]
fn test_invalid_rule_is_rejected() {
    let rules = LayoutRules {
        web_link: "tr:::".to_string(),
        ..LayoutRules::default()
    };
    match TableLayout::with_rules(&rules) {
        Err(SearchError::InvalidSelector { selector, .. }) => assert_eq!(selector, "tr:::"),
        other => panic!("expected InvalidSelector, got {other:?}"),
    }
}
