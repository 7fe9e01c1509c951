//! Results page extraction.
//!
//! A results page has one `<title>` and one table: a header row followed by
//! one row per option with three cells (result text, effects, observation
//! counts). Effects and counts are one per line.

use std::fmt;
use std::str::FromStr;

use dilemma_core::TableRow;
use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::http::FetchError;

const CELLS_PER_ROW: usize = 3;

/// Which issue to load: a specific number or a random one from the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueRef {
    Number(u32),
    Random,
}

impl FromStr for IssueRef {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "?" {
            return Ok(Self::Random);
        }
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FetchError::InvalidIssue(s.to_string()));
        }
        s.parse()
            .map(Self::Number)
            .map_err(|_| FetchError::InvalidIssue(s.to_string()))
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Random => f.write_str("?"),
        }
    }
}

/// One fetched issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueDocument {
    pub number: u32,
    pub title: String,
    pub rows: Vec<TableRow>,
}

impl IssueDocument {
    pub fn wiki_url(&self) -> String {
        format!(
            "https://nsindex.net/wiki/NationStates_Issue_No._{}",
            self.number
        )
    }

    pub fn dilemma_url(&self) -> String {
        format!(
            "https://www.nationstates.net/page=show_dilemma/dilemma={}",
            self.number
        )
    }
}

/// Extract the title and option rows from a results page.
pub fn parse_issue_page(number: u32, html: &str) -> Result<IssueDocument, FetchError> {
    let document = Html::parse_document(html);
    let title_sel = selector("title")?;
    let row_sel = selector("tr")?;

    let mut titles = document.select(&title_sel);
    let title = match (titles.next(), titles.next()) {
        (Some(title), None) => element_text(title).trim().to_string(),
        (None, _) => return Err(FetchError::Malformed("page has no title".into())),
        (Some(_), Some(_)) => {
            return Err(FetchError::Malformed("page has more than one title".into()));
        }
    };

    let mut rows = Vec::new();
    for (index, row) in document.select(&row_sel).enumerate().skip(1) {
        let cells: Vec<ElementRef<'_>> = row.children().filter_map(ElementRef::wrap).collect();
        if cells.len() != CELLS_PER_ROW {
            warn!(row = index, cells = cells.len(), "skipping row without three cells");
            continue;
        }
        rows.push(TableRow::new(
            element_text(cells[0]),
            cell_lines(cells[1]),
            cell_lines(cells[2]),
        ));
    }

    Ok(IssueDocument {
        number,
        title,
        rows,
    })
}

/// Issue numbers listed on the index page, skipping unnamed `#<n> ?` entries.
pub fn index_issue_numbers(html: &str) -> Result<Vec<u32>, FetchError> {
    let document = Html::parse_document(html);
    let text: String = document.root_element().text().collect();
    let pattern = Regex::new(r"#(\d+) [^?]").map_err(|e| FetchError::Malformed(e.to_string()))?;
    Ok(pattern
        .captures_iter(&text)
        .filter_map(|caps| caps[1].parse().ok())
        .collect())
}

/// Pick one of the named issues on the index page uniformly at random.
pub fn pick_random_issue<R: Rng + ?Sized>(index_html: &str, rng: &mut R) -> Result<u32, FetchError> {
    index_issue_numbers(index_html)?
        .choose(rng)
        .copied()
        .ok_or(FetchError::NoIssues)
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Malformed(format!("selector {css}: {e}")))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn cell_lines(cell: ElementRef<'_>) -> Vec<String> {
    element_text(cell)
        .trim()
        .lines()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dilemma_core::DocumentRow;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const PAGE: &str = r#"<html>
<head><title>#123 Tanks for Nothing</title></head>
<body>
<table>
<tr><th>Option</th><th>Effects</th><th>Count</th></tr>
<tr>
<td>1. @@NAME@@ should build more tanks.</td>
<td>2 to 4 Defense (mean 3)
adopts policy: Conscription
unknown effect</td>
<td>12
8
</td>
</tr>
<tr>
<td>2. Melt them down.</td>
<td>-1 Defense</td>
<td>1</td>
</tr>
</table>
</body>
</html>"#;

    #[test]
    fn extracts_title_and_rows() {
        let doc = parse_issue_page(123, PAGE).unwrap();
        assert_eq!(doc.number, 123);
        assert_eq!(doc.title, "#123 Tanks for Nothing");
        assert_eq!(doc.rows.len(), 2);

        let first = &doc.rows[0];
        assert_eq!(first.result_text(), "1. @@NAME@@ should build more tanks.");
        assert_eq!(
            first.effects(),
            [
                "2 to 4 Defense (mean 3)",
                "adopts policy: Conscription",
                "unknown effect"
            ]
        );
        assert_eq!(first.observations(), ["12", "8"]);
        assert_eq!(doc.rows[1].observations(), ["1"]);
    }

    #[test]
    fn missing_title_is_malformed() {
        let err = parse_issue_page(1, "<html><body><table></table></body></html>");
        assert!(matches!(err, Err(FetchError::Malformed(_))));
    }

    #[test]
    fn duplicate_title_is_malformed() {
        let html = "<html><head><title>a</title><title>b</title></head><body></body></html>";
        assert!(matches!(
            parse_issue_page(1, html),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn rows_without_three_cells_are_skipped() {
        let html = "<html><head><title>a</title></head><body><table>\
            <tr><th>Option</th><th>Effects</th><th>Count</th></tr>\
            <tr><td>1. Tanks.</td><td>1 Defense</td><td>4</td></tr>\
            <tr><td>2. x</td><td>1 Defense</td></tr>\
            <tr><td>3. Guns.</td><td>-1 Defense</td><td>5</td></tr>\
            <tr><td colspan=3>footer note</td></tr>\
            </table></body></html>";
        let doc = parse_issue_page(1, html).unwrap();
        let results: Vec<&str> = doc.rows.iter().map(|r| r.result_text()).collect();
        assert_eq!(results, vec!["1. Tanks.", "3. Guns."]);
    }

    #[test]
    fn header_only_table_has_no_rows() {
        let html = "<html><head><title>a</title></head><body><table>\
            <tr><th>Option</th><th>Effects</th><th>Count</th></tr>\
            </table></body></html>";
        assert!(parse_issue_page(1, html).unwrap().rows.is_empty());
    }

    #[test]
    fn index_skips_unnamed_issues() {
        let html = "<html><body><ul>\
            <li>#1 A Capital Idea</li>\
            <li>#2 ?</li>\
            <li>#35 Taxing Times</li>\
            </ul></body></html>";
        assert_eq!(index_issue_numbers(html).unwrap(), vec![1, 35]);
    }

    #[test]
    fn random_pick_comes_from_named_issues() {
        let html = "<html><body><ul>\
            <li>#4 Pet Rocks</li>\
            <li>#5 ?</li>\
            <li>#9 Sea Walls</li>\
            </ul></body></html>";
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let n = pick_random_issue(html, &mut rng).unwrap();
            assert!(n == 4 || n == 9, "picked {n}");
        }
    }

    #[test]
    fn random_pick_without_named_issues() {
        let html = "<html><body><ul><li>#1 ?</li><li>#2 ?</li></ul></body></html>";
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            pick_random_issue(html, &mut rng),
            Err(FetchError::NoIssues)
        ));
    }

    #[test]
    fn issue_ref_parsing() {
        assert_eq!("42".parse::<IssueRef>().unwrap(), IssueRef::Number(42));
        assert_eq!(" ? ".parse::<IssueRef>().unwrap(), IssueRef::Random);
        assert!("-1".parse::<IssueRef>().is_err());
        assert!("".parse::<IssueRef>().is_err());
        assert!("12a".parse::<IssueRef>().is_err());
        assert_eq!(IssueRef::Number(7).to_string(), "7");
        assert_eq!(IssueRef::Random.to_string(), "?");
    }

    #[test]
    fn links() {
        let doc = IssueDocument {
            number: 42,
            title: String::new(),
            rows: Vec::new(),
        };
        assert_eq!(
            doc.wiki_url(),
            "https://nsindex.net/wiki/NationStates_Issue_No._42"
        );
        assert_eq!(
            doc.dilemma_url(),
            "https://www.nationstates.net/page=show_dilemma/dilemma=42"
        );
    }
}
