//! Issue source: fetches results pages over HTTP and extracts their option tables.

pub mod html;
pub mod http;

pub use html::{IssueDocument, IssueRef, parse_issue_page};
pub use http::{FetchError, IssueClient};
