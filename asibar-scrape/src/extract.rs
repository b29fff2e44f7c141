use regex::Regex;
use scraper::{Html, Selector};
use thiserror::Error;

const LAST_UPDATED_PATTERN: &str = r"^var asisayisiguncellemesaati = '(.+)'";
const SECOND_DOSE_PATTERN: &str = r"^var asiyapilankisisayisi2Doz = ([0-9]+)";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("invalid script pattern: {0}")]
    InvalidPattern(String),
    #[error("no element matches {0:?}")]
    MissingContainer(String),
    #[error("missing last updated")]
    MissingLastUpdated,
    #[error("missing second dose")]
    MissingSecondDose,
    #[error("second dose count {0:?} is not a valid integer")]
    InvalidCount(String),
}

/// Raw values recovered from the page, before any arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageValues {
    pub second_dose: u64,
    /// Already localized by the page ("19.05.2021 17:32"); kept verbatim.
    pub last_updated: String,
}

/// Compiled selectors and script patterns.
///
/// Build once, run against as many documents as needed.
#[derive(Debug, Clone)]
pub struct Extractor {
    container_src: String,
    container: Selector,
    script: Selector,
    last_updated: Regex,
    second_dose: Regex,
}

impl Extractor {
    pub fn new(container_selector: &str) -> Result<Self, ParseError> {
        Ok(Self {
            container_src: container_selector.to_string(),
            container: parse_selector(container_selector)?,
            script: parse_selector("script")?,
            last_updated: Regex::new(LAST_UPDATED_PATTERN)
                .map_err(|e| ParseError::InvalidPattern(e.to_string()))?,
            second_dose: Regex::new(SECOND_DOSE_PATTERN)
                .map_err(|e| ParseError::InvalidPattern(e.to_string()))?,
        })
    }

    /// Find both values in an HTML document.
    ///
    /// Every `<script>` below the container is tested against both patterns, and a
    /// pattern only matches at the very start of the script text. When a pattern
    /// matches several scripts, the last one in document order wins.
    ///
    /// ```
    /// use asibar_scrape::Extractor;
    ///
    /// let html = r#"<div class="svg-turkiye-haritasi">
    ///   <script>var asiyapilankisisayisi2Doz = 42;</script>
    ///   <script>var asisayisiguncellemesaati = '19.05.2021 17:32';</script>
    /// </div>"#;
    /// let values = Extractor::new(".svg-turkiye-haritasi")?.extract(html)?;
    /// assert_eq!(values.second_dose, 42);
    /// assert_eq!(values.last_updated, "19.05.2021 17:32");
    /// # Ok::<(), asibar_scrape::ParseError>(())
    /// ```
    pub fn extract(&self, html: &str) -> Result<PageValues, ParseError> {
        let doc = Html::parse_document(html);
        let container = doc
            .select(&self.container)
            .next()
            .ok_or_else(|| ParseError::MissingContainer(self.container_src.clone()))?;

        let mut last_updated: Option<String> = None;
        let mut second_dose: Option<String> = None;

        for (index, script) in container.select(&self.script).enumerate() {
            let text: String = script.text().collect();
            tracing::debug!(index, script = %text, "status.script");

            if let Some(caps) = self.last_updated.captures(&text) {
                last_updated = Some(caps[1].to_string());
            }
            if let Some(caps) = self.second_dose.captures(&text) {
                second_dose = Some(caps[1].to_string());
            }
        }

        let last_updated = last_updated.ok_or(ParseError::MissingLastUpdated)?;
        let second_dose = second_dose.ok_or(ParseError::MissingSecondDose)?;
        let second_dose = second_dose
            .parse::<u64>()
            .map_err(|_| ParseError::InvalidCount(second_dose.clone()))?;

        Ok(PageValues {
            second_dose,
            last_updated,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// `count / population`, rounded to four decimal places.
///
/// No upper bound is enforced: a count above the population yields a ratio above 1.
/// `population` must be non-zero; configuration validation guarantees that.
///
/// ```
/// assert_eq!(asibar_scrape::compute_ratio(9_730_410, 83_614_362), 0.1164);
/// ```
pub fn compute_ratio(count: u64, population: u64) -> f64 {
    let raw = count as f64 / population as f64;
    (raw * 10_000.0).round() / 10_000.0
}
