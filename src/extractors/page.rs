//! Page-level extraction: turns one listing page's parse tree into business
//! metadata and review records. Selector strategies deliberately avoid
//! brittle generated class names and lean on semantic attributes, so they
//! survive routine markup churn.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::extractors::normalize;
use crate::models::{
    BusinessRecord, BusinessResponse, ReactionCounts, ReviewRecord, ReviewerStats,
};

static REVIEWS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d[\d,]*)\s+reviews?\b").expect("static regex"));
static FRIENDS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d[\d,]*)\s+friends?\b").expect("static regex"));
static PHOTOS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d[\d,]*)\s+photos?\b").expect("static regex"));
static HELPFUL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+Helpful").expect("static regex"));
static THANKS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+Thanks").expect("static regex"));
static LOVE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+Love this").expect("static regex"));
static OH_NO_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+Oh no").expect("static regex"));
static DATEISH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\b|\b20\d{2}\b")
        .expect("static regex")
});
static OWNER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Business Owner").expect("static regex"));

/// Everything extracted from a single listing page.
#[derive(Debug)]
pub struct PageExtract {
    /// Populated on page 1 only; later pages reuse the page-1 record.
    pub business: Option<BusinessRecord>,
    pub reviews: Vec<ReviewRecord>,
    /// Reviews present on the page but disqualified (no rating or date).
    pub dropped: u32,
    pub has_next: bool,
}

struct Selectors {
    h1: Selector,
    og_title: Selector,
    star_label: Selector,
    address: Selector,
    tel_link: Selector,
    span: Selector,
    anchor_span: Selector,
    review_container: Selector,
    review_container_fallback: Selector,
    section: Selector,
    json_ld: Selector,
    next_link: Selector,
    profile_link: Selector,
    strong: Selector,
    img: Selector,
    time: Selector,
    paragraph: Selector,
    video_source: Selector,
    div: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| Error::Selector(format!("{css}: {e}")))
        };
        Ok(Self {
            h1: parse("h1")?,
            og_title: parse("meta[property='og:title']")?,
            star_label: parse("[aria-label*='star rating']")?,
            address: parse("address")?,
            tel_link: parse("a[href^='tel:']")?,
            span: parse("span")?,
            anchor_span: parse("a, span")?,
            review_container: parse("[data-review-id]")?,
            review_container_fallback: parse("li[class*='review']")?,
            section: parse("section")?,
            json_ld: parse("script[type='application/ld+json']")?,
            next_link: parse("a[aria-label*='Next'], link[rel='next']")?,
            profile_link: parse("a[href*='user_details']")?,
            strong: parse("strong")?,
            img: parse("img")?,
            time: parse("time")?,
            paragraph: parse("p")?,
            video_source: parse("video source")?,
            div: parse("div")?,
        })
    }
}

pub struct PageParser {
    selectors: Selectors,
}

impl PageParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            selectors: Selectors::new()?,
        })
    }

    /// Parses one page of a business's review listing. `page_number` starts
    /// at 1; business metadata is only extracted there.
    pub fn parse_page(&self, html: &str, business_url: &str, page_number: u32) -> PageExtract {
        let document = Html::parse_document(html);

        let mut reviews = Vec::new();
        let mut dropped = 0u32;

        for container in self.review_containers(&document) {
            match self.parse_review(&container) {
                Ok(review) => reviews.push(review),
                Err(reason) => {
                    dropped += 1;
                    warn!(
                        business_url = business_url,
                        page = page_number,
                        reason = reason,
                        "Review disqualified"
                    );
                }
            }
        }

        let business = (page_number == 1).then(|| self.parse_business(&document, business_url));

        let has_next = document.select(&self.selectors.next_link).next().is_some();

        debug!(
            business_url = business_url,
            page = page_number,
            reviews = reviews.len(),
            dropped = dropped,
            has_next = has_next,
            "Page parsed"
        );

        PageExtract {
            business,
            reviews,
            dropped,
            has_next,
        }
    }

    fn review_containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let primary: Vec<_> = document.select(&self.selectors.review_container).collect();
        if !primary.is_empty() {
            return primary;
        }
        let fallback: Vec<_> = document
            .select(&self.selectors.review_container_fallback)
            .collect();
        if !fallback.is_empty() {
            return fallback;
        }
        // Last resort: the sections carrying a star widget are the reviews.
        document
            .select(&self.selectors.section)
            .filter(|section| section.select(&self.selectors.star_label).next().is_some())
            .collect()
    }

    // ----- business metadata -------------------------------------------

    fn parse_business(&self, document: &Html, business_url: &str) -> BusinessRecord {
        let mut record = BusinessRecord::empty(business_url);
        record.business_name = self.business_name(document);
        record.average_rating = self.average_rating(document);
        record.total_reviews = self.total_reviews(document);
        record.price_range = self.price_range(document);
        record.address = self.address(document);
        record.phone = self.phone(document);

        debug!(
            business_url = business_url,
            name = ?record.business_name,
            rating = ?record.average_rating,
            total_reviews = ?record.total_reviews,
            "Business parsed"
        );

        record
    }

    fn business_name(&self, document: &Html) -> Option<String> {
        if let Some(h1) = document.select(&self.selectors.h1).next() {
            let text = element_text(&h1);
            if !text.is_empty() {
                return Some(text);
            }
        }
        document
            .select(&self.selectors.og_title)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }

    fn average_rating(&self, document: &Html) -> Option<f64> {
        let labelled = document
            .select(&self.selectors.star_label)
            .find(|el| !in_review_container(el))
            .and_then(|el| el.value().attr("aria-label"))
            .and_then(normalize::parse_fractional_rating);
        if labelled.is_some() {
            return labelled;
        }
        // Server-rendered pages keep aggregateRating in a JSON-LD block even
        // when the star widget is missing.
        let data = self.json_ld_business(document)?;
        let value = data.get("aggregateRating")?.get("ratingValue")?;
        let rating = value
            .as_f64()
            .or_else(|| value.as_str()?.trim().parse().ok())?;
        (0.0..=5.0).contains(&rating).then_some(rating)
    }

    fn total_reviews(&self, document: &Html) -> Option<u32> {
        // Shortest "N reviews" token outside the review blocks is the
        // headline count; review blocks carry per-reviewer counts too.
        let mut candidates: Vec<String> = document
            .select(&self.selectors.anchor_span)
            .filter(|el| !in_review_container(el))
            .filter_map(|el| {
                let text = element_text(&el);
                REVIEWS_TOKEN.is_match(&text).then_some(text)
            })
            .collect();
        candidates.sort_by_key(String::len);
        candidates.first().and_then(|t| normalize::parse_count(t))
    }

    fn price_range(&self, document: &Html) -> Option<crate::models::PriceRange> {
        document
            .select(&self.selectors.span)
            .filter(|el| !in_review_container(el))
            .map(|el| element_text(&el))
            .find_map(|t| normalize::parse_price_range(&t))
    }

    fn address(&self, document: &Html) -> Option<String> {
        let tagged = document
            .select(&self.selectors.address)
            .next()
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty());
        if tagged.is_some() {
            return tagged;
        }
        let data = self.json_ld_business(document)?;
        let postal = data.get("address")?;
        let joined: Vec<&str> = ["streetAddress", "addressLocality", "addressRegion", "postalCode"]
            .iter()
            .filter_map(|key| postal.get(key).and_then(serde_json::Value::as_str))
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        (!joined.is_empty()).then(|| joined.join(", "))
    }

    /// First JSON-LD block on the page describing the business itself.
    fn json_ld_business(&self, document: &Html) -> Option<serde_json::Value> {
        document.select(&self.selectors.json_ld).find_map(|script| {
            let raw: String = script.text().collect();
            let data: serde_json::Value = serde_json::from_str(raw.trim()).ok()?;
            matches!(
                data.get("@type").and_then(serde_json::Value::as_str),
                Some("Restaurant" | "LocalBusiness")
            )
            .then_some(data)
        })
    }

    fn phone(&self, document: &Html) -> Option<String> {
        document.select(&self.selectors.tel_link).next().map(|el| {
            let text = element_text(&el);
            if text.is_empty() {
                el.value()
                    .attr("href")
                    .unwrap_or_default()
                    .trim_start_matches("tel:")
                    .to_string()
            } else {
                text
            }
        })
    }

    // ----- review extraction -------------------------------------------

    fn parse_review(&self, container: &ElementRef<'_>) -> std::result::Result<ReviewRecord, &'static str> {
        let rating = self
            .review_rating(container)
            .ok_or("missing or unparseable rating")?;
        let review_date = self
            .review_date_raw(container)
            .as_deref()
            .and_then(normalize::parse_date)
            .ok_or("missing or unparseable date")?;

        Ok(ReviewRecord {
            reviewer_name: self.reviewer_name(container).unwrap_or_default(),
            reviewer_avatar_url: self.avatar_url(container),
            reviewer_stats: self.reviewer_stats(container),
            reviewer_location: self.reviewer_location(container),
            rating,
            review_date,
            review_text: self.review_text(container).unwrap_or_default(),
            media_urls: self.media_urls(container),
            reaction_counts: self.reaction_counts(container),
            business_response: self.business_response(container),
        })
    }

    fn reviewer_name(&self, container: &ElementRef<'_>) -> Option<String> {
        for link in container.select(&self.selectors.profile_link) {
            let text = element_text(&link);
            if !text.is_empty() {
                return Some(text);
            }
        }
        container
            .select(&self.selectors.strong)
            .next()
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty())
    }

    fn avatar_url(&self, container: &ElementRef<'_>) -> Option<String> {
        container
            .select(&self.selectors.img)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string)
    }

    fn reviewer_stats(&self, container: &ElementRef<'_>) -> ReviewerStats {
        let text = element_text(container);
        let capture = |re: &Regex| {
            re.captures(&text)
                .and_then(|c| c.get(1))
                .and_then(|m| normalize::parse_count(m.as_str()))
        };
        ReviewerStats {
            review_count: capture(&REVIEWS_TOKEN),
            friend_count: capture(&FRIENDS_TOKEN),
            photo_count: capture(&PHOTOS_TOKEN),
        }
    }

    fn reviewer_location(&self, container: &ElementRef<'_>) -> Option<String> {
        // "City, ST" is usually the shortest comma-bearing span that
        // doesn't look like a date.
        let mut candidates: Vec<String> = container
            .select(&self.selectors.span)
            .map(|el| element_text(&el))
            .filter(|t| {
                t.contains(',')
                    && t.chars().any(char::is_alphabetic)
                    && !DATEISH_TOKEN.is_match(t)
            })
            .collect();
        candidates.sort_by_key(String::len);
        candidates.into_iter().next()
    }

    fn review_rating(&self, container: &ElementRef<'_>) -> Option<u8> {
        container
            .select(&self.selectors.star_label)
            .next()
            .and_then(|el| el.value().attr("aria-label"))
            .and_then(normalize::parse_rating)
    }

    fn review_date_raw(&self, container: &ElementRef<'_>) -> Option<String> {
        if let Some(time_el) = container.select(&self.selectors.time).next() {
            let text = element_text(&time_el);
            if !text.is_empty() {
                return Some(text);
            }
        }
        container
            .select(&self.selectors.span)
            .map(|el| element_text(&el))
            .find(|t| DATEISH_TOKEN.is_match(t))
    }

    fn review_text(&self, container: &ElementRef<'_>) -> Option<String> {
        let paragraphs: Vec<String> = container
            .select(&self.selectors.paragraph)
            .map(|el| element_text(&el))
            .filter(|t| t.split_whitespace().count() > 3)
            .collect();
        (!paragraphs.is_empty()).then(|| paragraphs.join(" "))
    }

    fn media_urls(&self, container: &ElementRef<'_>) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for img in container.select(&self.selectors.img) {
            if let Some(src) = img.value().attr("src") {
                if src.contains("yelp") && !urls.iter().any(|u| u == src) {
                    urls.push(src.to_string());
                }
            }
        }
        for source in container.select(&self.selectors.video_source) {
            if let Some(src) = source.value().attr("src") {
                if !urls.iter().any(|u| u == src) {
                    urls.push(src.to_string());
                }
            }
        }
        urls
    }

    fn reaction_counts(&self, container: &ElementRef<'_>) -> ReactionCounts {
        let text = element_text(container);
        let count = |re: &Regex| {
            re.captures(&text)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };
        ReactionCounts {
            helpful: count(&HELPFUL_TOKEN),
            thanks: count(&THANKS_TOKEN),
            love_this: count(&LOVE_TOKEN),
            oh_no: count(&OH_NO_TOKEN),
        }
    }

    fn business_response(&self, container: &ElementRef<'_>) -> Option<BusinessResponse> {
        let block = container
            .select(&self.selectors.div)
            .find(|div| OWNER_TOKEN.is_match(&element_text(div)))?;

        let author_name = block
            .select(&self.selectors.strong)
            .next()
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty());

        let date = self
            .review_date_raw(&block)
            .as_deref()
            .and_then(normalize::parse_date);

        let content = self.review_text(&block);

        Some(BusinessResponse {
            author_name,
            date,
            content,
        })
    }
}

/// True when the element sits inside a review block, so page-level field
/// extraction should skip it.
fn in_review_container(el: &ElementRef<'_>) -> bool {
    el.ancestors().filter_map(ElementRef::wrap).any(|a| {
        a.value().attr("data-review-id").is_some()
            || (a.value().name() == "li"
                && a.value().attr("class").is_some_and(|c| c.contains("review")))
    })
}

/// Joined, whitespace-collapsed text of an element's subtree.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
