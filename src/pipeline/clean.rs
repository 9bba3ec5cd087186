//! Slide cleaning: detect boilerplate titles and promote real ones.
//!
//! Presentation exports frequently stamp every page with a header the
//! extractor then mistakes for the title — a date line ("June 1, 1999 Vi
//! Editor 3"), a bare page number, or a literal "Slide 7". When the title
//! matches one of those shapes, the first content line is almost always
//! the real title, so we promote it.
//!
//! This is a pure function: no I/O, no state, same slide in → same slide
//! out.

use crate::output::Slide;
use once_cell::sync::Lazy;
use regex::Regex;

// Ordered boilerplate-title patterns. All are start-anchored; only the
// numeric one requires a full match.
static BOILERPLATE_TITLES: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        // Date prefix followed by trailing text and a number,
        // e.g. "June 1, 1999 Vi Editor 3"
        Regex::new(r"^\w+ \d+, \d{4} .+ \d+").unwrap(),
        // Just a page number
        Regex::new(r"^\d+$").unwrap(),
        // "Slide N" stamps
        Regex::new(r"^Slide \d+").unwrap(),
    ]
});

/// Return a slide with a possibly-revised title/content.
///
/// Tests the title against the boilerplate patterns in order. On the
/// first match, if the content has at least one non-empty line, that line
/// becomes the new title and is removed from the content; further
/// patterns are not checked. A slide matching no pattern (or with empty
/// content) is returned unchanged.
pub fn clean_slide(slide: Slide) -> Slide {
    let mut title = slide.title;
    let mut content = slide.content;

    for pattern in BOILERPLATE_TITLES.iter() {
        if pattern.is_match(&title) {
            let mut lines = content.lines();
            if let Some(first) = lines.next() {
                if !first.trim().is_empty() {
                    title = first.trim().to_string();
                    content = lines.collect::<Vec<_>>().join("\n").trim().to_string();
                }
            }
            // Stop after the first match; do not chain promotions.
            break;
        }
    }

    Slide {
        title,
        content,
        slide_num: slide.slide_num,
    }
}
