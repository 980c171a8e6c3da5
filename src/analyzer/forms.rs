//! Login form detection
//!
//! Coarse heuristic: a page has a login form if any `<form>` contains a
//! password input. No username field is required.

use scraper::{Html, Selector};

/// Returns true if some `<form>` contains an `<input type="password">`
///
/// The type attribute is compared case-insensitively, ignoring surrounding
/// whitespace.
pub fn has_login_form(document: &Html) -> bool {
    let (Ok(form_selector), Ok(input_selector)) =
        (Selector::parse("form"), Selector::parse("input[type]"))
    else {
        return false;
    };

    document.select(&form_selector).any(|form| {
        form.select(&input_selector).any(|input| {
            input
                .value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("password"))
        })
    })
}
