//! URL utilities.
//!
//! [URL Standard](https://url.spec.whatwg.org/)

use ::url::Url;

/// [URL Standard § 4.3](https://url.spec.whatwg.org/#absolute-url-string)
///
/// "An absolute-URL string must be one of the following: a URL-scheme string
/// that is an ASCII case-insensitive match for a special scheme and not an
/// ASCII case-insensitive match for "file", followed by U+003A (:) and a
/// scheme-relative-special-URL string..."
///
/// Only URLs that carry both a scheme and a host qualify; `data:` and
/// relative URLs do not.
#[must_use]
pub fn is_absolute_url(input: &str) -> bool {
    Url::parse(input).is_ok_and(|url| url.has_host())
}

/// [URL Standard § 4.7 Origin](https://url.spec.whatwg.org/#concept-url-origin)
///
/// The ASCII serialization of `input`'s origin, e.g. `https://example.com`
/// for `https://example.com/amp/`. Returns `None` for relative URLs and
/// opaque origins.
#[must_use]
pub fn origin(input: &str) -> Option<String> {
    let url = Url::parse(input).ok()?;
    if !url.has_host() {
        return None;
    }
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

/// Whether `input` is a URL that can be fetched, i.e. not empty and not a
/// `data:` URL.
#[must_use]
pub fn is_valid_non_data_url(input: &str) -> bool {
    let trimmed = input.trim();
    !trimmed.is_empty()
        && !trimmed
            .get(..5)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}
