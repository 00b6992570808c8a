use url::Url;

/// Query parameters that only carry tracking or affiliate data
const TRACKING_PARAMS: &[&str] = &["ref", "affiliate", "tag", "fbclid", "gclid"];
const TRACKING_PREFIXES: &[&str] = &["utm_"];
const REJECTED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

fn is_tracking_param(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    TRACKING_PARAMS.contains(&name.as_str())
        || TRACKING_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Turns a scraped link into a clean absolute product URL.
///
/// Relative links are resolved against `base_url`; fragment-only links,
/// script pseudo-links and non-http schemes yield `None`.
pub fn normalize_candidate_url(raw: &str, base_url: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }

    let lowered = raw.to_ascii_lowercase();
    if REJECTED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) || lowered.contains("void(0)") {
        return None;
    }

    let base = Url::parse(base_url).ok()?;
    let mut url = base.join(raw).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| !is_tracking_param(name))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url.set_fragment(None);

    Some(url.to_string())
}

/// True when `url` points at `domain` or one of its subdomains
pub fn is_on_domain(url: &str, domain: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let domain = domain.trim_start_matches("www.");
    parsed
        .host_str()
        .map(|host| {
            let host = host.trim_start_matches("www.");
            host == domain || host.ends_with(&format!(".{}", domain))
        })
        .unwrap_or(false)
}
