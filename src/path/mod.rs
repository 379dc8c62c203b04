use crate::model::Breadcrumb;

/// Document suffix recognized by the router. Anything else that does not end
/// in `/` is still fetched as a note; the suffix only matters for breadcrumb
/// leaf detection and link delegation.
pub(crate) const NOTE_EXT: &str = ".md";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ResourceKind {
    Note,
    Notebook,
}

/// Canonicalize a path to exactly one level of percent-encoding.
///
/// Incoming paths arrive either already encoded (clicked links, the address
/// bar) or raw (user input). Each segment is decoded once and re-encoded
/// once, so `normalize(normalize(p)) == normalize(p)` and double encoding
/// never reaches the wire. Malformed `%` sequences pass through the decode
/// step unchanged and get their `%` escaped on the way back out, which keeps
/// the round trip stable for inputs like `100%`.
pub(crate) fn normalize(raw: &str) -> String {
    raw.split('/')
        .map(|segment| {
            let decoded = urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            urlencoding::encode(&decoded).into_owned()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Trailing separator (or the empty root path) means notebook, everything
/// else means note. Pure and total; no fetch happens here.
pub(crate) fn classify(path: &str) -> ResourceKind {
    if path.is_empty() || path.ends_with('/') {
        ResourceKind::Notebook
    } else {
        ResourceKind::Note
    }
}

pub(crate) fn endpoint(path: &str) -> (ResourceKind, String) {
    match classify(path) {
        ResourceKind::Notebook => (ResourceKind::Notebook, format!("/nb/{path}")),
        ResourceKind::Note => (ResourceKind::Note, format!("/n/{path}")),
    }
}

/// Breadcrumb trail for a path: one entry per segment with a cumulative
/// absolute href. A segment ending in the document suffix is a leaf and gets
/// no trailing separator. Labels are shown decoded; hrefs keep the encoded
/// form.
pub(crate) fn breadcrumbs(path: &str) -> Vec<Breadcrumb> {
    let mut out = Vec::new();
    let mut url = String::from("/");

    for part in path.trim_matches('/').split('/') {
        if part.is_empty() {
            continue;
        }

        url.push_str(part);
        if !part.ends_with(NOTE_EXT) {
            url.push('/');
        }

        let label = urlencoding::decode(part)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| part.to_string());

        out.push(Breadcrumb {
            label,
            href: url.clone(),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "",
            "a/b/",
            "notes/today.md",
            "a b.md",
            "a%20b.md",
            "100%",
            "caf\u{e9}/g\u{e2}teau.md",
            "a%2Fb",
            "already%25encoded.md",
        ];
        for s in inputs {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_normalize_encodes_raw_input_once() {
        assert_eq!(normalize("a b.md"), "a%20b.md");
        assert_eq!(normalize("a%20b.md"), "a%20b.md");
    }

    #[test]
    fn test_normalize_preserves_separators_and_trailing_slash() {
        assert_eq!(normalize("one two/three/"), "one%20two/three/");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(""), ResourceKind::Notebook);
        assert_eq!(classify("a/b/"), ResourceKind::Notebook);
        assert_eq!(classify("a/b.md"), ResourceKind::Note);
        assert_eq!(classify("a/b"), ResourceKind::Note);
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(endpoint(""), (ResourceKind::Notebook, "/nb/".to_string()));
        assert_eq!(
            endpoint("a/b/"),
            (ResourceKind::Notebook, "/nb/a/b/".to_string())
        );
        assert_eq!(
            endpoint("a/b.md"),
            (ResourceKind::Note, "/n/a/b.md".to_string())
        );
    }

    #[test]
    fn test_breadcrumbs_cumulative_hrefs() {
        let trail = breadcrumbs("a/b/c.md");
        let hrefs: Vec<&str> = trail.iter().map(|b| b.href.as_str()).collect();
        assert_eq!(hrefs, vec!["/a/", "/a/b/", "/a/b/c.md"]);

        let labels: Vec<&str> = trail.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "c.md"]);
    }

    #[test]
    fn test_breadcrumbs_decode_labels_keep_hrefs_encoded() {
        let trail = breadcrumbs("daily%20log/2015.md");
        assert_eq!(trail[0].label, "daily log");
        assert_eq!(trail[0].href, "/daily%20log/");
        assert_eq!(trail[1].href, "/daily%20log/2015.md");
    }

    #[test]
    fn test_breadcrumbs_root_is_empty() {
        assert!(breadcrumbs("").is_empty());
    }

    #[test]
    fn test_breadcrumbs_notebook_path_all_branches() {
        let trail = breadcrumbs("a/b/");
        let hrefs: Vec<&str> = trail.iter().map(|b| b.href.as_str()).collect();
        assert_eq!(hrefs, vec!["/a/", "/a/b/"]);
    }
}
