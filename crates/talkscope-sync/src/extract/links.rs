use reqwest::Url;

/// YouTube video id from a `youtu.be/{id}` or `youtube.com/...?v={id}` URL.
pub fn parse_video_id(video_url: &str) -> Option<String> {
    let url = Url::parse(video_url.trim()).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.trim_start_matches("www.");

    let id = if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_string)
    } else if host.ends_with("youtube.com") {
        url.query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.trim().to_string())
    } else {
        None
    };
    id.filter(|id| !id.is_empty())
}

/// Resolve `href` against the meeting's directory, `{page_base}/{slug}/`.
///
/// Unparsable links are returned unchanged.
pub fn abs_url(page_base: &str, slug: &str, href: &str) -> String {
    let href = href.trim();
    let base = format!("{}/{}/", page_base.trim_end_matches('/'), slug);
    Url::parse(&base)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

/// Which kind of resource a link label points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Video,
    Slides,
}

/// Kinds named by a link label; a label like "Slides & Video" names both.
pub fn link_kinds(label: &str) -> Vec<LinkKind> {
    let lower = label.to_lowercase();
    let mut kinds = Vec::new();
    if lower.contains("video") {
        kinds.push(LinkKind::Video);
    }
    if lower.contains("slide") {
        kinds.push(LinkKind::Slides);
    }
    kinds
}
