//! Markdown artifacts (`.md`).
//!
//! Front matter is a YAML block opened by a `---` line and closed by `---`
//! or `...`. Its mapping is deep-merged into `page.data`; the body is
//! rendered with pulldown-cmark and appended to `page.html`.

use pulldown_cmark::{html, Options, Parser};
use serde_json::Value;

use crate::cascade::page::PageState;
use crate::error::CascadeError;
use crate::handlers::Contribution;
use crate::routing::Artifact;

/// Split `text` into an optional front matter block and the body.
///
/// Without a closed block the whole text is body.
pub fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');

    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return (None, text),
    }

    let start = text.find('\n').map_or(text.len(), |i| i + 1);
    let mut offset = start;
    for line in lines {
        let fence = line.trim_end();
        if fence == "---" || fence == "..." {
            return (Some(&text[start..offset]), &text[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, text)
}

/// Render a markdown body to HTML.
pub fn render_markdown(body: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_SMART_PUNCTUATION;
    let mut out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(body, options));
    out
}

/// Merge the artifact's front matter and append its rendered body.
pub async fn apply(artifact: &Artifact, page: &mut PageState) -> Result<Contribution, CascadeError> {
    let text = tokio::fs::read_to_string(&artifact.path)
        .await
        .map_err(|e| CascadeError::read(&artifact.path, e))?;

    let (front_matter, body) = split_front_matter(&text);
    if let Some(yaml) = front_matter {
        match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Object(fields)) => page.merge_data(fields),
            Ok(Value::Null) => {}
            Ok(other) => tracing::warn!(
                file = %artifact.path.display(),
                found = %other,
                "Front matter is not a mapping, ignoring it"
            ),
            Err(e) => tracing::warn!(
                file = %artifact.path.display(),
                error = %e,
                "Malformed front matter, ignoring it"
            ),
        }
    }

    page.append_html(&render_markdown(body));
    Ok(Contribution::PageUpdated)
}
