//! Template artifacts (`.jinja`), rendered with minijinja.
//!
//! # Responsibilities
//! - Bind `page`, `req` and `session` for the template
//! - Resolve `{% include %}`/`{% extends %}` against the layer directory
//! - Replace render failures with a visible inline fragment
//!
//! # Design Decisions
//! - A fresh environment per render; nothing is cached between requests
//! - Output is HTML-escaped by default, `|safe` opts out

use minijinja::{context, AutoEscape, Environment};

use crate::cascade::page::PageState;
use crate::error::CascadeError;
use crate::handlers::HandlerContext;
use crate::observability::metrics;
use crate::routing::Artifact;

/// Render the artifact, recovering template errors into a fragment.
pub async fn render(
    artifact: &Artifact,
    cx: &HandlerContext<'_>,
    page: &PageState,
) -> Result<String, CascadeError> {
    let source = tokio::fs::read_to_string(&artifact.path)
        .await
        .map_err(|e| CascadeError::read(&artifact.path, e))?;

    let mut env = Environment::new();
    env.set_loader(minijinja::path_loader(&cx.layer.path));
    env.set_auto_escape_callback(|_| AutoEscape::Html);

    let rendered = env.render_str(
        &source,
        context! {
            page => page,
            req => cx.request,
            session => cx.session,
        },
    );

    match rendered {
        Ok(html) => Ok(html),
        Err(e) => {
            tracing::warn!(
                file = %artifact.path.display(),
                error = %e,
                "Template render failed"
            );
            metrics::record_render_error();
            Ok(error_fragment(&e.to_string()))
        }
    }
}

/// Visible stand-in for a template that failed to render.
pub fn error_fragment(message: &str) -> String {
    let mut escaped = String::with_capacity(message.len());
    for c in message.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    format!("<pre class=\"render-error\">{escaped}</pre>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::context::{RequestContext, SessionState};
    use crate::config::ScriptConfig;
    use crate::routing::{ArtifactKind, Layer};
    use serde_json::json;

    struct Fixture {
        dir: tempfile::TempDir,
        layer: Layer,
        request: RequestContext,
        session: SessionState,
        scripts: ScriptConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let layer = Layer {
                order: 1,
                name: "1".into(),
                path: dir.path().to_path_buf(),
            };
            Self {
                dir,
                layer,
                request: RequestContext::new("GET", "/hello"),
                session: SessionState::default(),
                scripts: ScriptConfig::default(),
            }
        }

        fn write(&self, name: &str, text: &str) -> Artifact {
            let path = self.dir.path().join(name);
            std::fs::write(&path, text).unwrap();
            Artifact {
                kind: ArtifactKind::Template,
                path,
                request_path: "/hello".into(),
            }
        }

        fn cx(&self) -> HandlerContext<'_> {
            HandlerContext {
                layer: &self.layer,
                request: &self.request,
                session: &self.session,
                scripts: &self.scripts,
            }
        }
    }

    #[tokio::test]
    async fn test_bindings() {
        let fx = Fixture::new();
        let mut page = PageState::default();
        page.merge_data(json!({"title": "Hi"}).as_object().unwrap().clone());
        page.append_html("<p>body</p>");

        let artifact = fx.write(
            "hello.jinja",
            "{{ page.html|safe }}<h1>{{ page.data.title }}</h1>{{ req.method }}{{ session.user }}",
        );
        let html = render(&artifact, &fx.cx(), &page).await.unwrap();
        assert_eq!(html, "<p>body</p><h1>Hi</h1>GET");
    }

    #[tokio::test]
    async fn test_escapes_by_default() {
        let fx = Fixture::new();
        let mut page = PageState::default();
        page.fields.insert("name".into(), json!("<b>x & y"));

        let artifact = fx.write("hello.jinja", "{{ page.name }}");
        let html = render(&artifact, &fx.cx(), &page).await.unwrap();
        assert_eq!(html, "&lt;b&gt;x &amp; y");
    }

    #[tokio::test]
    async fn test_includes_resolve_in_layer() {
        let fx = Fixture::new();
        std::fs::create_dir(fx.dir.path().join("partials")).unwrap();
        std::fs::write(fx.dir.path().join("partials/nav.html"), "<nav>{{ req.method }}</nav>").unwrap();

        let artifact = fx.write("hello.jinja", "{% include 'partials/nav.html' %}<main></main>");
        let html = render(&artifact, &fx.cx(), &PageState::default()).await.unwrap();
        assert_eq!(html, "<nav>GET</nav><main></main>");
    }

    #[tokio::test]
    async fn test_render_error_becomes_fragment() {
        let fx = Fixture::new();
        let artifact = fx.write("hello.jinja", "before {% include 'missing.html' %} after");
        let html = render(&artifact, &fx.cx(), &PageState::default()).await.unwrap();
        assert!(html.starts_with("<pre class=\"render-error\">"), "got {html}");
        assert!(html.ends_with("</pre>"));

        let artifact = fx.write("hello.jinja", "{% if %}");
        let html = render(&artifact, &fx.cx(), &PageState::default()).await.unwrap();
        assert!(html.contains("render-error"));
    }

    #[test]
    fn test_error_fragment_escapes() {
        assert_eq!(
            error_fragment("unexpected `<` & more"),
            "<pre class=\"render-error\">unexpected `&lt;` &amp; more</pre>"
        );
    }
}
