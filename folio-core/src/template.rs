use std::io;
use std::path::{Path, PathBuf};

use tera::{Context, Tera};
use thiserror::Error;
use tracing::{debug, info};

use crate::site::Section;

const TEMPLATE_NAME: &str = "page";

#[derive(Debug, Error)]
pub enum TemplateError {
    /// Malformed template syntax, or a failure while rendering.
    #[error("template error: {0}")]
    Tera(#[from] tera::Error),
    /// The template file could not be read, or the page not written.
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// A loaded page template.
///
/// The source is parsed eagerly at load, so syntax problems surface
/// before any document work happens. Rendering receives exactly two
/// bindings, `title` and `sections`, with autoescaping off: section
/// content is already markup.
#[derive(Debug)]
pub struct PageTemplate {
    tera: Tera,
}

impl PageTemplate {
    /// Read and parse the template at `path`.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        info!("reading template: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("template size: {} bytes", content.len());

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(TEMPLATE_NAME, &content)?;

        Ok(Self { tera })
    }

    /// Render the full page.
    pub fn render(&self, title: &str, sections: &[Section]) -> Result<String, TemplateError> {
        info!("rendering page: title: {title}, sections: {}", sections.len());
        let mut context = Context::new();
        context.insert("title", title);
        context.insert("sections", sections);

        let html = self.tera.render(TEMPLATE_NAME, &context)?;
        debug!("rendered page size: {} bytes", html.len());
        Ok(html)
    }

    /// Render and write `<output_dir>/index.html`, replacing any previous
    /// run's page. Returns the path written.
    pub fn render_to_file(
        &self,
        title: &str,
        sections: &[Section],
        output_dir: &Path,
    ) -> Result<PathBuf, TemplateError> {
        let html = self.render(title, sections)?;

        let output_file = output_dir.join("index.html");
        std::fs::write(&output_file, html).map_err(|source| TemplateError::Io {
            path: output_file.clone(),
            source,
        })?;
        info!("page written: {}", output_file.display());

        Ok(output_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<h1>{{ title }}</h1>\n\
        {% for section in sections %}<section id=\"{{ section.id }}\">\
        <h2>{{ section.title }}</h2>{{ section.content }}</section>{% endfor %}";

    fn section(id: &str, title: &str, content: &str) -> Section {
        Section {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    fn load_template(source: &str) -> (tempfile::TempDir, PageTemplate) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("templates.html");
        std::fs::write(&path, source).unwrap();
        let template = PageTemplate::load(&path).unwrap();
        (tmp, template)
    }

    #[test]
    fn renders_title_and_sections_in_order() {
        let (_tmp, template) = load_template(PAGE);
        let sections = vec![
            section("first", "First", "<p>one</p>"),
            section("second", "Second", "<p>two</p>"),
        ];

        let html = template.render("Handbook", &sections).unwrap();
        assert!(html.contains("<h1>Handbook</h1>"));

        let first = html.find(r#"id="first""#).expect("first section missing");
        let second = html.find(r#"id="second""#).expect("second section missing");
        assert!(first < second);
    }

    #[test]
    fn section_content_is_not_escaped() {
        let (_tmp, template) = load_template(PAGE);
        let sections = vec![section("s", "S", "<em>markup</em>")];

        let html = template.render("T", &sections).unwrap();
        assert!(html.contains("<em>markup</em>"), "got: {html}");
    }

    #[test]
    fn missing_template_file_is_an_io_error() {
        let err = PageTemplate::load(Path::new("/no/such/templates.html")).unwrap_err();
        assert!(matches!(err, TemplateError::Io { .. }), "got: {err}");
    }

    #[test]
    fn malformed_template_fails_at_load() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("templates.html");
        std::fs::write(&path, "{% for section in sections %}never closed").unwrap();

        let err = PageTemplate::load(&path).unwrap_err();
        assert!(matches!(err, TemplateError::Tera(_)), "got: {err}");
    }

    #[test]
    fn render_to_file_overwrites_the_previous_page() {
        let (tmp, template) = load_template(PAGE);
        std::fs::write(tmp.path().join("index.html"), "stale").unwrap();

        let path = template.render_to_file("T", &[], tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join("index.html"));

        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.contains("<h1>T</h1>"));
        assert!(!body.contains("stale"));
    }
}
