use std::path::PathBuf;

/// Fixed parameters for one site build.
///
/// Everything follows convention: sources live in `content/`, the page
/// template is `templates.html`, output goes to `output/`. No file or
/// environment configuration is read anywhere.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Directory holding the markdown documents and the optional `media/`
    /// subdirectory.
    pub content_dir: PathBuf,
    /// Directory the page and the resized images are written to.
    pub output_dir: PathBuf,
    /// Path of the page template file.
    pub template_file: PathBuf,
    /// Title handed to the template.
    pub title: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            output_dir: PathBuf::from("output"),
            template_file: PathBuf::from("templates.html"),
            title: "Documentation".to_string(),
        }
    }
}
