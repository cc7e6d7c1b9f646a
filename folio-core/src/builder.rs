use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::SiteConfig;
use crate::markdown;
use crate::media::{self, MediaError};
use crate::site;
use crate::template::{PageTemplate, TemplateError};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// Output-directory setup, document discovery, or a document read.
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl BuildError {
    fn io(path: &Path, source: io::Error) -> Self {
        BuildError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Run the build pipeline and return the path of the written page.
///
/// Steps, in order: create the output directory, resize media, load the
/// template, discover documents sorted by filename, convert each one,
/// then render and persist. The first failure aborts the run; output
/// already written by earlier steps stays behind.
pub fn build_site(config: &SiteConfig) -> Result<PathBuf, BuildError> {
    debug!(
        "config: content: {}, output: {}, template: {}, title: {}",
        config.content_dir.display(),
        config.output_dir.display(),
        config.template_file.display(),
        config.title,
    );

    std::fs::create_dir_all(&config.output_dir)
        .map_err(|err| BuildError::io(&config.output_dir, err))?;
    info!("output directory: {}", config.output_dir.display());

    media::process_media(&config.content_dir, &config.output_dir)?;

    let template = PageTemplate::load(&config.template_file)?;

    let documents = site::discover_documents(&config.content_dir)
        .map_err(|err| BuildError::io(&config.content_dir, err))?;
    info!("found {} markdown files", documents.len());
    for document in &documents {
        debug!("  - {}", document.display());
    }

    let mut sections = Vec::with_capacity(documents.len());
    for document in &documents {
        let section =
            markdown::convert_document(document).map_err(|err| BuildError::io(document, err))?;
        sections.push(section);
    }

    let output_file = template.render_to_file(&config.title, &sections, &config.output_dir)?;
    info!("site generated: {}", output_file.display());

    Ok(output_file)
}
