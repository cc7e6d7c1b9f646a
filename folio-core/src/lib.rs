pub mod builder;
pub mod config;
pub mod markdown;
pub mod media;
pub mod site;
pub mod template;

// Re-export main types
pub use builder::{BuildError, build_site};
pub use config::SiteConfig;
pub use markdown::convert_document;
pub use media::MediaError;
pub use site::Section;
pub use template::{PageTemplate, TemplateError};
