//! Manual tag creation for a project prefix.

use crate::backend::TagBackend;
use crate::config::NyronConfig;
use crate::domain::tag::build_tag;
use crate::error::Result;
use crate::resolver::TagResolver;
use crate::ui;

/// Create and push `<prefix><version>`.
///
/// An existing tag is skipped with a warning instead of failing — reruns of
/// the same command are harmless. A push failure is downgraded: the tag
/// already exists locally and can be pushed by hand.
pub fn tag(
    config: &NyronConfig,
    backend: &dyn TagBackend,
    prefix: &str,
    version: &str,
) -> Result<Option<String>> {
    let resolver = TagResolver::new(backend);
    let tag_name = build_tag(prefix, version)?;

    if resolver.tag_exists(&tag_name)? {
        ui::display_warning(&format!(
            "Tag \"{}\" already exists. Skipping creation.",
            tag_name
        ));
        return Ok(None);
    }

    ui::display_status(&format!("Creating tag {}...", tag_name));
    resolver.create_tag(prefix, version)?;

    match resolver.push_tag(&tag_name) {
        Ok(()) => ui::display_success(&format!("Tag pushed: {}", tag_name)),
        Err(e) => ui::display_warning(&format!(
            "Tag created locally but failed to push: {}. Check remote permissions.",
            e
        )),
    }

    match config.project_by_prefix(prefix) {
        Some((name, _)) => ui::display_status(&format!("Recorded tag under project: {}", name)),
        None => ui::display_warning(&format!(
            "No project with prefix {} found in config.",
            prefix
        )),
    }

    Ok(Some(tag_name))
}
