//! Host-supplied mapping from link targets to site URLs.

use serde::Serialize;

/// The document a link or rich-text hyperlink points at.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LinkTarget {
    /// Remote document id.
    pub id: String,
    /// Document UID, if any.
    pub uid: Option<String>,
    /// Custom-type id.
    pub custom_type: Option<String>,
    /// Language code.
    pub lang: Option<String>,
    /// Document tags.
    pub tags: Vec<String>,
    /// Document slug.
    pub slug: Option<String>,
    /// Whether the CMS reports the target as deleted or unpublished.
    pub is_broken: bool,
}

/// Resolves a link target to a URL on the host site.
///
/// Implemented for any `Fn(&LinkTarget) -> Option<String>`.
///
/// # Examples
/// ```
/// use prismic_source::domain::ports::{LinkResolver, LinkTarget};
///
/// let resolver = |target: &LinkTarget| target.uid.as_ref().map(|uid| format!("/{uid}"));
/// let target = LinkTarget { id: "X".into(), uid: Some("about".into()), ..LinkTarget::default() };
/// assert_eq!(resolver.resolve(&target).as_deref(), Some("/about"));
/// ```
pub trait LinkResolver: Send + Sync {
    /// URL for `target`, or `None` when the host has no route for it.
    fn resolve(&self, target: &LinkTarget) -> Option<String>;
}

impl<F> LinkResolver for F
where
    F: Fn(&LinkTarget) -> Option<String> + Send + Sync,
{
    fn resolve(&self, target: &LinkTarget) -> Option<String> {
        self(target)
    }
}
