//! Source configuration loaded via OrthoConfig.
//!
//! [`SourceSettings`] is the layered, serialisable surface (environment
//! variables prefixed `PRISMIC_`, configuration files, CLI flags).
//! [`SourceOptions`] is the validated form the domain consumes; it also
//! carries the host's link resolver, which cannot come from configuration.

use std::fmt;
use std::sync::Arc;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::ports::{LinkResolver, QueryOptions};
use crate::domain::{Error, TypeNaming};

/// Cache key segment used when no release is configured.
const MASTER_REF: &str = "master";

/// Configuration values for one content source.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PRISMIC")]
pub struct SourceSettings {
    /// Repository name, e.g. `my-blog` for `my-blog.prismic.io`.
    pub repository_name: Option<String>,
    /// API access token for private repositories.
    pub access_token: Option<String>,
    /// Release to read from instead of the master ref.
    pub release_id: Option<String>,
    /// Comma-separated linked-document fields to denormalise.
    pub fetch_links: Option<String>,
    /// Language filter; all languages when unset.
    pub lang: Option<String>,
    /// Shared webhook secret. Unset disables the secret check.
    pub webhook_secret: Option<String>,
    /// Whether release changes in webhooks are honoured (draft builds).
    #[ortho_config(default = false)]
    pub preview: bool,
    /// Optional prefix inserted into every generated type name.
    pub type_prefix: Option<String>,
}

impl SourceSettings {
    /// Validate the settings into [`SourceOptions`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the repository name is missing,
    /// blank, or contains characters that cannot form a host label.
    pub fn into_options(self) -> Result<SourceOptions, Error> {
        let repository_name = non_blank(self.repository_name)
            .ok_or_else(|| Error::configuration("repository_name must be set"))?;
        if !repository_name
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || character == '-')
        {
            return Err(Error::configuration(format!(
                "repository_name {repository_name:?} is not a valid repository name"
            )));
        }
        let fetch_links = self
            .fetch_links
            .as_deref()
            .map(|links| {
                links
                    .split(',')
                    .map(str::trim)
                    .filter(|link| !link.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(SourceOptions {
            repository_name,
            access_token: non_blank(self.access_token),
            release_id: non_blank(self.release_id),
            fetch_links,
            lang: non_blank(self.lang),
            webhook_secret: non_blank(self.webhook_secret),
            preview: self.preview,
            type_prefix: non_blank(self.type_prefix),
            link_resolver: None,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Validated options for one content source.
#[derive(Clone)]
pub struct SourceOptions {
    /// Repository name.
    pub repository_name: String,
    /// API access token.
    pub access_token: Option<String>,
    /// Configured release.
    pub release_id: Option<String>,
    /// Linked-document fields to denormalise.
    pub fetch_links: Vec<String>,
    /// Language filter.
    pub lang: Option<String>,
    /// Shared webhook secret.
    pub webhook_secret: Option<String>,
    /// Whether release changes are honoured.
    pub preview: bool,
    /// Type name prefix.
    pub type_prefix: Option<String>,
    /// Maps link targets to site URLs.
    pub link_resolver: Option<Arc<dyn LinkResolver>>,
}

impl SourceOptions {
    /// Options for `repository_name` with everything else unset.
    pub fn new(repository_name: impl Into<String>) -> Self {
        Self {
            repository_name: repository_name.into(),
            access_token: None,
            release_id: None,
            fetch_links: Vec::new(),
            lang: None,
            webhook_secret: None,
            preview: false,
            type_prefix: None,
            link_resolver: None,
        }
    }

    /// Attach the host's link resolver.
    #[must_use]
    pub fn with_link_resolver(mut self, resolver: impl LinkResolver + 'static) -> Self {
        self.link_resolver = Some(Arc::new(resolver));
        self
    }

    /// The release whose webhook changes apply: the configured release, and
    /// only in preview mode.
    pub fn active_release(&self) -> Option<&str> {
        self.release_id.as_deref().filter(|_| self.preview)
    }

    /// Base query options for the CMS client.
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            lang: self.lang.clone(),
            fetch_links: self.fetch_links.clone(),
            release_id: self.release_id.clone(),
            ..QueryOptions::default()
        }
    }

    /// Key under which the type path registry is cached.
    ///
    /// # Examples
    /// ```
    /// use prismic_source::SourceOptions;
    ///
    /// let mut options = SourceOptions::new("blog");
    /// assert_eq!(options.registry_cache_key(), "blog:master");
    /// options.release_id = Some("R1".into());
    /// assert_eq!(options.registry_cache_key(), "blog:R1");
    /// ```
    pub fn registry_cache_key(&self) -> String {
        format!(
            "{}:{}",
            self.repository_name,
            self.release_id.as_deref().unwrap_or(MASTER_REF)
        )
    }

    /// Type naming for this source.
    pub fn type_naming(&self) -> TypeNaming {
        TypeNaming::new(self.type_prefix.as_deref())
    }
}

impl fmt::Debug for SourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceOptions")
            .field("repository_name", &self.repository_name)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("release_id", &self.release_id)
            .field("fetch_links", &self.fetch_links)
            .field("lang", &self.lang)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .field("preview", &self.preview)
            .field("type_prefix", &self.type_prefix)
            .field("link_resolver", &self.link_resolver.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for source configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    use crate::domain::ErrorCode;

    const VARIABLES: [&str; 8] = [
        "PRISMIC_REPOSITORY_NAME",
        "PRISMIC_ACCESS_TOKEN",
        "PRISMIC_RELEASE_ID",
        "PRISMIC_FETCH_LINKS",
        "PRISMIC_LANG",
        "PRISMIC_WEBHOOK_SECRET",
        "PRISMIC_PREVIEW",
        "PRISMIC_TYPE_PREFIX",
    ];

    fn load_from_empty_args() -> SourceSettings {
        SourceSettings::load_from_iter([OsString::from("prismic-source")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(VARIABLES.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert!(!settings.preview);
        assert!(settings.repository_name.is_none());
        let error = settings.into_options().expect_err("repository name required");
        assert_eq!(error.code(), ErrorCode::Configuration);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("PRISMIC_REPOSITORY_NAME", Some("my-blog".to_owned())),
            ("PRISMIC_ACCESS_TOKEN", Some("token".to_owned())),
            ("PRISMIC_RELEASE_ID", Some("R1".to_owned())),
            ("PRISMIC_FETCH_LINKS", Some("author.name, category.title,".to_owned())),
            ("PRISMIC_LANG", Some("en-gb".to_owned())),
            ("PRISMIC_WEBHOOK_SECRET", Some("s3cret".to_owned())),
            ("PRISMIC_PREVIEW", Some("true".to_owned())),
            ("PRISMIC_TYPE_PREFIX", None),
        ]);

        let options = load_from_empty_args().into_options().expect("valid options");
        assert_eq!(options.repository_name, "my-blog");
        assert_eq!(options.fetch_links, vec!["author.name", "category.title"]);
        assert_eq!(options.active_release(), Some("R1"));
        assert_eq!(options.query_options().lang.as_deref(), Some("en-gb"));
        assert_eq!(options.registry_cache_key(), "my-blog:R1");
    }

    #[rstest]
    #[case(Some("R1"), false, None)]
    #[case(None, true, None)]
    #[case(Some("R1"), true, Some("R1"))]
    fn release_applies_only_in_preview(
        #[case] release_id: Option<&str>,
        #[case] preview: bool,
        #[case] expected: Option<&str>,
    ) {
        let mut options = SourceOptions::new("blog");
        options.release_id = release_id.map(str::to_owned);
        options.preview = preview;
        assert_eq!(options.active_release(), expected);
    }

    #[rstest]
    #[case("my blog")]
    #[case("   ")]
    #[case("blog.io")]
    fn rejects_unusable_repository_names(#[case] name: &str) {
        let settings = SourceSettings {
            repository_name: Some(name.to_owned()),
            ..SourceSettings::default()
        };
        assert!(settings.into_options().is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut options = SourceOptions::new("blog");
        options.access_token = Some("very-secret-token".to_owned());
        let rendered = format!("{options:?}");
        assert!(!rendered.contains("very-secret-token"));
    }
}
