//! Cross-file aggregation into the site context.
//!
//! Collection happens between the read phase and the render phase of a
//! pages run: every post is collected, the collector is finalized, and only
//! then is anything rendered against the resulting [`SiteContext`].

use crate::{
    compiler::meta::{ContentFile, ContentKind, PageMeta, join_url},
    config::SiteConfig,
};
use serde::Serialize;
use std::{cmp::Reverse, sync::Arc};

/// Aggregates exposed to templates as `site.posts`, `site.tags` and
/// `site.categories`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteContext {
    /// Newest first; posts without a date come last.
    pub posts: Vec<Arc<PageMeta>>,
    /// First-seen order, no duplicates.
    pub tags: Vec<String>,
    /// First-seen order, no duplicates.
    pub categories: Vec<String>,
}

/// Accumulates a [`SiteContext`] over one pages run.
pub struct ContentCollector<'a> {
    config: &'a SiteConfig,
    site: SiteContext,
}

impl<'a> ContentCollector<'a> {
    pub fn new(config: &'a SiteConfig) -> Self {
        Self {
            config,
            site: SiteContext::default(),
        }
    }

    /// Derive `url` and the default category, then record the post.
    pub fn collect(&mut self, file: &mut ContentFile) {
        let build = &self.config.build;
        let url = join_url(&build.url_prefix, &file.stem_path(&build.posts_dir()));

        let meta = Arc::make_mut(&mut file.meta);
        meta.url = url;
        let category = meta
            .category
            .get_or_insert_with(|| build.default_category.clone());

        push_unique(&mut self.site.categories, category);
        for tag in &meta.tags {
            push_unique(&mut self.site.tags, tag);
        }

        self.site.posts.push(Arc::clone(&file.meta));
    }

    /// Order posts newest first. Ties keep collection order.
    pub fn finalize(mut self) -> SiteContext {
        self.site
            .posts
            .sort_by_key(|post| (post.timestamp.is_none(), Reverse(post.timestamp)));
        self.site
    }
}

/// Assign a page's url (`/` + path relative to the content root).
pub fn assign_page_url(file: &mut ContentFile, config: &SiteConfig) {
    debug_assert_eq!(file.kind, ContentKind::Page);
    let url = join_url("", &file.stem_path(&config.build.content));
    Arc::make_mut(&mut file.meta).url = url;
}

fn push_unique(set: &mut Vec<String>, value: &str) {
    if !set.iter().any(|v| v == value) {
        set.push(value.to_owned());
    }
}
