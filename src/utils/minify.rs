//! HTML post-processing for production runs.
//!
//! Output is minified only when the run is not in debug mode, the
//! `[build] minify` toggle is on and the output is an html file.

use crate::config::SiteConfig;
use std::{borrow::Cow, path::Path};

/// Minify rendered markup for `output` if the current run asks for it.
///
/// Returns `Cow::Borrowed` if minify is disabled, `Cow::Owned` if minified.
pub fn minify<'a>(content: &'a [u8], output: &Path, config: &SiteConfig) -> Cow<'a, [u8]> {
    if should_minify(output, config) {
        Cow::Owned(minify_html_inner(content))
    } else {
        Cow::Borrowed(content)
    }
}

fn should_minify(output: &Path, config: &SiteConfig) -> bool {
    !config.debug
        && config.build.minify
        && output
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

/// Collapse whitespace and drop comments; closing tags and `<html>`/`<head>`
/// openers are kept.
fn minify_html_inner(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = false;
    cfg.remove_processing_instructions = true;
    minify_html::minify(html, &cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(debug: bool, minify: bool) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.debug = debug;
        config.build.minify = minify;
        config
    }

    const PAGE: &[u8] =
        b"<html>\n  <head>\n  </head>\n  <body>\n    <!-- note -->\n    <p>Hello World</p>\n  </body>\n</html>";

    #[test]
    fn test_minify_production_html() {
        let result = minify(PAGE, Path::new("public/index.html"), &config(false, true));
        let result = String::from_utf8_lossy(&result);

        assert!(!result.contains("\n  "));
        assert!(!result.contains("note"));
        assert!(result.contains("<p>Hello World</p>"));
    }

    #[test]
    fn test_debug_leaves_output_untouched() {
        let result = minify(PAGE, Path::new("public/index.html"), &config(true, true));
        assert_eq!(&*result, PAGE);
    }

    #[test]
    fn test_toggle_off_leaves_output_untouched() {
        let result = minify(PAGE, Path::new("public/index.html"), &config(false, false));
        assert_eq!(&*result, PAGE);
    }

    #[test]
    fn test_non_html_output_untouched() {
        let feed = b"<rss>\n  <channel/>\n</rss>";
        let result = minify(feed, Path::new("public/feed.xml"), &config(false, true));
        assert_eq!(&*result, feed);
    }

    #[test]
    fn test_minified_keeps_text_content() {
        fn text(markup: &[u8]) -> Vec<String> {
            let mut inside = false;
            let mut out = String::new();
            for c in String::from_utf8_lossy(markup).chars() {
                match c {
                    '<' => inside = true,
                    '>' => {
                        inside = false;
                        out.push(' ');
                    }
                    _ if !inside => out.push(c),
                    _ => {}
                }
            }
            out.split_whitespace().map(str::to_owned).collect()
        }

        let production = minify(PAGE, Path::new("a.html"), &config(false, true));
        assert_eq!(text(&production), text(PAGE));
    }
}
