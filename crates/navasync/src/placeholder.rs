//! Loading indicator and bootstrap script templates
//!
//! Built once per batch from the configuration and shared read-only by
//! every worker.

use dom::{Document, NodeId};

use crate::config::NavAsyncConfig;
use crate::locator::NavLocator;

pub const SPINNER_ID: &str = "loading-spinner";
pub const SCRIPT_ID: &str = "nav-async-loader";

const SPINNER_STYLE: &str = "display:flex;justify-content:center;align-items:center;height:100px;";
const SPINNER_IMG_STYLE: &str = "width:50px;";

/// Root-relative URL prefix, normalized to `""` or `/segment[/segment...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePath(String);

impl BasePath {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            Self(String::new())
        } else {
            Self(format!("/{trimmed}"))
        }
    }

    /// URL of a file placed at the site root
    pub fn join(&self, file_name: &str) -> String {
        format!("{}/{}", self.0, file_name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct PlaceholderSpec {
    spinner_url: String,
    fragment_url: String,
    script: String,
}

impl PlaceholderSpec {
    pub fn new(base_path: &BasePath, spinner_file: &str, nav_file: &str, selector: &str) -> Self {
        let spinner_url = base_path.join(spinner_file);
        let fragment_url = base_path.join(nav_file);
        let script = bootstrap_script(selector, &fragment_url);
        Self {
            spinner_url,
            fragment_url,
            script,
        }
    }

    pub fn from_config(config: &NavAsyncConfig, locator: &NavLocator) -> Self {
        Self::new(
            &BasePath::new(&config.base_path),
            &config.spinner_file_name,
            &config.nav_file_name,
            &locator.selector(),
        )
    }

    pub fn spinner_url(&self) -> &str {
        &self.spinner_url
    }

    pub fn fragment_url(&self) -> &str {
        &self.fragment_url
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    /// Build the detached `div#loading-spinner > img` subtree in `doc`
    pub fn build_indicator(&self, doc: &mut Document) -> dom::Result<NodeId> {
        let container = doc.create_element("div", &[("id", SPINNER_ID), ("style", SPINNER_STYLE)]);
        let img = doc.create_element(
            "img",
            &[
                ("src", self.spinner_url.as_str()),
                ("alt", "Loading..."),
                ("style", SPINNER_IMG_STYLE),
            ],
        );
        doc.append_child(container, img)?;
        Ok(container)
    }

    /// Build the detached bootstrap `<script>` in `doc`
    pub fn build_script(&self, doc: &mut Document) -> dom::Result<NodeId> {
        let script = doc.create_element("script", &[("id", SCRIPT_ID)]);
        let text = doc.create_text(self.script.clone());
        doc.append_child(script, text)?;
        Ok(script)
    }
}

/// Encode `value` as a JavaScript string literal safe inside `<script>`
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace("</", "<\\/")
}

fn bootstrap_script(selector: &str, fragment_url: &str) -> String {
    let selector = js_string(selector);
    let spinner_id = js_string(SPINNER_ID);
    let fragment_url = js_string(fragment_url);
    format!(
        r#"
document.addEventListener("DOMContentLoaded", function() {{
    var spinner = document.getElementById({spinner_id});
    var navContainer = document.querySelector({selector});
    function hideSpinner() {{
        if (spinner) {{
            spinner.style.display = "none";
        }}
    }}
    if (!navContainer) {{
        hideSpinner();
        return;
    }}
    fetch({fragment_url})
        .then(function(response) {{
            if (!response.ok) {{
                throw new Error("Network response was not ok: " + response.status);
            }}
            return response.text();
        }})
        .then(function(html) {{
            navContainer.innerHTML = html;
            hideSpinner();
        }})
        .catch(function(error) {{
            console.error("Error loading navigation:", error);
            hideSpinner();
        }});
}});
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_path_normalization() {
        assert_eq!(BasePath::new("").join("nav.html"), "/nav.html");
        assert_eq!(BasePath::new("/").join("nav.html"), "/nav.html");
        assert_eq!(BasePath::new("en").join("nav.html"), "/en/nav.html");
        assert_eq!(BasePath::new("/en/").join("nav.html"), "/en/nav.html");
        assert_eq!(BasePath::new("/docs/v2").as_str(), "/docs/v2");
    }

    #[test]
    fn test_placeholder_urls_share_base_path() {
        let spec = PlaceholderSpec::new(
            &BasePath::new("en"),
            "bars-rotate-fade.svg",
            "nav.html",
            "ul[class=\"md-nav__list\"]",
        );
        assert_eq!(spec.spinner_url(), "/en/bars-rotate-fade.svg");
        assert_eq!(spec.fragment_url(), "/en/nav.html");
        assert!(spec.script().contains("fetch(\"/en/nav.html\")"));
        assert!(spec.script().contains("document.querySelector(\"ul[class=\\\"md-nav__list\\\"]\")"));
    }

    #[test]
    fn test_script_hides_spinner_on_both_paths() {
        let spec = PlaceholderSpec::new(&BasePath::new(""), "s.svg", "nav.html", "ul");
        let script = spec.script();
        let then_pos = script.find("navContainer.innerHTML = html;").unwrap();
        let catch_pos = script.find(".catch(").unwrap();

        assert!(script[then_pos..catch_pos].contains("hideSpinner();"));
        assert!(script[catch_pos..].contains("hideSpinner();"));
        assert!(script[catch_pos..].contains("console.error"));
    }

    #[test]
    fn test_js_string_escapes_script_close() {
        assert_eq!(js_string("a'b"), "\"a'b\"");
        assert_eq!(js_string("</script>"), "\"<\\/script>\"");
    }

    #[test]
    fn test_build_indicator() {
        let mut doc = Document::parse_str("<body></body>");
        let spec = PlaceholderSpec::new(&BasePath::new("/en"), "s.svg", "nav.html", "ul");
        let indicator = spec.build_indicator(&mut doc).unwrap();

        assert_eq!(
            doc.serialize_node(indicator).unwrap(),
            format!(
                "<div id=\"loading-spinner\" style=\"{SPINNER_STYLE}\">\
                 <img src=\"/en/s.svg\" alt=\"Loading...\" style=\"width:50px;\"></div>"
            )
        );
    }
}
