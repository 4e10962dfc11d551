//! Path template matching.
//!
//! # Responsibilities
//! - Compile `/users/:id` style templates into anchored regular expressions
//! - Capture each `:name` segment as a named group
//! - Accept (but not capture) a trailing `?query` suffix
//!
//! # Design Decisions
//! - Parameter names are ASCII letters; parameter values are `[a-z0-9-_]+`,
//!   so matching is case-sensitive exactly as the literal template is
//! - Literal text is regex-escaped: a `.` in a template matches only a `.`
//! - Patterns are compiled once at registration time

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::RouteError;

const PARAM_VALUE: &str = r"[a-z0-9\-_]+";
const QUERY_SUFFIX: &str = r"(\?.*)?";

fn param_token() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r":([a-zA-Z]+)").expect("parameter token pattern is valid"))
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: Regex,
    params: Vec<String>,
}

impl PathMatcher {
    /// Compile a template such as `/users/:id`.
    pub fn compile(template: &str) -> Result<Self, RouteError> {
        let mut source = String::from("^");
        let mut params = Vec::new();
        let mut literal_start = 0;

        for captures in param_token().captures_iter(template) {
            let (Some(token), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };

            source.push_str(&regex::escape(&template[literal_start..token.start()]));
            source.push_str(&format!("(?P<{}>{})", name.as_str(), PARAM_VALUE));
            params.push(name.as_str().to_string());
            literal_start = token.end();
        }

        source.push_str(&regex::escape(&template[literal_start..]));
        source.push_str(QUERY_SUFFIX);
        source.push('$');

        let pattern = Regex::new(&source).map_err(|source| RouteError::InvalidTemplate {
            template: template.to_string(),
            source,
        })?;

        Ok(Self {
            pattern,
            params,
        })
    }

    /// Names of the captured parameters, in template order.
    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    /// Whether `target` (path with optional query string) matches the whole template.
    pub fn matches(&self, target: &str) -> bool {
        self.pattern.is_match(target)
    }

    /// Named segment values of `target`; empty when it does not match.
    pub fn extract_params(&self, target: &str) -> HashMap<String, String> {
        let Some(captures) = self.pattern.captures(target) else {
            return HashMap::new();
        };

        self.params
            .iter()
            .filter_map(|name| {
                captures
                    .name(name)
                    .map(|value| (name.clone(), value.as_str().to_string()))
            })
            .collect()
    }
}
