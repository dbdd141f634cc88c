//! Textual rewriting of relative resource references in markup and loader scripts.
//!
//! Only a fixed set of references is touched: the `src`/`href` attributes and the quoted
//! loader configuration fields of a packaged web build. Everything else in the input is
//! copied through byte for byte.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::VIRTUAL_PREFIX;

/// One kind of reference the rewriter knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `name="value"` in markup.
    Attribute(&'static str),
    /// `name: "value"` in script text, any whitespace after the colon.
    ScriptField(&'static str),
}

impl ReferenceKind {
    fn pattern(self) -> String {
        let lead = match self {
            ReferenceKind::Attribute(name) => format!(r#"{}=""#, regex::escape(name)),
            ReferenceKind::ScriptField(name) => format!(r#"{}:\s*""#, regex::escape(name)),
        };
        format!(r#"(?P<lead>{lead})(?P<value>[^"]+)""#)
    }
}

/// Substitutions are applied in this order.
pub const REFERENCE_KINDS: [ReferenceKind; 6] = [
    ReferenceKind::Attribute("src"),
    ReferenceKind::Attribute("href"),
    ReferenceKind::ScriptField("loaderUrl"),
    ReferenceKind::ScriptField("dataUrl"),
    ReferenceKind::ScriptField("frameworkUrl"),
    ReferenceKind::ScriptField("codeUrl"),
];

static RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    REFERENCE_KINDS
        .iter()
        .map(|kind| Regex::new(&kind.pattern()).expect("reference pattern is valid"))
        .collect()
});

/// Namespace the rewritten references should point into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteContext {
    pub namespace: String,
}

impl RewriteContext {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
        }
    }

    /// Rewrites every relative reference in `text` to `/virtual/{namespace}/{value}`.
    ///
    /// Values starting with `http`, `//` or `/virtual` are left alone, which also makes the
    /// rewrite idempotent.
    pub fn rewrite(&self, text: &str) -> String {
        let prefix = format!("/{VIRTUAL_PREFIX}/{}/", self.namespace);
        let mut out = text.to_string();
        for rule in RULES.iter() {
            out = rule
                .replace_all(&out, |caps: &Captures| {
                    let value = &caps["value"];
                    if is_passthrough(value) {
                        caps[0].to_string()
                    } else {
                        format!("{}{prefix}{value}\"", &caps["lead"])
                    }
                })
                .into_owned();
        }
        out
    }
}

/// Shorthand for `RewriteContext::new(namespace).rewrite(text)`.
pub fn rewrite(text: &str, namespace: &str) -> String {
    RewriteContext::new(namespace).rewrite(text)
}

fn is_passthrough(value: &str) -> bool {
    value.starts_with("http")
        || value.starts_with("//")
        || value.starts_with(&format!("/{VIRTUAL_PREFIX}"))
}
