//! Rendering of upstream creation bodies and the snapshot banner
//!
//! Templates use minijinja syntax with two variables, `name` and `nodes`.
//! The older `{{.Name}}` / `{{.Nodes}}` placeholder spelling is accepted and
//! rewritten before rendering.

use minijinja::{context, AutoEscape, Environment, UndefinedBehavior};
use syncer_api::NodeMap;
use syncer_core::{Result, SyncerError};

/// Written into generated resources and the snapshot banner
pub const PROVENANCE: &str = "https://github.com/anjia0532/discovery-syncer";

/// Body used to create an upstream when the caller supplies no template
pub const DEFAULT_UPSTREAM_TEMPLATE: &str = r#"
{
    "timeout": {
        "connect": 30,
        "send": 30,
        "read": 30
    },
    "name": "{{ name }}",
    "nodes": {{ nodes }},
    "type": "roundrobin",
    "desc": "auto sync by {{ provenance }}"
}
"#;

const SNAPSHOT_TEMPLATE: &str = "
# Auto generate by {{ provenance }}, Don't Modify

{{ value }}
#END
";

const LEGACY_PLACEHOLDERS: [(&str, &str); 2] = [(".Name", "name"), (".Nodes", "nodes")];

pub struct TemplateEngine {
    env: Environment<'static>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        Self { env }
    }

    /// Render an upstream creation body.
    ///
    /// The node map is embedded as serialized JSON, so `{{ nodes }}` must sit
    /// in a value position rather than inside a string. The result has to
    /// parse as JSON.
    pub fn render_upstream(
        &self,
        template: Option<&str>,
        name: &str,
        nodes: &NodeMap,
    ) -> Result<String> {
        let nodes = serde_json::to_string(nodes)?;
        let source = normalize_placeholders(template.unwrap_or(DEFAULT_UPSTREAM_TEMPLATE));

        let ctx = context! { name => name, nodes => nodes, provenance => PROVENANCE };
        let rendered = self
            .env
            .render_str(&source, ctx)
            .map_err(|e| SyncerError::Template(e.to_string()))?;

        serde_json::from_str::<serde_json::Value>(&rendered).map_err(|e| {
            SyncerError::Template(format!("upstream body for {} is not valid JSON: {}", name, e))
        })?;
        Ok(rendered)
    }

    /// Wrap a YAML document in the generated-file banner and end marker
    pub fn render_snapshot(&self, yaml: &str) -> Result<String> {
        self.env
            .render_str(SNAPSHOT_TEMPLATE, context! { value => yaml, provenance => PROVENANCE })
            .map_err(|e| SyncerError::Template(e.to_string()))
    }
}

fn normalize_placeholders(template: &str) -> String {
    let mut normalized = template.to_string();
    for (legacy, name) in LEGACY_PLACEHOLDERS {
        let replacement = format!("{{{{ {} }}}}", name);
        normalized = normalized
            .replace(&format!("{{{{{}}}}}", legacy), &replacement)
            .replace(&format!("{{{{ {} }}}}", legacy), &replacement);
    }
    normalized
}
