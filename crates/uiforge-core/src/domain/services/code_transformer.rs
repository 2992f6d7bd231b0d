//! Rewrites generated code so it renders without the corporate design system.
//!
//! The preview renderer cannot resolve `@nlmk/ds-2.0`, so every named import
//! from it is replaced by a marked block of inline fallback components with the
//! same local names. The rewrite is idempotent: its output never contains the
//! import again, and names already provided by an earlier fallback block are not
//! redefined.

use std::borrow::Cow;
use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

pub const DESIGN_SYSTEM_PACKAGE: &str = "@nlmk/ds-2.0";

const FALLBACK_BEGIN: &str = "// uiforge:fallback-components begin";
const FALLBACK_END: &str = "// uiforge:fallback-components end";

/// An import statement starts a line or follows the `;` of the previous
/// statement. The terminator is left out of the match so two imports on one
/// line are both found.
static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)(?:^|;)[ \t]*(?P<stmt>import[ \t]+(?P<clause>[^;'"]*?)[ \t\r\n]*from[ \t]*['"]@nlmk/ds-2\.0['"])"#,
    )
    .expect("design system import pattern")
});

static IMPORT_TAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*;?[ \t]*(?:\r?\n)?").expect("import tail pattern"));

static FALLBACK_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)// uiforge:fallback-components begin.*?// uiforge:fallback-components end")
        .expect("fallback block pattern")
});

static DEFINED_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:const|type)[ \t]+(?P<name>[A-Za-z_$][\w$]*)").expect("definition pattern")
});

static CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:jsx|tsx)\s*|\s*```").expect("code fence pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
enum BindingKind {
    Component { imported: String },
    Type,
    Namespace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    local: String,
    kind: BindingKind,
}

impl Binding {
    fn definition(&self) -> String {
        let local = &self.local;
        match &self.kind {
            BindingKind::Type => format!("type {local} = any;"),
            BindingKind::Namespace => format!(
                "const {local}: any = new Proxy({{}}, {{ get: (_target: any, name: any) => ({{ children, ...props }}: any) => <div data-placeholder={{String(name)}} {{...props}}>{{children}}</div> }});"
            ),
            BindingKind::Component { imported } => {
                let tag = fallback_tag(imported);
                if is_void_tag(tag) {
                    format!(
                        "const {local} = (props: any) => <{tag} data-placeholder=\"{imported}\" {{...props}} />;"
                    )
                } else {
                    format!(
                        "const {local} = ({{ children, ...props }}: any) => <{tag} data-placeholder=\"{imported}\" {{...props}}>{{children}}</{tag}>;"
                    )
                }
            }
        }
    }
}

fn fallback_tag(imported: &str) -> &'static str {
    match imported {
        "Button" | "IconButton" => "button",
        "Input" | "TextField" | "Checkbox" | "Radio" | "Switch" => "input",
        "Textarea" => "textarea",
        "Typography" | "Text" => "p",
        "Link" => "a",
        "Header" => "header",
        "Footer" => "footer",
        "Table" => "table",
        "Select" => "select",
        "Label" => "label",
        "Form" => "form",
        _ => "div",
    }
}

fn is_void_tag(tag: &str) -> bool {
    tag == "input"
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn parse_specifier(raw: &str, type_only: bool) -> Option<Binding> {
    let mut spec = raw.trim();
    let mut is_type = type_only;
    if let Some(rest) = spec.strip_prefix("type ") {
        spec = rest.trim();
        is_type = true;
    }

    let (imported, local) = match spec.split_once(" as ") {
        Some((imported, local)) => (imported.trim(), local.trim()),
        None => (spec, spec),
    };
    if !is_identifier(local) {
        return None;
    }

    if is_type || imported.ends_with("Props") {
        return Some(Binding {
            local: local.to_string(),
            kind: BindingKind::Type,
        });
    }

    Some(Binding {
        local: local.to_string(),
        kind: BindingKind::Component {
            imported: imported.to_string(),
        },
    })
}

/// Parses the part between `import` and `from`.
fn parse_clause(clause: &str) -> Vec<Binding> {
    let mut clause = clause.trim();
    let mut type_only = false;
    if let Some(rest) = clause.strip_prefix("type ") {
        clause = rest.trim();
        type_only = true;
    }

    let (head, named) = match (clause.find('{'), clause.rfind('}')) {
        (Some(open), Some(close)) if open < close => (&clause[..open], &clause[open + 1..close]),
        _ => (clause, ""),
    };

    let mut bindings = vec![];
    for part in head.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(namespace) = part.strip_prefix("* as ") {
            let namespace = namespace.trim();
            if is_identifier(namespace) {
                bindings.push(Binding {
                    local: namespace.to_string(),
                    kind: BindingKind::Namespace,
                });
            }
        } else if let Some(binding) = parse_specifier(part, type_only) {
            bindings.push(binding);
        }
    }

    for part in named.split(',') {
        if part.trim().is_empty() {
            continue;
        }
        if let Some(binding) = parse_specifier(part, type_only) {
            bindings.push(binding);
        }
    }

    bindings
}

fn defined_fallback_names(code: &str) -> HashSet<String> {
    FALLBACK_BLOCK_RE
        .find_iter(code)
        .flat_map(|block| {
            DEFINED_NAME_RE
                .captures_iter(block.as_str())
                .map(|caps| caps["name"].to_string())
                .collect::<Vec<String>>()
        })
        .collect()
}

fn render_block(bindings: &[Binding]) -> String {
    let mut block = format!("{FALLBACK_BEGIN} ({DESIGN_SYSTEM_PACKAGE} is unavailable in the preview)\n");
    for binding in bindings {
        block.push_str(&binding.definition());
        block.push('\n');
    }
    block.push_str(FALLBACK_END);
    block.push('\n');
    block
}

pub fn transform(code: &str) -> String {
    let matches: Vec<regex::Captures> = IMPORT_RE.captures_iter(code).collect();
    if matches.is_empty() {
        return code.to_string();
    }

    let mut seen = defined_fallback_names(code);
    let mut bindings = vec![];
    for caps in &matches {
        for binding in parse_clause(&caps["clause"]) {
            if seen.insert(binding.local.clone()) {
                bindings.push(binding);
            }
        }
    }

    let mut output = String::with_capacity(code.len());
    let mut cursor = 0;
    for (idx, caps) in matches.iter().enumerate() {
        let (Some(whole), Some(stmt)) = (caps.get(0), caps.name("stmt")) else {
            continue;
        };
        // Keep the `;` that ended the previous statement. The previous
        // import's tail may already have consumed it.
        let lead = usize::from(code[whole.start()..].starts_with(';'));
        let start = (whole.start() + lead).max(cursor);
        output.push_str(&code[cursor..start]);
        if idx == 0 && !bindings.is_empty() {
            output.push_str(&render_block(&bindings));
        }

        let tail = IMPORT_TAIL_RE
            .find(&code[stmt.end()..])
            .map_or(0, |tail| tail.end());
        cursor = stmt.end() + tail;
    }
    output.push_str(&code[cursor..]);

    tracing::debug!(
        imports = matches.len(),
        fallbacks = bindings.len(),
        "replaced design system imports"
    );

    output
}

/// Removes markdown code fences the model sometimes wraps its answer in.
pub fn strip_code_fences(code: &str) -> String {
    match CODE_FENCE_RE.replace_all(code, "") {
        Cow::Borrowed(_) => code.to_string(),
        Cow::Owned(stripped) => stripped.trim().to_string(),
    }
}
