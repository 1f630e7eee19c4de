//! Format-preserving rewriting of version attributes
//!
//! The file is parsed with hcl-edit to locate the byte spans of the string
//! literals that carry versions. Only those spans are replaced; every other
//! byte (comments, spacing, ordering, unrelated blocks) is copied through.

use crate::domain::{DeclarationKey, DeclarationKind, UpdateResult};
use crate::error::ManifestError;
use hcl_edit::expr::{Expression, ObjectKey};
use hcl_edit::structure::{Block, Body};
use hcl_edit::Span;
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

/// Matches the value of a `ref=` query parameter inside a quoted source
static REF_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([?&]ref=)[^&"]*"#).unwrap());

/// New values for one declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    /// Written to the `version`/`required_version` attribute, if present
    pub version: String,
    /// Written to the source's `ref=` marker; appended when missing
    pub reference: Option<String>,
}

impl PendingUpdate {
    /// Builds the pending update for an `Update` result
    pub fn from_result(result: &UpdateResult) -> Option<(DeclarationKey, PendingUpdate)> {
        match result {
            UpdateResult::Update {
                declaration,
                new_version,
                new_ref,
            } => Some((
                declaration.key(),
                PendingUpdate {
                    version: new_version.clone(),
                    reference: new_ref.clone(),
                },
            )),
            UpdateResult::Skip { .. } => None,
        }
    }
}

struct Edit {
    range: Range<usize>,
    replacement: String,
}

/// Applies `updates` to `content`, returning the new file content
///
/// Rewriting with values already present yields identical output.
pub fn rewrite(
    content: &str,
    updates: &HashMap<DeclarationKey, PendingUpdate>,
) -> Result<String, ManifestError> {
    if updates.is_empty() {
        return Ok(content.to_string());
    }

    let body = hcl_edit::parser::parse_body(content)
        .map_err(|e| ManifestError::parse_error("", e.to_string()))?;

    let mut edits = Vec::new();
    collect_edits(&body, content, updates, &mut edits)?;
    apply_edits(content, edits)
}

fn collect_edits(
    body: &Body,
    content: &str,
    updates: &HashMap<DeclarationKey, PendingUpdate>,
    edits: &mut Vec<Edit>,
) -> Result<(), ManifestError> {
    for block in body.blocks() {
        match block.ident.as_str() {
            "module" => {
                let Some(update) = label_update(block, DeclarationKind::Module, updates) else {
                    continue;
                };
                replace_string_attribute(&block.body, "version", &update.version, edits)?;
                if let Some(reference) = &update.reference {
                    if let Some(attr) = block.body.get_attribute("source") {
                        edits.push(ref_edit(&attr.value, content, reference)?);
                    }
                }
            }
            "provider" => {
                if let Some(update) = label_update(block, DeclarationKind::Provider, updates) {
                    replace_string_attribute(&block.body, "version", &update.version, edits)?;
                }
            }
            "terraform" => {
                let key = DeclarationKey::new(DeclarationKind::Terraform, "terraform");
                if let Some(update) = updates.get(&key) {
                    replace_string_attribute(
                        &block.body,
                        "required_version",
                        &update.version,
                        edits,
                    )?;
                }
                for nested in block.body.blocks() {
                    if nested.has_ident("required_providers") {
                        collect_required_provider_edits(&nested.body, updates, edits)?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn label_update<'a>(
    block: &Block,
    kind: DeclarationKind,
    updates: &'a HashMap<DeclarationKey, PendingUpdate>,
) -> Option<&'a PendingUpdate> {
    let name = block.labels.first()?.as_str();
    updates.get(&DeclarationKey::new(kind, name))
}

fn collect_required_provider_edits(
    body: &Body,
    updates: &HashMap<DeclarationKey, PendingUpdate>,
    edits: &mut Vec<Edit>,
) -> Result<(), ManifestError> {
    for attr in body.attributes() {
        let key = DeclarationKey::new(DeclarationKind::Provider, attr.key.as_str());
        let Some(update) = updates.get(&key) else {
            continue;
        };

        match &attr.value {
            Expression::String(_) => edits.push(string_edit(&attr.value, &update.version)?),
            Expression::Object(object) => {
                let version = object.iter().find_map(|(k, v)| {
                    let is_version = match k {
                        ObjectKey::Ident(ident) => ident.as_str() == "version",
                        ObjectKey::Expression(expr) => expr.as_str() == Some("version"),
                    };
                    is_version.then(|| v.expr())
                });
                if let Some(expr) = version {
                    if expr.as_str().is_some() {
                        edits.push(string_edit(expr, &update.version)?);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Replaces a string-literal attribute; other expressions are left alone
fn replace_string_attribute(
    body: &Body,
    key: &str,
    value: &str,
    edits: &mut Vec<Edit>,
) -> Result<(), ManifestError> {
    if let Some(attr) = body.get_attribute(key) {
        if attr.value.as_str().is_some() {
            edits.push(string_edit(&attr.value, value)?);
        }
    }
    Ok(())
}

fn span_of(expr: &Expression) -> Result<Range<usize>, ManifestError> {
    expr.span()
        .ok_or_else(|| ManifestError::rewrite_error("", "expression has no source position"))
}

fn string_edit(expr: &Expression, value: &str) -> Result<Edit, ManifestError> {
    Ok(Edit {
        range: span_of(expr)?,
        replacement: quote(value),
    })
}

/// Replaces or appends the `ref=` parameter of a quoted source literal
fn ref_edit(expr: &Expression, content: &str, reference: &str) -> Result<Edit, ManifestError> {
    if expr.as_str().is_none() {
        return Err(ManifestError::rewrite_error(
            "",
            "module source is not a string literal",
        ));
    }
    let range = span_of(expr)?;
    let raw = content
        .get(range.clone())
        .ok_or_else(|| ManifestError::rewrite_error("", "source span out of bounds"))?;

    let replacement = if REF_PARAM_RE.is_match(raw) {
        REF_PARAM_RE
            .replace(raw, |caps: &regex::Captures| format!("{}{}", &caps[1], reference))
            .into_owned()
    } else {
        let inner = raw
            .strip_suffix('"')
            .ok_or_else(|| ManifestError::rewrite_error("", "unterminated source string"))?;
        let separator = if inner.contains('?') { '&' } else { '?' };
        format!("{}{}ref={}\"", inner, separator, reference)
    };

    Ok(Edit { range, replacement })
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn apply_edits(content: &str, mut edits: Vec<Edit>) -> Result<String, ManifestError> {
    edits.sort_by_key(|e| e.range.start);
    for pair in edits.windows(2) {
        if pair[0].range.end > pair[1].range.start {
            return Err(ManifestError::rewrite_error("", "overlapping edits"));
        }
    }

    let mut output = content.to_string();
    for edit in edits.iter().rev() {
        output.replace_range(edit.range.clone(), &edit.replacement);
    }
    Ok(output)
}
