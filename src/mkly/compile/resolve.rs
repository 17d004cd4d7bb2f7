//! Directive resolution
//!
//!     Turns the names a document declares into the collaborators a compile uses:
//!         - `use` names into active kits. Core is always active and always first; unknown
//!           names are warnings.
//!         - `theme` and `preset` names into theme and preset values, looked up in the active
//!           kits, then in the caller-supplied ones, then in the document's own
//!           `define-theme`/`define-preset` definitions. Unknown names are warnings.
//!
//!     Inline definitions that no directive references are active as well, after the
//!     referenced ones.

use crate::mkly::ast::{DefinitionKind, Diagnostic, Document, InlineDefinition};
use crate::mkly::kit::builtin::CORE_KIT;
use crate::mkly::kit::{Kit, KitRegistry, Preset, Theme};

/// Active kits for a document, core first.
pub fn resolve_kits<'a>(
    doc: &Document,
    registry: &'a KitRegistry,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<&'a Kit> {
    let mut kits: Vec<&Kit> = Vec::new();
    if let Some(core) = registry.get(CORE_KIT) {
        kits.push(core);
    }
    for name in &doc.uses {
        match registry.get(name) {
            Some(kit) if kits.iter().any(|k| k.name == kit.name) => {}
            Some(kit) => kits.push(kit),
            None => diagnostics.push(
                Diagnostic::warning(doc.use_line(name), format!("Unknown kit '{}'", name))
                    .with_code("unknown-kit"),
            ),
        }
    }
    kits
}

fn theme_from_definition(definition: &InlineDefinition) -> Theme {
    Theme {
        name: definition.qualified_name(),
        variables: definition.variables.iter().cloned().collect(),
        style: definition.body.clone(),
        css: String::new(),
    }
}

fn preset_from_definition(definition: &InlineDefinition) -> Preset {
    Preset {
        theme: theme_from_definition(definition),
        keyframes: Default::default(),
    }
}

/// Referenced names first, then unreferenced inline definitions of the kind.
fn resolve_named<T, F>(
    doc: &Document,
    kind: DefinitionKind,
    names: &[String],
    mut lookup: F,
    from_definition: fn(&InlineDefinition) -> T,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<T>
where
    F: FnMut(&str) -> Option<T>,
{
    let mut resolved = Vec::new();
    let mut used: Vec<&InlineDefinition> = Vec::new();
    for name in names {
        if let Some(found) = lookup(name) {
            resolved.push(found);
            continue;
        }
        match doc.definition(kind, name) {
            Some(definition) => {
                used.push(definition);
                resolved.push(from_definition(definition));
            }
            None => diagnostics.push(
                Diagnostic::warning(
                    doc.reference_line(kind, name),
                    format!("Unknown {} '{}'", kind, name),
                )
                    .with_code(format!("unknown-{}", kind)),
            ),
        }
    }
    for definition in doc.definitions.iter().filter(|d| d.kind == kind) {
        if !used.iter().any(|u| std::ptr::eq(*u, definition)) {
            log::debug!("activating unreferenced inline {} '{}'", kind, definition.name);
            resolved.push(from_definition(definition));
        }
    }
    resolved
}

pub fn resolve_themes(
    doc: &Document,
    kits: &[&Kit],
    extra: &[Theme],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Theme> {
    resolve_named(
        doc,
        DefinitionKind::Theme,
        &doc.themes,
        |name| {
            kits.iter()
                .find_map(|kit| kit.theme(name))
                .or_else(|| extra.iter().find(|t| t.name == name))
                .cloned()
        },
        theme_from_definition,
        diagnostics,
    )
}

pub fn resolve_presets(
    doc: &Document,
    kits: &[&Kit],
    extra: &[Preset],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Preset> {
    resolve_named(
        doc,
        DefinitionKind::Preset,
        &doc.presets,
        |name| {
            kits.iter()
                .find_map(|kit| kit.preset(name))
                .or_else(|| extra.iter().find(|p| p.name() == name))
                .cloned()
        },
        preset_from_definition,
        diagnostics,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_definitions() -> Document {
        let mut doc = Document::new();
        doc.definitions.push(InlineDefinition {
            kind: DefinitionKind::Theme,
            name: "brand".to_string(),
            variables: vec![("accent".to_string(), "#e11d48".to_string())],
            body: String::new(),
            line: 3,
        });
        doc.definitions.push(InlineDefinition {
            kind: DefinitionKind::Theme,
            name: "extra".to_string(),
            variables: Vec::new(),
            body: "core/text\n  color: red".to_string(),
            line: 6,
        });
        doc
    }

    #[test]
    fn test_core_is_always_first_and_unknown_kits_warn() {
        let registry = KitRegistry::default();
        let mut doc = Document::new();
        doc.uses = vec!["core".to_string(), "missing".to_string()];
        doc.lines.uses.insert("missing".to_string(), 3);
        let mut diagnostics = Vec::new();
        let kits = resolve_kits(&doc, &registry, &mut diagnostics);
        assert_eq!(kits.len(), 1);
        assert_eq!(kits[0].name, "core");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_deref(), Some("unknown-kit"));
        assert!(!diagnostics[0].is_error());
        assert_eq!(diagnostics[0].line, 3);
    }

    #[test]
    fn test_theme_resolution_order() {
        let registry = KitRegistry::default();
        let mut doc = doc_with_definitions();
        doc.themes = vec![
            "default".to_string(),
            "custom/brand".to_string(),
            "nope".to_string(),
        ];
        let mut diagnostics = Vec::new();
        let kits = resolve_kits(&doc, &registry, &mut diagnostics);
        let themes = resolve_themes(&doc, &kits, &[], &mut diagnostics);
        let names: Vec<_> = themes.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["default", "custom/brand", "custom/extra"]);
        assert_eq!(themes[1].variables.get("accent").map(String::as_str), Some("#e11d48"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Unknown theme 'nope'");
    }

    #[test]
    fn test_caller_presets_are_found() {
        let registry = KitRegistry::default();
        let mut doc = Document::new();
        doc.presets = vec!["compact".to_string()];
        let mut diagnostics = Vec::new();
        let kits = resolve_kits(&doc, &registry, &mut diagnostics);
        let presets = resolve_presets(
            &doc,
            &kits,
            &[Preset::new("compact").with_variable("spacing", "8px")],
            &mut diagnostics,
        );
        assert_eq!(presets.len(), 1);
        assert!(diagnostics.is_empty());
    }
}
