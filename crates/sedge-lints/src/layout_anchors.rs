//! Flag anchor properties on direct children of QtQuick.Layouts
//! containers; layouts manage their children's geometry themselves.

use crate::{CancelToken, Diagnostic, LintPass, Severity};
use sedge_analysis::{Engine, FileContext, SpanRange};
use streaming_iterator::StreamingIterator;
use tree_sitter::QueryCursor;

pub struct LayoutAnchors;

const LAYOUTS_IMPORT: &str = "QtQuick.Layouts";

/// Per-anchor replacement advice. `{{kind}}` interpolates the parent
/// component as written, `{{pfx}}` its alias prefix.
const ANCHOR_WARNINGS: &[(&str, &str)] = &[
    (
        "anchors.alignWhenCentered",
        "Don't use anchors.alignWhenCentered in a {{kind}}. Layouts always pixel-align their items, so this is unnecessary.",
    ),
    (
        "anchors.baseline",
        "Don't use anchors.baseline in a {{kind}}. Instead, consider using \"{{pfx}}Layout.alignment: Qt.AlignBaseline\"",
    ),
    (
        "anchors.baselineOffset",
        "Don't use anchors.baselineOffset in a {{kind}}. Instead, consider setting the \"{{pfx}}Layout.bottomMargin\".",
    ),
    (
        "anchors.bottom",
        "Don't use anchors.bottom in a {{kind}}. Instead, consider using \"{{pfx}}Layout.alignment: Qt.AlignBottom\"",
    ),
    (
        "anchors.bottomMargin",
        "Don't use anchors.bottomMargin in a {{kind}}. Instead, consider setting the \"{{pfx}}Layout.bottomMargin\"",
    ),
    (
        "anchors.centerIn",
        "Don't use anchors.centerIn in a {{kind}}. Instead, consider using \"{{pfx}}Layout.alignment: Qt.AlignVCenter | Qt.AlignHCenter\"",
    ),
    (
        "anchors.fill",
        "Don't use anchors.fill in a {{kind}}. Instead, consider using \"{{pfx}}Layout.fillWidth: true\" and \"{{pfx}}Layout.fillHeight: true\"",
    ),
    (
        "anchors.horizontalCenter",
        "Don't use anchors.horizontalCenter in a {{kind}}. Instead, consider using \"{{pfx}}Layout.alignment: Qt.AlignHCenter\"",
    ),
    (
        "anchors.horizontalCenterOffset",
        "Don't use anchors.horizontalCenterOffset in a {{kind}}. Instead, consider using \"{{pfx}}Layout.leftMargin\" or \"{{pfx}}Layout.rightMargin\"",
    ),
    (
        "anchors.left",
        "Don't use anchors.left in a {{kind}}. Instead, consider using \"{{pfx}}Layout.alignment: Qt.AlignLeft\"",
    ),
    (
        "anchors.leftMargin",
        "Don't use anchors.leftMargin in a {{kind}}. Instead, consider using \"{{pfx}}Layout.leftMargin\"",
    ),
    (
        "anchors.margins",
        "Don't use anchors.margins in a {{kind}}. Instead, consider using \"{{pfx}}Layout.margins\"",
    ),
    (
        "anchors.right",
        "Don't use anchors.right in a {{kind}}. Instead, consider using \"{{pfx}}Layout.alignment: Qt.AlignRight\"",
    ),
    (
        "anchors.rightMargin",
        "Don't use anchors.rightMargin in a {{kind}}. Instead, consider using \"{{pfx}}Layout.rightMargin\"",
    ),
    (
        "anchors.top",
        "Don't use anchors.top in a {{kind}}. Instead, consider using \"{{pfx}}Layout.alignment: Qt.AlignTop\"",
    ),
    (
        "anchors.topMargin",
        "Don't use anchors.topMargin in a {{kind}}. Instead, consider using \"{{pfx}}Layout.topMargin\"",
    ),
    (
        "anchors.verticalCenter",
        "Don't use anchors.verticalCenter in a {{kind}}. Instead, consider using \"{{pfx}}Layout.alignment: Qt.AlignVCenter\"",
    ),
    (
        "anchors.verticalCenterOffset",
        "Don't use anchors.verticalCenterOffset in a {{kind}}. Instead, consider using \"{{pfx}}Layout.topMargin\" or \"{{pfx}}Layout.bottomMargin\"",
    ),
];

fn warning_for(property: &str) -> Option<&'static str> {
    ANCHOR_WARNINGS
        .iter()
        .find(|(name, _)| *name == property)
        .map(|(_, message)| *message)
}

impl LintPass for LayoutAnchors {
    fn analyze(
        &self,
        _uri: &str,
        ctx: &FileContext,
        engine: &Engine,
        _cancel: &CancelToken,
    ) -> Vec<Diagnostic> {
        let query = &engine.queries().parent_object_child_property_sets;
        let (Some(outer_idx), Some(prop_idx)) = (
            query.capture_index_for_name("outer"),
            query.capture_index_for_name("prop"),
        ) else {
            return Vec::new();
        };

        let mut diags = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, ctx.root(), ctx.body.as_bytes());
        while let Some(m) = matches.next() {
            let outer = m.captures.iter().find(|c| c.index == outer_idx);
            let prop = m.captures.iter().find(|c| c.index == prop_idx);
            let (Some(outer), Some(prop)) = (outer, prop) else {
                continue;
            };

            let parent_type = outer.node.utf8_text(ctx.body.as_bytes()).unwrap_or("");
            let child_property = prop.node.utf8_text(ctx.body.as_bytes()).unwrap_or("");
            if !child_property.starts_with("anchors") {
                continue;
            }

            for import in &ctx.imports {
                if import.uri.path != LAYOUTS_IMPORT {
                    continue;
                }
                let Some(module) = &import.module else {
                    continue;
                };
                let prefix = import.prefix();

                for component in &module.components {
                    if format!("{prefix}{}", component.sane_name()) != parent_type {
                        continue;
                    }
                    let Some(template) = warning_for(child_property) else {
                        continue;
                    };
                    diags.push(Diagnostic {
                        range: SpanRange::from_node(&prop.node),
                        severity: Severity::Error,
                        source: "anchors in layouts lint",
                        message: template
                            .replace("{{kind}}", &format!("{prefix}{}", component.sane_name()))
                            .replace("{{pfx}}", &prefix),
                        context: None,
                    });
                }
            }
        }

        diags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_names_its_property() {
        for (property, message) in ANCHOR_WARNINGS {
            assert!(message.starts_with(&format!("Don't use {property}")));
        }
        assert_eq!(warning_for("anchors.fill").is_some(), true);
        assert!(warning_for("anchors.unknown").is_none());
    }
}
