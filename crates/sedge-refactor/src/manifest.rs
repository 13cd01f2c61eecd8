//! The refactor manifest: catalogue-syntax description of the rewrites to
//! perform and the alias hints they use.

use crate::RefactorError;
use sedge_qmltypes::{CatalogueError, Object};

/// A component reference in a manifest: which module, version and name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentRef {
    pub uri: String,
    pub major_version: i64,
    pub minor_version: i64,
    pub name: String,
}

impl ComponentRef {
    fn from_object(obj: &Object) -> Result<Self, CatalogueError> {
        Ok(ComponentRef {
            uri: obj.field_str("uri")?.unwrap_or_default(),
            major_version: obj.field_int("majorVersion")?.unwrap_or(0),
            minor_version: obj.field_int("minorVersion")?.unwrap_or(0),
            name: obj.field_str("name")?.unwrap_or_default(),
        })
    }

    /// Render the import statement that brings this component in.
    pub fn import_statement(&self, alias: Option<&str>) -> String {
        let mut out = format!(
            "import {} {}.{}",
            self.uri, self.major_version, self.minor_version
        );
        if let Some(alias) = alias {
            out.push_str(" as ");
            out.push_str(alias);
        }
        out
    }
}

/// A preferred alias hint: imports of `for_uri` at `major_version` should
/// be aliased as `alias`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferredAlias {
    pub for_uri: String,
    pub major_version: i64,
    pub alias: String,
}

impl PreferredAlias {
    fn from_object(obj: &Object) -> Result<Self, CatalogueError> {
        Ok(PreferredAlias {
            for_uri: obj.field_str("for")?.unwrap_or_default(),
            major_version: obj.field_int("majorVersion")?.unwrap_or(0),
            alias: obj.field_str("alias")?.unwrap_or_default(),
        })
    }
}

/// Replace every use of one component with another.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaceUses {
    pub of: ComponentRef,
    pub with: ComponentRef,
}

impl ReplaceUses {
    fn from_object(obj: &Object) -> Result<Self, CatalogueError> {
        let of = match obj.find_field("of") {
            Some(v) => ComponentRef::from_object(v.as_object().map_err(|e| e.in_field("of"))?)
                .map_err(|e| e.in_field("of"))?,
            None => ComponentRef::default(),
        };
        let with = match obj.find_field("with") {
            Some(v) => ComponentRef::from_object(v.as_object().map_err(|e| e.in_field("with"))?)
                .map_err(|e| e.in_field("with"))?,
            None => ComponentRef::default(),
        };
        Ok(ReplaceUses { of, with })
    }
}

/// A parsed refactor manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefactorManifest {
    pub preferred_aliases: Vec<PreferredAlias>,
    pub replace_uses: Vec<ReplaceUses>,
    /// Payload ignored; presence requests the rewrite.
    pub replace_var_with_let_and_const: Vec<()>,
}

impl RefactorManifest {
    /// Parse a manifest from catalogue source.
    pub fn load(path: &str, source: &str) -> Result<Self, RefactorError> {
        Self::parse(source).map_err(|e| RefactorError::Manifest {
            path: path.to_string(),
            source: e,
        })
    }

    fn parse(source: &str) -> Result<Self, CatalogueError> {
        let doc = sedge_qmltypes::parse(source)?;
        let root = &doc.root;

        let mut preferred_aliases = Vec::new();
        for (idx, child) in root.children_of("PreferredAlias").enumerate() {
            preferred_aliases.push(
                PreferredAlias::from_object(child)
                    .map_err(|e| e.in_element(idx).in_field("PreferredAlias"))?,
            );
        }

        let mut replace_uses = Vec::new();
        for (idx, child) in root.children_of("ReplaceUses").enumerate() {
            replace_uses.push(
                ReplaceUses::from_object(child)
                    .map_err(|e| e.in_element(idx).in_field("ReplaceUses"))?,
            );
        }

        let replace_var_with_let_and_const = root
            .children_of("ReplaceVarWithLetAndConst")
            .map(|_| ())
            .collect();

        Ok(RefactorManifest {
            preferred_aliases,
            replace_uses,
            replace_var_with_let_and_const,
        })
    }

    /// The preferred alias for a component's module, if the manifest names
    /// one.
    pub fn preferred_alias(&self, of: &ComponentRef) -> Option<&str> {
        self.preferred_aliases
            .iter()
            .find(|p| p.for_uri == of.uri && p.major_version == of.major_version)
            .map(|p| p.alias.as_str())
    }
}
