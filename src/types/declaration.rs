//! @dose
//! purpose: This module defines the declaration record produced by the scanner. A declaration
//!     is one public construct of a source module together with its rendered, body-free
//!     signature text. Kind-specific facts live in the DeclarationDetail sum type so each
//!     variant only carries the fields that make sense for it.
//!
//! when-editing:
//!     - !text is the only field downstream assembly consumes; everything else is descriptive
//!     - !kind() is derived from the detail variant, never stored separately
//!     - start/end are byte offsets into the original source, never borrowed slices
//!
//! invariants:
//!     - start < end for every declaration produced by a scan
//!     - text never contains an executable body
//!     - has_body is only true for a function or method that had an implementation
//!
//! gotchas:
//!     - name is empty for bulk imports/exports and "default" for default-exported expressions
//!     - Module bodies own their nested declarations; nested text is rendered unindented and
//!       the enclosing module indents it

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a declaration, derived from its detail variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Import,
    Export,
    Function,
    Variable,
    Interface,
    Type,
    Class,
    Enum,
    Module,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Import => "import",
            DeclarationKind::Export => "export",
            DeclarationKind::Function => "function",
            DeclarationKind::Variable => "variable",
            DeclarationKind::Interface => "interface",
            DeclarationKind::Type => "type",
            DeclarationKind::Class => "class",
            DeclarationKind::Enum => "enum",
            DeclarationKind::Module => "module",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single function or method parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Binding name, or the cleaned binding pattern for destructured parameters
    pub name: String,
    /// Declared or inferred type
    pub type_annotation: String,
    pub optional: bool,
    /// Raw default-value expression, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_text: Option<String>,
    pub rest: bool,
    /// Parameter-property modifiers (public, protected, private, readonly, override)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub modifiers: Vec<String>,
}

impl Parameter {
    /// Whether this constructor parameter also declares an instance property
    pub fn is_property(&self) -> bool {
        self.modifiers
            .iter()
            .any(|m| matches!(m.as_str(), "public" | "protected" | "private" | "readonly"))
    }

    pub fn is_private(&self) -> bool {
        self.modifiers.iter().any(|m| m == "private")
    }

    pub fn is_readonly(&self) -> bool {
        self.modifiers.iter().any(|m| m == "readonly")
    }
}

/// Signature of a function, method or constructor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generics: Option<String>,
    pub parameters: Vec<Parameter>,
    /// Declared return type; None when the source had no annotation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    /// The source carried an implementation body
    pub has_body: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKeyword {
    Const,
    Let,
    Var,
}

impl VariableKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKeyword::Const => "const",
            VariableKeyword::Let => "let",
            VariableKeyword::Var => "var",
        }
    }

    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "const" => Some(VariableKeyword::Const),
            "let" => Some(VariableKeyword::Let),
            "var" => Some(VariableKeyword::Var),
            _ => None,
        }
    }
}

/// One name in an `export { ... }` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSpecifier {
    /// Local (or re-exported source) name
    pub local: String,
    /// Name visible to importers
    pub exported: String,
    pub is_type_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Protected,
    Private,
}

impl Access {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "public" => Some(Access::Public),
            "protected" => Some(Access::Protected),
            "private" => Some(Access::Private),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Property,
    Method,
    Getter,
    Setter,
    Constructor,
    Index,
}

/// A public member of a class body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMember {
    pub kind: MemberKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<Access>,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_readonly: bool,
    pub is_optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generics: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<Parameter>,
    /// Property type, accessor type or method return type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_annotation: Option<String>,
    pub is_async: bool,
    pub is_generator: bool,
    pub has_body: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub leading_comments: Vec<String>,
}

impl ClassMember {
    pub fn new(kind: MemberKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            access: None,
            is_static: false,
            is_abstract: false,
            is_readonly: false,
            is_optional: false,
            generics: None,
            parameters: Vec::new(),
            type_annotation: None,
            is_async: false,
            is_generator: false,
            has_body: false,
            leading_comments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initializer: Option<String>,
}

/// Kind-specific facts about a declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DeclarationDetail {
    Import {
        source: String,
    },
    Export {
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        specifiers: Vec<ExportSpecifier>,
    },
    Function(FunctionSignature),
    Variable {
        keyword: VariableKeyword,
        type_annotation: String,
    },
    Interface {
        #[serde(skip_serializing_if = "Option::is_none")]
        generics: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        extends: Option<String>,
        members: Vec<String>,
    },
    Type {
        #[serde(skip_serializing_if = "Option::is_none")]
        generics: Option<String>,
        definition: String,
    },
    Class {
        #[serde(skip_serializing_if = "Option::is_none")]
        generics: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        extends: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        implements: Vec<String>,
        is_abstract: bool,
        members: Vec<ClassMember>,
    },
    Enum {
        is_const: bool,
        members: Vec<EnumMember>,
    },
    Module {
        /// Module specifier for ambient `declare module "x"` declarations
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        is_global: bool,
        /// `declare module "x";` with no body
        #[serde(default)]
        is_shorthand: bool,
        body: Vec<Declaration>,
    },
}

impl DeclarationDetail {
    pub fn kind(&self) -> DeclarationKind {
        match self {
            DeclarationDetail::Import { .. } => DeclarationKind::Import,
            DeclarationDetail::Export { .. } => DeclarationKind::Export,
            DeclarationDetail::Function(_) => DeclarationKind::Function,
            DeclarationDetail::Variable { .. } => DeclarationKind::Variable,
            DeclarationDetail::Interface { .. } => DeclarationKind::Interface,
            DeclarationDetail::Type { .. } => DeclarationKind::Type,
            DeclarationDetail::Class { .. } => DeclarationKind::Class,
            DeclarationDetail::Enum { .. } => DeclarationKind::Enum,
            DeclarationDetail::Module { .. } => DeclarationKind::Module,
        }
    }
}

/// One public construct of a source module and its declaration-only text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    /// Rendered, implementation-free signature
    pub text: String,
    pub is_exported: bool,
    pub is_type_only: bool,
    pub is_default: bool,
    pub is_async: bool,
    pub is_generator: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub leading_comments: Vec<String>,
    pub start: usize,
    pub end: usize,
    #[serde(flatten)]
    pub detail: DeclarationDetail,
}

impl Declaration {
    pub fn new(name: impl Into<String>, detail: DeclarationDetail, start: usize, end: usize) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            is_exported: false,
            is_type_only: false,
            is_default: false,
            is_async: false,
            is_generator: false,
            leading_comments: Vec::new(),
            start,
            end,
            detail,
        }
    }

    pub fn kind(&self) -> DeclarationKind {
        self.detail.kind()
    }

    /// Module specifier for imports, re-exports and ambient modules
    pub fn source(&self) -> Option<&str> {
        match &self.detail {
            DeclarationDetail::Import { source } => Some(source),
            DeclarationDetail::Export { source, .. } => source.as_deref(),
            DeclarationDetail::Module { source, .. } => source.as_deref(),
            _ => None,
        }
    }

    pub fn has_body(&self) -> bool {
        matches!(&self.detail, DeclarationDetail::Function(sig) if sig.has_body)
    }

    /// Whether this is an interface/type/class/enum, the kinds eligible for
    /// referenced-type promotion
    pub fn is_type_like(&self) -> bool {
        matches!(
            self.kind(),
            DeclarationKind::Interface
                | DeclarationKind::Type
                | DeclarationKind::Class
                | DeclarationKind::Enum
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_derived_from_detail() {
        let decl = Declaration::new(
            "Status",
            DeclarationDetail::Enum {
                is_const: false,
                members: vec![],
            },
            0,
            10,
        );
        assert_eq!(decl.kind(), DeclarationKind::Enum);
        assert_eq!(decl.kind().to_string(), "enum");
        assert!(decl.is_type_like());
        assert!(!decl.has_body());
    }

    #[test]
    fn test_serializes_kind_tag() {
        let mut decl = Declaration::new(
            "",
            DeclarationDetail::Import {
                source: "react".to_string(),
            },
            0,
            24,
        );
        decl.text = "import React from 'react';".to_string();
        let json = serde_json::to_value(&decl).unwrap();
        assert_eq!(json["kind"], "import");
        assert_eq!(json["source"], "react");
        assert_eq!(decl.source(), Some("react"));
    }

    #[test]
    fn test_parameter_property_modifiers() {
        let param = Parameter {
            name: "id".to_string(),
            modifiers: vec!["private".to_string(), "readonly".to_string()],
            ..Default::default()
        };
        assert!(param.is_property());
        assert!(param.is_private());
        assert!(param.is_readonly());
        assert!(!Parameter::default().is_property());
    }
}
