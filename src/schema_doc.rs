//! JSON schema documents → `Node`.
//!
//! Documents use externally tagged objects so that `serde_path_to_error` can
//! follow every nesting level:
//!
//! ```json
//! { "struct": { "fields": [
//!     { "name": "a", "rename": "a_1", "type": { "struct": { "fields": [
//!         { "name": "b", "rename": "b_1", "type": { "codec": "date-from-string" } },
//!         { "name": "c", "rename": "c_1",
//!           "type": { "codec": { "boolean-from-literal": { "true": "Y", "false": "N" } } } }
//!     ] } } }
//! ] } }
//! ```
use std::collections::BTreeSet;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::ast::{Annotations, IndexSignature, LeafKind, Node, PropertySignature, StructType, TupleElement, TupleType};
use crate::conversion::{BooleanFromLiteral, DateFromString};

#[derive(Error, Debug)]
pub enum SchemaDocError {
    #[error("failed to read schema document {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schema document at JSON path {path}: {message}")]
    Parse { path: String, message: String },

    #[error("duplicate field `{name}` in struct at {at}")]
    DuplicateField { name: String, at: String },
}

// ————————————————————————————————————————————————————————————————————————————
// DOCUMENT MODEL
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaDoc {
    Leaf(LeafDoc),
    Struct(StructDoc),
    Tuple(TupleDoc),
    Codec(CodecDoc),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeafDoc {
    Unknown,
    Null,
    Boolean,
    Number,
    String,
    Date,
    Named(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructDoc {
    pub fields: Vec<FieldDoc>,
    #[serde(default)]
    pub index: Option<IndexDoc>,
}

/// Open keys; `key` defaults to `string`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexDoc {
    #[serde(default)]
    pub key: Option<LeafDoc>,
    #[serde(rename = "type")]
    pub ty: Box<SchemaDoc>,
    #[serde(default)]
    pub readonly: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SchemaDoc,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub rename: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TupleDoc {
    #[serde(default)]
    pub elements: Vec<ElementDoc>,
    #[serde(default)]
    pub rest: Option<Box<SchemaDoc>>,
    #[serde(default)]
    pub readonly: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementDoc {
    #[serde(rename = "type")]
    pub ty: SchemaDoc,
    #[serde(default)]
    pub optional: bool,
}

/// Built-in conversions a document can name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodecDoc {
    DateFromString,
    BooleanFromLiteral {
        #[serde(rename = "true")]
        truthy: String,
        #[serde(rename = "false")]
        falsy: String,
    },
}

// ————————————————————————————————————————————————————————————————————————————
// LOADING
// ————————————————————————————————————————————————————————————————————————————

/// Deserialize with JSON-path context in error messages.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, SchemaDocError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| SchemaDocError::Parse {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

pub fn parse(src: &str) -> Result<Node, SchemaDocError> {
    from_str_with_path::<SchemaDoc>(src)?.into_node()
}

pub fn load(path: &Path) -> Result<Node, SchemaDocError> {
    let src = std::fs::read_to_string(path).map_err(|source| SchemaDocError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&src)
}

impl SchemaDoc {
    pub fn into_node(self) -> Result<Node, SchemaDocError> {
        self.lower("$")
    }

    fn lower(self, at: &str) -> Result<Node, SchemaDocError> {
        match self {
            SchemaDoc::Leaf(leaf) => Ok(Node::leaf(leaf.into())),
            SchemaDoc::Struct(StructDoc { fields: st_fields, index: st_index }) => {
                let mut seen = BTreeSet::new();
                let mut fields = Vec::with_capacity(st_fields.len());
                for field in st_fields {
                    if !seen.insert(field.name.clone()) {
                        return Err(SchemaDocError::DuplicateField { name: field.name, at: at.to_string() });
                    }
                    let child = format!("{at}.{}", field.name);
                    fields.push(PropertySignature {
                        ty: field.ty.lower(&child)?,
                        name: field.name,
                        optional: field.optional,
                        readonly: field.readonly,
                        rename: field.rename,
                        annotations: field.annotations,
                    });
                }
                let mut st = StructType::new(fields);
                if let Some(index) = st_index {
                    st = st.with_index(IndexSignature {
                        key: index.key.map_or(LeafKind::String, LeafKind::from),
                        value: index.ty.lower(&format!("{at}[..]"))?,
                        readonly: index.readonly,
                    });
                }
                Ok(Node::Struct(st))
            }
            SchemaDoc::Tuple(tuple) => {
                let elements = tuple.elements.into_iter().enumerate().map(|(index, el)| -> Result<_, SchemaDocError> {
                    Ok(TupleElement { ty: el.ty.lower(&format!("{at}[{index}]"))?, optional: el.optional })
                }).collect::<Result<Vec<_>, _>>()?;
                let rest = match tuple.rest {
                    Some(rest) => Some(Box::new(rest.lower(&format!("{at}[..]"))?)),
                    None => None,
                };
                Ok(Node::Tuple(TupleType { elements, rest, readonly: tuple.readonly }))
            }
            SchemaDoc::Codec(CodecDoc::DateFromString) => Ok(DateFromString::node()),
            SchemaDoc::Codec(CodecDoc::BooleanFromLiteral { truthy, falsy }) => {
                Ok(BooleanFromLiteral::new(truthy, falsy).node())
            }
        }
    }
}

impl From<LeafDoc> for LeafKind {
    fn from(leaf: LeafDoc) -> Self {
        match leaf {
            LeafDoc::Unknown => LeafKind::Unknown,
            LeafDoc::Null => LeafKind::Null,
            LeafDoc::Boolean => LeafKind::Boolean,
            LeafDoc::Number => LeafKind::Number,
            LeafDoc::String => LeafKind::String,
            LeafDoc::Date => LeafKind::Date,
            LeafDoc::Named(name) => LeafKind::Named(name),
        }
    }
}
