// Schema AST. Closed set of node kinds; every pass matches exhaustively.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{json, Value as Json};

use crate::conversion::Conversion;

/// Opaque metadata carried through rewriting untouched.
pub type Annotations = IndexMap<String, Json>;

#[derive(Debug, Clone)]
pub enum Node {
    Leaf(LeafKind),
    Struct(StructType),
    Tuple(TupleType),
    Codec(CodecType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafKind {
    Unknown,                 // any value; placeholder on the encoded side of rename codecs
    Null,
    Boolean,
    Number,
    String,
    Date,
    Named(String),           // externally defined primitive
}

#[derive(Debug, Clone, Default)]
pub struct StructType {
    pub fields: Vec<PropertySignature>, // declaration order; names unique
    pub index: Option<Box<IndexSignature>>, // open keys beyond `fields`
}

/// Type of the keys a struct accepts besides its declared fields.
#[derive(Debug, Clone)]
pub struct IndexSignature {
    pub key: LeafKind,
    pub value: Node,
    pub readonly: bool,
}

#[derive(Debug, Clone)]
pub struct PropertySignature {
    pub name: String,
    pub ty: Node,
    pub optional: bool,
    pub readonly: bool,
    pub rename: Option<String>, // key to use on the encoded side
    pub annotations: Annotations,
}

#[derive(Debug, Clone, Default)]
pub struct TupleType {
    pub elements: Vec<TupleElement>,
    pub rest: Option<Box<Node>>, // homogeneous trailing elements
    pub readonly: bool,
}

#[derive(Debug, Clone)]
pub struct TupleElement {
    pub ty: Node,
    pub optional: bool,
}

/// A transformation between two shapes.
///
/// `source` is the encoded side, `target` the decoded side; `conversion`
/// moves values between them (`decode`: source → target, `encode`: the
/// reverse).
#[derive(Debug, Clone)]
pub struct CodecType {
    pub source: Box<Node>,
    pub target: Box<Node>,
    pub conversion: Arc<dyn Conversion>,
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl Node {
    pub fn leaf(kind: LeafKind) -> Self { Node::Leaf(kind) }
    pub fn unknown() -> Self { Node::Leaf(LeafKind::Unknown) }

    pub fn structure(fields: impl IntoIterator<Item = PropertySignature>) -> Self {
        Node::Struct(StructType::new(fields))
    }

    /// A struct whose undeclared keys all hold `index.value`.
    pub fn record(fields: impl IntoIterator<Item = PropertySignature>, index: IndexSignature) -> Self {
        Node::Struct(StructType::new(fields).with_index(index))
    }

    pub fn tuple(elements: impl IntoIterator<Item = TupleElement>, rest: Option<Node>) -> Self {
        Node::Tuple(TupleType {
            elements: elements.into_iter().collect(),
            rest: rest.map(Box::new),
            readonly: false,
        })
    }

    pub fn codec(source: Node, target: Node, conversion: Arc<dyn Conversion>) -> Self {
        Node::Codec(CodecType {
            source: Box::new(source),
            target: Box::new(target),
            conversion,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Leaf(_) => "leaf",
            Node::Struct(_) => "struct",
            Node::Tuple(_) => "tuple",
            Node::Codec(_) => "codec",
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            Node::Struct(st) => Some(st),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&TupleType> {
        match self {
            Node::Tuple(tuple) => Some(tuple),
            _ => None,
        }
    }

    pub fn as_codec(&self) -> Option<&CodecType> {
        match self {
            Node::Codec(codec) => Some(codec),
            _ => None,
        }
    }
}

impl StructType {
    pub fn new(fields: impl IntoIterator<Item = PropertySignature>) -> Self {
        Self { fields: fields.into_iter().collect(), index: None }
    }

    pub fn with_index(mut self, index: IndexSignature) -> Self {
        self.index = Some(Box::new(index));
        self
    }

    pub fn field(&self, name: &str) -> Option<&PropertySignature> {
        self.fields.iter().find(|ps| ps.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|ps| ps.name.as_str())
    }
}

impl PropertySignature {
    pub fn new(name: impl Into<String>, ty: Node) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            readonly: false,
            rename: None,
            annotations: Annotations::new(),
        }
    }

    pub fn renamed(mut self, encoded: impl Into<String>) -> Self {
        self.rename = Some(encoded.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn annotate(mut self, key: impl Into<String>, value: Json) -> Self {
        self.annotations.insert(key.into(), value);
        self
    }
}

impl IndexSignature {
    pub fn new(key: LeafKind, value: Node) -> Self {
        Self { key, value, readonly: false }
    }
}

impl TupleElement {
    pub fn required(ty: Node) -> Self { Self { ty, optional: false } }
    pub fn optional(ty: Node) -> Self { Self { ty, optional: true } }
}

// ————————————————————————————————————————————————————————————————————————————
// DEBUG VIEW
// ————————————————————————————————————————————————————————————————————————————

impl LeafKind {
    pub fn name(&self) -> &str {
        match self {
            LeafKind::Unknown => "unknown",
            LeafKind::Null => "null",
            LeafKind::Boolean => "boolean",
            LeafKind::Number => "number",
            LeafKind::String => "string",
            LeafKind::Date => "date",
            LeafKind::Named(name) => name,
        }
    }
}

impl Node {
    /// JSON rendering of the tree, for `inspect` and test diagnostics.
    pub fn view(&self) -> Json {
        match self {
            Node::Leaf(kind) => json!({ "leaf": kind.name() }),
            Node::Struct(st) => {
                let fields = st.fields.iter().map(|ps| {
                    let mut o = json!({ "name": ps.name, "type": ps.ty.view() });
                    if ps.optional { o["optional"] = Json::Bool(true); }
                    if ps.readonly { o["readonly"] = Json::Bool(true); }
                    if let Some(encoded) = &ps.rename { o["rename"] = Json::from(encoded.clone()); }
                    if !ps.annotations.is_empty() {
                        o["annotations"] = Json::Object(
                            ps.annotations.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                        );
                    }
                    o
                }).collect::<Vec<_>>();
                match &st.index {
                    None => json!({ "struct": fields }),
                    Some(index) => {
                        let mut sig = json!({ "key": index.key.name(), "type": index.value.view() });
                        if index.readonly { sig["readonly"] = Json::Bool(true); }
                        json!({ "struct": fields, "index": sig })
                    }
                }
            }
            Node::Tuple(tuple) => {
                let elements = tuple.elements.iter().map(|el| {
                    json!({ "type": el.ty.view(), "optional": el.optional })
                }).collect::<Vec<_>>();
                let mut o = json!({ "elements": elements });
                if let Some(rest) = &tuple.rest { o["rest"] = rest.view(); }
                if tuple.readonly { o["readonly"] = Json::Bool(true); }
                json!({ "tuple": o })
            }
            Node::Codec(codec) => json!({
                "codec": {
                    "conversion": codec.conversion.name(),
                    "source": codec.source.view(),
                    "target": codec.target.view(),
                }
            }),
        }
    }
}
