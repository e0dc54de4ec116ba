//! Codec synthesis for structs with renamed fields.
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{CodecType, IndexSignature, Node, PropertySignature, StructType};
use crate::conversion::Conversion;
use crate::error::{RewriteError, Side, TranscodeError};
use crate::value::{Object, Value};

use super::rewrite;

/// Original field name → encoded field name, for one struct level only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTable {
    entries: IndexMap<String, String>,
}

impl RenameTable {
    /// Collect the renames declared directly on `st`'s fields.
    pub fn scan(st: &StructType) -> Self {
        let entries = st.fields.iter()
            .filter_map(|ps| ps.rename.as_ref().map(|encoded| (ps.name.clone(), encoded.clone())))
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn len(&self) -> usize { self.entries.len() }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries.get(field).map(String::as_str)
    }

    /// Key used on the encoded side; unrenamed fields keep their name.
    pub fn encoded_name<'a>(&'a self, field: &'a str) -> &'a str {
        self.get(field).unwrap_or(field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyMapping {
    decoded: String,
    encoded: String,
    optional: bool,
}

impl KeyMapping {
    fn key(&self, side: Side) -> &str {
        match side {
            Side::Encoded => &self.encoded,
            Side::Decoded => &self.decoded,
        }
    }
}

/// Key-remapping conversion between a renamed struct's two sides.
///
/// Declared fields are carried across under their other-side key. Any other
/// key is kept verbatim when the struct has an index signature and dropped
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameKeys {
    mappings: Vec<KeyMapping>,
    open: bool,
}

impl RenameKeys {
    pub const NAME: &'static str = "rename-keys";

    pub fn new(st: &StructType, table: &RenameTable) -> Self {
        let mappings = st.fields.iter().map(|ps| KeyMapping {
            decoded: ps.name.clone(),
            encoded: table.encoded_name(&ps.name).to_string(),
            optional: ps.optional,
        }).collect();
        Self { mappings, open: st.index.is_some() }
    }

    fn declares(&self, key: &str, side: Side) -> bool {
        self.mappings.iter().any(|m| m.key(side) == key)
    }

    fn remap(&self, input: &Value, from: Side) -> Result<Value, TranscodeError> {
        let object = input.as_object().ok_or_else(|| TranscodeError::TypeMismatch {
            path: String::new(),
            expected: "object",
            found: input.kind(),
        })?;
        let to = from.opposite();
        let mut out = Object::with_capacity(object.len());
        for mapping in &self.mappings {
            let read = mapping.key(from);
            match object.get(read) {
                Some(value) => {
                    out.insert(mapping.key(to).to_string(), value.clone());
                }
                None if mapping.optional => {}
                None => {
                    return Err(TranscodeError::StructuralMismatch {
                        path: String::new(),
                        key: read.to_string(),
                        side: from,
                    });
                }
            }
        }
        if !self.open {
            return Ok(Value::Object(out));
        }
        for (key, value) in object {
            if self.declares(key, from) {
                continue;
            }
            if self.declares(key, to) {
                return Err(TranscodeError::KeyCollision { path: String::new(), key: key.clone() });
            }
            out.insert(key.clone(), value.clone());
        }
        Ok(Value::Object(out))
    }
}

impl Conversion for RenameKeys {
    fn name(&self) -> &str { Self::NAME }

    fn decode(&self, input: &Value) -> Result<Value, TranscodeError> {
        self.remap(input, Side::Encoded)
    }

    fn encode(&self, input: &Value) -> Result<Value, TranscodeError> {
        self.remap(input, Side::Decoded)
    }

    fn key_on(&self, key: &str, side: Side) -> Option<&str> {
        self.mappings.iter()
            .find(|m| m.key(side.opposite()) == key)
            .map(|m| m.key(side))
    }
}

/// Build the codec standing in for `st`, given its non-empty rename table.
///
/// The encoded side lists every field under its encoded name with an
/// `Unknown` type; the decoded side keeps original names and rewritten
/// types. Fields that would share an encoded key are rejected.
pub fn synthesize(st: &StructType, table: &RenameTable) -> Result<CodecType, RewriteError> {
    let mut claimed: IndexMap<&str, &str> = IndexMap::with_capacity(st.fields.len());
    for ps in &st.fields {
        let encoded = table.encoded_name(&ps.name);
        if let Some(first) = claimed.insert(encoded, ps.name.as_str()) {
            return Err(RewriteError::AnnotationConflict {
                encoded: encoded.to_string(),
                first: first.to_string(),
                second: ps.name.clone(),
            });
        }
    }

    let source = st.fields.iter().map(|ps| PropertySignature {
        name: table.encoded_name(&ps.name).to_string(),
        ty: Node::unknown(),
        optional: ps.optional,
        readonly: ps.readonly,
        rename: None,
        annotations: ps.annotations.clone(),
    }).collect::<Vec<_>>();

    let target = st.fields.iter().map(|ps| -> Result<_, RewriteError> {
        Ok(PropertySignature {
            name: ps.name.clone(),
            ty: rewrite(&ps.ty)?,
            optional: ps.optional,
            readonly: ps.readonly,
            rename: None,
            annotations: ps.annotations.clone(),
        })
    }).collect::<Result<Vec<_>, _>>()?;

    // Open keys stay untyped on the encoded side, like the declared fields.
    let (source_index, target_index) = match st.index.as_deref() {
        Some(index) => {
            let side = |value| Some(Box::new(IndexSignature {
                key: index.key.clone(),
                value,
                readonly: index.readonly,
            }));
            (side(Node::unknown()), side(rewrite(&index.value)?))
        }
        None => (None, None),
    };

    let conversion = RenameKeys::new(st, table);

    debug!(
        fields = st.fields.len(),
        renamed = table.len(),
        "synthesized rename codec"
    );

    Ok(CodecType {
        source: Box::new(Node::Struct(StructType { fields: source, index: source_index })),
        target: Box::new(Node::Struct(StructType { fields: target, index: target_index })),
        conversion: Arc::new(conversion),
    })
}
