//! Field-renaming rewrite over the schema AST.
//!
//! Walks a schema depth first and returns a new tree in which every struct
//! with at least one renamed field becomes a codec that remaps keys between
//! the encoded names and the original ones. Structs with no renamed fields
//! are rebuilt as plain structs, so a tree without renames keeps its shape.
//!
//! Rules per node kind:
//! - struct: renames are read from the struct's own fields only; nested
//!   structs get their own decision when their field type is rewritten.
//! - tuple: slots are positional, only their types are rewritten.
//! - codec: only `source` is rewritten; `target` and the conversion are
//!   carried over as-is.
//! - leaf: unchanged.
pub mod codec;

#[cfg(test)]
mod laws;

use std::sync::Arc;

use tracing::trace;

use crate::ast::{CodecType, IndexSignature, Node, PropertySignature, StructType, TupleElement, TupleType};
use crate::error::RewriteError;

pub use codec::{RenameKeys, RenameTable};

/// Rewrite `node`, returning a fresh tree. The input is left untouched.
pub fn rewrite(node: &Node) -> Result<Node, RewriteError> {
    match node {
        Node::Struct(st) => rewrite_struct(st),
        Node::Tuple(tuple) => rewrite_tuple(tuple).map(Node::Tuple),
        Node::Codec(codec) => Ok(Node::Codec(CodecType {
            source: Box::new(rewrite(&codec.source)?),
            target: codec.target.clone(),
            conversion: Arc::clone(&codec.conversion),
        })),
        Node::Leaf(_) => Ok(node.clone()),
    }
}

fn rewrite_struct(st: &StructType) -> Result<Node, RewriteError> {
    let table = RenameTable::scan(st);
    if table.is_empty() {
        trace!(fields = st.fields.len(), "no renamed fields, rebuilding struct");
        return rewrite_fields(st).map(Node::Struct);
    }
    codec::synthesize(st, &table).map(Node::Codec)
}

/// Same fields, same order, each type rewritten. The index signature's value
/// type is rewritten too.
fn rewrite_fields(st: &StructType) -> Result<StructType, RewriteError> {
    let fields = st.fields.iter().map(|ps| -> Result<_, RewriteError> {
        Ok(PropertySignature {
            name: ps.name.clone(),
            ty: rewrite(&ps.ty)?,
            optional: ps.optional,
            readonly: ps.readonly,
            rename: ps.rename.clone(),
            annotations: ps.annotations.clone(),
        })
    }).collect::<Result<Vec<_>, _>>()?;
    let index = match &st.index {
        Some(index) => Some(Box::new(IndexSignature {
            key: index.key.clone(),
            value: rewrite(&index.value)?,
            readonly: index.readonly,
        })),
        None => None,
    };
    Ok(StructType { fields, index })
}

fn rewrite_tuple(tuple: &TupleType) -> Result<TupleType, RewriteError> {
    let elements = tuple.elements.iter().map(|el| -> Result<_, RewriteError> {
        Ok(TupleElement { ty: rewrite(&el.ty)?, optional: el.optional })
    }).collect::<Result<Vec<_>, _>>()?;
    let rest = match &tuple.rest {
        Some(rest) => Some(Box::new(rewrite(rest)?)),
        None => None,
    };
    Ok(TupleType { elements, rest, readonly: tuple.readonly })
}

// ------------------------------- Tests ------------------------------------ //
