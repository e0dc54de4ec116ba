//! Property tests: rewritten schemas round-trip values in both directions,
//! and schemas without renames gain no rename codecs.

use proptest::prelude::*;

use crate::ast::{LeafKind, Node, PropertySignature, TupleElement};
use crate::conversion::BooleanFromLiteral;
use crate::transcode::{decode, encode};
use crate::value::Value;

use super::{rewrite, RenameKeys};

/// A leaf schema paired with a value it accepts on the decoded side.
fn leaf() -> impl Strategy<Value = (Node, Value)> {
    prop_oneof![
        any::<bool>().prop_map(|b| (Node::leaf(LeafKind::Boolean), Value::Bool(b))),
        any::<i64>().prop_map(|n| (Node::leaf(LeafKind::Number), Value::from(n))),
        "[a-z]{0,8}".prop_map(|s| (Node::leaf(LeafKind::String), Value::String(s))),
        any::<bool>().prop_map(|b| (BooleanFromLiteral::yes_no().node(), Value::Bool(b))),
    ]
}

/// Fields are named `f0`, `f1`, …; renames are `r_<tag>_<index>` so they can
/// never collide with each other or with an unrenamed sibling.
fn build_struct(fields: Vec<((Node, Value), Option<String>)>) -> (Node, Value) {
    let mut signatures = Vec::with_capacity(fields.len());
    let mut entries = Vec::with_capacity(fields.len());
    for (index, ((ty, value), tag)) in fields.into_iter().enumerate() {
        let name = format!("f{index}");
        let mut ps = PropertySignature::new(name.clone(), ty);
        if let Some(tag) = tag {
            ps = ps.renamed(format!("r_{tag}_{index}"));
        }
        signatures.push(ps);
        entries.push((name, value));
    }
    (Node::structure(signatures), Value::object(entries))
}

fn build_tuple(items: Vec<(Node, Value)>) -> (Node, Value) {
    let (types, values): (Vec<_>, Vec<_>) = items.into_iter().unzip();
    (
        Node::tuple(types.into_iter().map(TupleElement::required), None),
        Value::Array(values),
    )
}

fn schema_and_value(rename: BoxedStrategy<Option<String>>) -> impl Strategy<Value = (Node, Value)> {
    leaf().prop_recursive(4, 32, 4, move |inner| {
        prop_oneof![
            proptest::collection::vec((inner.clone(), rename.clone()), 1..5).prop_map(build_struct),
            proptest::collection::vec(inner, 0..4).prop_map(build_tuple),
        ]
    })
}

fn some_renamed() -> BoxedStrategy<Option<String>> {
    proptest::option::of("[a-z]{1,3}").boxed()
}

fn never_renamed() -> BoxedStrategy<Option<String>> {
    Just(None).boxed()
}

fn rename_codecs(node: &Node) -> usize {
    match node {
        Node::Leaf(_) => 0,
        Node::Struct(st) => {
            st.fields.iter().map(|ps| rename_codecs(&ps.ty)).sum::<usize>()
                + st.index.as_deref().map_or(0, |index| rename_codecs(&index.value))
        }
        Node::Tuple(tuple) => {
            tuple.elements.iter().map(|el| rename_codecs(&el.ty)).sum::<usize>()
                + tuple.rest.as_deref().map_or(0, rename_codecs)
        }
        Node::Codec(codec) => {
            let own = usize::from(codec.conversion.name() == RenameKeys::NAME);
            own + rename_codecs(&codec.source) + rename_codecs(&codec.target)
        }
    }
}

proptest! {
    #[test]
    fn decode_inverts_encode((schema, value) in schema_and_value(some_renamed())) {
        let renamed = rewrite(&schema).unwrap();
        let wire = encode(&renamed, &value).unwrap();
        prop_assert_eq!(decode(&renamed, &wire).unwrap(), value);
    }

    #[test]
    fn encode_inverts_decode((schema, value) in schema_and_value(some_renamed())) {
        let renamed = rewrite(&schema).unwrap();
        let wire = encode(&renamed, &value).unwrap();
        let back = decode(&renamed, &wire).unwrap();
        prop_assert_eq!(encode(&renamed, &back).unwrap(), wire);
    }

    #[test]
    fn no_renames_means_no_rename_codecs((schema, value) in schema_and_value(never_renamed())) {
        let rewritten = rewrite(&schema).unwrap();
        prop_assert_eq!(rename_codecs(&rewritten), 0);
        prop_assert_eq!(rewritten.kind(), schema.kind());
        // Without renames both directions agree with the original tree.
        prop_assert_eq!(encode(&rewritten, &value).unwrap(), encode(&schema, &value).unwrap());
    }
}
