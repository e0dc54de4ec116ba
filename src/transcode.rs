//! Drive a value through a schema tree in either direction.
//!
//! This is the minimal "consuming framework" for rewritten schemas: structs
//! pick out their declared fields, tuples walk their slots, codecs run their
//! conversion between the two sides, and leaves pass values through (leaf
//! validation is not this crate's concern).
//!
//! Error paths are JSON pointers into the value handed in: decoding reports
//! encoded keys, encoding reports decoded ones.
use crate::ast::{CodecType, Node, StructType, TupleType};
use crate::conversion::Conversion;
use crate::error::{Side, TranscodeError};
use crate::value::{Object, Value};

/// Decoded-side value → encoded-side value.
pub fn encode(node: &Node, value: &Value) -> Result<Value, TranscodeError> {
    walk(node, value, Direction::Encode, "", None)
}

/// Encoded-side value → decoded-side value.
pub fn decode(node: &Node, value: &Value) -> Result<Value, TranscodeError> {
    walk(node, value, Direction::Decode, "", None)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encode,
    Decode,
}

impl Direction {
    /// The side whose keys the input is expected to carry.
    fn input_side(self) -> Side {
        match self {
            Direction::Encode => Side::Decoded,
            Direction::Decode => Side::Encoded,
        }
    }
}

/// Set on the far side of a key-renaming conversion: a struct's field names
/// there differ from the keys of the original input.
#[derive(Clone, Copy)]
struct Rekey<'a> {
    conversion: &'a dyn Conversion,
    side: Side,
}

/// The input's key for a field named `key` at this level.
fn input_key<'k>(rekey: Option<Rekey<'k>>, key: &'k str) -> &'k str {
    rekey.and_then(|r| r.conversion.key_on(key, r.side)).unwrap_or(key)
}

fn walk(
    node: &Node,
    value: &Value,
    dir: Direction,
    path: &str,
    rekey: Option<Rekey<'_>>,
) -> Result<Value, TranscodeError> {
    match node {
        Node::Leaf(_) => Ok(value.clone()),
        Node::Struct(st) => walk_struct(st, value, dir, path, rekey),
        Node::Tuple(tuple) => walk_tuple(tuple, value, dir, path),
        Node::Codec(codec) => walk_codec(codec, value, dir, path),
    }
}

fn walk_struct(
    st: &StructType,
    value: &Value,
    dir: Direction,
    path: &str,
    rekey: Option<Rekey<'_>>,
) -> Result<Value, TranscodeError> {
    let object = value.as_object().ok_or_else(|| TranscodeError::TypeMismatch {
        path: path.to_string(),
        expected: "object",
        found: value.kind(),
    })?;
    let mut out = Object::with_capacity(object.len());
    for ps in &st.fields {
        match object.get(&ps.name) {
            Some(field) => {
                let field = walk(&ps.ty, field, dir, &child_path(path, input_key(rekey, &ps.name)), None)?;
                out.insert(ps.name.clone(), field);
            }
            None if ps.optional => {}
            None => {
                return Err(TranscodeError::StructuralMismatch {
                    path: path.to_string(),
                    key: input_key(rekey, &ps.name).to_string(),
                    side: dir.input_side(),
                });
            }
        }
    }
    // Undeclared keys go through the index signature, or are dropped.
    if let Some(index) = &st.index {
        for (key, field) in object {
            if st.field(key).is_some() {
                continue;
            }
            let field = walk(&index.value, field, dir, &child_path(path, key), None)?;
            out.insert(key.clone(), field);
        }
    }
    Ok(Value::Object(out))
}

fn walk_tuple(tuple: &TupleType, value: &Value, dir: Direction, path: &str) -> Result<Value, TranscodeError> {
    let items = value.as_array().ok_or_else(|| TranscodeError::TypeMismatch {
        path: path.to_string(),
        expected: "array",
        found: value.kind(),
    })?;

    let required = tuple.elements.iter().filter(|el| !el.optional).count();
    let fixed = tuple.elements.len();
    if items.len() < required || (tuple.rest.is_none() && items.len() > fixed) {
        let expected = match (&tuple.rest, required == fixed) {
            (Some(_), _) => format!("at least {required}"),
            (None, true) => fixed.to_string(),
            (None, false) => format!("{required} to {fixed}"),
        };
        return Err(TranscodeError::TupleArity {
            path: path.to_string(),
            expected,
            found: items.len(),
        });
    }

    let slots = tuple.elements.iter()
        .map(|el| &el.ty)
        .chain(tuple.rest.as_deref().into_iter().cycle());
    let out = items.iter().zip(slots).enumerate()
        .map(|(index, (item, ty))| walk(ty, item, dir, &child_path(path, &index.to_string()), None))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(out))
}

fn walk_codec(codec: &CodecType, value: &Value, dir: Direction, path: &str) -> Result<Value, TranscodeError> {
    // Past the conversion, field names are mapped back to input keys.
    let rekey = Some(Rekey { conversion: &*codec.conversion, side: dir.input_side() });
    match dir {
        Direction::Decode => {
            let source = walk(&codec.source, value, dir, path, None)?;
            let target = codec.conversion.decode(&source).map_err(|e| e.prefixed(path))?;
            walk(&codec.target, &target, dir, path, rekey)
        }
        Direction::Encode => {
            let target = walk(&codec.target, value, dir, path, None)?;
            let source = codec.conversion.encode(&target).map_err(|e| e.prefixed(path))?;
            walk(&codec.source, &source, dir, path, rekey)
        }
    }
}

/// Append one JSON-pointer segment (`~` and `/` escaped).
fn child_path(path: &str, segment: &str) -> String {
    let escaped = segment.replace('~', "~0").replace('/', "~1");
    format!("{path}/{escaped}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{IndexSignature, LeafKind, PropertySignature, TupleElement};
    use crate::conversion::BooleanFromLiteral;
    use crate::rewrite::rewrite;

    fn flag() -> Node { BooleanFromLiteral::yes_no().node() }

    #[test]
    fn errors_point_into_nested_renamed_structs() {
        let schema = rewrite(&Node::structure([PropertySignature::new(
            "outer",
            Node::structure([PropertySignature::new("on", flag()).renamed("is_on")]),
        ).renamed("OUTER")])).unwrap();

        let wire = Value::object([("OUTER", Value::object([("is_on", Value::from("maybe"))]))]);
        let err = decode(&schema, &wire).unwrap_err();
        assert!(matches!(err, TranscodeError::Conversion { .. }));
        assert_eq!(err.path(), "/OUTER/is_on");
        assert!(resolves(&wire, &err));

        let wire = Value::object([("OUTER", Value::object([("on", Value::from("Y"))]))]);
        let err = decode(&schema, &wire).unwrap_err();
        assert_eq!(err, TranscodeError::StructuralMismatch {
            path: "/OUTER".into(),
            key: "is_on".into(),
            side: Side::Encoded,
        });
        assert!(resolves(&wire, &err));
    }

    #[test]
    fn encode_errors_use_decoded_keys() {
        let schema = rewrite(&Node::structure([PropertySignature::new(
            "outer",
            Node::structure([PropertySignature::new("on", flag()).renamed("is_on")]),
        ).renamed("OUTER")])).unwrap();

        let doc = Value::object([("outer", Value::object([("on", Value::from("maybe"))]))]);
        let err = encode(&schema, &doc).unwrap_err();
        assert_eq!(err.path(), "/outer/on");
        assert!(resolves(&doc, &err));
    }

    #[test]
    fn open_keys_walk_the_index_type() {
        let schema = Node::record(
            [PropertySignature::new("id", Node::leaf(LeafKind::Number))],
            IndexSignature::new(LeafKind::String, flag()),
        );
        let wire = Value::object([("id", Value::from(1i64)), ("beta", Value::from("N"))]);
        let doc = decode(&schema, &wire).unwrap();
        assert_eq!(doc, Value::object([("id", Value::from(1i64)), ("beta", Value::Bool(false))]));
        assert_eq!(encode(&schema, &doc).unwrap(), wire);

        let wire = Value::object([("id", Value::from(1i64)), ("beta", Value::from("?"))]);
        let err = decode(&schema, &wire).unwrap_err();
        assert_eq!(err.path(), "/beta");
    }

    #[test]
    fn closed_structs_drop_undeclared_keys() {
        let schema = Node::structure([PropertySignature::new("id", Node::leaf(LeafKind::Number))]);
        let out = decode(&schema, &Value::object([("id", Value::from(1i64)), ("x", Value::Null)])).unwrap();
        assert_eq!(out, Value::object([("id", Value::from(1i64))]));
    }

    fn resolves(input: &Value, err: &TranscodeError) -> bool {
        serde_json::Value::from(input.clone()).pointer(err.path()).is_some()
    }

    #[test]
    fn sibling_structs_fail_independently() {
        let schema = rewrite(&Node::structure([
            PropertySignature::new("l", Node::structure([PropertySignature::new("x", flag()).renamed("X")])),
            PropertySignature::new("r", Node::structure([PropertySignature::new("y", flag()).renamed("Y")])),
        ])).unwrap();

        let good = Value::object([("Y", Value::from("N"))]);
        let bad = Value::object([("wrong", Value::from("N"))]);
        let ok = decode(&schema, &Value::object([
            ("l", Value::object([("X", Value::from("Y"))])),
            ("r", good.clone()),
        ])).unwrap();
        assert_eq!(ok.get("r").unwrap().get("y"), Some(&Value::Bool(false)));

        let err = decode(&schema, &Value::object([("l", bad), ("r", good)])).unwrap_err();
        assert_eq!(err.path(), "/l");
    }

    #[test]
    fn optional_struct_fields_may_be_absent() {
        let schema = Node::structure([
            PropertySignature::new("a", Node::leaf(LeafKind::Number)),
            PropertySignature::new("b", Node::leaf(LeafKind::Number)).optional(),
        ]);
        let v = Value::object([("a", Value::from(1i64))]);
        assert_eq!(encode(&schema, &v).unwrap(), v);

        let err = encode(&schema, &Value::object([("b", Value::from(1i64))])).unwrap_err();
        assert!(matches!(err, TranscodeError::StructuralMismatch { side: Side::Decoded, .. }));
    }

    #[test]
    fn tuple_arity_is_checked() {
        let pair = Node::tuple(
            [TupleElement::required(Node::unknown()), TupleElement::optional(Node::unknown())],
            None,
        );
        assert!(decode(&pair, &Value::from(vec![Value::Null])).is_ok());
        let err = decode(&pair, &Value::from(vec![Value::Null; 3])).unwrap_err();
        assert_eq!(err.to_string(), "expected 1 to 2 tuple element(s), found 3 at /");

        let list = Node::tuple([TupleElement::required(flag())], Some(flag()));
        let out = decode(&list, &Value::from(vec![Value::from("Y"), Value::from("N"), Value::from("Y")])).unwrap();
        assert_eq!(out, Value::from(vec![Value::Bool(true), Value::Bool(false), Value::Bool(true)]));
        let err = decode(&list, &Value::Array(Vec::new())).unwrap_err();
        assert!(matches!(err, TranscodeError::TupleArity { found: 0, .. }));
    }

    #[test]
    fn tuple_errors_name_the_slot() {
        let list = Node::tuple(Vec::new(), Some(flag()));
        let err = decode(&list, &Value::from(vec![Value::from("Y"), Value::from("?")])).unwrap_err();
        assert_eq!(err.path(), "/1");
    }

    #[test]
    fn pointer_segments_are_escaped() {
        assert_eq!(child_path("", "a/b"), "/a~1b");
        assert_eq!(child_path("/x", "m~n"), "/x/m~0n");
    }
}
