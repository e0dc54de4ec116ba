//! Schema field renaming.
//!
//! Rewrites a schema tree so that fields carrying a `rename` keep their
//! original names on the decoded side and use the renamed keys on the
//! encoded side, at every nesting level:
//!
//! ```
//! use schema_rename::{rewrite, transcode, Node, PropertySignature, LeafKind, Value};
//!
//! let schema = Node::structure([
//!     PropertySignature::new("user_id", Node::leaf(LeafKind::Number)).renamed("userId"),
//! ]);
//! let renamed = rewrite(&schema).unwrap();
//!
//! let doc = Value::object([("user_id", Value::from(7i64))]);
//! let wire = transcode::encode(&renamed, &doc).unwrap();
//! assert_eq!(wire, Value::object([("userId", Value::from(7i64))]));
//! assert_eq!(transcode::decode(&renamed, &wire).unwrap(), doc);
//! ```
pub mod ast;
pub mod conversion;
pub mod error;
pub mod rewrite;
pub mod schema_doc;
pub mod transcode;
pub mod value;

pub use ast::{CodecType, IndexSignature, LeafKind, Node, PropertySignature, StructType, TupleElement, TupleType};
pub use conversion::{BooleanFromLiteral, Conversion, DateFromString};
pub use error::{RewriteError, Side, TranscodeError};
pub use rewrite::rewrite;
pub use value::Value;
