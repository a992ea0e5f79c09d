//! YAML document model, decoding and encoding.
//!
//! Decoding produces one `Document` node per document in the stream, keeping
//! the presentation details (styles, tags, anchors, comments) that patching
//! must not lose. Encoding writes the tree back out.

mod comments;
pub mod emitter;
pub mod node;
pub mod parser;
pub mod scalar;
pub mod stream;

pub use emitter::{emit_document, emit_stream, EmitOptions};
pub use node::{NodeKind, NodeStyle, YamlNode, YamlValue};
pub use parser::{parse_yaml_document, parse_yaml_stream};
pub use stream::YamlStream;
