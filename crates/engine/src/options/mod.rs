//! Option sources, item mapping and the surrogate codec.

mod codec;
mod items;
mod source;

pub use codec::ValueCodec;
pub use items::{ItemMapper, MappedItems, element_key};
pub use source::{OptionSource, RemoteSource, RemoteTarget};
