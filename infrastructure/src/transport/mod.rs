//! Transport plumbing: framing events onto a byte stream and decoding them
//! back, byte-safe across arbitrary chunk boundaries.

mod decoder;
mod framing;
mod line_assembler;

pub use decoder::{StreamDecoder, decode_stream};
pub use framing::{EventWriter, FrameError, FrameStyle, encode_frame};
pub use line_assembler::LineAssembler;
