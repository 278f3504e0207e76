//! meshcalc-wire — the cross-implementation matrix wire format.
//!
//! Matrices travel between services as a pair of RPC fields:
//!
//! - a shape descriptor, the ASCII string `"<rows>,<cols>"`, and
//! - a payload of raw big-endian 4-byte two's-complement integers,
//!   row-major, no padding or separators.
//!
//! Every participating implementation, regardless of language, must encode
//! exactly this layout; it is the sole interoperability guarantee of the
//! system, so the tests here pin exact byte sequences rather than relying
//! on round-trips alone.

pub mod codec;
pub mod error;

pub use codec::{decode, encode, shape_of, Matrix};
pub use error::{WireError, WireResult};
