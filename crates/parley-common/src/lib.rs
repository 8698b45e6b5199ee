pub mod code;
pub mod errors;
pub mod id;

pub use code::{generate_code, normalize_code, CODE_ALPHABET, CODE_LEN};
pub use errors::SessionError;
pub use id::PeerId;
