pub mod opaque;

pub use opaque::generate_token;
pub use opaque::hash_token;
pub use opaque::is_well_formed;
pub use opaque::TOKEN_HASH_LENGTH;
pub use opaque::TOKEN_LENGTH;
