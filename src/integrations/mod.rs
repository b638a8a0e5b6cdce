//! External service integrations.

pub mod meta_client {
    pub use crate::meta_client::*;
}

pub mod meta_models {
    pub use crate::meta_models::*;
}

pub mod hashing {
    pub use crate::hashing::*;
}
