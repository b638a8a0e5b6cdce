// Thin namespace wrapper for API-layer components
pub mod handlers {
    pub use crate::handlers::*;
}

pub mod meta_lead_handler {
    pub use crate::meta_lead_handler::*;
}
