// Form-layer modules and shared errors/models
pub mod validators {
    pub use crate::validators::*;
}

pub mod wizard {
    pub use crate::wizard::*;
    pub use crate::wizard_models::*;
}

pub mod submission {
    pub use crate::lead_models::*;
    pub use crate::submission::*;
}

pub mod conversion {
    pub use crate::conversion::*;
}

pub mod errors {
    pub use crate::errors::*;
}
