use crate::domain::entities::Stripe;
use crate::format::prelude::VFS_PLACEHOLDER;

/// Everything the upstream builder hands over for one run: the prelude
/// template and the stripe of payload entries
#[derive(Debug, Clone, Default)]
pub struct Backpack {
    pub prelude: String,
    pub stripe: Stripe,
}

impl Backpack {
    pub fn new(prelude: impl Into<String>, stripe: Stripe) -> Self {
        Self {
            prelude: prelude.into(),
            stripe,
        }
    }

    /// Whether the template will receive the index on substitution
    pub fn has_placeholder(&self) -> bool {
        self.prelude.contains(VFS_PLACEHOLDER)
    }
}
