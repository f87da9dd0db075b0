//! Accessor contract installed on converted anchors.

use lf_url::Normalizer;
use std::rc::Rc;

/// Enforces `read(anchor.href)` is always canonical.
///
/// The binding routes both halves of the element's target property through
/// this value: reads normalize whatever is stored (the host may have called
/// `setAttribute` since), writes normalize before storing.
#[derive(Debug, Clone)]
pub struct HrefContract {
    normalizer: Rc<Normalizer>,
}

impl HrefContract {
    pub fn new(normalizer: Rc<Normalizer>) -> Self {
        Self { normalizer }
    }

    /// Value reported for a property read given the stored target.
    pub fn read(&self, stored: &str) -> String {
        self.normalizer.normalize(stored).into_owned()
    }

    /// Value to store for a property write.
    pub fn write(&self, assigned: &str) -> String {
        self.normalizer.normalize(assigned).into_owned()
    }
}
