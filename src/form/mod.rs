mod simulated;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub use simulated::{OptionCatalog, SimulatedPage};

/// Attribute set on the other-domain field when it was deliberately left empty.
pub const EXPLICIT_NONE_ATTRIBUTE: &str = "data-na";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Area,
    Segment,
    Domain,
    OtherDomain,
}

impl FieldId {
    pub const ALL: [FieldId; 4] = [
        FieldId::Area,
        FieldId::Segment,
        FieldId::Domain,
        FieldId::OtherDomain,
    ];

    /// Stable element id of the field on the page.
    pub fn element_id(self) -> &'static str {
        match self {
            FieldId::Area => "microarea",
            FieldId::Segment => "segmento",
            FieldId::Domain => "dominio",
            FieldId::OtherDomain => "dominio_outros",
        }
    }

    pub fn is_multi(self) -> bool {
        matches!(self, FieldId::Domain | FieldId::OtherDomain)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.element_id())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum FormError {
    #[error("form element '{0}' not found")]
    MissingElement(&'static str),
}

/// Current value(s) of one field.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct FieldState {
    pub values: Vec<String>,
}

impl FieldState {
    pub fn is_populated(&self) -> bool {
        self.values.iter().any(|value| !value.trim().is_empty())
    }
}

/// The four dependent fields as the surrounding page exposes them.
///
/// Writes behave like setting the value of a select: the stored value is
/// whatever is written. Option lists are owned by the populator.
pub trait FormFields: Send + Sync {
    fn state(&self, field: FieldId) -> Result<FieldState, FormError>;

    fn set_values(&self, field: FieldId, values: &[String]) -> Result<(), FormError>;

    fn options(&self, field: FieldId) -> Result<Vec<String>, FormError>;

    fn has_class(&self, field: FieldId, class: &str) -> bool;

    fn set_attribute(&self, field: FieldId, name: &str, value: &str) -> Result<(), FormError>;

    /// Fires the field's `change` listeners.
    fn dispatch_change(&self, field: FieldId);

    /// Re-renders an enhanced multi-select widget after its value changed.
    fn refresh_widget(&self, _field: FieldId) {}
}
