use serde::{Deserialize, Serialize};

/// Three-state update for an optional field.
///
/// A partial update has to distinguish "leave the description alone" from
/// "clear the description", which a plain `Option` cannot express.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Patch<T> {
    /// Keep the existing value.
    Keep,
    /// Replace the value.
    Set(T),
    /// Clear the field back to `None`.
    Clear,
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    pub fn apply_to(self, field: &mut Option<T>) {
        match self {
            Patch::Keep => {}
            Patch::Set(value) => *field = Some(value),
            Patch::Clear => *field = None,
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, Patch::Keep)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_leaves_field_untouched() {
        let mut field = Some("before".to_string());
        Patch::Keep.apply_to(&mut field);
        assert_eq!(field, Some("before".to_string()));
    }

    #[test]
    fn test_set_replaces_value() {
        let mut field = None;
        Patch::Set("after".to_string()).apply_to(&mut field);
        assert_eq!(field, Some("after".to_string()));
    }

    #[test]
    fn test_clear_empties_field() {
        let mut field = Some("before".to_string());
        Patch::<String>::Clear.apply_to(&mut field);
        assert_eq!(field, None);
    }

    #[test]
    fn test_is_change() {
        assert!(!Patch::<String>::Keep.is_change());
        assert!(Patch::Set("x".to_string()).is_change());
        assert!(Patch::<String>::Clear.is_change());
    }
}
