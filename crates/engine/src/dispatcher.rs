//! Menu rendering and selection resolution.

use conch_core::{Command, Registry};
use thiserror::Error;

/// Input that does not name a command in the current menu.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Selection <{raw}> is not a valid option, try again")]
pub struct InvalidSelection {
    /// The text the user typed.
    pub raw: String,
}

/// Renders the menu as `N) description` lines, numbered from 1.
pub fn render(registry: &Registry) -> Vec<String> {
    registry
        .descriptions()
        .enumerate()
        .map(|(pos, description)| format!("{}) {}", pos + 1, description))
        .collect()
}

/// Returns true if `raw` is a 1-based selection within `size` entries.
///
/// Only plain decimal digits are accepted: no sign, no whitespace, no
/// fraction.
pub fn validate(raw: &str, size: usize) -> bool {
    selection_index(raw, size).is_some()
}

/// Resolves `raw` to the registry entry it selects.
pub fn resolve<'r>(
    raw: &str,
    registry: &'r mut Registry,
) -> Result<&'r mut (dyn Command + 'static), InvalidSelection> {
    let invalid = || InvalidSelection {
        raw: raw.to_string(),
    };

    let index = selection_index(raw, registry.len()).ok_or_else(invalid)?;
    registry.get_mut(index).ok_or_else(invalid)
}

fn selection_index(raw: &str, size: usize) -> Option<usize> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    // Digit strings too large for usize are out of range anyway.
    let selection: usize = raw.parse().ok()?;
    let index = selection.checked_sub(1)?;
    (index < size).then_some(index)
}
