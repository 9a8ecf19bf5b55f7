//! Ordering of installed artifacts and the keep window used by clean.

use crate::version::{VersionOrder, compare_versions};

use super::report::InstalledArtifact;

/// Sort oldest to newest.
pub fn sort_installed(order: VersionOrder, items: &mut [InstalledArtifact]) {
    match order {
        VersionOrder::Lexicographic => items.sort_by(|a, b| a.file_name.cmp(&b.file_name)),
        VersionOrder::Semantic => items.sort_by(|a, b| {
            compare_versions(&a.version, &b.version).then_with(|| a.file_name.cmp(&b.file_name))
        }),
    }
}

/// Split sorted, non-current artifacts into `(remove, keep)`, keeping the
/// newest `keep`.
pub fn split_for_clean(
    mut sorted: Vec<InstalledArtifact>,
    keep: usize,
) -> (Vec<InstalledArtifact>, Vec<InstalledArtifact>) {
    let cut = sorted.len().saturating_sub(keep);
    let kept = sorted.split_off(cut);
    (sorted, kept)
}
