use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, BitOrAssign};

use crate::memory_format::MemoryFormat;

/// Set of memory formats a caller is willing to accept.
///
/// Bit `n` corresponds to the [`MemoryFormat`] with discriminant `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<MemoryFormat>", into = "Vec<MemoryFormat>")]
pub struct MemoryFormatSelection(u32);

impl MemoryFormatSelection {
    pub const EMPTY: Self = Self(0);

    pub const B8G8R8A8_PREMULTIPLIED: Self = Self::of(MemoryFormat::B8g8r8a8Premultiplied);
    pub const A8R8G8B8_PREMULTIPLIED: Self = Self::of(MemoryFormat::A8r8g8b8Premultiplied);
    pub const R8G8B8A8_PREMULTIPLIED: Self = Self::of(MemoryFormat::R8g8b8a8Premultiplied);
    pub const B8G8R8A8: Self = Self::of(MemoryFormat::B8g8r8a8);
    pub const A8R8G8B8: Self = Self::of(MemoryFormat::A8r8g8b8);
    pub const R8G8B8A8: Self = Self::of(MemoryFormat::R8g8b8a8);
    pub const A8B8G8R8: Self = Self::of(MemoryFormat::A8b8g8r8);
    pub const R8G8B8: Self = Self::of(MemoryFormat::R8g8b8);
    pub const B8G8R8: Self = Self::of(MemoryFormat::B8g8r8);
    pub const R16G16B16: Self = Self::of(MemoryFormat::R16g16b16);
    pub const R16G16B16A16_PREMULTIPLIED: Self = Self::of(MemoryFormat::R16g16b16a16Premultiplied);
    pub const R16G16B16A16: Self = Self::of(MemoryFormat::R16g16b16a16);
    pub const R16G16B16_FLOAT: Self = Self::of(MemoryFormat::R16g16b16Float);
    pub const R16G16B16A16_FLOAT: Self = Self::of(MemoryFormat::R16g16b16a16Float);
    pub const R32G32B32_FLOAT: Self = Self::of(MemoryFormat::R32g32b32Float);
    pub const R32G32B32A32_FLOAT_PREMULTIPLIED: Self = Self::of(MemoryFormat::R32g32b32a32FloatPremultiplied);
    pub const R32G32B32A32_FLOAT: Self = Self::of(MemoryFormat::R32g32b32a32Float);
    pub const G8A8_PREMULTIPLIED: Self = Self::of(MemoryFormat::G8a8Premultiplied);
    pub const G8A8: Self = Self::of(MemoryFormat::G8a8);
    pub const G8: Self = Self::of(MemoryFormat::G8);
    pub const G16A16_PREMULTIPLIED: Self = Self::of(MemoryFormat::G16a16Premultiplied);
    pub const G16A16: Self = Self::of(MemoryFormat::G16a16);
    pub const G16: Self = Self::of(MemoryFormat::G16);

    #[must_use]
    pub const fn of(format: MemoryFormat) -> Self {
        Self(1 << format.value())
    }

    #[must_use]
    pub const fn all() -> Self {
        Self((1 << MemoryFormat::ALL.len()) - 1)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Keeps only bits that name a known format.
    #[must_use]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::all().0)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn contains(self, format: MemoryFormat) -> bool {
        self.0 & Self::of(format).0 != 0
    }

    pub fn insert(&mut self, format: MemoryFormat) {
        self.0 |= Self::of(format).0;
    }

    pub fn iter(self) -> impl Iterator<Item = MemoryFormat> {
        MemoryFormat::ALL
            .into_iter()
            .filter(move |format| self.contains(*format))
    }

    /// Picks the member that represents `src` with the least loss.
    ///
    /// Returns `src` itself if it is part of the selection.
    #[must_use]
    pub fn best_format_for(self, src: MemoryFormat) -> Option<MemoryFormat> {
        if self.contains(src) {
            return Some(src);
        }

        self.iter().min_by_key(|candidate| conversion_cost(src, *candidate))
    }
}

/// Lexicographic cost: lost alpha, lost colour, lost depth, changed
/// premultiplication, pixel size, discriminant.
fn conversion_cost(src: MemoryFormat, target: MemoryFormat) -> (bool, bool, bool, bool, usize, i32) {
    (
        src.has_alpha() && !target.has_alpha(),
        !src.is_grayscale() && target.is_grayscale(),
        target.channel_type().size() < src.channel_type().size(),
        src.is_premultiplied() != target.is_premultiplied(),
        target.n_bytes(),
        target.value(),
    )
}

impl Default for MemoryFormatSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl From<MemoryFormat> for MemoryFormatSelection {
    fn from(format: MemoryFormat) -> Self {
        Self::of(format)
    }
}

impl From<Vec<MemoryFormat>> for MemoryFormatSelection {
    fn from(formats: Vec<MemoryFormat>) -> Self {
        formats.into_iter().collect()
    }
}

impl From<MemoryFormatSelection> for Vec<MemoryFormat> {
    fn from(selection: MemoryFormatSelection) -> Self {
        selection.iter().collect()
    }
}

impl FromIterator<MemoryFormat> for MemoryFormatSelection {
    fn from_iter<T: IntoIterator<Item = MemoryFormat>>(iter: T) -> Self {
        let mut selection = Self::EMPTY;
        for format in iter {
            selection.insert(format);
        }
        selection
    }
}

impl BitOr for MemoryFormatSelection {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for MemoryFormatSelection {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for MemoryFormatSelection {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_format_is_kept_when_accepted() {
        let selection = MemoryFormatSelection::R8G8B8 | MemoryFormatSelection::G8;
        assert_eq!(selection.best_format_for(MemoryFormat::R8g8b8), Some(MemoryFormat::R8g8b8));
    }

    #[test]
    fn grayscale_only_selection_forces_grayscale() {
        let selection = MemoryFormatSelection::G8;
        assert_eq!(selection.best_format_for(MemoryFormat::R8g8b8), Some(MemoryFormat::G8));
    }

    #[test]
    fn alpha_is_preserved_over_smaller_formats() {
        let selection = MemoryFormatSelection::R8G8B8 | MemoryFormatSelection::B8G8R8A8;
        assert_eq!(
            selection.best_format_for(MemoryFormat::R8g8b8a8),
            Some(MemoryFormat::B8g8r8a8)
        );
    }

    #[test]
    fn opaque_source_prefers_smallest_colour_format() {
        let selection = MemoryFormatSelection::R8G8B8A8
            | MemoryFormatSelection::B8G8R8
            | MemoryFormatSelection::G8;
        assert_eq!(selection.best_format_for(MemoryFormat::R8g8b8), Some(MemoryFormat::B8g8r8));
    }

    #[test]
    fn depth_is_preserved_when_possible() {
        let selection = MemoryFormatSelection::R8G8B8 | MemoryFormatSelection::R16G16B16;
        assert_eq!(
            selection.best_format_for(MemoryFormat::R16g16b16Float),
            Some(MemoryFormat::R16g16b16)
        );
    }

    #[test]
    fn empty_selection_has_no_candidate() {
        assert_eq!(MemoryFormatSelection::EMPTY.best_format_for(MemoryFormat::G8), None);
    }

    #[test]
    fn all_contains_every_format() {
        let all = MemoryFormatSelection::all();
        assert!(MemoryFormat::ALL.into_iter().all(|format| all.contains(format)));
        assert_eq!(all.iter().count(), MemoryFormat::ALL.len());
        assert_eq!(MemoryFormatSelection::from_bits_truncate(u32::MAX), all);
    }

    #[test]
    fn deserializes_from_format_list() {
        let selection: MemoryFormatSelection = serde_json::from_str(r#"["g8", "r8g8b8"]"#).unwrap();
        assert_eq!(selection, MemoryFormatSelection::G8 | MemoryFormatSelection::R8G8B8);
    }
}
