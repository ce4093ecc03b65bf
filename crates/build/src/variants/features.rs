//! Feature sets and the variants built from them

use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest number of distinct feature indices a [`FeatureSet`] can hold
pub const MAX_FEATURES: u32 = u32::BITS;

/// A named compile-time switch with a fixed bit position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Feature {
    /// Macro defined to 1 when the feature is enabled
    pub name: String,
    /// Bit position in the namespace bitmask
    pub index: u32,
}

impl Feature {
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Self { name: name.into(), index }
    }
}

/// Set of feature indices, stored as a bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureSet(u32);

impl FeatureSet {
    pub const EMPTY: Self = Self(0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn from_indices(indices: impl IntoIterator<Item = u32>) -> Self {
        indices.into_iter().fold(Self::EMPTY, Self::with)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns a copy with `index` added
    ///
    /// Indices of [`MAX_FEATURES`] and above cannot be represented and leave the set unchanged.
    pub const fn with(self, index: u32) -> Self {
        if index < MAX_FEATURES { Self(self.0 | 1 << index) } else { self }
    }

    pub const fn contains(self, index: u32) -> bool {
        index < MAX_FEATURES && self.0 & (1 << index) != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_subset(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Indices in ascending order
    pub fn indices(self) -> impl Iterator<Item = u32> {
        (0..MAX_FEATURES).filter(move |&index| self.contains(index))
    }

    /// Every subset of `self`, in ascending bitmask order, the empty set first
    pub fn subsets(self) -> impl Iterator<Item = Self> {
        let pool = self.0;
        let mut next = Some(0u32);
        std::iter::from_fn(move || {
            let current = next?;
            next = (current != pool).then(|| current.wrapping_sub(pool) & pool);
            Some(Self(current))
        })
    }

    /// Fixed-width string with one `'0'`/`'1'` character per index, lowest index first
    pub fn bitmask(self, width: u32) -> String {
        (0..width).map(|index| if self.contains(index) { '1' } else { '0' }).collect()
    }
}

/// Pipeline stage a variant is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Marker macro defined around the variant
    pub fn macro_name(self) -> &'static str {
        match self {
            Self::Vertex => "VERTEX",
            Self::Fragment => "FRAGMENT",
        }
    }
}

/// Kind of draw a variant renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawType {
    Path,
    ImageMesh,
}

/// Coverage accumulation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillRule {
    /// Clockwise-only fill, compiled with `CLOCKWISE_FILL`
    Clockwise,
    Legacy,
}

/// One compilation unit: a stage, draw type and fill rule with a concrete feature set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variant {
    pub stage: ShaderStage,
    pub draw: DrawType,
    pub fill: FillRule,
    pub features: FeatureSet,
}

impl Variant {
    pub fn new(stage: ShaderStage, draw: DrawType, fill: FillRule, features: FeatureSet) -> Self {
        Self { stage, draw, fill, features }
    }

    /// Leading character of the namespace name
    pub fn namespace_prefix(&self) -> char {
        match (self.draw, self.fill) {
            (DrawType::ImageMesh, _) => 'm',
            (DrawType::Path, FillRule::Clockwise) => 'c',
            (DrawType::Path, FillRule::Legacy) => 'p',
        }
    }

    /// Namespace wrapping this variant, e.g. `p111100000` for a nine-feature universe
    pub fn namespace_name(&self, width: u32) -> String {
        format!("{}{}", self.namespace_prefix(), self.features.bitmask(width))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?} {:?} {:#b}", self.stage, self.draw, self.fill, self.features.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_operations() {
        let a = FeatureSet::from_indices([0, 2, 3]);
        let b = FeatureSet::from_indices([2, 5]);

        assert_eq!(a.union(b), FeatureSet::from_indices([0, 2, 3, 5]));
        assert_eq!(a.difference(b), FeatureSet::from_indices([0, 3]));
        assert!(a.intersects(b));
        assert!(!a.intersects(FeatureSet::from_indices([1])));
        assert!(FeatureSet::from_indices([0, 3]).is_subset(a));
        assert!(FeatureSet::EMPTY.is_subset(a));
        assert_eq!(a.len(), 3);
        assert_eq!(a.indices().collect::<Vec<_>>(), vec![0, 2, 3]);
        assert!(!a.contains(40));
    }

    #[test]
    fn test_out_of_range_indices_are_ignored() {
        assert_eq!(FeatureSet::EMPTY.with(MAX_FEATURES), FeatureSet::EMPTY);
        assert_eq!(FeatureSet::from_indices([1, 32, 40]), FeatureSet::from_indices([1]));
        assert_eq!(FeatureSet::EMPTY.with(31).bits(), 1 << 31);
    }

    #[test]
    fn test_subsets_cover_the_powerset_in_order() {
        let pool = FeatureSet::from_indices([1, 3, 4]);
        let subsets: Vec<u32> = pool.subsets().map(FeatureSet::bits).collect();
        assert_eq!(subsets, vec![0b00000, 0b00010, 0b01000, 0b01010, 0b10000, 0b10010, 0b11000, 0b11010]);

        assert_eq!(FeatureSet::EMPTY.subsets().collect::<Vec<_>>(), vec![FeatureSet::EMPTY]);
    }

    #[test]
    fn test_namespace_names() {
        let features = FeatureSet::from_indices([0, 1, 2, 3]);
        let path = Variant::new(ShaderStage::Vertex, DrawType::Path, FillRule::Legacy, features);
        let clockwise = Variant { fill: FillRule::Clockwise, ..path };
        let mesh = Variant { draw: DrawType::ImageMesh, ..path };

        assert_eq!(path.namespace_name(9), "p111100000");
        assert_eq!(clockwise.namespace_name(9), "c111100000");
        assert_eq!(mesh.namespace_name(9), "m111100000");
        assert_eq!(FeatureSet::from_indices([1]).bitmask(2), "01");
    }
}
