// Wrapper types making it harder to accidentaly use the wrong underlying type.

use std::{
    borrow::Cow,
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::math::Vector3;

// A block position, the integer address of a single voxel cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos(pub Vector3<i32>);

impl BlockPos {
    /// Creates a new block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The x coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.0.x
    }

    /// The y coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.0.y
    }

    /// The z coordinate.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.0.z
    }

    /// Returns the position offset by the given deltas.
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }

    /// Returns the position directly above this one.
    #[must_use]
    pub const fn above(&self) -> Self {
        self.offset(0, 1, 0)
    }

    /// Returns the offset position, or `None` if a coordinate overflows.
    #[must_use]
    pub const fn checked_offset(&self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        match (
            self.0.x.checked_add(dx),
            self.0.y.checked_add(dy),
            self.0.z.checked_add(dz),
        ) {
            (Some(x), Some(y), Some(z)) => Some(Self::new(x, y, z)),
            _ => None,
        }
    }

    /// Returns the position directly above this one, or `None` at `i32::MAX`.
    #[must_use]
    pub const fn checked_above(&self) -> Option<Self> {
        self.checked_offset(0, 1, 0)
    }

    /// Returns the cell containing `point`, flooring every component.
    #[must_use]
    pub fn containing(point: Vector3<f64>) -> Self {
        Self::new(
            point.x.floor() as i32,
            point.y.floor() as i32,
            point.z.floor() as i32,
        )
    }

    /// Returns the component-wise minimum and maximum of two corners.
    #[must_use]
    pub fn bounds(a: Self, b: Self) -> (Self, Self) {
        (
            Self::new(a.x().min(b.x()), a.y().min(b.y()), a.z().min(b.z())),
            Self::new(a.x().max(b.x()), a.y().max(b.y()), a.z().max(b.z())),
        )
    }
}

impl Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// A namespaced identifier such as `minecraft:stone`. Used for block types and dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceLocation {
    pub namespace: Cow<'static, str>,
    pub path: Cow<'static, str>,
}

impl ResourceLocation {
    pub const VANILLA_NAMESPACE: &'static str = "minecraft";

    pub fn vanilla(path: String) -> Self {
        ResourceLocation {
            namespace: Cow::Borrowed(Self::VANILLA_NAMESPACE),
            path: Cow::Owned(path),
        }
    }

    pub const fn vanilla_static(path: &'static str) -> Self {
        ResourceLocation {
            namespace: Cow::Borrowed(Self::VANILLA_NAMESPACE),
            path: Cow::Borrowed(path),
        }
    }

    pub const fn new_static(namespace: &'static str, path: &'static str) -> Self {
        ResourceLocation {
            namespace: Cow::Borrowed(namespace),
            path: Cow::Borrowed(path),
        }
    }

    pub fn is_vanilla(&self) -> bool {
        self.namespace == Self::VANILLA_NAMESPACE
    }

    pub fn valid_namespace_char(namespace_char: char) -> bool {
        namespace_char == '_'
            || namespace_char == '-'
            || namespace_char.is_ascii_lowercase()
            || namespace_char.is_ascii_digit()
            || namespace_char == '.'
    }

    pub fn valid_path_char(path_char: char) -> bool {
        path_char == '_'
            || path_char == '-'
            || path_char.is_ascii_lowercase()
            || path_char.is_ascii_digit()
            || path_char == '/'
            || path_char == '.'
    }

    pub fn validate_namespace(namespace: &str) -> bool {
        !namespace.is_empty() && namespace.chars().all(Self::valid_namespace_char)
    }

    pub fn validate_path(path: &str) -> bool {
        !path.is_empty() && path.chars().all(Self::valid_path_char)
    }

    pub fn validate(namespace: &str, path: &str) -> bool {
        Self::validate_namespace(namespace) && Self::validate_path(path)
    }
}

impl Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for ResourceLocation {
    type Err = String;

    // A missing namespace resolves to the vanilla one, so `stone` reads as `minecraft:stone`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, path) = match s.split_once(':') {
            Some((namespace, path)) => (namespace, path),
            None => (Self::VANILLA_NAMESPACE, s),
        };

        if !ResourceLocation::validate_namespace(namespace) {
            return Err(format!("Invalid namespace: {namespace}"));
        }

        if !ResourceLocation::validate_path(path) {
            return Err(format!("Invalid path: {path}"));
        }

        Ok(ResourceLocation {
            namespace: Cow::Owned(namespace.to_string()),
            path: Cow::Owned(path.to_string()),
        })
    }
}

impl Serialize for ResourceLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// Dimensions are addressed by resource location, e.g. `minecraft:overworld`.
pub type DimensionId = ResourceLocation;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_without_namespace() {
        let location: ResourceLocation = "stone".parse().unwrap();
        assert_eq!(location, ResourceLocation::vanilla_static("stone"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("Stone".parse::<ResourceLocation>().is_err());
        assert!("a:b:c".parse::<ResourceLocation>().is_err());
        assert!("minecraft:".parse::<ResourceLocation>().is_err());
        assert!("".parse::<ResourceLocation>().is_err());
    }

    #[test]
    fn test_containing_floors() {
        let pos = BlockPos::containing(Vector3::new(-0.5, 1.9, 2.0));
        assert_eq!(pos, BlockPos::new(-1, 1, 2));
    }

    #[test]
    fn test_checked_offset_stops_at_the_edge() {
        let top = BlockPos::new(0, i32::MAX, 0);
        assert_eq!(top.checked_above(), None);
        assert_eq!(top.checked_offset(0, -1, 0), Some(BlockPos::new(0, i32::MAX - 1, 0)));
        assert_eq!(BlockPos::new(i32::MIN, 0, 0).checked_offset(-1, 0, 0), None);
        assert_eq!(BlockPos::new(1, 2, 3).checked_above(), Some(BlockPos::new(1, 3, 3)));
    }

    #[test]
    fn test_bounds() {
        let (min, max) = BlockPos::bounds(BlockPos::new(3, -1, 0), BlockPos::new(1, 2, 0));
        assert_eq!(min, BlockPos::new(1, -1, 0));
        assert_eq!(max, BlockPos::new(3, 2, 0));
    }
}
