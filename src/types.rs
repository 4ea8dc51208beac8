//! Layout primitives shared by the point algebra, render commands and
//! connection derivation.
//!
//! Coordinates are plain `glam::DVec2` values in drawing units. The types in
//! this module describe *where* a component instance sits and how it is
//! oriented, plus the validated options that steer resolution.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};
use std::str::FromStr;

use glam::DVec2;

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value is zero when non-zero required
    Zero,
    /// Value is negative when positive required
    Negative,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Zero => write!(f, "value is zero"),
            NumericError::Negative => write!(f, "value is negative"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Spacing of the connection grid, in drawing units.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct GridSize(f64);

impl GridSize {
    /// The grid used by every stock description.
    pub const DEFAULT: GridSize = GridSize(10.0);

    /// Create a GridSize with validation (rejects NaN, infinite, zero, negative)
    pub fn try_new(value: f64) -> Result<Self, NumericError> {
        if value.is_nan() {
            Err(NumericError::NaN)
        } else if value.is_infinite() {
            Err(NumericError::Infinite)
        } else if value == 0.0 {
            Err(NumericError::Zero)
        } else if value < 0.0 {
            Err(NumericError::Negative)
        } else {
            Ok(GridSize(value))
        }
    }

    #[inline]
    pub fn raw(self) -> f64 {
        self.0
    }

    /// Round `value` up to the next grid line.
    #[inline]
    pub fn snap_up(self, value: f64) -> f64 {
        (value / self.0).ceil() * self.0
    }

    /// Round `value` down to the previous grid line.
    #[inline]
    pub fn snap_down(self, value: f64) -> f64 {
        (value / self.0).floor() * self.0
    }

    /// Whether `value` lies on a grid line.
    pub fn is_aligned(self, value: f64) -> bool {
        (value % self.0).abs() < f64::EPSILON
    }
}

impl Default for GridSize {
    fn default() -> Self {
        GridSize::DEFAULT
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The axis a component is laid out along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn is_horizontal(self) -> bool {
        self == Orientation::Horizontal
    }

    /// The other axis.
    pub fn perpendicular(self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => write!(f, "horizontal"),
            Orientation::Vertical => write!(f, "vertical"),
        }
    }
}

/// Which mirror transforms are applied to a component instance.
///
/// `PRIMARY` mirrors along the main axis (start and end swap places),
/// `SECONDARY` mirrors across it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct FlipState(u8);

impl FlipState {
    pub const NONE: FlipState = FlipState(0);
    pub const PRIMARY: FlipState = FlipState(1);
    pub const SECONDARY: FlipState = FlipState(2);
    pub const BOTH: FlipState = FlipState(3);

    pub fn contains(self, other: FlipState) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for FlipState {
    type Output = FlipState;
    fn bitor(self, rhs: FlipState) -> FlipState {
        FlipState(self.0 | rhs.0)
    }
}

/// The pair of mirror operations a [`FlipState`] amounts to in drawing space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Mirror {
    /// Negate x (mirror about the vertical axis through the origin)
    pub horizontal: bool,
    /// Negate y
    pub vertical: bool,
}

impl Mirror {
    pub fn any(self) -> bool {
        self.horizontal || self.vertical
    }
}

/// Current placement of a component instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutInformation {
    /// Top-left anchor of the component in document coordinates
    pub location: DVec2,
    /// Extent along the main axis
    pub size: f64,
    pub orientation: Orientation,
    pub flip: FlipState,
}

impl LayoutInformation {
    pub fn new(location: DVec2, size: f64, orientation: Orientation) -> Self {
        Self {
            location,
            size,
            orientation,
            flip: FlipState::NONE,
        }
    }

    pub fn with_flip(mut self, flip: FlipState) -> Self {
        self.flip = flip;
        self
    }

    /// True when the primary (main axis) flip is applied.
    pub fn is_flipped(&self) -> bool {
        self.flip.contains(FlipState::PRIMARY)
    }

    /// Translate the flip state into drawing-space mirror operations.
    pub fn mirror(&self) -> Mirror {
        let primary = self.flip.contains(FlipState::PRIMARY);
        let secondary = self.flip.contains(FlipState::SECONDARY);
        match self.orientation {
            Orientation::Horizontal => Mirror {
                horizontal: primary,
                vertical: secondary,
            },
            Orientation::Vertical => Mirror {
                horizontal: secondary,
                vertical: primary,
            },
        }
    }
}

impl Default for LayoutInformation {
    fn default() -> Self {
        Self::new(DVec2::ZERO, 0.0, Orientation::Horizontal)
    }
}

/// Options controlling how points resolve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOptions {
    /// Emit document coordinates (translated by the layout location) instead
    /// of coordinates relative to the component
    pub absolute: bool,
    /// Keep middle-relative coordinates on the grid
    pub align_middle: bool,
    pub grid_size: GridSize,
}

impl LayoutOptions {
    /// Options for on-canvas rendering.
    pub fn absolute() -> Self {
        Self {
            absolute: true,
            ..Self::default()
        }
    }

    pub fn with_align_middle(mut self, align_middle: bool) -> Self {
        self.align_middle = align_middle;
        self
    }

    pub fn with_grid_size(mut self, grid_size: GridSize) -> Self {
        self.grid_size = grid_size;
        self
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            absolute: false,
            align_middle: false,
            grid_size: GridSize::DEFAULT,
        }
    }
}

/// Version of the declarative format a description was written in.
///
/// Only the condition dialect depends on it: before 1.2 states are written
/// `_horizontal`, from 1.2 on negated property conditions (`!$name`) exist
/// instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormatVersion {
    pub major: u16,
    pub minor: u16,
}

impl FormatVersion {
    pub const V1_0: FormatVersion = FormatVersion::new(1, 0);
    pub const V1_1: FormatVersion = FormatVersion::new(1, 1);
    pub const V1_2: FormatVersion = FormatVersion::new(1, 2);

    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Whether conditions use the `_state` dialect.
    pub fn uses_state_underscores(self) -> bool {
        self < FormatVersion::V1_2
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        FormatVersion::V1_2
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for FormatVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s.trim().split_once('.').unwrap_or((s.trim(), "0"));
        let major = major
            .parse()
            .map_err(|_| format!("invalid format version: {s:?}"))?;
        let minor = minor
            .parse()
            .map_err(|_| format!("invalid format version: {s:?}"))?;
        Ok(FormatVersion { major, minor })
    }
}

/// Capability bits of a component, resolved per instance from conditional
/// flag sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct FlagOptions(u32);

impl FlagOptions {
    pub const NONE: FlagOptions = FlagOptions(0);
    pub const HORIZONTAL_ONLY: FlagOptions = FlagOptions(1);
    pub const VERTICAL_ONLY: FlagOptions = FlagOptions(1 << 1);
    pub const MIDDLE_MUST_ALIGN: FlagOptions = FlagOptions(1 << 2);
    pub const NO_RESIZE: FlagOptions = FlagOptions(1 << 3);
    pub const FLIP_PRIMARY: FlagOptions = FlagOptions(1 << 4);
    pub const FLIP_SECONDARY: FlagOptions = FlagOptions(1 << 5);

    const NAMED: [(&'static str, FlagOptions); 6] = [
        ("horizontalonly", FlagOptions::HORIZONTAL_ONLY),
        ("verticalonly", FlagOptions::VERTICAL_ONLY),
        ("middlemustalign", FlagOptions::MIDDLE_MUST_ALIGN),
        ("noresize", FlagOptions::NO_RESIZE),
        ("flipprimary", FlagOptions::FLIP_PRIMARY),
        ("flipsecondary", FlagOptions::FLIP_SECONDARY),
    ];

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: FlagOptions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: FlagOptions) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: FlagOptions) {
        self.0 &= !other.0;
    }

    /// Look up a single flag by its declarative name (case-insensitive).
    pub fn from_name(name: &str) -> Option<FlagOptions> {
        let name = name.trim().to_ascii_lowercase();
        Self::NAMED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, flag)| *flag)
    }
}

impl BitOr for FlagOptions {
    type Output = FlagOptions;
    fn bitor(self, rhs: FlagOptions) -> FlagOptions {
        FlagOptions(self.0 | rhs.0)
    }
}

impl BitOrAssign for FlagOptions {
    fn bitor_assign(&mut self, rhs: FlagOptions) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for FlagOptions {
    type Output = FlagOptions;
    fn bitand(self, rhs: FlagOptions) -> FlagOptions {
        FlagOptions(self.0 & rhs.0)
    }
}

impl Not for FlagOptions {
    type Output = FlagOptions;
    fn not(self) -> FlagOptions {
        FlagOptions(!self.0)
    }
}

impl fmt::Display for FlagOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect();
        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}
