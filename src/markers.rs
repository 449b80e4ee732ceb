//! Behaviour markers attached to schema nodes.
//!
//! A marker is a tag from a closed set that alters how a field or subtree is
//! parsed or rendered. Markers attached to a parent type propagate to all of
//! its children during normalization; a container rule that consumes a marker
//! (for example a sequence consuming [`Marker::UseAppendAction`]) strips it
//! before descending into its element type.

/// A behaviour tag that can be attached to any schema node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum Marker {
    /// Turn the argument into a positional one.
    Positional,
    /// Make only the *required* arguments positional.
    PositionalRequiredArgs,
    /// Pin the value to its default; no argument is generated.
    Fixed,
    /// Hide the argument from help output.
    Suppress,
    /// Hide the argument from help output only when it is fixed.
    SuppressFixed,
    /// Do not convert `bool` fields into `--flag`/`--no-flag` pairs.
    FlagConversionOff,
    /// Generate only the positive form of a boolean flag.
    FlagCreatePairsOff,
    /// Resolve a union to the default's branch instead of subcommands.
    AvoidSubcommands,
    /// Attach this node's arguments to every leaf subparser below it.
    CascadeSubcommandArgs,
    /// Do not namespace subcommand names under the parent prefix.
    OmitSubcommandPrefixes,
    /// Do not prefix argument names with their parent field path.
    OmitArgPrefixes,
    /// Accumulate repeated occurrences of the argument.
    UseAppendAction,
    /// The argument's value is its number of occurrences.
    UseCounterAction,
    /// Match enum members by string-converted value instead of name.
    EnumChoicesFromValues,
    /// Do not derive helptext from schema documentation.
    HelptextFromCommentsOff,

    // Private markers, set internally during field resolution.
    #[doc(hidden)]
    OptionalGroup,
    #[doc(hidden)]
    UnpackArgsCall,
    #[doc(hidden)]
    UnpackKwargsCall,
}

impl Marker {
    const fn bit(self) -> u32 {
        1 << self as u32
    }
}

/// A small set of [`Marker`]s, cheap to copy and compare.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct MarkerSet(u32);

impl MarkerSet {
    pub const EMPTY: Self = MarkerSet(0);

    #[must_use]
    pub fn contains(self, marker: Marker) -> bool {
        self.0 & marker.bit() != 0
    }

    #[must_use]
    pub fn with(self, marker: Marker) -> Self {
        MarkerSet(self.0 | marker.bit())
    }

    #[must_use]
    pub fn without(self, marker: Marker) -> Self {
        MarkerSet(self.0 & !marker.bit())
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        MarkerSet(self.0 | other.0)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when `other` contains every marker of `self`.
    #[must_use]
    pub fn subset_of(self, other: Self) -> bool {
        self.0 & other.0 == self.0
    }
}

impl From<Marker> for MarkerSet {
    fn from(marker: Marker) -> Self {
        MarkerSet::EMPTY.with(marker)
    }
}

impl FromIterator<Marker> for MarkerSet {
    fn from_iter<I: IntoIterator<Item = Marker>>(iter: I) -> Self {
        iter.into_iter().fold(MarkerSet::EMPTY, MarkerSet::with)
    }
}

impl<'a> FromIterator<&'a Marker> for MarkerSet {
    fn from_iter<I: IntoIterator<Item = &'a Marker>>(iter: I) -> Self {
        iter.into_iter()
            .copied()
            .fold(MarkerSet::EMPTY, MarkerSet::with)
    }
}

impl std::fmt::Debug for MarkerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const ALL: [Marker; 18] = [
            Marker::Positional,
            Marker::PositionalRequiredArgs,
            Marker::Fixed,
            Marker::Suppress,
            Marker::SuppressFixed,
            Marker::FlagConversionOff,
            Marker::FlagCreatePairsOff,
            Marker::AvoidSubcommands,
            Marker::CascadeSubcommandArgs,
            Marker::OmitSubcommandPrefixes,
            Marker::OmitArgPrefixes,
            Marker::UseAppendAction,
            Marker::UseCounterAction,
            Marker::EnumChoicesFromValues,
            Marker::HelptextFromCommentsOff,
            Marker::OptionalGroup,
            Marker::UnpackArgsCall,
            Marker::UnpackKwargsCall,
        ];
        f.debug_set()
            .entries(ALL.iter().filter(|m| self.contains(**m)))
            .finish()
    }
}
