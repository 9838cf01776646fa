//! Secondary type tags.
//!
//! Every [`Value`](crate::Value) carries a 32-bit subtype refining the meaning
//! of its primary kind: a string tagged as UUID or bignum, an integer tagged
//! as UNIX timestamp, an object tagged as map. The tag space is partitioned
//! by kind:
//!
//! | Range | Meaning |
//! |---|---|
//! | `0..=i32::MAX` | user- or format-defined |
//! | `-10..=-1` | generic, applicable to all kinds |
//! | `-39..=-20` | integers |
//! | `-129..=-60` | strings encoded as text |
//! | `-199..=-130` | strings encoded as binary |
//! | `-209..=-200` | arrays |
//! | `-219..=-210` | objects |
//! | `-229..=-220` | links |
//! | `-239..=-230` | null |
//! | `i32::MIN..=-256` | reserved |

use core::fmt;

/// A semantic refinement tag carried alongside a value's primary kind.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subtype(pub i32);

impl Subtype {
    /// No refinement. Strings with this subtype are valid UTF-8.
    pub const NORMAL: Subtype = Subtype(-1);
    /// Comparison collapses numeric kinds into one numeric domain (and
    /// string kinds into one string domain) before comparing payloads.
    pub const DOMAIN_COMPARABLE: Subtype = Subtype(-2);
    /// Comparison ignores subtype mismatches against this value.
    pub const GENERIC_SUBTYPE_COMPARABLE: Subtype = Subtype(-3);

    // Integers.
    /// Seconds since 1970-01-01T00:00:00, without leap seconds.
    pub const UNIX_TIMESTAMP: Subtype = Subtype(-39);
    /// Milliseconds since the epoch, without leap seconds.
    pub const UNIX_TIMESTAMP_MS: Subtype = Subtype(-38);
    /// Nanoseconds since the epoch, without leap seconds.
    pub const UNIX_TIMESTAMP_NS: Subtype = Subtype(-37);
    /// Seconds since the epoch, with leap seconds.
    pub const UTC_TIMESTAMP: Subtype = Subtype(-36);
    /// Milliseconds since the epoch, with leap seconds.
    pub const UTC_TIMESTAMP_MS: Subtype = Subtype(-35);
    /// Nanoseconds since the epoch, with leap seconds.
    pub const UTC_TIMESTAMP_NS: Subtype = Subtype(-34);
    /// A span of seconds.
    pub const DURATION: Subtype = Subtype(-33);
    /// A span of milliseconds.
    pub const DURATION_MS: Subtype = Subtype(-32);
    /// A span of nanoseconds.
    pub const DURATION_NS: Subtype = Subtype(-31);
    /// MongoDB's internal 64-bit timestamp layout.
    pub const MONGODB_TIMESTAMP: Subtype = Subtype(-30);

    // Text strings. Encoding is unspecified unless noted.
    /// A chunk of text with unknown encoding.
    pub const CLOB: Subtype = Subtype(-129);
    /// A symbolic atom or identifier.
    pub const SYMBOL: Subtype = Subtype(-128);
    /// A combined date/time in an unspecified text format.
    pub const DATETIME: Subtype = Subtype(-127);
    /// A date in an unspecified text format.
    pub const DATE: Subtype = Subtype(-126);
    /// A time in an unspecified text format.
    pub const TIME: Subtype = Subtype(-125);
    /// A regular expression with unspecified dialect and flags.
    pub const REGEXP: Subtype = Subtype(-124);
    /// A high-precision decimal number kept as opaque text.
    pub const BIGNUM: Subtype = Subtype(-123);
    /// A UUID in text form.
    pub const UUID: Subtype = Subtype(-122);
    /// A function body in an unspecified language.
    pub const FUNCTION: Subtype = Subtype(-121);
    /// Executable JavaScript source.
    pub const JAVASCRIPT: Subtype = Subtype(-120);
    /// A comment carried through from a document format.
    pub const COMMENT: Subtype = Subtype(-119);
    /// A processing instruction or directive carried through from a document
    /// format.
    pub const PROGRAM_DIRECTIVE: Subtype = Subtype(-118);

    // Binary strings.
    /// A chunk of arbitrary binary data.
    pub const BLOB: Subtype = Subtype(-199);
    /// A symbolic atom in binary form.
    pub const BINARY_SYMBOL: Subtype = Subtype(-198);
    /// A date/time in an unspecified binary layout.
    pub const BINARY_DATETIME: Subtype = Subtype(-197);
    /// A date in an unspecified binary layout.
    pub const BINARY_DATE: Subtype = Subtype(-196);
    /// A time in an unspecified binary layout.
    pub const BINARY_TIME: Subtype = Subtype(-195);
    /// A regular expression in an unspecified binary layout.
    pub const BINARY_REGEXP: Subtype = Subtype(-194);
    /// A high-precision number in an unspecified binary encoding.
    pub const BINARY_BIGNUM: Subtype = Subtype(-193);
    /// A 16-byte binary UUID.
    pub const BINARY_UUID: Subtype = Subtype(-192);
    /// A compiled or encoded function value.
    pub const BINARY_FUNCTION: Subtype = Subtype(-191);
    /// A 12-byte object id, as used by BSON.
    pub const BINARY_OBJECT_ID: Subtype = Subtype(-190);

    // Arrays.
    /// An ordered collection distinct from a plain array only by name.
    pub const SEXP: Subtype = Subtype(-209);

    // Objects.
    /// An object with integral keys.
    pub const MAP: Subtype = Subtype(-219);
    /// A hash lookup; a tag for external variant types.
    pub const HASH: Subtype = Subtype(-218);

    // Links.
    /// An owning link: destroying the holder destroys the target.
    pub const STRONG_LINK: Subtype = Subtype(-229);
    /// Reserved: records the back-reference from a target to its owner.
    pub const PARENT_LINK: Subtype = Subtype(-228);

    // Null.
    /// A null that means "undefined" rather than "absent".
    pub const UNDEFINED: Subtype = Subtype(-239);

    /// Largest tag in the reserved range.
    pub const RESERVED_MAX: Subtype = Subtype(-256);

    /// Whether this tag lies in the user-defined range.
    #[must_use]
    pub const fn is_user_defined(self) -> bool {
        self.0 >= 0
    }

    /// Whether this tag lies in the reserved range.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.0 <= Self::RESERVED_MAX.0
    }

    /// Whether a string carrying this tag should be interpreted as text.
    ///
    /// Covers the textual tag range and the generic range (which includes
    /// [`NORMAL`](Self::NORMAL), implying UTF-8).
    #[must_use]
    pub const fn is_text_string(self) -> bool {
        (self.0 > -130 && self.0 <= -60) || (self.0 > -10 && self.0 <= -1)
    }

    /// Whether a string carrying this tag holds arbitrary binary data.
    #[must_use]
    pub const fn is_binary_string(self) -> bool {
        self.0 > -200 && self.0 <= -130
    }

    /// A human-readable name for the tag.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self.0 {
            -1 => "normal",
            -2 => "domain comparable",
            -3 => "subtype comparable",

            -39 => "UNIX timestamp",
            -38 => "UNIX timestamp (ms)",
            -37 => "UNIX timestamp (ns)",
            -36 => "UTC timestamp",
            -35 => "UTC timestamp (ms)",
            -34 => "UTC timestamp (ns)",
            -33 => "duration",
            -32 => "duration (ms)",
            -31 => "duration (ns)",
            -30 => "MongoDB timestamp",

            -129 => "text (unknown encoding)",
            -128 => "symbol",
            -127 => "date/time",
            -126 => "date",
            -125 => "time",
            -124 => "regular expression",
            -123 => "bignum",
            -122 => "UUID",
            -121 => "function",
            -120 => "JavaScript",
            -119 => "comment",
            -118 => "program directive",

            -199 => "binary (unknown data)",
            -198 => "binary symbol",
            -197 => "binary date/time",
            -196 => "binary date",
            -195 => "binary time",
            -194 => "binary regexp",
            -193 => "binary bignum",
            -192 => "binary UUID",
            -191 => "binary function",
            -190 => "binary object id",

            -209 => "s-expression",

            -219 => "map",
            -218 => "hash",

            -229 => "strong link",
            -228 => "parent link",

            -239 => "undefined",

            v if v <= Self::RESERVED_MAX.0 => "reserved",
            v if v >= 0 => "user",
            _ => "undefined subtype",
        }
    }
}

impl Default for Subtype {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<i32> for Subtype {
    fn from(raw: i32) -> Self {
        Subtype(raw)
    }
}

impl fmt::Debug for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subtype({} = {:?})", self.0, self.name())
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_classification() {
        assert!(Subtype(0).is_user_defined());
        assert!(Subtype(i32::MAX).is_user_defined());
        assert!(!Subtype::NORMAL.is_user_defined());

        assert!(Subtype(-256).is_reserved());
        assert!(Subtype(i32::MIN).is_reserved());
        assert!(!Subtype(-255).is_reserved());

        assert!(Subtype::NORMAL.is_text_string());
        assert!(Subtype::UUID.is_text_string());
        assert!(Subtype::CLOB.is_text_string());
        assert!(!Subtype::BLOB.is_text_string());

        assert!(Subtype::BLOB.is_binary_string());
        assert!(Subtype::BINARY_OBJECT_ID.is_binary_string());
        assert!(!Subtype::SYMBOL.is_binary_string());
    }

    #[test]
    fn names() {
        assert_eq!(Subtype::NORMAL.name(), "normal");
        assert_eq!(Subtype::BIGNUM.name(), "bignum");
        assert_eq!(Subtype(-300).name(), "reserved");
        assert_eq!(Subtype(12).name(), "user");
        assert_eq!(Subtype(-50).name(), "undefined subtype");
    }
}
