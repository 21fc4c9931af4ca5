//! Selector specificity weights and index rarity.
//!
//! Specificity is a single weighted sum rather than the (a, b, c) triple of
//! browser CSS: an id counts 100, a class, attribute or pseudo-class 10, and
//! a type 1. Sequences and complex selectors sum their members.

/// Specificity of an id selector.
pub const ID: u32 = 100;
/// Specificity of a class selector.
pub const CLASS: u32 = 10;
/// Specificity of an attribute selector.
pub const ATTRIBUTE: u32 = 10;
/// Specificity of a pseudo-class selector.
pub const PSEUDO_CLASS: u32 = 10;
/// Specificity of a type selector.
pub const TYPE: u32 = 1;
/// Specificity of the universal selector.
pub const UNIVERSAL: u32 = 0;

/// How selective a simple selector is when choosing an index bucket.
///
/// The rarest member of a compound selector decides the bucket it is filed
/// under. Ranking is independent of specificity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rarity {
    /// Universal, attribute and pseudo-class selectors.
    Universal,
    /// Type selectors.
    Type,
    /// Class selectors.
    Class,
    /// Id selectors.
    Id,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rarity_ordering() {
        assert!(Rarity::Id > Rarity::Class);
        assert!(Rarity::Class > Rarity::Type);
        assert!(Rarity::Type > Rarity::Universal);
    }

    #[test]
    fn one_id_beats_nine_classes() {
        assert!(ID > 9 * CLASS + 9 * TYPE);
    }
}
