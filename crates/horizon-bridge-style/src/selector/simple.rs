//! Simple selectors: the single tests a compound selector is built from.

use std::fmt;

use super::dependency::DependencyMap;
use super::specificity::{self, Rarity};
use super::tree::MatchTree;

/// Attribute value test operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeTest {
    /// `=`: exact match.
    Equals,
    /// `^=`: value starts with.
    Prefix,
    /// `$=`: value ends with.
    Suffix,
    /// `*=`: value contains.
    Substring,
    /// `~=`: whitespace-separated list contains the word.
    Includes,
    /// `|=`: exact match or prefix followed by `-`.
    DashMatch,
}

impl AttributeTest {
    /// Parse an operator token such as `"^="`.
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "=" => Self::Equals,
            "^=" => Self::Prefix,
            "$=" => Self::Suffix,
            "*=" => Self::Substring,
            "~=" => Self::Includes,
            "|=" => Self::DashMatch,
            _ => return None,
        })
    }

    /// The operator as written in CSS.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::Prefix => "^=",
            Self::Suffix => "$=",
            Self::Substring => "*=",
            Self::Includes => "~=",
            Self::DashMatch => "|=",
        }
    }

    /// Apply the test to an attribute's value.
    ///
    /// Operators other than `=` and `|=` never match an empty expected
    /// value; `~=` never matches one containing whitespace.
    pub fn test(self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Equals => actual == expected,
            Self::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            Self::Prefix => !expected.is_empty() && actual.starts_with(expected),
            Self::Suffix => !expected.is_empty() && actual.ends_with(expected),
            Self::Substring => !expected.is_empty() && actual.contains(expected),
            Self::Includes => {
                !expected.is_empty()
                    && !expected.contains(char::is_whitespace)
                    && actual.split_whitespace().any(|word| word == expected)
            }
        }
    }
}

/// A single selector test against one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    /// `*` matches every node.
    Universal,
    /// `#name` matches the node's CSS id.
    Id(String),
    /// `Name` matches the node's CSS type.
    Type(String),
    /// `.name` matches one of the node's classes.
    Class(String),
    /// `[name]`, `[name=value]`, ... matches an attribute.
    Attribute {
        name: String,
        test: Option<(AttributeTest, String)>,
    },
    /// `:name` matches an active pseudo-class.
    PseudoClass(String),
}

impl SimpleSelector {
    /// Returns true if the selector matches `node` in its current state.
    pub fn matches<T: MatchTree>(&self, tree: &T, node: T::Node) -> bool {
        match self {
            Self::Universal => true,
            Self::Id(id) => tree.css_id(node) == Some(id.as_str()),
            Self::Type(css_type) => tree.css_type(node) == css_type,
            Self::Class(class) => tree.has_class(node, class),
            Self::Attribute { name, test } => match (tree.attribute(node, name), test) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some((op, expected))) => op.test(actual, expected),
            },
            Self::PseudoClass(name) => tree.has_pseudo_class(node, name),
        }
    }

    /// Returns false only if no change of dynamic state can make the
    /// selector match `node`.
    pub fn may_match<T: MatchTree>(&self, tree: &T, node: T::Node) -> bool {
        if self.is_dynamic() {
            true
        } else {
            self.matches(tree, node)
        }
    }

    /// Record the dynamic state this selector reads on `node`.
    pub fn track_changes<N: Copy + Ord>(&self, node: N, deps: &mut DependencyMap<N>) {
        match self {
            Self::Attribute { name, .. } => deps.add_attribute(node, name),
            Self::PseudoClass(name) => deps.add_pseudo_class(node, name),
            _ => {}
        }
    }

    /// Match against `node`, recording dynamic dependencies.
    ///
    /// Dynamic selectors are tracked and accepted; the caller re-checks
    /// them with [`matches`](Self::matches) when deciding what applies.
    pub fn accumulate_changes<T: MatchTree>(
        &self,
        tree: &T,
        node: T::Node,
        deps: &mut DependencyMap<T::Node>,
    ) -> bool {
        if !self.is_dynamic() {
            return self.matches(tree, node);
        }
        self.track_changes(node, deps);
        true
    }

    /// Returns true if the match result depends on attributes or
    /// pseudo-classes.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Attribute { .. } | Self::PseudoClass(_))
    }

    /// The selector's specificity weight.
    pub fn specificity(&self) -> u32 {
        match self {
            Self::Universal => specificity::UNIVERSAL,
            Self::Id(_) => specificity::ID,
            Self::Type(_) => specificity::TYPE,
            Self::Class(_) => specificity::CLASS,
            Self::Attribute { .. } => specificity::ATTRIBUTE,
            Self::PseudoClass(_) => specificity::PSEUDO_CLASS,
        }
    }

    /// How selective the selector is for index bucket choice.
    pub fn rarity(&self) -> Rarity {
        match self {
            Self::Id(_) => Rarity::Id,
            Self::Class(_) => Rarity::Class,
            Self::Type(_) => Rarity::Type,
            Self::Universal | Self::Attribute { .. } | Self::PseudoClass(_) => Rarity::Universal,
        }
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Universal => f.write_str("*"),
            Self::Id(id) => write!(f, "#{id}"),
            Self::Type(css_type) => f.write_str(css_type),
            Self::Class(class) => write!(f, ".{class}"),
            Self::Attribute { name, test: None } => write!(f, "[{name}]"),
            Self::Attribute {
                name,
                test: Some((op, value)),
            } => write!(f, "[{name}{}{value:?}]", op.as_str()),
            Self::PseudoClass(name) => write!(f, ":{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_bridge_core::property::PropertyRegistry;
    use horizon_bridge_core::ViewTree;

    fn button() -> (ViewTree, horizon_bridge_core::NodeId) {
        let mut tree = ViewTree::new(PropertyRegistry::new());
        let node = tree.create_node("Button");
        tree.set_css_id(node, Some("ok".into())).unwrap();
        tree.add_class(node, "primary").unwrap();
        tree.set_attribute(node, "lang", "en-US").unwrap();
        (tree, node)
    }

    #[test]
    fn identity_selectors() {
        let (tree, node) = button();
        assert!(SimpleSelector::Universal.matches(&tree, node));
        assert!(SimpleSelector::Id("ok".into()).matches(&tree, node));
        assert!(!SimpleSelector::Id("cancel".into()).matches(&tree, node));
        assert!(SimpleSelector::Type("Button".into()).matches(&tree, node));
        assert!(!SimpleSelector::Type("Label".into()).matches(&tree, node));
        assert!(SimpleSelector::Class("primary".into()).matches(&tree, node));
    }

    #[test]
    fn attribute_tests() {
        let (tree, node) = button();
        let attr = |op: AttributeTest, value: &str| SimpleSelector::Attribute {
            name: "lang".into(),
            test: Some((op, value.into())),
        };

        let present = SimpleSelector::Attribute {
            name: "lang".into(),
            test: None,
        };
        assert!(present.matches(&tree, node));
        assert!(attr(AttributeTest::Equals, "en-US").matches(&tree, node));
        assert!(attr(AttributeTest::Prefix, "en").matches(&tree, node));
        assert!(attr(AttributeTest::Suffix, "US").matches(&tree, node));
        assert!(attr(AttributeTest::Substring, "n-U").matches(&tree, node));
        assert!(attr(AttributeTest::DashMatch, "en").matches(&tree, node));
        assert!(!attr(AttributeTest::DashMatch, "e").matches(&tree, node));
        assert!(!attr(AttributeTest::Prefix, "").matches(&tree, node));
    }

    #[test]
    fn includes_matches_whole_words() {
        assert!(AttributeTest::Includes.test("a bb c", "bb"));
        assert!(!AttributeTest::Includes.test("a bbb c", "bb"));
        assert!(!AttributeTest::Includes.test("a b", "a b"));
    }

    #[test]
    fn dynamic_selectors_track_even_when_not_matching() {
        let (tree, node) = button();
        let hover = SimpleSelector::PseudoClass("hover".into());
        let mut deps = DependencyMap::new();

        assert!(!hover.matches(&tree, node));
        assert!(hover.may_match(&tree, node));
        assert!(hover.accumulate_changes(&tree, node, &mut deps));
        assert!(deps.depends_on_pseudo_class(node, "hover"));
    }

    #[test]
    fn static_selectors_do_not_track() {
        let (tree, node) = button();
        let mut deps = DependencyMap::new();
        assert!(!SimpleSelector::Class("danger".into()).accumulate_changes(&tree, node, &mut deps));
        assert!(deps.is_empty());
    }

    #[test]
    fn display() {
        let attr = SimpleSelector::Attribute {
            name: "lang".into(),
            test: Some((AttributeTest::Prefix, "en".into())),
        };
        assert_eq!(attr.to_string(), "[lang^=\"en\"]");
        assert_eq!(SimpleSelector::PseudoClass("hover".into()).to_string(), ":hover");
        assert_eq!(SimpleSelector::Id("ok".into()).to_string(), "#ok");
    }
}
