//! Selector matching for `query_selector` / `query_selector_all`
//!
//! Supports type, universal, id, class and attribute selectors, the
//! descendant and child combinators, and comma-separated lists.

use crate::{DomError, DomResult, DomTree, ElementData, NodeId};

/// Simple selector types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// Universal selector (*)
    Universal,
    /// Tag name selector (div, span, etc.)
    Tag(Box<str>),
    /// Class selector (.class)
    Class(Box<str>),
    /// ID selector (#id)
    Id(Box<str>),
    /// Attribute existence ([attr])
    AttrExists(Box<str>),
    /// Attribute equals ([attr=value])
    AttrEquals(Box<str>, Box<str>),
    /// Whitespace list contains ([attr~=value])
    AttrIncludes(Box<str>, Box<str>),
    /// Attribute starts with ([attr^=value])
    AttrStarts(Box<str>, Box<str>),
    /// Attribute ends with ([attr$=value])
    AttrEnds(Box<str>, Box<str>),
    /// Attribute contains ([attr*=value])
    AttrContains(Box<str>, Box<str>),
}

impl SimpleSelector {
    /// Match against an element
    pub fn matches(&self, element: &ElementData) -> bool {
        let attr = |name: &str| element.get_attr(name);
        match self {
            Self::Universal => true,
            Self::Tag(tag) => element.tag.eq_ignore_ascii_case(tag),
            Self::Class(class) => element.classes().any(|c| c == &**class),
            Self::Id(id) => element.id() == Some(&**id),
            Self::AttrExists(name) => element.has_attr(name),
            Self::AttrEquals(name, value) => attr(name) == Some(&**value),
            Self::AttrIncludes(name, value) => {
                attr(name).is_some_and(|v| v.split_whitespace().any(|w| w == &**value))
            }
            Self::AttrStarts(name, value) => {
                !value.is_empty() && attr(name).is_some_and(|v| v.starts_with(&**value))
            }
            Self::AttrEnds(name, value) => {
                !value.is_empty() && attr(name).is_some_and(|v| v.ends_with(&**value))
            }
            Self::AttrContains(name, value) => {
                !value.is_empty() && attr(name).is_some_and(|v| v.contains(&**value))
            }
        }
    }
}

/// Compound selector (multiple simple selectors that must all match)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    pub selectors: Vec<SimpleSelector>,
}

impl CompoundSelector {
    pub fn matches(&self, element: &ElementData) -> bool {
        self.selectors.iter().all(|s| s.matches(element))
    }
}

/// Relationship between a compound and the one to its left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// Compounds joined by combinators, stored right-to-left
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound (the subject)
    pub subject: CompoundSelector,
    /// Remaining compounds, nearest first, each with the combinator that binds it
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Comma-separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

impl SelectorList {
    /// Parse selector text
    pub fn parse(text: &str) -> DomResult<Self> {
        let invalid = || DomError::InvalidSelector(text.to_string());
        let mut list = Vec::new();
        for part in split_top_level(text) {
            let complex = parse_complex(part).ok_or_else(invalid)?;
            list.push(complex);
        }
        if list.is_empty() {
            return Err(invalid());
        }
        Ok(Self(list))
    }

    /// Check whether the element `id` matches any selector of the list
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        self.0.iter().any(|complex| matches_complex(tree, id, complex))
    }
}

fn matches_complex(tree: &DomTree, id: NodeId, complex: &ComplexSelector) -> bool {
    let Some(element) = tree.element(id) else {
        return false;
    };
    if !complex.subject.matches(element) {
        return false;
    }
    matches_ancestors(tree, id, &complex.ancestors)
}

fn matches_ancestors(tree: &DomTree, id: NodeId, rest: &[(Combinator, CompoundSelector)]) -> bool {
    let Some(((combinator, compound), tail)) = rest.split_first() else {
        return true;
    };
    let mut current = tree.parent(id);
    while let Some(parent) = current {
        if let Some(element) = tree.element(parent) {
            if compound.matches(element) && matches_ancestors(tree, parent, tail) {
                return true;
            }
        }
        if *combinator == Combinator::Child {
            return false;
        }
        current = tree.parent(parent);
    }
    false
}

/// Split on commas outside brackets and quotes
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn parse_complex(text: &str) -> Option<ComplexSelector> {
    // left-to-right; each entry's combinator binds it to the entry before it
    let mut compounds: Vec<(Combinator, CompoundSelector)> = Vec::new();
    let mut chars = text.trim().chars().peekable();
    let mut combinator = Combinator::Descendant;
    loop {
        let compound = parse_compound(&mut chars)?;
        compounds.push((combinator, compound));
        let saw_space = skip_spaces(&mut chars);
        match chars.peek() {
            None => break,
            Some('>') => {
                chars.next();
                skip_spaces(&mut chars);
                combinator = Combinator::Child;
            }
            Some(_) if saw_space => combinator = Combinator::Descendant,
            Some(_) => return None,
        }
    }

    let mut rev = compounds.into_iter().rev();
    let (mut binding, subject) = rev.next()?;
    let mut ancestors = Vec::new();
    for (combinator, compound) in rev {
        ancestors.push((binding, compound));
        binding = combinator;
    }
    Some(ComplexSelector { subject, ancestors })
}

fn parse_compound(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<CompoundSelector> {
    let mut selectors = Vec::new();
    loop {
        match chars.peek().copied() {
            Some('*') => {
                chars.next();
                selectors.push(SimpleSelector::Universal);
            }
            Some('#') => {
                chars.next();
                selectors.push(SimpleSelector::Id(read_ident(chars)?.into()));
            }
            Some('.') => {
                chars.next();
                selectors.push(SimpleSelector::Class(read_ident(chars)?.into()));
            }
            Some('[') => {
                chars.next();
                selectors.push(parse_attribute(chars)?);
            }
            Some(c) if is_ident_char(c) => {
                selectors.push(SimpleSelector::Tag(read_ident(chars)?.into()));
            }
            _ => break,
        }
    }
    if selectors.is_empty() {
        None
    } else {
        Some(CompoundSelector { selectors })
    }
}

fn parse_attribute(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<SimpleSelector> {
    skip_spaces(chars);
    let name = read_ident(chars)?;
    skip_spaces(chars);
    let op = match chars.next()? {
        ']' => return Some(SimpleSelector::AttrExists(name.into())),
        '=' => '=',
        c @ ('~' | '^' | '$' | '*') => {
            if chars.next()? != '=' {
                return None;
            }
            c
        }
        _ => return None,
    };
    skip_spaces(chars);
    let value = match chars.peek().copied()? {
        q @ ('"' | '\'') => {
            chars.next();
            let mut value = String::new();
            loop {
                let c = chars.next()?;
                if c == q {
                    break;
                }
                value.push(c);
            }
            value
        }
        _ => read_ident(chars)?,
    };
    skip_spaces(chars);
    if chars.next()? != ']' {
        return None;
    }
    let (name, value): (Box<str>, Box<str>) = (name.into(), value.into());
    Some(match op {
        '=' => SimpleSelector::AttrEquals(name, value),
        '~' => SimpleSelector::AttrIncludes(name, value),
        '^' => SimpleSelector::AttrStarts(name, value),
        '$' => SimpleSelector::AttrEnds(name, value),
        _ => SimpleSelector::AttrContains(name, value),
    })
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn read_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    if ident.is_empty() { None } else { Some(ident) }
}

fn skip_spaces(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> bool {
    let mut skipped = false;
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
        skipped = true;
    }
    skipped
}
