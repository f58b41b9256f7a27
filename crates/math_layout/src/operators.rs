//! Operator dictionary - spacing class and limit behavior of operator text

use crate::tex_class::TexClass;

/// What the dictionary knows about an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorEntry {
    pub class: TexClass,
    /// Drawn in a larger size in display style
    pub largeop: bool,
    /// Limits move to script positions outside display style
    pub movablelimits: bool,
}

impl OperatorEntry {
    const fn new(class: TexClass) -> Self {
        Self {
            class,
            largeop: false,
            movablelimits: false,
        }
    }

    const fn big(movablelimits: bool) -> Self {
        Self {
            class: TexClass::Op,
            largeop: true,
            movablelimits,
        }
    }
}

/// Look up an operator's dictionary entry
pub fn lookup(text: &str) -> Option<OperatorEntry> {
    let mut chars = text.chars();
    let (Some(ch), None) = (chars.next(), chars.next()) else {
        // Multi-letter operators such as "lim" or "max" take limits.
        if !text.is_empty() && text.chars().all(char::is_alphabetic) {
            return Some(OperatorEntry {
                class: TexClass::Op,
                largeop: false,
                movablelimits: true,
            });
        }
        return None;
    };
    let entry = match ch {
        '+' | '-' | '\u{2212}' | '*' | '\u{00B1}' | '\u{2213}' | '\u{00D7}' | '\u{00F7}'
        | '\u{22C5}' | '\u{00B7}' | '\u{2218}' | '\u{222A}' | '\u{2229}' | '\u{2227}'
        | '\u{2228}' | '\u{2216}' | '\u{2295}' | '\u{2297}' => OperatorEntry::new(TexClass::Bin),
        '=' | '<' | '>' | ':' | '\u{2264}' | '\u{2265}' | '\u{2260}' | '\u{2248}'
        | '\u{2261}' | '\u{223C}' | '\u{2243}' | '\u{221D}' | '\u{2208}' | '\u{2209}'
        | '\u{2282}' | '\u{2283}' | '\u{2286}' | '\u{2287}' | '\u{2192}' | '\u{2190}'
        | '\u{2194}' | '\u{21D2}' | '\u{21D0}' | '\u{21D4}' => OperatorEntry::new(TexClass::Rel),
        '(' | '[' | '{' | '\u{27E8}' | '\u{230A}' | '\u{2308}' => {
            OperatorEntry::new(TexClass::Open)
        }
        ')' | ']' | '}' | '!' | '\u{27E9}' | '\u{230B}' | '\u{2309}' => {
            OperatorEntry::new(TexClass::Close)
        }
        ',' | ';' => OperatorEntry::new(TexClass::Punct),
        '|' | '/' | '\'' | '.' | '^' | '_' | '~' | '\u{00AF}' | '\u{2032}' | '\u{2033}'
        | '\u{221E}' | '\u{2202}' | '\u{2207}' => OperatorEntry::new(TexClass::Ord),
        '\u{2211}' | '\u{220F}' | '\u{2210}' | '\u{22C3}' | '\u{22C2}' | '\u{22C1}'
        | '\u{22C0}' | '\u{2A01}' | '\u{2A02}' => OperatorEntry::big(true),
        '\u{222B}' | '\u{222C}' | '\u{222D}' | '\u{222E}' => OperatorEntry::big(false),
        _ => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_classes() {
        assert_eq!(lookup("+").unwrap().class, TexClass::Bin);
        assert_eq!(lookup("=").unwrap().class, TexClass::Rel);
        assert_eq!(lookup("(").unwrap().class, TexClass::Open);
        assert_eq!(lookup(")").unwrap().class, TexClass::Close);
        assert_eq!(lookup(",").unwrap().class, TexClass::Punct);
        assert!(lookup("\u{2603}").is_none());
    }

    #[test]
    fn test_big_operators() {
        let sum = lookup("\u{2211}").unwrap();
        assert!(sum.largeop && sum.movablelimits);

        let int = lookup("\u{222B}").unwrap();
        assert!(int.largeop && !int.movablelimits);

        let lim = lookup("lim").unwrap();
        assert_eq!(lim.class, TexClass::Op);
        assert!(!lim.largeop && lim.movablelimits);
    }
}
