use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::XrayFluoError;

/// Atomic subshell, ordered from most to least bound.
///
/// The discriminant is the rank used by the cascade: every transition moves a
/// vacancy to a subshell of strictly greater rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subshell {
    K,
    L1,
    L2,
    L3,
    M1,
    M2,
    M3,
    M4,
    M5,
    N1,
    N2,
    N3,
    N4,
    N5,
    N6,
    N7,
    O1,
    O2,
    O3,
    O4,
    O5,
    O6,
    O7,
    P1,
    P2,
    P3,
}

impl Subshell {
    pub const ALL: [Subshell; 26] = [
        Subshell::K,
        Subshell::L1,
        Subshell::L2,
        Subshell::L3,
        Subshell::M1,
        Subshell::M2,
        Subshell::M3,
        Subshell::M4,
        Subshell::M5,
        Subshell::N1,
        Subshell::N2,
        Subshell::N3,
        Subshell::N4,
        Subshell::N5,
        Subshell::N6,
        Subshell::N7,
        Subshell::O1,
        Subshell::O2,
        Subshell::O3,
        Subshell::O4,
        Subshell::O5,
        Subshell::O6,
        Subshell::O7,
        Subshell::P1,
        Subshell::P2,
        Subshell::P3,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn rank(self) -> usize {
        self as usize
    }

    pub fn from_rank(rank: usize) -> Option<Self> {
        Self::ALL.get(rank).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Subshell::K => "K",
            Subshell::L1 => "L1",
            Subshell::L2 => "L2",
            Subshell::L3 => "L3",
            Subshell::M1 => "M1",
            Subshell::M2 => "M2",
            Subshell::M3 => "M3",
            Subshell::M4 => "M4",
            Subshell::M5 => "M5",
            Subshell::N1 => "N1",
            Subshell::N2 => "N2",
            Subshell::N3 => "N3",
            Subshell::N4 => "N4",
            Subshell::N5 => "N5",
            Subshell::N6 => "N6",
            Subshell::N7 => "N7",
            Subshell::O1 => "O1",
            Subshell::O2 => "O2",
            Subshell::O3 => "O3",
            Subshell::O4 => "O4",
            Subshell::O5 => "O5",
            Subshell::O6 => "O6",
            Subshell::O7 => "O7",
            Subshell::P1 => "P1",
            Subshell::P2 => "P2",
            Subshell::P3 => "P3",
        }
    }

    /// Letter of the principal shell: `'K'`, `'L'`, `'M'`, ...
    pub fn principal(self) -> char {
        match self.name().as_bytes()[0] {
            b'K' => 'K',
            b'L' => 'L',
            b'M' => 'M',
            b'N' => 'N',
            b'O' => 'O',
            _ => 'P',
        }
    }

    /// 1-based position inside the principal shell (`K` is 1).
    pub fn index_in_shell(self) -> usize {
        let first = Self::ALL
            .iter()
            .position(|s| s.principal() == self.principal())
            .unwrap_or(0);
        self.rank() - first + 1
    }

    /// Subshell of the same principal shell at a 1-based position.
    pub fn sibling(self, index: usize) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|s| s.principal() == self.principal())
            .nth(index.checked_sub(1)?)
    }

    pub fn same_shell(self, other: Subshell) -> bool {
        self.principal() == other.principal()
    }

    /// Split a transition label such as `"L3M5"` or `"KL2L3"` into its leading
    /// subshell and the remainder.
    pub fn parse_prefix(label: &str) -> Option<(Subshell, &str)> {
        let bytes = label.as_bytes();
        let first = *bytes.first()?;
        let len = if first == b'K' {
            1
        } else if bytes.len() >= 2 && bytes[1].is_ascii_digit() {
            2
        } else {
            return None;
        };
        let subshell = label[..len].parse().ok()?;
        Some((subshell, &label[len..]))
    }
}

impl fmt::Display for Subshell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Subshell {
    type Err = XrayFluoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|sub| sub.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| XrayFluoError::UnknownSubshell(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_order() {
        assert!(Subshell::K < Subshell::L1);
        assert!(Subshell::L3 < Subshell::M1);
        assert_eq!(Subshell::K.rank(), 0);
        assert_eq!(Subshell::P3.rank(), Subshell::COUNT - 1);
        for (i, s) in Subshell::ALL.iter().enumerate() {
            assert_eq!(s.rank(), i);
            assert_eq!(Subshell::from_rank(i), Some(*s));
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("L3".parse::<Subshell>().unwrap(), Subshell::L3);
        assert_eq!("m5".parse::<Subshell>().unwrap(), Subshell::M5);
        assert!("L4".parse::<Subshell>().is_err());
        assert!("".parse::<Subshell>().is_err());
    }

    #[test]
    fn test_parse_prefix() {
        assert_eq!(Subshell::parse_prefix("KL3"), Some((Subshell::K, "L3")));
        assert_eq!(Subshell::parse_prefix("L1L3M5"), Some((Subshell::L1, "L3M5")));
        assert_eq!(Subshell::parse_prefix("M5"), Some((Subshell::M5, "")));
        assert_eq!(Subshell::parse_prefix("Q1"), None);
        assert_eq!(Subshell::parse_prefix("L"), None);
    }

    #[test]
    fn test_shell_structure() {
        assert_eq!(Subshell::K.principal(), 'K');
        assert_eq!(Subshell::M4.principal(), 'M');
        assert_eq!(Subshell::M4.index_in_shell(), 4);
        assert_eq!(Subshell::L1.sibling(3), Some(Subshell::L3));
        assert_eq!(Subshell::L1.sibling(4), None);
        assert_eq!(Subshell::L1.sibling(0), None);
        assert!(Subshell::L1.same_shell(Subshell::L3));
        assert!(!Subshell::L3.same_shell(Subshell::M1));
    }
}
