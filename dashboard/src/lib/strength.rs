use std::fmt;

const SYMBOLS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

/// 0 to 100 in steps of 25: length of at least 8, a lowercase letter, an
/// uppercase letter, a digit or symbol.
pub fn score(password: &str) -> u8 {
    let checks = [
        password.chars().count() >= 8,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password
            .chars()
            .any(|c| c.is_ascii_digit() || SYMBOLS.contains(c)),
    ];

    checks.iter().filter(|passed| **passed).count() as u8 * 25
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    NoPassword,
    Weak,
    Fair,
    Good,
    Strong,
}

impl Strength {
    pub fn from_score(score: u8) -> Self {
        match score {
            0 => Strength::NoPassword,
            1..=25 => Strength::Weak,
            26..=50 => Strength::Fair,
            51..=75 => Strength::Good,
            _ => Strength::Strong,
        }
    }

    pub fn of(password: &str) -> Self {
        Self::from_score(score(password))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Strength::NoPassword => "No password",
            Strength::Weak => "Weak",
            Strength::Fair => "Fair",
            Strength::Good => "Good",
            Strength::Strong => "Strong",
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
