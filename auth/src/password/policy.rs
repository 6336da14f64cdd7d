use super::errors::PasswordError;

/// Length bounds applied to every new password.
///
/// Lengths are counted in characters, not bytes, so multi-byte input is not
/// penalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    min_length: usize,
    max_length: usize,
}

impl PasswordPolicy {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length: max_length.max(min_length),
        }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Check a candidate password against the bounds.
    ///
    /// # Errors
    /// * `TooShort` - Fewer characters than the minimum
    /// * `TooLong` - More characters than the maximum
    pub fn check(&self, password: &str) -> Result<(), PasswordError> {
        let length = password.chars().count();

        if length < self.min_length {
            return Err(PasswordError::TooShort {
                min: self.min_length,
            });
        }
        if length > self.max_length {
            return Err(PasswordError::TooLong {
                max: self.max_length,
            });
        }
        Ok(())
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::new(8, 128)
    }
}
