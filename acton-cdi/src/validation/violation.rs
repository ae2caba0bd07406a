/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
use std::fmt;

/// One violated constraint: where it was violated and why.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstraintViolation {
    path: String,
    message: String,
}

impl ConstraintViolation {
    /// Creates a violation for the value at `path` (e.g. `"quantity"` or `"lines[2].sku"`).
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The property path of the offending value.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The human-readable constraint message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// The set of violations reported by one validation pass. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<ConstraintViolation>);

impl Violations {
    /// An empty (valid) result.
    #[must_use]
    pub const fn none() -> Self {
        Self(Vec::new())
    }

    /// Records a violation.
    pub fn push(&mut self, violation: ConstraintViolation) {
        self.0.push(violation);
    }

    /// Records a violation built from `path` and `message`, returning `self` for chaining.
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, message: impl Into<String>) -> Self {
        self.push(ConstraintViolation::new(path, message));
        self
    }

    /// Records a violation at `path` unless `holds` is true.
    pub fn check(&mut self, holds: bool, path: impl Into<String>, message: impl Into<String>) {
        if !holds {
            self.push(ConstraintViolation::new(path, message));
        }
    }

    /// Appends every violation from `other`.
    pub fn extend(&mut self, other: Violations) {
        self.0.extend(other.0);
    }

    /// Returns `true` if no constraint was violated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the violations in the order they were recorded.
    pub fn iter(&self) -> std::slice::Iter<'_, ConstraintViolation> {
        self.0.iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, violation) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl FromIterator<ConstraintViolation> for Violations {
    fn from_iter<I: IntoIterator<Item = ConstraintViolation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Violations {
    type Item = ConstraintViolation;
    type IntoIter = std::vec::IntoIter<ConstraintViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a ConstraintViolation;
    type IntoIter = std::slice::Iter<'a, ConstraintViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_records_only_failed_constraints() {
        let mut violations = Violations::none();
        violations.check(true, "name", "must not be blank");
        violations.check(false, "quantity", "must be positive");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.to_string(), "quantity: must be positive");
    }

    #[test]
    fn display_joins_with_semicolons() {
        let violations = Violations::none()
            .with("a", "bad")
            .with("b", "worse");
        assert_eq!(violations.to_string(), "a: bad; b: worse");
    }
}
