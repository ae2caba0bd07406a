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

//! Error types for dependency resolution and bean construction.

use std::fmt;

use super::DependencyKey;
use crate::common::BoxError;
use crate::validation::Violations;

/// Failure to supply a dependency from a container.
#[derive(Debug)]
pub enum ResolutionError {
    /// No registration matches the requested type and qualifiers.
    NotFound(DependencyKey),

    /// More than one registration matches; add qualifiers to pick one.
    Ambiguous {
        /// The request that matched several registrations.
        key: DependencyKey,
        /// How many registrations matched.
        candidates: usize,
    },

    /// The matching provider failed or produced a value of the wrong type.
    Provider {
        /// The request being served.
        key: DependencyKey,
        /// What went wrong.
        source: BoxError,
    },
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "Unsatisfied dependency: no bean matches {key}"),
            Self::Ambiguous { key, candidates } => write!(
                f,
                "Ambiguous dependency: {candidates} beans match {key}"
            ),
            Self::Provider { key, source } => {
                write!(f, "Provider for {key} failed: {source}")
            }
        }
    }
}

impl std::error::Error for ResolutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Provider { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// A bound value taken as a type other than the one it was bound as.
///
/// Returned by [`Arguments::take`](super::Arguments::take) when a constructor body reads
/// its arguments in a different order or type than its parameters were declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentError {
    /// Position of the offending argument, or the number of arguments when the list
    /// was exhausted.
    pub position: usize,
    /// The type the caller asked for.
    pub expected: &'static str,
    /// The type actually bound at that position, or `None` if no argument was left.
    pub found: Option<&'static str>,
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.found {
            Some(found) => write!(
                f,
                "Argument {} is bound as {found}, but was taken as {}",
                self.position, self.expected
            ),
            None => write!(
                f,
                "Argument {} does not exist; {} was requested",
                self.position, self.expected
            ),
        }
    }
}

impl std::error::Error for ArgumentError {}

/// Which parameter space a binding failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingScope {
    /// Constructor parameters.
    Constructor,
    /// Injectable fields.
    Fields,
}

impl fmt::Display for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constructor => f.write_str("constructor"),
            Self::Fields => f.write_str("field"),
        }
    }
}

/// The specific reason a bean could not be constructed.
#[derive(Debug)]
pub enum ConstructionFailure {
    /// The blueprint declares no constructor, or several without exactly one marked eligible.
    NoEligibleConstructor,

    /// Several constructors are marked eligible.
    AmbiguousConstructors(usize),

    /// The container could not supply a non-assisted parameter.
    Resolution {
        /// Constructor parameters or fields.
        scope: BindingScope,
        /// Name of the parameter being resolved.
        parameter: &'static str,
        /// The container's error.
        source: ResolutionError,
    },

    /// The number of assisted arguments does not match the assisted slots.
    ArgumentCountMismatch {
        /// Constructor parameters or fields.
        scope: BindingScope,
        /// Number of assisted slots declared.
        expected: usize,
        /// Number of assisted arguments supplied.
        supplied: usize,
    },

    /// An assisted argument's type differs from the declared parameter type.
    ArgumentTypeMismatch {
        /// Constructor parameters or fields.
        scope: BindingScope,
        /// Position of the parameter in its list.
        position: usize,
        /// Declared parameter type.
        expected: &'static str,
        /// Type of the supplied argument.
        found: &'static str,
    },

    /// A value flagged for validation violated its constraints.
    ParameterValidation {
        /// Constructor parameters or fields.
        scope: BindingScope,
        /// Name of the offending parameter.
        parameter: &'static str,
        /// The violated constraints.
        violations: Violations,
    },

    /// The constructor body failed (including reading its arguments out of order).
    Constructor(BoxError),

    /// A field setter received a value of an unexpected type.
    FieldAssignment {
        /// Name of the field.
        field: &'static str,
        /// The mismatch.
        source: ArgumentError,
    },

    /// A post-construct hook failed.
    PostConstruct {
        /// Name of the hook.
        hook: &'static str,
        /// The hook's error.
        source: BoxError,
    },
}

impl fmt::Display for ConstructionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEligibleConstructor => f.write_str("no eligible constructor"),
            Self::AmbiguousConstructors(count) => {
                write!(f, "{count} constructors are marked eligible")
            }
            Self::Resolution {
                scope,
                parameter,
                source,
            } => write!(f, "{scope} parameter `{parameter}`: {source}"),
            Self::ArgumentCountMismatch {
                scope,
                expected,
                supplied,
            } => write!(
                f,
                "{scope} expects {expected} assisted argument(s), {supplied} supplied"
            ),
            Self::ArgumentTypeMismatch {
                scope,
                position,
                expected,
                found,
            } => write!(
                f,
                "assisted {scope} parameter {position} is declared as {expected}, got {found}"
            ),
            Self::ParameterValidation {
                scope,
                parameter,
                violations,
            } => write!(
                f,
                "{scope} parameter `{parameter}` failed validation: {violations}"
            ),
            Self::Constructor(source) => write!(f, "constructor failed: {source}"),
            Self::FieldAssignment { field, source } => {
                write!(f, "field `{field}` could not be assigned: {source}")
            }
            Self::PostConstruct { hook, source } => {
                write!(f, "post-construct hook `{hook}` failed: {source}")
            }
        }
    }
}

impl std::error::Error for ConstructionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Resolution { source, .. } => Some(source),
            Self::FieldAssignment { source, .. } => Some(source),
            Self::Constructor(source) | Self::PostConstruct { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Bean construction failed. `cause` carries the specific reason.
#[derive(Debug)]
pub struct BeanConstructionError {
    /// Rust type name of the bean being built.
    pub bean: &'static str,
    /// Why construction failed.
    pub cause: ConstructionFailure,
}

impl BeanConstructionError {
    /// Returns `true` for an assisted argument count or type mismatch.
    #[must_use]
    pub const fn is_argument_mismatch(&self) -> bool {
        matches!(
            self.cause,
            ConstructionFailure::ArgumentCountMismatch { .. }
                | ConstructionFailure::ArgumentTypeMismatch { .. }
        )
    }

    /// Returns `true` if the container could not supply a dependency.
    #[must_use]
    pub const fn is_resolution_failure(&self) -> bool {
        matches!(self.cause, ConstructionFailure::Resolution { .. })
    }
}

impl fmt::Display for BeanConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Construction of {} failed: {}", self.bean, self.cause)
    }
}

impl std::error::Error for BeanConstructionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}
