//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. Two quantities of
/// 30 are the same quantity; two bases named "North" are still different bases.
///
/// To "modify" a value object, construct a new one. Constructors are the place
/// to validate, so a value object that exists is always valid.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
