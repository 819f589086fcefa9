use crate::object::Kind;
use serde::{ser::SerializeSeq, Serialize, Serializer};
use std::collections::{btree_map, BTreeMap, BTreeSet};

/// Uniquely identifies an object in a validation result map.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ValidationKey {
    #[serde(rename = "objectType")]
    pub kind: Kind,
    pub namespace: String,
    pub name: String,
}

/// How severe a finding is. Only `Error` affects an object's validity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Correction,
    Warning,
    Error,
}

/// A single finding: an opaque catalog code, its severity and a locator into the object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Check {
    pub code: &'static str,
    pub severity: Severity,
    pub path: String,
}

/// An append-only sequence of checks that ignores exact duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Checks(Vec<Check>);

/// All findings for a single object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "objectType")]
    pub kind: Kind,
    pub valid: bool,
    pub checks: Checks,
    pub references: BTreeSet<ValidationKey>,
}

/// Validation results keyed by object identity.
///
/// Iteration (and therefore serialization) order is the key order, so identical inputs always
/// produce identical output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Validations(BTreeMap<ValidationKey, Validation>);

// === impl ValidationKey ===

impl ValidationKey {
    /// # Panics
    ///
    /// Objects without a name or namespace cannot be identified; callers must reject them before
    /// they reach a checker.
    pub fn new(kind: Kind, namespace: impl ToString, name: impl ToString) -> Self {
        let namespace = namespace.to_string();
        let name = name.to_string();
        assert!(!name.is_empty(), "{kind} must have a name");
        assert!(!namespace.is_empty(), "{kind} {name} must have a namespace");
        Self {
            kind,
            namespace,
            name,
        }
    }
}

// === impl Check ===

impl Check {
    pub fn new(code: &'static str, severity: Severity, path: impl ToString) -> Self {
        Self {
            code,
            severity,
            path: path.to_string(),
        }
    }

    pub fn error(code: &'static str, path: impl ToString) -> Self {
        Self::new(code, Severity::Error, path)
    }

    pub fn warning(code: &'static str, path: impl ToString) -> Self {
        Self::new(code, Severity::Warning, path)
    }

    pub fn correction(code: &'static str, path: impl ToString) -> Self {
        Self::new(code, Severity::Correction, path)
    }

    pub fn info(code: &'static str, path: impl ToString) -> Self {
        Self::new(code, Severity::Info, path)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

// === impl Checks ===

impl Checks {
    /// Appends a check, returning false if an identical check is already present.
    pub fn push(&mut self, check: Check) -> bool {
        if self.0.contains(&check) {
            return false;
        }
        self.0.push(check);
        true
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Check> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Check::is_error)
    }
}

impl std::ops::Index<usize> for Checks {
    type Output = Check;

    fn index(&self, idx: usize) -> &Check {
        &self.0[idx]
    }
}

impl Extend<Check> for Checks {
    fn extend<T: IntoIterator<Item = Check>>(&mut self, iter: T) {
        for check in iter {
            self.push(check);
        }
    }
}

impl<'c> IntoIterator for &'c Checks {
    type Item = &'c Check;
    type IntoIter = std::slice::Iter<'c, Check>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// === impl Validation ===

impl Validation {
    /// An empty, valid result for the given object.
    pub fn new(key: &ValidationKey) -> Self {
        Self {
            name: key.name.clone(),
            namespace: key.namespace.clone(),
            kind: key.kind,
            valid: true,
            checks: Checks::default(),
            references: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> ValidationKey {
        ValidationKey {
            kind: self.kind,
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }

    pub fn add_check(&mut self, check: Check) {
        self.valid &= !check.is_error();
        self.checks.push(check);
    }

    pub fn add_checks(&mut self, checks: impl IntoIterator<Item = Check>) {
        for check in checks {
            self.add_check(check);
        }
    }

    pub fn add_reference(&mut self, key: ValidationKey) {
        self.references.insert(key);
    }

    /// Folds another result for the same object into this one.
    pub fn merge(&mut self, other: Validation) {
        debug_assert_eq!(self.key(), other.key());
        self.valid &= other.valid;
        self.checks.extend(other.checks.0);
        self.references.extend(other.references);
    }
}

// === impl Validations ===

impl Validations {
    /// Returns the result for `key`, creating an empty, valid one if needed.
    pub fn entry(&mut self, key: ValidationKey) -> &mut Validation {
        match self.0.entry(key) {
            btree_map::Entry::Occupied(entry) => entry.into_mut(),
            btree_map::Entry::Vacant(entry) => {
                let validation = Validation::new(entry.key());
                entry.insert(validation)
            }
        }
    }

    pub fn insert(&mut self, validation: Validation) {
        match self.0.entry(validation.key()) {
            btree_map::Entry::Occupied(mut entry) => entry.get_mut().merge(validation),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(validation);
            }
        }
    }

    /// Unions disjoint keys; for shared keys concatenates checks, ANDs validity and unions
    /// references.
    pub fn merge(&mut self, other: Validations) {
        for validation in other.0.into_values() {
            self.insert(validation);
        }
    }

    pub fn get(&self, key: &ValidationKey) -> Option<&Validation> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &ValidationKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ValidationKey> + '_ {
        self.0.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Validation> + '_ {
        self.0.values()
    }
}

impl FromIterator<Validation> for Validations {
    fn from_iter<T: IntoIterator<Item = Validation>>(iter: T) -> Self {
        let mut validations = Self::default();
        for validation in iter {
            validations.insert(validation);
        }
        validations
    }
}

impl IntoIterator for Validations {
    type Item = (ValidationKey, Validation);
    type IntoIter = btree_map::IntoIter<ValidationKey, Validation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for Validations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for validation in self.0.values() {
            seq.serialize_element(validation)?;
        }
        seq.end()
    }
}
