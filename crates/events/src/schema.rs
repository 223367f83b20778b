//! Field-level validation shared by every event family
//!
//! Decoding and validation are the same code path: a family's
//! [`Payload::read_fields`] either builds the typed payload or reports the
//! first [`Violation`] it hits. [`validate`] is that path with the payload
//! thrown away.

use pnlog_errors::Violation;
use pnlog_types::LoggedPkg;
use serde_json::{Map, Value};

use crate::events::{EventName, LogEvent};

/// Raw field map of one record.
pub type Fields = Map<String, Value>;

/// A family payload that knows its wire shape.
pub trait Payload: Sized {
    /// Event family this payload is emitted under.
    const FAMILY: EventName;

    /// Write the payload's fields into an envelope.
    fn write_fields(&self, out: &mut Fields);

    /// Consume the payload's fields from `fields`.
    ///
    /// Fields that are not part of the payload are left in place so the
    /// caller can report them with [`FieldReader::finish`].
    ///
    /// # Errors
    ///
    /// Returns the first [`Violation`] of the family's variant rules.
    fn read_fields(fields: &mut FieldReader) -> Result<Self, Violation>;
}

/// Consuming view over a record's fields.
#[derive(Debug, Clone, Default)]
pub struct FieldReader {
    fields: Fields,
}

impl FieldReader {
    #[must_use]
    pub fn new(fields: Fields) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Remove a field without interpreting it.
    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Hand over every field not consumed yet.
    pub fn take_rest(&mut self) -> Fields {
        std::mem::take(&mut self.fields)
    }

    fn required(&mut self, key: &str) -> Result<Value, Violation> {
        self.take(key).ok_or_else(|| Violation::missing(key))
    }

    /// # Errors
    ///
    /// Missing field, or a value that is not a string.
    pub fn string(&mut self, key: &str) -> Result<String, Violation> {
        match self.required(key)? {
            Value::String(value) => Ok(value),
            _ => Err(Violation::invalid(key, "a string")),
        }
    }

    /// Optional string: absent is `None`, `null` is not accepted.
    ///
    /// # Errors
    ///
    /// A present value that is not a string.
    pub fn optional_string(&mut self, key: &str) -> Result<Option<String>, Violation> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value)),
            Some(_) => Err(Violation::invalid(key, "a string")),
        }
    }

    /// # Errors
    ///
    /// Missing field, or a value that is not a non-negative integer.
    pub fn unsigned(&mut self, key: &str) -> Result<u64, Violation> {
        let value = self.required(key)?;
        value
            .as_u64()
            .ok_or_else(|| Violation::invalid(key, "a non-negative integer"))
    }

    /// Required field whose value may be `null`.
    ///
    /// # Errors
    ///
    /// Missing field, or a value that is neither `null` nor a non-negative integer.
    pub fn nullable_unsigned(&mut self, key: &str) -> Result<Option<u64>, Violation> {
        match self.required(key)? {
            Value::Null => Ok(None),
            value => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| Violation::invalid(key, "a non-negative integer or null")),
        }
    }

    /// # Errors
    ///
    /// Missing field, or a value outside the `u32` range.
    pub fn unsigned_u32(&mut self, key: &str) -> Result<u32, Violation> {
        let value = self.unsigned(key)?;
        u32::try_from(value).map_err(|_| Violation::invalid(key, "a 32-bit unsigned integer"))
    }

    /// # Errors
    ///
    /// Missing field, or a value outside the `i32` range.
    pub fn signed_i32(&mut self, key: &str) -> Result<i32, Violation> {
        let value = self.required(key)?;
        value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| Violation::invalid(key, "a 32-bit integer"))
    }

    /// Open a nested object field. Violations found inside it should be
    /// reported through [`Violation::nested`].
    ///
    /// # Errors
    ///
    /// Missing field, or a value that is not an object.
    pub fn object(&mut self, key: &str) -> Result<FieldReader, Violation> {
        match self.required(key)? {
            Value::Object(fields) => Ok(FieldReader::new(fields)),
            _ => Err(Violation::invalid(key, "an object")),
        }
    }

    /// Read a package descriptor stored under `key`.
    ///
    /// # Errors
    ///
    /// Any violation inside the descriptor, qualified with `key`.
    pub fn logged_pkg(&mut self, key: &str) -> Result<LoggedPkg, Violation> {
        let mut pkg = self.object(key)?;
        read_logged_pkg(&mut pkg).map_err(|violation| violation.nested(key))
    }

    /// Fail if any field was left unconsumed.
    ///
    /// # Errors
    ///
    /// [`Violation::UnexpectedFields`] listing the leftover keys.
    pub fn finish(self) -> Result<(), Violation> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(Violation::unexpected(self.fields.into_iter().map(|(key, _)| key)))
        }
    }
}

fn read_logged_pkg(pkg: &mut FieldReader) -> Result<LoggedPkg, Violation> {
    let raw_spec = pkg.string("rawSpec")?;
    let name = pkg.string("name")?;
    let dependent_id = pkg.optional_string("dependentId")?;
    std::mem::take(pkg).finish()?;
    Ok(LoggedPkg {
        raw_spec,
        name,
        dependent_id,
    })
}

/// Wire form of a package descriptor.
#[must_use]
pub fn logged_pkg_value(pkg: &LoggedPkg) -> Value {
    let mut out = Fields::new();
    out.insert("rawSpec".into(), pkg.raw_spec.clone().into());
    out.insert("name".into(), pkg.name.clone().into());
    if let Some(dependent_id) = &pkg.dependent_id {
        out.insert("dependentId".into(), dependent_id.clone().into());
    }
    Value::Object(out)
}

/// Read and fully validate the payload of one event family.
///
/// `fields` must no longer contain the envelope keys.
///
/// # Errors
///
/// The first [`Violation`] found, including leftover fields.
pub fn read_event(family: EventName, fields: Fields) -> Result<LogEvent, Violation> {
    let mut reader = FieldReader::new(fields);
    let event = LogEvent::read_fields(family, &mut reader)?;
    reader.finish()?;
    Ok(event)
}

/// Validation predicate for a family payload.
///
/// # Errors
///
/// The first [`Violation`] found.
pub fn validate(family: EventName, fields: &Fields) -> Result<(), Violation> {
    read_event(family, fields.clone()).map(|_| ())
}
