//! Query matching and update application
//!
//! Supports exactly what the lock protocol sends:
//! - query: field equality, plus a top-level `$or` of equality clauses
//! - update: `$set`, or a full replacement document

use bson::{Bson, Document};

use crate::types::bson_integer;

/// Why a query or update could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MatchError(pub String);

/// Equality that treats all integral number widths alike
fn values_equal(left: &Bson, right: &Bson) -> bool {
    match (bson_integer(left), bson_integer(right)) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

/// Whether `doc` satisfies `query`
pub(crate) fn matches(doc: &Document, query: &Document) -> Result<bool, MatchError> {
    for (key, expected) in query {
        if key == "$or" {
            let clauses = match expected {
                Bson::Array(clauses) if !clauses.is_empty() => clauses,
                _ => return Err(MatchError("$or requires a nonempty array".to_string())),
            };

            let mut any = false;
            for clause in clauses {
                let clause = match clause {
                    Bson::Document(clause) => clause,
                    _ => return Err(MatchError("$or entries must be objects".to_string())),
                };
                if matches(doc, clause)? {
                    any = true;
                    break;
                }
            }
            if !any {
                return Ok(false);
            }
            continue;
        }

        if key.starts_with('$') {
            return Err(MatchError(format!("unknown top level operator: {}", key)));
        }

        match doc.get(key) {
            Some(actual) if values_equal(actual, expected) => {}
            None if *expected == Bson::Null => {}
            _ => return Ok(false),
        }
    }

    Ok(true)
}

/// Fields an upsert seeds the new document with
///
/// Only top-level equalities are used; `$or` clauses are ambiguous and
/// contribute nothing.
pub(crate) fn upsert_seed(query: &Document) -> Document {
    query
        .iter()
        .filter(|(key, _)| !key.starts_with('$'))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Apply `update` to `doc` in place
pub(crate) fn apply_update(doc: &mut Document, update: &Document) -> Result<(), MatchError> {
    let is_operator_update = update.keys().next().map_or(false, |k| k.starts_with('$'));

    if !is_operator_update {
        if update.keys().any(|k| k.starts_with('$')) {
            return Err(MatchError("cannot mix operators and fields in update".to_string()));
        }
        let id = doc.get("_id").cloned();
        *doc = update.clone();
        if let Some(id) = id {
            doc.insert("_id", id);
        }
        return Ok(());
    }

    for (op, fields) in update {
        match (op.as_str(), fields) {
            ("$set", Bson::Document(fields)) => {
                for (field, value) in fields {
                    if field == "_id" && doc.get("_id").map_or(false, |id| id != value) {
                        return Err(MatchError("cannot modify the immutable field '_id'".to_string()));
                    }
                    doc.insert(field.clone(), value.clone());
                }
            }
            ("$set", _) => return Err(MatchError("$set requires an object".to_string())),
            (other, _) => {
                return Err(MatchError(format!("unsupported update operator: {}", other)))
            }
        }
    }

    Ok(())
}
