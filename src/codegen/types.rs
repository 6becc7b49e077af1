//! Re-derivation of normalized types and array/record layout during code
//! generation, deliberately independent of `sema`'s own type normalization —
//! by the time code generation runs the program is already known-valid, so
//! this pass does not need to re-validate, only to compute offsets.

use crate::ast::TypeExpr;
use crate::constexpr::eval_const;
use crate::types::Type;
use std::collections::{BTreeMap, HashMap};

use super::state::CodeGen;

/// Resolves a type expression to its normalized `Type`, plus `(low, size)`
/// bounds when it denotes (or aliases) an array.
pub fn resolve_type(cg: &CodeGen, te: &TypeExpr) -> (Type, Option<(i64, i64)>) {
    match te {
        TypeExpr::Named(n) => match n.as_str() {
            "integer" => (Type::Integer, None),
            "real" => (Type::Real, None),
            "boolean" => (Type::Boolean, None),
            "char" => (Type::Char, None),
            other => (
                cg.type_aliases.get(other).cloned().unwrap_or(Type::Integer),
                cg.type_bounds.get(other).copied(),
            ),
        },
        TypeExpr::Packed(inner) => resolve_type(cg, inner),
        TypeExpr::Subrange { .. } => (Type::Integer, None),
        TypeExpr::Enum(_) => (Type::Enum(String::new()), None),
        TypeExpr::Set(inner) => (Type::Set(Box::new(resolve_type(cg, inner).0)), None),
        TypeExpr::FileOf(inner) => (Type::File(Box::new(resolve_type(cg, inner).0)), None),
        TypeExpr::Array { lower, upper, elem } => {
            let lo = eval_const(lower, &cg.consts).ok().and_then(|v| v.as_int()).unwrap_or(0);
            let hi = eval_const(upper, &cg.consts).ok().and_then(|v| v.as_int()).unwrap_or(0);
            let size = (hi - lo + 1).max(0);
            let (elem_ty, _) = resolve_type(cg, elem);
            (Type::Array(Box::new(elem_ty)), Some((lo, size)))
        }
        TypeExpr::Record { fields, variant } => {
            let mut map = BTreeMap::new();
            for f in fields {
                let (fty, _) = resolve_type(cg, &f.ty);
                for name in &f.names {
                    map.insert(name.clone(), fty.clone());
                }
            }
            if let Some(v) = variant {
                if let Some(branch) = v.branches.first() {
                    for f in &branch.fields {
                        let (fty, _) = resolve_type(cg, &f.ty);
                        for name in &f.names {
                            map.insert(name.clone(), fty.clone());
                        }
                    }
                }
            }
            (Type::Record(crate::types::RecordLayout { fields: map, variant: None }), None)
        }
    }
}

/// Field order (offset order) for a record type expression, flattening the
/// fixed fields followed by the first variant branch's fields, if any. A
/// deliberate simplification: the VM memory layout for variant records is
/// not otherwise pinned down.
pub fn field_order(te: &TypeExpr) -> Option<Vec<String>> {
    match te {
        TypeExpr::Record { fields, variant } => {
            let mut order = Vec::new();
            for f in fields {
                order.extend(f.names.iter().cloned());
            }
            if let Some(v) = variant {
                if let Some(branch) = v.branches.first() {
                    for f in &branch.fields {
                        order.extend(f.names.iter().cloned());
                    }
                }
            }
            Some(order)
        }
        TypeExpr::Packed(inner) => field_order(inner),
        _ => None,
    }
}

pub fn field_offset(order: &HashMap<String, Vec<String>>, type_key: &str, field: &str) -> Option<i64> {
    order.get(type_key)?.iter().position(|f| f == field).map(|i| i as i64)
}
