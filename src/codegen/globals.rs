//! Symbol-table population pass. Runs once over the program's top-level
//! declarations, and again (locals only) each time a subroutine body is
//! about to be emitted.

use crate::ast::{Block, TypeExpr};
use crate::error::CompileError;
use crate::types::Type;

use super::state::{ArrayInfo, CodeGen, SubroutineInfo};
use super::types::{field_order, resolve_type};

pub fn populate_top_level(cg: &mut CodeGen, block: &Block, alloc_out: &mut Vec<String>) -> Result<(), CompileError> {
    for t in &block.types {
        let (ty, bounds) = resolve_type(cg, &t.ty);
        cg.type_aliases.insert(t.name.clone(), ty);
        if let Some(b) = bounds {
            cg.type_bounds.insert(t.name.clone(), b);
        }
        if let Some(order) = field_order(&t.ty) {
            cg.type_field_order.insert(t.name.clone(), order);
        }
    }

    for c in &block.consts {
        cg.consts.insert(c.name.clone(), c.expr.clone());
    }

    for sub in &block.subroutines {
        let label = sub.name.to_uppercase();
        let arity = sub.params.iter().map(|p| p.names.len()).sum();
        cg.subroutines.insert(sub.name.clone(), SubroutineInfo { label, arity });
    }

    for v in &block.vars {
        let (ty, bounds) = resolve_type(cg, &v.ty);
        let record_type_key = match &v.ty {
            TypeExpr::Named(n) if cg.type_field_order.contains_key(n) => Some(n.clone()),
            TypeExpr::Record { .. } => field_order(&v.ty).map(|order| {
                let key = format!("var:{}", v.names.join(","));
                cg.type_field_order.insert(key.clone(), order);
                key
            }),
            _ => None,
        };
        for name in &v.names {
            cg.var_types.insert(name.clone(), ty.clone());
            match (&ty, bounds, &record_type_key) {
                (Type::Array(_), Some((low, size)), _) => {
                    let offset = cg.allocate_global(name);
                    cg.global_arrays.insert(name.clone(), ArrayInfo { offset, low, size });
                    alloc_out.push(format!("PUSHI {size}"));
                    alloc_out.push("ALLOCN".to_string());
                    alloc_out.push(format!("STOREG {offset}"));
                }
                (Type::Record(_), _, Some(key)) => {
                    let count = cg.type_field_order.get(key).map(|o| o.len() as i64).unwrap_or(1);
                    cg.allocate_global_block(name, count);
                    cg.var_record_type_key.insert(name.clone(), key.clone());
                }
                _ => {
                    cg.allocate_global(name);
                }
            }
        }
    }
    Ok(())
}

/// Binds a subroutine's flattened parameters to sequential local offsets
/// `0..arity`, and the subroutine's own locally declared variables above
/// them.
pub fn populate_locals(cg: &mut CodeGen, sub: &crate::ast::Subroutine) -> Result<(), CompileError> {
    cg.enter_subroutine();
    let mut slot = 0i64;
    for p in &sub.params {
        let (ty, _) = resolve_type(cg, &p.ty);
        for name in &p.names {
            cg.allocate_local(name, slot);
            cg.local_var_types.insert(name.clone(), ty.clone());
            slot += 1;
        }
    }
    for v in &sub.block.vars {
        let (ty, _) = resolve_type(cg, &v.ty);
        for name in &v.names {
            cg.allocate_local(name, slot);
            cg.local_var_types.insert(name.clone(), ty.clone());
            slot += 1;
        }
    }
    Ok(())
}
