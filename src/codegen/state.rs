//! Code generator state: emitted instructions, offset allocators, and the
//! label/subroutine tables shared by the other `codegen` submodules.

use crate::ast::Expr;
use crate::types::Type;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct ArrayInfo {
    pub offset: i64,
    pub low: i64,
    pub size: i64,
}

#[derive(Debug, Clone)]
pub struct SubroutineInfo {
    pub label: String,
    pub arity: usize,
}

pub struct CodeGen {
    pub(super) out: Vec<String>,
    label_counter: usize,

    next_global_offset: i64,
    pub(super) globals: HashMap<String, i64>,
    pub(super) global_arrays: HashMap<String, ArrayInfo>,
    pub(super) var_types: HashMap<String, Type>,

    pub(super) locals: HashMap<String, i64>,
    pub(super) local_var_types: HashMap<String, Type>,

    pub(super) subroutines: HashMap<String, SubroutineInfo>,
    pub(super) type_aliases: HashMap<String, Type>,
    pub(super) type_bounds: HashMap<String, (i64, i64)>,
    pub(super) type_field_order: HashMap<String, Vec<String>>,
    pub(super) var_record_type_key: HashMap<String, String>,
    pub(super) consts: HashMap<String, Expr>,

    /// Canonical name of the function whose body is currently being emitted,
    /// so an assignment to it can be lowered as "leave the RHS on the stack"
    /// instead of a store.
    pub(super) current_function: Option<String>,
}

impl CodeGen {
    pub fn new() -> Self {
        CodeGen {
            out: Vec::new(),
            label_counter: 0,
            next_global_offset: 0,
            globals: HashMap::new(),
            global_arrays: HashMap::new(),
            var_types: HashMap::new(),
            locals: HashMap::new(),
            local_var_types: HashMap::new(),
            subroutines: HashMap::new(),
            type_aliases: HashMap::new(),
            type_bounds: HashMap::new(),
            type_field_order: HashMap::new(),
            var_record_type_key: HashMap::new(),
            consts: HashMap::new(),
            current_function: None,
        }
    }

    pub fn emit(&mut self, instr: impl Into<String>) {
        self.out.push(instr.into());
    }

    pub fn emit_label(&mut self, label: impl Into<String>) {
        self.out.push(format!("{}:", label.into()));
    }

    pub fn fresh_label_index(&mut self) -> usize {
        self.label_counter += 1;
        self.label_counter
    }

    pub fn allocate_global(&mut self, name: &str) -> i64 {
        let off = self.next_global_offset;
        self.next_global_offset += 1;
        self.globals.insert(name.to_string(), off);
        off
    }

    /// Allocates `count` contiguous global slots, returning the first one.
    /// Used for records, represented as a flat run of one slot per field.
    pub fn allocate_global_block(&mut self, name: &str, count: i64) -> i64 {
        let off = self.next_global_offset;
        self.next_global_offset += count.max(1);
        self.globals.insert(name.to_string(), off);
        off
    }

    pub fn allocate_local(&mut self, name: &str, slot: i64) {
        self.locals.insert(name.to_string(), slot);
    }

    pub fn enter_subroutine(&mut self) {
        self.locals.clear();
        self.local_var_types.clear();
    }

    pub fn var_type(&self, name: &str) -> Option<&Type> {
        self.local_var_types.get(name).or_else(|| self.var_types.get(name))
    }

    /// Returns `("L", offset)` for a local, `("G", offset)` for a global.
    pub fn resolve_scalar(&self, name: &str) -> Option<(&'static str, i64)> {
        if let Some(off) = self.locals.get(name) {
            return Some(("L", *off));
        }
        self.globals.get(name).map(|off| ("G", *off))
    }

    /// Only global arrays support computed (runtime-indexed) addressing in
    /// this instruction set — `PUSHL`/`STOREL` take a literal offset, not a
    /// computed one, so a dynamically addressed array must live globally.
    pub fn resolve_array(&self, name: &str) -> Option<(&'static str, ArrayInfo)> {
        self.global_arrays.get(name).map(|info| ("G", *info))
    }

    pub fn output(self) -> String {
        self.out.join("\n") + "\n"
    }
}

impl Default for CodeGen {
    fn default() -> Self {
        Self::new()
    }
}
