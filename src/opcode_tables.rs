//! Static opcode tables
//!
//! One table per operand-count class, indexed by opcode number. Each entry
//! carries the mnemonic, what the decoder must read after the operands, and
//! the handler the interpreter dispatches to. A `None` slot is an opcode this
//! interpreter does not implement.

use crate::error::ZResult;
use crate::instruction::{Instruction, OperandCount};
use crate::interpreter::{ExecutionResult, Interpreter};

pub type Handler = fn(&mut Interpreter, &Instruction, &[u16]) -> ZResult<ExecutionResult>;

#[derive(Clone, Copy)]
pub struct OpcodeEntry {
    pub name: &'static str,
    pub handler: Handler,
    /// A store variable byte follows the operands
    pub stores: bool,
    /// Branch data follows the operands (and store byte)
    pub branches: bool,
    /// An inline Z-string follows
    pub text: bool,
}

const S: u8 = 1;
const B: u8 = 2;
const T: u8 = 4;

const fn op(name: &'static str, handler: Handler, flags: u8) -> Option<OpcodeEntry> {
    Some(OpcodeEntry {
        name,
        handler,
        stores: flags & S != 0,
        branches: flags & B != 0,
        text: flags & T != 0,
    })
}

static OP0_TABLE: [Option<OpcodeEntry>; 16] = [
    op("rtrue", Interpreter::op_rtrue, 0),
    op("rfalse", Interpreter::op_rfalse, 0),
    op("print", Interpreter::op_print, T),
    op("print_ret", Interpreter::op_print_ret, T),
    op("nop", Interpreter::op_nop, 0),
    None, // save
    None, // restore
    None, // restart
    op("ret_popped", Interpreter::op_ret_popped, 0),
    op("pop", Interpreter::op_pop, 0),
    op("quit", Interpreter::op_quit, 0),
    op("new_line", Interpreter::op_new_line, 0),
    None, // show_status
    None, // verify
    None,
    None,
];

static OP1_TABLE: [Option<OpcodeEntry>; 16] = [
    op("jz", Interpreter::op_jz, B),
    op("get_sibling", Interpreter::op_get_sibling, S | B),
    op("get_child", Interpreter::op_get_child, S | B),
    op("get_parent", Interpreter::op_get_parent, S),
    op("get_prop_len", Interpreter::op_get_prop_len, S),
    op("inc", Interpreter::op_inc, 0),
    op("dec", Interpreter::op_dec, 0),
    op("print_addr", Interpreter::op_print_addr, 0),
    None,
    op("remove_obj", Interpreter::op_remove_obj, 0),
    op("print_obj", Interpreter::op_print_obj, 0),
    op("ret", Interpreter::op_ret, 0),
    op("jump", Interpreter::op_jump, 0),
    op("print_paddr", Interpreter::op_print_paddr, 0),
    op("load", Interpreter::op_load, S),
    op("not", Interpreter::op_not, S),
];

static OP2_TABLE: [Option<OpcodeEntry>; 32] = [
    None,
    op("je", Interpreter::op_je, B),
    op("jl", Interpreter::op_jl, B),
    op("jg", Interpreter::op_jg, B),
    op("dec_chk", Interpreter::op_dec_chk, B),
    op("inc_chk", Interpreter::op_inc_chk, B),
    op("jin", Interpreter::op_jin, B),
    op("test", Interpreter::op_test, B),
    op("or", Interpreter::op_or, S),
    op("and", Interpreter::op_and, S),
    op("test_attr", Interpreter::op_test_attr, B),
    op("set_attr", Interpreter::op_set_attr, 0),
    op("clear_attr", Interpreter::op_clear_attr, 0),
    op("store", Interpreter::op_store, 0),
    op("insert_obj", Interpreter::op_insert_obj, 0),
    op("loadw", Interpreter::op_loadw, S),
    op("loadb", Interpreter::op_loadb, S),
    op("get_prop", Interpreter::op_get_prop, S),
    op("get_prop_addr", Interpreter::op_get_prop_addr, S),
    op("get_next_prop", Interpreter::op_get_next_prop, S),
    op("add", Interpreter::op_add, S),
    op("sub", Interpreter::op_sub, S),
    op("mul", Interpreter::op_mul, S),
    op("div", Interpreter::op_div, S),
    op("mod", Interpreter::op_mod, S),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
];

static VAR_TABLE: [Option<OpcodeEntry>; 32] = [
    op("call", Interpreter::op_call, S),
    op("storew", Interpreter::op_storew, 0),
    op("storeb", Interpreter::op_storeb, 0),
    op("put_prop", Interpreter::op_put_prop, 0),
    op("sread", Interpreter::op_sread, 0),
    op("print_char", Interpreter::op_print_char, 0),
    op("print_num", Interpreter::op_print_num, 0),
    op("random", Interpreter::op_random, S),
    op("push", Interpreter::op_push, 0),
    op("pull", Interpreter::op_pull, 0),
    None, // split_window
    None, // set_window
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // output_stream
    None, // input_stream
    None, // sound_effect
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
];

/// Table entry for `number` in `class`, if implemented.
pub fn lookup(class: OperandCount, number: u8) -> Option<&'static OpcodeEntry> {
    let table: &'static [Option<OpcodeEntry>] = match class {
        OperandCount::OP0 => &OP0_TABLE,
        OperandCount::OP1 => &OP1_TABLE,
        OperandCount::OP2 => &OP2_TABLE,
        OperandCount::VAR => &VAR_TABLE,
    };
    table.get(number as usize).and_then(Option::as_ref)
}
