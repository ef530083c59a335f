//! Hand-assembly of `Chunk`s (SPEC_FULL §C: `.pseudoasm`, a debugging
//! convenience, not the language's real front end — the source-text
//! compiler stays out of scope per spec §1). `ChunkBuilder` is what the
//! integration tests under `tests/` use instead of parsing source text, and
//! what `pseudo-cli` drives when handed a `.pseudoasm` listing, following
//! the same `ChunkBlob`/`ConstSpec` shape `pseudo_core::serialize` already
//! defines for the compiled binary wire format.

use crate::opcode::{ExtOpCode, OpCode};
use pseudo_core::objects::FunctionObj;
use pseudo_core::{Chunk, Heap, Value};

/// Builds a `Chunk` one instruction at a time. Every `op_*` method appends
/// the opcode byte (plus any fixed operands) at source line `line` and
/// returns the byte offset the opcode started at, so jump instructions can
/// be patched once their target is known — the same forward-patch idiom
/// `Chunk::patch_u16` exists for.
pub struct ChunkBuilder {
    chunk: Chunk,
    line: u32,
}

impl ChunkBuilder {
    pub fn new() -> Self {
        ChunkBuilder { chunk: Chunk::new(), line: 1 }
    }

    /// Sets the source line subsequently emitted instructions are tagged
    /// with, for hand-assembled listings that want realistic stack traces.
    pub fn at_line(&mut self, line: u32) -> &mut Self {
        self.line = line;
        self
    }

    pub fn offset(&self) -> usize {
        self.chunk.len()
    }

    fn op(&mut self, op: OpCode) -> usize {
        self.chunk.write_byte(op as u8, self.line)
    }

    fn byte(&mut self, b: u8) -> &mut Self {
        self.chunk.write_byte(b, self.line);
        self
    }

    fn u16(&mut self, v: u16) -> &mut Self {
        self.chunk.write_u16(v, self.line);
        self
    }

    /// Emits `OP_CONST idx` for a value already in the constant pool, or
    /// `OP_CONST_LONG idx` if the pool index needs two bytes (spec §6.2).
    pub fn const_index(&mut self, index: usize) -> &mut Self {
        if index <= u8::MAX as usize {
            self.op(OpCode::Const);
            self.byte(index as u8);
        } else {
            self.op(OpCode::ConstLong);
            self.u16(index as u16);
        }
        self
    }

    pub fn add_constant(&mut self, value: Value) -> usize {
        self.chunk.add_constant(value)
    }

    /// Interns `value` and immediately emits the `OP_CONST`/`OP_CONST_LONG`
    /// to push it, the common case in hand-written test chunks.
    pub fn push_const(&mut self, value: Value) -> &mut Self {
        let idx = self.add_constant(value);
        self.const_index(idx)
    }

    pub fn op0(&mut self, op: OpCode) -> &mut Self {
        self.op(op);
        self
    }

    pub fn op_byte(&mut self, op: OpCode, operand: u8) -> &mut Self {
        self.op(op);
        self.byte(operand)
    }

    pub fn op_u16(&mut self, op: OpCode, operand: u16) -> &mut Self {
        self.op(op);
        self.u16(operand)
    }

    /// Multi-operand forms (`OP_INVOKE name arg_count`, the `*_IC`/`*_PIC`
    /// variants with their extra cache-slot byte, ...) where a single
    /// `op_byte` isn't enough.
    pub fn op_bytes(&mut self, op: OpCode, operands: &[u8]) -> &mut Self {
        self.op(op);
        for &b in operands {
            self.byte(b);
        }
        self
    }

    /// Emits a jump opcode with a placeholder operand, returning the operand's
    /// byte offset for a later `patch_jump`.
    pub fn jump_placeholder(&mut self, op: OpCode) -> usize {
        self.op(op);
        let operand_offset = self.chunk.len();
        self.chunk.write_byte(0, self.line);
        self.chunk.write_byte(0, self.line);
        operand_offset
    }

    /// Patches a placeholder emitted by `jump_placeholder` to land at the
    /// current offset (forward jump).
    pub fn patch_jump_here(&mut self, operand_offset: usize) {
        let target = self.chunk.len() - operand_offset - 2;
        self.chunk.patch_u16(operand_offset, target as u16);
    }

    /// The fused iteration opcodes (`OP_FOR_COUNT`, `OP_FOR_COUNT_STEP`,
    /// `OP_FOR_LOOP`) take one-byte slot operands followed by a forward jump
    /// offset (spec §4.5); this writes `slots` and a placeholder for that
    /// offset, returning its byte position for `patch_jump_here`.
    pub fn for_loop_placeholder(&mut self, op: OpCode, slots: &[u8]) -> usize {
        self.op(op);
        for &s in slots {
            self.byte(s);
        }
        let operand_offset = self.chunk.len();
        self.chunk.write_byte(0, self.line);
        self.chunk.write_byte(0, self.line);
        operand_offset
    }

    /// `OP_LOOP` back to `loop_start` (spec §4.5: backward jump, offset is
    /// `current - loop_start`, measured from the byte past the operand).
    pub fn emit_loop(&mut self, loop_start: usize) -> &mut Self {
        self.op(OpCode::Loop);
        let operand_at = self.chunk.len();
        let offset = operand_at + 2 - loop_start;
        self.u16(offset as u16);
        self
    }

    pub fn extended(&mut self, ext: ExtOpCode) -> &mut Self {
        self.op(OpCode::Extended);
        self.byte(ext as u8);
        self
    }

    /// Registers a function constant (name/arity/locals/code_start) the way
    /// `OP_CLOSURE` expects to find it — a `FunctionObj` heap object, not a
    /// `ConstSpec`, since the builder writes directly into a live `Heap`
    /// rather than through the serialized wire format.
    pub fn function_const(
        &mut self,
        heap: &mut Heap,
        name: &str,
        arity: u8,
        locals_count: u16,
        code_start: usize,
    ) -> usize {
        let ptr = heap.alloc_function(FunctionObj::new(name, arity, locals_count, code_start));
        self.add_constant(Value::obj(ptr))
    }

    pub fn build(self) -> Chunk {
        self.chunk
    }
}

impl Default for ChunkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// How many one-byte operands (after the opcode byte) each opcode takes.
/// `u16` operands (jump offsets, `OP_CONST_LONG`'s index) count as two
/// entries here. `OP_CLOSURE` is a special case (see `assemble`'s handling of
/// it): its true width depends on the referenced function's upvalue count,
/// which a text listing has no way to see ahead of time, so hand-assembled
/// closures are restricted to the no-upvalues case.
fn operand_width(op: OpCode) -> usize {
    use OpCode::*;
    match op {
        Const | GetLocal | SetLocal | GetUpvalue | SetUpvalue | GetGlobal | SetGlobal
        | DefineGlobal | NewArray | NewDict | Call | TailCall | Closure | Class | Method
        | Field | GetField | SetField | GetSuper => 1,
        ConstLong | Jump | JumpIfFalse | JumpIfTrue | Loop | Try | LtJmpFalse | LeJmpFalse
        | GtJmpFalse | GeJmpFalse | EqJmpFalse | NeqJmpFalse | LtJmpFalseII | LeJmpFalseII
        | GtJmpFalseII | GeJmpFalseII | EqJmpFalseII | NeqJmpFalseII | Invoke | SuperInvoke
        | GetFieldIc | SetFieldIc | GetFieldPic | SetFieldPic => 2,
        InvokeIc | InvokePic => 3,
        ForCount | ForLoop => 5,
        ForCountStep => 6,
        Nil | True | False | Pop | Add | Sub | Mul | Div | Mod | Pow | Neg | Not | BAnd | BOr
        | BXor | BNot | Shl | Shr | Eq | Neq | Lt | Le | Gt | Ge | AddII | SubII | MulII
        | DivII | EqII | NeqII | LtII | LeII | GtII | GeII | NewRange | IndexGet | IndexSet
        | Len | ArrayPush | ArrayPop | DictSet | Return | Inherit | TryEnd | Throw
        | Catch | Halt | Exit | Sleep | CloseUpvalue => 0,
        Extended => 0, // the secondary byte is handled by `assemble` itself
    }
}

/// Assembles a `.pseudoasm` listing (SPEC_FULL §C) into a `Chunk`.
///
/// Format: one instruction or directive per line, `#` starts a line comment,
/// blank lines are ignored.
///   - `.const <type> <literal>` interns a constant; `<type>` is one of
///     `nil`, `bool`, `int`, `float`, `str`. Constants are numbered in the
///     order they appear, starting at 0.
///   - Every other line is `<OpcodeName> [operand ...]`, where `OpcodeName`
///     matches an `OpCode`/`ExtOpCode` variant name exactly (e.g. `Const`,
///     `JumpIfFalse`, `Ext.Yield`) and operands are decimal numbers, one per
///     byte the opcode takes (so a jump's 16-bit offset is written as two
///     numbers: high byte, low byte — the same big-endian split
///     `Chunk::write_u16` performs).
///
/// `Closure` is emitted with its constant-index operand only; hand-assembled
/// closures therefore must reference a function constant with zero upvalues
/// (any closure that actually captures something needs a real compiler to
/// emit the trailing `(is_local, index)` pairs, which a text listing has no
/// static way to size ahead of time).
pub fn assemble(text: &str, heap: &mut Heap) -> Result<Chunk, String> {
    let mut builder = ChunkBuilder::new();
    for (lineno, raw_line) in text.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        builder.at_line((lineno + 1) as u32);
        let mut parts = line.split_whitespace();
        let head = parts.next().unwrap();

        if head == ".const" {
            let kind = parts.next().ok_or_else(|| format!("line {}: .const missing type", lineno + 1))?;
            let literal: String = parts.collect::<Vec<_>>().join(" ");
            let value = parse_const(kind, &literal, heap)
                .map_err(|e| format!("line {}: {e}", lineno + 1))?;
            builder.add_constant(value);
            continue;
        }

        if let Some(ext_name) = head.strip_prefix("Ext.") {
            let ext = parse_ext_opcode(ext_name)
                .ok_or_else(|| format!("line {}: unknown extended opcode '{ext_name}'", lineno + 1))?;
            builder.extended(ext);
            continue;
        }

        let op = parse_opcode(head).ok_or_else(|| format!("line {}: unknown opcode '{head}'", lineno + 1))?;
        builder.op0(op);
        let width = operand_width(op);
        for _ in 0..width {
            let operand = parts
                .next()
                .ok_or_else(|| format!("line {}: '{head}' expects {width} operand byte(s)", lineno + 1))?;
            let byte: u8 = operand
                .parse()
                .map_err(|_| format!("line {}: invalid operand '{operand}'", lineno + 1))?;
            builder.byte(byte);
        }
    }
    Ok(builder.build())
}

fn parse_const(kind: &str, literal: &str, heap: &mut Heap) -> Result<Value, String> {
    match kind {
        "nil" => Ok(Value::NIL),
        "bool" => literal.parse::<bool>().map(Value::bool).map_err(|e| e.to_string()),
        "int" => literal.parse::<i32>().map(Value::int).map_err(|e| e.to_string()),
        "float" => literal.parse::<f64>().map(Value::float).map_err(|e| e.to_string()),
        "str" => {
            let unquoted = literal.trim().trim_matches('"');
            Ok(Value::obj(heap.alloc_string(unquoted.to_string())))
        }
        other => Err(format!("unknown constant type '{other}'")),
    }
}

fn parse_opcode(name: &str) -> Option<OpCode> {
    for b in 0..=(OpCode::Extended as u8) {
        let op = OpCode::from_byte(b)?;
        if format!("{op:?}") == name {
            return Some(op);
        }
    }
    None
}

fn parse_ext_opcode(name: &str) -> Option<ExtOpCode> {
    for b in 0..=(ExtOpCode::Await as u8) {
        let ext = ExtOpCode::from_byte(b)?;
        if format!("{ext:?}") == name {
            return Some(ext);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::Vm;

    #[test]
    fn halts_with_a_constant() {
        let mut b = ChunkBuilder::new();
        b.push_const(Value::int(42)).op0(OpCode::Halt);
        let chunk = b.build();

        let mut vm = Vm::new();
        let result = vm.interpret(chunk).unwrap();
        assert_eq!(result.as_int(), 42);
    }

    #[test]
    fn forward_jump_patches_to_current_offset() {
        let mut b = ChunkBuilder::new();
        b.push_const(Value::bool(false));
        let patch_at = b.jump_placeholder(OpCode::JumpIfFalse);
        b.push_const(Value::int(1)).op0(OpCode::Halt);
        b.patch_jump_here(patch_at);
        b.push_const(Value::int(2)).op0(OpCode::Halt);
        let chunk = b.build();

        let mut vm = Vm::new();
        let result = vm.interpret(chunk).unwrap();
        assert_eq!(result.as_int(), 2);
    }

    #[test]
    fn loop_jumps_backward_to_loop_start() {
        // while true: push 7; halt  (first iteration halts, proving OP_LOOP
        // actually lands back at loop_start rather than falling through)
        let mut b = ChunkBuilder::new();
        let loop_start = b.offset();
        b.push_const(Value::int(7)).op0(OpCode::Halt);
        b.emit_loop(loop_start);
        let chunk = b.build();

        let mut vm = Vm::new();
        let result = vm.interpret(chunk).unwrap();
        assert_eq!(result.as_int(), 7);
    }
}
