use crate::data::DataManager;
use crate::var::FrameManager;
use cminus_syntax::{BinaryOp, Expr, ExprKind, VarRef};
use cminus_typecheck::{ScopeId, SymbolTable, INPUT, OUTPUT};
use mips_helper::{Instr, Reg, WORD_SIZE};

const READ_INT: i32 = 5;
const PRINT_INT: i32 = 1;
const PRINT_CHAR: i32 = 11;

/// Where a variable lives at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot<'ctx> {
    Frame(i32),
    Global(&'ctx str),
}

/// Lowers expressions so that their value ends up in `$t0`. Binary
/// operands are stashed on the stack and popped back into `$t1`.
pub(crate) struct ExprBuilder<'a, 'ctx> {
    pub(crate) table: &'ctx SymbolTable,
    pub(crate) scope: ScopeId,
    pub(crate) frame: &'a FrameManager<'ctx>,
    pub(crate) data: &'a DataManager<'ctx>,
}

impl<'a, 'ctx> ExprBuilder<'a, 'ctx> {
    pub(crate) fn build(&self, expr: &Expr<'ctx>) -> Vec<Instr> {
        match &expr.kind {
            ExprKind::Literal(value) => vec![Instr::Li(Reg::T0, *value)],
            ExprKind::Var(var) => self.build_var(var),
            ExprKind::Assign { target, value } => self.build_assign(target, value),
            ExprKind::Binary { op, left, right } => self.build_binary(*op, left, right),
            ExprKind::Call { name, args } => self.build_call(name, args),
        }
    }

    fn build_var(&self, var: &VarRef<'ctx>) -> Vec<Instr> {
        let slot = self.resolve(var.name);
        match var.index {
            Some(index) => {
                let mut result = self.build_element_addr(slot, index);
                result.push(Instr::Lw(Reg::T0, 0, Reg::T2));
                result
            }
            None => match slot {
                Slot::Frame(offset) => vec![Instr::Lw(Reg::T0, offset, Reg::Fp)],
                Slot::Global(name) => vec![
                    Instr::La(Reg::T2, name.to_string()),
                    Instr::Lw(Reg::T0, 0, Reg::T2),
                ],
            },
        }
    }

    fn build_assign(&self, target: &VarRef<'ctx>, value: &Expr<'ctx>) -> Vec<Instr> {
        let slot = self.resolve(target.name);
        let mut result = self.build(value);
        match target.index {
            Some(index) => {
                result.extend(push_t0());
                result.extend(self.build_element_addr(slot, index));
                result.extend(pop_t1());
                result.push(Instr::Sw(Reg::T1, 0, Reg::T2));
                result.push(Instr::Move(Reg::T0, Reg::T1));
            }
            None => match slot {
                Slot::Frame(offset) => result.push(Instr::Sw(Reg::T0, offset, Reg::Fp)),
                Slot::Global(name) => {
                    result.push(Instr::La(Reg::T2, name.to_string()));
                    result.push(Instr::Sw(Reg::T0, 0, Reg::T2));
                }
            },
        }
        result
    }

    // leaves the address of `slot[index]` in $t2, clobbers $t0
    fn build_element_addr(&self, slot: Slot<'ctx>, index: &Expr<'ctx>) -> Vec<Instr> {
        let mut result = self.build(index);
        result.push(Instr::Sll(Reg::T0, Reg::T0, 2));
        match slot {
            Slot::Frame(offset) => result.push(Instr::Addiu(Reg::T2, Reg::Fp, offset)),
            Slot::Global(name) => result.push(Instr::La(Reg::T2, name.to_string())),
        }
        result.push(Instr::Addu(Reg::T2, Reg::T2, Reg::T0));
        result
    }

    fn build_binary(&self, op: BinaryOp, left: &Expr<'ctx>, right: &Expr<'ctx>) -> Vec<Instr> {
        let mut result = self.build(left);
        result.extend(push_t0());
        result.extend(self.build(right));
        result.extend(pop_t1());

        // left operand in $t1, right operand in $t0
        match op {
            BinaryOp::Add => result.push(Instr::Addu(Reg::T0, Reg::T1, Reg::T0)),
            BinaryOp::Sub => result.push(Instr::Subu(Reg::T0, Reg::T1, Reg::T0)),
            BinaryOp::Mul => result.push(Instr::Mul(Reg::T0, Reg::T1, Reg::T0)),
            BinaryOp::Div => {
                result.push(Instr::Div(Reg::T1, Reg::T0));
                result.push(Instr::Mflo(Reg::T0));
            }
            BinaryOp::Lt => result.push(Instr::Slt(Reg::T0, Reg::T1, Reg::T0)),
            BinaryOp::Gt => result.push(Instr::Slt(Reg::T0, Reg::T0, Reg::T1)),
            BinaryOp::LEq => {
                result.push(Instr::Slt(Reg::T0, Reg::T0, Reg::T1));
                result.push(Instr::Xori(Reg::T0, Reg::T0, 1));
            }
            BinaryOp::GEq => {
                result.push(Instr::Slt(Reg::T0, Reg::T1, Reg::T0));
                result.push(Instr::Xori(Reg::T0, Reg::T0, 1));
            }
            BinaryOp::Eq => {
                result.push(Instr::Subu(Reg::T0, Reg::T1, Reg::T0));
                result.push(Instr::Sltiu(Reg::T0, Reg::T0, 1));
            }
            BinaryOp::NEq => {
                result.push(Instr::Subu(Reg::T0, Reg::T1, Reg::T0));
                result.push(Instr::Sltu(Reg::T0, Reg::Zero, Reg::T0));
            }
        }
        result
    }

    fn build_call(&self, name: &str, args: &[Expr<'ctx>]) -> Vec<Instr> {
        match name {
            INPUT => return build_input(),
            OUTPUT => {
                let Some(arg) = args.first() else {
                    unreachable!("output is called without argument");
                };
                let mut result = self.build(arg);
                result.extend(build_output());
                return result;
            }
            _ => (),
        }

        let mut result = Vec::default();
        for arg in args.iter().rev() {
            result.extend(self.build(arg));
            result.extend(push_t0());
        }
        result.push(Instr::Jal(format!("{name}_entry")));
        if !args.is_empty() {
            let size = WORD_SIZE as i32 * args.len() as i32;
            result.push(Instr::Addiu(Reg::Sp, Reg::Sp, size));
        }
        result.push(Instr::Move(Reg::T0, Reg::V0));
        result
    }

    fn resolve(&self, name: &str) -> Slot<'ctx> {
        let Some((scope, _)) = self.table.lookup(self.scope, name) else {
            panic!("variable '{name}' is not declared");
        };
        if !self.table.is_global(scope) {
            let Some(offset) = self.frame.get(name) else {
                panic!("variable '{name}' has no frame slot");
            };
            return Slot::Frame(offset);
        }
        let Some((name, _)) = self.data.get(name) else {
            panic!("global '{name}' has no storage");
        };
        Slot::Global(name)
    }
}

fn push_t0() -> [Instr; 2] {
    [
        Instr::Addiu(Reg::Sp, Reg::Sp, -(WORD_SIZE as i32)),
        Instr::Sw(Reg::T0, 0, Reg::Sp),
    ]
}

fn pop_t1() -> [Instr; 2] {
    [
        Instr::Lw(Reg::T1, 0, Reg::Sp),
        Instr::Addiu(Reg::Sp, Reg::Sp, WORD_SIZE as i32),
    ]
}

fn build_input() -> Vec<Instr> {
    vec![
        Instr::Li(Reg::V0, READ_INT),
        Instr::Syscall,
        Instr::Move(Reg::T0, Reg::V0),
    ]
}

fn build_output() -> Vec<Instr> {
    vec![
        Instr::Move(Reg::A0, Reg::T0),
        Instr::Li(Reg::V0, PRINT_INT),
        Instr::Syscall,
        Instr::Li(Reg::A0, '\n' as i32),
        Instr::Li(Reg::V0, PRINT_CHAR),
        Instr::Syscall,
    ]
}
