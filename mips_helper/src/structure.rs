use std::fmt::{Display, Formatter};

pub const WORD_SIZE: u32 = 4;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Reg {
    Zero,
    V0,
    A0,
    T0,
    T1,
    T2,
    Sp,
    Fp,
    Ra,
}

impl Display for Reg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Zero => "$zero",
            Self::V0 => "$v0",
            Self::A0 => "$a0",
            Self::T0 => "$t0",
            Self::T1 => "$t1",
            Self::T2 => "$t2",
            Self::Sp => "$sp",
            Self::Fp => "$fp",
            Self::Ra => "$ra",
        };
        f.write_str(name)
    }
}

/// The subset of MIPS32 (SPIM flavoured, pseudo-instructions included)
/// the code generator emits.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Instr {
    Li(Reg, i32),
    La(Reg, String),
    Move(Reg, Reg),

    // rt, offset(base)
    Lw(Reg, i32, Reg),
    Sw(Reg, i32, Reg),

    Addiu(Reg, Reg, i32),
    Addu(Reg, Reg, Reg),
    Subu(Reg, Reg, Reg),
    Mul(Reg, Reg, Reg),
    Div(Reg, Reg),
    Mflo(Reg),
    Sll(Reg, Reg, u32),

    Slt(Reg, Reg, Reg),
    Sltu(Reg, Reg, Reg),
    Sltiu(Reg, Reg, i32),
    Xori(Reg, Reg, i32),

    Beq(Reg, Reg, String),
    Bne(Reg, Reg, String),
    J(String),
    Jal(String),
    Jr(Reg),

    Syscall,
}

impl Display for Instr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Li(rd, imm) => write!(f, "li {rd}, {imm}"),
            Self::La(rd, label) => write!(f, "la {rd}, {label}"),
            Self::Move(rd, rs) => write!(f, "move {rd}, {rs}"),
            Self::Lw(rt, offset, base) => write!(f, "lw {rt}, {offset}({base})"),
            Self::Sw(rt, offset, base) => write!(f, "sw {rt}, {offset}({base})"),
            Self::Addiu(rt, rs, imm) => write!(f, "addiu {rt}, {rs}, {imm}"),
            Self::Addu(rd, rs, rt) => write!(f, "addu {rd}, {rs}, {rt}"),
            Self::Subu(rd, rs, rt) => write!(f, "subu {rd}, {rs}, {rt}"),
            Self::Mul(rd, rs, rt) => write!(f, "mul {rd}, {rs}, {rt}"),
            Self::Div(rs, rt) => write!(f, "div {rs}, {rt}"),
            Self::Mflo(rd) => write!(f, "mflo {rd}"),
            Self::Sll(rd, rt, shamt) => write!(f, "sll {rd}, {rt}, {shamt}"),
            Self::Slt(rd, rs, rt) => write!(f, "slt {rd}, {rs}, {rt}"),
            Self::Sltu(rd, rs, rt) => write!(f, "sltu {rd}, {rs}, {rt}"),
            Self::Sltiu(rt, rs, imm) => write!(f, "sltiu {rt}, {rs}, {imm}"),
            Self::Xori(rt, rs, imm) => write!(f, "xori {rt}, {rs}, {imm}"),
            Self::Beq(rs, rt, label) => write!(f, "beq {rs}, {rt}, {label}"),
            Self::Bne(rs, rt, label) => write!(f, "bne {rs}, {rt}, {label}"),
            Self::J(label) => write!(f, "j {label}"),
            Self::Jal(label) => write!(f, "jal {label}"),
            Self::Jr(rs) => write!(f, "jr {rs}"),
            Self::Syscall => write!(f, "syscall"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Directive {
    Data,
    Text,
    Globl(String),
}

impl Display for Directive {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Data => write!(f, ".data"),
            Self::Text => write!(f, ".text"),
            Self::Globl(name) => write!(f, ".globl {name}"),
        }
    }
}

/// One line of the assembly listing.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Line {
    Label(String),
    Directive(Directive),
    Space { name: String, bytes: u32 },
    Instr(Instr),
    Blank,
}

impl Display for Line {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Label(name) => write!(f, "{name}:"),
            Self::Directive(directive) => write!(f, "{directive}"),
            Self::Space { name, bytes } => write!(f, "{name}: .space {bytes}"),
            Self::Instr(instr) => write!(f, "    {instr}"),
            Self::Blank => Ok(()),
        }
    }
}

impl From<Instr> for Line {
    fn from(instr: Instr) -> Self {
        Self::Instr(instr)
    }
}

impl From<Directive> for Line {
    fn from(directive: Directive) -> Self {
        Self::Directive(directive)
    }
}
