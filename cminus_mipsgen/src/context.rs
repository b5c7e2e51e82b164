use crate::data::DataManager;
use cminus_typecheck::SymbolTable;
use mips_helper::{Instr, Line, Serializer};
use std::io::Write;

/// State of one generation run. Everything that must not leak between
/// compilations (the label counter in particular) lives here.
pub(crate) struct Context<'ctx, W: ?Sized> {
    pub(crate) table: &'ctx SymbolTable,
    pub(crate) data: DataManager<'ctx>,
    writer: &'ctx mut W,
    label_counter: usize,
}

impl<'ctx, W: Write + ?Sized> Context<'ctx, W> {
    pub(crate) fn new(table: &'ctx SymbolTable, data: DataManager<'ctx>, writer: &'ctx mut W) -> Self {
        Self {
            table,
            data,
            writer,
            label_counter: 0,
        }
    }

    pub(crate) fn emit(&mut self, line: impl Into<Line>) -> std::io::Result<()> {
        let line: Line = line.into();
        line.serialize(&mut *self.writer)
    }

    pub(crate) fn emit_all(&mut self, instrs: Vec<Instr>) -> std::io::Result<()> {
        instrs.serialize(&mut *self.writer)
    }

    pub(crate) fn label(&mut self, name: impl Into<String>) -> std::io::Result<()> {
        self.emit(Line::Label(name.into()))
    }

    pub(crate) fn next_label(&mut self) -> usize {
        let id = self.label_counter;
        self.label_counter += 1;
        id
    }
}
