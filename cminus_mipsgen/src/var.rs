use cminus_syntax::{FunDecl, VarDecl};
use indexmap::IndexMap;
use mips_helper::WORD_SIZE;

// saved $fp at 0($fp), saved $ra at 4($fp)
const SAVED_REGISTERS_SIZE: i32 = 8;

/// Frame layout of one function. Parameters sit above the saved registers
/// in declaration order; locals take descending slots below the frame
/// pointer. An array's offset is the address of its element 0, the lowest
/// address of the block.
pub(crate) struct FrameManager<'ctx> {
    param_offsets: IndexMap<&'ctx str, i32>,
    local_offsets: IndexMap<&'ctx str, i32>,
    stack_cursor: i32,
}

impl<'ctx> FrameManager<'ctx> {
    pub(crate) fn build(fun: &FunDecl<'ctx>) -> Self {
        let mut frame = Self {
            param_offsets: IndexMap::default(),
            local_offsets: IndexMap::default(),
            stack_cursor: 0,
        };

        for (i, param) in fun.params.iter().enumerate() {
            let offset = SAVED_REGISTERS_SIZE + WORD_SIZE as i32 * i as i32;
            frame.param_offsets.insert(param.name, offset);
        }
        for var in fun.body.all_locals() {
            frame.declare_local(var);
        }

        frame
    }

    fn declare_local(&mut self, var: &VarDecl<'ctx>) {
        let stack_cursor = var
            .array_size
            .unwrap_or(1)
            .checked_mul(WORD_SIZE)
            .and_then(|bytes| i32::try_from(bytes).ok())
            .and_then(|bytes| self.stack_cursor.checked_sub(bytes));
        let Some(stack_cursor) = stack_cursor else {
            panic!("local '{}' does not fit in the frame", var.name);
        };
        self.stack_cursor = stack_cursor;
        self.local_offsets.insert(var.name, self.stack_cursor);
    }

    /// Bytes reserved below the frame pointer for every local.
    pub(crate) fn frame_size(&self) -> i32 {
        -self.stack_cursor
    }

    pub(crate) fn get(&self, name: &str) -> Option<i32> {
        self.local_offsets
            .get(name)
            .or_else(|| self.param_offsets.get(name))
            .copied()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bumpalo::Bump;
    use cminus_syntax::{parse, SourceFile};
    use std::path::PathBuf;

    #[test]
    fn test_frame_layout() {
        let arena = Bump::new();
        let file = SourceFile::new(
            PathBuf::from("test.cm"),
            String::from("int f(int a, int b, int c) { int x; int arr[3]; { int y; } return a; }"),
        );
        let program = parse(&arena, &file).unwrap();
        let fun = program.functions().next().unwrap();
        let frame = FrameManager::build(fun);

        assert_eq!(frame.get("a"), Some(8));
        assert_eq!(frame.get("b"), Some(12));
        assert_eq!(frame.get("c"), Some(16));
        assert_eq!(frame.get("x"), Some(-4));
        assert_eq!(frame.get("arr"), Some(-16));
        assert_eq!(frame.get("y"), Some(-20));
        assert_eq!(frame.get("g"), None);
        assert_eq!(frame.frame_size(), 20);
    }

    #[test]
    fn test_empty_frame() {
        let arena = Bump::new();
        let file = SourceFile::new(PathBuf::from("test.cm"), String::from("void main(void) { }"));
        let program = parse(&arena, &file).unwrap();
        let frame = FrameManager::build(program.functions().next().unwrap());
        assert_eq!(frame.frame_size(), 0);
    }
}
