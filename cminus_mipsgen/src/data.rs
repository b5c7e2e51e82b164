use cminus_syntax::Program;
use indexmap::IndexMap;
use mips_helper::{Line, WORD_SIZE};

/// Static storage for the program's globals, one `.space` block each.
pub(crate) struct DataManager<'ctx> {
    emitted_globals: IndexMap<&'ctx str, u32>,
}

impl<'ctx> DataManager<'ctx> {
    pub(crate) fn build(program: &Program<'ctx>) -> Self {
        let mut emitted_globals = IndexMap::default();
        for var in program.globals() {
            let Some(bytes) = var.array_size.unwrap_or(1).checked_mul(WORD_SIZE) else {
                panic!("global '{}' does not fit in static storage", var.name);
            };
            emitted_globals.entry(var.name).or_insert(bytes);
        }
        Self { emitted_globals }
    }

    /// The storage label of a global and its size in bytes.
    pub(crate) fn get(&self, name: &str) -> Option<(&'ctx str, u32)> {
        self.emitted_globals
            .get_key_value(name)
            .map(|(label, bytes)| (*label, *bytes))
    }

    pub(crate) fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        self.emitted_globals.iter().map(|(name, bytes)| Line::Space {
            name: name.to_string(),
            bytes: *bytes,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bumpalo::Bump;
    use cminus_syntax::{parse, SourceFile};
    use std::path::PathBuf;

    #[test]
    fn test_globals_in_declaration_order() {
        let arena = Bump::new();
        let file = SourceFile::new(
            PathBuf::from("test.cm"),
            String::from("int x; int a[10]; void main(void) { int local; } int y;"),
        );
        let program = parse(&arena, &file).unwrap();
        let data = DataManager::build(&program);

        let lines = data.lines().map(|line| line.to_string()).collect::<Vec<_>>();
        assert_eq!(lines, vec!["x: .space 4", "a: .space 40", "y: .space 4"]);
        assert_eq!(data.get("a"), Some(("a", 40)));
        assert_eq!(data.get("local"), None);
    }
}
