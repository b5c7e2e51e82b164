use crate::context::Context;
use crate::data::DataManager;
use crate::func::{entry_label, FuncBuilder, MAIN};
use cminus_syntax::Program;
use cminus_typecheck::SymbolTable;
use mips_helper::{Directive, Instr, Line};
use std::io::Write;
use tracing::debug;

/// Writes the assembly listing of a type-checked program to `writer`, one
/// line at a time. The program and table must come from a successful
/// semantic analysis; a name the analysis should have rejected panics.
pub fn generate<W>(program: &Program, table: &SymbolTable, writer: &mut W) -> std::io::Result<()>
where
    W: Write + ?Sized,
{
    let data = DataManager::build(program);
    let mut ctx = Context::new(table, data, writer);

    ctx.emit(Directive::Data)?;
    let globals = ctx.data.lines().collect::<Vec<_>>();
    for line in globals {
        ctx.emit(line)?;
    }
    ctx.emit(Line::Blank)?;

    ctx.emit(Directive::Text)?;
    ctx.emit(Directive::Globl(MAIN.to_string()))?;
    ctx.label(MAIN)?;
    ctx.emit(Instr::J(entry_label(MAIN)))?;

    let mut functions = 0;
    for fun in program.functions() {
        ctx.emit(Line::Blank)?;
        FuncBuilder::new(&mut ctx, fun).build()?;
        functions += 1;
    }

    debug!(functions, "generated program");
    Ok(())
}

pub fn generate_to_string(program: &Program, table: &SymbolTable) -> std::io::Result<String> {
    let mut buff = Vec::<u8>::default();
    generate(program, table, &mut buff)?;
    String::from_utf8(buff).map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
}

#[cfg(test)]
mod test {
    use super::*;
    use bumpalo::Bump;
    use cminus_syntax::{parse, SourceFile};
    use cminus_typecheck::analyze;
    use mips_helper::classify_line;
    use std::path::PathBuf;

    fn compile(source: &str) -> String {
        let arena = Bump::new();
        let file = SourceFile::new(PathBuf::from("test.cm"), source.to_string());
        let program = parse(&arena, &file).unwrap();
        let table = analyze(&file, &program).unwrap();
        generate_to_string(&program, &table).unwrap()
    }

    // the lines of `main_entry` between the prologue and `main_exit:`
    fn main_body(listing: &str) -> Vec<&str> {
        listing
            .lines()
            .skip_while(|line| *line != "main_entry:")
            .skip_while(|line| *line != "    move $fp, $sp")
            .skip(1)
            .take_while(|line| *line != "main_exit:")
            .collect()
    }

    fn contains_sequence(listing: &str, expected: &[&str]) -> bool {
        let lines = listing.lines().collect::<Vec<_>>();
        lines.windows(expected.len()).any(|window| window == expected)
    }

    #[test]
    fn test_global_sum_and_output() {
        let listing = compile("int x; void main(void) { x = 1 + 2; output(x); }");
        let expected = "\
.data
x: .space 4

.text
.globl main
main:
    j main_entry

main_entry:
    addiu $sp, $sp, -8
    sw $ra, 4($sp)
    sw $fp, 0($sp)
    move $fp, $sp
    li $t0, 1
    addiu $sp, $sp, -4
    sw $t0, 0($sp)
    li $t0, 2
    lw $t1, 0($sp)
    addiu $sp, $sp, 4
    addu $t0, $t1, $t0
    la $t2, x
    sw $t0, 0($t2)
    la $t2, x
    lw $t0, 0($t2)
    move $a0, $t0
    li $v0, 1
    syscall
    li $a0, 10
    li $v0, 11
    syscall
main_exit:
    li $v0, 10
    syscall
";
        assert_eq!(listing, expected);
    }

    #[test]
    fn test_call_with_params() {
        let listing = compile("int f(int a, int b) { return a + b; } void main(void) { output(f(1,2)); }");
        let expected = "\
.data

.text
.globl main
main:
    j main_entry

f_entry:
    addiu $sp, $sp, -8
    sw $ra, 4($sp)
    sw $fp, 0($sp)
    move $fp, $sp
    lw $t0, 8($fp)
    addiu $sp, $sp, -4
    sw $t0, 0($sp)
    lw $t0, 12($fp)
    lw $t1, 0($sp)
    addiu $sp, $sp, 4
    addu $t0, $t1, $t0
    move $v0, $t0
    j f_exit
f_exit:
    move $sp, $fp
    lw $fp, 0($sp)
    lw $ra, 4($sp)
    addiu $sp, $sp, 8
    jr $ra

main_entry:
    addiu $sp, $sp, -8
    sw $ra, 4($sp)
    sw $fp, 0($sp)
    move $fp, $sp
    li $t0, 2
    addiu $sp, $sp, -4
    sw $t0, 0($sp)
    li $t0, 1
    addiu $sp, $sp, -4
    sw $t0, 0($sp)
    jal f_entry
    addiu $sp, $sp, 8
    move $t0, $v0
    move $a0, $t0
    li $v0, 1
    syscall
    li $a0, 10
    li $v0, 11
    syscall
main_exit:
    li $v0, 10
    syscall
";
        assert_eq!(listing, expected);
    }

    #[test]
    fn test_if_lays_out_else_first() {
        let listing = compile("int x; void main(void) { if (x) x = 1; else x = 2; }");
        assert_eq!(
            main_body(&listing),
            vec![
                "    la $t2, x",
                "    lw $t0, 0($t2)",
                "    bne $t0, $zero, true_0",
                "    li $t0, 2",
                "    la $t2, x",
                "    sw $t0, 0($t2)",
                "    j end_if_0",
                "true_0:",
                "    li $t0, 1",
                "    la $t2, x",
                "    sw $t0, 0($t2)",
                "end_if_0:",
            ]
        );
    }

    #[test]
    fn test_if_without_else() {
        let listing = compile("void main(void) { if (1) output(2); }");
        assert_eq!(
            main_body(&listing)[..4],
            [
                "    li $t0, 1",
                "    bne $t0, $zero, true_0",
                "    j end_if_0",
                "true_0:",
            ]
        );
    }

    #[test]
    fn test_while_loop() {
        let listing = compile("void main(void) { int i; i = 0; while (i < 3) i = i + 1; }");
        assert_eq!(
            main_body(&listing),
            vec![
                "    addiu $sp, $sp, -4",
                "    li $t0, 0",
                "    sw $t0, -4($fp)",
                "while_0:",
                "    lw $t0, -4($fp)",
                "    addiu $sp, $sp, -4",
                "    sw $t0, 0($sp)",
                "    li $t0, 3",
                "    lw $t1, 0($sp)",
                "    addiu $sp, $sp, 4",
                "    slt $t0, $t1, $t0",
                "    beq $t0, $zero, end_while_0",
                "    lw $t0, -4($fp)",
                "    addiu $sp, $sp, -4",
                "    sw $t0, 0($sp)",
                "    li $t0, 1",
                "    lw $t1, 0($sp)",
                "    addiu $sp, $sp, 4",
                "    addu $t0, $t1, $t0",
                "    sw $t0, -4($fp)",
                "    j while_0",
                "end_while_0:",
            ]
        );
    }

    #[test]
    fn test_labels_are_unique() {
        let listing = compile(
            "void main(void) { int i; while (i) { if (i) i = 0; } if (i) ; else ; }\nvoid f(void) { while (1) ; }",
        );
        let labels = listing
            .lines()
            .filter(|line| line.ends_with(':'))
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            vec![
                "main:",
                "main_entry:",
                "while_0:",
                "true_1:",
                "end_if_1:",
                "end_while_0:",
                "true_2:",
                "end_if_2:",
                "main_exit:",
                "f_entry:",
                "while_3:",
                "end_while_3:",
                "f_exit:",
            ]
        );
    }

    #[test]
    fn test_array_access() {
        let listing = compile("int g[4]; void main(void) { int a[2]; a[1] = 5; g[0] = a[1]; }");
        assert!(listing.contains("g: .space 16\n"));
        assert_eq!(
            main_body(&listing),
            vec![
                "    addiu $sp, $sp, -8",
                "    li $t0, 5",
                "    addiu $sp, $sp, -4",
                "    sw $t0, 0($sp)",
                "    li $t0, 1",
                "    sll $t0, $t0, 2",
                "    addiu $t2, $fp, -8",
                "    addu $t2, $t2, $t0",
                "    lw $t1, 0($sp)",
                "    addiu $sp, $sp, 4",
                "    sw $t1, 0($t2)",
                "    move $t0, $t1",
                "    li $t0, 1",
                "    sll $t0, $t0, 2",
                "    addiu $t2, $fp, -8",
                "    addu $t2, $t2, $t0",
                "    lw $t0, 0($t2)",
                "    addiu $sp, $sp, -4",
                "    sw $t0, 0($sp)",
                "    li $t0, 0",
                "    sll $t0, $t0, 2",
                "    la $t2, g",
                "    addu $t2, $t2, $t0",
                "    lw $t1, 0($sp)",
                "    addiu $sp, $sp, 4",
                "    sw $t1, 0($t2)",
                "    move $t0, $t1",
            ]
        );
    }

    #[test]
    fn test_operators() {
        let cases: &[(&str, &[&str])] = &[
            ("-", &["    subu $t0, $t1, $t0"]),
            ("*", &["    mul $t0, $t1, $t0"]),
            ("/", &["    div $t1, $t0", "    mflo $t0"]),
            ("<", &["    slt $t0, $t1, $t0"]),
            (">", &["    slt $t0, $t0, $t1"]),
            ("<=", &["    slt $t0, $t0, $t1", "    xori $t0, $t0, 1"]),
            (">=", &["    slt $t0, $t1, $t0", "    xori $t0, $t0, 1"]),
            ("==", &["    subu $t0, $t1, $t0", "    sltiu $t0, $t0, 1"]),
            ("!=", &["    subu $t0, $t1, $t0", "    sltu $t0, $zero, $t0"]),
        ];
        for (op, tail) in cases {
            let listing = compile(&format!("void main(void) {{ output(7 {op} 2); }}"));
            let mut expected = vec!["    lw $t1, 0($sp)", "    addiu $sp, $sp, 4"];
            expected.extend(tail.iter());
            expected.push("    move $a0, $t0");
            assert!(contains_sequence(&listing, &expected), "operator {op}:\n{listing}");
        }
    }

    #[test]
    fn test_input_and_local_shadowing() {
        let listing = compile("int x; void main(void) { int x; x = input(); }");
        assert_eq!(
            main_body(&listing),
            vec![
                "    addiu $sp, $sp, -4",
                "    li $v0, 5",
                "    syscall",
                "    move $t0, $v0",
                "    sw $t0, -4($fp)",
            ]
        );
    }

    #[test]
    fn test_void_return_jumps_to_exit() {
        let listing = compile("void f(void) { return; }\nvoid main(void) { f(); }");
        assert!(contains_sequence(&listing, &["    move $fp, $sp", "    j f_exit", "f_exit:"]));
        assert!(contains_sequence(&listing, &["    jal f_entry", "    move $t0, $v0"]));
    }

    #[test]
    fn test_generation_is_repeatable() {
        let source = "int a[3];\nint f(int n) { if (n > 0) return n; return 0; }\nvoid main(void) { while (a[0] < 2) a[0] = f(a[0] + 1); }";
        let first = compile(source);
        let second = compile(source);
        assert_eq!(first, second);
        assert!(first.contains("true_0:"));
    }

    #[test]
    fn test_every_line_has_a_known_shape() {
        let listing = compile("int g; int f(int a) { int b[2]; b[0] = a; return b[0]; }\nvoid main(void) { g = f(input()); output(g); }");
        for line in listing.lines() {
            assert!(classify_line(line).is_some(), "unknown line shape: {line:?}");
        }
    }
}
