use crate::structure::*;

pub trait Serializer {
    fn serialize<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: std::io::Write + ?Sized;
}

impl Serializer for Line {
    fn serialize<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: std::io::Write + ?Sized,
    {
        writeln!(writer, "{self}")
    }
}

impl Serializer for Instr {
    fn serialize<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: std::io::Write + ?Sized,
    {
        writeln!(writer, "    {self}")
    }
}

impl Serializer for Directive {
    fn serialize<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: std::io::Write + ?Sized,
    {
        writeln!(writer, "{self}")
    }
}

impl<T> Serializer for [T]
where
    T: Serializer,
{
    fn serialize<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: std::io::Write + ?Sized,
    {
        for item in self.iter() {
            item.serialize(writer)?;
        }
        Ok(())
    }
}

impl<T> Serializer for Vec<T>
where
    T: Serializer,
{
    fn serialize<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: std::io::Write + ?Sized,
    {
        self.as_slice().serialize(writer)
    }
}

impl<T> Serializer for Option<T>
where
    T: Serializer,
{
    fn serialize<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: std::io::Write + ?Sized,
    {
        if let Some(ref val) = &self {
            val.serialize(writer)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LineKind {
    Label,
    Directive,
    Data,
    Instruction,
    Blank,
}

/// Tells what a serialized listing line is from its shape alone. Returns
/// `None` for text the serializer never produces.
pub fn classify_line(line: &str) -> Option<LineKind> {
    let trimmed = line.trim_end();
    if trimmed.is_empty() {
        return Some(LineKind::Blank);
    }
    if trimmed.starts_with(char::is_whitespace) {
        return Some(LineKind::Instruction);
    }
    if trimmed.starts_with('.') {
        return Some(LineKind::Directive);
    }

    match trimmed.split_once(':') {
        Some((name, "")) if is_symbol(name) => Some(LineKind::Label),
        Some((name, rest)) if is_symbol(name) && rest.trim_start().starts_with('.') => Some(LineKind::Data),
        _ => None,
    }
}

fn is_symbol(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => (),
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
