//! ABC bytecode → ActionScript-like source.
//!
//! Expression-level, not type-level: opcodes execute against a symbolic
//! operand stack of expression strings, and statements are emitted linearly
//! with `label_<pc>:` lines at branch targets. Stack underflow drops the
//! opcode; unknown opcodes are skipped. The output is best-effort by design.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use abcdata::abc::{Abc, ClassDef, MethodBody, TraitData};
use abcdata::reader::AbcReader;
use abcdata::Opcode;
use anyhow::{Context, Result};

/// Decompiler options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Emit `// opcode 0x..` comments for suppressed and unknown opcodes.
    pub opcode_comments: bool,
}

pub struct Decompiler<'a> {
    abc: &'a Abc,
    options: Options,
}

impl<'a> Decompiler<'a> {
    pub fn new(abc: &'a Abc, options: Options) -> Self {
        Self { abc, options }
    }

    /// Write one `.as` file per class trait reachable from the script table,
    /// under directories derived from each class's package. Returns how many
    /// classes were written.
    pub fn write_classes(&self, out_dir: &Path) -> Result<usize> {
        let mut written = 0;
        for script in &self.abc.scripts {
            for script_trait in &script.traits {
                let TraitData::Class { class, .. } = &script_trait.data else {
                    continue;
                };
                let Some(def) = self.abc.classes.get(*class as usize) else {
                    continue;
                };
                let class_name = self.abc.pool.multiname_name(def.instance.name);
                let package = self.abc.pool.multiname_package(def.instance.name);

                let mut dir = out_dir.to_path_buf();
                if !package.is_empty() {
                    for part in package.split('.') {
                        dir.push(part);
                    }
                }
                fs::create_dir_all(&dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;

                let path = dir.join(format!("{class_name}.as"));
                fs::write(&path, self.class_source(def))
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("[abc] {} → {}", class_name, path.display());
                written += 1;
            }
        }
        Ok(written)
    }

    /// Package + class block with one stub per method trait.
    pub fn class_source(&self, def: &ClassDef) -> String {
        let pool = &self.abc.pool;
        let class_name = pool.multiname_name(def.instance.name);
        let package = pool.multiname_package(def.instance.name);

        let mut out = String::new();
        if !package.is_empty() {
            let _ = writeln!(out, "package {package} {{");
        }
        let _ = write!(out, "public class {class_name}");
        if def.instance.super_name != 0 {
            let _ = write!(out, " extends {}", pool.multiname_name(def.instance.super_name));
        }
        let _ = writeln!(out, " {{");

        for t in &def.instance.traits {
            if let Some(method) = t.method_index() {
                self.emit_method(&mut out, pool.multiname_name(t.name), method, false);
            }
        }
        for t in &def.statics.traits {
            if let Some(method) = t.method_index() {
                self.emit_method(&mut out, pool.multiname_name(t.name), method, true);
            }
        }

        out.push_str("}\n");
        if !package.is_empty() {
            out.push_str("}\n");
        }
        out
    }

    fn emit_method(&self, out: &mut String, name: String, method: u32, is_static: bool) {
        let qualifier = if is_static { "public static" } else { "public" };
        let _ = writeln!(out, "    {qualifier} function {name}() {{");
        if let Some(body) = self.abc.body_for_method(method) {
            out.push_str(&self.method_source(body));
        }
        out.push_str("    }\n\n");
    }

    /// Decompile one method body to statements.
    pub fn method_source(&self, body: &MethodBody) -> String {
        let pool = &self.abc.pool;
        let code = &body.code;
        let mut out = String::new();
        let mut stack: Vec<String> = Vec::new();
        let mut jump_targets: HashSet<usize> = HashSet::new();

        // Slot 0 is the receiver; the rest start out as parameters until a
        // setlocal renames them.
        let local_count = (body.local_count as usize).max(4);
        let mut locals: Vec<String> = (0..local_count)
            .map(|i| {
                if i == 0 {
                    "this".to_string()
                } else {
                    format!("arg{i}")
                }
            })
            .collect();

        let stmt = |out: &mut String, line: &str| {
            let _ = writeln!(out, "        {line}");
        };

        let mut r = AbcReader::new(code);
        while !r.at_end() {
            let pc = r.position();
            if jump_targets.contains(&pc) {
                let _ = writeln!(out, "label_{pc}:");
            }

            let byte = r.read_u8();
            let Some(op) = Opcode::from_u8(byte) else {
                if self.options.opcode_comments {
                    stmt(&mut out, &format!("// opcode 0x{byte:02x}"));
                }
                continue;
            };
            if op.is_non_semantic() {
                if self.options.opcode_comments {
                    stmt(&mut out, &format!("// opcode 0x{byte:02x}"));
                }
                continue;
            }

            match op {
                Opcode::Label | Opcode::PopScope => unreachable!("filtered above"),

                Opcode::ReturnVoid => stmt(&mut out, "return;"),
                Opcode::ReturnValue => {
                    if let Some(value) = stack.pop() {
                        stmt(&mut out, &format!("return {value};"));
                    }
                }

                Opcode::PushNull => stack.push("null".into()),
                Opcode::PushUndefined => stack.push("undefined".into()),
                Opcode::PushTrue => stack.push("true".into()),
                Opcode::PushFalse => stack.push("false".into()),
                Opcode::PushNan => stack.push("NaN".into()),

                Opcode::PushByte => {
                    let value = r.read_u8() as i8;
                    stack.push(value.to_string());
                }
                Opcode::PushShort => {
                    let value = r.read_u30().unwrap_or(0);
                    stack.push(value.to_string());
                }
                Opcode::PushString => {
                    let index = r.read_u30().unwrap_or(0);
                    stack.push(format!("\"{}\"", pool.string(index)));
                }
                Opcode::PushInt => {
                    let index = r.read_u30().unwrap_or(0);
                    stack.push(pool.int(index).to_string());
                }
                Opcode::PushUint => {
                    let index = r.read_u30().unwrap_or(0);
                    stack.push(pool.uint(index).to_string());
                }
                Opcode::PushDouble => {
                    let index = r.read_u30().unwrap_or(0);
                    stack.push(pool.double(index).to_string());
                }

                // Scope pushes consume their operand and emit nothing.
                Opcode::PushScope | Opcode::PushWith => {
                    stack.pop();
                }

                Opcode::GetLocal0 | Opcode::GetLocal1 | Opcode::GetLocal2 | Opcode::GetLocal3 => {
                    let index = (byte - Opcode::GetLocal0 as u8) as usize;
                    stack.push(locals[index].clone());
                }
                Opcode::GetLocal => {
                    let index = r.read_u30().unwrap_or(0) as usize;
                    let name = locals
                        .get(index)
                        .cloned()
                        .unwrap_or_else(|| format!("arg{index}"));
                    stack.push(name);
                }
                Opcode::SetLocal0 | Opcode::SetLocal1 | Opcode::SetLocal2 | Opcode::SetLocal3 => {
                    let index = (byte - Opcode::SetLocal0 as u8) as usize;
                    if let Some(value) = stack.pop() {
                        stmt(&mut out, &format!("var local{index} = {value};"));
                        locals[index] = format!("local{index}");
                    }
                }
                Opcode::SetLocal => {
                    let index = r.read_u30().unwrap_or(0) as usize;
                    if let Some(value) = stack.pop() {
                        stmt(&mut out, &format!("var local{index} = {value};"));
                        if index < locals.len() {
                            locals[index] = format!("local{index}");
                        }
                    }
                }

                Opcode::Add => binop(&mut stack, "+"),
                Opcode::Subtract => binop(&mut stack, "-"),
                Opcode::Multiply => binop(&mut stack, "*"),
                Opcode::Divide => binop(&mut stack, "/"),
                Opcode::Equals => binop(&mut stack, "=="),
                Opcode::LessThan => binop(&mut stack, "<"),

                Opcode::GetLex => {
                    let index = r.read_u30().unwrap_or(0);
                    stack.push(pool.multiname_name(index));
                }
                Opcode::GetProperty => {
                    let index = r.read_u30().unwrap_or(0);
                    if let Some(object) = stack.pop() {
                        stack.push(format!("{object}.{}", pool.multiname_name(index)));
                    }
                }
                Opcode::SetProperty | Opcode::InitProperty => {
                    let index = r.read_u30().unwrap_or(0);
                    if stack.len() >= 2 {
                        let value = stack.pop().unwrap_or_default();
                        let object = stack.pop().unwrap_or_default();
                        stmt(
                            &mut out,
                            &format!("{object}.{} = {value};", pool.multiname_name(index)),
                        );
                    }
                }

                Opcode::CallProperty => {
                    let index = r.read_u30().unwrap_or(0);
                    let argc = r.read_u30().unwrap_or(0);
                    let args = pop_args(&mut stack, argc);
                    if let Some(object) = stack.pop() {
                        stack.push(format!(
                            "{object}.{}({})",
                            pool.multiname_name(index),
                            args.join(", ")
                        ));
                    }
                }
                Opcode::CallPropVoid => {
                    let index = r.read_u30().unwrap_or(0);
                    let argc = r.read_u30().unwrap_or(0);
                    let args = pop_args(&mut stack, argc);
                    if let Some(object) = stack.pop() {
                        stmt(
                            &mut out,
                            &format!(
                                "{object}.{}({});",
                                pool.multiname_name(index),
                                args.join(", ")
                            ),
                        );
                    }
                }

                Opcode::NewFunction => {
                    let index = r.read_u30().unwrap_or(0);
                    stack.push(format!("function_{index}"));
                }
                Opcode::NewClass => {
                    let index = r.read_u30().unwrap_or(0);
                    stack.pop();
                    stack.push(format!("Class_{index}"));
                }
                Opcode::NewObject => {
                    // Key/value pairs are popped without reconstructing the
                    // literal; expression strings make that unreliable.
                    let argc = r.read_u30().unwrap_or(0);
                    for _ in 0..argc.saturating_mul(2) {
                        if stack.pop().is_none() {
                            break;
                        }
                    }
                    stack.push("{}".into());
                }
                Opcode::NewArray => {
                    let argc = r.read_u30().unwrap_or(0);
                    let items = pop_args(&mut stack, argc);
                    stack.push(format!("[{}]", items.join(", ")));
                }

                Opcode::Jump => {
                    let target = branch_target(&mut r);
                    jump_targets.insert(target);
                    stmt(&mut out, &format!("goto label_{target};"));
                }
                Opcode::IfTrue => {
                    let target = branch_target(&mut r);
                    jump_targets.insert(target);
                    if let Some(condition) = stack.pop() {
                        stmt(&mut out, &format!("if ({condition}) goto label_{target};"));
                    }
                }
                Opcode::IfFalse => {
                    let target = branch_target(&mut r);
                    jump_targets.insert(target);
                    if let Some(condition) = stack.pop() {
                        stmt(
                            &mut out,
                            &format!("if (!({condition})) goto label_{target};"),
                        );
                    }
                }

                Opcode::Pop => {
                    if let Some(value) = stack.pop() {
                        stmt(&mut out, &format!("{value};"));
                    }
                }
                Opcode::Dup => {
                    if let Some(top) = stack.last().cloned() {
                        stack.push(top);
                    }
                }

                Opcode::ConvertI => convert(&mut stack, "int"),
                Opcode::ConvertU => convert(&mut stack, "uint"),
                Opcode::ConvertD => convert(&mut stack, "Number"),
            }
        }

        out
    }
}

/// Branch base is the byte after the 24-bit offset operand.
fn branch_target(r: &mut AbcReader) -> usize {
    let offset = r.read_s24();
    (r.position() as i64 + i64::from(offset)).max(0) as usize
}

/// Pop `argc` operands and restore source order.
fn pop_args(stack: &mut Vec<String>, argc: u32) -> Vec<String> {
    let mut args = Vec::new();
    for _ in 0..argc {
        let Some(value) = stack.pop() else { break };
        args.push(value);
    }
    args.reverse();
    args
}

fn binop(stack: &mut Vec<String>, operator: &str) {
    if stack.len() >= 2 {
        let right = stack.pop().unwrap_or_default();
        let left = stack.pop().unwrap_or_default();
        stack.push(format!("({left} {operator} {right})"));
    }
}

fn convert(stack: &mut Vec<String>, cast: &str) {
    if let Some(value) = stack.pop() {
        stack.push(format!("{cast}({value})"));
    }
}
