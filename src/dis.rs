//! Disassembler and opcode statistics

use crate::arena::Interner;
use crate::bytecode::{decode_args, Opcode};
use crate::compiler::Program;
use crate::value::{StrRef, Value, ValueKind};

use itertools::Itertools;
use std::fmt::Write;
use strum::EnumCount;

fn render_global(v: &Value, interner: &Interner) -> String {
    match v.kind {
        ValueKind::None => "Option::None".into(),
        ValueKind::Bool(b) => b.to_string(),
        ValueKind::Int(i) => i.to_string(),
        ValueKind::Double(d) => d.to_string(),
        ValueKind::Str(StrRef::Interned(id)) => format!("\"{}\"", interner.str(id)),
        // the compiler only ever interns global strings
        _ => "<heap>".into(),
    }
}

/// Renders a readable bytecode representation with labels, globals and
/// comments.
pub fn disassemble(program: &Program, interner: &Interner) -> String {
    let mut out = String::new();

    if !program.globals.is_empty() {
        out.push_str("__globals:\n");
        for (idx, global) in program.globals.iter().enumerate() {
            let _ = writeln!(out, "\t{}; {{idx={idx}}}", render_global(global, interner));
        }
    }

    out.push_str("\n__entry:\n");
    for at in (0..program.bytecode.len()).step_by(2) {
        if let Some(func) = program.functions.iter().find(|f| f.bytecode_index == at) {
            let _ = writeln!(
                out,
                "\n; {}::{{args={},size={}}}\n__{:#06x}:",
                func.name, func.argument_count, func.size, at
            );
        }

        let word = program.bytecode[at];
        let arg = program.bytecode[at + 1];
        let Ok(op) = Opcode::try_from(word) else {
            let _ = writeln!(out, "\t??? {word} {arg}");
            continue;
        };

        let _ = write!(out, "\t{op}");
        match op {
            Opcode::Leave | Opcode::Assert => {}
            Opcode::Args => {
                let (count, offset) = decode_args(arg);
                let _ = write!(out, " {arg}; count={count},offset={offset}");
            }
            Opcode::Loadg => {
                let rendered = program
                    .globals
                    .get(arg as usize)
                    .map(|g| render_global(g, interner))
                    .unwrap_or_else(|| "<invalid>".into());
                let _ = write!(out, " {arg}; {rendered}");
            }
            Opcode::Call => {
                let _ = write!(out, " {arg}");
                if let Some(func) = program
                    .functions
                    .iter()
                    .find(|f| f.bytecode_index == arg as usize)
                {
                    let _ = write!(out, "; <{}> ${}", func.name, func.argument_count);
                }
            }
            _ => {
                let _ = write!(out, " {arg}");
            }
        }
        out.push('\n');
    }
    out
}

/// Renders the opcode frequency table over compiled words and executed
/// instructions, most frequent first.
pub fn opcode_stats(program: &Program, executed: &[u64; Opcode::COUNT]) -> String {
    let mut compiled = [0u64; Opcode::COUNT];
    for at in (0..program.bytecode.len()).step_by(2) {
        if let Ok(op) = Opcode::try_from(program.bytecode[at]) {
            compiled[op as usize] += 1;
        }
    }
    let total_compiled: u64 = compiled.iter().sum();
    let total_executed: u64 = executed.iter().sum();
    let pct = |n: u64, total: u64| {
        if total == 0 {
            0.0
        } else {
            n as f64 * 100.0 / total as f64
        }
    };

    let mut out = String::new();
    let _ = writeln!(out, "| {:<10} | {:<24} | {:<24} |", "Opcode", "Compiled %", "Executed %");
    let _ = writeln!(
        out,
        "| ---------- | ------------------------ | ------------------------ |"
    );
    for idx in (0..Opcode::COUNT)
        .filter(|idx| compiled[*idx] > 0 || executed[*idx] > 0)
        .sorted_by_key(|idx| std::cmp::Reverse(compiled[*idx] + executed[*idx]))
    {
        let op = Opcode::try_from(idx as u32).expect("index within opcode count");
        let _ = writeln!(
            out,
            "| {:<10} | {:<15} ({:05.2}%) | {:<15} ({:05.2}%) |",
            op.to_string(),
            compiled[idx],
            pct(compiled[idx], total_compiled),
            executed[idx],
            pct(executed[idx], total_executed),
        );
    }
    let _ = writeln!(
        out,
        "| ========== | ======================== | ======================== |"
    );
    let _ = writeln!(
        out,
        "| {:<10} | {:<24} | {:<24} |",
        "::<>", total_compiled, total_executed
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::Builtins;
    use crate::pg::Config;

    fn program(src: &str) -> (Program, Interner) {
        let nodes = crate::parser::Parser::new(src).unwrap().parse().unwrap();
        let mut interner = Interner::new();
        let builtins = Builtins::std(&Config::default()).unwrap();
        let program = crate::compiler::compile(&nodes, &mut interner, &builtins).unwrap();
        (program, interner)
    }

    #[test]
    fn listing_shows_globals_and_function_labels() {
        let (program, interner) = program("(@fn id[x] x) (id 25)");
        let listing = disassemble(&program, &interner);
        assert!(listing.contains("__globals:"));
        assert!(listing.contains("id::{args=1,"));
        assert!(listing.contains("LOADG"));
        assert!(listing.contains("; <id> $1"));
    }

    #[test]
    fn stats_table_counts_compiled_words() {
        let (program, _) = program("(+ 1 2)");
        let executed = [0u64; Opcode::COUNT];
        let table = opcode_stats(&program, &executed);
        assert!(table.contains("LOADG"));
        assert!(table.contains("ADD"));
    }
}
