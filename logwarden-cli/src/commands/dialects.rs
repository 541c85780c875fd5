//! `logwarden dialects` command handler

use std::io::Write;

use serde::Serialize;

use logwarden_analyzer::Dialect;

use crate::output::Render;

/// Collects every registered dialect with the record fields it fills.
pub fn list() -> DialectListReport {
    DialectListReport {
        dialects: Dialect::ALL
            .iter()
            .map(|d| DialectEntry {
                name: d.name(),
                fields: d.field_slots().to_vec(),
            })
            .collect(),
    }
}

#[derive(Serialize)]
pub struct DialectListReport {
    pub dialects: Vec<DialectEntry>,
}

#[derive(Serialize)]
pub struct DialectEntry {
    pub name: &'static str,
    pub fields: Vec<&'static str>,
}

impl Render for DialectListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Log Dialects ({} total)", self.dialects.len().to_string().bold())?;
        writeln!(w)?;
        for d in &self.dialects {
            writeln!(w, "{:<14} {}", d.name.bold(), d.fields.join(", "))?;
        }
        Ok(())
    }
}
