//! JSON rendering of the inventory document.

use crate::error::{Error, Result};
use crate::models::Inventory;
use std::io::Write;

/// Serialize the inventory, compact or pretty.
///
/// Map order is insertion order, so the same snapshot always renders to the
/// same bytes.
pub fn render(inventory: &Inventory, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(inventory)?
    } else {
        serde_json::to_string(inventory)?
    };
    Ok(json)
}

/// Write a document to the primary output, newline terminated.
pub fn emit(out: &mut dyn Write, document: &str) -> Result<()> {
    let write = |out: &mut dyn Write| -> std::io::Result<()> {
        out.write_all(document.as_bytes())?;
        if !document.ends_with('\n') {
            out.write_all(b"\n")?;
        }
        out.flush()
    };
    write(out).map_err(|e| Error::io("<stdout>", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ROOT_NODE;

    fn small_inventory() -> Inventory {
        let mut inv = Inventory::new();
        let g = inv.add_placeholder();
        inv.claim_name(g, "Europe", "Europe").unwrap();
        inv.add_child(ROOT_NODE, "Europe");
        inv
    }

    #[test]
    fn test_render_compact() {
        assert_eq!(
            render(&small_inventory(), false).unwrap(),
            r#"{"_meta":{"hostvars":{}},"all":{"children":["Europe"]},"Europe":{}}"#
        );
    }

    #[test]
    fn test_render_pretty() {
        let out = render(&small_inventory(), true).unwrap();
        assert!(out.starts_with("{\n  \"_meta\": {"));
        let back: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(back["all"]["children"][0], "Europe");
    }

    #[test]
    fn test_emit_adds_newline_once() {
        let mut buf = Vec::new();
        emit(&mut buf, "{}").unwrap();
        emit(&mut buf, "[]\n").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{}\n[]\n");
    }
}
