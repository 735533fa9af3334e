// JSON grid import (array of arrays, or array of letter-keyed objects)

use std::path::Path;

use romaneio_recon::Grid;

pub fn import(path: &Path) -> Result<Grid, String> {
    let content = super::csv::read_file_as_utf8(path)?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| format!("{}: invalid JSON: {e}", path.display()))?;
    Grid::from_json(&value).map_err(|e| format!("{}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_objects_keyed_by_letter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.json");
        fs::write(&path, r#"[{"A": "Agente:", "B": "Ana"}, {"G": 1001, "H": "Pedido"}]"#).unwrap();

        let grid = import(&path).unwrap();
        assert_eq!(grid.rows()[0].text(1).as_deref(), Some("Ana"));
        assert_eq!(grid.rows()[1].get(6).to_text(), "1001");
    }

    #[test]
    fn test_not_a_grid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"rows": []}"#).unwrap();

        let err = import(&path).unwrap_err();
        assert!(err.contains("not a two-dimensional grid"), "{err}");
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[[").unwrap();
        assert!(import(&path).unwrap_err().contains("invalid JSON"));
    }
}
