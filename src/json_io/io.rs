use crate::json_io::models::TriangulationInput;

use std::fs;
use std::path::Path;

pub fn read(path: &Path) -> Option<TriangulationInput> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) => {
            log::error!("Failed to read {}: {}", path.display(), error);
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(input) => Some(input),
        Err(error) => {
            log::error!("Failed to parse {}: {}", path.display(), error);
            return None;
        }
    }
}

pub fn write(path: &Path, content: String) -> std::io::Result<()> {
    return fs::write(path, content);
}

#[cfg(test)]
mod round_trip {
    use super::*;

    #[test]
    fn test_read_back_written_document() {
        let directory = std::env::temp_dir();
        let path = directory.join("delaunay_quality_io_sample.json");

        let document = r#"{ "vertices": [[0.0, 0.0], [2.0, 0.0], [0.0, 2.0]], "min_angle": 20.0 }"#;
        write(&path, document.to_string()).unwrap();

        let input = read(&path).unwrap();
        assert_eq!(input.vertices.len(), 3);
        assert_eq!(input.min_angle, 20.0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn none_if_missing_file() {
        let path = Path::new("/nonexistent/delaunay_quality_nowhere.json");
        assert!(read(path).is_none());
    }
}
