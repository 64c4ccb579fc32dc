//! Import-name to distribution-name mapping.
//!
//! Some packages install under a different name than the one scripts
//! import (`import cv2` comes from `opencv-python`). [`AliasTable`] holds those
//! mappings. It starts from a built-in table and can be extended or
//! overridden from configuration.

use std::collections::BTreeMap;

/// Built-in mappings, keyed by lowercase import name.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("attr", "attrs"),
    ("bs4", "beautifulsoup4"),
    ("cv2", "opencv-python"),
    ("dateutil", "python-dateutil"),
    ("docx", "python-docx"),
    ("dotenv", "python-dotenv"),
    ("fitz", "PyMuPDF"),
    ("gi", "PyGObject"),
    ("google.protobuf", "protobuf"),
    ("jwt", "PyJWT"),
    ("magic", "python-magic"),
    ("mpl_toolkits", "matplotlib"),
    ("pil", "Pillow"),
    ("pptx", "python-pptx"),
    ("qt_material", "qt-material"),
    ("qtawesome", "qtawesome"),
    ("serial", "pyserial"),
    ("skimage", "scikit-image"),
    ("sklearn", "scikit-learn"),
    ("usb", "pyusb"),
    ("win32api", "pywin32"),
    ("win32con", "pywin32"),
    ("yaml", "PyYAML"),
    ("zmq", "pyzmq"),
];

/// Case-insensitive lookup table from import name to installable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    entries: BTreeMap<String, String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AliasTable {
    /// Table with no mappings; every import resolves to itself.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Table seeded with the built-in mappings.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (import, dist) in DEFAULT_ALIASES {
            table.insert(import, dist);
        }
        table
    }

    /// Add or replace a mapping.
    pub fn insert(&mut self, import: &str, distribution: &str) {
        self.entries
            .insert(import.to_lowercase(), distribution.to_string());
    }

    /// Layer `overrides` on top of this table.
    pub fn extend<'a, I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (import, dist) in overrides {
            self.insert(import, dist);
        }
    }

    /// Distribution name for `import`, or the import name itself.
    ///
    /// `module` may be dotted; the longest mapped prefix wins so namespace
    /// packages like `google.protobuf` can be mapped.
    pub fn resolve(&self, module: &str) -> String {
        let lowered = module.to_lowercase();
        let mut prefix = lowered.as_str();
        loop {
            if let Some(dist) = self.entries.get(prefix) {
                return dist.clone();
            }
            match prefix.rsplit_once('.') {
                Some((shorter, _)) => prefix = shorter,
                None => break,
            }
        }
        module.split('.').next().unwrap_or(module).to_string()
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no mappings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_pil_case_insensitively() {
        let table = AliasTable::builtin();
        assert_eq!(table.resolve("PIL"), "Pillow");
        assert_eq!(table.resolve("PIL.Image"), "Pillow");
    }

    #[test]
    fn unknown_import_resolves_to_its_top_level() {
        let table = AliasTable::builtin();
        assert_eq!(table.resolve("numpy.linalg"), "numpy");
    }

    #[test]
    fn longest_dotted_prefix_wins() {
        let table = AliasTable::builtin();
        assert_eq!(table.resolve("google.protobuf.message"), "protobuf");
        assert_eq!(table.resolve("google.cloud"), "google");
    }

    #[test]
    fn overrides_replace_builtin_entries() {
        let mut table = AliasTable::builtin();
        let overrides = BTreeMap::from([
            ("cv2".to_string(), "opencv-python-headless".to_string()),
            ("mylib".to_string(), "my-lib-dist".to_string()),
        ]);
        table.extend(&overrides);

        assert_eq!(table.resolve("cv2"), "opencv-python-headless");
        assert_eq!(table.resolve("MyLib"), "my-lib-dist");
    }

    #[test]
    fn empty_table_is_identity() {
        let table = AliasTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.resolve("yaml"), "yaml");
    }
}
