//! Definition files on disk.
//!
//! A file holds one layer of schema definitions. It is only parsed as TOML
//! here; checking it against the document model waits until every layer has
//! been merged, since a layer may hold just a fragment of a schema (a single
//! overridden field, say).

use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use super::RegistryError;

/// Reads one definition layer.
///
/// An optional layer that does not exist yields `Ok(None)` and contributes
/// nothing to the merge.
pub(super) fn load_definition_file(
    path: &Path,
    required: bool,
) -> Result<Option<toml::Table>, RegistryError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound && !required => {
            debug!(path = %path.display(), "optional definition file missing, skipped");
            return Ok(None);
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(RegistryError::FileNotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(RegistryError::ReadError {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let layer = toml::from_str(&contents).map_err(|source| RegistryError::ParseError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(layer))
}
