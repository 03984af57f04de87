//! The `export-schema` command: writes the CMS type definitions as JSON so
//! that the CMS studio can be configured from them.

use std::{fs, io::{self, Write}, path::PathBuf};

use crate::{prelude::*, schema};


pub(crate) fn run(target: Option<&PathBuf>) -> Result<()> {
    let json = schema::export_json()?;
    match target {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("failed to write schema to '{}'", path.display()))?;
            info!("Wrote schema with {} types to '{}'", schema::registry().len(), path.display());
        }
        None => io::stdout().write_all(json.as_bytes())?,
    }

    Ok(())
}
