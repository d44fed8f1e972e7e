use std::path::{Path, PathBuf};

use clap::Args;

use crate::cli::{load_manifest, STDIN_PATH};
use crate::services::formatter;
use crate::utils::config::{ReqmConfig, DEFAULT_MANIFEST};
use crate::utils::error::{ReqmError, Result, EXIT_FINDINGS, EXIT_OK};
use crate::utils::fs_utils::write_atomic;

/// Print or rewrite a manifest in canonical form
#[derive(Debug, Args)]
pub struct FmtCommand {
    /// Manifest to format (`-` for stdin)
    #[arg(default_value = DEFAULT_MANIFEST)]
    pub file: PathBuf,

    /// Exit with status 1 if the manifest is not in canonical form
    #[arg(long, conflicts_with = "write")]
    pub check: bool,

    /// Rewrite the manifest in place
    #[arg(long)]
    pub write: bool,
}

impl FmtCommand {
    /// Execute the fmt command
    pub fn run(&self, _config: &ReqmConfig) -> Result<i32> {
        if self.write && self.file == Path::new(STDIN_PATH) {
            return Err(ReqmError::ValidationError(
                "--write cannot be used when reading from stdin".to_string(),
            ));
        }

        let loaded = load_manifest(&self.file, false)?;
        let formatted = formatter::format(&loaded.manifest);
        let source = &loaded.manifest.source;
        let unchanged = formatted == loaded.text.strip_prefix('\u{feff}').unwrap_or(&loaded.text);

        if self.check {
            if unchanged {
                println!("{source} is formatted");
                return Ok(EXIT_OK);
            }
            println!("{source} would be reformatted");
            return Ok(EXIT_FINDINGS);
        }

        if self.write {
            if unchanged {
                println!("{source} already formatted");
            } else {
                write_atomic(&self.file, &formatted)?;
                println!("Formatted {source}");
            }
            return Ok(EXIT_OK);
        }

        print!("{formatted}");
        Ok(EXIT_OK)
    }
}
