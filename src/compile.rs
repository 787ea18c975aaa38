//! Compile driver: reader → cache → analyzer → generator.

use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use crate::analyze::Analyzer;
use crate::cache::ImportCache;
use crate::diag::CompileError;
use crate::generate::{GenerateOptions, GeneratorRegistry};
use crate::reader::FsSourceReader;

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Search directories for `@include` resolution, tried in order.
    pub src_dirs: Vec<PathBuf>,
    /// Directory handed to the on-disk cache collaborator. The core
    /// pipeline never touches it.
    pub cache_dir: PathBuf,
    pub generator: String,
    pub disable_callbacks: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            src_dirs: vec![PathBuf::from(".")],
            cache_dir: PathBuf::from(".wirestate"),
            generator: "json".to_string(),
            disable_callbacks: false,
        }
    }
}

/// Compiles the file named by `input` and returns the generated
/// artifact. The first error reaching the top aborts the compile.
pub fn compile(input: &str, opts: &CompileOptions) -> Result<String, Arc<CompileError>> {
    let reader = Arc::new(FsSourceReader::new(opts.src_dirs.clone()));
    let cache = ImportCache::new();

    let scopes = Analyzer::new(reader, &cache).run(input)?;
    debug!("analyzed {} scope(s) from {input}", scopes.len());

    let registry = GeneratorRegistry::with_builtins();
    registry
        .generate(
            &opts.generator,
            &scopes,
            &GenerateOptions {
                disable_callbacks: opts.disable_callbacks,
            },
        )
        .map_err(|error| Arc::new(CompileError::from(error)))
}

#[cfg(test)]
#[path = "tests/t_compile.rs"]
mod tests;
