//! Directive extraction from module source
//!
//! NGINX modules declare their directives as `ngx_command_t` arrays:
//!
//! ```c
//! static ngx_command_t  ngx_http_foo_commands[] = {
//!     { ngx_string("foo"),
//!       NGX_HTTP_MAIN_CONF|NGX_HTTP_SRV_CONF|NGX_CONF_TAKE1,
//!       ngx_conf_set_str_slot,
//!       ... },
//!     ngx_null_command
//! };
//! ```
//!
//! [`PatternExtractor`] recovers `(name, bitmask tokens)` pairs from that
//! text with regular expressions. There is no C front end behind it; other
//! strategies can be plugged in through [`SourceExtractor`].

use crate::lexer::{strip_comments, Location};
use regex::Regex;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// `ngx_command_t <name>[] = { <body> };`
const DIRECTIVE_ARRAY_PATTERN: &str = r"(?s)ngx_command_t\s+(\w+)\[\]\s*=\s*\{(.*?)\};";

/// `ngx_string("<name>") ... , <bitmask> ,`
const DIRECTIVE_ENTRY_PATTERN: &str = r#"(?s)ngx_string\("(.*?)"\).*?,(.*?),"#;

/// Extraction errors
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("can't find any directives under {}, please check the path", path.display())]
    NoDirectives { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One occurrence of a directive in source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Name of the `ngx_command_t` array the entry was declared in
    pub site: String,
    /// Bitmask tokens, trimmed, in source order
    pub tokens: Vec<String>,
    pub file: PathBuf,
    /// 1-based line of the bitmask expression
    pub line: usize,
    /// Byte range of the bitmask expression in `file`
    pub span: Range<usize>,
}

/// Directive name to every occurrence found, duplicates preserved
pub type RawDirectives = BTreeMap<String, Vec<RawEntry>>;

/// Source of raw directive definitions
pub trait SourceExtractor {
    fn extract(&self, root: &Path) -> Result<RawDirectives, ExtractError>;
}

/// Regex-based extractor over comment-stripped C/C++ text
pub struct PatternExtractor {
    array: Regex,
    entry: Regex,
}

impl PatternExtractor {
    pub fn new() -> Self {
        Self {
            array: Regex::new(DIRECTIVE_ARRAY_PATTERN).expect("directive array pattern compiles"),
            entry: Regex::new(DIRECTIVE_ENTRY_PATTERN).expect("directive entry pattern compiles"),
        }
    }

    /// Extract the entries of one file's text into `out`.
    ///
    /// Returns the number of directive arrays found.
    pub fn extract_source(&self, file: &Path, source: &str, out: &mut RawDirectives) -> usize {
        let stripped = strip_comments(source);
        let mut arrays = 0;

        for array in self.array.captures_iter(&stripped) {
            arrays += 1;
            let site = &array[1];
            let Some(body) = array.get(2) else { continue };

            for entry in self.entry.captures_iter(body.as_str()) {
                let (Some(name), Some(bitmask)) = (entry.get(1), entry.get(2)) else {
                    continue;
                };
                let text = bitmask.as_str();
                let start = body.start() + bitmask.start() + (text.len() - text.trim_start().len());
                let span = start..start + text.trim().len();
                let line = Location { start, end: span.end }.line(&stripped);

                let name = name.as_str().trim();
                if name.is_empty() {
                    tracing::warn!("Skipping unnamed directive in {} at {}:{}", site, file.display(), line);
                    continue;
                }

                out.entry(name.to_string())
                    .or_default()
                    .push(RawEntry {
                        site: site.to_string(),
                        tokens: text.split('|').map(|t| t.trim().to_string()).collect(),
                        file: file.to_path_buf(),
                        line,
                        span,
                    });
            }
        }

        arrays
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceExtractor for PatternExtractor {
    fn extract(&self, root: &Path) -> Result<RawDirectives, ExtractError> {
        let mut directives = RawDirectives::new();
        let mut files = Vec::new();
        collect_sources(root, &mut files)?;

        for path in &files {
            let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
                path: path.clone(),
                source,
            })?;
            let source = String::from_utf8_lossy(&bytes);
            let arrays = self.extract_source(path, &source, &mut directives);
            if arrays > 0 {
                tracing::debug!("Found {} directive array(s) in {}", arrays, path.display());
            }
        }

        if directives.is_empty() {
            return Err(ExtractError::NoDirectives {
                path: root.to_path_buf(),
            });
        }

        tracing::info!(
            "Extracted {} directive(s) from {} source file(s) under {}",
            directives.len(),
            files.len(),
            root.display()
        );
        Ok(directives)
    }
}

fn is_c_source(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("c" | "cpp"))
}

/// Collect C/C++ files under `path` in sorted order
fn collect_sources(path: &Path, out: &mut Vec<PathBuf>) -> Result<(), ExtractError> {
    let io_err = |source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(io_err)?;
    if metadata.is_file() {
        if is_c_source(path) {
            out.push(path.to_path_buf());
        }
        return Ok(());
    }

    let mut entries = std::fs::read_dir(path)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort();

    for entry in entries {
        if entry.is_dir() {
            collect_sources(&entry, out)?;
        } else if is_c_source(&entry) {
            out.push(entry);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LUA_LIKE: &str = r#"
#include <ngx_config.h>

/* static ngx_command_t ngx_commented_commands[] = { { ngx_string("ghost"), NGX_CONF_TAKE1, 0 }, }; */

static ngx_command_t  ngx_http_lua_cmds[] = {

    { ngx_string("lua_shared_dict"),
      NGX_HTTP_MAIN_CONF|NGX_CONF_TAKE2,
      ngx_http_lua_shared_dict,
      0,
      0,
      NULL },

    // a line comment, with commas
    { ngx_string("access_by_lua_block"),
      NGX_HTTP_MAIN_CONF|NGX_HTTP_SRV_CONF|NGX_HTTP_LOC_CONF|NGX_HTTP_LIF_CONF
                        |NGX_CONF_BLOCK|NGX_CONF_NOARGS,
      ngx_http_lua_access_by_lua_block,
      NGX_HTTP_LOC_CONF_OFFSET,
      0,
      (void *) ngx_http_lua_access_handler_inline },

      ngx_null_command
};
"#;

    #[test]
    fn test_extract_entries() {
        let extractor = PatternExtractor::new();
        let mut out = RawDirectives::new();
        let arrays = extractor.extract_source(Path::new("lua.c"), LUA_LIKE, &mut out);

        assert_eq!(arrays, 1);
        assert_eq!(out.len(), 2);
        assert!(!out.contains_key("ghost"));

        let shared = &out["lua_shared_dict"][0];
        assert_eq!(shared.site, "ngx_http_lua_cmds");
        assert_eq!(shared.tokens, vec!["NGX_HTTP_MAIN_CONF", "NGX_CONF_TAKE2"]);
        assert_eq!(shared.line, 9);
        assert_eq!(&LUA_LIKE[shared.span.clone()], "NGX_HTTP_MAIN_CONF|NGX_CONF_TAKE2");

        let block = &out["access_by_lua_block"][0];
        assert_eq!(
            block.tokens,
            vec![
                "NGX_HTTP_MAIN_CONF",
                "NGX_HTTP_SRV_CONF",
                "NGX_HTTP_LOC_CONF",
                "NGX_HTTP_LIF_CONF",
                "NGX_CONF_BLOCK",
                "NGX_CONF_NOARGS",
            ]
        );
        assert_eq!(block.line, 17);
    }

    #[test]
    fn test_empty_name_skipped() {
        let source = r#"
static ngx_command_t ngx_http_foo_commands[] = {
    { ngx_string(""),
      NGX_HTTP_MAIN_CONF|NGX_CONF_TAKE1,
      NULL },
    { ngx_string("foo"),
      NGX_HTTP_MAIN_CONF|NGX_CONF_FLAG,
      NULL },
    ngx_null_command
};
"#;
        let mut out = RawDirectives::new();
        let arrays = PatternExtractor::new().extract_source(Path::new("foo.c"), source, &mut out);

        assert_eq!(arrays, 1);
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["foo"]);
        assert_eq!(out["foo"][0].line, 7);
    }

    #[test]
    fn test_duplicates_preserved_across_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.c"), LUA_LIKE).unwrap();
        std::fs::write(dir.path().join("sub/b.cpp"), LUA_LIKE).unwrap();
        std::fs::write(dir.path().join("notes.h"), LUA_LIKE).unwrap();

        let out = PatternExtractor::new().extract(dir.path()).unwrap();
        let entries = &out["lua_shared_dict"];
        assert_eq!(entries.len(), 2);
        assert!(entries[0].file.ends_with("a.c"));
        assert!(entries[1].file.ends_with("b.cpp"));
    }

    #[test]
    fn test_no_directives_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.c"), "int main(void) { return 0; }").unwrap();

        let result = PatternExtractor::new().extract(dir.path());
        assert!(matches!(result, Err(ExtractError::NoDirectives { .. })));
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let result = PatternExtractor::new().extract(Path::new("/nonexistent/ngxplane/src"));
        assert!(matches!(result, Err(ExtractError::Io { .. })));
    }
}
