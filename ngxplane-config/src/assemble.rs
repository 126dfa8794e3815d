//! Include assembly
//!
//! A parser that follows `include` directives returns one [`Config`] per
//! file, with each resolved `include` pointing at the configs it pulled in.
//! [`ConfigAssembler`] splices those files back into a single directive tree
//! in document order, the way NGINX itself sees the configuration.

use ngxplane_core::{Config, Directive, Payload, Status};
use thiserror::Error;

/// Include resolution errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IncludeError {
    #[error("{file}:{line}: include config with index: {index}")]
    OutOfBounds {
        index: usize,
        file: String,
        line: usize,
    },

    #[error("{file}:{line}: include cycle at config index {index}: {}", chain.join(" -> "))]
    Cycle {
        index: usize,
        file: String,
        line: usize,
        /// Files on the expansion stack, ending with the re-entered one
        chain: Vec<String>,
    },
}

/// Combines the configs of a [`Payload`] into one
pub struct ConfigAssembler<'p> {
    payload: &'p Payload,
    detect_cycles: bool,
}

impl<'p> ConfigAssembler<'p> {
    pub fn new(payload: &'p Payload) -> Self {
        Self {
            payload,
            detect_cycles: true,
        }
    }

    /// Skip cycle detection. A cyclic payload then recurses until the stack
    /// runs out.
    pub fn allow_cycles(mut self) -> Self {
        self.detect_cycles = false;
        self
    }

    /// Build the combined config, or `None` when the payload has no configs
    pub fn assemble(&self) -> Result<Option<Config>, IncludeError> {
        let Some(root) = self.payload.config.first() else {
            return Ok(None);
        };

        let mut combined = Config::new(root.file.clone(), Vec::new());
        for config in &self.payload.config {
            combined.errors.extend(config.errors.iter().cloned());
            if config.status.is_failed() {
                combined.status = Status::Failed;
            }
        }

        let mut stack = vec![0];
        combined.parsed = self.expand(&root.parsed, &mut stack)?;

        tracing::debug!(
            "Assembled {} config(s) into {} directive(s)",
            self.payload.config.len(),
            combined.directive_count()
        );
        Ok(Some(combined))
    }

    /// The input payload with its configs replaced by the combined one
    pub fn combine(&self) -> Result<Payload, IncludeError> {
        match self.assemble()? {
            None => Ok(self.payload.clone()),
            Some(combined) => Ok(Payload {
                status: self.payload.status,
                errors: self.payload.errors.clone(),
                config: vec![combined],
            }),
        }
    }

    /// Expand one directive list. `stack` holds the config indices currently
    /// being expanded, innermost last.
    fn expand(&self, block: &[Directive], stack: &mut Vec<usize>) -> Result<Vec<Directive>, IncludeError> {
        let mut out = Vec::with_capacity(block.len());

        for directive in block {
            if directive.is_include() {
                for &index in directive.includes.as_deref().unwrap_or_default() {
                    self.include(directive, index, stack, &mut out)?;
                }
                continue;
            }

            if directive.is_block() {
                let children = directive.block.as_deref().unwrap_or_default();
                out.push(Directive {
                    directive: directive.directive.clone(),
                    line: directive.line,
                    args: directive.args.clone(),
                    includes: directive.includes.clone(),
                    block: Some(self.expand(children, stack)?),
                });
            } else {
                out.push(directive.clone());
            }
        }

        Ok(out)
    }

    fn include(
        &self,
        directive: &Directive,
        index: usize,
        stack: &mut Vec<usize>,
        out: &mut Vec<Directive>,
    ) -> Result<(), IncludeError> {
        let from = stack.last().map(|&i| self.payload.config[i].file.clone()).unwrap_or_default();

        let Some(target) = self.payload.config.get(index) else {
            return Err(IncludeError::OutOfBounds {
                index,
                file: from,
                line: directive.line,
            });
        };

        if self.detect_cycles && stack.contains(&index) {
            let mut chain: Vec<String> = stack
                .iter()
                .map(|&i| self.payload.config[i].file.clone())
                .collect();
            chain.push(target.file.clone());
            return Err(IncludeError::Cycle {
                index,
                file: from,
                line: directive.line,
                chain,
            });
        }

        tracing::debug!("Expanding include of {} from {}:{}", target.file, from, directive.line);
        stack.push(index);
        let expanded = self.expand(&target.parsed, stack);
        stack.pop();
        out.extend(expanded?);
        Ok(())
    }
}

/// Replace the payload's configs with the single combined one.
///
/// Payload-level status and errors are carried over unchanged. A payload
/// with no configs comes back as-is.
pub fn combine_configs(payload: &Payload) -> Result<Payload, IncludeError> {
    ConfigAssembler::new(payload).combine()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngxplane_core::{ConfigError, PayloadError};

    fn d(name: &str, line: usize) -> Directive {
        Directive::new(name, line)
    }

    fn names(block: &[Directive]) -> Vec<&str> {
        block.iter().map(|d| d.directive.as_str()).collect()
    }

    #[test]
    fn test_empty_payload_unchanged() {
        let payload = Payload::default();
        assert_eq!(ConfigAssembler::new(&payload).assemble().unwrap(), None);
        assert_eq!(combine_configs(&payload).unwrap(), payload);
    }

    #[test]
    fn test_single_config_identity() {
        let root = Config::new(
            "nginx.conf",
            vec![
                d("user", 1).with_args(["nginx"]),
                d("events", 2).with_block(vec![d("worker_connections", 3).with_args(["1024"])]),
                d("http", 5).with_block(vec![]),
            ],
        );
        let payload = Payload::new(vec![root.clone()]);

        let combined = ConfigAssembler::new(&payload).assemble().unwrap().unwrap();
        assert_eq!(combined, root);
    }

    #[test]
    fn test_include_expanded_in_place() {
        let payload = Payload::new(vec![
            Config::new(
                "a.conf",
                vec![d("foo", 1), Directive::include(2, "b.conf", vec![1]), d("bar", 3)],
            ),
            Config::new("b.conf", vec![d("baz", 1)]),
        ]);

        let combined = combine_configs(&payload).unwrap();
        assert_eq!(combined.config.len(), 1);
        assert_eq!(combined.config[0].file, "a.conf");
        assert_eq!(names(&combined.config[0].parsed), vec!["foo", "baz", "bar"]);
    }

    #[test]
    fn test_include_inside_block() {
        let payload = Payload::new(vec![
            Config::new(
                "nginx.conf",
                vec![d("http", 1).with_block(vec![
                    Directive::include(2, "conf.d/*.conf", vec![1, 2]),
                    d("sendfile", 3).with_args(["on"]),
                ])],
            ),
            Config::new("conf.d/a.conf", vec![d("server", 1).with_block(vec![d("listen", 2)])]),
            Config::new("conf.d/b.conf", vec![d("server", 1).with_block(vec![d("listen", 2)])]),
        ]);

        let combined = ConfigAssembler::new(&payload).assemble().unwrap().unwrap();
        let http = combined.parsed[0].block.as_deref().unwrap();
        assert_eq!(names(http), vec!["server", "server", "sendfile"]);
        assert_eq!(names(http[0].block.as_deref().unwrap()), vec!["listen"]);
    }

    #[test]
    fn test_nested_includes() {
        let payload = Payload::new(vec![
            Config::new("a.conf", vec![Directive::include(1, "b.conf", vec![1])]),
            Config::new("b.conf", vec![d("b1", 1), Directive::include(2, "c.conf", vec![2])]),
            Config::new("c.conf", vec![d("c1", 1)]),
        ]);
        let combined = ConfigAssembler::new(&payload).assemble().unwrap().unwrap();
        assert_eq!(names(&combined.parsed), vec!["b1", "c1"]);
    }

    #[test]
    fn test_unresolved_include_kept() {
        let payload = Payload::new(vec![Config::new(
            "nginx.conf",
            vec![d("include", 1).with_args(["mime.types"])],
        )]);
        let combined = ConfigAssembler::new(&payload).assemble().unwrap().unwrap();
        assert_eq!(combined.parsed, payload.config[0].parsed);
    }

    #[test]
    fn test_out_of_bounds_index() {
        let payload = Payload::new(vec![
            Config::new("nginx.conf", vec![d("http", 1).with_block(vec![Directive::include(7, "x.conf", vec![5])])]),
            Config::new("other.conf", vec![]),
        ]);

        let err = ConfigAssembler::new(&payload).assemble().unwrap_err();
        assert_eq!(
            err,
            IncludeError::OutOfBounds {
                index: 5,
                file: "nginx.conf".to_string(),
                line: 7,
            }
        );
        assert!(err.to_string().contains("5"));
    }

    #[test]
    fn test_out_of_bounds_names_including_file() {
        let payload = Payload::new(vec![
            Config::new("a.conf", vec![Directive::include(1, "b.conf", vec![1])]),
            Config::new("b.conf", vec![Directive::include(4, "c.conf", vec![9])]),
        ]);
        match ConfigAssembler::new(&payload).assemble().unwrap_err() {
            IncludeError::OutOfBounds { index, file, line } => {
                assert_eq!((index, file.as_str(), line), (9, "b.conf", 4));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_errors_aggregated() {
        let mut a = Config::new("a.conf", vec![Directive::include(1, "b.conf", vec![1])]);
        a.errors.push(ConfigError::new(Some(3), "unknown directive \"foo\""));
        let mut b = Config::new("b.conf", vec![d("baz", 1)]);
        b.status = Status::Failed;
        b.errors.push(ConfigError::new(Some(8), "unexpected \"}\""));

        let mut payload = Payload::new(vec![a, b]);
        payload.errors.push(PayloadError {
            file: "b.conf".to_string(),
            line: Some(8),
            error: "unexpected \"}\"".to_string(),
        });

        let combined = combine_configs(&payload).unwrap();
        let config = &combined.config[0];
        assert_eq!(config.status, Status::Failed);
        assert_eq!(config.errors.len(), 2);
        assert_eq!(config.errors[0].line, Some(3));
        assert_eq!(config.errors[1].line, Some(8));
        assert_eq!(combined.status, payload.status);
        assert_eq!(combined.errors, payload.errors);
    }

    #[test]
    fn test_input_not_mutated() {
        let payload = Payload::new(vec![
            Config::new("a.conf", vec![Directive::include(1, "b.conf", vec![1])]),
            Config::new("b.conf", vec![d("baz", 1)]),
        ]);
        let before = payload.clone();
        combine_configs(&payload).unwrap();
        assert_eq!(payload, before);
    }

    #[test]
    fn test_cycle_detected() {
        let payload = Payload::new(vec![
            Config::new("a.conf", vec![Directive::include(1, "b.conf", vec![1])]),
            Config::new("b.conf", vec![Directive::include(2, "a.conf", vec![0])]),
        ]);

        let err = ConfigAssembler::new(&payload).assemble().unwrap_err();
        assert_eq!(
            err,
            IncludeError::Cycle {
                index: 0,
                file: "b.conf".to_string(),
                line: 2,
                chain: vec!["a.conf".to_string(), "b.conf".to_string(), "a.conf".to_string()],
            }
        );
    }

    #[test]
    fn test_self_include_is_a_cycle() {
        let payload = Payload::new(vec![Config::new(
            "a.conf",
            vec![Directive::include(1, "a.conf", vec![0])],
        )]);
        let err = ConfigAssembler::new(&payload).assemble().unwrap_err();
        assert!(matches!(err, IncludeError::Cycle { index: 0, .. }));
    }

    #[test]
    fn test_diamond_expanded_twice() {
        let payload = Payload::new(vec![
            Config::new(
                "a.conf",
                vec![
                    Directive::include(1, "b.conf", vec![1]),
                    Directive::include(2, "c.conf", vec![2]),
                ],
            ),
            Config::new("b.conf", vec![Directive::include(1, "d.conf", vec![3])]),
            Config::new("c.conf", vec![Directive::include(1, "d.conf", vec![3])]),
            Config::new("d.conf", vec![d("shared", 1)]),
        ]);

        let combined = ConfigAssembler::new(&payload).assemble().unwrap().unwrap();
        assert_eq!(names(&combined.parsed), vec!["shared", "shared"]);
    }
}
