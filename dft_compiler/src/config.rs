// Copyright 2018 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use backend_adapters::BackendKind;
use options::{OptionId, OptionParser, Scope};

const DEFAULT_ERROR_BOUND: f64 = 1e-6;

/// Resolved, once-per-run configuration, threaded explicitly through every pass and adapter
/// invocation rather than re-read from the environment ad hoc.
#[derive(Clone, Debug)]
pub struct Config {
    pub artifact_root: PathBuf,
    pub checker: BackendKind,
    pub checker_paths: HashMap<BackendKind, PathBuf>,
    pub warn_as_error: bool,
    pub error_bound: f64,
    pub subprocess_timeout: Option<Duration>,
}

impl Config {
    /// Resolves configuration from CLI flags, config file, and environment via the shared
    /// option-parsing layer, falling back to this struct's defaults for anything unset.
    pub fn from_option_parser(parser: &OptionParser) -> Result<Config, String> {
        let scope = Scope::Global;

        let artifact_root_str = parser.parse_string(&option_id(&scope, &["artifact", "root"])?, "")?.value;
        if artifact_root_str.is_empty() {
            return Err("artifact_root must be set (via ARTIFACT_ROOT or --artifact-root)".to_owned());
        }
        let artifact_root = PathBuf::from(artifact_root_str);

        let checker_name = parser.parse_string(&option_id(&scope, &["checker"])?, "storm")?.value;
        let checker = parse_backend_kind(&checker_name)?;

        let mut checker_paths = HashMap::new();
        for kind in [BackendKind::Storm, BackendKind::Mrmc, BackendKind::Imrmc, BackendKind::Imca] {
            let flag = format!("{}-path", backend_kind_name(kind));
            let value = parser.parse_string(&option_id(&scope, &[&flag])?, "")?.value;
            if !value.is_empty() {
                checker_paths.insert(kind, PathBuf::from(value));
            }
        }

        let warn_as_error = parser.parse_bool(&option_id(&scope, &["warn", "code"])?, false)?.value;

        let error_bound = parser
            .parse_float(&option_id(&scope, &["error", "bound"])?, DEFAULT_ERROR_BOUND)?
            .value;

        let subprocess_timeout_secs = parser
            .parse_float(&option_id(&scope, &["subprocess", "timeout"])?, 0.0)?
            .value;
        let subprocess_timeout =
            if subprocess_timeout_secs > 0.0 { Some(Duration::from_secs_f64(subprocess_timeout_secs)) } else { None };

        Ok(Config {
            artifact_root,
            checker,
            checker_paths,
            warn_as_error,
            error_bound,
            subprocess_timeout,
        })
    }
}

fn option_id(scope: &Scope, name_components: &[&str]) -> Result<OptionId, String> {
    OptionId::new(scope.clone(), name_components.iter().copied(), None)
}

fn backend_kind_name(kind: BackendKind) -> &'static str {
    match kind {
        BackendKind::Storm => "storm",
        BackendKind::Mrmc => "mrmc",
        BackendKind::Imrmc => "imrmc",
        BackendKind::Imca => "imca",
    }
}

fn parse_backend_kind(name: &str) -> Result<BackendKind, String> {
    match name {
        "storm" => Ok(BackendKind::Storm),
        "mrmc" => Ok(BackendKind::Mrmc),
        "imrmc" => Ok(BackendKind::Imrmc),
        "imca" => Ok(BackendKind::Imca),
        other => Err(format!("unknown checker {other:?}, expected one of storm, mrmc, imrmc, imca")),
    }
}
