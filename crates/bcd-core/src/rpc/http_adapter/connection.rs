use std::path::Path;

use reqwest::Url;

use crate::config::RpcConfig;
use crate::error::CoreError;

/// Resolve basic-auth credentials: explicit user + pass first, then the
/// cookie file, otherwise none.
pub(super) fn resolve_auth(config: &RpcConfig) -> Result<Option<(String, String)>, CoreError> {
    match (config.rpc_user.as_deref(), config.rpc_pass.as_deref()) {
        (Some(u), Some(p)) => return Ok(Some((u.to_owned(), p.to_owned()))),
        (Some(_), None) | (None, Some(_)) => {
            return Err(CoreError::Config(
                "rpc_user and rpc_pass must be set together".to_owned(),
            ));
        }
        (None, None) => {}
    }

    match config.rpc_cookie_file.as_deref() {
        Some(cookie_file) => read_cookie(cookie_file).map(Some),
        None => Ok(None),
    }
}

fn read_cookie(cookie_file: &Path) -> Result<(String, String), CoreError> {
    let content = std::fs::read_to_string(cookie_file).map_err(|e| {
        CoreError::Config(format!(
            "failed to read rpc cookie file {}: {e}",
            cookie_file.display()
        ))
    })?;
    let line = content
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .ok_or_else(|| {
            CoreError::Config(format!("rpc cookie file {} is empty", cookie_file.display()))
        })?;

    match line.split_once(':') {
        Some((user, pass)) if !user.is_empty() && !pass.is_empty() => {
            Ok((user.to_owned(), pass.to_owned()))
        }
        _ => Err(CoreError::Config(format!(
            "rpc cookie file {} must contain non-empty `username:password`",
            cookie_file.display()
        ))),
    }
}

pub(super) fn parse_connection(connection: &str) -> Result<String, CoreError> {
    let parsed = Url::parse(connection).map_err(|e| {
        CoreError::Config(format!(
            "invalid rpc_url `{connection}`: expected HTTP(S) URL ({e})"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(connection.to_owned()),
        other => Err(CoreError::Config(format!(
            "unsupported rpc_url scheme `{other}`; expected http or https"
        ))),
    }
}
